// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effects and events for state machine orchestration

use crate::coordination::{GrantToken, RequesterId};
use crate::traced::TracedEffect;

/// Effects are side effects that the lock queue requests from its coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Emit an event for other components to observe
    Emit(Event),
    /// Start the waiter task bound to a newly queued requester
    SpawnWaiter { requester: RequesterId },
    /// Publish the new queue state to waiters and status readers
    Publish,
    /// Wake the holder's waiter as if the release acknowledgement arrived
    ReleaseHolder {
        requester: RequesterId,
        token: GrantToken,
    },
}

/// Events emitted by the lock queue
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Event {
    LockRequested {
        resource: String,
        requester: String,
        position: usize,
    },
    DuplicateRequest {
        resource: String,
        requester: String,
    },
    /// A withdrawn requester asked again; it rejoins once its old entry is gone
    RequestRequeued {
        resource: String,
        requester: String,
    },
    LockGranted {
        resource: String,
        requester: String,
        token: String,
    },
    ClaimDenied {
        resource: String,
        requester: String,
    },
    LockReleased {
        resource: String,
        requester: String,
    },
    UnlockTimedOut {
        resource: String,
        requester: String,
    },
    RequesterUnreachable {
        resource: String,
        requester: String,
    },
    LockCanceled {
        resource: String,
        requester: String,
    },
    LockWithdrawn {
        resource: String,
        requester: String,
        /// Whether the requester was holding the grant when it withdrew
        held: bool,
    },
    StaleRelease {
        resource: String,
        token: String,
    },
    QueueDrained {
        resource: String,
    },
    CheckpointRequested {
        resource: String,
        queue_len: usize,
    },
    CoordinatorResumed {
        resource: String,
        queue_len: usize,
    },
}

impl Event {
    /// Event name in `category:action` form
    pub fn name(&self) -> &'static str {
        match self {
            Event::LockRequested { .. } => "lock:requested",
            Event::DuplicateRequest { .. } => "lock:duplicate",
            Event::RequestRequeued { .. } => "lock:requeued",
            Event::LockGranted { .. } => "lock:granted",
            Event::ClaimDenied { .. } => "lock:claim_denied",
            Event::LockReleased { .. } => "lock:released",
            Event::UnlockTimedOut { .. } => "lock:unlock_timeout",
            Event::RequesterUnreachable { .. } => "lock:unreachable",
            Event::LockCanceled { .. } => "lock:canceled",
            Event::LockWithdrawn { .. } => "lock:withdrawn",
            Event::StaleRelease { .. } => "lock:stale_release",
            Event::QueueDrained { .. } => "queue:drained",
            Event::CheckpointRequested { .. } => "coordinator:checkpoint",
            Event::CoordinatorResumed { .. } => "coordinator:resumed",
        }
    }
}

impl TracedEffect for Effect {
    fn name(&self) -> &'static str {
        match self {
            Effect::Emit(_) => "emit",
            Effect::SpawnWaiter { .. } => "spawn_waiter",
            Effect::Publish => "publish",
            Effect::ReleaseHolder { .. } => "release_holder",
        }
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Effect::Emit(event) => vec![("event", event.name().to_string())],
            Effect::SpawnWaiter { requester } => vec![("requester", requester.0.clone())],
            Effect::Publish => vec![],
            Effect::ReleaseHolder { requester, token } => vec![
                ("requester", requester.0.clone()),
                ("token", token.0.clone()),
            ],
        }
    }
}

#[cfg(test)]
#[path = "effect_tests.rs"]
mod tests;
