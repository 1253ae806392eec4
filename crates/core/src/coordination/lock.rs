// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fair lock queue state machine
//!
//! Requesters for one resource wait in arrival order. Only the head of the
//! queue may hold the grant, and at most one grant is outstanding at a time.
//! Every mutation happens through [`LockQueue::transition`], which the
//! coordinator's event loop calls from a single task.

use super::checkpoint::Checkpoint;
use crate::effect::{Effect, Event};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Names the mutually-exclusive resource a coordinator owns
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// External identity of the coordinator owning this resource
    pub fn coordinator_id(&self, namespace: &str) -> String {
        format!("mutex:{}:{}", namespace, self.0)
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a waiting participant
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequesterId(pub String);

impl RequesterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RequesterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One-time name the grant holder uses to signal release
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrantToken(pub String);

impl GrantToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Build a token for `requester`, made unique by `suffix`
    pub fn generate(requester: &RequesterId, suffix: &str) -> Self {
        Self(format!("unlock-event-{}-{}", requester.0, suffix))
    }
}

impl std::fmt::Display for GrantToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The single outstanding grant
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub requester: RequesterId,
    pub token: GrantToken,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct QueueEntry {
    requester: RequesterId,
    /// Participant gave up; the entry is removed once its waiter notices
    withdrawn: bool,
    /// Asked again after withdrawing; re-queued at the tail on removal
    rejoin: bool,
}

impl QueueEntry {
    fn new(requester: RequesterId) -> Self {
        Self {
            requester,
            withdrawn: false,
            rejoin: false,
        }
    }
}

/// What a requester's waiter should do given the current queue
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Eligibility {
    /// Not at the head yet, or a grant is outstanding, or the queue is sealed
    Waiting,
    /// At the head with no outstanding grant: may claim the lock
    Eligible,
    /// Participant withdrew: cancel and remove
    Withdrawn,
    /// No longer queued
    Absent,
}

/// How a waiter's turn ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaiterOutcome {
    /// Holder acknowledged release (or withdrew while holding)
    Released,
    /// Holder did not acknowledge within the unlock timeout
    TimedOut,
    /// Grant could not be delivered; treated as an immediate release
    Unreachable,
    /// Requester withdrew before being granted
    Canceled,
}

/// Inputs that drive lock queue transitions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockInput {
    /// A participant asks for the lock
    Request { requester: RequesterId },
    /// The requester's waiter reached the head and wants to grant
    Claim {
        requester: RequesterId,
        token: GrantToken,
    },
    /// Release acknowledgement from the holder
    Release { token: GrantToken },
    /// Participant gave up waiting
    Withdraw { requester: RequesterId },
    /// The requester's waiter resolved and its entry can go
    Finished {
        requester: RequesterId,
        outcome: WaiterOutcome,
    },
    /// History is large: stop granting so the queue can be checkpointed
    Seal,
}

/// FIFO queue of requesters for one resource
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockQueue {
    pub resource: ResourceId,
    pub unlock_timeout: Duration,
    entries: VecDeque<QueueEntry>,
    holder: Option<Grant>,
    sealed: bool,
}

impl LockQueue {
    pub fn new(resource: ResourceId, unlock_timeout: Duration) -> Self {
        Self {
            resource,
            unlock_timeout,
            entries: VecDeque::new(),
            holder: None,
            sealed: false,
        }
    }

    /// Rebuild a queue from carried state
    ///
    /// Returns one `SpawnWaiter` per entry, in queue order.
    pub fn restore(checkpoint: Checkpoint) -> (LockQueue, Vec<Effect>) {
        let mut queue = LockQueue::new(checkpoint.resource, checkpoint.unlock_timeout);
        let mut effects = Vec::new();

        for requester in checkpoint.queue {
            if queue.position(&requester).is_some() {
                continue;
            }
            effects.push(Effect::SpawnWaiter {
                requester: requester.clone(),
            });
            queue.entries.push_back(QueueEntry::new(requester));
        }

        effects.push(Effect::Emit(Event::CoordinatorResumed {
            resource: queue.resource.0.clone(),
            queue_len: queue.len(),
        }));
        effects.push(Effect::Publish);

        (queue, effects)
    }

    /// Capture the state carried across a continue-as-new
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            resource: self.resource.clone(),
            unlock_timeout: self.unlock_timeout,
            queue: self.requesters(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Completion marker: nothing queued and nothing held
    pub fn is_drained(&self) -> bool {
        self.entries.is_empty() && self.holder.is_none()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Sealed with no grant outstanding, so the queue can be carried over
    pub fn ready_to_checkpoint(&self) -> bool {
        self.sealed && self.holder.is_none()
    }

    pub fn holder(&self) -> Option<&Grant> {
        self.holder.as_ref()
    }

    pub fn is_held_by(&self, requester: &RequesterId) -> bool {
        matches!(&self.holder, Some(grant) if &grant.requester == requester)
    }

    /// Queued requesters in arrival order
    pub fn requesters(&self) -> Vec<RequesterId> {
        self.entries.iter().map(|e| e.requester.clone()).collect()
    }

    /// Current index of `requester`, looked up by identity
    pub fn position(&self, requester: &RequesterId) -> Option<usize> {
        self.entries.iter().position(|e| &e.requester == requester)
    }

    pub fn eligibility(&self, requester: &RequesterId) -> Eligibility {
        let Some(index) = self.position(requester) else {
            return Eligibility::Absent;
        };
        if self.entries[index].withdrawn {
            return Eligibility::Withdrawn;
        }
        // A sole entry is the head too, so it never waits on another event.
        let at_head = index == 0 || self.entries.len() == 1;
        if at_head && self.holder.is_none() && !self.sealed {
            Eligibility::Eligible
        } else {
            Eligibility::Waiting
        }
    }

    /// Append `requester` at the tail with a fresh waiter
    fn enqueue(&mut self, requester: RequesterId) -> Vec<Effect> {
        self.entries.push_back(QueueEntry::new(requester.clone()));
        vec![
            Effect::Emit(Event::LockRequested {
                resource: self.resource.0.clone(),
                requester: requester.0.clone(),
                position: self.entries.len() - 1,
            }),
            Effect::SpawnWaiter { requester },
        ]
    }

    /// Pure state transition function
    pub fn transition(&self, input: LockInput) -> (LockQueue, Vec<Effect>) {
        let mut next = self.clone();
        let mut effects = Vec::new();
        let resource = self.resource.0.clone();

        match input {
            LockInput::Request { requester } => match self.position(&requester) {
                Some(index) if self.entries[index].withdrawn && !self.entries[index].rejoin => {
                    // The old entry's waiter still owns it; queue again once it finishes.
                    next.entries[index].rejoin = true;
                    effects.push(Effect::Emit(Event::RequestRequeued {
                        resource,
                        requester: requester.0,
                    }));
                }
                Some(_) => {
                    effects.push(Effect::Emit(Event::DuplicateRequest {
                        resource,
                        requester: requester.0,
                    }));
                }
                None => {
                    effects.extend(next.enqueue(requester));
                    effects.push(Effect::Publish);
                }
            },

            LockInput::Claim { requester, token } => {
                if self.eligibility(&requester) == Eligibility::Eligible {
                    next.holder = Some(Grant {
                        requester: requester.clone(),
                        token: token.clone(),
                    });
                    effects.push(Effect::Emit(Event::LockGranted {
                        resource,
                        requester: requester.0,
                        token: token.0,
                    }));
                    effects.push(Effect::Publish);
                } else {
                    effects.push(Effect::Emit(Event::ClaimDenied {
                        resource,
                        requester: requester.0,
                    }));
                }
            }

            LockInput::Release { token } => match &self.holder {
                Some(grant) if grant.token == token => {
                    effects.push(Effect::ReleaseHolder {
                        requester: grant.requester.clone(),
                        token,
                    });
                }
                _ => {
                    // Late or duplicate release
                    effects.push(Effect::Emit(Event::StaleRelease {
                        resource,
                        token: token.0,
                    }));
                }
            },

            LockInput::Withdraw { requester } => {
                if let Some(grant) = &self.holder {
                    if grant.requester == requester {
                        if let Some(index) = self.position(&requester) {
                            next.entries[index].withdrawn = true;
                            next.entries[index].rejoin = false;
                        }
                        effects.push(Effect::Emit(Event::LockWithdrawn {
                            resource,
                            requester: requester.0,
                            held: true,
                        }));
                        effects.push(Effect::ReleaseHolder {
                            requester: grant.requester.clone(),
                            token: grant.token.clone(),
                        });
                        return (next, effects);
                    }
                }
                if let Some(index) = self.position(&requester) {
                    let entry = &mut next.entries[index];
                    if !entry.withdrawn || entry.rejoin {
                        entry.withdrawn = true;
                        entry.rejoin = false;
                        effects.push(Effect::Emit(Event::LockWithdrawn {
                            resource,
                            requester: requester.0,
                            held: false,
                        }));
                        effects.push(Effect::Publish);
                    }
                }
            }

            LockInput::Finished { requester, outcome } => {
                // Positions may have shifted while the waiter was suspended.
                let rejoin = next
                    .position(&requester)
                    .and_then(|index| next.entries.remove(index))
                    .is_some_and(|entry| entry.rejoin);
                if next.is_held_by(&requester) {
                    next.holder = None;
                }
                let rejoining = rejoin.then(|| requester.clone());

                let requester = requester.0;
                let event = match outcome {
                    WaiterOutcome::Released => Event::LockReleased {
                        resource: resource.clone(),
                        requester,
                    },
                    WaiterOutcome::TimedOut => Event::UnlockTimedOut {
                        resource: resource.clone(),
                        requester,
                    },
                    WaiterOutcome::Unreachable => Event::RequesterUnreachable {
                        resource: resource.clone(),
                        requester,
                    },
                    WaiterOutcome::Canceled => Event::LockCanceled {
                        resource: resource.clone(),
                        requester,
                    },
                };
                effects.push(Effect::Emit(event));
                if let Some(requester) = rejoining {
                    effects.extend(next.enqueue(requester));
                }
                effects.push(Effect::Publish);

                if next.is_drained() {
                    effects.push(Effect::Emit(Event::QueueDrained { resource }));
                }
            }

            LockInput::Seal => {
                if !self.sealed {
                    next.sealed = true;
                    effects.push(Effect::Emit(Event::CheckpointRequested {
                        resource,
                        queue_len: self.entries.len(),
                    }));
                    effects.push(Effect::Publish);
                }
            }
        }

        (next, effects)
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
