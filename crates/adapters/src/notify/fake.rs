// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake participant notifier for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{NotifyError, ParticipantMessage, ParticipantNotifier};
use async_trait::async_trait;
use mq_core::{GrantToken, RequesterId};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Recorded delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyCall {
    pub requester: RequesterId,
    pub message: ParticipantMessage,
    /// False when the requester was configured unreachable
    pub delivered: bool,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<NotifyCall>,
    unreachable: HashSet<RequesterId>,
    unresponsive: HashSet<RequesterId>,
}

/// Fake notifier that records deliveries
#[derive(Clone, Default)]
pub struct FakeNotifier {
    state: Arc<Mutex<FakeState>>,
    changed: Arc<Notify>,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliveries to `requester` fail from now on
    pub fn set_unreachable(&self, requester: &RequesterId) {
        self.lock().unreachable.insert(requester.clone());
    }

    /// Deliveries to `requester` never complete from now on
    pub fn set_unresponsive(&self, requester: &RequesterId) {
        self.lock().unresponsive.insert(requester.clone());
    }

    /// All recorded delivery attempts
    pub fn calls(&self) -> Vec<NotifyCall> {
        self.lock().calls.clone()
    }

    /// Delivered grants, in delivery order
    pub fn grants(&self) -> Vec<(RequesterId, GrantToken)> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.delivered)
            .filter_map(|c| match &c.message {
                ParticipantMessage::Granted { token, .. } => {
                    Some((c.requester.clone(), token.clone()))
                }
                ParticipantMessage::Canceled { .. } | ParticipantMessage::Withdrawn { .. } => None,
            })
            .collect()
    }

    /// Requesters told they will not be granted, by revocation or withdrawal
    pub fn cancellations(&self) -> Vec<RequesterId> {
        self.lock()
            .calls
            .iter()
            .filter(|c| {
                matches!(
                    c.message,
                    ParticipantMessage::Canceled { .. } | ParticipantMessage::Withdrawn { .. }
                )
            })
            .map(|c| c.requester.clone())
            .collect()
    }

    /// Wait until at least `count` grants have been delivered
    pub async fn wait_for_grants(&self, count: usize) -> Vec<(RequesterId, GrantToken)> {
        loop {
            let notified = self.changed.notified();
            let grants = self.grants();
            if grants.len() >= count {
                return grants;
            }
            notified.await;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ParticipantNotifier for FakeNotifier {
    async fn notify(
        &self,
        requester: &RequesterId,
        message: ParticipantMessage,
    ) -> Result<(), NotifyError> {
        let (unreachable, unresponsive) = {
            let state = self.lock();
            (
                state.unreachable.contains(requester),
                state.unresponsive.contains(requester),
            )
        };

        if unresponsive {
            std::future::pending::<()>().await;
        }

        self.lock().calls.push(NotifyCall {
            requester: requester.clone(),
            message,
            delivered: !unreachable,
        });
        self.changed.notify_waiters();

        if unreachable {
            Err(NotifyError::Unreachable(requester.0.clone()))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
