// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-requester waiter task
//!
//! A waiter watches the published queue until its requester can claim the
//! grant, asks the coordinator to record the grant, delivers it, and then
//! waits for release or the unlock timeout. The coordinator alone decides
//! whether a claim succeeds.

use mq_adapters::{ParticipantMessage, ParticipantNotifier};
use mq_core::{
    Eligibility, GrantToken, IdGen, LockQueue, RequesterId, ResourceId, WaiterOutcome,
};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};

/// Reply to a claim: the release signal on success, `None` if denied
pub(crate) type ClaimReply = Option<oneshot::Receiver<()>>;

/// Messages a waiter sends back to its coordinator
#[derive(Debug)]
pub(crate) enum WaiterEvent {
    Claim {
        requester: RequesterId,
        token: GrantToken,
        reply: oneshot::Sender<ClaimReply>,
    },
    Finished {
        requester: RequesterId,
        outcome: WaiterOutcome,
    },
}

pub(crate) struct Waiter<N, I> {
    pub(crate) requester: RequesterId,
    pub(crate) resource: ResourceId,
    pub(crate) unlock_timeout: Duration,
    pub(crate) queue: watch::Receiver<LockQueue>,
    pub(crate) events: mpsc::UnboundedSender<WaiterEvent>,
    pub(crate) notifier: N,
    pub(crate) id_gen: I,
}

impl<N: ParticipantNotifier, I: IdGen> Waiter<N, I> {
    pub(crate) async fn run(mut self) {
        let outcome = loop {
            let eligibility = {
                let requester = &self.requester;
                match self
                    .queue
                    .wait_for(|q| q.eligibility(requester) != Eligibility::Waiting)
                    .await
                {
                    Ok(queue) => queue.eligibility(requester),
                    // Coordinator instance is gone
                    Err(_) => return,
                }
            };

            match eligibility {
                Eligibility::Waiting => continue,
                Eligibility::Absent => return,
                Eligibility::Withdrawn => {
                    self.acknowledge_withdrawal().await;
                    break WaiterOutcome::Canceled;
                }
                Eligibility::Eligible => {
                    let token = self.id_gen.grant_token(&self.requester);
                    let (reply, response) = oneshot::channel();
                    let claim = WaiterEvent::Claim {
                        requester: self.requester.clone(),
                        token: token.clone(),
                        reply,
                    };
                    if self.events.send(claim).is_err() {
                        return;
                    }
                    match response.await {
                        Ok(Some(release)) => break self.hold(token, release).await,
                        Ok(None) => {
                            tracing::debug!("claim denied");
                            if self.queue.changed().await.is_err() {
                                return;
                            }
                        }
                        Err(_) => return,
                    }
                }
            }
        };

        let _ = self.events.send(WaiterEvent::Finished {
            requester: self.requester,
            outcome,
        });
    }

    /// Deliver the grant, then wait for release within the unlock timeout
    async fn hold(&self, token: GrantToken, release: oneshot::Receiver<()>) -> WaiterOutcome {
        let message = ParticipantMessage::Granted {
            resource: self.resource.clone(),
            token,
        };

        let turn = async {
            if self.notifier.notify(&self.requester, message).await.is_err() {
                return WaiterOutcome::Unreachable;
            }
            // A dropped sender means the coordinator is stopping
            let _ = release.await;
            WaiterOutcome::Released
        };

        match tokio::time::timeout(self.unlock_timeout, turn).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.unlock_timeout.as_millis() as u64,
                    "unlock timeout elapsed"
                );
                WaiterOutcome::TimedOut
            }
        }
    }

    async fn acknowledge_withdrawal(&self) {
        let message = ParticipantMessage::Withdrawn {
            resource: self.resource.clone(),
        };
        // The participant has usually stopped listening by now
        let _ = tokio::time::timeout(
            self.unlock_timeout,
            self.notifier.notify(&self.requester, message),
        )
        .await;
    }
}
