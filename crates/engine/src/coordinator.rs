// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator instance event loop
//!
//! An instance owns the lock queue for one generation of a coordinator. It
//! feeds participant signals and waiter events through
//! [`LockQueue::transition`], executes the resulting effects, and records
//! every input in its history. The instance ends when the queue drains, when
//! its history asks for a continue-as-new, or when its inbox closes.

use crate::registry::{CoordinatorMessage, Inbox, Registry};
use crate::waiter::{Waiter, WaiterEvent};
use mq_adapters::{ParticipantMessage, ParticipantNotifier};
use mq_core::{
    Checkpoint, Effect, Event, GrantToken, History, IdGen, LockInput, LockQueue, RequesterId,
    ResourceId, TracedEffect,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinSet;
use tracing::Instrument;

/// Point-in-time view of a running coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorStatus {
    pub resource: ResourceId,
    /// Number of continue-as-new hand-offs so far
    pub generation: u64,
    /// Queued requesters in arrival order, holder included
    pub queue: Vec<RequesterId>,
    pub holder: Option<RequesterId>,
    /// Inputs recorded by the current instance
    pub history_len: usize,
    /// No new grants start until the next generation
    pub sealed: bool,
}

impl CoordinatorStatus {
    pub(crate) fn of(queue: &LockQueue, generation: u64, history_len: usize) -> Self {
        Self {
            resource: queue.resource.clone(),
            generation,
            queue: queue.requesters(),
            holder: queue.holder().map(|g| g.requester.clone()),
            history_len,
            sealed: queue.is_sealed(),
        }
    }
}

/// Why an instance stopped
#[derive(Debug)]
pub(crate) enum InstanceExit {
    /// Queue empty and no signals pending; the coordinator is deregistered
    Drained,
    /// History is full; a successor continues from the checkpoint
    ContinueAsNew(Checkpoint),
    /// Inbox closed by service shutdown
    Closed,
}

/// Dependencies shared by every generation of one coordinator
#[derive(Clone)]
pub(crate) struct InstanceDeps<N, I> {
    pub(crate) key: String,
    pub(crate) max_history: usize,
    pub(crate) notifier: N,
    pub(crate) id_gen: I,
    pub(crate) registry: Registry,
    pub(crate) status: Arc<watch::Sender<CoordinatorStatus>>,
}

pub(crate) struct Instance<N, I> {
    deps: InstanceDeps<N, I>,
    generation: u64,
    queue: LockQueue,
    history: History,
    published: watch::Sender<LockQueue>,
    /// Wakes the holder's waiter when its release arrives
    release_route: Option<(GrantToken, oneshot::Sender<()>)>,
    waiters: JoinSet<()>,
    waiter_tx: mpsc::UnboundedSender<WaiterEvent>,
    waiter_rx: mpsc::UnboundedReceiver<WaiterEvent>,
}

impl<N, I> Instance<N, I>
where
    N: ParticipantNotifier,
    I: IdGen + 'static,
{
    /// Start a generation from carried state
    pub(crate) fn resume(deps: InstanceDeps<N, I>, checkpoint: Checkpoint, generation: u64) -> Self {
        let (queue, effects) = LockQueue::restore(checkpoint);
        let (published, _) = watch::channel(queue.clone());
        let (waiter_tx, waiter_rx) = mpsc::unbounded_channel();
        let history = History::new(deps.max_history);

        let mut instance = Self {
            deps,
            generation,
            queue,
            history,
            published,
            release_route: None,
            waiters: JoinSet::new(),
            waiter_tx,
            waiter_rx,
        };
        for effect in effects {
            instance.execute(effect);
        }
        instance
    }

    pub(crate) async fn run(mut self, inbox: &mut Inbox) -> InstanceExit {
        loop {
            while self.waiters.try_join_next().is_some() {}

            if self.queue.is_drained() {
                match self.deps.registry.retire(&self.deps.key, inbox) {
                    None => {
                        tracing::info!(generation = self.generation, "queue drained, stopping");
                        return InstanceExit::Drained;
                    }
                    Some(message) => {
                        self.handle_message(message);
                        continue;
                    }
                }
            }

            if self.queue.ready_to_checkpoint() {
                let checkpoint = self.queue.checkpoint();
                tracing::info!(
                    generation = self.generation,
                    history_len = self.history.len(),
                    queue_len = checkpoint.queue.len(),
                    "continuing as new"
                );
                return InstanceExit::ContinueAsNew(checkpoint);
            }

            tokio::select! {
                biased;
                Some(event) = self.waiter_rx.recv() => self.handle_waiter_event(event),
                message = inbox.recv() => match message {
                    Some(message) => self.handle_message(message),
                    None => {
                        self.cancel_queued().await;
                        return InstanceExit::Closed;
                    }
                },
            }
        }
    }

    fn handle_message(&mut self, message: CoordinatorMessage) {
        self.apply(message.into_input());
    }

    fn handle_waiter_event(&mut self, event: WaiterEvent) {
        match event {
            WaiterEvent::Claim {
                requester,
                token,
                reply,
            } => {
                self.apply(LockInput::Claim {
                    requester,
                    token: token.clone(),
                });

                let granted = self.queue.holder().is_some_and(|g| g.token == token);
                if granted {
                    let (release_tx, release_rx) = oneshot::channel();
                    self.release_route = Some((token, release_tx));
                    let _ = reply.send(Some(release_rx));
                } else {
                    let _ = reply.send(None);
                }
            }
            WaiterEvent::Finished { requester, outcome } => {
                self.apply(LockInput::Finished { requester, outcome });
            }
        }
    }

    /// Record and apply one input
    fn apply(&mut self, input: LockInput) {
        self.history.record(&input);
        let (next, effects) = self.queue.transition(input);
        self.queue = next;
        for effect in effects {
            self.execute(effect);
        }

        if self.queue.holder().is_none() {
            self.release_route = None;
        }

        if self.history.should_continue_as_new() && !self.queue.is_sealed() {
            self.apply(LockInput::Seal);
        } else {
            self.publish_status();
        }
    }

    fn execute(&mut self, effect: Effect) {
        let span = tracing::info_span!("effect", effect = effect.name());
        let _guard = span.enter();
        tracing::debug!(fields = ?effect.fields(), "executing");

        match effect {
            Effect::Emit(event) => log_event(&event),

            Effect::SpawnWaiter { requester } => {
                let waiter = Waiter {
                    requester: requester.clone(),
                    resource: self.queue.resource.clone(),
                    unlock_timeout: self.queue.unlock_timeout,
                    queue: self.published.subscribe(),
                    events: self.waiter_tx.clone(),
                    notifier: self.deps.notifier.clone(),
                    id_gen: self.deps.id_gen.clone(),
                };
                let span = tracing::info_span!("waiter", requester = %requester);
                self.waiters.spawn(waiter.run().instrument(span));
            }

            Effect::Publish => {
                self.published.send_replace(self.queue.clone());
                self.publish_status();
            }

            Effect::ReleaseHolder { token, .. } => match self.release_route.take() {
                Some((routed, release)) if routed == token => {
                    let _ = release.send(());
                }
                other => self.release_route = other,
            },
        }
    }

    fn publish_status(&self) {
        self.deps.status.send_replace(CoordinatorStatus::of(
            &self.queue,
            self.generation,
            self.history.len(),
        ));
    }

    /// Tell every requester still waiting that no grant is coming
    async fn cancel_queued(&mut self) {
        self.waiters.abort_all();

        let waiting: Vec<RequesterId> = self
            .queue
            .requesters()
            .into_iter()
            .filter(|r| !self.queue.is_held_by(r))
            .collect();
        tracing::info!(waiting = waiting.len(), "inbox closed, canceling queued requesters");

        for requester in waiting {
            let message = ParticipantMessage::Canceled {
                resource: self.queue.resource.clone(),
            };
            let _ = tokio::time::timeout(
                self.queue.unlock_timeout,
                self.deps.notifier.notify(&requester, message),
            )
            .await;
        }
    }
}

fn log_event(event: &Event) {
    match event {
        Event::StaleRelease { .. }
        | Event::DuplicateRequest { .. }
        | Event::ClaimDenied { .. } => tracing::debug!(event = event.name(), ?event, "event"),
        Event::UnlockTimedOut { .. } | Event::RequesterUnreachable { .. } => {
            tracing::warn!(event = event.name(), ?event, "event")
        }
        _ => tracing::info!(event = event.name(), ?event, "event"),
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
