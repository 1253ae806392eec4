// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock service: create-or-attach access to per-resource coordinators

use crate::continuation;
use crate::coordinator::{CoordinatorStatus, InstanceDeps};
use crate::registry::{CoordinatorHandle, CoordinatorMessage, Registry, RegistryState};
use crate::CoordinatorError;
use mq_adapters::{ParticipantNotifier, TracedNotifier};
use mq_core::{
    Checkpoint, CoordinatorConfig, GrantToken, IdGen, LockQueue, RequesterId, ResourceId,
    UuidIdGen,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::Instrument;

/// Runs one coordinator per resource in the configured namespace
#[derive(Clone)]
pub struct LockService<N, I = UuidIdGen> {
    config: CoordinatorConfig,
    notifier: TracedNotifier<N>,
    id_gen: I,
    registry: Registry,
}

impl<N: ParticipantNotifier> LockService<N, UuidIdGen> {
    pub fn new(config: CoordinatorConfig, notifier: N) -> Result<Self, CoordinatorError> {
        Self::with_id_gen(config, notifier, UuidIdGen)
    }
}

impl<N, I> LockService<N, I>
where
    N: ParticipantNotifier,
    I: IdGen + 'static,
{
    pub fn with_id_gen(
        config: CoordinatorConfig,
        notifier: N,
        id_gen: I,
    ) -> Result<Self, CoordinatorError> {
        config.validate()?;
        Ok(Self {
            config,
            notifier: TracedNotifier::new(notifier),
            id_gen,
            registry: Registry::default(),
        })
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// The undecorated notifier participants register with
    pub fn notifier(&self) -> &N {
        self.notifier.inner()
    }

    /// Coordinator id for `resource` in this service's namespace
    pub fn coordinator_id(&self, resource: &ResourceId) -> String {
        resource.coordinator_id(&self.config.namespace)
    }

    /// Queue `requester` for `resource`, starting the coordinator if needed
    ///
    /// `unlock_timeout` only applies when this call creates the coordinator;
    /// a zero timeout falls back to the configured default.
    pub fn signal_with_start(
        &self,
        resource: &ResourceId,
        requester: RequesterId,
        unlock_timeout: Duration,
    ) -> Result<(), CoordinatorError> {
        let key = self.coordinator_id(resource);
        let message = CoordinatorMessage::Request {
            requester: requester.clone(),
        };

        let mut state = self.registry.lock();
        if state.closed {
            return Err(CoordinatorError::ServiceClosed);
        }

        if let Some(handle) = state.coordinators.get(&key) {
            if handle.inbox.send(message.clone()).is_ok() {
                tracing::debug!(coordinator = %key, %requester, "signaled running coordinator");
                return Ok(());
            }
        }

        let unlock_timeout = if unlock_timeout.is_zero() {
            self.config.unlock_timeout
        } else {
            unlock_timeout
        };
        let checkpoint = Checkpoint::initial(resource.clone(), unlock_timeout);
        tracing::info!(coordinator = %key, %requester, "starting coordinator");
        self.start(&mut state, key, checkpoint, Some(message));
        Ok(())
    }

    /// Signal release of the grant identified by `token`
    ///
    /// A coordinator that already moved on or drained ignores the release;
    /// only a service that has shut down reports an error.
    pub fn release(&self, resource: &ResourceId, token: GrantToken) -> Result<(), CoordinatorError> {
        let key = self.coordinator_id(resource);
        if self
            .registry
            .signal(&key, CoordinatorMessage::Release { token })
        {
            return Ok(());
        }
        if self.registry.is_closed() {
            return Err(CoordinatorError::ServiceClosed);
        }
        tracing::debug!(coordinator = %key, "release for stopped coordinator ignored");
        Ok(())
    }

    /// Best-effort notice that `requester` no longer wants the lock
    pub fn withdraw(&self, resource: &ResourceId, requester: &RequesterId) {
        let key = self.coordinator_id(resource);
        let message = CoordinatorMessage::Withdraw {
            requester: requester.clone(),
        };
        if !self.registry.signal(&key, message) {
            tracing::debug!(coordinator = %key, %requester, "withdraw for stopped coordinator ignored");
        }
    }

    /// Current status of the coordinator for `resource`, if running
    pub fn describe(&self, resource: &ResourceId) -> Option<CoordinatorStatus> {
        let key = self.coordinator_id(resource);
        let state = self.registry.lock();
        state
            .coordinators
            .get(&key)
            .map(|handle| handle.status.borrow().clone())
    }

    pub fn is_running(&self, resource: &ResourceId) -> bool {
        let key = self.coordinator_id(resource);
        self.registry.lock().coordinators.contains_key(&key)
    }

    /// Start a coordinator from a checkpoint
    ///
    /// Fails if a coordinator for the same resource is already running.
    pub fn resume(&self, checkpoint: Checkpoint) -> Result<(), CoordinatorError> {
        let key = self.coordinator_id(&checkpoint.resource);
        let mut state = self.registry.lock();
        if state.closed {
            return Err(CoordinatorError::ServiceClosed);
        }
        if state.coordinators.contains_key(&key) {
            return Err(CoordinatorError::AlreadyRunning(key));
        }

        tracing::info!(coordinator = %key, queue_len = checkpoint.queue.len(), "resuming coordinator");
        self.start(&mut state, key, checkpoint, None);
        Ok(())
    }

    /// Stop every coordinator, canceling requesters still queued
    pub async fn shutdown(&self) {
        let handles: Vec<CoordinatorHandle> = {
            let mut state = self.registry.lock();
            state.closed = true;
            state.coordinators.drain().map(|(_, handle)| handle).collect()
        };

        tracing::info!(coordinators = handles.len(), "shutting down lock service");
        for handle in handles {
            let CoordinatorHandle { inbox, task, .. } = handle;
            drop(inbox);
            let _ = task.await;
        }
    }

    fn start(
        &self,
        state: &mut RegistryState,
        key: String,
        checkpoint: Checkpoint,
        first: Option<CoordinatorMessage>,
    ) {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        if let Some(message) = first {
            // Receiver is alive, so this cannot fail
            let _ = inbox_tx.send(message);
        }

        let initial = LockQueue::new(checkpoint.resource.clone(), checkpoint.unlock_timeout);
        let (status_tx, status_rx) = watch::channel(CoordinatorStatus::of(&initial, 0, 0));

        let deps = InstanceDeps {
            key: key.clone(),
            max_history: self.config.max_history,
            notifier: self.notifier.clone(),
            id_gen: self.id_gen.clone(),
            registry: self.registry.clone(),
            status: Arc::new(status_tx),
        };
        let span = tracing::info_span!("coordinator", id = %key);
        let task = tokio::spawn(continuation::drive(deps, checkpoint, inbox_rx).instrument(span));

        state.coordinators.insert(
            key,
            CoordinatorHandle {
                inbox: inbox_tx,
                status: status_rx,
                task,
            },
        );
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
