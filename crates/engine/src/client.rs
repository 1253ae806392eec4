// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Participant-side mutex client

use crate::{LockError, LockService};
use mq_adapters::{MailboxRegistry, ParticipantMessage};
use mq_core::{GrantToken, IdGen, RequesterId, ResourceId, UuidIdGen};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Acquires resource locks on behalf of one participant
pub struct Mutex<I = UuidIdGen> {
    service: LockService<MailboxRegistry, I>,
    requester: RequesterId,
}

impl<I: IdGen + 'static> Mutex<I> {
    pub fn new(service: LockService<MailboxRegistry, I>, requester: RequesterId) -> Self {
        Self { service, requester }
    }

    pub fn requester(&self) -> &RequesterId {
        &self.requester
    }

    /// Block until the lock on `resource` is granted or `cancel` fires
    ///
    /// On cancellation the coordinator is told to drop the request and
    /// [`LockError::Canceled`] is returned. If a grant raced the
    /// cancellation, the withdrawal releases it.
    pub async fn lock_with_cancellation(
        &self,
        resource: &ResourceId,
        unlock_timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<UnlockHandle<I>, LockError> {
        let mut mailbox = self.service.notifier().register(self.requester.clone())?;
        self.service
            .signal_with_start(resource, self.requester.clone(), unlock_timeout)?;
        tracing::debug!(requester = %self.requester, %resource, "waiting for grant");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.service.withdraw(resource, &self.requester);
                    tracing::info!(requester = %self.requester, %resource, "lock request canceled");
                    return Err(LockError::Canceled);
                }
                message = mailbox.recv() => match message {
                    Some(ParticipantMessage::Granted { resource: granted, token }) if &granted == resource => {
                        tracing::info!(requester = %self.requester, %resource, %token, "lock acquired");
                        return Ok(UnlockHandle {
                            service: self.service.clone(),
                            resource: resource.clone(),
                            token: Some(token),
                        });
                    }
                    Some(ParticipantMessage::Canceled { resource: canceled }) if &canceled == resource => {
                        return Err(LockError::Revoked(resource.0.clone()));
                    }
                    Some(ParticipantMessage::Granted { resource: other, token }) => {
                        // Nobody is waiting on that grant here; hand it back.
                        tracing::warn!(requester = %self.requester, resource = %other, "releasing unexpected grant");
                        if let Err(e) = self.service.release(&other, token) {
                            tracing::debug!(error = %e, "unexpected grant not released");
                        }
                    }
                    Some(other) => {
                        // Withdrawal acknowledgements and cancels for other resources
                        tracing::debug!(kind = other.kind(), "ignoring stale message");
                    }
                    None => return Err(LockError::MailboxClosed),
                },
            }
        }
    }
}

/// Releases a granted lock
pub struct UnlockHandle<I = UuidIdGen> {
    service: LockService<MailboxRegistry, I>,
    resource: ResourceId,
    token: Option<GrantToken>,
}

impl<I: IdGen + 'static> UnlockHandle<I> {
    pub fn resource(&self) -> &ResourceId {
        &self.resource
    }

    /// Token of the grant, until it has been released
    pub fn token(&self) -> Option<&GrantToken> {
        self.token.as_ref()
    }

    /// Release the lock; later calls do nothing
    ///
    /// Fails only when the lock service has shut down.
    pub fn unlock(&mut self) -> Result<(), LockError> {
        match self.token.take() {
            Some(token) => Ok(self.service.release(&self.resource, token)?),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
