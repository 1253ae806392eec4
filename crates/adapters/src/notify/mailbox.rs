// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process participant mailboxes

use super::{NotifyError, ParticipantMessage, ParticipantNotifier};
use async_trait::async_trait;
use mq_core::RequesterId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Routes coordinator messages to registered participant mailboxes
#[derive(Clone, Default)]
pub struct MailboxRegistry {
    senders: Arc<Mutex<HashMap<RequesterId, mpsc::UnboundedSender<ParticipantMessage>>>>,
}

impl MailboxRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the mailbox for `requester`
    ///
    /// Fails if a live mailbox is already registered under the same id.
    pub fn register(&self, requester: RequesterId) -> Result<Mailbox, NotifyError> {
        let mut senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        if senders.get(&requester).is_some_and(|tx| !tx.is_closed()) {
            return Err(NotifyError::AlreadyRegistered(requester.0));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        senders.insert(requester.clone(), tx);

        Ok(Mailbox {
            requester,
            rx,
            registry: self.clone(),
        })
    }

    /// Check whether `requester` currently has a live mailbox
    pub fn is_registered(&self, requester: &RequesterId) -> bool {
        self.senders
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(requester)
            .is_some_and(|tx| !tx.is_closed())
    }

    fn deregister_closed(&self, requester: &RequesterId) {
        let mut senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        if senders.get(requester).is_some_and(|tx| tx.is_closed()) {
            senders.remove(requester);
        }
    }
}

#[async_trait]
impl ParticipantNotifier for MailboxRegistry {
    async fn notify(
        &self,
        requester: &RequesterId,
        message: ParticipantMessage,
    ) -> Result<(), NotifyError> {
        let sender = self
            .senders
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(requester)
            .cloned();

        match sender {
            Some(tx) => tx
                .send(message)
                .map_err(|_| NotifyError::Unreachable(requester.0.clone())),
            None => Err(NotifyError::Unreachable(requester.0.clone())),
        }
    }
}

/// Receiving end for one participant
///
/// Dropping the mailbox makes the participant unreachable.
pub struct Mailbox {
    requester: RequesterId,
    rx: mpsc::UnboundedReceiver<ParticipantMessage>,
    registry: MailboxRegistry,
}

impl Mailbox {
    pub fn requester(&self) -> &RequesterId {
        &self.requester
    }

    /// Wait for the next message
    pub async fn recv(&mut self) -> Option<ParticipantMessage> {
        self.rx.recv().await
    }

    /// Take a message if one is already waiting
    pub fn try_recv(&mut self) -> Option<ParticipantMessage> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Mailbox {
    fn drop(&mut self) {
        self.rx.close();
        self.registry.deregister_closed(&self.requester);
    }
}

#[cfg(test)]
#[path = "mailbox_tests.rs"]
mod tests;
