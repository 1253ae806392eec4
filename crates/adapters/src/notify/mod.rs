// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Participant notification adapters
//!
//! The coordinator reaches participants only through [`ParticipantNotifier`].
//! A failed delivery means the participant is gone; the coordinator treats
//! that as an implicit release rather than an error of its own.

mod mailbox;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use mailbox::{Mailbox, MailboxRegistry};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNotifier, NotifyCall};

use async_trait::async_trait;
use mq_core::{GrantToken, RequesterId, ResourceId};
use thiserror::Error;

/// Errors that can occur delivering to a participant
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("requester unreachable: {0}")]
    Unreachable(String),
    #[error("requester already has a mailbox: {0}")]
    AlreadyRegistered(String),
}

/// Messages the coordinator sends to a participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantMessage {
    /// The lock is yours; release it with `token`
    Granted {
        resource: ResourceId,
        token: GrantToken,
    },
    /// You will not be granted this lock
    Canceled { resource: ResourceId },
    /// Your withdrawal was processed and the queue entry is gone
    Withdrawn { resource: ResourceId },
}

impl ParticipantMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ParticipantMessage::Granted { .. } => "granted",
            ParticipantMessage::Canceled { .. } => "canceled",
            ParticipantMessage::Withdrawn { .. } => "withdrawn",
        }
    }
}

/// Adapter for delivering coordinator messages to participants
#[async_trait]
pub trait ParticipantNotifier: Clone + Send + Sync + 'static {
    async fn notify(
        &self,
        requester: &RequesterId,
        message: ParticipantMessage,
    ) -> Result<(), NotifyError>;
}
