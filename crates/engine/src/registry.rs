// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live coordinators keyed by coordinator id
//!
//! Creating a coordinator, signalling one, and retiring a drained one all
//! happen under the same lock, so a signal can never land in an inbox whose
//! coordinator has already decided to stop.

use crate::coordinator::CoordinatorStatus;
use mq_core::{GrantToken, LockInput, RequesterId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Signals a coordinator accepts from participants
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CoordinatorMessage {
    Request { requester: RequesterId },
    Release { token: GrantToken },
    Withdraw { requester: RequesterId },
}

impl CoordinatorMessage {
    pub(crate) fn into_input(self) -> LockInput {
        match self {
            CoordinatorMessage::Request { requester } => LockInput::Request { requester },
            CoordinatorMessage::Release { token } => LockInput::Release { token },
            CoordinatorMessage::Withdraw { requester } => LockInput::Withdraw { requester },
        }
    }
}

pub(crate) type Inbox = mpsc::UnboundedReceiver<CoordinatorMessage>;

pub(crate) struct CoordinatorHandle {
    pub(crate) inbox: mpsc::UnboundedSender<CoordinatorMessage>,
    pub(crate) status: watch::Receiver<CoordinatorStatus>,
    pub(crate) task: JoinHandle<()>,
}

#[derive(Default)]
pub(crate) struct RegistryState {
    pub(crate) coordinators: HashMap<String, CoordinatorHandle>,
    pub(crate) closed: bool,
}

#[derive(Clone, Default)]
pub(crate) struct Registry {
    state: Arc<Mutex<RegistryState>>,
}

impl Registry {
    pub(crate) fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Deregister `key` if its inbox is empty
    ///
    /// Returns the pending message instead when one is waiting; the caller
    /// must handle it and try again later.
    pub(crate) fn retire(&self, key: &str, inbox: &mut Inbox) -> Option<CoordinatorMessage> {
        let mut state = self.lock();
        match inbox.try_recv() {
            Ok(message) => Some(message),
            Err(_) => {
                state.coordinators.remove(key);
                None
            }
        }
    }

    /// Deliver `message` to a running coordinator
    ///
    /// Returns false when no coordinator is running under `key`.
    pub(crate) fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub(crate) fn signal(&self, key: &str, message: CoordinatorMessage) -> bool {
        let state = self.lock();
        match state.coordinators.get(key) {
            Some(handle) => handle.inbox.send(message).is_ok(),
            None => false,
        }
    }
}
