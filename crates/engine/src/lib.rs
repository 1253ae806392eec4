// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Mutex queue coordination engine
//!
//! One coordinator task owns each resource's queue. Waiter tasks, one per
//! queued requester, decide when their requester reaches the head and hand
//! the grant out through the participant notifier.

mod client;
mod continuation;
mod coordinator;
mod error;
mod registry;
mod service;
mod waiter;

pub use client::{Mutex, UnlockHandle};
pub use coordinator::CoordinatorStatus;
pub use error::{CoordinatorError, LockError};
pub use service::LockService;
pub use tokio_util::sync::CancellationToken;
