// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mq-core: Core library for the mutex queue (mq) coordinator
//!
//! This crate provides:
//! - The pure lock queue state machine and its inputs
//! - Effect and event types the coordinator executes and logs
//! - Checkpoint and history types for continue-as-new
//! - Coordinator configuration

pub mod config;
pub mod coordination;
pub mod effect;
pub mod id;
pub mod traced;

// Re-exports
pub use config::{ConfigError, CoordinatorConfig};
pub use coordination::{
    Checkpoint, Eligibility, Grant, GrantToken, History, HistoryEntry, LockInput, LockQueue,
    RequesterId, ResourceId, WaiterOutcome,
};
pub use effect::{Effect, Event};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use traced::TracedEffect;
