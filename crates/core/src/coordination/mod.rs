// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination primitives for fair mutual exclusion
//!
//! This module provides:
//! - **LockQueue** - FIFO queue of requesters with a single outstanding grant
//! - **Checkpoint** - The state carried when a coordinator continues as new
//! - **History** - Per-instance input log that triggers continue-as-new

pub mod checkpoint;
pub mod history;
pub mod lock;

pub use checkpoint::Checkpoint;
pub use history::{History, HistoryEntry};
pub use lock::{
    Eligibility, Grant, GrantToken, LockInput, LockQueue, RequesterId, ResourceId, WaiterOutcome,
};
