// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-instance coordinator history
//!
//! Every input a coordinator instance handles is appended here. When the
//! history reaches its limit the instance continues as new, which starts a
//! fresh history for the successor.

use super::lock::LockInput;
use serde::{Deserialize, Serialize};

/// A recorded input with its sequence number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub seq: u64,
    pub input: LockInput,
}

/// Bounded-by-policy input history for one coordinator instance
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    limit: usize,
}

impl History {
    /// A limit of zero is treated as one
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Append an input, returning its sequence number
    pub fn record(&mut self, input: &LockInput) -> u64 {
        let seq = self.entries.len() as u64 + 1;
        self.entries.push(HistoryEntry {
            seq,
            input: input.clone(),
        });
        seq
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// History is large enough that the instance should continue as new
    pub fn should_continue_as_new(&self) -> bool {
        self.entries.len() >= self.limit
    }
}
