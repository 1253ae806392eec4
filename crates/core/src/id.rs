// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unique suffixes for grant tokens
//!
//! Every grant carries a token naming its requester plus a suffix that is
//! never reused, so a late release from an earlier grant cannot free a
//! later one. Tests swap in [`SequentialIdGen`] to get predictable tokens.

use crate::coordination::{GrantToken, RequesterId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of unique suffixes
pub trait IdGen: Clone + Send + Sync {
    fn next(&self) -> String;

    /// Token for a fresh grant to `requester`
    fn grant_token(&self, requester: &RequesterId) -> GrantToken {
        GrantToken::generate(requester, &self.next())
    }
}

/// Random v4 UUID suffixes
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// `<prefix>-1`, `<prefix>-2`, ... shared by every clone
#[derive(Clone, Debug)]
pub struct SequentialIdGen {
    prefix: Arc<str>,
    issued: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().into(),
            issued: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of suffixes handed out so far
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new("t")
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self) -> String {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{}", self.prefix, n)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
