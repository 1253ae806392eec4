// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the coordination engine

use mq_adapters::NotifyError;
use mq_core::ConfigError;
use thiserror::Error;

/// Errors raised by the lock service
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("lock service has shut down")]
    ServiceClosed,
    #[error("coordinator already running: {0}")]
    AlreadyRunning(String),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Errors returned to a participant acquiring a lock
#[derive(Debug, Error)]
pub enum LockError {
    /// The caller's cancellation token fired before the grant arrived
    #[error("lock acquisition canceled")]
    Canceled,
    /// The coordinator gave up on this requester
    #[error("coordinator canceled the request for {0}")]
    Revoked(String),
    #[error("participant mailbox closed")]
    MailboxClosed,
    #[error("notify error: {0}")]
    Notify(#[from] NotifyError),
    #[error("coordinator error: {0}")]
    Coordinator(#[from] CoordinatorError),
}
