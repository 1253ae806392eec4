// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for behavioral specs.
//!
//! A [`Cluster`] is one lock service with the in-process mailbox transport.
//! Participants request the lock through the real client, and every grant is
//! appended to a shared log so specs can assert on grant order.

#![allow(dead_code)]

pub use mq_core::{Checkpoint, CoordinatorConfig, RequesterId, ResourceId};
pub use mq_engine::{CoordinatorStatus, LockError, UnlockHandle};
pub use similar_asserts::assert_eq;
pub use std::time::Duration;

use mq_adapters::MailboxRegistry;
use mq_engine::{CancellationToken, LockService, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

pub const RESOURCE: &str = "mutex_resource";
pub const UNLOCK_TIMEOUT: Duration = Duration::from_secs(10);

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|n| n.to_string()).collect()
}

pub fn requesters(list: &[&str]) -> Vec<RequesterId> {
    list.iter().map(|n| RequesterId::new(*n)).collect()
}

/// Let spawned tasks run until they block again.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

#[derive(Default)]
struct Observed {
    grants: std::sync::Mutex<Vec<String>>,
    inside: AtomicUsize,
    max_inside: AtomicUsize,
}

pub struct Cluster {
    service: LockService<MailboxRegistry>,
    observed: Arc<Observed>,
}

impl Cluster {
    pub fn new() -> Self {
        Self::with_config(CoordinatorConfig::default())
    }

    pub fn with_config(config: CoordinatorConfig) -> Self {
        Self {
            service: LockService::new(config, MailboxRegistry::new()).unwrap(),
            observed: Arc::default(),
        }
    }

    pub fn resource(&self) -> ResourceId {
        ResourceId::new(RESOURCE)
    }

    /// Request the lock for `name` and keep it once granted.
    pub async fn request(&self, name: &str) -> Request {
        let request = self.start_request(name, None);
        // Requests are signaled in call order
        settle().await;
        request
    }

    /// Request the lock for `name` and release it after `hold`.
    pub async fn request_and_release(&self, name: &str, hold: Duration) -> Request {
        let request = self.start_request(name, Some(hold));
        settle().await;
        request
    }

    /// Names in the order their grants arrived.
    pub fn grant_log(&self) -> Vec<String> {
        self.observed
            .grants
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Most participants ever inside the critical section at once.
    pub fn max_concurrent_holders(&self) -> usize {
        self.observed.max_inside.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> Option<CoordinatorStatus> {
        self.service.describe(&self.resource())
    }

    /// Restart the coordinator from a checkpoint holding `queue`.
    ///
    /// Each queued participant is listening (and releases after `hold`)
    /// before the restored coordinator hands out its first grant.
    pub async fn resume(&self, queue: &[&str], hold: Duration) -> Vec<Request> {
        let requests = queue
            .iter()
            .map(|name| self.start_request(name, Some(hold)))
            .collect();

        let checkpoint = Checkpoint::initial(self.resource(), UNLOCK_TIMEOUT)
            .with_queue(requesters(queue));
        self.service.resume(checkpoint).unwrap();

        settle().await;
        requests
    }

    /// Wait for the coordinator to drain and stop.
    pub async fn wait_until_idle(&self) {
        while self.service.is_running(&self.resource()) {
            settle().await;
        }
    }

    pub async fn shutdown(&self) {
        self.service.shutdown().await;
    }

    fn start_request(&self, name: &str, hold: Option<Duration>) -> Request {
        let mutex = Mutex::new(self.service.clone(), RequesterId::new(name));
        let cancel = CancellationToken::new();
        let observed = Arc::clone(&self.observed);
        let resource = self.resource();
        let token = cancel.clone();
        let who = name.to_string();

        let task = tokio::spawn(async move {
            let mut handle = mutex
                .lock_with_cancellation(&resource, UNLOCK_TIMEOUT, &token)
                .await?;

            observed
                .grants
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(who);
            let now_inside = observed.inside.fetch_add(1, Ordering::SeqCst) + 1;
            observed.max_inside.fetch_max(now_inside, Ordering::SeqCst);

            if let Some(hold) = hold {
                tokio::time::sleep(hold).await;
            }
            observed.inside.fetch_sub(1, Ordering::SeqCst);
            if hold.is_some() {
                handle.unlock()?;
            }
            Ok::<_, LockError>(handle)
        });

        Request {
            name: name.to_string(),
            cancel,
            task,
        }
    }
}

/// An in-flight lock request.
pub struct Request {
    pub name: String,
    cancel: CancellationToken,
    task: JoinHandle<Result<UnlockHandle, LockError>>,
}

impl Request {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_pending(&self) -> bool {
        !self.task.is_finished()
    }

    pub async fn outcome(self) -> Result<UnlockHandle, LockError> {
        self.task.await.unwrap()
    }

    pub async fn granted(self) -> UnlockHandle {
        let name = self.name.clone();
        match self.outcome().await {
            Ok(handle) => handle,
            Err(e) => panic!("{} was not granted: {}", name, e),
        }
    }
}
