// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordering and exclusion properties of the lock.

use crate::prelude::*;
use crate::prelude::assert_eq;

#[tokio::test(start_paused = true)]
async fn many_participants_hold_the_lock_one_at_a_time() {
    let cluster = Cluster::new();
    let order: Vec<String> = (0..12).map(|i| format!("P{:02}", i)).collect();

    let mut requests = Vec::new();
    for name in &order {
        requests.push(
            cluster
                .request_and_release(name, Duration::from_millis(5))
                .await,
        );
    }
    for request in requests {
        request.granted().await;
    }

    assert_eq!(cluster.grant_log(), order);
    assert_eq!(cluster.max_concurrent_holders(), 1);
}

#[tokio::test(start_paused = true)]
async fn canceling_a_waiter_keeps_the_others_in_order() {
    let cluster = Cluster::new();
    let a = cluster.request("A").await;
    let b = cluster.request("B").await;
    let c = cluster.request("C").await;
    let d = cluster.request("D").await;
    let e = cluster.request("E").await;

    c.cancel();
    assert!(matches!(c.outcome().await, Err(LockError::Canceled)));

    for request in [a, b, d, e] {
        request.granted().await.unlock().unwrap();
    }

    cluster.wait_until_idle().await;
    assert_eq!(cluster.grant_log(), names(&["A", "B", "D", "E"]));
}

#[tokio::test(start_paused = true)]
async fn holder_that_never_unlocks_loses_the_lock_after_the_timeout() {
    let cluster = Cluster::new();
    let _a = cluster.request("A").await.granted().await;
    let b = cluster.request("B").await;
    let started = tokio::time::Instant::now();

    let mut b = b.granted().await;

    assert!(started.elapsed() >= UNLOCK_TIMEOUT - Duration::from_millis(10));
    assert_eq!(cluster.grant_log(), names(&["A", "B"]));
    b.unlock().unwrap();
}

#[tokio::test(start_paused = true)]
async fn unlocking_twice_releases_once() {
    let cluster = Cluster::new();
    let a = cluster.request("A").await;
    let b = cluster.request("B").await;
    let _c = cluster.request("C").await;

    let mut a = a.granted().await;
    a.unlock().unwrap();
    a.unlock().unwrap();
    assert!(a.token().is_none());

    let _b = b.granted().await;
    settle().await;

    let status = cluster.status().unwrap();
    assert_eq!(status.holder, Some(RequesterId::new("B")));
    assert_eq!(status.queue, requesters(&["B", "C"]));
}
