// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end lock scenarios with real participants.

use crate::prelude::*;
use crate::prelude::assert_eq;

#[tokio::test(start_paused = true)]
async fn four_participants_are_granted_in_arrival_order() {
    let cluster = Cluster::new();
    let mut requests = Vec::new();
    for name in ["A", "B", "C", "D"] {
        requests.push(
            cluster
                .request_and_release(name, Duration::from_millis(50))
                .await,
        );
    }

    for request in requests {
        request.granted().await;
    }

    assert_eq!(cluster.grant_log(), names(&["A", "B", "C", "D"]));
    assert_eq!(cluster.max_concurrent_holders(), 1);
}

#[tokio::test(start_paused = true)]
async fn canceled_waiter_is_never_granted() {
    let cluster = Cluster::new();
    let a = cluster.request("A").await;
    let b = cluster.request("B").await;
    let c = cluster.request("C").await;

    let mut a = a.granted().await;
    b.cancel();
    assert!(matches!(b.outcome().await, Err(LockError::Canceled)));

    a.unlock().unwrap();
    let mut c = c.granted().await;
    c.unlock().unwrap();

    cluster.wait_until_idle().await;
    assert_eq!(cluster.grant_log(), names(&["A", "C"]));
    assert!(cluster.status().is_none());
}

#[tokio::test(start_paused = true)]
async fn lone_participant_is_granted_immediately() {
    let cluster = Cluster::new();
    let started = tokio::time::Instant::now();

    let mut a = cluster.request("A").await.granted().await;

    assert!(started.elapsed() < Duration::from_millis(10));
    assert_eq!(a.resource(), &cluster.resource());
    assert!(a.token().is_some());
    a.unlock().unwrap();
    cluster.wait_until_idle().await;
}
