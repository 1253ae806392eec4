// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator start, drain and shutdown.

use crate::prelude::*;
use crate::prelude::assert_eq;

#[tokio::test(start_paused = true)]
async fn status_reports_holder_and_queue() {
    let cluster = Cluster::new();
    let _a = cluster.request("A").await;
    let _b = cluster.request("B").await;
    let _c = cluster.request("C").await;

    let status = cluster.status().unwrap();
    assert_eq!(status.resource, cluster.resource());
    assert_eq!(status.generation, 0);
    assert_eq!(status.holder, Some(RequesterId::new("A")));
    assert_eq!(status.queue, requesters(&["A", "B", "C"]));
    assert!(!status.sealed);
}

#[tokio::test(start_paused = true)]
async fn coordinator_stops_once_drained_and_restarts_on_demand() {
    let cluster = Cluster::new();
    cluster
        .request("A")
        .await
        .granted()
        .await
        .unlock().unwrap();
    cluster.wait_until_idle().await;
    assert!(cluster.status().is_none());

    cluster
        .request("B")
        .await
        .granted()
        .await
        .unlock().unwrap();
    cluster.wait_until_idle().await;
    assert_eq!(cluster.grant_log(), names(&["A", "B"]));
}

#[tokio::test(start_paused = true)]
async fn shutdown_revokes_waiting_participants() {
    let cluster = Cluster::new();
    let _a = cluster.request("A").await.granted().await;
    let b = cluster.request("B").await;

    cluster.shutdown().await;

    assert!(matches!(
        b.outcome().await,
        Err(LockError::Revoked(resource)) if resource == RESOURCE
    ));
    assert!(cluster.status().is_none());
}
