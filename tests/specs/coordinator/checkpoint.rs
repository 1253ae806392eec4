// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Continue-as-new and restoring from a checkpoint.

use crate::prelude::*;
use crate::prelude::assert_eq;

#[tokio::test(start_paused = true)]
async fn restored_queue_is_granted_in_order() {
    let cluster = Cluster::new();
    let requests = cluster
        .resume(&["A", "B", "C"], Duration::from_millis(20))
        .await;

    for request in requests {
        request.granted().await;
    }

    assert_eq!(cluster.grant_log(), names(&["A", "B", "C"]));
    cluster.wait_until_idle().await;
}

#[tokio::test(start_paused = true)]
async fn order_survives_continue_as_new() {
    let cluster = Cluster::with_config(CoordinatorConfig::default().with_max_history(5));
    let order: Vec<String> = (0..8).map(|i| format!("P{}", i)).collect();

    let mut requests = Vec::new();
    for name in &order {
        requests.push(
            cluster
                .request_and_release(name, Duration::from_millis(5))
                .await,
        );
    }

    let mut generation = 0;
    while requests.iter().any(Request::is_pending) {
        if let Some(status) = cluster.status() {
            generation = generation.max(status.generation);
        }
        settle().await;
    }
    for request in requests {
        request.granted().await;
    }

    assert!(generation > 0, "coordinator never continued as new");
    assert_eq!(cluster.grant_log(), order);
    assert_eq!(cluster.max_concurrent_holders(), 1);
}
