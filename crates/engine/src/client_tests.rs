// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::CoordinatorError;
use mq_core::{CoordinatorConfig, SequentialIdGen};
use tokio::time::Instant;

const TIMEOUT: Duration = Duration::from_secs(5);

fn resource() -> ResourceId {
    ResourceId::new("shared")
}

fn service() -> LockService<MailboxRegistry, SequentialIdGen> {
    LockService::with_id_gen(
        CoordinatorConfig::default(),
        MailboxRegistry::new(),
        SequentialIdGen::new("g"),
    )
    .unwrap()
}

fn participant(
    service: &LockService<MailboxRegistry, SequentialIdGen>,
    name: &str,
) -> Mutex<SequentialIdGen> {
    Mutex::new(service.clone(), RequesterId::new(name))
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test(start_paused = true)]
async fn lock_and_unlock_single_participant() {
    let service = service();
    let mutex = participant(&service, "A");
    let cancel = CancellationToken::new();

    let mut handle = mutex
        .lock_with_cancellation(&resource(), TIMEOUT, &cancel)
        .await
        .unwrap();

    assert_eq!(handle.resource(), &resource());
    assert_eq!(
        handle.token(),
        Some(&GrantToken::new("unlock-event-A-g-1"))
    );

    handle.unlock().unwrap();
    assert!(handle.token().is_none());
    // Second unlock is a no-op
    handle.unlock().unwrap();

    while service.is_running(&resource()) {
        settle().await;
    }
}

#[tokio::test(start_paused = true)]
async fn second_participant_waits_for_unlock() {
    let service = service();
    let first = participant(&service, "A");
    let second = participant(&service, "B");
    let cancel = CancellationToken::new();

    let mut held = first
        .lock_with_cancellation(&resource(), TIMEOUT, &cancel)
        .await
        .unwrap();

    let waiting_cancel = cancel.clone();
    let waiting = tokio::spawn(async move {
        second
            .lock_with_cancellation(&resource(), TIMEOUT, &waiting_cancel)
            .await
    });
    settle().await;
    assert!(!waiting.is_finished());

    held.unlock().unwrap();

    let handle = waiting.await.unwrap().unwrap();
    assert_eq!(
        handle.token().map(|t| t.0.starts_with("unlock-event-B-")),
        Some(true)
    );
}

#[tokio::test(start_paused = true)]
async fn canceled_waiter_returns_canceled_and_is_skipped() {
    let service = service();
    let holder = participant(&service, "A");
    let quitter = participant(&service, "B");
    let next = participant(&service, "C");
    let cancel = CancellationToken::new();

    let mut held = holder
        .lock_with_cancellation(&resource(), TIMEOUT, &cancel)
        .await
        .unwrap();

    let quit = CancellationToken::new();
    let quit_clone = quit.clone();
    let quitting = tokio::spawn(async move {
        quitter
            .lock_with_cancellation(&resource(), TIMEOUT, &quit_clone)
            .await
    });
    settle().await;

    let next_cancel = cancel.clone();
    let next_task = tokio::spawn(async move {
        next.lock_with_cancellation(&resource(), TIMEOUT, &next_cancel)
            .await
    });
    settle().await;

    quit.cancel();
    let result = quitting.await.unwrap();
    assert!(matches!(result, Err(LockError::Canceled)));

    let start = Instant::now();
    held.unlock().unwrap();
    let handle = next_task.await.unwrap().unwrap();

    assert!(handle.token().is_some());
    assert!(start.elapsed() < TIMEOUT);
}

#[tokio::test(start_paused = true)]
async fn already_canceled_token_returns_canceled() {
    let service = service();
    let mutex = participant(&service, "A");
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = mutex
        .lock_with_cancellation(&resource(), TIMEOUT, &cancel)
        .await;

    assert!(matches!(result, Err(LockError::Canceled)));
    while service.is_running(&resource()) {
        settle().await;
    }
}

#[tokio::test(start_paused = true)]
async fn unreleased_lock_expires_after_unlock_timeout() {
    let service = service();
    let forgetful = participant(&service, "A");
    let patient = participant(&service, "B");
    let cancel = CancellationToken::new();

    let _never_unlocked = forgetful
        .lock_with_cancellation(&resource(), TIMEOUT, &cancel)
        .await
        .unwrap();
    let start = Instant::now();

    let handle = patient
        .lock_with_cancellation(&resource(), TIMEOUT, &cancel)
        .await
        .unwrap();

    assert!(handle.token().is_some());
    assert!(start.elapsed() >= TIMEOUT - Duration::from_millis(1));
}

#[tokio::test(start_paused = true)]
async fn abandoned_participant_is_skipped() {
    let service = service();
    let holder = participant(&service, "A");
    let abandoned = participant(&service, "B");
    let next = participant(&service, "C");
    let cancel = CancellationToken::new();

    let mut held = holder
        .lock_with_cancellation(&resource(), TIMEOUT, &cancel)
        .await
        .unwrap();

    let abandon_cancel = cancel.clone();
    let abandoned_task = tokio::spawn(async move {
        abandoned
            .lock_with_cancellation(&resource(), TIMEOUT, &abandon_cancel)
            .await
    });
    settle().await;
    // Dropping the future drops its mailbox without a withdrawal
    abandoned_task.abort();
    let _ = abandoned_task.await;

    let next_cancel = cancel.clone();
    let next_task = tokio::spawn(async move {
        next.lock_with_cancellation(&resource(), TIMEOUT, &next_cancel)
            .await
    });
    settle().await;

    let start = Instant::now();
    held.unlock().unwrap();
    let handle = next_task.await.unwrap().unwrap();

    assert!(handle.token().is_some());
    assert!(start.elapsed() < TIMEOUT);
}

#[tokio::test(start_paused = true)]
async fn shutdown_revokes_waiting_participant() {
    let service = service();
    let holder = participant(&service, "A");
    let waiter = participant(&service, "B");
    let cancel = CancellationToken::new();

    let _held = holder
        .lock_with_cancellation(&resource(), TIMEOUT, &cancel)
        .await
        .unwrap();
    let waiting_cancel = cancel.clone();
    let waiting = tokio::spawn(async move {
        waiter
            .lock_with_cancellation(&resource(), TIMEOUT, &waiting_cancel)
            .await
    });
    settle().await;

    service.shutdown().await;

    let result = waiting.await.unwrap();
    assert!(matches!(result, Err(LockError::Revoked(r)) if r == "shared"));
}

#[tokio::test(start_paused = true)]
async fn retry_after_cancel_is_granted() {
    let service = service();
    let holder = participant(&service, "A");
    let retrying = participant(&service, "B");
    let cancel = CancellationToken::new();

    let mut held = holder
        .lock_with_cancellation(&resource(), TIMEOUT, &cancel)
        .await
        .unwrap();

    let gave_up = CancellationToken::new();
    gave_up.cancel();
    let first = retrying
        .lock_with_cancellation(&resource(), TIMEOUT, &gave_up)
        .await;
    assert!(matches!(first, Err(LockError::Canceled)));

    let retry_cancel = cancel.clone();
    let retry = tokio::spawn(async move {
        retrying
            .lock_with_cancellation(&resource(), TIMEOUT, &retry_cancel)
            .await
    });
    settle().await;
    assert!(!retry.is_finished());

    let start = Instant::now();
    held.unlock().unwrap();
    let handle = retry.await.unwrap().unwrap();

    assert_eq!(
        handle.token().map(|t| t.0.starts_with("unlock-event-B-")),
        Some(true)
    );
    assert!(start.elapsed() < TIMEOUT);
}

#[tokio::test(start_paused = true)]
async fn unlock_after_shutdown_reports_closed_service() {
    let service = service();
    let mutex = participant(&service, "A");
    let cancel = CancellationToken::new();

    let mut handle = mutex
        .lock_with_cancellation(&resource(), TIMEOUT, &cancel)
        .await
        .unwrap();
    service.shutdown().await;

    let result = handle.unlock();
    assert!(matches!(
        result,
        Err(LockError::Coordinator(CoordinatorError::ServiceClosed))
    ));
    // The token is spent either way
    handle.unlock().unwrap();
}

#[tokio::test(start_paused = true)]
async fn grant_for_another_resource_is_handed_back() {
    let service = service();
    let holder = participant(&service, "A");
    let waiter = participant(&service, "B");
    let cancel = CancellationToken::new();
    let other = ResourceId::new("other");

    let mut held = holder
        .lock_with_cancellation(&resource(), TIMEOUT, &cancel)
        .await
        .unwrap();
    let waiting_cancel = cancel.clone();
    let waiting = tokio::spawn(async move {
        waiter
            .lock_with_cancellation(&resource(), TIMEOUT, &waiting_cancel)
            .await
    });
    settle().await;

    // B is queued elsewhere without a client waiting on that lock
    service
        .signal_with_start(&other, RequesterId::new("B"), TIMEOUT)
        .unwrap();
    settle().await;

    assert!(!service.is_running(&other));
    assert!(!waiting.is_finished());

    held.unlock().unwrap();
    assert!(waiting.await.unwrap().is_ok());
}
