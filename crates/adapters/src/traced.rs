// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::notify::{NotifyError, ParticipantMessage, ParticipantNotifier};
use async_trait::async_trait;
use mq_core::RequesterId;
use tracing::Instrument;

/// Wrapper that adds tracing to any ParticipantNotifier
#[derive(Clone)]
pub struct TracedNotifier<N> {
    inner: N,
}

impl<N> TracedNotifier<N> {
    pub fn new(inner: N) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &N {
        &self.inner
    }
}

#[async_trait]
impl<N: ParticipantNotifier> ParticipantNotifier for TracedNotifier<N> {
    async fn notify(
        &self,
        requester: &RequesterId,
        message: ParticipantMessage,
    ) -> Result<(), NotifyError> {
        let span = tracing::info_span!("notify", requester = %requester, kind = message.kind());

        async {
            tracing::debug!("delivering");

            let start = std::time::Instant::now();
            let result = self.inner.notify(requester, message).await;
            let elapsed = start.elapsed();

            // An unreachable participant is an expected outcome, not a fault
            match &result {
                Ok(()) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "delivered"),
                Err(e) => tracing::warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "delivery failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
