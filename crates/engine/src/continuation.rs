// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generation driver for continue-as-new
//!
//! Runs coordinator instances back to back on the same inbox. Each
//! continue-as-new starts the next generation from the previous checkpoint,
//! so queued requesters keep their order and signals sent during the
//! hand-off wait in the inbox for the successor.

use crate::coordinator::{Instance, InstanceDeps, InstanceExit};
use crate::registry::Inbox;
use mq_adapters::ParticipantNotifier;
use mq_core::{Checkpoint, IdGen};

pub(crate) async fn drive<N, I>(deps: InstanceDeps<N, I>, checkpoint: Checkpoint, mut inbox: Inbox)
where
    N: ParticipantNotifier,
    I: IdGen + 'static,
{
    let mut checkpoint = checkpoint;
    let mut generation = 0u64;

    loop {
        let instance = Instance::resume(deps.clone(), checkpoint, generation);
        match instance.run(&mut inbox).await {
            InstanceExit::ContinueAsNew(next) => {
                generation += 1;
                tracing::debug!(generation, queue = ?next.queue, "starting successor");
                checkpoint = next;
            }
            InstanceExit::Drained | InstanceExit::Closed => break,
        }
    }

    tracing::info!(generations = generation + 1, "coordinator stopped");
}
