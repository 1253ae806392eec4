// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Demo command: participants contending for one resource

use anyhow::Result;
use clap::Args;
use mq_adapters::MailboxRegistry;
use mq_core::{CoordinatorConfig, RequesterId, ResourceId};
use mq_engine::{CancellationToken, LockError, LockService, Mutex};
use std::time::Duration;
use tokio::task::JoinSet;

/// Participant letters, in launch order
const LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Args)]
pub struct DemoArgs {
    /// Number of rounds to run
    #[arg(long, default_value_t = 1)]
    pub rounds: u32,

    /// Participants per round (at most 26)
    #[arg(long, default_value_t = 4)]
    pub participants: usize,

    /// Resource the participants contend for
    #[arg(long, default_value = "mutex_resource")]
    pub resource: String,

    /// How long each participant holds the lock
    #[arg(long, default_value = "100ms", value_parser = humantime::parse_duration)]
    pub hold: Duration,

    /// Letter of a participant that gives up right after requesting
    #[arg(long)]
    pub abandon: Option<char>,
}

pub async fn demo(args: DemoArgs, config: CoordinatorConfig) -> Result<()> {
    if args.participants == 0 || args.participants > LETTERS.len() {
        anyhow::bail!(
            "--participants must be between 1 and {}, got {}",
            LETTERS.len(),
            args.participants
        );
    }
    let abandon = args.abandon.map(|c| c.to_ascii_uppercase());

    let unlock_timeout = config.unlock_timeout;
    let service = LockService::new(config, MailboxRegistry::new())?;
    let resource = ResourceId::new(args.resource);
    let mut grants = 0usize;

    for round in 1..=args.rounds {
        tracing::info!(round, participants = args.participants, "starting round");

        let mut participants = JoinSet::new();
        for letter in LETTERS.chars().take(args.participants) {
            let requester = RequesterId::new(format!("{}_{}", letter, uuid::Uuid::new_v4()));
            let mutex = Mutex::new(service.clone(), requester);
            participants.spawn(participate(
                mutex,
                resource.clone(),
                unlock_timeout,
                args.hold,
                abandon == Some(letter),
            ));
        }

        while let Some(joined) = participants.join_next().await {
            if joined?? {
                grants += 1;
            }
        }
    }

    service.shutdown().await;
    println!("done: {} grants", grants);
    Ok(())
}

/// Lock, hold, unlock; returns whether the lock was granted
async fn participate(
    mutex: Mutex,
    resource: ResourceId,
    unlock_timeout: Duration,
    hold: Duration,
    abandon: bool,
) -> Result<bool, LockError> {
    let cancel = CancellationToken::new();
    if abandon {
        cancel.cancel();
    }

    match mutex
        .lock_with_cancellation(&resource, unlock_timeout, &cancel)
        .await
    {
        Ok(mut handle) => {
            println!("granted {}", mutex.requester());
            tokio::time::sleep(hold).await;
            handle.unlock()?;
            Ok(true)
        }
        Err(LockError::Canceled) => {
            println!("canceled {}", mutex.requester());
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
