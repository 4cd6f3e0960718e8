// Copyright 2025 VentiSwap
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;

use alloy::primitives::{utils::format_units, U256};
use anyhow::{Context, Result};
use clap::Args;
use venti_migration::{
    batch_count_for, load_primary, load_supplemental, merge, partition, total_staked,
    UnmatchedPolicy, DEFAULT_MAX_BATCH_SIZE,
};

use crate::config::GlobalConfig;

/// Command to preview a migration run without touching the chain.
///
/// Loads, merges, and partitions the snapshots exactly as `migrate` would,
/// then prints the batch plan and accounting totals.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct Plan {
    /// Path to the primary staker snapshot CSV (account,staked,timestamp,lock,paid).
    #[clap(long)]
    pub snapshot: PathBuf,
    /// Path to the supplemental deposits CSV (account,extra).
    #[clap(long)]
    pub deposits: PathBuf,
    /// Maximum records per stakeOnBehalfOfAll transaction.
    #[clap(long, default_value_t = DEFAULT_MAX_BATCH_SIZE)]
    pub max_batch_size: usize,
    /// Drop supplemental deposits with no matching staker instead of failing.
    #[clap(long)]
    pub allow_unmatched: bool,
}

impl Plan {
    /// Run the [Plan] command.
    pub async fn run(&self, _global_config: &GlobalConfig) -> Result<()> {
        let primary = load_primary(&self.snapshot)
            .with_context(|| format!("failed to load {}", self.snapshot.display()))?;
        let supplemental = load_supplemental(&self.deposits)
            .with_context(|| format!("failed to load {}", self.deposits.display()))?;

        let policy =
            if self.allow_unmatched { UnmatchedPolicy::Warn } else { UnmatchedPolicy::Deny };
        let outcome = merge(&primary, &supplemental, policy)?;

        let staked =
            total_staked(&outcome.records).context("total staked amount overflows uint256")?;
        let paid = outcome
            .records
            .iter()
            .try_fold(U256::ZERO, |acc, r| acc.checked_add(r.paid))
            .context("total paid amount overflows uint256")?;

        let count = batch_count_for(outcome.records.len(), self.max_batch_size);
        let batches = partition(outcome.records, count);

        tracing::info!(
            "Snapshot: {} staker(s), {} supplemental deposit(s)",
            primary.len(),
            supplemental.len()
        );
        tracing::info!("Total staked to re-establish: {} VST ({staked} wei)", format_units(staked, 18)?);
        tracing::info!("Total rewards paid to date: {} VST", format_units(paid, 18)?);
        if !outcome.unmatched.is_empty() {
            tracing::info!("Unmatched supplemental account(s) dropped: {}", outcome.unmatched.len());
        }
        tracing::info!(
            "Plan: {} batch(es), at most {} record(s) each",
            batches.len(),
            self.max_batch_size
        );
        for (index, batch) in batches.iter().enumerate() {
            tracing::info!("Batch {index}: {} record(s)", batch.len());
        }

        Ok(())
    }
}
