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

use alloy::{primitives::Address, providers::ProviderBuilder};
use anyhow::{Context, Result};
use clap::Args;
use venti_migration::{
    Migration, PipelineOptions, PoolSubmitter, UnmatchedPolicy, DEFAULT_MAX_BATCH_SIZE,
};

use crate::config::GlobalConfig;

/// Command to migrate staker state into a freshly deployed pool.
///
/// Batches are submitted strictly in order and the run stops on the first
/// failure; re-run with `--resume-from-batch` set to the failed index once
/// the cause is resolved. Batches committed before a failure stay committed.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct Migrate {
    /// Path to the primary staker snapshot CSV (account,staked,timestamp,lock,paid).
    #[clap(long)]
    pub snapshot: PathBuf,
    /// Path to the supplemental deposits CSV (account,extra).
    #[clap(long)]
    pub deposits: PathBuf,
    /// Address of the freshly deployed destination staking pool.
    #[clap(long, env = "STAKING_ADDRESS")]
    pub staking_address: Address,
    /// Maximum records per stakeOnBehalfOfAll transaction.
    #[clap(long, default_value_t = DEFAULT_MAX_BATCH_SIZE)]
    pub max_batch_size: usize,
    /// Drop supplemental deposits with no matching staker instead of failing.
    #[clap(long)]
    pub allow_unmatched: bool,
    /// First batch index to submit. Use to resume a partially completed run.
    #[clap(long, default_value_t = 0)]
    pub resume_from_batch: usize,
}

impl Migrate {
    /// Run the [Migrate] command.
    pub async fn run(&self, global_config: &GlobalConfig) -> Result<()> {
        let rpc_url = global_config.require_rpc_url()?;
        let tx_signer = global_config.require_private_key()?;

        // Connect to the chain.
        let provider = ProviderBuilder::new()
            .wallet(tx_signer.clone())
            .connect(rpc_url.as_str())
            .await
            .with_context(|| format!("failed to connect provider to {rpc_url}"))?;

        let submitter = PoolSubmitter::new(self.staking_address, provider)
            .with_timeout(global_config.tx_timeout);
        let mut migration = Migration::new(submitter).resume_from(self.resume_from_batch);

        let options = PipelineOptions {
            max_batch_size: self.max_batch_size,
            unmatched: if self.allow_unmatched {
                UnmatchedPolicy::Warn
            } else {
                UnmatchedPolicy::Deny
            },
        };

        let report = migration
            .run_from_snapshots(&self.snapshot, &self.deposits, &options)
            .await
            .context("state migration halted")?;

        if report.skipped > 0 {
            tracing::info!(
                "Skipped {} batch(es) below the resume offset as already committed",
                report.skipped
            );
        }
        tracing::info!(
            "State migration is complete: {} batch(es), {} record(s) committed to {}",
            report.batches.len(),
            report.records_committed(),
            self.staking_address
        );

        Ok(())
    }
}
