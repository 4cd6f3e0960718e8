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

use alloy::{
    primitives::{utils::format_units, Address},
    providers::ProviderBuilder,
};
use anyhow::{Context, Result};
use clap::Args;
use venti_migration::IVentiStake;

use crate::config::GlobalConfig;

/// Command to show a staking pool's on-chain summary.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct Status {
    /// Address of the staking pool to inspect.
    pub pool_address: Address,
}

impl Status {
    /// Run the [Status] command.
    pub async fn run(&self, global_config: &GlobalConfig) -> Result<()> {
        let rpc_url = global_config.require_rpc_url()?;

        // Connect to the chain.
        let provider = ProviderBuilder::new()
            .connect(rpc_url.as_str())
            .await
            .with_context(|| format!("failed to connect provider to {rpc_url}"))?;

        let pool = IVentiStake::new(self.pool_address, provider);
        let supply = pool.totalSupply().call().await?;
        let rewards = pool.totalRewards().call().await?;
        let active = pool.isActive().call().await?;

        tracing::info!("Pool {}", self.pool_address);
        tracing::info!("Total staked: {} VST", format_units(supply, 18)?);
        tracing::info!("Undistributed rewards: {} VST", format_units(rewards, 18)?);
        tracing::info!("Active: {active}");

        Ok(())
    }
}
