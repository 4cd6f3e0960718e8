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
    primitives::{
        utils::{format_units, parse_units},
        Address, U256,
    },
    providers::{Provider, ProviderBuilder},
};
use anyhow::{anyhow, ensure, Context, Result};
use clap::Args;
use venti_migration::{Deployment, IVentiStake, IERC20};

use crate::config::GlobalConfig;

/// Command to fund and enable the destination pool after a migration.
///
/// Transfers tokens backing the migrated principal to the pool, funds the
/// reward schedule, and enables staking. The operator wallet must hold
/// enough VST to cover both.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct Activate {
    /// Address of the freshly deployed destination staking pool.
    #[clap(long, env = "STAKING_ADDRESS")]
    pub staking_address: Address,
    /// Amount of reward tokens to fund, in whole VST.
    #[clap(long)]
    pub rewards: String,
    /// Configuration for the VentiSwap deployment to use.
    #[clap(flatten, next_help_heading = "VentiSwap Deployment")]
    pub deployment: Option<Deployment>,
}

impl Activate {
    /// Run the [Activate] command.
    pub async fn run(&self, global_config: &GlobalConfig) -> Result<()> {
        let rpc_url = global_config.require_rpc_url()?;
        let tx_signer = global_config.require_private_key()?;

        // Connect to the chain.
        let provider = ProviderBuilder::new()
            .wallet(tx_signer.clone())
            .connect(rpc_url.as_str())
            .await
            .with_context(|| format!("failed to connect provider to {rpc_url}"))?;
        let chain_id = provider.get_chain_id().await?;
        let deployment = self.deployment.clone().or_else(|| Deployment::from_chain_id(chain_id))
            .context("could not determine deployment from chain ID; please specify deployment explicitly")?;

        let reward_amount: U256 = parse_units(&self.rewards, 18)
            .map_err(|e| anyhow!("Failed to parse reward amount: {}", e))?
            .into();

        let pool = IVentiStake::new(self.staking_address, provider.clone());
        let token = IERC20::new(deployment.token_address, provider.clone());

        // The migrated supply is bookkeeping only until real tokens back it.
        let supply = pool.totalSupply().call().await?;
        if supply > U256::ZERO {
            tracing::info!(
                "Backing {} VST of migrated principal on {}",
                format_units(supply, 18)?,
                self.staking_address
            );
            let receipt = token
                .transfer(self.staking_address, supply)
                .send()
                .await
                .context("Sending principal transfer failed")?
                .with_timeout(global_config.tx_timeout)
                .get_receipt()
                .await
                .context("Failed to receive principal transfer receipt")?;
            ensure!(
                receipt.status(),
                "principal transfer reverted: tx_hash = {}",
                receipt.transaction_hash
            );
        }

        let receipt = token
            .approve(self.staking_address, reward_amount)
            .send()
            .await
            .context("Sending reward approval failed")?
            .with_timeout(global_config.tx_timeout)
            .get_receipt()
            .await
            .context("Failed to receive reward approval receipt")?;
        ensure!(
            receipt.status(),
            "reward approval reverted: tx_hash = {}",
            receipt.transaction_hash
        );

        let receipt = pool
            .fundStaking(reward_amount)
            .send()
            .await
            .context("Sending fundStaking transaction failed")?
            .with_timeout(global_config.tx_timeout)
            .get_receipt()
            .await
            .context("Failed to receive fundStaking receipt")?;
        ensure!(receipt.status(), "fundStaking reverted: tx_hash = {}", receipt.transaction_hash);
        tracing::info!("Funded reward schedule with {} VST", format_units(reward_amount, 18)?);

        let receipt = pool
            .enableStaking()
            .send()
            .await
            .context("Sending enableStaking transaction failed")?
            .with_timeout(global_config.tx_timeout)
            .get_receipt()
            .await
            .context("Failed to receive enableStaking receipt")?;
        ensure!(receipt.status(), "enableStaking reverted: tx_hash = {}", receipt.transaction_hash);

        ensure!(pool.isActive().call().await?, "destination pool did not activate");
        tracing::info!("Destination pool {} is live", self.staking_address);

        Ok(())
    }
}
