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

use std::io::{self, Write};

use alloy::{
    primitives::{utils::format_units, U256},
    providers::{Provider, ProviderBuilder},
};
use anyhow::{anyhow, bail, ensure, Context, Result};
use clap::Args;
use venti_migration::{Deployment, IVentiStake, IERC20};

use crate::config::GlobalConfig;

/// Command to wind down the legacy staking pool before a migration.
///
/// Closes the reward schedule and withdraws undistributed reward tokens to
/// the owner. With `--sweep-principal`, also pulls the staked principal out
/// of the pool so it can back the destination pool's supply.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct Retire {
    /// Also withdraw the staked principal from the legacy pool.
    #[clap(long)]
    pub sweep_principal: bool,
    /// Skip the interactive confirmation.
    #[clap(long)]
    pub yes: bool,
    /// Configuration for the VentiSwap deployment to use.
    #[clap(flatten, next_help_heading = "VentiSwap Deployment")]
    pub deployment: Option<Deployment>,
}

impl Retire {
    /// Run the [Retire] command.
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

        let pool = IVentiStake::new(deployment.legacy_pool_address, provider.clone());
        let rewards = pool.totalRewards().call().await?;

        if !self.yes {
            println!(
                "Retiring legacy pool {}: rewards will be closed and {} VST withdrawn.",
                deployment.legacy_pool_address,
                format_units(rewards, 18)?
            );
            print!("Type 'yes' to confirm and continue: ");
            io::stdout().flush().ok();
            let mut input = String::new();
            io::stdin()
                .read_line(&mut input)
                .map_err(|e| anyhow!("failed to read confirmation: {}", e))?;
            if input.trim().to_lowercase() != "yes" {
                bail!("Retire cancelled by user");
            }
        }

        let receipt = pool
            .closeRewards()
            .send()
            .await
            .context("Sending closeRewards transaction failed")?
            .with_timeout(global_config.tx_timeout)
            .get_receipt()
            .await
            .context("Failed to receive closeRewards receipt")?;
        ensure!(receipt.status(), "closeRewards reverted: tx_hash = {}", receipt.transaction_hash);
        tracing::info!("Reward schedule closed on legacy pool");

        let receipt = pool
            .withdrawRewardTokens()
            .send()
            .await
            .context("Sending withdrawRewardTokens transaction failed")?
            .with_timeout(global_config.tx_timeout)
            .get_receipt()
            .await
            .context("Failed to receive withdrawRewardTokens receipt")?;
        ensure!(
            receipt.status(),
            "withdrawRewardTokens reverted: tx_hash = {}",
            receipt.transaction_hash
        );

        ensure!(
            pool.totalRewards().call().await? == U256::ZERO,
            "legacy pool still reports undistributed rewards"
        );
        ensure!(!pool.isActive().call().await?, "legacy pool is still active");
        tracing::info!(
            "Reclaimed {} VST in undistributed rewards from legacy pool",
            format_units(rewards, 18)?
        );

        if self.sweep_principal {
            let receipt = pool
                .emergencyWithdrawal()
                .send()
                .await
                .context("Sending emergencyWithdrawal transaction failed")?
                .with_timeout(global_config.tx_timeout)
                .get_receipt()
                .await
                .context("Failed to receive emergencyWithdrawal receipt")?;
            ensure!(
                receipt.status(),
                "emergencyWithdrawal reverted: tx_hash = {}",
                receipt.transaction_hash
            );

            let token = IERC20::new(deployment.token_address, provider.clone());
            let left = token.balanceOf(deployment.legacy_pool_address).call().await?;
            ensure!(
                left == U256::ZERO,
                "legacy pool still holds {} token unit(s) after sweep",
                left
            );
            tracing::info!("Staked principal swept from legacy pool");
        }

        tracing::info!("Legacy pool retired");
        Ok(())
    }
}
