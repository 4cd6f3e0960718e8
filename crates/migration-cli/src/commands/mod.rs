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

//! Commands of the migration CLI.

mod activate;
mod migrate;
mod plan;
mod retire;
mod status;

pub use activate::Activate;
pub use migrate::Migrate;
pub use plan::Plan;
pub use retire::Retire;
pub use status::Status;

use clap::Subcommand;

use crate::config::GlobalConfig;

/// Commands for the staking pool migration.
#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Preview the migration batches and totals without submitting anything.
    Plan(Plan),
    /// Submit the staker snapshot to the destination pool in batches.
    Migrate(Migrate),
    /// Wind down the legacy pool before migrating.
    Retire(Retire),
    /// Fund and enable the destination pool after migrating.
    Activate(Activate),
    /// Show a staking pool's on-chain summary.
    Status(Status),
}

impl Command {
    /// Run the command.
    pub async fn run(&self, global_config: &GlobalConfig) -> anyhow::Result<()> {
        match self {
            Self::Plan(cmd) => cmd.run(global_config).await,
            Self::Migrate(cmd) => cmd.run(global_config).await,
            Self::Retire(cmd) => cmd.run(global_config).await,
            Self::Activate(cmd) => cmd.run(global_config).await,
            Self::Status(cmd) => cmd.run(global_config).await,
        }
    }
}
