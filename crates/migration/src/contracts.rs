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

//! ABI bindings for the staking pool and reward token, and the on-chain
//! [BatchSubmitter] implementation.
//!
//! Only the surface the migration tools call is declared here; the pool's
//! reward and lock logic stays behind its ABI.

use std::time::Duration;

use alloy::{
    primitives::Address,
    providers::Provider,
    sol,
};
use async_trait::async_trait;

use crate::{
    driver::{BatchReceipt, BatchSubmitter, SubmitError},
    merge::StakerRecord,
};

sol! {
    #![sol(rpc, all_derives)]

    /// Staker state entry as `stakeOnBehalfOfAll` expects it.
    struct StakerData {
        address account;
        uint256 staked;
        uint64 timestamp;
        uint8 lock;
        uint256 paid;
    }

    contract IVentiStake {
        function stakeOnBehalfOfAll(StakerData[] calldata stakers) external;
        function fundStaking(uint256 amount) external;
        function enableStaking() external;
        function closeRewards() external;
        function withdrawRewardTokens() external;
        function emergencyWithdrawal() external;
        function totalRewards() external view returns (uint256);
        function totalSupply() external view returns (uint256);
        function isActive() external view returns (bool);
    }
}

sol! {
    #![sol(rpc, all_derives)]

    contract IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function balanceOf(address owner) external view returns (uint256);
    }
}

impl From<&StakerRecord> for StakerData {
    fn from(record: &StakerRecord) -> Self {
        Self {
            account: record.account,
            staked: record.staked,
            timestamp: record.timestamp,
            lock: record.lock,
            paid: record.paid,
        }
    }
}

/// Submits batches to the destination pool via `stakeOnBehalfOfAll`.
///
/// One batch becomes one transaction; the submitter waits for the receipt
/// (bounded by the configured timeout) and checks its status before the
/// driver moves on to the next batch.
pub struct PoolSubmitter<P> {
    pool: IVentiStake::IVentiStakeInstance<P>,
    timeout: Option<Duration>,
}

impl<P: Provider + Clone> PoolSubmitter<P> {
    /// Create a submitter for the pool at `address`.
    ///
    /// The provider must carry a wallet for the account authorized to call
    /// `stakeOnBehalfOfAll`.
    pub fn new(address: Address, provider: P) -> Self {
        Self { pool: IVentiStake::new(address, provider), timeout: None }
    }

    /// Bound the wait for each batch's transaction confirmation.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl<P: Provider + Clone + 'static> BatchSubmitter for PoolSubmitter<P> {
    async fn submit(&self, batch: &[StakerRecord]) -> Result<BatchReceipt, SubmitError> {
        let stakers: Vec<StakerData> = batch.iter().map(Into::into).collect();

        let pending = self.pool.stakeOnBehalfOfAll(stakers).send().await?;
        let tx_hash = *pending.tx_hash();
        tracing::debug!("Broadcast stakeOnBehalfOfAll tx {tx_hash}, awaiting receipt");

        let receipt = pending.with_timeout(self.timeout).get_receipt().await?;
        if !receipt.status() {
            return Err(SubmitError::Reverted { tx_hash: receipt.transaction_hash });
        }

        Ok(BatchReceipt {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
        })
    }
}
