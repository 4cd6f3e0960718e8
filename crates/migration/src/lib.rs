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

//! Staker state migration pipeline for VentiSwap staking pools.
//!
//! Loads staker snapshots from CSV, merges supplemental deposits, partitions
//! the result into bounded-size batches, and submits them sequentially to a
//! freshly deployed pool via `stakeOnBehalfOfAll`. The on-chain submission
//! seam is the [driver::BatchSubmitter] trait, so the pipeline is testable
//! without a live network.

pub mod batch;
pub mod contracts;
pub mod deployments;
pub mod driver;
pub mod merge;
pub mod snapshot;

pub use batch::{batch_count_for, partition, DEFAULT_MAX_BATCH_SIZE};
pub use contracts::{PoolSubmitter, IERC20, IVentiStake};
pub use deployments::Deployment;
pub use driver::{
    BatchReceipt, BatchResult, BatchSubmitter, Migration, MigrationError, MigrationReport, Phase,
    PipelineOptions, SubmitError,
};
pub use merge::{merge, total_staked, MergeError, MergeOutcome, StakerRecord, UnmatchedPolicy};
pub use snapshot::{
    load_primary, load_supplemental, read_primary, read_supplemental, PrimaryRow, SnapshotError,
    SupplementalRow,
};
