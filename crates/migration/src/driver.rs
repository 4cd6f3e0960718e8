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

//! The migration driver.
//!
//! Walks the pipeline `NotStarted -> Loading -> Merging -> Partitioning ->
//! Submitting(i) -> {Completed | Failed(i)}`, submitting batches strictly
//! sequentially through an injected [BatchSubmitter]. Batch `i + 1` is never
//! sent before batch `i`'s transaction is confirmed: every batch mutates the
//! destination pool's storage, and an earlier failure makes continuing
//! unsafe.
//!
//! There is no automatic retry and no rollback. Batches committed before a
//! failure are immutable on-chain; the error reports exactly how far the run
//! got so an operator can resume with a batch offset or compensate manually.

use std::path::Path;

use alloy::primitives::TxHash;
use async_trait::async_trait;
use thiserror::Error;

use crate::{
    batch::{batch_count_for, partition, DEFAULT_MAX_BATCH_SIZE},
    merge::{merge, MergeError, StakerRecord, UnmatchedPolicy},
    snapshot::{self, SnapshotError},
};

/// Receipt for one committed batch.
#[derive(Debug, Clone, Copy)]
pub struct BatchReceipt {
    /// Hash of the transaction that carried the batch.
    pub tx_hash: TxHash,
    /// Block the transaction was mined in, if the provider reported one.
    pub block_number: Option<u64>,
}

/// Errors from submitting a single batch.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("sending transaction failed: {0}")]
    Send(#[from] alloy::contract::Error),

    #[error("waiting for transaction confirmation failed: {0}")]
    Confirmation(#[from] alloy::providers::PendingTransactionError),

    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: TxHash },
}

/// Capability to submit one batch of staker records to the destination pool.
///
/// The on-chain implementation is [crate::contracts::PoolSubmitter]; tests
/// drive the pipeline with an in-memory fake.
#[async_trait]
pub trait BatchSubmitter {
    /// Submit `batch` in a single call and wait for its confirmation.
    async fn submit(&self, batch: &[StakerRecord]) -> Result<BatchReceipt, SubmitError>;
}

/// Pipeline stage, advanced by the driver and never skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Loading,
    Merging,
    Partitioning,
    /// Submitting the batch at this index. Re-entered once per batch, in
    /// increasing index order.
    Submitting(usize),
    Completed,
    /// Submission of the batch at this index failed. Terminal.
    Failed(usize),
}

/// Errors that halt a migration run.
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("snapshot parsing failed: {0}")]
    InputParse(#[from] SnapshotError),

    #[error("snapshot merge failed: {0}")]
    MergeConsistency(#[from] MergeError),

    #[error(
        "batch {batch} of {batches} failed: {source}; {committed_batches} batch(es) with \
         {committed_records} record(s) were committed on-chain, {remaining_records} record(s) \
         were NOT migrated"
    )]
    Submission {
        /// Index of the batch that failed.
        batch: usize,
        /// Total number of batches in the run.
        batches: usize,
        /// Batches confirmed before the failure (including skipped ones).
        committed_batches: usize,
        /// Records confirmed in this run before the failure.
        committed_records: usize,
        /// Records in the failed batch and every batch after it.
        remaining_records: usize,
        source: SubmitError,
    },
}

/// Per-batch record of a successful submission.
#[derive(Debug, Clone, Copy)]
pub struct BatchResult {
    /// Batch index within the run.
    pub index: usize,
    /// Number of records the batch carried.
    pub records: usize,
    /// Hash of the transaction that committed it.
    pub tx_hash: TxHash,
}

/// Summary of a completed migration run.
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    /// Batches committed during this run, in submission order.
    pub batches: Vec<BatchResult>,
    /// Batches skipped by the resume offset.
    pub skipped: usize,
}

impl MigrationReport {
    /// Total records committed during this run.
    pub fn records_committed(&self) -> usize {
        self.batches.iter().map(|b| b.records).sum()
    }
}

/// Options for a pipeline run starting from snapshot files.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Cap on records per transaction; the batch count derives from it.
    pub max_batch_size: usize,
    /// Handling of supplemental rows with no matching primary record.
    pub unmatched: UnmatchedPolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { max_batch_size: DEFAULT_MAX_BATCH_SIZE, unmatched: UnmatchedPolicy::default() }
    }
}

/// Drives a migration run against a [BatchSubmitter].
pub struct Migration<S> {
    submitter: S,
    resume_from: usize,
    phase: Phase,
}

impl<S: BatchSubmitter> Migration<S> {
    /// Create a driver over `submitter`, starting from the first batch.
    pub fn new(submitter: S) -> Self {
        Self { submitter, resume_from: 0, phase: Phase::NotStarted }
    }

    /// Skip batches below `batch` on this run.
    ///
    /// For resuming after a partial failure: batches below the offset are
    /// assumed to be committed on-chain already and are not re-submitted.
    pub fn resume_from(mut self, batch: usize) -> Self {
        self.resume_from = batch;
        self
    }

    /// Current pipeline stage.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run the full pipeline from a pair of snapshot files.
    pub async fn run_from_snapshots(
        &mut self,
        primary_path: impl AsRef<Path>,
        supplemental_path: impl AsRef<Path>,
        options: &PipelineOptions,
    ) -> Result<MigrationReport, MigrationError> {
        self.phase = Phase::Loading;
        let primary = snapshot::load_primary(primary_path)?;
        let supplemental = snapshot::load_supplemental(supplemental_path)?;
        tracing::info!(
            "Loaded {} primary record(s) and {} supplemental deposit(s)",
            primary.len(),
            supplemental.len()
        );

        self.phase = Phase::Merging;
        let outcome = merge(&primary, &supplemental, options.unmatched)?;

        self.phase = Phase::Partitioning;
        let count = batch_count_for(outcome.records.len(), options.max_batch_size);
        let batches = partition(outcome.records, count);
        tracing::info!("Partitioned into {} batch(es)", batches.len());

        self.run_batches(&batches).await
    }

    /// Submit pre-partitioned batches strictly sequentially.
    pub async fn run_batches(
        &mut self,
        batches: &[Vec<StakerRecord>],
    ) -> Result<MigrationReport, MigrationError> {
        let mut report = MigrationReport::default();

        for (index, batch) in batches.iter().enumerate() {
            if index < self.resume_from {
                tracing::info!(
                    "Skipping batch {index} ({} record(s)): below resume offset {}",
                    batch.len(),
                    self.resume_from
                );
                report.skipped += 1;
                continue;
            }

            self.phase = Phase::Submitting(index);
            tracing::info!("Submitting batch {index} with {} record(s)", batch.len());

            match self.submitter.submit(batch).await {
                Ok(receipt) => {
                    tracing::info!(
                        "Batch {index} committed: {} record(s), tx {}",
                        batch.len(),
                        receipt.tx_hash
                    );
                    report.batches.push(BatchResult {
                        index,
                        records: batch.len(),
                        tx_hash: receipt.tx_hash,
                    });
                }
                Err(source) => {
                    self.phase = Phase::Failed(index);
                    let remaining_records =
                        batches[index..].iter().map(Vec::len).sum::<usize>();
                    return Err(MigrationError::Submission {
                        batch: index,
                        batches: batches.len(),
                        committed_batches: report.skipped + report.batches.len(),
                        committed_records: report.records_committed(),
                        remaining_records,
                        source,
                    });
                }
            }
        }

        self.phase = Phase::Completed;
        Ok(report)
    }
}
