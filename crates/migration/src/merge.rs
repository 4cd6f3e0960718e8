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

//! Merging of supplemental deposits into the primary staker snapshot.
//!
//! Supplemental extras are accumulated into an account-keyed map first
//! (multiple rows for one account are summed), then added to the matching
//! primary records in a single ordered pass. Output order equals primary
//! input order, and the total staked amount over the output equals the
//! primary total plus every matched extra.

use std::collections::HashMap;

use alloy::primitives::{Address, U256};
use clap::ValueEnum;
use thiserror::Error;

use crate::snapshot::{PrimaryRow, SupplementalRow};

/// A merged staker record, the unit submitted to the destination pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakerRecord {
    /// Staker account.
    pub account: Address,
    /// Total amount to re-establish: primary staked plus matched extras.
    pub staked: U256,
    /// Unix timestamp of the original deposit, preserved from the primary
    /// snapshot.
    pub timestamp: u64,
    /// Lock tier code, preserved from the primary snapshot.
    pub lock: u8,
    /// Rewards already paid out, preserved from the primary snapshot.
    pub paid: U256,
}

/// How to handle supplemental rows whose account has no primary record.
///
/// The legacy migration script dropped these silently, which hides both
/// stale entries and typos. Dropping now requires an explicit opt-in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum UnmatchedPolicy {
    /// Fail the run if any supplemental account is unmatched.
    #[default]
    Deny,
    /// Drop unmatched supplemental rows, logging each dropped account.
    Warn,
}

/// Errors raised by [merge].
#[derive(Error, Debug)]
pub enum MergeError {
    #[error(
        "{count} supplemental account(s) have no matching primary record (first: {first}, \
         {total} unit(s) total)"
    )]
    UnmatchedSupplemental { count: usize, first: Address, total: U256 },

    #[error("staked amount overflow for account {account}")]
    AmountOverflow { account: Address },
}

/// The result of a merge: the records to migrate plus what was left over.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// Merged records, in primary snapshot order.
    pub records: Vec<StakerRecord>,
    /// Supplemental extras with no matching primary account, sorted by
    /// account. Empty unless the policy is [UnmatchedPolicy::Warn].
    pub unmatched: Vec<SupplementalRow>,
}

/// Merge supplemental deposits into the primary snapshot.
pub fn merge(
    primary: &[PrimaryRow],
    supplemental: &[SupplementalRow],
    policy: UnmatchedPolicy,
) -> Result<MergeOutcome, MergeError> {
    let mut extras: HashMap<Address, U256> = HashMap::with_capacity(supplemental.len());
    for row in supplemental {
        let slot = extras.entry(row.account).or_default();
        *slot = slot
            .checked_add(row.extra)
            .ok_or(MergeError::AmountOverflow { account: row.account })?;
    }

    let mut records = Vec::with_capacity(primary.len());
    for row in primary {
        // remove() hands the extra to the first occurrence of an account,
        // so a duplicated primary account cannot double-count it.
        let extra = extras.remove(&row.account).unwrap_or(U256::ZERO);
        let staked = row
            .staked
            .checked_add(extra)
            .ok_or(MergeError::AmountOverflow { account: row.account })?;
        records.push(StakerRecord {
            account: row.account,
            staked,
            timestamp: row.timestamp,
            lock: row.lock,
            paid: row.paid,
        });
    }

    let mut unmatched: Vec<SupplementalRow> = extras
        .into_iter()
        .map(|(account, extra)| SupplementalRow { account, extra })
        .collect();
    unmatched.sort_by_key(|row| row.account);

    if !unmatched.is_empty() {
        let total = unmatched.iter().fold(U256::ZERO, |acc, row| acc.saturating_add(row.extra));
        match policy {
            UnmatchedPolicy::Deny => {
                return Err(MergeError::UnmatchedSupplemental {
                    count: unmatched.len(),
                    first: unmatched[0].account,
                    total,
                });
            }
            UnmatchedPolicy::Warn => {
                for row in &unmatched {
                    tracing::warn!(
                        "Dropping unmatched supplemental deposit: account {} with {} unit(s)",
                        row.account,
                        row.extra
                    );
                }
                tracing::warn!(
                    "Dropped {} unmatched supplemental account(s), {} unit(s) total",
                    unmatched.len(),
                    total
                );
            }
        }
    }

    Ok(MergeOutcome { records, unmatched })
}

/// Sum of the staked amounts over `records`, or `None` on overflow.
pub fn total_staked(records: &[StakerRecord]) -> Option<U256> {
    records.iter().try_fold(U256::ZERO, |acc, r| acc.checked_add(r.staked))
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn primary(account: Address, staked: u64) -> PrimaryRow {
        PrimaryRow {
            account,
            staked: U256::from(staked),
            timestamp: 1650000000,
            lock: 3,
            paid: U256::ZERO,
        }
    }

    fn extra(account: Address, amount: u64) -> SupplementalRow {
        SupplementalRow { account, extra: U256::from(amount) }
    }

    #[test]
    fn adds_matching_extras_in_primary_order() {
        let p = vec![primary(addr(0xa1), 100), primary(addr(0xb2), 200)];
        let s = vec![extra(addr(0xa1), 50)];

        let outcome = merge(&p, &s, UnmatchedPolicy::Deny).unwrap();
        let staked: Vec<U256> = outcome.records.iter().map(|r| r.staked).collect();
        assert_eq!(staked, vec![U256::from(150), U256::from(200)]);
        assert_eq!(outcome.records[0].account, addr(0xa1));
        assert_eq!(outcome.records[1].account, addr(0xb2));
        assert!(outcome.unmatched.is_empty());
    }

    #[test]
    fn sums_multiple_supplemental_rows_per_account() {
        let p = vec![primary(addr(0xa1), 100)];
        let s = vec![extra(addr(0xa1), 50), extra(addr(0xa1), 25)];

        let outcome = merge(&p, &s, UnmatchedPolicy::Deny).unwrap();
        assert_eq!(outcome.records[0].staked, U256::from(175));
    }

    #[test]
    fn empty_supplemental_is_identity() {
        let p = vec![primary(addr(0xa1), 100), primary(addr(0xb2), 200)];

        let outcome = merge(&p, &[], UnmatchedPolicy::Deny).unwrap();
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0].staked, U256::from(100));
        assert_eq!(outcome.records[1].staked, U256::from(200));
        assert_eq!(outcome.records[0].timestamp, 1650000000);
        assert_eq!(outcome.records[0].lock, 3);
    }

    #[test]
    fn conserves_total_staked_amount() {
        let p = vec![
            primary(addr(0xa1), 100),
            primary(addr(0xb2), 200),
            primary(addr(0xc3), 300),
        ];
        let s = vec![
            extra(addr(0xa1), 10),
            extra(addr(0xc3), 20),
            extra(addr(0xc3), 30),
            // Unmatched, must not leak into the output total.
            extra(addr(0xd4), 999),
        ];

        let outcome = merge(&p, &s, UnmatchedPolicy::Warn).unwrap();
        let matched_extra = U256::from(10 + 20 + 30);
        let primary_total = U256::from(100 + 200 + 300);
        assert_eq!(total_staked(&outcome.records).unwrap(), primary_total + matched_extra);
    }

    #[test]
    fn unmatched_supplemental_fails_by_default() {
        let p = vec![primary(addr(0xa1), 100)];
        let s = vec![extra(addr(0xd4), 5), extra(addr(0xe5), 7)];

        let err = merge(&p, &s, UnmatchedPolicy::Deny).unwrap_err();
        match err {
            MergeError::UnmatchedSupplemental { count, first, total } => {
                assert_eq!(count, 2);
                assert_eq!(first, addr(0xd4));
                assert_eq!(total, U256::from(12));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    #[traced_test]
    fn warn_policy_reports_and_drops_unmatched() {
        let p = vec![primary(addr(0xa1), 100)];
        let s = vec![extra(addr(0xa1), 50), extra(addr(0xd4), 5)];

        let outcome = merge(&p, &s, UnmatchedPolicy::Warn).unwrap();
        assert_eq!(outcome.records[0].staked, U256::from(150));
        assert_eq!(outcome.unmatched, vec![extra(addr(0xd4), 5)]);
        assert!(logs_contain("unmatched supplemental"));
    }

    #[test]
    fn duplicate_primary_account_does_not_double_count_extra() {
        let p = vec![primary(addr(0xa1), 100), primary(addr(0xa1), 200)];
        let s = vec![extra(addr(0xa1), 50)];

        let outcome = merge(&p, &s, UnmatchedPolicy::Deny).unwrap();
        assert_eq!(outcome.records[0].staked, U256::from(150));
        assert_eq!(outcome.records[1].staked, U256::from(200));
    }

    #[test]
    fn overflow_is_an_error() {
        let p = vec![PrimaryRow {
            account: addr(0xa1),
            staked: U256::MAX,
            timestamp: 0,
            lock: 1,
            paid: U256::ZERO,
        }];
        let s = vec![extra(addr(0xa1), 1)];

        let err = merge(&p, &s, UnmatchedPolicy::Deny).unwrap_err();
        assert!(matches!(err, MergeError::AmountOverflow { .. }));
    }
}
