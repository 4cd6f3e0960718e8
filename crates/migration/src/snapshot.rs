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

//! Loading of staker snapshot CSV files.
//!
//! Two sources feed a migration run: the primary staker list exported from
//! the legacy pool (`account,staked,timestamp,lock,paid`) and a supplemental
//! list of extra deposits (`account,extra`). Neither file carries a header
//! row; the first line is data. Rows are read record-by-record, so file size
//! is not a constraint.
//!
//! Malformed input aborts the load with an error naming the 1-based row
//! number and the offending field. Amounts are decimal integers in the
//! token's smallest unit; addresses must be EIP-55 checksummed.

use std::{fs::File, io, path::Path};

use alloy::primitives::{Address, U256};
use thiserror::Error;

/// A row of the primary staker snapshot, prior to merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryRow {
    /// Staker account.
    pub account: Address,
    /// Staked amount in the token's smallest unit.
    pub staked: U256,
    /// Unix timestamp of the original deposit.
    pub timestamp: u64,
    /// Lock tier code.
    pub lock: u8,
    /// Rewards already paid out, in the token's smallest unit.
    pub paid: U256,
}

/// A row of the supplemental deposits file. Consumed by the merger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplementalRow {
    /// Join key against the primary snapshot.
    pub account: Address,
    /// Amount to add to the matching primary record's staked amount.
    pub extra: U256,
}

/// Errors raised while loading a snapshot file.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("failed to open snapshot file: {0}")]
    Io(#[from] io::Error),

    #[error("row {row}: {source}")]
    Csv { row: u64, source: csv::Error },

    #[error("row {row}: expected {expected} columns, found {found}")]
    ColumnCount { row: u64, expected: usize, found: usize },

    #[error("row {row}, column {column}: {reason}")]
    BadField { row: u64, column: &'static str, reason: String },
}

const PRIMARY_COLUMNS: usize = 5;
const SUPPLEMENTAL_COLUMNS: usize = 2;

/// Read the primary staker snapshot from `reader`.
pub fn read_primary<R: io::Read>(reader: R) -> Result<Vec<PrimaryRow>, SnapshotError> {
    let mut rows = Vec::new();
    for (row, record) in records(reader, PRIMARY_COLUMNS) {
        let record = record?;
        rows.push(PrimaryRow {
            account: parse_address(&record, row, 0, "account")?,
            staked: parse_amount(&record, row, 1, "staked")?,
            timestamp: parse_integer(&record, row, 2, "timestamp")?,
            lock: parse_integer(&record, row, 3, "lock")?,
            paid: parse_amount(&record, row, 4, "paid")?,
        });
    }
    Ok(rows)
}

/// Read the supplemental deposits file from `reader`.
pub fn read_supplemental<R: io::Read>(reader: R) -> Result<Vec<SupplementalRow>, SnapshotError> {
    let mut rows = Vec::new();
    for (row, record) in records(reader, SUPPLEMENTAL_COLUMNS) {
        let record = record?;
        rows.push(SupplementalRow {
            account: parse_address(&record, row, 0, "account")?,
            extra: parse_amount(&record, row, 1, "extra")?,
        });
    }
    Ok(rows)
}

/// Load the primary staker snapshot from a file path.
pub fn load_primary(path: impl AsRef<Path>) -> Result<Vec<PrimaryRow>, SnapshotError> {
    read_primary(File::open(path)?)
}

/// Load the supplemental deposits file from a file path.
pub fn load_supplemental(path: impl AsRef<Path>) -> Result<Vec<SupplementalRow>, SnapshotError> {
    read_supplemental(File::open(path)?)
}

fn records<R: io::Read>(
    reader: R,
    expected: usize,
) -> impl Iterator<Item = (u64, Result<csv::StringRecord, SnapshotError>)> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        // Column-count validation is ours, so the error can carry the row.
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    reader.into_records().enumerate().map(move |(i, result)| {
        let row = i as u64 + 1;
        let record = match result {
            Ok(record) if record.len() == expected => Ok(record),
            Ok(record) => {
                Err(SnapshotError::ColumnCount { row, expected, found: record.len() })
            }
            Err(source) => Err(SnapshotError::Csv { row, source }),
        };
        (row, record)
    })
}

fn parse_address(
    record: &csv::StringRecord,
    row: u64,
    index: usize,
    column: &'static str,
) -> Result<Address, SnapshotError> {
    let raw = record.get(index).unwrap_or_default();
    Address::parse_checksummed(raw, None).map_err(|e| SnapshotError::BadField {
        row,
        column,
        reason: format!("invalid checksummed address {raw:?}: {e}"),
    })
}

fn parse_amount(
    record: &csv::StringRecord,
    row: u64,
    index: usize,
    column: &'static str,
) -> Result<U256, SnapshotError> {
    let raw = record.get(index).unwrap_or_default();
    raw.parse::<U256>().map_err(|e| SnapshotError::BadField {
        row,
        column,
        reason: format!("invalid amount {raw:?}: {e}"),
    })
}

fn parse_integer<T>(
    record: &csv::StringRecord,
    row: u64,
    index: usize,
    column: &'static str,
) -> Result<T, SnapshotError>
where
    T: std::str::FromStr<Err = std::num::ParseIntError>,
{
    let raw = record.get(index).unwrap_or_default();
    raw.parse::<T>().map_err(|e| SnapshotError::BadField {
        row,
        column,
        reason: format!("invalid integer {raw:?}: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checksummed(byte: u8) -> String {
        Address::repeat_byte(byte).to_checksum(None)
    }

    #[test]
    fn reads_primary_rows_in_order() {
        let a = checksummed(0x11);
        let b = checksummed(0x22);
        let input = format!("{a},1000,1650000000,3,50\n{b},2000,1650000001,1,0\n");

        let rows = read_primary(input.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].account, Address::repeat_byte(0x11));
        assert_eq!(rows[0].staked, U256::from(1000));
        assert_eq!(rows[0].timestamp, 1650000000);
        assert_eq!(rows[0].lock, 3);
        assert_eq!(rows[0].paid, U256::from(50));
        assert_eq!(rows[1].account, Address::repeat_byte(0x22));
    }

    #[test]
    fn reads_supplemental_rows() {
        let a = checksummed(0x11);
        let input = format!("{a},500\n");

        let rows = read_supplemental(input.as_bytes()).unwrap();
        assert_eq!(rows, vec![SupplementalRow {
            account: Address::repeat_byte(0x11),
            extra: U256::from(500),
        }]);
    }

    #[test]
    fn first_row_is_data_not_header() {
        let a = checksummed(0x11);
        let input = format!("{a},500\n");
        assert_eq!(read_supplemental(input.as_bytes()).unwrap().len(), 1);
    }

    #[test]
    fn empty_input_yields_no_rows() {
        assert!(read_primary(&b""[..]).unwrap().is_empty());
        assert!(read_supplemental(&b""[..]).unwrap().is_empty());
    }

    #[test]
    fn wrong_column_count_names_the_row() {
        let a = checksummed(0x11);
        let b = checksummed(0x22);
        let input = format!("{a},1000,1650000000,3,50\n{b},2000,1650000001\n");

        let err = read_primary(input.as_bytes()).unwrap_err();
        match err {
            SnapshotError::ColumnCount { row, expected, found } => {
                assert_eq!(row, 2);
                assert_eq!(expected, 5);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_numeric_amount_is_rejected() {
        let a = checksummed(0x11);
        let input = format!("{a},not-a-number,1650000000,3,50\n");

        let err = read_primary(input.as_bytes()).unwrap_err();
        match err {
            SnapshotError::BadField { row, column, .. } => {
                assert_eq!(row, 1);
                assert_eq!(column, "staked");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_checksum_is_rejected() {
        // Flip the case of the first hex character of a valid checksummed
        // address. Every nibble of 0xab..ab is alphabetic, so this always
        // corrupts the EIP-55 encoding.
        let mut addr = checksummed(0xab);
        let flipped = {
            let c = addr.remove(2);
            let c = if c.is_ascii_uppercase() {
                c.to_ascii_lowercase()
            } else {
                c.to_ascii_uppercase()
            };
            addr.insert(2, c);
            addr
        };
        let input = format!("{flipped},500\n");

        let err = read_supplemental(input.as_bytes()).unwrap_err();
        match err {
            SnapshotError::BadField { row, column, .. } => {
                assert_eq!(row, 1);
                assert_eq!(column, "account");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn loads_from_a_file_path() {
        let a = checksummed(0x11);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deposits.csv");
        std::fs::write(&path, format!("{a},500\n")).unwrap();

        let rows = load_supplemental(&path).unwrap();
        assert_eq!(rows.len(), 1);
    }
}
