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

//! Integration tests for the offline CLI commands.

use std::path::Path;

use alloy::primitives::Address;
use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

fn checksummed(byte: u8) -> String {
    Address::repeat_byte(byte).to_checksum(None)
}

fn write_snapshots(dir: &Path, primary: &str, deposits: &str) -> (String, String) {
    let primary_path = dir.join("new.csv");
    let deposits_path = dir.join("multiple_deposits.csv");
    std::fs::write(&primary_path, primary).unwrap();
    std::fs::write(&deposits_path, deposits).unwrap();
    (primary_path.display().to_string(), deposits_path.display().to_string())
}

#[test]
fn plan_reports_batches_and_totals() -> anyhow::Result<()> {
    let a = checksummed(0x11);
    let b = checksummed(0x22);
    let c = checksummed(0x33);

    let dir = TempDir::new()?;
    let (primary, deposits) = write_snapshots(
        dir.path(),
        &format!(
            "{a},100000000000000000000,1650000000,3,0\n\
             {b},200000000000000000000,1650000100,1,0\n\
             {c},300000000000000000000,1650000200,2,0\n"
        ),
        &format!("{a},50000000000000000000\n"),
    );

    let mut cmd = Command::cargo_bin("venti-migrate")?;
    cmd.args(["plan", "--snapshot", &primary, "--deposits", &deposits, "--max-batch-size", "2"])
        .env("NO_COLOR", "1")
        .assert()
        .success()
        // 100 + 200 + 300 primary plus the matched 50 extra.
        .stdout(contains("650000000000000000000 wei"))
        .stdout(contains("2 batch(es)"))
        .stdout(contains("Batch 1: 1 record(s)"));

    Ok(())
}

#[test]
fn plan_rejects_malformed_rows_with_the_row_number() -> anyhow::Result<()> {
    let a = checksummed(0x11);
    let b = checksummed(0x22);

    let dir = TempDir::new()?;
    let (primary, deposits) = write_snapshots(
        dir.path(),
        // Second row is missing the paid column.
        &format!("{a},100,1650000000,3,0\n{b},200,1650000100,1\n"),
        "",
    );

    let mut cmd = Command::cargo_bin("venti-migrate")?;
    cmd.args(["plan", "--snapshot", &primary, "--deposits", &deposits])
        .env("NO_COLOR", "1")
        .assert()
        .failure()
        .stderr(contains("row 2"));

    Ok(())
}

#[test]
fn plan_fails_on_unmatched_deposits_by_default() -> anyhow::Result<()> {
    let a = checksummed(0x11);
    let stranger = checksummed(0x99);

    let dir = TempDir::new()?;
    let (primary, deposits) = write_snapshots(
        dir.path(),
        &format!("{a},100,1650000000,3,0\n"),
        &format!("{stranger},50\n"),
    );

    let mut cmd = Command::cargo_bin("venti-migrate")?;
    cmd.args(["plan", "--snapshot", &primary, "--deposits", &deposits])
        .env("NO_COLOR", "1")
        .assert()
        .failure()
        .stderr(contains("no matching primary record"));

    Ok(())
}

#[test]
fn plan_drops_unmatched_deposits_when_allowed() -> anyhow::Result<()> {
    let a = checksummed(0x11);
    let stranger = checksummed(0x99);

    let dir = TempDir::new()?;
    let (primary, deposits) = write_snapshots(
        dir.path(),
        &format!("{a},100,1650000000,3,0\n"),
        &format!("{stranger},50\n"),
    );

    let mut cmd = Command::cargo_bin("venti-migrate")?;
    cmd.args(["plan", "--snapshot", &primary, "--deposits", &deposits, "--allow-unmatched"])
        .env("NO_COLOR", "1")
        .assert()
        .success()
        // The dropped extra must not inflate the migrated total.
        .stdout(contains("100 wei"))
        .stdout(contains("Unmatched supplemental account(s) dropped: 1"));

    Ok(())
}

#[test]
fn migrate_requires_an_rpc_url() -> anyhow::Result<()> {
    let a = checksummed(0x11);

    let dir = TempDir::new()?;
    let (primary, deposits) =
        write_snapshots(dir.path(), &format!("{a},100,1650000000,3,0\n"), "");

    let mut cmd = Command::cargo_bin("venti-migrate")?;
    cmd.args([
        "migrate",
        "--snapshot",
        &primary,
        "--deposits",
        &deposits,
        "--staking-address",
        &checksummed(0x42),
    ])
    .env("NO_COLOR", "1")
    .env_remove("RPC_URL")
    .assert()
    .failure()
    .stderr(contains("RPC URL not provided"));

    Ok(())
}
