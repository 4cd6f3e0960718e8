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

//! Partitioning of the merged record list into bounded-size batches.
//!
//! One batch becomes one `stakeOnBehalfOfAll` transaction, so the batch
//! size is bounded by the calldata and gas a single call can carry. The
//! batch count is derived from that cap rather than fixed.

/// Default cap on records per `stakeOnBehalfOfAll` transaction.
///
/// Conservative bound for mainnet block gas limits; override per run with
/// the CLI's `--max-batch-size`.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 50;

/// Number of batches needed to fit `n` records under `max_batch_size`.
///
/// Zero records need zero batches.
pub fn batch_count_for(n: usize, max_batch_size: usize) -> usize {
    n.div_ceil(max_batch_size.max(1))
}

/// Split `records` into `batch_count` contiguous chunks.
///
/// Every chunk holds `ceil(n / batch_count)` records except the final one,
/// which absorbs the remainder and may be smaller, never empty. The split
/// is deterministic: the same input always produces the same boundaries.
pub fn partition<T>(records: Vec<T>, batch_count: usize) -> Vec<Vec<T>> {
    if records.is_empty() {
        return Vec::new();
    }
    let size = records.len().div_ceil(batch_count.max(1));
    let mut batches = Vec::with_capacity(batch_count);
    let mut rest = records;
    while !rest.is_empty() {
        let tail = rest.split_off(size.min(rest.len()));
        batches.push(rest);
        rest = tail;
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(batches: &[Vec<u32>]) -> Vec<usize> {
        batches.iter().map(Vec::len).collect()
    }

    #[test]
    fn even_split_into_four() {
        let batches = partition((0..100u32).collect(), 4);
        assert_eq!(sizes(&batches), vec![25, 25, 25, 25]);
    }

    #[test]
    fn last_batch_absorbs_the_remainder() {
        let batches = partition((0..102u32).collect(), 4);
        assert_eq!(sizes(&batches), vec![26, 26, 26, 24]);
    }

    #[test]
    fn ceil_sizing_may_need_fewer_batches() {
        // 9 records over 4 batches: ceil(9/4) = 3, so three full chunks
        // cover everything and no empty fourth chunk is emitted.
        let batches = partition((0..9u32).collect(), 4);
        assert_eq!(sizes(&batches), vec![3, 3, 3]);
    }

    #[test]
    fn preserves_order_and_contiguity() {
        let batches = partition((0..10u32).collect(), 3);
        let flat: Vec<u32> = batches.into_iter().flatten().collect();
        assert_eq!(flat, (0..10u32).collect::<Vec<_>>());
    }

    #[test]
    fn idempotent_under_reapplication() {
        let batches = partition((0..102u32).collect(), 4);
        let flat: Vec<u32> = batches.iter().flatten().copied().collect();
        assert_eq!(partition(flat, 4), batches);
    }

    #[test]
    fn empty_input_yields_no_batches() {
        assert!(partition(Vec::<u32>::new(), 4).is_empty());
    }

    #[test]
    fn fewer_records_than_batches() {
        let batches = partition(vec![1u32, 2], 4);
        assert_eq!(sizes(&batches), vec![1, 1]);
    }

    #[test]
    fn derives_batch_count_from_record_cap() {
        assert_eq!(batch_count_for(0, 50), 0);
        assert_eq!(batch_count_for(1, 50), 1);
        assert_eq!(batch_count_for(50, 50), 1);
        assert_eq!(batch_count_for(51, 50), 2);
        assert_eq!(batch_count_for(200, 50), 4);
    }
}
