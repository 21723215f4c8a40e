//! Finding the block range that makes up a UTC day.
//!
//! The chain index maps heights to hashes, not dates to heights, so the
//! locator estimates how many blocks back the target day lies (at the
//! 144-blocks-per-day target rate), jumps there, re-estimates from the
//! observed timestamp, and repeats until the jumps oscillate around the
//! boundary. Single steps then pin the exact first block of the day.

use chrono::{Datelike, NaiveDate, Utc};
use tracing::{debug, info};

use oracle_chain::block::{self, Height};

use crate::{CancelToken, ChainView, RpcError};

/// Blocks below the tip considered settled by consensus.
const CONSENSUS_DEPTH: u64 = 6;

/// Seconds in a UTC day.
const DAY_SECONDS: i64 = 86_400;

/// A jump at or below this many blocks is close enough to switch from
/// estimation to single-stepping.
const JUMP_TOLERANCE: i64 = 6;

/// The earliest day with enough round-USD output density for the
/// histogram to carry a usable signal.
fn min_target_date() -> NaiveDate {
    NaiveDate::from_ymd(2023, 12, 15)
}

/// One block of the located range.
#[derive(Clone, Copy, Debug)]
pub struct BlockRef {
    pub height: Height,
    pub hash: block::Hash,
    pub time: chrono::DateTime<Utc>,
}

/// The contiguous block range a price is inferred over.
#[derive(Clone, Debug)]
pub struct BlockRange {
    /// The UTC day the range covers, or `None` for recent-blocks mode.
    pub date: Option<NaiveDate>,
    /// The blocks, in height order.
    pub blocks: Vec<BlockRef>,
}

impl BlockRange {
    pub fn first_height(&self) -> Option<Height> {
        self.blocks.first().map(|b| b.height)
    }

    pub fn last_height(&self) -> Option<Height> {
        self.blocks.last().map(|b| b.height)
    }
}

fn block_ref(chain: &impl ChainView, height: Height) -> Result<BlockRef, RpcError> {
    let hash = chain.block_hash(height)?;
    let info = chain.block_header(&hash)?;
    Ok(BlockRef {
        height,
        hash,
        time: info.time,
    })
}

/// Locate every block whose timestamp falls on the target UTC day.
pub fn day_blocks(
    chain: &impl ChainView,
    date: NaiveDate,
    cancel: &CancelToken,
) -> Result<BlockRange, RpcError> {
    if date < min_target_date() {
        return Err(RpcError::DateTooOld {
            date,
            min: min_target_date(),
        });
    }

    let tip = Height(chain.block_count()?.0 - CONSENSUS_DEPTH);
    let tip_ref = block_ref(chain, tip)?;
    let day_start = date.and_hms(0, 0, 0).timestamp();

    // The whole day plus six confirmations must be behind the tip, which
    // is the case exactly when the target day precedes the tip's own day.
    let tip_midnight = tip_ref.time.date().and_hms(0, 0, 0).timestamp();
    if day_start >= tip_midnight {
        return Err(RpcError::DateTooRecent { date });
    }

    info!(%date, tip = %tip, "locating first block of target day");

    // Coarse guess, then re-estimate from each observed timestamp until
    // the jumps shrink or start oscillating around the boundary.
    let mut guess = estimate_back(tip, tip_ref.time.timestamp(), day_start);
    let mut current = block_ref(chain, guess)?;
    let mut last_jump: i64 = 0;
    let mut before_last_jump: i64 = 0;
    loop {
        if cancel.is_cancelled() {
            return Err(RpcError::Cancelled);
        }
        let jump = estimate_jump(current.time.timestamp(), day_start);
        debug!(guess = %guess, jump, "refining day-start estimate");
        if jump.abs() <= JUMP_TOLERANCE || jump == before_last_jump {
            break;
        }
        before_last_jump = last_jump;
        last_jump = jump;

        guess = offset(guess, -jump);
        current = block_ref(chain, guess)?;
    }

    // Single-step to the exact first block with time >= day start.
    while current.time.timestamp() >= day_start {
        guess = offset(guess, -1);
        current = block_ref(chain, guess)?;
    }
    while current.time.timestamp() < day_start {
        guess = offset(guess, 1);
        current = block_ref(chain, guess)?;
    }

    info!(first = %guess, "walking forward through the target day");

    // Collect forward until the UTC day changes.
    let mut blocks = Vec::with_capacity(Height::PER_DAY as usize + 32);
    let mut heartbeat = 0u32;
    while same_day(&current, date) {
        if cancel.is_cancelled() {
            return Err(RpcError::Cancelled);
        }
        blocks.push(current);
        if blocks.len() as u32 * 100 / Height::PER_DAY as u32 >= heartbeat + 20 {
            heartbeat += 20;
            info!("day walk {}%", heartbeat.min(100));
        }
        guess = offset(guess, 1);
        current = block_ref(chain, guess)?;
    }

    info!(blocks = blocks.len(), "target day located");
    Ok(BlockRange {
        date: Some(date),
        blocks,
    })
}

/// The last 144 settled blocks, for a price without date arithmetic.
pub fn recent_blocks(
    chain: &impl ChainView,
    cancel: &CancelToken,
) -> Result<BlockRange, RpcError> {
    let tip = chain.block_count()?;
    let first = Height(tip.0.saturating_sub(Height::PER_DAY));

    info!(first = %first, tip = %tip, "collecting recent blocks");

    let mut blocks = Vec::with_capacity(Height::PER_DAY as usize);
    for height in first.0..tip.0 {
        if cancel.is_cancelled() {
            return Err(RpcError::Cancelled);
        }
        blocks.push(block_ref(chain, Height(height))?);
    }
    Ok(BlockRange { date: None, blocks })
}

fn same_day(block: &BlockRef, date: NaiveDate) -> bool {
    let day = block.time.date();
    (day.year(), day.month(), day.day()) == (date.year(), date.month(), date.day())
}

/// How many blocks back of `tip` the timestamp `target` should lie.
fn estimate_back(tip: Height, tip_time: i64, target: i64) -> Height {
    offset(tip, -estimate_jump(tip_time, target))
}

/// Estimated signed distance in blocks from a block observed at `time` to
/// the block at `target`, at 144 blocks per day.
fn estimate_jump(time: i64, target: i64) -> i64 {
    ((Height::PER_DAY as f64) * ((time - target) as f64) / (DAY_SECONDS as f64)).round() as i64
}

fn offset(height: Height, delta: i64) -> Height {
    let h = height.0 as i64 + delta;
    Height(h.max(1) as u64)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::TimeZone;

    use oracle_test::synthetic::sha256d;

    use super::*;
    use crate::HeaderInfo;

    /// A regular synthetic chain: one block every `spacing` seconds.
    struct MockChain {
        base_time: i64,
        spacing: i64,
        count: u64,
        hashes: Vec<block::Hash>,
        heights: HashMap<block::Hash, u64>,
    }

    impl MockChain {
        fn new(base_time: i64, spacing: i64, count: u64) -> MockChain {
            let hashes: Vec<_> = (0..count)
                .map(|h| block::Hash(sha256d(&h.to_le_bytes())))
                .collect();
            let heights = hashes
                .iter()
                .enumerate()
                .map(|(h, hash)| (*hash, h as u64))
                .collect();
            MockChain {
                base_time,
                spacing,
                count,
                hashes,
                heights,
            }
        }

        fn time_of(&self, height: u64) -> i64 {
            self.base_time + self.spacing * height as i64
        }
    }

    impl ChainView for MockChain {
        fn block_count(&self) -> Result<Height, RpcError> {
            Ok(Height(self.count - 1))
        }

        fn block_hash(&self, height: Height) -> Result<block::Hash, RpcError> {
            self.hashes
                .get(height.0 as usize)
                .copied()
                .ok_or(RpcError::BadReply("height beyond mock chain"))
        }

        fn block_header(&self, hash: &block::Hash) -> Result<HeaderInfo, RpcError> {
            let height = *self
                .heights
                .get(hash)
                .ok_or(RpcError::BadReply("unknown hash in mock chain"))?;
            Ok(HeaderInfo {
                time: Utc.timestamp(self.time_of(height), 0),
                height: Height(height),
            })
        }
    }

    // 2024-01-01 00:00:05 UTC, ten-minute blocks, ~41 days of chain
    fn regular_chain() -> MockChain {
        MockChain::new(1_704_067_205, 600, 6_000)
    }

    #[test]
    fn locates_exact_day_boundaries() {
        oracle_test::init();

        let chain = regular_chain();
        let range = day_blocks(
            &chain,
            NaiveDate::from_ymd(2024, 1, 15),
            &CancelToken::new(),
        )
        .expect("day is well behind the tip");

        // At 600-second spacing the day covers exactly 144 blocks, the
        // first being the first block at or after the UTC midnight.
        assert_eq!(range.blocks.len(), 144);
        assert_eq!(range.first_height(), Some(Height(2016)));
        assert_eq!(range.last_height(), Some(Height(2159)));

        let day_start = 1_705_276_800;
        assert!(range.blocks[0].time.timestamp() >= day_start);
        assert!(chain.time_of(2015) < day_start);
        assert!(range.blocks[143].time.timestamp() < day_start + 86_400);
    }

    #[test]
    fn rejects_dates_before_signal_exists() {
        let chain = regular_chain();
        match day_blocks(
            &chain,
            NaiveDate::from_ymd(2020, 1, 1),
            &CancelToken::new(),
        ) {
            Err(RpcError::DateTooOld { .. }) => {}
            other => panic!("expected DateTooOld, got {:?}", other),
        }
    }

    #[test]
    fn rejects_the_tip_day() {
        let chain = regular_chain();
        // The consensus tip lands on 2024-02-11; that day and anything
        // after it must be refused.
        match day_blocks(
            &chain,
            NaiveDate::from_ymd(2024, 2, 11),
            &CancelToken::new(),
        ) {
            Err(RpcError::DateTooRecent { .. }) => {}
            other => panic!("expected DateTooRecent, got {:?}", other),
        }
    }

    #[test]
    fn recent_mode_returns_a_full_window() {
        let chain = regular_chain();
        let range = recent_blocks(&chain, &CancelToken::new()).expect("chain is long enough");

        assert_eq!(range.date, None);
        assert_eq!(range.blocks.len(), 144);
        assert_eq!(range.last_height(), Some(Height(5_998)));
        assert_eq!(range.first_height(), Some(Height(5_855)));
    }

    #[test]
    fn cancellation_wins_over_progress() {
        let chain = regular_chain();
        let cancel = CancelToken::new();
        cancel.cancel();
        match day_blocks(&chain, NaiveDate::from_ymd(2024, 1, 15), &cancel) {
            Err(RpcError::Cancelled) => {}
            other => panic!("expected Cancelled, got {:?}", other),
        }
    }
}
