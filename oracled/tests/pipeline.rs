//! End-to-end pipeline runs against a synthetic chain: mock RPC index,
//! real block files on disk, real parsing, real statistics.

use std::collections::HashMap;
use std::fs;

use chrono::NaiveDate;
use tempdir::TempDir;

use oracle_chain::block::{self, Height};
use oracle_price::{PriceError, PriceWindow};
use oracle_rpc::{CancelToken, ChainView, HeaderInfo, RpcError};
use oracle_store::BlockDir;
use oracle_test::synthetic::{self, SyntheticBlock};
use oracled::pipeline::{infer_price, PriceTarget, Source};
use oracled::OracleError;

/// A chain index backed by generated blocks.
struct MockChain {
    by_height: Vec<(block::Hash, i64)>,
    heights: HashMap<block::Hash, u64>,
    first_height: u64,
}

impl MockChain {
    fn new(blocks: &[SyntheticBlock]) -> MockChain {
        let first_height = blocks[0].height;
        let by_height = blocks
            .iter()
            .map(|b| (block::Hash(b.hash), b.time as i64))
            .collect();
        let heights = blocks
            .iter()
            .map(|b| (block::Hash(b.hash), b.height))
            .collect();
        MockChain {
            by_height,
            heights,
            first_height,
        }
    }
}

impl ChainView for MockChain {
    fn block_count(&self) -> Result<Height, RpcError> {
        Ok(Height(self.first_height + self.by_height.len() as u64 - 1))
    }

    fn block_hash(&self, height: Height) -> Result<block::Hash, RpcError> {
        let index = height
            .0
            .checked_sub(self.first_height)
            .ok_or(RpcError::BadReply("height below mock chain"))?;
        self.by_height
            .get(index as usize)
            .map(|(hash, _)| *hash)
            .ok_or(RpcError::BadReply("height beyond mock chain"))
    }

    fn block_header(&self, hash: &block::Hash) -> Result<HeaderInfo, RpcError> {
        let height = *self
            .heights
            .get(hash)
            .ok_or(RpcError::BadReply("unknown hash"))?;
        let (_, time) = self.by_height[(height - self.first_height) as usize];
        Ok(HeaderInfo {
            time: chrono::TimeZone::timestamp(&chrono::Utc, time, 0),
            height: Height(height),
        })
    }
}

/// 2025-01-15 00:00:00 UTC.
const DAY_START: u32 = 1_736_899_200;

/// A chain surrounding one priced day: enough earlier blocks for the
/// locator's coarse jumps to land inside the chain, the priced blocks,
/// and enough next-day padding for consensus depth.
fn chain_around_day(day: &[SyntheticBlock]) -> Vec<SyntheticBlock> {
    let first = day[0].height;
    let mut all = synthetic::coinbase_only_day(first - 200, DAY_START - 200 * 600, 200);
    all.extend_from_slice(day);
    let next_height = day.last().unwrap().height + 1;
    all.extend(synthetic::coinbase_only_day(
        next_height,
        DAY_START + 86_400 + 60,
        30,
    ));
    all
}

fn write_blocks(tmp: &TempDir, all: &[SyntheticBlock]) {
    // split across two files, with garbage between records in the first
    let mid = all.len() / 2;
    fs::write(
        tmp.path().join("blk00000.dat"),
        synthetic::blk_file_bytes(&all[..mid], true),
    )
    .expect("write blk00000");
    fs::write(
        tmp.path().join("blk00001.dat"),
        synthetic::blk_file_bytes(&all[mid..], false),
    )
    .expect("write blk00001");
}

fn source_for(tmp: &TempDir, all: &[SyntheticBlock]) -> Source<MockChain> {
    Source {
        chain: MockChain::new(all),
        blocks: BlockDir::open(tmp.path()).expect("open block dir"),
    }
}

#[test]
fn date_mode_recovers_the_denomination_price() {
    oracle_test::init();

    let day = synthetic::price_day(63_000.0, 880_000, DAY_START + 300, 6);
    let all = chain_around_day(&day);
    let tmp = TempDir::new("oracled-e2e").expect("tempdir");
    write_blocks(&tmp, &all);
    let source = source_for(&tmp, &all);

    let target = PriceTarget::Date(NaiveDate::from_ymd(2025, 1, 15));
    let inference =
        infer_price(target, &source, &CancelToken::new()).expect("day is priceable");

    let result = &inference.result;
    assert!(
        (62_000..=64_000).contains(&result.price_usd),
        "price = {}",
        result.price_usd
    );
    assert_eq!(
        result.window,
        PriceWindow::Day {
            date: NaiveDate::from_ymd(2025, 1, 15),
            first: Height(880_000),
            last: Height(880_005),
        }
    );
    assert!(result.samples > 1_000);
    assert_eq!(inference.range.blocks.len(), 6);
}

#[test]
fn runs_are_reproducible() {
    let day = synthetic::price_day(63_000.0, 880_000, DAY_START + 300, 6);
    let all = chain_around_day(&day);
    let tmp = TempDir::new("oracled-e2e").expect("tempdir");
    write_blocks(&tmp, &all);
    let source = source_for(&tmp, &all);

    let target = PriceTarget::Date(NaiveDate::from_ymd(2025, 1, 15));
    let first = infer_price(target, &source, &CancelToken::new()).expect("priceable");
    let second = infer_price(target, &source, &CancelToken::new()).expect("priceable");

    assert_eq!(first.result.price_usd, second.result.price_usd);
    assert_eq!(first.result.samples, second.result.samples);
}

#[test]
fn recent_mode_prices_the_tip_window() {
    let blocks = synthetic::price_day(63_000.0, 880_000, DAY_START, 150);
    let tmp = TempDir::new("oracled-e2e").expect("tempdir");
    write_blocks(&tmp, &blocks);
    let source = source_for(&tmp, &blocks);

    let inference = infer_price(PriceTarget::Recent, &source, &CancelToken::new())
        .expect("window is priceable");

    let result = &inference.result;
    assert!(
        (61_500..=64_500).contains(&result.price_usd),
        "price = {}",
        result.price_usd
    );
    match result.window {
        PriceWindow::Recent { first, last } => {
            assert_eq!(last, Height(880_148));
            assert_eq!(first, Height(880_005));
        }
        ref other => panic!("expected recent window, got {:?}", other),
    }
}

#[test]
fn all_coinbase_day_has_no_price() {
    let day = synthetic::coinbase_only_day(880_000, DAY_START + 300, 6);
    let all = chain_around_day(&day);
    let tmp = TempDir::new("oracled-e2e").expect("tempdir");
    write_blocks(&tmp, &all);
    let source = source_for(&tmp, &all);

    let target = PriceTarget::Date(NaiveDate::from_ymd(2025, 1, 15));
    match infer_price(target, &source, &CancelToken::new()) {
        Err(OracleError::Price(PriceError::EmptyHistogram)) => {}
        other => panic!("expected EmptyHistogram, got {:?}", other),
    }
}

#[test]
fn cancellation_stops_the_run() {
    let day = synthetic::price_day(63_000.0, 880_000, DAY_START + 300, 6);
    let all = chain_around_day(&day);
    let tmp = TempDir::new("oracled-e2e").expect("tempdir");
    write_blocks(&tmp, &all);
    let source = source_for(&tmp, &all);

    let cancel = CancelToken::new();
    cancel.cancel();
    let target = PriceTarget::Date(NaiveDate::from_ymd(2025, 1, 15));
    let result = infer_price(target, &source, &cancel);
    match result {
        Err(ref error) if error.is_cancelled() => {}
        other => panic!("expected cancellation, got {:?}", other),
    }
}

#[test]
fn exit_codes_follow_the_contract() {
    assert_eq!(OracleError::Config("x".into()).exit_code(), 1);
    assert_eq!(
        OracleError::Rpc(RpcError::DateTooOld {
            date: NaiveDate::from_ymd(2020, 1, 1),
            min: NaiveDate::from_ymd(2023, 12, 15),
        })
        .exit_code(),
        2
    );
    assert_eq!(OracleError::Rpc(RpcError::BadReply("x")).exit_code(), 3);
    assert_eq!(
        OracleError::Price(PriceError::EmptyHistogram).exit_code(),
        4
    );
}
