//! The orchestrator: chain index → block files → filter → histogram →
//! stencil fit → cluster refinement.

use chrono::NaiveDate;
use tracing::info;

use oracle_chain::block::{Block, Height};
use oracle_price::{Accumulator, Estimate, PriceResult, PriceWindow};
use oracle_rpc::{locator, CancelToken, ChainView, RpcError};
use oracle_store::{start_file_index, BlockDir};

use crate::OracleError;

/// What the run should price.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PriceTarget {
    /// All blocks of one UTC day.
    Date(NaiveDate),
    /// The most recent 144 blocks, regardless of day boundaries.
    Recent,
}

/// The data sources a run draws from.
#[derive(Debug)]
pub struct Source<C: ChainView> {
    /// The node's chain index, for height/hash/time lookups.
    pub chain: C,
    /// The node's raw block files.
    pub blocks: BlockDir,
}

/// A completed inference: the result plus the per-output data that backs
/// it, for rendering.
#[derive(Debug)]
pub struct Inference {
    pub result: PriceResult,
    pub estimate: Estimate,
    pub range: locator::BlockRange,
}

/// Run the whole pipeline for one target window.
pub fn infer_price<C: ChainView>(
    target: PriceTarget,
    source: &Source<C>,
    cancel: &CancelToken,
) -> Result<Inference, OracleError> {
    let range = match target {
        PriceTarget::Date(date) => locator::day_blocks(&source.chain, date, cancel)?,
        PriceTarget::Recent => locator::recent_blocks(&source.chain, cancel)?,
    };
    let (first, last) = match (range.first_height(), range.last_height()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(oracle_price::PriceError::EmptyHistogram.into()),
    };

    let locations = locate_blocks(source, &range)?;

    // Pass one: the same-day filter needs every txid of the window before
    // any admission decision, so all blocks are parsed once just to
    // register txids. Blocks are re-read rather than kept: a busy day of
    // payloads would dwarf the per-output list the memory budget is
    // shaped around.
    let mut accumulator = Accumulator::new();
    info!(blocks = range.blocks.len(), "collecting window txids");
    for_each_block(source, &range, &locations, cancel, |_, block| {
        accumulator.observe(&block);
        Ok(())
    })?;

    // Pass two: filter, bin, and retain qualifying outputs.
    info!("collecting qualifying outputs");
    for_each_block(source, &range, &locations, cancel, |height, block| {
        accumulator.record(height, &block);
        Ok(())
    })?;

    let estimate = accumulator.estimate()?;

    let window = match range.date {
        Some(date) => PriceWindow::Day { date, first, last },
        None => PriceWindow::Recent { first, last },
    };
    let result = estimate.clone().into_result(window);
    info!(
        price = result.price_usd,
        samples = result.samples,
        "inference complete"
    );

    Ok(Inference {
        result,
        estimate,
        range,
    })
}

/// Map the range's hashes to on-disk locations, starting the scan at a
/// file index estimated from the range's depth below the tip.
fn locate_blocks<C: ChainView>(
    source: &Source<C>,
    range: &locator::BlockRange,
) -> Result<std::collections::HashMap<oracle_chain::block::Hash, oracle_store::BlockLocation>, OracleError>
{
    let targets = range.blocks.iter().map(|b| b.hash).collect();

    let tip = source.chain.block_count()?;
    let depth = tip
        .0
        .saturating_sub(range.first_height().map(|h| h.0).unwrap_or(tip.0));
    let last_file_index = source
        .blocks
        .block_files()?
        .last()
        .map(|(index, _)| *index)
        .unwrap_or(0);
    let start = start_file_index(last_file_index, depth);

    info!(start, depth, "scanning block files");
    Ok(source.blocks.scan(&targets, start)?)
}

fn for_each_block<C: ChainView>(
    source: &Source<C>,
    range: &locator::BlockRange,
    locations: &std::collections::HashMap<oracle_chain::block::Hash, oracle_store::BlockLocation>,
    cancel: &CancelToken,
    mut visit: impl FnMut(Height, Block) -> Result<(), OracleError>,
) -> Result<(), OracleError> {
    let mut heartbeat = 0usize;
    for (i, block_ref) in range.blocks.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(RpcError::Cancelled.into());
        }
        let location = locations
            .get(&block_ref.hash)
            .expect("scan resolved every target hash");
        let payload = source.blocks.read_block(location)?;
        let block = Block::parse(payload)?;
        visit(block_ref.height, block)?;

        let pct = (i + 1) * 100 / range.blocks.len();
        if pct >= heartbeat + 20 {
            heartbeat = pct - pct % 20;
            info!("block pass {}%", heartbeat);
        }
    }
    Ok(())
}
