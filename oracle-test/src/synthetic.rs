//! Deterministic synthetic chain data.
//!
//! The generators here are pure integer arithmetic mapped through f64, so
//! every run (and every host) produces bit-identical blocks. A "price day"
//! imitates the shape the oracle depends on: a broad bell of ordinary
//! output amounts on the logarithmic axis, plus concentrations at round
//! USD amounts for a chosen BTC/USD price.

use byteorder::{LittleEndian, WriteBytesExt};
use sha2::{Digest, Sha256};

/// The mainnet record marker, as written between blocks in `blk*.dat`.
pub const MAGIC: [u8; 4] = [0xF9, 0xBE, 0xB4, 0xD9];

/// Background (non-round) transactions per synthetic block.
const BG_TXS: usize = 80;

/// Round-USD transactions per synthetic block.
const SPIKE_TXS: usize = 40;

/// Round USD amounts weighted roughly by their real-world popularity.
const USD_WEIGHTED: [f64; 30] = [
    100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 50.0, 50.0, 50.0, 50.0, 10.0, 10.0, 10.0, 10.0,
    20.0, 20.0, 20.0, 500.0, 500.0, 1000.0, 1000.0, 200.0, 200.0, 5.0, 15.0, 25.0, 30.0, 40.0,
    150.0, 300.0,
];

/// A block the generator produced, with everything a test needs to stand
/// in for the chain index.
#[derive(Clone, Debug)]
pub struct SyntheticBlock {
    pub height: u64,
    pub time: u32,
    /// Header hash in internal byte order.
    pub hash: [u8; 32],
    /// Header + tx count + transactions, as stored after magic and size.
    pub payload: Vec<u8>,
}

pub fn sha256d(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(&first[..]);
    let mut out = [0u8; 32];
    out.copy_from_slice(&second[..]);
    out
}

fn push_varint(out: &mut Vec<u8>, v: u64) {
    if v < 0xFD {
        out.push(v as u8);
    } else if v <= 0xFFFF {
        out.push(0xFD);
        out.write_u16::<LittleEndian>(v as u16).unwrap();
    } else if v <= 0xFFFF_FFFF {
        out.push(0xFE);
        out.write_u32::<LittleEndian>(v as u32).unwrap();
    } else {
        out.push(0xFF);
        out.write_u64::<LittleEndian>(v).unwrap();
    }
}

/// A legacy one-input transaction paying the given satoshi amounts to
/// p2pkh-shaped scripts. `spend_tag` makes the spent outpoint unique so
/// the same-day-reuse filter never triggers on generated data.
pub fn payment_tx(spend_tag: u64, sats: &[u64]) -> Vec<u8> {
    let mut tx = Vec::new();
    tx.write_i32::<LittleEndian>(2).unwrap();

    // one input: a unique, never-seen outpoint
    push_varint(&mut tx, 1);
    let mut prev = [0xEEu8; 32];
    prev[..8].copy_from_slice(&spend_tag.to_le_bytes());
    tx.extend_from_slice(&prev);
    tx.write_u32::<LittleEndian>(0).unwrap();
    push_varint(&mut tx, 0); // empty scriptSig
    tx.write_u32::<LittleEndian>(0xFFFF_FFFF).unwrap();

    push_varint(&mut tx, sats.len() as u64);
    for &value in sats {
        tx.write_u64::<LittleEndian>(value).unwrap();
        let script = [
            0x76, 0xA9, 0x14, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42,
            0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x88, 0xAC,
        ];
        push_varint(&mut tx, script.len() as u64);
        tx.extend_from_slice(&script);
    }

    tx.write_u32::<LittleEndian>(0).unwrap();
    tx
}

/// A minimal coinbase transaction for the given height.
pub fn coinbase_tx(height: u64) -> Vec<u8> {
    let mut tx = Vec::new();
    tx.write_i32::<LittleEndian>(2).unwrap();

    push_varint(&mut tx, 1);
    tx.extend_from_slice(&[0u8; 32]);
    tx.write_u32::<LittleEndian>(0xFFFF_FFFF).unwrap();
    let mut script = vec![0x03];
    script.extend_from_slice(&height.to_le_bytes()[..3]);
    push_varint(&mut tx, script.len() as u64);
    tx.extend_from_slice(&script);
    tx.write_u32::<LittleEndian>(0xFFFF_FFFF).unwrap();

    push_varint(&mut tx, 1);
    tx.write_u64::<LittleEndian>(312_500_000).unwrap();
    let script = [0x00u8, 0x14, 0x99, 0x99, 0x99, 0x99, 0x99, 0x99, 0x99, 0x99, 0x99, 0x99];
    push_varint(&mut tx, script.len() as u64);
    tx.extend_from_slice(&script);

    tx.write_u32::<LittleEndian>(0).unwrap();
    tx
}

fn assemble_block(
    prev_hash: [u8; 32],
    height: u64,
    time: u32,
    txs: Vec<Vec<u8>>,
) -> SyntheticBlock {
    let mut header = Vec::with_capacity(80);
    header.write_i32::<LittleEndian>(4).unwrap();
    header.extend_from_slice(&prev_hash);
    header.extend_from_slice(&[0u8; 32]); // merkle root is never recomputed
    header.write_u32::<LittleEndian>(time).unwrap();
    header.write_u32::<LittleEndian>(0x1703_4219).unwrap();
    header.write_u32::<LittleEndian>(height as u32).unwrap();

    let hash = sha256d(&header);

    let mut payload = header;
    push_varint(&mut payload, txs.len() as u64);
    for tx in txs {
        payload.extend_from_slice(&tx);
    }

    SyntheticBlock {
        height,
        time,
        hash,
        payload,
    }
}

/// A deterministic value in `[-1, 1)` derived from an index.
fn uniform(i: u64, mul: u64, add: u64) -> f64 {
    ((i.wrapping_mul(mul).wrapping_add(add)) % 2001) as f64 / 1000.0 - 1.0
}

/// A background output amount in BTC: bell-shaped on the log10 axis,
/// centered near typical payment sizes, one and a half decades wide.
fn background_amount(i: u64) -> f64 {
    let h = (uniform(i, 7919, 104_729) + uniform(i, 15_485_863, 32_452_843)
        + uniform(i, 86_028_121, 49_979_687))
        / 3.0;
    10f64.powf(-2.75 + 1.5 * h)
}

/// Multiplicative jitter of up to ±1% in 41 deterministic steps.
fn spike_jitter(k: u64) -> f64 {
    1.0 + ((k % 41) as f64 - 20.0) * 0.0005
}

fn to_sats(amount_btc: f64) -> u64 {
    (amount_btc * 1e8).round() as u64
}

/// Generate a day of blocks whose round-USD outputs are denominated at
/// `price_usd` dollars per BTC. Blocks are spaced ten minutes apart
/// starting at `first_time`.
pub fn price_day(
    price_usd: f64,
    first_height: u64,
    first_time: u32,
    n_blocks: usize,
) -> Vec<SyntheticBlock> {
    let mut blocks = Vec::with_capacity(n_blocks);
    let mut prev_hash = [0u8; 32];
    let mut bg_i: u64 = 0;
    let mut spike_k: u64 = 0;
    let mut spend_tag: u64 = 0;

    for b in 0..n_blocks {
        let height = first_height + b as u64;
        let time = first_time + 600 * b as u32;

        let mut txs = vec![coinbase_tx(height)];
        for _ in 0..BG_TXS {
            let a = to_sats(background_amount(bg_i));
            let b = to_sats(background_amount(bg_i + 1));
            bg_i += 2;
            txs.push(payment_tx(spend_tag, &[a, b]));
            spend_tag += 1;
        }
        for _ in 0..SPIKE_TXS {
            let u1 = USD_WEIGHTED[(spike_k % 30) as usize];
            let a = to_sats(u1 / price_usd * spike_jitter(spike_k));
            let u2 = USD_WEIGHTED[((spike_k + 1) % 30) as usize];
            let b = to_sats(u2 / price_usd * spike_jitter(spike_k + 1));
            spike_k += 2;
            txs.push(payment_tx(spend_tag, &[a, b]));
            spend_tag += 1;
        }

        let block = assemble_block(prev_hash, height, time, txs);
        prev_hash = block.hash;
        blocks.push(block);
    }
    blocks
}

/// A day where every block contains only its coinbase: nothing qualifies
/// for the histogram.
pub fn coinbase_only_day(
    first_height: u64,
    first_time: u32,
    n_blocks: usize,
) -> Vec<SyntheticBlock> {
    let mut blocks = Vec::with_capacity(n_blocks);
    let mut prev_hash = [0u8; 32];
    for b in 0..n_blocks {
        let height = first_height + b as u64;
        let time = first_time + 600 * b as u32;
        let block = assemble_block(prev_hash, height, time, vec![coinbase_tx(height)]);
        prev_hash = block.hash;
        blocks.push(block);
    }
    blocks
}

/// Serialize blocks into `blk*.dat` form. With `garbage_gaps`, a run of
/// junk bytes is written between records to exercise scanner resync.
pub fn blk_file_bytes(blocks: &[SyntheticBlock], garbage_gaps: bool) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, block) in blocks.iter().enumerate() {
        if garbage_gaps && i > 0 {
            out.extend_from_slice(&[0u8; 11]);
            out.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        }
        out.extend_from_slice(&MAGIC);
        out.write_u32::<LittleEndian>(block.payload.len() as u32)
            .unwrap();
        out.extend_from_slice(&block.payload);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        let a = price_day(63_000.0, 880_000, 1_736_899_200, 2);
        let b = price_day(63_000.0, 880_000, 1_736_899_200, 2);
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].payload, b[0].payload);
        assert_eq!(a[1].hash, b[1].hash);
    }

    #[test]
    fn blocks_chain_and_tick() {
        let day = price_day(63_000.0, 880_000, 1_736_899_200, 3);
        assert_eq!(day[1].payload[4..36], day[0].hash);
        assert_eq!(day[2].time - day[0].time, 1200);
        assert_eq!(day[2].height, 880_002);
    }
}
