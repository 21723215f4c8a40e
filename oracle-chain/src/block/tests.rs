use bytes::Bytes;

use super::*;
use crate::SerializationError;

#[test]
fn genesis_block_parses_with_known_hash() {
    oracle_test::init();

    let payload = Bytes::from(oracle_test::vectors::GENESIS_BLOCK.clone());
    let block = Block::parse(payload).expect("genesis block parses");

    assert_eq!(block.hash().to_string(), oracle_test::vectors::GENESIS_HASH);
    assert_eq!(block.header.version, 1);
    assert_eq!(block.header.previous_block_hash, Hash([0u8; 32]));
    assert_eq!(block.header.time.timestamp(), 1_231_006_505);
    assert_eq!(block.transactions.len(), 1);
    assert!(block.transactions[0].is_coinbase());
    assert_eq!(
        block.transactions[0].txid().to_string(),
        oracle_test::vectors::GENESIS_COINBASE_TXID
    );
}

#[test]
fn header_hash_matches_scanner_convention() {
    // The scanner hashes the raw 80 bytes before parsing; both paths must
    // agree on every block.
    let raw = &oracle_test::vectors::GENESIS_BLOCK[..Header::LEN];
    let from_scanner = Hash::of_header_bytes(raw);
    let parsed = Header::parse(raw).expect("header parses");
    assert_eq!(parsed.hash(), from_scanner);
}

#[test]
fn short_header_is_truncated() {
    let err = Header::parse(&[0u8; 79]).unwrap_err();
    assert!(matches!(err, SerializationError::Truncated(_)));
}

#[test]
fn missing_transaction_is_truncated() {
    // Claim two transactions but provide one.
    let mut raw = oracle_test::vectors::GENESIS_BLOCK.clone();
    raw[Header::LEN] = 2;
    let err = Block::parse(Bytes::from(raw)).unwrap_err();
    assert!(matches!(err, SerializationError::Truncated(_)));
}

#[test]
fn absurd_transaction_count_is_malformed() {
    let mut raw = oracle_test::vectors::GENESIS_BLOCK[..Header::LEN].to_vec();
    raw.push(0xFE);
    raw.extend_from_slice(&u32::MAX.to_le_bytes());
    let err = Block::parse(Bytes::from(raw)).unwrap_err();
    assert!(matches!(err, SerializationError::Malformed(_)));
}

#[test]
fn hash_display_roundtrips() {
    let hash: Hash = oracle_test::vectors::GENESIS_HASH
        .parse()
        .expect("well-formed hash parses");
    assert_eq!(hash.to_string(), oracle_test::vectors::GENESIS_HASH);
}
