use bytes::Bytes;

use super::*;
use crate::transparent::Input;

#[test]
fn legacy_coinbase_parses_with_known_txid() {
    oracle_test::init();

    let payload = Bytes::from(oracle_test::vectors::GENESIS_COINBASE_TX.clone());
    let (tx, consumed) = Transaction::parse(&payload, 0).expect("genesis coinbase parses");

    assert_eq!(consumed, payload.len());
    assert_eq!(tx.version, 1);
    assert!(tx.is_coinbase());
    assert!(!tx.is_segwit());
    assert_eq!(tx.inputs.len(), 1);
    assert_eq!(tx.outputs.len(), 1);
    assert_eq!(tx.outputs[0].value.0, 50_0000_0000);
    assert_eq!(
        tx.txid().to_string(),
        oracle_test::vectors::GENESIS_COINBASE_TXID
    );
}

#[test]
fn segwit_txid_excludes_witness_bytes() {
    oracle_test::init();

    let payload = Bytes::from(oracle_test::vectors::SEGWIT_TX.clone());
    let (tx, consumed) = Transaction::parse(&payload, 0).expect("segwit tx parses");

    assert_eq!(consumed, payload.len());
    assert!(tx.is_segwit());
    assert!(!tx.is_coinbase());
    assert_eq!(tx.inputs.len(), 1);
    assert_eq!(tx.outputs.len(), 2);
    assert_eq!(tx.outputs[0].value.0, 123_456_789);
    assert_eq!(tx.outputs[1].value.0, 50_000_000);

    // witness: a 71-byte signature shape and a 33-byte key shape
    assert_eq!(tx.witness_total_len(), 104);
    assert_eq!(tx.witness_largest_item(), 71);

    // the witness and marker/flag must not reach the txid preimage
    assert_eq!(tx.txid().to_string(), oracle_test::vectors::SEGWIT_TXID);
}

#[test]
fn segwit_spent_outpoint_is_reported() {
    let payload = Bytes::from(oracle_test::vectors::SEGWIT_TX.clone());
    let (tx, _) = Transaction::parse(&payload, 0).expect("segwit tx parses");

    let spent: Vec<_> = tx.spent_outpoints().collect();
    assert_eq!(spent.len(), 1);
    assert_eq!(spent[0].index, 1);
    let expected: Vec<u8> = (0..32).collect();
    assert_eq!(&spent[0].hash.0[..], &expected[..]);
}

#[test]
fn coinbase_input_classified_by_outpoint_pattern() {
    let payload = Bytes::from(oracle_test::vectors::GENESIS_COINBASE_TX.clone());
    let (tx, _) = Transaction::parse(&payload, 0).expect("genesis coinbase parses");

    match &tx.inputs[0] {
        Input::Coinbase { sequence, .. } => assert_eq!(*sequence, 0xFFFF_FFFF),
        other => panic!("expected coinbase input, got {:?}", other),
    }
    assert_eq!(tx.spent_outpoints().count(), 0);
}

#[test]
fn truncated_transaction_is_rejected() {
    let full = oracle_test::vectors::GENESIS_COINBASE_TX.clone();
    for cut in [3, 40, 100, full.len() - 1].iter() {
        let payload = Bytes::from(full[..*cut].to_vec());
        let err = Transaction::parse(&payload, 0).unwrap_err();
        assert!(
            matches!(err, SerializationError::Truncated(_)),
            "cut at {} gave {:?}",
            cut,
            err
        );
    }
}

#[test]
fn zero_output_count_is_rejected() {
    // version | 1 input (null outpoint, empty script) | 0 outputs | locktime
    let mut raw = Vec::new();
    raw.extend_from_slice(&1i32.to_le_bytes());
    raw.push(1);
    raw.extend_from_slice(&[0u8; 32]);
    raw.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
    raw.push(0);
    raw.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
    raw.push(0); // no outputs
    raw.extend_from_slice(&0u32.to_le_bytes());

    let err = Transaction::parse(&Bytes::from(raw), 0).unwrap_err();
    assert!(matches!(err, SerializationError::Malformed(_)));
}

#[test]
fn op_return_output_is_flagged() {
    let mut raw = Vec::new();
    raw.extend_from_slice(&1i32.to_le_bytes());
    raw.push(1);
    raw.extend_from_slice(&[0x11u8; 32]);
    raw.extend_from_slice(&0u32.to_le_bytes());
    raw.push(0);
    raw.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
    raw.push(2);
    // a spendable output
    raw.extend_from_slice(&10_000u64.to_le_bytes());
    raw.push(1);
    raw.push(0x51);
    // a data carrier output
    raw.extend_from_slice(&0u64.to_le_bytes());
    raw.push(3);
    raw.extend_from_slice(&[0x6A, 0x01, 0xFF]);
    raw.extend_from_slice(&0u32.to_le_bytes());

    let (tx, _) = Transaction::parse(&Bytes::from(raw), 0).expect("tx parses");
    assert!(!tx.outputs[0].is_op_return());
    assert!(tx.outputs[1].is_op_return());
}
