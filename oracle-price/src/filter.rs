//! The suitability filter that keeps ordinary person-to-person payments
//! and drops everything statistically unhelpful.

use std::collections::HashSet;

use oracle_chain::transaction::{self, Transaction};

/// Transactions with more inputs than this are consolidations or batch
/// spends, rarely simple payments.
const MAX_INPUTS: usize = 5;

/// A simple payment has a pay output and a change output.
const REQUIRED_OUTPUTS: usize = 2;

/// Witness budget, total and per stack item. Larger witnesses belong to
/// scripts (inscriptions, multisig vaults) whose outputs are not
/// round-USD payments.
const MAX_WITNESS_BYTES: usize = 500;

/// Decides which transactions contribute outputs to the histogram.
///
/// The same-day rule needs the full txid set of the window before any
/// decision is made, so the filter runs in two passes: [`observe`] every
/// transaction first, then [`admits`] is reliable.
///
/// [`observe`]: TxFilter::observe
/// [`admits`]: TxFilter::admits
#[derive(Debug, Default)]
pub struct TxFilter {
    same_day: HashSet<transaction::Hash>,
}

impl TxFilter {
    pub fn new() -> TxFilter {
        TxFilter::default()
    }

    /// Register a transaction of the window (first pass).
    pub fn observe(&mut self, tx: &Transaction) {
        self.same_day.insert(tx.txid());
    }

    /// Whether the transaction's outputs belong in the histogram.
    pub fn admits(&self, tx: &Transaction) -> bool {
        if tx.is_coinbase() {
            return false;
        }
        if tx.inputs.len() > MAX_INPUTS {
            return false;
        }
        if tx.outputs.len() != REQUIRED_OUTPUTS {
            return false;
        }
        if tx.outputs.iter().any(|output| output.is_op_return()) {
            return false;
        }
        if tx.witness_total_len() > MAX_WITNESS_BYTES
            || tx.witness_largest_item() > MAX_WITNESS_BYTES
        {
            return false;
        }
        // Spending an output created the same day marks exchange hops and
        // other machine flows, not person-to-person payments.
        if tx
            .spent_outpoints()
            .any(|outpoint| self.same_day.contains(&outpoint.hash))
        {
            return false;
        }
        true
    }
}
