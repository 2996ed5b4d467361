use ckb_types::core::{Capacity, TransactionView};

/// Serialized size of a secp256k1 signature placed in a witness lock field.
pub const SECP_SIGNATURE_SIZE: usize = 65;

/// Fee rate applied to the estimated transaction size, in shannons per 1000
/// bytes.
pub const DEFAULT_FEE_RATE: u64 = 1_000;

/// Conservative fee upper bound used while inputs are still being selected.
/// The actual fee is computed from the final serialized size and is always
/// smaller.
pub const MAX_FEE: u64 = 20_000_000;

/// Serialized size of the transaction as it will be committed in a block.
///
/// The transaction is expected to already carry the full-size unlock
/// placeholder on its first witness (see
/// [`placeholder_witness`](crate::transaction::placeholder_witness)) and
/// empty witnesses on the rest, so no extra signature headroom is added
/// here.
pub fn estimated_transaction_size(tx: &TransactionView) -> usize {
    tx.data().serialized_size_in_block()
}

/// Fee owed for a transaction of `size` bytes, rounded up so the fee always
/// covers the byte cost.
pub fn fee_for_size(size: usize, fee_rate: u64) -> Capacity {
    Capacity::shannons((size as u64 * fee_rate).div_ceil(1_000))
}
