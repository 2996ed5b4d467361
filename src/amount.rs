use bytes::Bytes;

/// Byte length of a udt amount stored in a cell's data field.
pub const UDT_AMOUNT_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("expected 16 bytes of amount data, got {0}")]
pub struct MalformedAmount(pub usize);

/// Encode a udt amount as the 16-byte little-endian cell data payload.
pub fn encode_udt_amount(amount: u128) -> Bytes {
    Bytes::copy_from_slice(&amount.to_le_bytes())
}

/// Decode a udt amount from a cell's data field.
///
/// The data must be exactly [`UDT_AMOUNT_LEN`] bytes.
pub fn decode_udt_amount(data: &[u8]) -> Result<u128, MalformedAmount> {
    let data: [u8; UDT_AMOUNT_LEN] = data.try_into().map_err(|_| MalformedAmount(data.len()))?;
    Ok(u128::from_le_bytes(data))
}
