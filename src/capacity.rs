use anyhow::Result;
use ckb_types::{core::Capacity, packed, prelude::*};

/// Minimum capacity a cell must carry given its lock script, optional type
/// script and data payload length.
///
/// This is the occupied capacity of the cell: the 8-byte capacity field
/// itself plus the serialized lock, type and data sizes.
pub fn min_cell_capacity(
    lock: &packed::Script,
    type_script: Option<&packed::Script>,
    data_len: usize,
) -> Result<Capacity> {
    let output = packed::CellOutput::new_builder()
        .lock(lock.clone())
        .type_(type_script.cloned().pack())
        .build();
    Ok(output.occupied_capacity(Capacity::bytes(data_len)?)?)
}
