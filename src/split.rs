use anyhow::anyhow;
use bytes::Bytes;
use ckb_fixed_hash::H256;
use ckb_types::{
    core::{Capacity, TransactionView},
    packed,
    prelude::*,
};
use tracing::{debug, info};

use crate::{
    amount::{self, decode_udt_amount, encode_udt_amount, UDT_AMOUNT_LEN},
    capacity::min_cell_capacity,
    config::Config,
    fee::{estimated_transaction_size, fee_for_size, DEFAULT_FEE_RATE, MAX_FEE},
    search::{LedgerView, LiveCell},
    selector::{collect_capacity_inputs, collect_udt_inputs, UdtCell},
    transaction::assemble_split_transaction,
};

/// Why a balancing run could not produce a transaction.
#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    /// A required configuration value is missing or unusable.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),
    /// The source address cannot fund even one new cell.
    #[error("source udt balance {balance} cannot fund a {per_cell_amount}-unit cell")]
    NoSourceFunds { balance: u128, per_cell_amount: u128 },
    /// Selected inputs cannot cover the outputs plus the transaction fee.
    #[error(
        "insufficient capacity: outputs and fee need {required} shannons, inputs carry {available}"
    )]
    InsufficientCapacity { required: u64, available: u64 },
    /// A udt cell's data field does not decode as an amount.
    #[error("cell {tx_hash}#{index} carries a malformed udt amount: {source}")]
    MalformedAmount {
        tx_hash: H256,
        index: u32,
        #[source]
        source: amount::MalformedAmount,
    },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Successful outcome of a single balancing run.
#[derive(Debug)]
pub enum SplitOutcome {
    /// The target already holds at least the configured minimum.
    NoActionNeeded { target_cells: u64 },
    /// A balanced transaction is ready for signing.
    Proposal(SplitProposal),
}

/// An unsigned, fully balanced split transaction.
#[derive(Debug)]
pub struct SplitProposal {
    pub tx: TransactionView,
    /// Number of new udt cells created at the target address.
    pub created_cells: u64,
    /// Udt amount moving into the newly created cells.
    pub split_amount: u128,
    /// Fee paid out of the trailing change output, in shannons.
    pub fee: u64,
}

/// Build one balanced split transaction, or decide that no action is
/// needed.
///
/// Reads the ledger fresh and holds no state between runs. A returned
/// transaction satisfies both conservation laws exactly: input capacity
/// equals output capacity plus fee, and input udt equals output udt.
pub async fn build_split_transaction<L>(
    config: &Config,
    ledger: &L,
) -> Result<SplitOutcome, SplitError>
where
    L: LedgerView + ?Sized,
{
    config.validate()?;

    let source_lock = config.source_lock_script();
    let target_lock = config.target_lock_script();
    let udt_type = config.udt_type_script();
    let per_cell_amount = config.per_cell_amount;

    // How many udt cells does the target hold right now?
    let target_count = ledger
        .live_cells(target_lock.clone(), Some(udt_type.clone()))
        .await?
        .len() as u64;
    if target_count >= config.min_target_cells {
        info!(
            target_count,
            min_target_cells = config.min_target_cells,
            "target is stocked, nothing to do"
        );
        return Ok(SplitOutcome::NoActionNeeded {
            target_cells: target_count,
        });
    }

    // Source balance.
    let source_cells = ledger
        .live_cells(source_lock.clone(), Some(udt_type.clone()))
        .await?;
    if source_cells.is_empty() {
        return Err(SplitError::NoSourceFunds {
            balance: 0,
            per_cell_amount,
        });
    }
    let mut candidates = Vec::with_capacity(source_cells.len());
    let mut source_balance: u128 = 0;
    for cell in source_cells {
        let amount =
            decode_udt_amount(&cell.data).map_err(|source| SplitError::MalformedAmount {
                tx_hash: cell.out_point.tx_hash().unpack(),
                index: cell.out_point.index().unpack(),
                source,
            })?;
        source_balance = source_balance
            .checked_add(amount)
            .ok_or_else(|| anyhow!("source udt balance overflow"))?;
        candidates.push(UdtCell { cell, amount });
    }

    // Deficit, clamped to what the source balance can actually fund.
    let mut need_count = config.min_target_cells - target_count;
    if per_cell_amount
        .checked_mul(need_count.into())
        .map_or(true, |required| required > source_balance)
    {
        need_count = u64::try_from(source_balance / per_cell_amount)
            .unwrap_or(u64::MAX)
            .min(need_count);
    }
    if need_count == 0 {
        return Err(SplitError::NoSourceFunds {
            balance: source_balance,
            per_cell_amount,
        });
    }
    let split_amount = per_cell_amount * u128::from(need_count);
    info!(
        target_count,
        need_count, source_balance, "target is short, splitting source cells"
    );

    // Select udt inputs covering the split amount.
    let selection =
        collect_udt_inputs(&candidates, split_amount).map_err(|_| SplitError::NoSourceFunds {
            balance: source_balance,
            per_cell_amount,
        })?;
    let selected_amount = selection.amount;
    let mut selected_capacity = selection.capacity;
    let mut inputs: Vec<LiveCell> = selection.cells.into_iter().map(|udt| udt.cell).collect();

    // One new cell per deficit unit at the target.
    let per_cell_capacity = min_cell_capacity(&target_lock, Some(&udt_type), UDT_AMOUNT_LEN)?;
    let udt_output = packed::CellOutput::new_builder()
        .lock(target_lock)
        .type_(Some(udt_type.clone()).pack())
        .capacity(per_cell_capacity.pack())
        .build();
    let mut outputs: Vec<packed::CellOutput> = Vec::new();
    let mut outputs_data: Vec<Bytes> = Vec::new();
    for _ in 0..need_count {
        outputs.push(udt_output.clone());
        outputs_data.push(encode_udt_amount(per_cell_amount));
    }
    let mut output_capacity = per_cell_capacity.as_u64() * need_count;

    // Udt change back to the source.
    if selected_amount > split_amount {
        let change_capacity = min_cell_capacity(&source_lock, Some(&udt_type), UDT_AMOUNT_LEN)?;
        outputs.push(
            packed::CellOutput::new_builder()
                .lock(source_lock.clone())
                .type_(Some(udt_type.clone()).pack())
                .capacity(change_capacity.pack())
                .build(),
        );
        outputs_data.push(encode_udt_amount(selected_amount - split_amount));
        output_capacity += change_capacity.as_u64();
    }

    debug!(
        inputs = inputs.len(),
        selected_capacity, selected_amount, output_capacity, "selected udt inputs"
    );

    // Cover any capacity shortfall with plain cells from the source. The
    // threshold ignores the fee; the actual fee comes out of the change
    // output below.
    if selected_capacity < output_capacity + MAX_FEE {
        let gap = output_capacity.saturating_sub(selected_capacity);
        let capacity_cells = ledger.live_cells(source_lock.clone(), None).await?;
        if capacity_cells.is_empty() && gap > 0 {
            return Err(SplitError::InsufficientCapacity {
                required: output_capacity,
                available: selected_capacity,
            });
        }
        if gap > 0 {
            let extra = collect_capacity_inputs(&capacity_cells, gap).map_err(|exhausted| {
                SplitError::InsufficientCapacity {
                    required: output_capacity,
                    available: selected_capacity + exhausted.collected as u64,
                }
            })?;
            selected_capacity += extra.capacity;
            inputs.extend(extra.cells);
        }
    }

    // Trailing plain change output; its capacity absorbs the fee below.
    let change = selected_capacity - output_capacity;
    if change > 0 {
        outputs.push(
            packed::CellOutput::new_builder()
                .lock(source_lock.clone())
                .capacity(Capacity::shannons(change).pack())
                .build(),
        );
        outputs_data.push(Bytes::new());
    }

    // The fee depends on the serialized size, which is already final here:
    // the placeholder witness stands in for the real signature and the
    // capacity adjustment below does not change any field length.
    let tx = assemble_split_transaction(config.network, &inputs, &outputs, &outputs_data);
    let size = estimated_transaction_size(&tx);
    let fee = fee_for_size(size, DEFAULT_FEE_RATE).as_u64();
    let min_change = min_cell_capacity(&source_lock, None, 0)?.as_u64();
    if change < fee + min_change {
        return Err(SplitError::InsufficientCapacity {
            required: output_capacity + fee + min_change,
            available: selected_capacity,
        });
    }
    let tx = match outputs.pop() {
        Some(change_output) => {
            outputs.push(
                change_output
                    .as_builder()
                    .capacity(Capacity::shannons(change - fee).pack())
                    .build(),
            );
            assemble_split_transaction(config.network, &inputs, &outputs, &outputs_data)
        }
        None => {
            return Err(SplitError::InsufficientCapacity {
                required: output_capacity + fee,
                available: selected_capacity,
            });
        }
    };
    info!(size, fee, change = change - fee, "applied transaction fee");

    // Both conservation laws must hold exactly before the transaction is
    // handed to the signer.
    let input_capacity: u64 = inputs.iter().map(LiveCell::capacity).sum();
    let output_total: u64 = tx
        .outputs()
        .into_iter()
        .map(|output| {
            let capacity: u64 = output.capacity().unpack();
            capacity
        })
        .sum();
    if input_capacity != output_total + fee {
        return Err(SplitError::Other(anyhow!(
            "capacity not conserved: inputs {input_capacity}, outputs {output_total}, fee {fee}"
        )));
    }
    let mut output_udt: u128 = 0;
    for data in &outputs_data {
        if !data.is_empty() {
            output_udt += decode_udt_amount(data).map_err(|e| anyhow!(e))?;
        }
    }
    if output_udt != selected_amount {
        return Err(SplitError::Other(anyhow!(
            "udt amount not conserved: inputs {selected_amount}, outputs {output_udt}"
        )));
    }

    Ok(SplitOutcome::Proposal(SplitProposal {
        tx,
        created_cells: need_count,
        split_amount,
        fee,
    }))
}
