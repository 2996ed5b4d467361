use crate::search::LiveCell;

/// A source udt cell paired with its decoded amount.
#[derive(Debug, Clone)]
pub struct UdtCell {
    pub cell: LiveCell,
    pub amount: u128,
}

/// The candidate sequence ran out before the threshold was reached.
#[derive(Debug, thiserror::Error)]
#[error("candidates exhausted: collected {collected} of {required}")]
pub struct ExhaustedCandidates {
    pub required: u128,
    pub collected: u128,
}

#[derive(Debug, Default)]
pub struct UdtSelection {
    /// Selected cells, candidate order preserved.
    pub cells: Vec<UdtCell>,
    /// Total capacity carried by the selected cells, in shannons.
    pub capacity: u64,
    /// Total udt amount carried by the selected cells.
    pub amount: u128,
}

/// Accumulate udt cells in candidate order until their amounts reach
/// `required`.
///
/// First-fit greedy: stops at the first cell that crosses the threshold, no
/// attempt is made to minimize the cell count or the change. The same
/// candidate order always yields the same selection.
pub fn collect_udt_inputs(
    candidates: &[UdtCell],
    required: u128,
) -> Result<UdtSelection, ExhaustedCandidates> {
    let mut selection = UdtSelection::default();
    for candidate in candidates {
        if selection.amount >= required {
            break;
        }
        selection.amount += candidate.amount;
        selection.capacity += candidate.cell.capacity();
        selection.cells.push(candidate.clone());
    }
    if selection.amount < required {
        return Err(ExhaustedCandidates {
            required,
            collected: selection.amount,
        });
    }
    Ok(selection)
}

#[derive(Debug, Default)]
pub struct CapacitySelection {
    /// Selected cells, candidate order preserved.
    pub cells: Vec<LiveCell>,
    /// Total capacity carried by the selected cells, in shannons.
    pub capacity: u64,
}

/// Capacity-denominated variant of [`collect_udt_inputs`] for plain cells.
pub fn collect_capacity_inputs(
    candidates: &[LiveCell],
    required: u64,
) -> Result<CapacitySelection, ExhaustedCandidates> {
    let mut selection = CapacitySelection::default();
    for candidate in candidates {
        if selection.capacity >= required {
            break;
        }
        selection.capacity += candidate.capacity();
        selection.cells.push(candidate.clone());
    }
    if selection.capacity < required {
        return Err(ExhaustedCandidates {
            required: required.into(),
            collected: selection.capacity.into(),
        });
    }
    Ok(selection)
}
