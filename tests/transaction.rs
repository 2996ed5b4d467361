use bytes::Bytes;
use ckb_types::{
    core::{Capacity, DepType, ScriptHashType},
    packed,
    prelude::*,
    H256,
};
use xudt_splitter::{
    amount::{decode_udt_amount, encode_udt_amount, MalformedAmount, UDT_AMOUNT_LEN},
    capacity::min_cell_capacity,
    config::Network,
    fee::{estimated_transaction_size, fee_for_size, DEFAULT_FEE_RATE},
    search::LiveCell,
    selector::{collect_capacity_inputs, collect_udt_inputs, UdtCell},
    transaction::{assemble_split_transaction, placeholder_witness},
};

fn secp_lock(arg: u8) -> packed::Script {
    packed::Script::new_builder()
        .code_hash(H256([0xaa; 32]).pack())
        .hash_type(ScriptHashType::Type.into())
        .args([arg; 20][..].pack())
        .build()
}

fn xudt_type() -> packed::Script {
    packed::Script::new_builder()
        .code_hash(H256([0xbb; 32]).pack())
        .hash_type(ScriptHashType::Type.into())
        .args([0xcc; 32][..].pack())
        .build()
}

fn out_point(byte: u8) -> packed::OutPoint {
    packed::OutPoint::new_builder()
        .tx_hash(H256([byte; 32]).pack())
        .index(0u32.pack())
        .build()
}

fn udt_cell(byte: u8, lock: &packed::Script, capacity: u64, amount: u128) -> LiveCell {
    LiveCell {
        out_point: out_point(byte),
        output: packed::CellOutput::new_builder()
            .lock(lock.clone())
            .type_(Some(xudt_type()).pack())
            .capacity(Capacity::shannons(capacity).pack())
            .build(),
        data: encode_udt_amount(amount),
    }
}

fn plain_cell(byte: u8, lock: &packed::Script, capacity: u64) -> LiveCell {
    LiveCell {
        out_point: out_point(byte),
        output: packed::CellOutput::new_builder()
            .lock(lock.clone())
            .capacity(Capacity::shannons(capacity).pack())
            .build(),
        data: Bytes::new(),
    }
}

#[test]
fn test_amount_round_trip() {
    for amount in [0u128, 1, 100, 0xdead_beef, u128::MAX] {
        let encoded = encode_udt_amount(amount);
        assert_eq!(encoded.len(), UDT_AMOUNT_LEN);
        assert_eq!(decode_udt_amount(&encoded).unwrap(), amount);
    }
}

#[test]
fn test_amount_rejects_wrong_length() {
    assert_eq!(decode_udt_amount(&[0u8; 15]), Err(MalformedAmount(15)));
    assert_eq!(decode_udt_amount(&[0u8; 17]), Err(MalformedAmount(17)));
    assert_eq!(decode_udt_amount(&[]), Err(MalformedAmount(0)));
}

#[test]
fn test_min_cell_capacity() {
    let lock = secp_lock(1);
    // 8-byte capacity field + 32 + 1 + 20 of the lock script.
    assert_eq!(
        min_cell_capacity(&lock, None, 0).unwrap(),
        Capacity::bytes(61).unwrap()
    );
    // Plus 32 + 1 + 32 of the type script and 16 bytes of amount data.
    assert_eq!(
        min_cell_capacity(&lock, Some(&xudt_type()), UDT_AMOUNT_LEN).unwrap(),
        Capacity::bytes(142).unwrap()
    );
}

#[test]
fn test_fee_rounds_up_and_grows_with_size() {
    assert_eq!(fee_for_size(1_000, 1_000), Capacity::shannons(1_000));
    assert_eq!(fee_for_size(999, 1_300), Capacity::shannons(1_299));
    assert_eq!(fee_for_size(0, 1_000), Capacity::zero());
    let mut previous = Capacity::zero();
    for size in [1usize, 10, 100, 512, 513, 4_096] {
        let fee = fee_for_size(size, DEFAULT_FEE_RATE);
        assert!(fee >= previous);
        previous = fee;
    }
}

#[test]
fn test_udt_selection_stops_at_threshold() {
    let lock = secp_lock(1);
    let candidates: Vec<UdtCell> = [(1u8, 100u128), (2, 200), (3, 50)]
        .into_iter()
        .map(|(byte, amount)| UdtCell {
            cell: udt_cell(byte, &lock, 14_200_000_000, amount),
            amount,
        })
        .collect();

    let selection = collect_udt_inputs(&candidates, 250).unwrap();
    assert_eq!(selection.cells.len(), 2);
    assert_eq!(selection.amount, 300);
    assert_eq!(selection.capacity, 2 * 14_200_000_000);
    // Order preserved.
    assert_eq!(
        selection.cells[0].cell.out_point.as_slice(),
        candidates[0].cell.out_point.as_slice()
    );
}

#[test]
fn test_udt_selection_exhaustion() {
    let lock = secp_lock(1);
    let candidates = vec![UdtCell {
        cell: udt_cell(1, &lock, 14_200_000_000, 100),
        amount: 100,
    }];
    let err = collect_udt_inputs(&candidates, 250).unwrap_err();
    assert_eq!(err.required, 250);
    assert_eq!(err.collected, 100);
}

#[test]
fn test_zero_threshold_selects_nothing() {
    let lock = secp_lock(1);
    let candidates = vec![plain_cell(1, &lock, 6_100_000_000)];
    let selection = collect_capacity_inputs(&candidates, 0).unwrap();
    assert!(selection.cells.is_empty());
    assert_eq!(selection.capacity, 0);
}

#[test]
fn test_capacity_selection_first_fit() {
    let lock = secp_lock(1);
    let candidates = vec![
        plain_cell(1, &lock, 6_100_000_000),
        plain_cell(2, &lock, 50_000_000_000),
        plain_cell(3, &lock, 7_000_000_000),
    ];
    let selection = collect_capacity_inputs(&candidates, 10_000_000_000).unwrap();
    assert_eq!(selection.cells.len(), 2);
    assert_eq!(selection.capacity, 56_100_000_000);
}

#[test]
fn test_placeholder_witness_carries_full_signature() {
    let witness = placeholder_witness();
    let lock = witness.lock().to_opt().unwrap();
    assert_eq!(lock.raw_data().len(), 65);
}

#[test]
fn test_assembled_transaction_structure() {
    let source = secp_lock(1);
    let target = secp_lock(2);
    let inputs = vec![
        udt_cell(1, &source, 14_200_000_000, 500),
        plain_cell(2, &source, 6_100_000_000),
    ];
    let outputs = vec![
        packed::CellOutput::new_builder()
            .lock(target.clone())
            .type_(Some(xudt_type()).pack())
            .capacity(Capacity::shannons(14_200_000_000).pack())
            .build(),
        packed::CellOutput::new_builder()
            .lock(source.clone())
            .capacity(Capacity::shannons(6_000_000_000).pack())
            .build(),
    ];
    let outputs_data = vec![encode_udt_amount(500), Bytes::new()];

    let tx = assemble_split_transaction(Network::Testnet, &inputs, &outputs, &outputs_data);

    // Inputs in order, witnesses aligned 1:1 with them.
    assert_eq!(tx.inputs().len(), 2);
    assert_eq!(tx.witnesses().len(), 2);
    assert_eq!(
        tx.inputs().get(0).unwrap().previous_output().as_slice(),
        inputs[0].out_point.as_slice()
    );
    let first_witness = tx.witnesses().get(0).unwrap().raw_data();
    let parsed = packed::WitnessArgs::from_slice(&first_witness).unwrap();
    assert_eq!(parsed.lock().to_opt().unwrap().raw_data().len(), 65);
    assert!(tx.witnesses().get(1).unwrap().raw_data().is_empty());

    // Outputs data aligned 1:1 with outputs.
    assert_eq!(tx.outputs().len(), 2);
    assert_eq!(tx.outputs_data().len(), 2);
    assert_eq!(
        decode_udt_amount(&tx.outputs_data().get(0).unwrap().raw_data()).unwrap(),
        500
    );
    assert!(tx.outputs_data().get(1).unwrap().raw_data().is_empty());

    // The sighash dep group and the xudt code dep.
    assert_eq!(tx.cell_deps().len(), 2);
    let dep_types: Vec<DepType> = tx
        .cell_deps()
        .into_iter()
        .map(|dep| dep.dep_type().try_into().unwrap())
        .collect();
    assert_eq!(dep_types, vec![DepType::DepGroup, DepType::Code]);

    // The placeholder keeps the estimated size stable, so the fee for this
    // size is already payable.
    assert!(estimated_transaction_size(&tx) > 0);
}
