use bytes::Bytes;
use ckb_fixed_hash::H256;
use ckb_types::{
    core::{DepType, TransactionView},
    h256, packed,
    prelude::*,
};

use crate::{config::Network, fee::SECP_SIGNATURE_SIZE, search::LiveCell};

// Well-known deployments: the secp256k1-sighash dep group and the xudt code
// cell of each chain.
const SIGHASH_DEP_TX_MAINNET: H256 =
    h256!("0x71a7ba8fc96349fea0ed3a5c47992e3b4084b031a42264a018e0072e8172e46c");
const SIGHASH_DEP_TX_TESTNET: H256 =
    h256!("0xf8de3bb47d055cdf460d93a2a6e1b05f7432f9777c8c474abf4eec1d4aee5d37");
const XUDT_DEP_TX_MAINNET: H256 =
    h256!("0xc07844ce21b38e4b071dd0e1ee3b0e27afd8d7532491327f39b786343f558ab7");
const XUDT_DEP_TX_TESTNET: H256 =
    h256!("0xbf6fb538763efec2a70a6a3dcb7242787087e1030c4e7d86585bc63a9d337f5f");

fn dep(tx_hash: H256, dep_type: DepType) -> packed::CellDep {
    packed::CellDep::new_builder()
        .out_point(
            packed::OutPoint::new_builder()
                .tx_hash(tx_hash.pack())
                .index(0u32.pack())
                .build(),
        )
        .dep_type(dep_type.into())
        .build()
}

/// Dep group unlocking secp256k1-sighash inputs.
pub fn sighash_dep(network: Network) -> packed::CellDep {
    match network {
        Network::Mainnet => dep(SIGHASH_DEP_TX_MAINNET, DepType::DepGroup),
        Network::Testnet => dep(SIGHASH_DEP_TX_TESTNET, DepType::DepGroup),
    }
}

/// Code cell of the xudt type script.
pub fn xudt_dep(network: Network) -> packed::CellDep {
    match network {
        Network::Mainnet => dep(XUDT_DEP_TX_MAINNET, DepType::Code),
        Network::Testnet => dep(XUDT_DEP_TX_TESTNET, DepType::Code),
    }
}

/// Witness standing in for the secp256k1 signature. One signature covers
/// all inputs of the same owner, so only the first witness carries it.
pub fn placeholder_witness() -> packed::WitnessArgs {
    packed::WitnessArgs::new_builder()
        .lock(Some(Bytes::from_static(&[0u8; SECP_SIGNATURE_SIZE])).pack())
        .build()
}

/// Assemble the ordered unsigned transaction: inputs with the placeholder
/// witness on the first and empty witnesses on the rest, outputs with their
/// aligned data, and the fixed lock/type code deps for the network.
pub fn assemble_split_transaction(
    network: Network,
    inputs: &[LiveCell],
    outputs: &[packed::CellOutput],
    outputs_data: &[Bytes],
) -> TransactionView {
    let mut tx = TransactionView::new_advanced_builder()
        .cell_dep(sighash_dep(network))
        .cell_dep(xudt_dep(network));
    for (index, input) in inputs.iter().enumerate() {
        let witness = if index == 0 {
            placeholder_witness().as_bytes()
        } else {
            Bytes::new()
        };
        tx = tx.input(input.as_input()).witness(witness.pack());
    }
    for (output, data) in outputs.iter().zip(outputs_data) {
        tx = tx.output(output.clone()).output_data(data.pack());
    }
    tx.build()
}
