mod types;

use ckb_jsonrpc_types::Script;
use ckb_sdk::NetworkType;
use ckb_types::packed;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

pub use types::*;

use crate::split::SplitError;

/// Which chain the well-known script deployments are taken from.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn network_type(self) -> NetworkType {
        match self {
            Network::Mainnet => NetworkType::Mainnet,
            Network::Testnet => NetworkType::Testnet,
        }
    }
}

#[serde_as]
#[derive(Serialize, Deserialize, Clone)]
pub struct Config {
    pub network: Network,

    /// Address whose udt balance is split. Address (string) or script.
    pub source_address: AddressOrScript,
    /// Address kept stocked with fixed-denomination udt cells.
    pub target_address: AddressOrScript,

    /// Type script of the udt asset being split.
    pub udt_type_script: Script,

    /// Minimum number of udt cells the target address must hold.
    pub min_target_cells: u64,
    /// Udt amount carried by each newly created cell. A string, since the
    /// amount may exceed what TOML/JSON integers can represent.
    #[serde_as(as = "DisplayFromStr")]
    pub per_cell_amount: u128,

    /// Seconds between balancing runs.
    pub check_interval_secs: u64,
}

impl Config {
    pub fn source_lock_script(&self) -> packed::Script {
        self.source_address.lock_script()
    }

    pub fn target_lock_script(&self) -> packed::Script {
        self.target_address.lock_script()
    }

    pub fn udt_type_script(&self) -> packed::Script {
        self.udt_type_script.clone().into()
    }

    /// Check the coerced values once at the start of a run, before any
    /// ledger access.
    pub fn validate(&self) -> Result<(), SplitError> {
        if self.min_target_cells == 0 {
            return Err(SplitError::ConfigInvalid(
                "min_target_cells must be at least 1".into(),
            ));
        }
        if self.per_cell_amount == 0 {
            return Err(SplitError::ConfigInvalid(
                "per_cell_amount must be at least 1".into(),
            ));
        }
        if self.check_interval_secs == 0 {
            return Err(SplitError::ConfigInvalid(
                "check_interval_secs must be at least 1".into(),
            ));
        }
        if self.udt_type_script.code_hash.0 == [0u8; 32] {
            return Err(SplitError::ConfigInvalid(
                "udt_type_script.code_hash is zero".into(),
            ));
        }
        let expected = self.network.network_type();
        for (name, address) in [
            ("source_address", &self.source_address),
            ("target_address", &self.target_address),
        ] {
            if let Some(network) = address.network() {
                if network != expected {
                    return Err(SplitError::ConfigInvalid(format!(
                        "{name} does not match network {:?}",
                        self.network
                    )));
                }
            }
        }
        Ok(())
    }
}
