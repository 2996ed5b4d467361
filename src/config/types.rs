use std::str::FromStr;

use ckb_jsonrpc_types::Script;
use ckb_sdk::{Address, NetworkType};
use ckb_types::packed;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A cell owner given either as a bech32m CKB address string or as a raw
/// lock script.
#[derive(Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum AddressOrScript {
    Address(CkbAddress),
    Script(Script),
}

impl AddressOrScript {
    pub fn lock_script(&self) -> packed::Script {
        match self {
            Self::Address(address) => (&address.0).into(),
            Self::Script(script) => script.clone().into(),
        }
    }

    /// Network the address was encoded for, or `None` for raw scripts.
    pub fn network(&self) -> Option<NetworkType> {
        match self {
            Self::Address(address) => Some(address.0.network()),
            Self::Script(_) => None,
        }
    }
}

/// Serde wrapper around [`Address`] using the string encoding.
#[derive(Clone)]
pub struct CkbAddress(pub Address);

impl<'de> Deserialize<'de> for CkbAddress {
    fn deserialize<D>(deserializer: D) -> Result<CkbAddress, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Address::from_str(&value)
            .map(CkbAddress)
            .map_err(serde::de::Error::custom)
    }
}

impl Serialize for CkbAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}
