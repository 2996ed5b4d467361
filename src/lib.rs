pub extern crate ckb_jsonrpc_types;
pub extern crate ckb_types;

pub mod amount;
pub mod capacity;
pub mod ckb_rpc_client;
pub mod config;
pub mod fee;
pub mod search;
pub mod selector;
pub mod split;
pub mod transaction;
