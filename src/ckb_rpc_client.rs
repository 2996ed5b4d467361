use anyhow::Result;
use ckb_fixed_hash::H256;
use ckb_jsonrpc_types::{JsonBytes, OutputsValidator, Transaction, Uint32};
use ckb_sdk::rpc::ckb_indexer::{Cell, Order, Pagination, SearchKey, Tip};
use jsonrpc_utils::{rpc_client, HttpClient};

/// Async CKB RPC client. The indexer module is assumed to be enabled.
#[derive(Clone)]
pub struct CkbRpcClient {
    inner: HttpClient,
}

impl CkbRpcClient {
    pub fn new(url: String) -> Self {
        Self {
            inner: HttpClient::new(url),
        }
    }
}

#[rpc_client]
impl CkbRpcClient {
    pub async fn get_indexer_tip(&self) -> Result<Option<Tip>>;
    pub async fn get_cells(
        &self,
        search_key: SearchKey,
        order: Order,
        limit: Uint32,
        after: Option<JsonBytes>,
    ) -> Result<Pagination<Cell>>;
    pub async fn send_transaction(
        &self,
        tx: Transaction,
        outputs_validator: Option<OutputsValidator>,
    ) -> Result<H256>;
}
