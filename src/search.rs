use anyhow::{Context as _, Result};
use async_trait::async_trait;
use bytes::Bytes;
use ckb_sdk::rpc::ckb_indexer;
use ckb_types::{packed, prelude::*};

use crate::{amount::UDT_AMOUNT_LEN, ckb_rpc_client::CkbRpcClient};

const QUERY_PAGE_SIZE: u32 = 64;

/// A live cell read from the ledger.
#[derive(Debug, Clone)]
pub struct LiveCell {
    pub out_point: packed::OutPoint,
    pub output: packed::CellOutput,
    pub data: Bytes,
}

impl LiveCell {
    pub fn capacity(&self) -> u64 {
        self.output.capacity().unpack()
    }

    pub fn as_input(&self) -> packed::CellInput {
        packed::CellInput::new_builder()
            .previous_output(self.out_point.clone())
            .build()
    }
}

impl From<ckb_indexer::Cell> for LiveCell {
    fn from(cell: ckb_indexer::Cell) -> Self {
        LiveCell {
            out_point: cell.out_point.into(),
            output: cell.output.into(),
            data: cell
                .output_data
                .map(|data| data.into_bytes())
                .unwrap_or_default(),
        }
    }
}

/// Read-only view of the live cells currently owned by a lock script.
#[async_trait]
pub trait LedgerView {
    /// Live cells owned by `lock`, in the order the ledger returns them.
    ///
    /// With a `udt_type`, only udt cells of that asset (16-byte data) are
    /// returned; with `None`, only plain capacity cells (no type script,
    /// empty data). Implementations must return a stable order: input
    /// selection is deterministic only if the candidate order is.
    async fn live_cells(
        &self,
        lock: packed::Script,
        udt_type: Option<packed::Script>,
    ) -> Result<Vec<LiveCell>>;
}

/// [`LedgerView`] backed by the indexer module of a CKB node.
pub struct IndexerLedgerView {
    client: CkbRpcClient,
}

impl IndexerLedgerView {
    pub fn new(client: CkbRpcClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LedgerView for IndexerLedgerView {
    async fn live_cells(
        &self,
        lock: packed::Script,
        udt_type: Option<packed::Script>,
    ) -> Result<Vec<LiveCell>> {
        let filter = match &udt_type {
            Some(udt_type) => {
                let type_len = udt_type.as_slice().len() as u64;
                ckb_indexer::SearchKeyFilter {
                    script: Some(udt_type.clone().into()),
                    script_len_range: Some([type_len.into(), (type_len + 1).into()]),
                    output_data_len_range: Some([
                        (UDT_AMOUNT_LEN as u64).into(),
                        (UDT_AMOUNT_LEN as u64 + 1).into(),
                    ]),
                    ..Default::default()
                }
            }
            None => ckb_indexer::SearchKeyFilter {
                script_len_range: Some([0.into(), 1.into()]),
                output_data_len_range: Some([0.into(), 1.into()]),
                ..Default::default()
            },
        };

        let mut cells = Vec::new();
        let mut after = None;
        loop {
            let page = self
                .client
                .get_cells(
                    ckb_indexer::SearchKey {
                        filter: Some(filter.clone()),
                        group_by_transaction: Some(true),
                        script: lock.clone().into(),
                        script_search_mode: Some(ckb_indexer::ScriptSearchMode::Exact),
                        script_type: ckb_indexer::ScriptType::Lock,
                        with_data: Some(true),
                    },
                    ckb_indexer::Order::Asc,
                    QUERY_PAGE_SIZE.into(),
                    after.take(),
                )
                .await
                .context("get_cells")?;
            let page_len = page.objects.len();
            cells.extend(page.objects.into_iter().map(LiveCell::from));
            if page_len < QUERY_PAGE_SIZE as usize || page.last_cursor.is_empty() {
                break;
            }
            after = Some(page.last_cursor);
        }
        Ok(cells)
    }
}
