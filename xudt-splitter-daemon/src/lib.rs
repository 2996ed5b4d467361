use std::{collections::HashMap, time::Duration};

use anyhow::{bail, ensure, Context, Result};
use ckb_sdk::{
    constants::SIGHASH_TYPE_HASH,
    traits::{DefaultTransactionDependencyProvider, SecpCkbRawKeySigner},
    tx_builder::unlock_tx,
    unlock::{ScriptUnlocker, SecpSighashUnlocker},
    AddressPayload, ScriptId,
};
use ckb_types::{core::TransactionView, packed, prelude::*};
use serde::Deserialize;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use xudt_splitter::{
    ckb_jsonrpc_types::OutputsValidator,
    ckb_rpc_client::CkbRpcClient,
    config::Config as SplitConfig,
    search::IndexerLedgerView,
    split::{build_split_transaction, SplitOutcome},
};

/// Daemon configuration: the split parameters plus the process-level
/// values.
#[derive(Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub split: SplitConfig,
    /// Sighash (secp256k1) private key in hex, with or without 0x prefix.
    pub private_key: String,
    pub ckb_rpc_url: String,
}

impl Config {
    pub fn private_key(&self) -> Result<secp256k1::SecretKey> {
        let hex_key = self
            .private_key
            .strip_prefix("0x")
            .unwrap_or(&self.private_key);
        let key = hex::decode(hex_key).context("decoding private key")?;
        secp256k1::SecretKey::from_slice(&key).context("decoding private key")
    }
}

/// Lock script controlled by the signing key.
fn key_lock_script(key: &secp256k1::SecretKey) -> packed::Script {
    let pubkey = secp256k1::PublicKey::from_secret_key(&secp256k1::Secp256k1::new(), key);
    packed::Script::from(&AddressPayload::from_pubkey(&pubkey))
}

/// Run the balancing loop forever.
///
/// Runs never overlap: a tick only fires after the previous run has
/// finished, and a run that outlives the interval delays the next tick
/// instead of racing it for the same source cells.
pub async fn run(config: Config) -> Result<()> {
    let key = config.private_key()?;
    ensure!(
        key_lock_script(&key).as_slice() == config.split.source_lock_script().as_slice(),
        "private key does not unlock the configured source address",
    );

    let client = CkbRpcClient::new(config.ckb_rpc_url.clone());
    let tip = client.get_indexer_tip().await.context("get indexer tip")?;
    info!(
        tip = tip.map(|t| t.block_number.value()),
        "connected to ckb node"
    );

    let ledger = IndexerLedgerView::new(client.clone());
    let run_guard = tokio::sync::Mutex::new(());
    let mut ticks = tokio::time::interval(Duration::from_secs(config.split.check_interval_secs));
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticks.tick().await;
        let Ok(_running) = run_guard.try_lock() else {
            warn!("previous run still in flight, skipping tick");
            continue;
        };
        if let Err(e) = run_once(&config, &client, &ledger, key).await {
            error!("balancing run failed: {e:#}");
        }
    }
}

/// One balancing run: plan, sign, submit.
async fn run_once(
    config: &Config,
    client: &CkbRpcClient,
    ledger: &IndexerLedgerView,
    key: secp256k1::SecretKey,
) -> Result<()> {
    let proposal = match build_split_transaction(&config.split, ledger).await? {
        SplitOutcome::NoActionNeeded { target_cells } => {
            info!(target_cells, "no action needed");
            return Ok(());
        }
        SplitOutcome::Proposal(proposal) => proposal,
    };
    info!(
        created_cells = proposal.created_cells,
        split_amount = %proposal.split_amount,
        fee = proposal.fee,
        "submitting split transaction"
    );

    let tx = sign_transaction(&config.ckb_rpc_url, &proposal.tx, key)?;
    let tx_hash = client
        .send_transaction(tx.data().into(), Some(OutputsValidator::Passthrough))
        .await
        .context("send transaction")?;
    info!(%tx_hash, "split transaction submitted");
    Ok(())
}

/// Sign every input with the sighash key. The assembled transaction already
/// carries the placeholder witness on its first input, so no new witnesses
/// are added.
pub fn sign_transaction(
    ckb_rpc: &str,
    tx: &TransactionView,
    sender_key: secp256k1::SecretKey,
) -> Result<TransactionView> {
    let signer = SecpCkbRawKeySigner::new_with_secret_keys(vec![sender_key]);
    let sighash_unlocker = SecpSighashUnlocker::from(Box::new(signer) as Box<_>);
    let sighash_script_id = ScriptId::new_type(SIGHASH_TYPE_HASH.clone());
    let mut unlockers = HashMap::default();
    unlockers.insert(
        sighash_script_id,
        Box::new(sighash_unlocker) as Box<dyn ScriptUnlocker>,
    );

    let tx_dep_provider = DefaultTransactionDependencyProvider::new(ckb_rpc, 10);
    let (tx, still_locked) = unlock_tx(tx.clone(), &tx_dep_provider, &unlockers)?;
    if !still_locked.is_empty() {
        bail!("failed to unlock all inputs");
    }
    Ok(tx)
}
