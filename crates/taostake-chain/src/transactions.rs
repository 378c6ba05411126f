//! Stake extrinsics: construction, submission and status tracking.

use crate::ChainClient;
use crate::api::parse_account;
use crate::error::ChainError;
use futures::StreamExt;
use subxt::dynamic::Value;
use subxt::tx::{DynamicPayload, TxStatus as SubxtTxStatus};
use subxt::{OnlineClient, PolkadotConfig};
use subxt_signer::sr25519::Keypair;
use taostake_core::{StakeCall, TxStatus, TxStatusStream};

/// Runtime pallet hosting the staking calls.
pub const SUBTENSOR_PALLET: &str = "SubtensorModule";

/// Call arguments: `(hotkey, amount)`.
pub fn stake_call_args(call: &StakeCall) -> Result<Vec<Value>, ChainError> {
    let hotkey = parse_account(call.hotkey())?;
    Ok(vec![
        Value::from_bytes(hotkey),
        Value::u128(call.amount()),
    ])
}

/// Build the dynamic `SubtensorModule` call for `call`.
pub fn stake_payload(call: &StakeCall) -> Result<DynamicPayload, ChainError> {
    Ok(subxt::dynamic::tx(
        SUBTENSOR_PALLET,
        call.call_name(),
        stake_call_args(call)?,
    ))
}

impl ChainClient {
    /// Sign `call` with `signer`, submit it and follow it to a terminal status.
    ///
    /// Errors returned here mean the transaction never left the client. Later
    /// failures arrive on the stream as `Dropped` or `Invalid`.
    pub async fn submit_stake_call(
        &self,
        call: &StakeCall,
        signer: &Keypair,
    ) -> Result<TxStatusStream, ChainError> {
        let payload = stake_payload(call)?;

        // Validate against the node's metadata before signing
        self.client().tx().validate(&payload)?;

        let progress = self
            .client()
            .tx()
            .sign_and_submit_then_watch_default(&payload, signer)
            .await?;

        tracing::info!(
            "Submitted {}.{}: 0x{}",
            SUBTENSOR_PALLET,
            call.call_name(),
            hex::encode(progress.extrinsic_hash().0)
        );

        let statuses = progress.filter_map(|item| async move {
            match item {
                Ok(status) => map_status(status).await,
                Err(e) => {
                    tracing::warn!("Transaction status stream failed: {}", e);
                    Some(TxStatus::Dropped(e.to_string()))
                }
            }
        });
        Ok(statuses.boxed())
    }
}

/// Translate one subxt progress event. Events with no counterpart are skipped.
async fn map_status(
    status: SubxtTxStatus<PolkadotConfig, OnlineClient<PolkadotConfig>>,
) -> Option<TxStatus> {
    match status {
        SubxtTxStatus::Broadcasted { .. } => Some(TxStatus::Broadcast),
        SubxtTxStatus::InBestBlock(in_block) => Some(TxStatus::InBlock {
            block_hash: in_block.block_hash().0,
        }),
        SubxtTxStatus::InFinalizedBlock(in_block) => {
            let block_hash = in_block.block_hash().0;
            let dispatch_error = match in_block.wait_for_success().await {
                Ok(_) => None,
                Err(e) => Some(e.to_string()),
            };
            Some(TxStatus::Finalized {
                block_hash,
                dispatch_error,
            })
        }
        SubxtTxStatus::Error { message } | SubxtTxStatus::Invalid { message } => {
            Some(TxStatus::Invalid(message))
        }
        SubxtTxStatus::Dropped { message } => Some(TxStatus::Dropped(message)),
        // Validated, NoLongerInBestBlock
        _ => None,
    }
}
