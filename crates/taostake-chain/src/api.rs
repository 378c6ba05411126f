//! [`ChainApi`] implementation backed by a live [`ChainClient`].

use async_trait::async_trait;
use std::str::FromStr;
use subxt::utils::AccountId32;
use subxt_signer::sr25519::Keypair;
use taostake_core::{Balance, ChainApi, StakeCall, StakeRecord, TxStatusStream};

use crate::ChainClient;
use crate::error::ChainError;

/// Parse an SS58 address (any prefix).
pub fn parse_account(address: &str) -> Result<AccountId32, ChainError> {
    AccountId32::from_str(address.trim())
        .map_err(|e| ChainError::InvalidData(format!("Invalid address '{}': {:?}", address, e)))
}

#[async_trait]
impl ChainApi for ChainClient {
    type Signer = Keypair;
    type Error = ChainError;

    async fn query_balance(&self, address: &str) -> Result<Balance, ChainError> {
        let account = parse_account(address)?;
        Ok(self.get_account_balance(&account).await?.free)
    }

    async fn query_stake(&self, hotkey: &str, address: &str) -> Result<StakeRecord, ChainError> {
        let hotkey = parse_account(hotkey)?;
        let coldkey = parse_account(address)?;
        self.get_stake(&hotkey, &coldkey).await
    }

    async fn submit(&self, call: &StakeCall, signer: &Keypair) -> Result<TxStatusStream, ChainError> {
        self.submit_stake_call(call, signer).await
    }
}
