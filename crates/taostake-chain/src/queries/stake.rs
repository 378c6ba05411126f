//! Subtensor stake queries.

use crate::ChainClient;
use crate::error::ChainError;
use subxt::dynamic::{DecodedValueThunk, Value};
use subxt::utils::AccountId32;
use taostake_core::StakeRecord;

impl ChainClient {
    /// Stake `coldkey` holds on `hotkey` (`SubtensorModule.Stake`).
    pub async fn get_stake(
        &self,
        hotkey: &AccountId32,
        coldkey: &AccountId32,
    ) -> Result<StakeRecord, ChainError> {
        let storage_query = subxt::dynamic::storage(
            "SubtensorModule",
            "Stake",
            vec![
                Value::from_bytes(hotkey.clone()),
                Value::from_bytes(coldkey.clone()),
            ],
        );

        let result: Option<DecodedValueThunk> = self
            .client()
            .storage()
            .at_latest()
            .await?
            .fetch(&storage_query)
            .await?;

        let Some(value) = result else {
            return Ok(StakeRecord::Empty);
        };

        let amount = value.to_value()?.as_u128().ok_or_else(|| {
            ChainError::InvalidData(format!("Stake entry for {} is not an integer", hotkey))
        })?;
        Ok(StakeRecord::Present(amount))
    }
}
