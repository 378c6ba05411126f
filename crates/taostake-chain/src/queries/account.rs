//! Account-related chain queries.

use crate::ChainClient;
use crate::error::ChainError;
use subxt::dynamic::{At, DecodedValueThunk, Value};
use subxt::utils::AccountId32;
use taostake_core::Balance;

/// Account balance information.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountBalance {
    pub free: Balance,
    pub reserved: Balance,
    pub frozen: Balance,
}

impl ChainClient {
    /// Get account balance information. A missing account is all zeros.
    pub async fn get_account_balance(
        &self,
        account: &AccountId32,
    ) -> Result<AccountBalance, ChainError> {
        let storage_query = subxt::dynamic::storage(
            "System",
            "Account",
            vec![Value::from_bytes(account.clone())],
        );

        let result: Option<DecodedValueThunk> = self
            .client()
            .storage()
            .at_latest()
            .await?
            .fetch(&storage_query)
            .await?;

        let Some(value) = result else {
            return Ok(AccountBalance::default());
        };

        let decoded = value.to_value()?;

        // AccountInfo = { nonce, consumers, providers, sufficients, data: AccountData }
        let data = decoded.at("data");
        let field = |name: &str| {
            data.and_then(|d| d.at(name))
                .and_then(|v: &Value<u32>| v.as_u128())
                .unwrap_or(0)
        };

        Ok(AccountBalance {
            free: field("free"),
            reserved: field("reserved"),
            frozen: field("frozen"),
        })
    }
}
