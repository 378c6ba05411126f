//! Signing provider seam.

use async_trait::async_trait;

use crate::error::WalletError;
use crate::types::Account;

/// Discovers signing providers and hands out signers for their accounts.
#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Signing capability bound to a single address.
    type Signer: Send + Sync;

    /// Ask every provider to authorize `app_name`. Returns how many responded.
    async fn enable(&self, app_name: &str) -> Result<usize, WalletError>;

    /// Accounts across all enabled providers, in enumeration order.
    async fn list_accounts(&self) -> Result<Vec<Account>, WalletError>;

    /// Signer for `address`; `UnknownAddress` if no provider exposes it.
    async fn signer(&self, address: &str) -> Result<Self::Signer, WalletError>;
}
