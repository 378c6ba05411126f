//! Local signing provider backed by sr25519 secret URIs.
//!
//! Each key belongs to a named source ("keyring", "polkadot-js", ...). Sources
//! play the part of browser extensions: accounts are listed source by source,
//! in the order keys were added.

use async_trait::async_trait;
use std::str::FromStr;
use subxt::utils::AccountId32;
use subxt_signer::SecretUri;
use subxt_signer::sr25519::Keypair;
use taostake_core::{Account, KeyringAccount, WalletConnector, WalletError};

struct KeyringEntry {
    account: Account,
    keypair: Keypair,
}

/// In-process wallet holding sr25519 keypairs.
#[derive(Default)]
pub struct KeyringWallet {
    entries: Vec<KeyringEntry>,
}

impl KeyringWallet {
    /// Empty wallet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wallet holding every configured account.
    pub fn from_accounts(accounts: &[KeyringAccount]) -> Result<Self, WalletError> {
        let mut wallet = Self::new();
        for entry in accounts {
            wallet.add_suri(&entry.source, entry.name.clone(), &entry.suri)?;
        }
        Ok(wallet)
    }

    /// Derive a keypair from `suri` and expose it under `source`.
    /// Returns the account; adding a key twice keeps the first entry.
    pub fn add_suri(
        &mut self,
        source: &str,
        name: Option<String>,
        suri: &str,
    ) -> Result<Account, WalletError> {
        let uri = SecretUri::from_str(suri)
            .map_err(|e| WalletError::Provider(format!("Invalid secret URI: {:?}", e)))?;
        let keypair = Keypair::from_uri(&uri)
            .map_err(|e| WalletError::Provider(format!("Cannot derive key: {:?}", e)))?;

        // Generic Substrate (prefix 42) SS58, which every Bittensor network uses
        let address = AccountId32(keypair.public_key().0).to_string();

        if let Some(existing) = self.entries.iter().find(|e| e.account.address == address) {
            tracing::debug!("Key for {} already loaded", address);
            return Ok(existing.account.clone());
        }

        let account = Account {
            address,
            display_name: name,
            source: source.to_string(),
        };
        tracing::debug!("Loaded {} from {}", account.label(), source);
        self.entries.push(KeyringEntry {
            account: account.clone(),
            keypair,
        });
        Ok(account)
    }

    /// Distinct sources, in the order they first appeared.
    pub fn sources(&self) -> Vec<&str> {
        let mut sources: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !sources.contains(&entry.account.source.as_str()) {
                sources.push(&entry.account.source);
            }
        }
        sources
    }

    /// Number of loaded keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl WalletConnector for KeyringWallet {
    type Signer = Keypair;

    async fn enable(&self, app_name: &str) -> Result<usize, WalletError> {
        let sources = self.sources();
        if sources.is_empty() {
            return Err(WalletError::NoProviderAvailable);
        }
        tracing::info!("Authorized {} with {}", app_name, sources.join(", "));
        Ok(sources.len())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, WalletError> {
        let mut accounts = Vec::with_capacity(self.entries.len());
        for source in self.sources() {
            accounts.extend(
                self.entries
                    .iter()
                    .filter(|e| e.account.source == source)
                    .map(|e| e.account.clone()),
            );
        }
        Ok(accounts)
    }

    async fn signer(&self, address: &str) -> Result<Keypair, WalletError> {
        self.entries
            .iter()
            .find(|e| e.account.address == address)
            .map(|e| e.keypair.clone())
            .ok_or_else(|| WalletError::UnknownAddress(address.to_string()))
    }
}
