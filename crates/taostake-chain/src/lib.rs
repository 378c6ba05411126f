pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod keyring;
pub mod queries;
pub mod transactions;

pub use api::parse_account;
pub use client::*;
pub use config::*;
pub use error::*;
pub use keyring::KeyringWallet;
pub use queries::account::AccountBalance;
pub use subxt_signer::sr25519::Keypair;
