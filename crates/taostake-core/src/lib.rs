//! Core domain logic for staking TAO on a Bittensor validator.
//!
//! This crate provides:
//! - Domain types (`types` module)
//! - Decimal amount parsing and formatting (`amount` module)
//! - The wallet and chain seams (`wallet`, `chain` modules)
//! - The stake workflow controller (`workflow` module)
//! - Configuration loading (`config` module)

pub mod amount;
pub mod chain;
pub mod config;
pub mod error;
pub mod types;
pub mod wallet;
pub mod workflow;

// Re-export commonly used items
pub use amount::{AmountError, TokenUnits, format_amount, format_amount_truncated, parse_amount};
pub use chain::{ChainApi, StakeCall, StakeRecord, TxStatus, TxStatusStream};
pub use config::{AppConfig, ConfigError, KeyringAccount};
pub use error::{StakeError, WalletError};
pub use types::*;
pub use wallet::WalletConnector;
pub use workflow::{
    Intent, Notification, NotificationLevel, QueryKind, StakeOutcome, StakeView, StakeWorkflow,
    WorkflowEvent, WorkflowSettings,
};
