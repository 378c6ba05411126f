//! Core domain types for the stake workflow.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// On-chain quantity in base units (10^9 base units = 1 TAO).
pub type Balance = u128;

/// Supported networks - exhaustive match required (no default case).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Finney,
    #[default]
    Testnet,
    Local,
}

impl Network {
    pub fn token_symbol(&self) -> &'static str {
        match self {
            Network::Finney | Network::Testnet | Network::Local => "TAO",
        }
    }

    pub fn token_decimals(&self) -> u8 {
        match self {
            Network::Finney | Network::Testnet | Network::Local => 9,
        }
    }

    /// Returns all known networks.
    pub fn all() -> &'static [Network] {
        &[Network::Finney, Network::Testnet, Network::Local]
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Finney => write!(f, "Finney"),
            Network::Testnet => write!(f, "Testnet"),
            Network::Local => write!(f, "Local"),
        }
    }
}

/// Connection status for the chain client.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Error(String),
}

/// An account exposed by a signing provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// SS58-encoded address.
    pub address: String,
    /// Name the provider attached to the account, if any.
    pub display_name: Option<String>,
    /// Provider the account came from.
    pub source: String,
}

impl Account {
    /// Returns the display name, or "Unnamed Account" if none is set.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or("Unnamed Account")
    }
}

/// The (account, hotkey) pair every query and transaction is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedContext {
    pub account: Account,
    pub hotkey: String,
}

/// Free balance of the selected account at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub free: Balance,
    pub as_of: SystemTime,
}

/// Stake held by the selected account on the selected hotkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StakeSnapshot {
    pub current: Balance,
}

/// Stake adjustment the user can submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StakeAction {
    /// Delegate more stake to the hotkey.
    Add,
    /// Withdraw the typed amount from the hotkey.
    Remove,
    /// Withdraw everything currently staked on the hotkey.
    RemoveMax,
}

impl StakeAction {
    /// Get display label for the action.
    pub fn label(&self) -> &'static str {
        match self {
            StakeAction::Add => "Add Stake",
            StakeAction::Remove => "Remove Stake",
            StakeAction::RemoveMax => "Unstake Max Amount",
        }
    }

    /// Whether the action reads the typed amount field.
    pub fn uses_typed_amount(&self) -> bool {
        !matches!(self, StakeAction::RemoveMax)
    }

    /// Verb used in notifications ("add" / "remove").
    pub fn verb(&self) -> &'static str {
        match self {
            StakeAction::Add => "add",
            StakeAction::Remove | StakeAction::RemoveMax => "remove",
        }
    }

    /// Past participle used in notifications ("added" / "removed").
    pub fn past_tense(&self) -> &'static str {
        match self {
            StakeAction::Add => "added",
            StakeAction::Remove | StakeAction::RemoveMax => "removed",
        }
    }
}

/// A request to adjust stake. `amount` is ignored for [`StakeAction::RemoveMax`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeIntent {
    pub action: StakeAction,
    pub amount: String,
}

impl StakeIntent {
    pub fn new(action: StakeAction, amount: impl Into<String>) -> Self {
        Self {
            action,
            amount: amount.into(),
        }
    }
}

/// Per-action in-flight flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadingState {
    pub add: bool,
    pub remove: bool,
    pub remove_max: bool,
}

impl LoadingState {
    pub fn get(&self, action: StakeAction) -> bool {
        match action {
            StakeAction::Add => self.add,
            StakeAction::Remove => self.remove,
            StakeAction::RemoveMax => self.remove_max,
        }
    }

    pub fn set(&mut self, action: StakeAction, value: bool) {
        match action {
            StakeAction::Add => self.add = value,
            StakeAction::Remove => self.remove = value,
            StakeAction::RemoveMax => self.remove_max = value,
        }
    }

    /// True while any operation is in flight. Gates new submissions.
    pub fn is_any(&self) -> bool {
        self.add || self.remove || self.remove_max
    }
}

/// Lifecycle of a single stake operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperationPhase {
    #[default]
    Idle,
    Validating,
    Signing,
    Submitting,
    AwaitingFinalization,
    Succeeded,
    Failed,
}

impl OperationPhase {
    /// Get display label.
    pub fn label(&self) -> &'static str {
        match self {
            OperationPhase::Idle => "Idle",
            OperationPhase::Validating => "Validating",
            OperationPhase::Signing => "Signing",
            OperationPhase::Submitting => "Submitting",
            OperationPhase::AwaitingFinalization => "Awaiting Finalization",
            OperationPhase::Succeeded => "Succeeded",
            OperationPhase::Failed => "Failed",
        }
    }
}
