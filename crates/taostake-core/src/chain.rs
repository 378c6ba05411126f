//! Chain client seam: reads, stake calls and the transaction status stream.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::types::{Balance, StakeAction};

/// Result of a stake storage lookup, decoded once at the query boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakeRecord {
    /// No stake entry exists for the (hotkey, coldkey) pair.
    Empty,
    Present(Balance),
}

impl StakeRecord {
    pub fn amount(&self) -> Balance {
        match self {
            StakeRecord::Empty => 0,
            StakeRecord::Present(amount) => *amount,
        }
    }
}

/// Extrinsic the controller asks the chain to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StakeCall {
    AddStake { hotkey: String, amount: Balance },
    RemoveStake { hotkey: String, amount: Balance },
}

impl StakeCall {
    /// Build the call for `action`. RemoveMax is a plain remove of the full stake.
    pub fn for_action(action: StakeAction, hotkey: impl Into<String>, amount: Balance) -> Self {
        let hotkey = hotkey.into();
        match action {
            StakeAction::Add => StakeCall::AddStake { hotkey, amount },
            StakeAction::Remove | StakeAction::RemoveMax => StakeCall::RemoveStake { hotkey, amount },
        }
    }

    pub fn hotkey(&self) -> &str {
        match self {
            StakeCall::AddStake { hotkey, .. } | StakeCall::RemoveStake { hotkey, .. } => hotkey,
        }
    }

    pub fn amount(&self) -> Balance {
        match self {
            StakeCall::AddStake { amount, .. } | StakeCall::RemoveStake { amount, .. } => *amount,
        }
    }

    /// Runtime call name.
    pub fn call_name(&self) -> &'static str {
        match self {
            StakeCall::AddStake { .. } => "add_stake",
            StakeCall::RemoveStake { .. } => "remove_stake",
        }
    }
}

/// Transaction submission progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    /// Transaction was broadcast to peers.
    Broadcast,
    /// Transaction was included in a block.
    InBlock { block_hash: [u8; 32] },
    /// Block containing the transaction was finalized.
    Finalized {
        block_hash: [u8; 32],
        dispatch_error: Option<String>,
    },
    /// Transaction was dropped from the pool.
    Dropped(String),
    /// Transaction was invalid.
    Invalid(String),
}

impl TxStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TxStatus::Broadcast => "Broadcast",
            TxStatus::InBlock { .. } => "In Block",
            TxStatus::Finalized { .. } => "Finalized",
            TxStatus::Dropped(_) => "Dropped",
            TxStatus::Invalid(_) => "Invalid",
        }
    }
}

/// Lazy, finite sequence of status updates for one submitted transaction.
pub type TxStatusStream = BoxStream<'static, TxStatus>;

/// Read and write access to the network.
#[async_trait]
pub trait ChainApi: Send + Sync {
    /// Signer type accepted by [`ChainApi::submit`].
    type Signer: Send + Sync;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Free balance of `address` in base units.
    async fn query_balance(&self, address: &str) -> Result<Balance, Self::Error>;

    /// Stake `address` holds on `hotkey`.
    async fn query_stake(&self, hotkey: &str, address: &str) -> Result<StakeRecord, Self::Error>;

    /// Sign and submit `call`. Errors here mean the transaction never left the client.
    async fn submit(
        &self,
        call: &StakeCall,
        signer: &Self::Signer,
    ) -> Result<TxStatusStream, Self::Error>;
}
