//! Controller-owned state and the read-only view handed to the presentation layer.

use crate::chain::TxStatus;
use crate::types::{
    Account, BalanceSnapshot, LoadingState, OperationPhase, SelectedContext, StakeAction,
    StakeSnapshot,
};

/// Everything the presentation layer may render.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StakeView {
    /// Wallet status line ("Account found", "No accounts found.", ...).
    pub status: String,
    pub accounts: Vec<Account>,
    pub selected: Option<Account>,
    pub hotkey: String,
    /// Amount field as typed (or seeded from the balance).
    pub amount: String,
    /// Field-level validation message for `amount`.
    pub amount_error: Option<String>,
    pub balance: Option<BalanceSnapshot>,
    pub stake: StakeSnapshot,
    pub loading: LoadingState,
    pub phase: OperationPhase,
    /// Last status seen for the operation in flight.
    pub progress: Option<TxStatus>,
    /// Last failed query, cleared by the next successful one.
    pub query_error: Option<String>,
}

impl StakeView {
    /// True while any stake operation is in flight.
    pub fn is_busy(&self) -> bool {
        self.loading.is_any()
    }

    /// Whether the button for `action` should be enabled.
    pub fn can_submit(&self, action: StakeAction) -> bool {
        if self.is_busy() || self.context().is_none() {
            return false;
        }
        !action.uses_typed_amount() || !self.amount.trim().is_empty()
    }

    /// The (account, hotkey) pair, once both are set.
    pub fn context(&self) -> Option<SelectedContext> {
        let account = self.selected.clone()?;
        let hotkey = self.hotkey.trim();
        if hotkey.is_empty() {
            return None;
        }
        Some(SelectedContext {
            account,
            hotkey: hotkey.to_string(),
        })
    }
}

/// Orders snapshot writes by issuance rather than completion.
#[derive(Debug, Default)]
pub(crate) struct RequestCounter {
    issued: u64,
    applied: u64,
}

impl RequestCounter {
    /// Ticket for a new request.
    pub(crate) fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Accept `ticket` unless a later-issued response was already applied.
    pub(crate) fn try_apply(&mut self, ticket: u64) -> bool {
        if ticket > self.applied {
            self.applied = ticket;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct WorkflowState {
    pub(crate) view: StakeView,
    /// Set once the user typed a non-empty amount; stops balance seeding.
    pub(crate) amount_entered: bool,
    pub(crate) balance_requests: RequestCounter,
    pub(crate) stake_requests: RequestCounter,
}

impl WorkflowState {
    pub(crate) fn selected_address(&self) -> Option<&str> {
        self.view.selected.as_ref().map(|a| a.address.as_str())
    }
}
