//! Plain-text rendering of the workflow view and events.

use taostake_core::{
    Account, StakeView, TokenUnits, WorkflowEvent, format_amount, format_amount_truncated,
};

/// Fraction digits shown for balances.
const DISPLAY_DIGITS: u8 = 4;

/// One line for an event, or `None` if it is not worth printing.
pub fn render_event(event: &WorkflowEvent) -> Option<String> {
    match event {
        WorkflowEvent::Phase { action, phase } => {
            Some(format!("[{}] {}", action.label(), phase.label()))
        }
        WorkflowEvent::Progress { action, status } => {
            Some(format!("[{}] Transaction {}", action.label(), status.label()))
        }
        WorkflowEvent::Notify(note) => Some(format!("{}: {}", note.level.label(), note.message)),
        // Followed by a notification carrying the user-facing message
        WorkflowEvent::QueryFailed { .. } => None,
    }
}

pub fn render_view(view: &StakeView, units: &TokenUnits) -> String {
    let account = view
        .selected
        .as_ref()
        .map(|a| format!("{} ({})", a.label(), a.address))
        .unwrap_or_else(|| "(none)".to_string());
    let hotkey = if view.hotkey.trim().is_empty() {
        "(none)"
    } else {
        view.hotkey.trim()
    };
    let balance = view
        .balance
        .map(|b| {
            format!(
                "{} {}",
                format_amount_truncated(b.free, units, DISPLAY_DIGITS),
                units.symbol
            )
        })
        .unwrap_or_else(|| "unknown".to_string());
    let stake = format!("{} {}", format_amount(view.stake.current, units), units.symbol);

    let mut lines = vec![
        format!("Status:    {}", view.status),
        format!("Account:   {}", account),
        format!("Validator: {}", hotkey),
        format!("Balance:   {}", balance),
        format!("Stake:     {}", stake),
    ];
    if let Some(error) = &view.query_error {
        lines.push(format!("Warning:   {}", error));
    }
    lines.join("\n")
}

/// Numbered account list, marking the selected one.
pub fn render_accounts(accounts: &[Account], selected: Option<&Account>) -> String {
    accounts
        .iter()
        .enumerate()
        .map(|(i, account)| {
            let marker = if Some(account) == selected { '*' } else { ' ' };
            format!(
                "{} {}. {} {} [{}]",
                marker,
                i + 1,
                account.label(),
                account.address,
                account.source
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_block(number: u32, hash_hex: &str) -> String {
    format!("Block:     #{} (0x{})", number, hash_hex)
}
