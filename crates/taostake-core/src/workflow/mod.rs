//! Stake workflow controller.
//!
//! [`StakeWorkflow`] owns the selected account, hotkey and amount, keeps the
//! balance and stake snapshots in sync with the chain, and drives each stake
//! operation through `Validating -> Signing -> Submitting ->
//! AwaitingFinalization -> Succeeded | Failed`.
//!
//! The presentation layer never touches this state directly. It renders the
//! [`StakeView`] published on a `watch` channel, listens to [`WorkflowEvent`]s
//! and sends [`Intent`]s back through [`StakeWorkflow::dispatch`].
//!
//! At most one stake operation runs per controller. Reads may overlap; their
//! results are applied in issuance order and dropped if the selection changed
//! while they were in flight.

mod state;

#[cfg(test)]
mod tests;

pub use state::StakeView;

use futures::{FutureExt, StreamExt};
use std::panic::AssertUnwindSafe;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, SystemTime};
use tokio::sync::{mpsc, watch};

use crate::amount::{TokenUnits, format_amount, parse_amount};
use crate::chain::{ChainApi, StakeCall, TxStatus, TxStatusStream};
use crate::config::{AppConfig, ConfigError};
use crate::error::StakeError;
use crate::types::{
    Account, Balance, BalanceSnapshot, OperationPhase, StakeAction, StakeIntent, StakeSnapshot,
};
use crate::wallet::WalletConnector;
use state::WorkflowState;

/// Tunables for a controller instance.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    /// Name presented to signing providers.
    pub app_name: String,
    pub units: TokenUnits,
    /// Smallest add/remove amount, in base units.
    pub min_stake: Balance,
    /// Bound on submission plus finalization.
    pub finalization_timeout: Duration,
    /// Hotkey pre-filled at startup.
    pub default_hotkey: Option<String>,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        let units = TokenUnits::tao();
        Self {
            app_name: "taostake".to_string(),
            min_stake: units.one(),
            units,
            finalization_timeout: Duration::from_secs(300),
            default_hotkey: None,
        }
    }
}

impl WorkflowSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            app_name: config.app_name.clone(),
            units: config.units(),
            min_stake: config.min_stake_base()?,
            finalization_timeout: config.finalization_timeout(),
            default_hotkey: config.default_hotkey.clone(),
        })
    }
}

/// User intents forwarded by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    SelectAccount(String),
    SetHotkey(String),
    SetAmount(String),
    Refresh,
    Submit(StakeAction),
}

/// Which snapshot a failed query was refreshing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Balance,
    Stake,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationLevel {
    pub fn label(&self) -> &'static str {
        match self {
            NotificationLevel::Info => "info",
            NotificationLevel::Success => "success",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Error => "error",
        }
    }
}

/// Human-readable message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Events emitted while the controller works.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    Phase {
        action: StakeAction,
        phase: OperationPhase,
    },
    Progress {
        action: StakeAction,
        status: TxStatus,
    },
    QueryFailed {
        kind: QueryKind,
        error: StakeError,
    },
    Notify(Notification),
}

/// A finalized, successful stake operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeOutcome {
    pub action: StakeAction,
    /// Base units carried by the submitted call.
    pub amount: Balance,
    pub block_hash: [u8; 32],
}

/// Work captured under the state lock before any I/O starts.
struct Prepared {
    account: Account,
    call: StakeCall,
}

/// Stake workflow controller.
pub struct StakeWorkflow<W, C> {
    wallet: W,
    chain: C,
    settings: WorkflowSettings,
    state: Mutex<WorkflowState>,
    view_tx: watch::Sender<StakeView>,
    events: mpsc::UnboundedSender<WorkflowEvent>,
}

impl<W, C> StakeWorkflow<W, C> {
    pub fn new(
        wallet: W,
        chain: C,
        settings: WorkflowSettings,
        events: mpsc::UnboundedSender<WorkflowEvent>,
    ) -> Self {
        let mut state = WorkflowState::default();
        state.view.status = "Loading...".to_string();
        state.view.hotkey = settings.default_hotkey.clone().unwrap_or_default();
        let (view_tx, _) = watch::channel(state.view.clone());

        Self {
            wallet,
            chain,
            settings,
            state: Mutex::new(state),
            view_tx,
            events,
        }
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// The chain backend, for reads outside the workflow (block height, chain info).
    pub fn chain(&self) -> &C {
        &self.chain
    }

    /// Receiver that observes every published view.
    pub fn subscribe(&self) -> watch::Receiver<StakeView> {
        self.view_tx.subscribe()
    }

    /// Current view.
    pub fn view(&self) -> StakeView {
        self.read(|state| state.view.clone())
    }

    /// Set the validator hotkey. Resets the stake snapshot when the hotkey changes.
    pub fn set_hotkey(&self, value: impl Into<String>) {
        let value = value.into();
        self.update(|state| {
            if state.view.hotkey.trim() != value.trim() {
                state.view.stake = StakeSnapshot::default();
            }
            state.view.hotkey = value;
        });
    }

    /// Set the amount field as typed by the user.
    pub fn set_amount(&self, value: impl Into<String>) {
        let value = value.into();
        self.update(|state| {
            state.amount_entered = !value.trim().is_empty();
            state.view.amount = value;
            state.view.amount_error = None;
        });
    }

    /// Validate `input` against the minimum stake, recording the field error.
    pub fn validate_amount(&self, input: &str) -> bool {
        let result = check_amount(&self.settings, input);
        self.update(|state| state.view.amount_error = result.as_ref().err().cloned());
        result.is_ok()
    }

    fn update<R>(&self, f: impl FnOnce(&mut WorkflowState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let result = f(&mut state);
        self.view_tx.send_replace(state.view.clone());
        result
    }

    fn read<R>(&self, f: impl FnOnce(&WorkflowState) -> R) -> R {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    fn emit(&self, event: WorkflowEvent) {
        // A presentation layer that stopped listening is not an error.
        let _ = self.events.send(event);
    }

    fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        self.emit(WorkflowEvent::Notify(Notification {
            level,
            message: message.into(),
        }));
    }

    fn set_phase(&self, action: StakeAction, phase: OperationPhase) {
        tracing::debug!("{:?} -> {}", action, phase.label());
        self.update(|state| state.view.phase = phase);
        self.emit(WorkflowEvent::Phase { action, phase });
    }
}

impl<W, C> StakeWorkflow<W, C>
where
    W: WalletConnector,
    C: ChainApi<Signer = W::Signer>,
{
    /// Enable the signing providers, load their accounts and select the first one.
    pub async fn initialize(&self) -> Result<usize, StakeError> {
        let app_name = &self.settings.app_name;
        let result = async {
            let providers = self.wallet.enable(app_name).await?;
            tracing::info!("{} signing provider(s) enabled for {}", providers, app_name);
            self.wallet.list_accounts().await
        }
        .await;

        let accounts = match result {
            Ok(accounts) => accounts,
            Err(e) => {
                tracing::error!("Failed to initialize wallet: {}", e);
                self.update(|state| state.view.status = "Failed to initialize wallet.".to_string());
                self.notify(
                    NotificationLevel::Error,
                    "Failed to initialize wallet. Please check your extension.",
                );
                return Err(e.into());
            }
        };

        let count = accounts.len();
        let first = accounts.first().map(|a| a.address.clone());
        tracing::info!("Found {} account(s)", count);
        self.update(|state| {
            state.view.accounts = accounts;
            state.view.status = if first.is_some() {
                "Account found".to_string()
            } else {
                "No accounts found.".to_string()
            };
        });

        if let Some(address) = first {
            self.select_account(&address).await;
        }
        Ok(count)
    }

    /// Select one of the known accounts and refresh its snapshots.
    /// Unknown addresses are ignored.
    pub async fn select_account(&self, address: &str) {
        let known = self.update(|state| {
            let account = state
                .view
                .accounts
                .iter()
                .find(|a| a.address == address)
                .cloned()?;
            if state.selected_address() != Some(address) {
                state.view.balance = None;
                state.view.stake = StakeSnapshot::default();
            }
            state.view.selected = Some(account);
            Some(())
        });

        if known.is_none() {
            tracing::debug!("Ignoring selection of unknown address {}", address);
            return;
        }

        tracing::info!("Selected account {}", address);
        self.refresh_balance().await;
        self.refresh_stake().await;
    }

    /// Re-read the free balance of the selected account.
    ///
    /// Seeds the amount field with the full balance until the user types one.
    /// Failures keep the previous snapshot and are reported, never returned.
    pub async fn refresh_balance(&self) {
        let issued = self.update(|state| {
            let address = state.selected_address()?.to_string();
            Some((address, state.balance_requests.issue()))
        });
        let Some((address, ticket)) = issued else {
            tracing::debug!("No account selected, skipping balance refresh");
            return;
        };

        match self.chain.query_balance(&address).await {
            Ok(free) => {
                let units = &self.settings.units;
                let applied = self.update(|state| {
                    if state.selected_address() != Some(address.as_str())
                        || !state.balance_requests.try_apply(ticket)
                    {
                        return false;
                    }
                    state.view.balance = Some(BalanceSnapshot {
                        free,
                        as_of: SystemTime::now(),
                    });
                    state.view.query_error = None;
                    if !state.amount_entered {
                        state.view.amount = format_amount(free, units);
                    }
                    true
                });
                if applied {
                    tracing::info!(
                        "Balance of {}: {} {}",
                        address,
                        format_amount(free, units),
                        units.symbol
                    );
                } else {
                    tracing::debug!("Discarding stale balance response #{}", ticket);
                }
            }
            Err(e) => {
                tracing::warn!("Error fetching balance of {}: {}", address, e);
                self.report_query_failure(QueryKind::Balance, ticket, e.to_string(), |state| {
                    state.selected_address() == Some(address.as_str())
                        && state.balance_requests.try_apply(ticket)
                });
            }
        }
    }

    /// Re-read the stake of the selected account on the selected hotkey.
    /// No-op until both are set.
    pub async fn refresh_stake(&self) {
        let issued = self.update(|state| {
            let ctx = state.view.context()?;
            Some((ctx.account.address, ctx.hotkey, state.stake_requests.issue()))
        });
        let Some((address, hotkey, ticket)) = issued else {
            tracing::debug!("Account or hotkey missing, skipping stake refresh");
            return;
        };

        match self.chain.query_stake(&hotkey, &address).await {
            Ok(record) => {
                let applied = self.update(|state| {
                    if !same_pair(state, &address, &hotkey) || !state.stake_requests.try_apply(ticket) {
                        return false;
                    }
                    state.view.stake = StakeSnapshot {
                        current: record.amount(),
                    };
                    state.view.query_error = None;
                    true
                });
                if applied {
                    tracing::info!(
                        "Stake of {} on {}: {} {}",
                        address,
                        hotkey,
                        format_amount(record.amount(), &self.settings.units),
                        self.settings.units.symbol
                    );
                } else {
                    tracing::debug!("Discarding stale stake response #{}", ticket);
                }
            }
            Err(e) => {
                tracing::warn!("Error fetching stake of {} on {}: {}", address, hotkey, e);
                self.report_query_failure(QueryKind::Stake, ticket, e.to_string(), |state| {
                    same_pair(state, &address, &hotkey) && state.stake_requests.try_apply(ticket)
                });
            }
        }
    }

    /// Report a failed read, unless `is_current` says a later-issued response
    /// (or a selection change) already superseded it. A reported failure
    /// consumes its ticket like a success would.
    fn report_query_failure(
        &self,
        kind: QueryKind,
        ticket: u64,
        message: String,
        is_current: impl FnOnce(&mut WorkflowState) -> bool,
    ) {
        let user_message = match kind {
            QueryKind::Balance => "Failed to fetch account balance.",
            QueryKind::Stake => "Failed to fetch current stake amount.",
        };
        let reported = self.update(|state| {
            if !is_current(state) {
                return false;
            }
            state.view.query_error = Some(format!("{} {}", user_message, message));
            true
        });
        if !reported {
            tracing::debug!("Discarding stale {:?} failure #{}", kind, ticket);
            return;
        }
        self.emit(WorkflowEvent::QueryFailed {
            kind,
            error: StakeError::Query(message),
        });
        self.notify(NotificationLevel::Error, user_message);
    }

    /// Validate, sign, submit and follow one stake adjustment to finalization.
    ///
    /// On success both snapshots are re-read from the chain; on failure they
    /// are left untouched. The loading flag for the action is cleared on every
    /// exit path.
    pub async fn submit_stake_action(&self, intent: StakeIntent) -> Result<StakeOutcome, StakeError> {
        let action = intent.action;
        let prepared = match self.update(|state| prepare(&self.settings, state, &intent)) {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::warn!("Rejected {:?}: {}", action, e);
                let level = match e {
                    StakeError::ConcurrentOperation => NotificationLevel::Warning,
                    _ => NotificationLevel::Error,
                };
                self.notify(level, e.to_string());
                return Err(e);
            }
        };

        let guard = InFlight::new(self, action);
        tracing::info!(
            "Submitting {} of {} {} to {} from {}",
            prepared.call.call_name(),
            format_amount(prepared.call.amount(), &self.settings.units),
            self.settings.units.symbol,
            prepared.call.hotkey(),
            prepared.account.address
        );
        self.emit(WorkflowEvent::Phase {
            action,
            phase: OperationPhase::Validating,
        });

        let result = AssertUnwindSafe(self.execute(action, &prepared))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(StakeError::Dispatch("Unexpected failure during submission".to_string())));

        match result {
            Ok(block_hash) => {
                guard.finish(OperationPhase::Succeeded);
                tracing::info!(
                    "Stake {} successfully in block 0x{}",
                    action.past_tense(),
                    hex::encode(block_hash)
                );
                self.notify(
                    NotificationLevel::Success,
                    format!("Stake {} successfully!", action.past_tense()),
                );
                self.refresh_balance().await;
                self.refresh_stake().await;
                self.update(|state| state.view.phase = OperationPhase::Idle);
                Ok(StakeOutcome {
                    action,
                    amount: prepared.call.amount(),
                    block_hash,
                })
            }
            Err(e) => {
                guard.finish(OperationPhase::Failed);
                tracing::error!("Failed to {} stake: {}", action.verb(), e);
                self.notify(
                    NotificationLevel::Error,
                    format!("Failed to {} stake. {}", action.verb(), e),
                );
                self.update(|state| state.view.phase = OperationPhase::Idle);
                Err(e)
            }
        }
    }

    async fn execute(&self, action: StakeAction, prepared: &Prepared) -> Result<[u8; 32], StakeError> {
        self.set_phase(action, OperationPhase::Signing);
        let signer = self
            .wallet
            .signer(&prepared.account.address)
            .await
            .map_err(|e| StakeError::Signing(e.to_string()))?;

        self.set_phase(action, OperationPhase::Submitting);
        let timeout = self.settings.finalization_timeout;
        let mut statuses = match tokio::time::timeout(timeout, self.chain.submit(&prepared.call, &signer)).await {
            Ok(Ok(statuses)) => statuses,
            Ok(Err(e)) => return Err(StakeError::Submission(e.to_string())),
            Err(_) => return Err(StakeError::FinalizationTimeout(timeout)),
        };

        self.set_phase(action, OperationPhase::AwaitingFinalization);
        tokio::time::timeout(timeout, self.await_finalization(action, &mut statuses))
            .await
            .unwrap_or(Err(StakeError::FinalizationTimeout(timeout)))
    }

    async fn await_finalization(
        &self,
        action: StakeAction,
        statuses: &mut TxStatusStream,
    ) -> Result<[u8; 32], StakeError> {
        while let Some(status) = statuses.next().await {
            tracing::info!("Transaction status: {}", status.label());
            self.update(|state| state.view.progress = Some(status.clone()));
            self.emit(WorkflowEvent::Progress {
                action,
                status: status.clone(),
            });

            match status {
                TxStatus::Broadcast | TxStatus::InBlock { .. } => {}
                TxStatus::Finalized {
                    block_hash,
                    dispatch_error: None,
                } => return Ok(block_hash),
                TxStatus::Finalized {
                    dispatch_error: Some(message),
                    ..
                } => return Err(StakeError::Dispatch(message)),
                TxStatus::Dropped(message) | TxStatus::Invalid(message) => {
                    return Err(StakeError::Dispatch(message));
                }
            }
        }
        Err(StakeError::Dispatch(
            "Status stream ended before finalization".to_string(),
        ))
    }

    /// Apply a presentation intent.
    pub async fn dispatch(&self, intent: Intent) -> Result<(), StakeError> {
        match intent {
            Intent::SelectAccount(address) => self.select_account(&address).await,
            Intent::SetHotkey(hotkey) => {
                self.set_hotkey(hotkey);
                self.refresh_stake().await;
            }
            Intent::SetAmount(amount) => self.set_amount(amount),
            Intent::Refresh => {
                self.refresh_balance().await;
                self.refresh_stake().await;
            }
            Intent::Submit(action) => {
                let amount = self.read(|state| state.view.amount.clone());
                self.submit_stake_action(StakeIntent::new(action, amount)).await?;
            }
        }
        Ok(())
    }
}

/// Check preconditions and claim the in-flight slot, all under one lock.
fn prepare(
    settings: &WorkflowSettings,
    state: &mut WorkflowState,
    intent: &StakeIntent,
) -> Result<Prepared, StakeError> {
    let Some(account) = state.view.selected.clone() else {
        return Err(StakeError::Validation("Select an account first".to_string()));
    };
    let hotkey = state.view.hotkey.trim().to_string();
    if hotkey.is_empty() {
        return Err(StakeError::Validation("Enter a validator hotkey".to_string()));
    }

    let amount = if intent.action.uses_typed_amount() {
        match check_amount(settings, &intent.amount) {
            Ok(amount) => {
                state.view.amount_error = None;
                amount
            }
            Err(message) => {
                state.view.amount_error = Some(message.clone());
                return Err(StakeError::Validation(message));
            }
        }
    } else {
        // RemoveMax withdraws the queried stake, whatever the amount field says.
        match state.view.stake.current {
            0 => return Err(StakeError::Validation("No stake to remove".to_string())),
            current => current,
        }
    };

    if state.view.loading.is_any() {
        return Err(StakeError::ConcurrentOperation);
    }
    state.view.loading.set(intent.action, true);
    state.view.phase = OperationPhase::Validating;
    state.view.progress = None;

    Ok(Prepared {
        account,
        call: StakeCall::for_action(intent.action, hotkey, amount),
    })
}

fn check_amount(settings: &WorkflowSettings, input: &str) -> Result<Balance, String> {
    let amount = parse_amount(input, &settings.units).map_err(|e| e.to_string())?;
    if amount < settings.min_stake {
        return Err(format!(
            "Minimum stake amount is {} {}",
            format_amount(settings.min_stake, &settings.units),
            settings.units.symbol
        ));
    }
    Ok(amount)
}

/// Whether the selection still matches the pair a stake read was issued for.
fn same_pair(state: &WorkflowState, address: &str, hotkey: &str) -> bool {
    state
        .view
        .context()
        .is_some_and(|ctx| ctx.account.address == address && ctx.hotkey == hotkey)
}

/// Clears the loading flag of an operation however it exits.
struct InFlight<'a, W, C> {
    workflow: &'a StakeWorkflow<W, C>,
    action: StakeAction,
    armed: bool,
}

impl<'a, W, C> InFlight<'a, W, C> {
    fn new(workflow: &'a StakeWorkflow<W, C>, action: StakeAction) -> Self {
        Self {
            workflow,
            action,
            armed: true,
        }
    }

    /// Record the terminal phase and release the flag.
    fn finish(mut self, phase: OperationPhase) {
        self.release(phase);
    }

    fn release(&mut self, phase: OperationPhase) {
        if !self.armed {
            return;
        }
        self.armed = false;
        let action = self.action;
        self.workflow.update(|state| {
            state.view.loading.set(action, false);
            state.view.phase = phase;
        });
        self.workflow.emit(WorkflowEvent::Phase { action, phase });
    }
}

impl<W, C> Drop for InFlight<'_, W, C> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("{:?} operation abandoned before completion", self.action);
            self.release(OperationPhase::Failed);
            self.workflow.update(|state| state.view.phase = OperationPhase::Idle);
        }
    }
}
