use super::*;
use crate::chain::StakeRecord;
use crate::error::WalletError;
use crate::types::LoadingState;
use async_trait::async_trait;
use futures::stream;
use pretty_assertions::assert_eq;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::oneshot;

const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
const BOB: &str = "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty";
const HOTKEY: &str = "5FLSigC9HGRKVhB9FiEo4Y3koPsNmBmLJbpXg2mp1hXcS59Y";
const TAO: Balance = 1_000_000_000;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct MockError(String);

#[derive(Default)]
struct MockWallet {
    accounts: Vec<Account>,
    no_provider: bool,
    reject_signing: bool,
    panic_on_sign: bool,
}

#[async_trait]
impl WalletConnector for MockWallet {
    type Signer = String;

    async fn enable(&self, _app_name: &str) -> Result<usize, WalletError> {
        if self.no_provider {
            Err(WalletError::NoProviderAvailable)
        } else {
            Ok(1)
        }
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, WalletError> {
        Ok(self.accounts.clone())
    }

    async fn signer(&self, address: &str) -> Result<String, WalletError> {
        if self.panic_on_sign {
            panic!("extension crashed");
        }
        if self.reject_signing {
            return Err(WalletError::Rejected("User cancelled".to_string()));
        }
        self.accounts
            .iter()
            .find(|a| a.address == address)
            .map(|a| a.address.clone())
            .ok_or_else(|| WalletError::UnknownAddress(address.to_string()))
    }
}

enum Reply<T> {
    Ready(Result<T, String>),
    Gated(oneshot::Receiver<Result<T, String>>),
}

impl<T> Reply<T> {
    async fn resolve(self) -> Result<T, MockError> {
        let result = match self {
            Reply::Ready(result) => result,
            Reply::Gated(rx) => rx.await.map_err(|_| MockError("gate dropped".into()))?,
        };
        result.map_err(MockError)
    }
}

enum Submission {
    Statuses(Vec<TxStatus>),
    Gated(Vec<TxStatus>, oneshot::Receiver<Vec<TxStatus>>),
    Fail(String),
    Hang,
}

#[derive(Default)]
struct MockChain {
    default_balance: Balance,
    default_stake: Balance,
    balances: Mutex<VecDeque<Reply<Balance>>>,
    stakes: Mutex<VecDeque<Reply<StakeRecord>>>,
    submissions: Mutex<VecDeque<Submission>>,
    submitted: Mutex<Vec<(StakeCall, String)>>,
    balance_queries: AtomicUsize,
    stake_queries: AtomicUsize,
}

impl MockChain {
    fn with_funds(balance: Balance, stake: Balance) -> Self {
        Self {
            default_balance: balance,
            default_stake: stake,
            ..Self::default()
        }
    }

    fn push_balance(&self, reply: Reply<Balance>) {
        self.balances.lock().unwrap().push_back(reply);
    }

    fn push_stake(&self, reply: Reply<StakeRecord>) {
        self.stakes.lock().unwrap().push_back(reply);
    }

    fn push_submission(&self, submission: Submission) {
        self.submissions.lock().unwrap().push_back(submission);
    }

    fn submitted(&self) -> Vec<(StakeCall, String)> {
        self.submitted.lock().unwrap().clone()
    }

    fn balance_queries(&self) -> usize {
        self.balance_queries.load(Ordering::SeqCst)
    }

    fn stake_queries(&self) -> usize {
        self.stake_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainApi for MockChain {
    type Signer = String;
    type Error = MockError;

    async fn query_balance(&self, _address: &str) -> Result<Balance, MockError> {
        self.balance_queries.fetch_add(1, Ordering::SeqCst);
        let reply = self.balances.lock().unwrap().pop_front();
        match reply {
            Some(reply) => reply.resolve().await,
            None => Ok(self.default_balance),
        }
    }

    async fn query_stake(&self, _hotkey: &str, _address: &str) -> Result<StakeRecord, MockError> {
        self.stake_queries.fetch_add(1, Ordering::SeqCst);
        let reply = self.stakes.lock().unwrap().pop_front();
        match reply {
            Some(reply) => reply.resolve().await,
            None if self.default_stake == 0 => Ok(StakeRecord::Empty),
            None => Ok(StakeRecord::Present(self.default_stake)),
        }
    }

    async fn submit(&self, call: &StakeCall, signer: &String) -> Result<TxStatusStream, MockError> {
        self.submitted
            .lock()
            .unwrap()
            .push((call.clone(), signer.clone()));
        let next = self.submissions.lock().unwrap().pop_front();
        match next.unwrap_or_else(|| Submission::Statuses(vec![TxStatus::Broadcast, finalized_ok()])) {
            Submission::Statuses(statuses) => Ok(stream::iter(statuses).boxed()),
            Submission::Gated(first, rx) => Ok(stream::iter(first)
                .chain(stream::once(async move { rx.await.unwrap_or_default() }).flat_map(stream::iter))
                .boxed()),
            Submission::Fail(message) => Err(MockError(message)),
            Submission::Hang => Ok(stream::pending().boxed()),
        }
    }
}

fn account(address: &str, name: &str) -> Account {
    Account {
        address: address.to_string(),
        display_name: Some(name.to_string()),
        source: "polkadot-js".to_string(),
    }
}

fn two_accounts() -> MockWallet {
    MockWallet {
        accounts: vec![account(ALICE, "alice"), account(BOB, "bob")],
        ..MockWallet::default()
    }
}

fn settings() -> WorkflowSettings {
    WorkflowSettings {
        default_hotkey: Some(HOTKEY.to_string()),
        ..WorkflowSettings::default()
    }
}

fn finalized_ok() -> TxStatus {
    TxStatus::Finalized {
        block_hash: [0xAB; 32],
        dispatch_error: None,
    }
}

type TestWorkflow = StakeWorkflow<MockWallet, MockChain>;

fn setup_with(
    wallet: MockWallet,
    chain: MockChain,
    settings: WorkflowSettings,
) -> (TestWorkflow, mpsc::UnboundedReceiver<WorkflowEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (StakeWorkflow::new(wallet, chain, settings, tx), rx)
}

/// Initialized workflow: Alice selected, 25.5 TAO free, 3 TAO staked.
async fn ready() -> (TestWorkflow, mpsc::UnboundedReceiver<WorkflowEvent>) {
    let (wf, mut rx) = setup_with(
        two_accounts(),
        MockChain::with_funds(25 * TAO + TAO / 2, 3 * TAO),
        settings(),
    );
    wf.initialize().await.unwrap();
    drain(&mut rx);
    (wf, rx)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<WorkflowEvent>) -> Vec<WorkflowEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn phases(events: &[WorkflowEvent]) -> Vec<OperationPhase> {
    events
        .iter()
        .filter_map(|e| match e {
            WorkflowEvent::Phase { phase, .. } => Some(*phase),
            _ => None,
        })
        .collect()
}

fn notifications(events: &[WorkflowEvent]) -> Vec<Notification> {
    events
        .iter()
        .filter_map(|e| match e {
            WorkflowEvent::Notify(n) => Some(n.clone()),
            _ => None,
        })
        .collect()
}

// ==================== Initialization & selection ====================

#[tokio::test]
async fn test_initialize_selects_first_account() {
    let (wf, _rx) = ready().await;
    let view = wf.view();

    assert_eq!(view.status, "Account found");
    assert_eq!(view.accounts.len(), 2);
    assert_eq!(view.selected.as_ref().map(|a| a.address.as_str()), Some(ALICE));
    assert_eq!(view.hotkey, HOTKEY);
    assert_eq!(view.balance.map(|b| b.free), Some(25 * TAO + TAO / 2));
    assert_eq!(view.stake.current, 3 * TAO);
    assert_eq!(view.amount, "25.5");
    assert!(!view.is_busy());
}

#[tokio::test]
async fn test_initialize_without_provider() {
    let wallet = MockWallet {
        no_provider: true,
        ..two_accounts()
    };
    let (wf, mut rx) = setup_with(wallet, MockChain::default(), settings());

    assert_eq!(wf.initialize().await, Err(StakeError::NoProviderAvailable));
    assert_eq!(wf.view().status, "Failed to initialize wallet.");
    assert!(wf.view().accounts.is_empty());

    let notes = notifications(&drain(&mut rx));
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, NotificationLevel::Error);
}

#[tokio::test]
async fn test_initialize_with_no_accounts() {
    let (wf, _rx) = setup_with(MockWallet::default(), MockChain::default(), settings());

    assert_eq!(wf.initialize().await, Ok(0));
    let view = wf.view();
    assert_eq!(view.status, "No accounts found.");
    assert!(view.selected.is_none());
    assert_eq!(wf.chain.balance_queries(), 0);
}

#[tokio::test]
async fn test_select_unknown_account_is_noop() {
    let (wf, _rx) = ready().await;
    let queries = wf.chain.balance_queries();

    wf.select_account("5UnknownAddress").await;

    assert_eq!(wf.view().selected.map(|a| a.address), Some(ALICE.to_string()));
    assert_eq!(wf.chain.balance_queries(), queries);
}

#[tokio::test]
async fn test_select_other_account_refreshes_both_snapshots() {
    let (wf, _rx) = ready().await;
    let (balances, stakes) = (wf.chain.balance_queries(), wf.chain.stake_queries());

    wf.dispatch(Intent::SelectAccount(BOB.to_string())).await.unwrap();

    assert_eq!(wf.view().selected.map(|a| a.address), Some(BOB.to_string()));
    assert_eq!(wf.chain.balance_queries(), balances + 1);
    assert_eq!(wf.chain.stake_queries(), stakes + 1);
}

#[tokio::test]
async fn test_stake_refresh_needs_hotkey() {
    let (wf, _rx) = setup_with(
        two_accounts(),
        MockChain::with_funds(5 * TAO, TAO),
        WorkflowSettings::default(),
    );
    wf.initialize().await.unwrap();

    assert_eq!(wf.chain.balance_queries(), 1);
    assert_eq!(wf.chain.stake_queries(), 0);
    assert_eq!(wf.view().stake.current, 0);

    wf.dispatch(Intent::SetHotkey(HOTKEY.to_string())).await.unwrap();
    assert_eq!(wf.chain.stake_queries(), 1);
    assert_eq!(wf.view().stake.current, TAO);
}

#[tokio::test]
async fn test_set_hotkey_is_pure_and_resets_stake() {
    let (wf, _rx) = ready().await;
    let queries = wf.chain.stake_queries();

    wf.set_hotkey("5OtherValidator");

    assert_eq!(wf.chain.stake_queries(), queries);
    assert_eq!(wf.view().stake.current, 0);
    assert_eq!(wf.view().hotkey, "5OtherValidator");
}

// ==================== Refresh ====================

#[tokio::test]
async fn test_balance_failure_keeps_last_known_good() {
    let (wf, mut rx) = ready().await;
    let before = wf.view().balance;
    wf.chain.push_balance(Reply::Ready(Err("rpc unavailable".into())));

    wf.refresh_balance().await;

    let view = wf.view();
    assert_eq!(view.balance, before);
    assert!(view.query_error.unwrap().contains("rpc unavailable"));

    let events = drain(&mut rx);
    assert!(events.contains(&WorkflowEvent::QueryFailed {
        kind: QueryKind::Balance,
        error: StakeError::Query("rpc unavailable".to_string()),
    }));
    assert_eq!(notifications(&events)[0].message, "Failed to fetch account balance.");
}

#[tokio::test]
async fn test_amount_seeding_stops_once_typed() {
    let (wf, _rx) = ready().await;
    assert_eq!(wf.view().amount, "25.5");

    wf.set_amount("4");
    wf.chain.push_balance(Reply::Ready(Ok(30 * TAO)));
    wf.refresh_balance().await;
    assert_eq!(wf.view().amount, "4");
    assert_eq!(wf.view().balance.map(|b| b.free), Some(30 * TAO));

    wf.set_amount("");
    wf.refresh_balance().await;
    assert_eq!(wf.view().amount, "25.5");
}

#[tokio::test]
async fn test_overlapping_balance_refreshes_apply_in_issue_order() {
    let (wf, _rx) = ready().await;
    let (first_tx, first_rx) = oneshot::channel();
    let (second_tx, second_rx) = oneshot::channel();
    wf.chain.push_balance(Reply::Gated(first_rx));
    wf.chain.push_balance(Reply::Gated(second_rx));

    tokio::join!(wf.refresh_balance(), wf.refresh_balance(), async move {
        second_tx.send(Ok(2 * TAO)).unwrap();
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        first_tx.send(Ok(TAO)).unwrap();
    });

    assert_eq!(wf.view().balance.map(|b| b.free), Some(2 * TAO));
    assert_eq!(wf.view().amount, "2");
}

#[tokio::test]
async fn test_late_balance_for_previous_account_is_discarded() {
    let (wf, _rx) = ready().await;
    let (alice_tx, alice_rx) = oneshot::channel();
    wf.chain.push_balance(Reply::Gated(alice_rx));
    let wf = &wf;

    tokio::join!(wf.refresh_balance(), async move {
        wf.select_account(BOB).await;
        alice_tx.send(Ok(99 * TAO)).unwrap();
    });

    let view = wf.view();
    assert_eq!(view.selected.map(|a| a.address), Some(BOB.to_string()));
    assert_eq!(view.balance.map(|b| b.free), Some(25 * TAO + TAO / 2));
}

#[tokio::test]
async fn test_superseded_balance_failure_is_not_reported() {
    let (wf, mut rx) = ready().await;
    let (first_tx, first_rx) = oneshot::channel();
    let (second_tx, second_rx) = oneshot::channel();
    wf.chain.push_balance(Reply::Gated(first_rx));
    wf.chain.push_balance(Reply::Gated(second_rx));

    tokio::join!(wf.refresh_balance(), wf.refresh_balance(), async move {
        second_tx.send(Ok(2 * TAO)).unwrap();
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        first_tx.send(Err("timeout".to_string())).unwrap();
    });

    let view = wf.view();
    assert_eq!(view.balance.map(|b| b.free), Some(2 * TAO));
    assert_eq!(view.query_error, None);

    let events = drain(&mut rx);
    assert!(notifications(&events).is_empty());
    assert!(!events.iter().any(|e| matches!(e, WorkflowEvent::QueryFailed { .. })));
}

#[tokio::test]
async fn test_stake_failure_is_reported() {
    let (wf, mut rx) = ready().await;
    wf.chain.push_stake(Reply::Ready(Err("state pruned".into())));

    wf.refresh_stake().await;

    let view = wf.view();
    assert_eq!(view.stake.current, 3 * TAO);
    assert_eq!(
        view.query_error.as_deref(),
        Some("Failed to fetch current stake amount. state pruned")
    );
    let events = drain(&mut rx);
    assert!(events.contains(&WorkflowEvent::QueryFailed {
        kind: QueryKind::Stake,
        error: StakeError::Query("state pruned".to_string()),
    }));
}

#[tokio::test]
async fn test_overlapping_stake_refreshes_apply_in_issue_order() {
    let (wf, _rx) = ready().await;
    let (first_tx, first_rx) = oneshot::channel();
    let (second_tx, second_rx) = oneshot::channel();
    wf.chain.push_stake(Reply::Gated(first_rx));
    wf.chain.push_stake(Reply::Gated(second_rx));

    tokio::join!(wf.refresh_stake(), wf.refresh_stake(), async move {
        second_tx.send(Ok(StakeRecord::Present(7 * TAO))).unwrap();
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        first_tx.send(Ok(StakeRecord::Present(TAO))).unwrap();
    });

    assert_eq!(wf.view().stake.current, 7 * TAO);
}

#[tokio::test]
async fn test_late_stake_for_previous_hotkey_is_discarded() {
    let (wf, _rx) = ready().await;
    let (old_tx, old_rx) = oneshot::channel();
    wf.chain.push_stake(Reply::Gated(old_rx));
    let wf = &wf;

    tokio::join!(wf.refresh_stake(), async move {
        wf.set_hotkey("5OtherValidator");
        old_tx.send(Ok(StakeRecord::Present(99 * TAO))).unwrap();
    });

    let view = wf.view();
    assert_eq!(view.hotkey, "5OtherValidator");
    assert_eq!(view.stake.current, 0);
}

#[tokio::test]
async fn test_late_stake_for_previous_account_is_discarded() {
    let (wf, _rx) = ready().await;
    let (alice_tx, alice_rx) = oneshot::channel();
    wf.chain.push_stake(Reply::Gated(alice_rx));
    let wf = &wf;

    tokio::join!(wf.refresh_stake(), async move {
        wf.select_account(BOB).await;
        alice_tx.send(Err("timeout".to_string())).unwrap();
    });

    let view = wf.view();
    assert_eq!(view.selected.map(|a| a.address), Some(BOB.to_string()));
    assert_eq!(view.stake.current, 3 * TAO);
    assert_eq!(view.query_error, None);
}

// ==================== Validation ====================

#[tokio::test]
async fn test_validate_amount() {
    let (wf, _rx) = ready().await;

    assert!(!wf.validate_amount("0.5"));
    assert_eq!(
        wf.view().amount_error.as_deref(),
        Some("Minimum stake amount is 1 TAO")
    );
    assert!(!wf.validate_amount("abc"));
    assert_eq!(wf.view().amount_error.as_deref(), Some("Enter a valid amount"));
    assert!(!wf.validate_amount("0.999999999"));

    assert!(wf.validate_amount("1"));
    assert!(wf.view().amount_error.is_none());
    assert!(wf.validate_amount("1000000"));
}

#[tokio::test]
async fn test_invalid_amount_makes_no_network_call() {
    let (wf, mut rx) = ready().await;

    let result = wf.submit_stake_action(StakeIntent::new(StakeAction::Add, "0.5")).await;

    assert!(matches!(result, Err(StakeError::Validation(_))));
    assert!(wf.chain.submitted().is_empty());
    assert!(!wf.view().is_busy());
    assert!(wf.view().amount_error.is_some());
    assert!(phases(&drain(&mut rx)).is_empty());
}

#[tokio::test]
async fn test_missing_hotkey_is_validation_error() {
    let (wf, _rx) = ready().await;
    wf.set_hotkey("   ");

    let result = wf.submit_stake_action(StakeIntent::new(StakeAction::Add, "2")).await;

    assert_eq!(
        result,
        Err(StakeError::Validation("Enter a validator hotkey".to_string()))
    );
    assert!(wf.chain.submitted().is_empty());
}

// ==================== Transaction lifecycle ====================

#[tokio::test]
async fn test_add_stake_success_reconciles_from_chain() {
    let (wf, mut rx) = ready().await;
    wf.set_amount("2");
    let (balances, stakes) = (wf.chain.balance_queries(), wf.chain.stake_queries());
    wf.chain.push_balance(Reply::Ready(Ok(23 * TAO)));

    let outcome = wf
        .dispatch(Intent::Submit(StakeAction::Add))
        .await;
    assert_eq!(outcome, Ok(()));

    assert_eq!(
        wf.chain.submitted(),
        vec![(
            StakeCall::AddStake {
                hotkey: HOTKEY.to_string(),
                amount: 2 * TAO
            },
            ALICE.to_string()
        )]
    );

    let events = drain(&mut rx);
    assert_eq!(
        phases(&events),
        vec![
            OperationPhase::Validating,
            OperationPhase::Signing,
            OperationPhase::Submitting,
            OperationPhase::AwaitingFinalization,
            OperationPhase::Succeeded,
        ]
    );
    assert!(events.contains(&WorkflowEvent::Progress {
        action: StakeAction::Add,
        status: TxStatus::Broadcast,
    }));
    assert!(notifications(&events).contains(&Notification {
        level: NotificationLevel::Success,
        message: "Stake added successfully!".to_string(),
    }));

    assert_eq!(wf.chain.balance_queries(), balances + 1);
    assert_eq!(wf.chain.stake_queries(), stakes + 1);

    let view = wf.view();
    assert_eq!(view.loading, LoadingState::default());
    assert_eq!(view.phase, OperationPhase::Idle);
    assert_eq!(view.balance.map(|b| b.free), Some(23 * TAO));
    assert_eq!(view.amount, "2");
}

#[tokio::test]
async fn test_submit_returns_outcome() {
    let (wf, _rx) = ready().await;

    let outcome = wf
        .submit_stake_action(StakeIntent::new(StakeAction::Remove, "1.0000000019"))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        StakeOutcome {
            action: StakeAction::Remove,
            amount: TAO + 1,
            block_hash: [0xAB; 32],
        }
    );
}

#[tokio::test]
async fn test_dispatch_error_leaves_snapshots_untouched() {
    let (wf, mut rx) = ready().await;
    let before = wf.view();
    let (balances, stakes) = (wf.chain.balance_queries(), wf.chain.stake_queries());
    wf.chain.push_submission(Submission::Statuses(vec![
        TxStatus::Broadcast,
        TxStatus::InBlock {
            block_hash: [1; 32],
        },
        TxStatus::Finalized {
            block_hash: [1; 32],
            dispatch_error: Some("SubtensorModule::NotEnoughStakeToWithdraw".to_string()),
        },
    ]));

    let result = wf
        .submit_stake_action(StakeIntent::new(StakeAction::Remove, "2"))
        .await;

    assert_eq!(
        result,
        Err(StakeError::Dispatch(
            "SubtensorModule::NotEnoughStakeToWithdraw".to_string()
        ))
    );
    let after = wf.view();
    assert_eq!(after.balance, before.balance);
    assert_eq!(after.stake, before.stake);
    assert_eq!(after.loading, LoadingState::default());
    assert_eq!(wf.chain.balance_queries(), balances);
    assert_eq!(wf.chain.stake_queries(), stakes);

    let events = drain(&mut rx);
    assert_eq!(phases(&events).last(), Some(&OperationPhase::Failed));
    assert_eq!(notifications(&events).last().map(|n| n.level), Some(NotificationLevel::Error));
}

#[tokio::test]
async fn test_remove_while_add_in_flight_is_rejected() {
    let (wf, _rx) = ready().await;
    let (gate_tx, gate_rx) = oneshot::channel();
    wf.chain
        .push_submission(Submission::Gated(vec![TxStatus::Broadcast], gate_rx));
    let wf = &wf;

    let (add_result, ()) = tokio::join!(
        wf.submit_stake_action(StakeIntent::new(StakeAction::Add, "2")),
        async move {
            while !wf.view().loading.add {
                tokio::task::yield_now().await;
            }
            let rejected = wf
                .submit_stake_action(StakeIntent::new(StakeAction::Remove, "1"))
                .await;
            assert_eq!(rejected, Err(StakeError::ConcurrentOperation));

            let view = wf.view();
            assert!(view.loading.add);
            assert!(!view.loading.remove);
            gate_tx.send(vec![finalized_ok()]).unwrap();
        }
    );

    assert!(add_result.is_ok());
    assert_eq!(wf.chain.submitted().len(), 1);
    assert!(!wf.view().is_busy());
}

#[tokio::test]
async fn test_remove_max_uses_stake_snapshot() {
    let (wf, _rx) = setup_with(
        two_accounts(),
        MockChain::with_funds(40 * TAO, 12 * TAO + TAO / 2),
        settings(),
    );
    wf.initialize().await.unwrap();
    wf.set_amount("3");

    wf.submit_stake_action(StakeIntent::new(StakeAction::RemoveMax, "3"))
        .await
        .unwrap();

    let (call, _) = wf.chain.submitted().remove(0);
    assert_eq!(
        call,
        StakeCall::RemoveStake {
            hotkey: HOTKEY.to_string(),
            amount: 12_500_000_000,
        }
    );
}

#[tokio::test]
async fn test_remove_max_ignores_invalid_amount_field() {
    let (wf, _rx) = ready().await;
    wf.set_amount("not a number");

    let outcome = wf
        .submit_stake_action(StakeIntent::new(StakeAction::RemoveMax, "not a number"))
        .await
        .unwrap();
    assert_eq!(outcome.amount, 3 * TAO);
}

#[tokio::test]
async fn test_remove_max_without_stake_is_rejected() {
    let (wf, _rx) = setup_with(two_accounts(), MockChain::with_funds(5 * TAO, 0), settings());
    wf.initialize().await.unwrap();

    let result = wf
        .submit_stake_action(StakeIntent::new(StakeAction::RemoveMax, ""))
        .await;

    assert_eq!(
        result,
        Err(StakeError::Validation("No stake to remove".to_string()))
    );
    assert!(wf.chain.submitted().is_empty());
    assert!(!wf.view().is_busy());
}

#[tokio::test]
async fn test_signing_rejection_stops_before_submission() {
    let wallet = MockWallet {
        reject_signing: true,
        ..two_accounts()
    };
    let (wf, mut rx) = setup_with(wallet, MockChain::with_funds(5 * TAO, 0), settings());
    wf.initialize().await.unwrap();
    drain(&mut rx);

    let result = wf
        .submit_stake_action(StakeIntent::new(StakeAction::Add, "2"))
        .await;

    assert!(matches!(result, Err(StakeError::Signing(_))));
    assert!(wf.chain.submitted().is_empty());
    assert!(!wf.view().is_busy());
    assert_eq!(
        phases(&drain(&mut rx)),
        vec![
            OperationPhase::Validating,
            OperationPhase::Signing,
            OperationPhase::Failed,
        ]
    );
}

#[tokio::test]
async fn test_submission_error() {
    let (wf, _rx) = ready().await;
    wf.chain
        .push_submission(Submission::Fail("connection closed".to_string()));

    let result = wf
        .submit_stake_action(StakeIntent::new(StakeAction::Add, "2"))
        .await;

    assert_eq!(
        result,
        Err(StakeError::Submission("connection closed".to_string()))
    );
    assert!(!wf.view().is_busy());
}

#[tokio::test]
async fn test_dropped_transaction_fails() {
    let (wf, _rx) = ready().await;
    wf.chain.push_submission(Submission::Statuses(vec![
        TxStatus::Broadcast,
        TxStatus::Dropped("connection lost".to_string()),
    ]));

    let result = wf
        .submit_stake_action(StakeIntent::new(StakeAction::Add, "2"))
        .await;

    assert_eq!(result, Err(StakeError::Dispatch("connection lost".to_string())));
    assert!(!wf.view().is_busy());
}

#[tokio::test]
async fn test_status_stream_ending_early_fails() {
    let (wf, _rx) = ready().await;
    wf.chain
        .push_submission(Submission::Statuses(vec![TxStatus::Broadcast]));

    let result = wf
        .submit_stake_action(StakeIntent::new(StakeAction::Add, "2"))
        .await;

    assert!(matches!(result, Err(StakeError::Dispatch(_))));
    assert!(!wf.view().is_busy());
}

#[tokio::test(start_paused = true)]
async fn test_stalled_finalization_times_out() {
    let (wf, _rx) = ready().await;
    wf.chain.push_submission(Submission::Hang);

    let result = wf
        .submit_stake_action(StakeIntent::new(StakeAction::Add, "2"))
        .await;

    assert_eq!(
        result,
        Err(StakeError::FinalizationTimeout(Duration::from_secs(300)))
    );
    assert!(!wf.view().is_busy());
}

#[tokio::test]
async fn test_panicking_signer_is_contained() {
    let wallet = MockWallet {
        panic_on_sign: true,
        ..two_accounts()
    };
    let (wf, _rx) = setup_with(wallet, MockChain::with_funds(5 * TAO, 0), settings());
    wf.initialize().await.unwrap();

    let result = wf
        .submit_stake_action(StakeIntent::new(StakeAction::Add, "2"))
        .await;

    assert!(matches!(result, Err(StakeError::Dispatch(_))));
    assert!(!wf.view().is_busy());
}

#[tokio::test]
async fn test_abandoned_operation_clears_loading_flag() {
    let (wf, _rx) = ready().await;
    wf.chain.push_submission(Submission::Hang);

    {
        let submit = wf.submit_stake_action(StakeIntent::new(StakeAction::Add, "2"));
        tokio::pin!(submit);
        assert!(futures::poll!(submit.as_mut()).is_pending());
        assert!(wf.view().loading.add);
    }

    let view = wf.view();
    assert!(!view.is_busy());
    assert_eq!(view.phase, OperationPhase::Idle);
}

#[tokio::test]
async fn test_view_is_published() {
    let (wf, _rx) = ready().await;
    let mut view_rx = wf.subscribe();
    view_rx.mark_unchanged();

    wf.set_amount("7");

    assert!(view_rx.has_changed().unwrap());
    assert_eq!(view_rx.borrow_and_update().amount, "7");
}
