//! # Sync Scenario Tests
//!
//! End-to-end behavior of `VaultSyncService` against the in-memory
//! development chain: binding, balance resets, submissions, ledger
//! reconciliation, notification expiry and shutdown.

use std::sync::Arc;
use std::time::Duration;

use primitive_types::{H160, U256};
use vault_sync::{
    Address, BalanceSnapshot, DevCall, DevChain, EventKind, LedgerEvent, NotificationKind,
    SyncConfig, VaultClientApi, VaultSyncError, VaultSyncService,
};

const ALICE: Address = H160([0xa; 20]);

fn eth(amount: u64) -> U256 {
    U256::exp10(18) * amount
}

fn service(chain: &DevChain) -> VaultSyncService {
    VaultSyncService::new(
        SyncConfig::for_testing(),
        Arc::new(chain.clone()),
        Arc::new(chain.clone()),
    )
}

fn error_message(service: &VaultSyncService) -> Option<String> {
    service
        .notification(NotificationKind::Error)
        .map(|n| n.message)
}

#[tokio::test]
async fn test_allowed_network_binds_with_one_fetch_of_each_balance() {
    let chain = DevChain::development().with_account(ALICE, eth(3));
    let service = service(&chain);

    service.validate_now().await;

    let connection = service.connection();
    assert!(connection.is_connected);
    assert!(connection.correct_network);
    assert_eq!(connection.current_account, Some(ALICE));
    assert_eq!(connection.network_id.as_deref(), Some("5777"));
    assert_eq!(chain.calls(DevCall::BalanceOf), 1);
    assert_eq!(chain.calls(DevCall::NativeBalance), 1);
    assert_eq!(service.balances().wallet_balance, Some(eth(3)));
    assert_eq!(service.balances().vault_balance, Some(U256::zero()));
}

#[tokio::test]
async fn test_redelivered_event_kept_once() {
    let chain = DevChain::development().with_account(ALICE, eth(1));
    let service = service(&chain);
    service.validate_now().await;

    let event = LedgerEvent::new(10, EventKind::Deposit, ALICE, U256::from(5));
    chain.emit(event.clone());
    service.refresh_ledger().await;
    // Same log delivered again inside the next window.
    chain.emit(event.clone());
    service.refresh_ledger().await;
    service.refresh_ledger().await;

    assert_eq!(service.recent_events(), vec![event]);
    assert_eq!(service.ledger().lowest_block(), 10);
}

#[tokio::test]
async fn test_ledger_follows_submissions_newest_first() {
    let chain = DevChain::development().with_account(ALICE, eth(5));
    let service = service(&chain);
    service.validate_now().await;

    service.deposit("2").await.unwrap();
    service.withdraw("0.5").await.unwrap();
    service.deposit("1").await.unwrap();
    service.refresh_ledger().await;

    let kinds: Vec<(u64, EventKind)> = service
        .recent_events()
        .iter()
        .map(|e| (e.block_number, e.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (3, EventKind::Deposit),
            (2, EventKind::Withdraw),
            (1, EventKind::Deposit),
        ]
    );
    assert_eq!(service.balances().vault_balance, Some(U256::exp10(17) * 25));
}

#[tokio::test]
async fn test_ledger_display_is_truncated() {
    let chain = DevChain::development().with_account(ALICE, eth(1));
    let service = service(&chain);
    service.validate_now().await;
    for block in 1..=15 {
        chain.emit(LedgerEvent::new(block, EventKind::Deposit, ALICE, U256::from(block)));
    }

    service.refresh_ledger().await;

    assert_eq!(service.ledger().len(), 15);
    let recent = service.recent_events();
    assert_eq!(recent.len(), 10);
    assert_eq!(recent[0].block_number, 15);
    assert_eq!(recent[9].block_number, 6);
}

#[tokio::test]
async fn test_empty_deposit_fails_without_contract_call() {
    let chain = DevChain::development().with_account(ALICE, eth(1));
    let service = service(&chain);
    service.validate_now().await;

    let result = service.deposit("").await;

    assert!(matches!(result, Err(VaultSyncError::InvalidAmount(_))));
    assert_eq!(error_message(&service).as_deref(), Some("Deposit failed"));
    assert_eq!(chain.calls(DevCall::Deposit), 0);
}

#[tokio::test]
async fn test_failed_withdraw_clears_field() {
    let chain = DevChain::development().with_account(ALICE, eth(1));
    let service = service(&chain);
    service.validate_now().await;
    service.set_withdraw_input("0.25");

    let result = service.submit_withdraw().await;

    assert!(matches!(result, Err(VaultSyncError::Contract(_))));
    assert!(error_message(&service).unwrap().starts_with("Withdraw failed"));
    assert!(service.form().withdraw_amount.is_empty());
    assert_eq!(chain.calls(DevCall::Withdraw), 1);
}

#[tokio::test]
async fn test_invalid_network_resets_and_rebind_fetches_once() {
    let chain = DevChain::development().with_account(ALICE, eth(2));
    let service = service(&chain);
    service.validate_now().await;
    service.deposit("1").await.unwrap();
    service.refresh_ledger().await;
    assert_eq!(service.recent_events().len(), 1);

    chain.set_network("1");
    service.validate_now().await;
    service.refresh_ledger().await;

    assert!(!service.connection().correct_network);
    assert_eq!(service.balances(), BalanceSnapshot::cleared());
    assert!(service.recent_events().is_empty());

    let vault_fetches = chain.calls(DevCall::BalanceOf);
    let wallet_fetches = chain.calls(DevCall::NativeBalance);
    chain.set_network("5777");
    service.validate_now().await;
    service.validate_now().await;

    assert!(service.connection().correct_network);
    assert_eq!(chain.calls(DevCall::BalanceOf), vault_fetches + 1);
    assert_eq!(chain.calls(DevCall::NativeBalance), wallet_fetches + 1);
    assert_eq!(service.balances().vault_balance, Some(eth(1)));
    assert_eq!(chain.bind_count(), 2);
}

#[tokio::test]
async fn test_failed_balance_fetch_keeps_previous_value() {
    let chain = DevChain::development().with_account(ALICE, eth(2));
    let service = service(&chain);
    service.validate_now().await;

    chain.fail(DevCall::NativeBalance, true);
    service.refresh_wallet_balance().await;

    assert_eq!(service.balances().wallet_balance, Some(eth(2)));
    assert!(error_message(&service).unwrap().contains("wallet balance"));
}

#[tokio::test(start_paused = true)]
async fn test_second_error_replaces_first_with_fresh_timer() {
    let chain = DevChain::development();
    let service = service(&chain);

    let _ = service.deposit("").await;
    tokio::time::sleep(Duration::from_millis(60)).await;
    let _ = service.withdraw("").await;
    assert_eq!(error_message(&service).as_deref(), Some("Withdraw failed"));

    // Past the first message's deadline.
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(error_message(&service).as_deref(), Some("Withdraw failed"));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(error_message(&service), None);
}

#[tokio::test(start_paused = true)]
async fn test_success_and_error_slots_are_independent() {
    let chain = DevChain::development().with_account(ALICE, eth(1));
    let service = service(&chain);
    service.validate_now().await;

    service.deposit("0.5").await.unwrap();
    let _ = service.withdraw("not a number").await;

    assert!(service.notification(NotificationKind::Success).is_some());
    assert_eq!(error_message(&service).as_deref(), Some("Withdraw failed"));

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(service.notification(NotificationKind::Success).is_none());
    assert!(service.notification(NotificationKind::Error).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_running_service_picks_up_new_logs() {
    let chain = DevChain::development().with_account(ALICE, eth(1));
    let service = service(&chain);
    let mut connection = service.subscribe();
    service.start().unwrap();

    connection.changed().await.unwrap();
    assert!(connection.borrow().correct_network);

    chain.emit(LedgerEvent::new(4, EventKind::Withdraw, ALICE, U256::from(9)));
    tokio::time::sleep(Duration::from_millis(60)).await;

    assert_eq!(service.recent_events().len(), 1);
    service.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_responses_after_shutdown_are_ignored() {
    let chain = DevChain::development().with_account(ALICE, eth(1));
    let service = Arc::new(service(&chain));
    service.validate_now().await;
    chain.set_latency(DevCall::BalanceOf, Duration::from_millis(50));

    let pending = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.refresh_vault_balance().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    service.shutdown();
    pending.await.unwrap();

    assert_eq!(service.balances(), BalanceSnapshot::cleared());
    assert_eq!(error_message(&service), None);
    assert_eq!(service.start(), Err(VaultSyncError::ShutDown));
}

#[tokio::test(start_paused = true)]
async fn test_network_switch_noticed_while_balance_fetch_hangs() {
    let chain = DevChain::development().with_account(ALICE, eth(1));
    chain.set_latency(DevCall::BalanceOf, Duration::from_secs(30));
    let service = service(&chain);
    service.start().unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(service.connection().correct_network);
    let polls = chain.calls(DevCall::NetworkId);

    chain.set_network("1");
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(chain.calls(DevCall::NetworkId) > polls + 10);
    assert!(!service.connection().correct_network);
    assert_eq!(service.balances(), BalanceSnapshot::cleared());
    service.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_ledger_fetched_as_soon_as_contract_binds() {
    let chain = DevChain::development().with_account(ALICE, eth(1));
    chain.set_latency(DevCall::NetworkId, Duration::from_millis(5));
    chain.emit(LedgerEvent::new(3, EventKind::Deposit, ALICE, U256::from(7)));
    let config = SyncConfig {
        reconcile_interval_ms: 5_000,
        ..SyncConfig::for_testing()
    };
    let service = VaultSyncService::new(config, Arc::new(chain.clone()), Arc::new(chain.clone()));
    service.start().unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(service.connection().correct_network);
    assert!(chain.calls(DevCall::QueryEvents(EventKind::Deposit)) >= 1);
    assert_eq!(service.recent_events().len(), 1);

    // Leaving and rejoining the network rebinds; the new ledger fills at once.
    chain.set_network("1");
    tokio::time::sleep(Duration::from_millis(50)).await;
    let queries = chain.calls(DevCall::QueryEvents(EventKind::Deposit));
    chain.set_network("5777");
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(chain.bind_count(), 2);
    assert!(chain.calls(DevCall::QueryEvents(EventKind::Deposit)) > queries);
    assert_eq!(service.recent_events().len(), 1);
    service.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_shutdown() {
    let chain = DevChain::development().with_account(ALICE, eth(1));
    let service = service(&chain);
    let mut connection = service.subscribe();
    service.start().unwrap();
    connection.wait_for(|state| state.correct_network).await.unwrap();

    service.shutdown();

    assert!(connection.has_changed().unwrap());
    assert!(!connection.borrow_and_update().correct_network);
}
