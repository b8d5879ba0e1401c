//! # Vault Sync Demo
//!
//! Runs the sync engine against an in-memory development chain: binds the
//! vault, deposits, withdraws, reconciles the ledger and prints it as JSON.

use anyhow::{Context, Result};
use primitive_types::{H160, U256};
use std::sync::Arc;
use tracing::info;
use vault_sync::{
    init_tracing, DevChain, NotificationKind, SyncConfig, VaultClientApi, VaultSyncService,
};

const DEMO_ACCOUNT: H160 = H160([0xa; 20]);

#[tokio::main]
async fn main() -> Result<()> {
    let config = SyncConfig::from_env();
    init_tracing(&config).context("failed to initialize tracing")?;

    let chain = DevChain::development().with_account(DEMO_ACCOUNT, U256::exp10(18) * 10);
    let service = VaultSyncService::new(config, Arc::new(chain.clone()), Arc::new(chain));
    service.start().context("wallet provider unavailable")?;

    let mut connection = service.subscribe();
    connection
        .wait_for(|state| state.correct_network)
        .await
        .context("validator stopped before binding")?;
    info!("Connected: {:?}", service.connection());

    service.deposit("2.5").await?;
    service.withdraw("0.75").await?;
    if let Some(message) = service.notification(NotificationKind::Success) {
        info!("{}", message.message);
    }

    service.refresh_ledger().await;

    let (wallet, vault) = service.display_balances();
    let report = serde_json::json!({
        "network": service.connection().network_id,
        "account": service.connection().current_account,
        "wallet_balance": wallet,
        "vault_balance": vault,
        "ledger": service.recent_events(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    service.shutdown();
    Ok(())
}
