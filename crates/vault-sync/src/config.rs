//! # Vault Sync Configuration
//!
//! Polling cadences, the network allow-list and display limits.

use crate::algorithms::DEFAULT_RENDER_THRESHOLD;
use crate::domain::NetworkId;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Vault sync configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncConfig {
    /// Network validation poll interval in milliseconds.
    ///
    /// The provider has no change notifications, so this is the only way
    /// account and network switches are noticed.
    pub validate_interval_ms: u64,

    /// Ledger reconciliation interval in milliseconds.
    pub reconcile_interval_ms: u64,

    /// How long a notification stays visible, in milliseconds.
    pub notification_ttl_ms: u64,

    /// Networks the client may operate on.
    pub allowed_networks: Vec<NetworkId>,

    /// Ledger entries handed to the presentation layer.
    pub ledger_display_limit: usize,

    /// Amounts below this many wei render unconverted.
    pub render_threshold: u64,

    /// Log level filter (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            validate_interval_ms: 100,
            reconcile_interval_ms: 5_000,
            notification_ttl_ms: 10_000,
            allowed_networks: vec![NetworkId::Development],
            ledger_display_limit: 10,
            render_threshold: DEFAULT_RENDER_THRESHOLD,
            log_level: "info".to_string(),
        }
    }
}

impl SyncConfig {
    /// Create a config for testing (short timers).
    pub fn for_testing() -> Self {
        Self {
            validate_interval_ms: 10,
            reconcile_interval_ms: 50,
            notification_ttl_ms: 100,
            log_level: "debug".to_string(),
            ..Self::default()
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `VAULT_SYNC_POLL_MS`: validation interval (default: 100)
    /// - `VAULT_SYNC_RECONCILE_MS`: reconciliation interval (default: 5000)
    /// - `VAULT_SYNC_NOTIFY_MS`: notification lifetime (default: 10000)
    /// - `VAULT_SYNC_NETWORKS`: comma separated network ids (default: 5777)
    /// - `VAULT_SYNC_LOG_LEVEL` or `RUST_LOG`: log level (default: info)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let millis = |key: &str, fallback: u64| {
            env::var(key)
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &u64| *v > 0)
                .unwrap_or(fallback)
        };

        Self {
            validate_interval_ms: millis("VAULT_SYNC_POLL_MS", defaults.validate_interval_ms),
            reconcile_interval_ms: millis(
                "VAULT_SYNC_RECONCILE_MS",
                defaults.reconcile_interval_ms,
            ),
            notification_ttl_ms: millis("VAULT_SYNC_NOTIFY_MS", defaults.notification_ttl_ms),
            allowed_networks: env::var("VAULT_SYNC_NETWORKS")
                .ok()
                .map(|raw| parse_networks(&raw))
                .filter(|networks| !networks.is_empty())
                .unwrap_or(defaults.allowed_networks),
            log_level: env::var("VAULT_SYNC_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            ..defaults
        }
    }

    /// Whether a network is in the allow-list.
    pub fn is_allowed(&self, network: NetworkId) -> bool {
        self.allowed_networks.contains(&network)
    }

    /// Validation poll interval.
    pub fn validate_interval(&self) -> Duration {
        Duration::from_millis(self.validate_interval_ms)
    }

    /// Reconciliation interval.
    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_millis(self.reconcile_interval_ms)
    }

    /// Notification lifetime.
    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }
}

/// Parse a comma separated id list, ignoring unknown ids.
fn parse_networks(raw: &str) -> Vec<NetworkId> {
    let mut networks = Vec::new();
    for network in raw.split(',').filter_map(NetworkId::from_chain_id) {
        if !networks.contains(&network) {
            networks.push(network);
        }
    }
    networks
}
