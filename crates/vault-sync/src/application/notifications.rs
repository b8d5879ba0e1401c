//! # Notification Channel
//!
//! One error slot and one success slot, each with its own expiry timer.
//! Raising into a slot replaces the message and restarts that slot's timer;
//! the other slot is never touched.

use crate::domain::{Notification, NotificationKind};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Default)]
struct Slot {
    current: Option<Notification>,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl Slot {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

#[derive(Default)]
struct Slots {
    error: Slot,
    success: Slot,
    closed: bool,
}

impl Slots {
    fn get_mut(&mut self, kind: NotificationKind) -> &mut Slot {
        match kind {
            NotificationKind::Error => &mut self.error,
            NotificationKind::Success => &mut self.success,
        }
    }

    fn get(&self, kind: NotificationKind) -> &Slot {
        match kind {
            NotificationKind::Error => &self.error,
            NotificationKind::Success => &self.success,
        }
    }
}

/// Auto-expiring error/success messages.
pub struct NotificationChannel {
    ttl: Duration,
    slots: Arc<Mutex<Slots>>,
}

impl NotificationChannel {
    /// Create a channel whose messages live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Arc::new(Mutex::new(Slots::default())),
        }
    }

    /// Show `message` in the `kind` slot, preempting whatever was there.
    ///
    /// Must be called from within a tokio runtime.
    pub fn raise(&self, kind: NotificationKind, message: impl Into<String>) {
        let message = message.into();
        match kind {
            NotificationKind::Error => warn!("[vault-sync] {}", message),
            NotificationKind::Success => info!("[vault-sync] {}", message),
        }

        let mut slots = self.slots.lock();
        if slots.closed {
            debug!("[vault-sync] Notification channel closed, dropping message");
            return;
        }

        let expires_at = Instant::now() + self.ttl;
        let slot = slots.get_mut(kind);
        slot.cancel_timer();
        slot.generation += 1;
        slot.current = Some(Notification {
            kind,
            message,
            expires_at,
        });

        let generation = slot.generation;
        let shared = Arc::clone(&self.slots);
        slot.timer = Some(tokio::spawn(async move {
            tokio::time::sleep_until(expires_at).await;
            let mut slots = shared.lock();
            let slot = slots.get_mut(kind);
            // A newer raise owns the slot now.
            if slot.generation == generation {
                slot.current = None;
                slot.timer = None;
            }
        }));
    }

    /// Raise an error notification.
    pub fn error(&self, message: impl Into<String>) {
        self.raise(NotificationKind::Error, message);
    }

    /// Raise a success notification.
    pub fn success(&self, message: impl Into<String>) {
        self.raise(NotificationKind::Success, message);
    }

    /// The visible message of one kind.
    pub fn current(&self, kind: NotificationKind) -> Option<Notification> {
        self.slots.lock().get(kind).current.clone()
    }

    /// Clear one slot immediately.
    pub fn dismiss(&self, kind: NotificationKind) {
        let mut slots = self.slots.lock();
        let slot = slots.get_mut(kind);
        slot.cancel_timer();
        slot.generation += 1;
        slot.current = None;
    }

    /// Cancel both timers and refuse further messages.
    pub fn shutdown(&self) {
        let mut slots = self.slots.lock();
        slots.closed = true;
        for kind in [NotificationKind::Error, NotificationKind::Success] {
            let slot = slots.get_mut(kind);
            slot.cancel_timer();
            slot.current = None;
        }
    }
}

impl Drop for NotificationChannel {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(10);

    #[tokio::test(start_paused = true)]
    async fn test_message_expires_after_ttl() {
        let channel = NotificationChannel::new(TTL);
        channel.error("boom");

        tokio::time::sleep(TTL - Duration::from_millis(1)).await;
        assert_eq!(
            channel.current(NotificationKind::Error).unwrap().message,
            "boom"
        );

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(channel.current(NotificationKind::Error).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_raise_replaces_and_restarts_timer() {
        let channel = NotificationChannel::new(TTL);
        channel.error("first");
        tokio::time::sleep(Duration::from_secs(6)).await;
        channel.error("second");

        // The first message's deadline passes; the second survives it.
        tokio::time::sleep(Duration::from_secs(6)).await;
        let visible = channel.current(NotificationKind::Error).unwrap();
        assert_eq!(visible.message, "second");

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(channel.current(NotificationKind::Error).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_kinds_are_independent() {
        let channel = NotificationChannel::new(TTL);
        channel.success("deposited");
        tokio::time::sleep(Duration::from_secs(5)).await;
        channel.error("fetch failed");

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(channel.current(NotificationKind::Success).is_none());
        assert!(channel.current(NotificationKind::Error).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_and_shutdown() {
        let channel = NotificationChannel::new(TTL);
        channel.error("a");
        channel.dismiss(NotificationKind::Error);
        assert!(channel.current(NotificationKind::Error).is_none());

        channel.success("b");
        channel.shutdown();
        assert!(channel.current(NotificationKind::Success).is_none());

        channel.error("after shutdown");
        assert!(channel.current(NotificationKind::Error).is_none());
    }
}
