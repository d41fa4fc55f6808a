//! # Change Observers
//!
//! Hooks notified after a transaction mutates the store. They are advisory:
//! nothing an observer does can change a transaction's result.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// A mutation that was applied to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeEvent {
    Set { key: Bytes, value: Bytes },
    Removed { key: Bytes, existed: bool },
}

impl ChangeEvent {
    pub fn key(&self) -> &Bytes {
        match self {
            ChangeEvent::Set { key, .. } => key,
            ChangeEvent::Removed { key, .. } => key,
        }
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeEvent::Set { key, value } => write!(
                f,
                "SET {} {}",
                hex::encode_upper(key),
                hex::encode_upper(value)
            ),
            ChangeEvent::Removed { key, existed } => {
                write!(f, "REMOVE {} existed={}", hex::encode_upper(key), existed)
            }
        }
    }
}

/// Receives every applied mutation, in apply order.
pub trait TxObserver: Send + Sync {
    fn on_change(&self, event: &ChangeEvent);
}

/// Discards events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TxObserver for NoopObserver {
    fn on_change(&self, _event: &ChangeEvent) {}
}

/// Writes the human-auditable "key set" trace through `tracing`.
///
/// Keys and values are rendered as upper-case hex.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TxObserver for TracingObserver {
    fn on_change(&self, event: &ChangeEvent) {
        match event {
            ChangeEvent::Set { key, value } => info!(
                key = %hex::encode_upper(key),
                value = %hex::encode_upper(value),
                "SET"
            ),
            ChangeEvent::Removed { key, existed } => debug!(
                key = %hex::encode_upper(key),
                existed = *existed,
                "REMOVE"
            ),
        }
    }
}

/// Forwards events to an unbounded channel.
///
/// A dropped receiver is ignored; the application keeps running.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<ChangeEvent>,
}

impl ChannelObserver {
    /// Creates an observer and the receiving end of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ChangeEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl TxObserver for ChannelObserver {
    fn on_change(&self, event: &ChangeEvent) {
        if self.sender.send(event.clone()).is_err() {
            debug!("Change event dropped: receiver closed");
        }
    }
}
