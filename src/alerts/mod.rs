//! Alert delivery
//!
//! Formats expiry alerts and heartbeats and ships them to the configured
//! webhook.

pub mod message;
pub mod notifier;

pub use message::{heartbeat_text, ExpiryAlert};
pub use notifier::{Notifier, NotifierError, WebhookNotifier};
