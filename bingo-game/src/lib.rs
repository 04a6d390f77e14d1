//! Bingo game - rounds, ticket purchases and prize announcements
//!
//! Watches transactions submitted to the bingo contract until they settle,
//! classifies extraction payouts into prize tiers and keeps players' ticket
//! messages in sync with the numbers drawn.

pub mod error;
pub mod monitor;
pub mod notifier;
pub mod prize;
pub mod registry;
pub mod watcher;

#[cfg(test)]
mod fakes;

pub use error::{GameError, Result};
pub use monitor::{ExtractionReport, GameRoundMonitor, MonitorSettings, PendingPurchase};
pub use notifier::{Chat, LogNotifier, MessageRef, Notifier, TextFormat};
pub use prize::{PrizeThresholds, Winning};
pub use registry::{DisplayedTicket, PlayerRegistry};
pub use watcher::{StatusLine, TransactionWatcher, WatchOutcome, WatchPolicy};
