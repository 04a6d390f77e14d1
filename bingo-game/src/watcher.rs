//! Tracks a submitted transaction until the indexer reports a final status.
//!
//! A watcher sleeps, polls, and repeats. It stops on the first terminal status,
//! after `max_attempts` polls, or when the shutdown channel fires. The status
//! message is edited exactly once, on the terminal transition, so edits for a
//! hash always read Pending then Success or Failed.

use crate::notifier::{MessageRef, Notifier, TextFormat};
use crate::{GameError, Result};
use bingo_core::config::PollingConfig;
use bingo_core::{BingoError, Indexer, ResultRecord, TransactionStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_RESULTS_RETRY_DELAY: Duration = Duration::from_secs(6);

/// Shortest time a watcher keeps polling, whatever the round length.
const MIN_WATCH_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchPolicy {
    pub poll_interval: Duration,
    pub results_retry_delay: Duration,
    pub max_attempts: u32,
}

impl Default for WatchPolicy {
    fn default() -> Self {
        Self::for_round(Duration::from_secs(300))
    }
}

impl WatchPolicy {
    /// Poll for twice the round duration, and at least a minute.
    pub fn for_round(round_duration: Duration) -> Self {
        Self::with_intervals(
            DEFAULT_POLL_INTERVAL,
            DEFAULT_RESULTS_RETRY_DELAY,
            round_duration,
        )
    }

    pub fn from_polling(polling: &PollingConfig, round_duration: Duration) -> Self {
        Self::with_intervals(
            polling.transaction_interval(),
            polling.results_retry_delay(),
            round_duration,
        )
    }

    pub fn with_intervals(
        poll_interval: Duration,
        results_retry_delay: Duration,
        round_duration: Duration,
    ) -> Self {
        let window = round_duration.saturating_mul(2).max(MIN_WATCH_WINDOW);
        let poll_ms = poll_interval.as_millis().max(1);
        let attempts = (window.as_millis() + poll_ms - 1) / poll_ms;

        Self {
            poll_interval,
            results_retry_delay,
            max_attempts: u32::try_from(attempts).unwrap_or(u32::MAX).max(1),
        }
    }
}

/// The message a watcher rewrites when the transaction settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub message: Option<MessageRef>,
    pub prefix: String,
    pub explorer_url: String,
}

impl StatusLine {
    pub fn new(prefix: impl Into<String>, explorer_url: impl Into<String>) -> Self {
        Self {
            message: None,
            prefix: prefix.into(),
            explorer_url: explorer_url.into(),
        }
    }

    pub fn render(&self, hash: &str, status: TransactionStatus) -> String {
        format!(
            "{}[{}]({}{})",
            self.prefix,
            status.label(),
            self.explorer_url,
            hash
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOutcome {
    pub status: TransactionStatus,
    /// Empty unless the transaction succeeded.
    pub results: Vec<ResultRecord>,
}

#[derive(Clone)]
pub struct TransactionWatcher {
    indexer: Arc<dyn Indexer>,
    notifier: Arc<dyn Notifier>,
    policy: WatchPolicy,
    shutdown: watch::Receiver<bool>,
}

impl TransactionWatcher {
    pub fn new(
        indexer: Arc<dyn Indexer>,
        notifier: Arc<dyn Notifier>,
        policy: WatchPolicy,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            indexer,
            notifier,
            policy,
            shutdown,
        }
    }

    pub fn policy(&self) -> &WatchPolicy {
        &self.policy
    }

    /// Wait for a terminal status, results included on success.
    pub async fn watch(&self, hash: &str, status_line: &StatusLine) -> Result<WatchOutcome> {
        let status = self.wait_for_terminal(hash, status_line).await?;
        let results = match status {
            TransactionStatus::Success => self.fetch_results(hash).await?,
            _ => Vec::new(),
        };
        Ok(WatchOutcome { status, results })
    }

    /// Poll until the transaction leaves Pending, then edit the status line.
    /// Poll failures are logged and count as attempts.
    pub async fn wait_for_terminal(
        &self,
        hash: &str,
        status_line: &StatusLine,
    ) -> Result<TransactionStatus> {
        for attempt in 1..=self.policy.max_attempts {
            self.pause(self.policy.poll_interval).await?;

            let status = match self.indexer.transaction_status(hash).await {
                Ok(status) => status,
                Err(e) => {
                    tracing::warn!("Polling {} failed (attempt {}): {}", hash, attempt, e);
                    continue;
                }
            };
            tracing::debug!("Transaction {} is {:?} (attempt {})", hash, status, attempt);

            if !status.is_terminal() {
                continue;
            }

            tracing::info!("Transaction {} finished: {:?}", hash, status);
            if let Some(message) = &status_line.message {
                let text = status_line.render(hash, status);
                if let Err(e) = self
                    .notifier
                    .edit_message(message, &text, TextFormat::Markdown)
                    .await
                {
                    tracing::warn!("Failed to update status of {}: {}", hash, e);
                }
            }
            return Ok(status);
        }

        tracing::warn!(
            "Giving up on {} after {} polls",
            hash,
            self.policy.max_attempts
        );
        Err(GameError::WatchTimeout {
            hash: hash.to_string(),
            attempts: self.policy.max_attempts,
        })
    }

    /// Result records of a settled transaction. The indexer may lag, so an
    /// empty or failed first read is retried once after a short delay.
    pub async fn fetch_results(&self, hash: &str) -> Result<Vec<ResultRecord>> {
        match self.indexer.transaction_results(hash).await {
            Ok(records) if !records.is_empty() => return Ok(records),
            Ok(_) => tracing::debug!("No result records for {} yet", hash),
            Err(e) => tracing::warn!("Fetching results of {} failed: {}", hash, e),
        }

        self.pause(self.policy.results_retry_delay).await?;

        let records = self.indexer.transaction_results(hash).await?;
        if records.is_empty() {
            return Err(BingoError::invalid_response(format!("no result records for {}", hash)).into());
        }
        Ok(records)
    }

    async fn pause(&self, delay: Duration) -> Result<()> {
        tokio::select! {
            biased;
            _ = cancelled(self.shutdown.clone()) => Err(GameError::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

/// Resolves once shutdown is signalled. Never resolves if the sender is gone.
pub(crate) async fn cancelled(mut shutdown: watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{
        FakeIndexer, NetworkDown, RecordingNotifier, FAILED, PENDING, SUCCESS,
    };
    use crate::notifier::Chat;

    const HASH: &str = "ab12";

    fn status_line() -> StatusLine {
        StatusLine {
            message: Some(MessageRef {
                chat: Chat::Group,
                message_id: 1,
            }),
            prefix: "`Round #3: Sending prizes` - Status: ".to_string(),
            explorer_url: "https://explorer.example/transactions/".to_string(),
        }
    }

    fn record(value: u128) -> ResultRecord {
        ResultRecord {
            receiver: "erd1x".to_string(),
            value,
            data: String::new(),
        }
    }

    fn watcher(
        indexer: Arc<FakeIndexer>,
        notifier: Arc<RecordingNotifier>,
        max_attempts: u32,
    ) -> (TransactionWatcher, watch::Sender<bool>) {
        let (tx, rx) = watch::channel(false);
        let policy = WatchPolicy {
            poll_interval: DEFAULT_POLL_INTERVAL,
            results_retry_delay: DEFAULT_RESULTS_RETRY_DELAY,
            max_attempts,
        };
        (TransactionWatcher::new(indexer, notifier, policy, rx), tx)
    }

    #[test]
    fn test_policy_for_round() {
        let policy = WatchPolicy::for_round(Duration::from_secs(600));
        assert_eq!(policy.poll_interval, Duration::from_secs(5));
        assert_eq!(policy.max_attempts, 240);

        // short rounds still get a minute
        assert_eq!(WatchPolicy::for_round(Duration::from_secs(10)).max_attempts, 12);
        assert_eq!(WatchPolicy::for_round(Duration::ZERO).max_attempts, 12);

        let odd = WatchPolicy::with_intervals(
            Duration::from_secs(7),
            Duration::from_secs(6),
            Duration::from_secs(31),
        );
        assert_eq!(odd.max_attempts, 9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_then_success() {
        let indexer = Arc::new(FakeIndexer::default());
        indexer.script_statuses(HASH, vec![PENDING, PENDING, SUCCESS]);
        indexer.script_results(HASH, vec![vec![record(1)]]);
        let notifier = Arc::new(RecordingNotifier::default());
        let (watcher, _tx) = watcher(indexer.clone(), notifier.clone(), 10);

        let started = tokio::time::Instant::now();
        let outcome = watcher.watch(HASH, &status_line()).await.unwrap();

        assert_eq!(outcome.status, TransactionStatus::Success);
        assert_eq!(outcome.results, vec![record(1)]);
        assert_eq!(indexer.status_calls(), 3);
        assert_eq!(indexer.result_calls(), 1);
        assert_eq!(started.elapsed(), Duration::from_secs(15));

        let edits = notifier.edits();
        assert_eq!(edits.len(), 1);
        assert_eq!(
            edits[0].1,
            "`Round #3: Sending prizes` - Status: [success ✅](https://explorer.example/transactions/ab12)"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_then_failed() {
        let indexer = Arc::new(FakeIndexer::default());
        indexer.script_statuses(HASH, vec![PENDING, PENDING, FAILED]);
        let notifier = Arc::new(RecordingNotifier::default());
        let (watcher, _tx) = watcher(indexer.clone(), notifier.clone(), 10);

        let outcome = watcher.watch(HASH, &status_line()).await.unwrap();

        assert_eq!(outcome.status, TransactionStatus::Failed);
        assert!(outcome.results.is_empty());
        assert_eq!(indexer.result_calls(), 0);
        let edits = notifier.edits();
        assert_eq!(edits.len(), 1);
        assert!(edits[0].1.contains("[failed ❌]"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_errors_count_as_attempts() {
        let indexer = Arc::new(FakeIndexer::default());
        indexer.script_statuses(HASH, vec![NetworkDown, NetworkDown, SUCCESS]);
        let notifier = Arc::new(RecordingNotifier::default());
        let (watcher, _tx) = watcher(indexer.clone(), notifier.clone(), 3);

        let status = watcher.wait_for_terminal(HASH, &status_line()).await.unwrap();
        assert_eq!(status, TransactionStatus::Success);
        assert_eq!(indexer.status_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let indexer = Arc::new(FakeIndexer::default());
        indexer.script_statuses(HASH, vec![PENDING]);
        let notifier = Arc::new(RecordingNotifier::default());
        let (watcher, _tx) = watcher(indexer.clone(), notifier.clone(), 4);

        let result = watcher.wait_for_terminal(HASH, &status_line()).await;
        assert!(matches!(
            result,
            Err(GameError::WatchTimeout { attempts: 4, .. })
        ));
        assert_eq!(indexer.status_calls(), 4);
        assert!(notifier.edits().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_watch() {
        let indexer = Arc::new(FakeIndexer::default());
        indexer.script_statuses(HASH, vec![PENDING]);
        let notifier = Arc::new(RecordingNotifier::default());
        let (watcher, tx) = watcher(indexer.clone(), notifier.clone(), 1000);

        let handle = tokio::spawn(async move {
            let line = status_line();
            watcher.wait_for_terminal(HASH, &line).await
        });
        tokio::time::sleep(Duration::from_secs(12)).await;
        tx.send(true).unwrap();

        let result = handle.await.unwrap();
        assert!(matches!(result, Err(GameError::Cancelled)));
        assert_eq!(indexer.status_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_retried_once() {
        let indexer = Arc::new(FakeIndexer::default());
        indexer.script_results(HASH, vec![vec![], vec![record(5)]]);
        let notifier = Arc::new(RecordingNotifier::default());
        let (watcher, _tx) = watcher(indexer.clone(), notifier, 10);

        let started = tokio::time::Instant::now();
        let records = watcher.fetch_results(HASH).await.unwrap();
        assert_eq!(records, vec![record(5)]);
        assert_eq!(indexer.result_calls(), 2);
        assert_eq!(started.elapsed(), DEFAULT_RESULTS_RETRY_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_give_up_after_retry() {
        let indexer = Arc::new(FakeIndexer::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let (watcher, _tx) = watcher(indexer.clone(), notifier, 10);

        let result = watcher.fetch_results(HASH).await;
        assert!(matches!(
            result,
            Err(GameError::Core(BingoError::InvalidResponse(_)))
        ));
        assert_eq!(indexer.result_calls(), 2);
    }

    #[test]
    fn test_status_line_render() {
        let line = StatusLine::new("`Buy ticket in round #4` - Status: ", "https://x/tx/");
        assert_eq!(
            line.render("ff", TransactionStatus::Pending),
            "`Buy ticket in round #4` - Status: [pending ⌛️](https://x/tx/ff)"
        );
    }
}
