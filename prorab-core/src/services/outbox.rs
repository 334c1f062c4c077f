//! Push outbox - background delivery of relay messages
//!
//! Messages are queued on an unbounded channel and sent one at a time by a
//! worker task. A failed send is retried with exponential backoff; once the
//! attempts run out the message is dropped and the failure logged. Without a
//! configured relay the outbox accepts messages and discards them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::OutboxSettings;
use crate::ports::PushRelay;
use crate::services::logging::{record, LogEvent, Logger};

/// How often and how patiently a message is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl RetryPolicy {
    /// Delay after the `attempt`-th failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_delay.saturating_mul(1 << exponent)
    }
}

impl From<&OutboxSettings> for RetryPolicy {
    fn from(settings: &OutboxSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_delay: settings.initial_delay(),
        }
    }
}

/// Delivery counters
#[derive(Debug, Default)]
pub struct OutboxStats {
    delivered: AtomicUsize,
    failed: AtomicUsize,
}

impl OutboxStats {
    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }

    /// Messages dropped after the last attempt failed
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }
}

pub struct PushOutbox {
    sender: Option<mpsc::UnboundedSender<String>>,
    worker: Option<JoinHandle<()>>,
    stats: Arc<OutboxStats>,
}

impl PushOutbox {
    /// Start the worker task. Must be called inside a tokio runtime.
    pub fn start(relay: Arc<dyn PushRelay>, policy: RetryPolicy, logger: Logger) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let stats = Arc::new(OutboxStats::default());
        let worker = tokio::spawn(run(receiver, relay, policy, Arc::clone(&stats), logger));

        Self {
            sender: Some(sender),
            worker: Some(worker),
            stats,
        }
    }

    /// Outbox without a relay; every message is discarded
    pub fn disabled() -> Self {
        Self {
            sender: None,
            worker: None,
            stats: Arc::new(OutboxStats::default()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Queue a message; false when it was discarded
    pub fn enqueue(&self, text: impl Into<String>) -> bool {
        match &self.sender {
            Some(sender) => sender.send(text.into()).is_ok(),
            None => false,
        }
    }

    pub fn stats(&self) -> &OutboxStats {
        &self.stats
    }

    /// Close the queue and wait until every queued message was handled
    pub async fn shutdown(&mut self) {
        self.sender = None;
        if let Some(worker) = self.worker.take() {
            let _ = worker.await;
        }
    }
}

async fn run(
    mut receiver: mpsc::UnboundedReceiver<String>,
    relay: Arc<dyn PushRelay>,
    policy: RetryPolicy,
    stats: Arc<OutboxStats>,
    logger: Logger,
) {
    while let Some(text) = receiver.recv().await {
        deliver(relay.as_ref(), &text, policy, &stats, &logger).await;
    }
}

async fn deliver(
    relay: &dyn PushRelay,
    text: &str,
    policy: RetryPolicy,
    stats: &OutboxStats,
    logger: &Logger,
) {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match relay.send(text).await {
            Ok(()) => {
                stats.delivered.fetch_add(1, Ordering::SeqCst);
                return;
            }
            Err(_) if attempt < policy.max_attempts => {
                tokio::time::sleep(policy.delay_after(attempt)).await;
            }
            Err(e) => {
                stats.failed.fetch_add(1, Ordering::SeqCst);
                record(
                    logger,
                    LogEvent::new("push_relay_failed")
                        .with_error(e.to_string())
                        .with_error_details(format!("relay: {}, attempts: {}", relay.name(), attempt)),
                );
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::result::{Error, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Fails the first `failures` sends, then records every message
    struct FlakyRelay {
        failures: AtomicUsize,
        sent: Mutex<Vec<String>>,
        attempts: AtomicUsize,
    }

    impl FlakyRelay {
        fn new(failures: usize) -> Self {
            Self {
                failures: AtomicUsize::new(failures),
                sent: Mutex::new(Vec::new()),
                attempts: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PushRelay for FlakyRelay {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn send(&self, text: &str) -> Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(Error::relay("503 Service Unavailable"));
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(500),
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = policy(3);
        assert_eq!(policy.delay_after(1), Duration::from_millis(500));
        assert_eq!(policy.delay_after(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(3), Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_delivered() {
        let relay = Arc::new(FlakyRelay::new(2));
        let mut outbox = PushOutbox::start(relay.clone(), policy(3), None);

        assert!(outbox.enqueue("Склад\n\nМало цемента"));
        outbox.shutdown().await;

        assert_eq!(relay.attempts.load(Ordering::SeqCst), 3);
        assert_eq!(*relay.sent.lock().unwrap(), vec!["Склад\n\nМало цемента"]);
        assert_eq!(outbox.stats().delivered(), 1);
        assert_eq!(outbox.stats().failed(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let relay = Arc::new(FlakyRelay::new(10));
        let mut outbox = PushOutbox::start(relay.clone(), policy(3), None);

        outbox.enqueue("one");
        outbox.enqueue("two");
        outbox.shutdown().await;

        assert_eq!(relay.attempts.load(Ordering::SeqCst), 6);
        assert_eq!(outbox.stats().failed(), 2);
        assert!(relay.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_outbox_discards() {
        let mut outbox = PushOutbox::disabled();
        assert!(!outbox.is_enabled());
        assert!(!outbox.enqueue("dropped"));
        outbox.shutdown().await;
        assert_eq!(outbox.stats().delivered(), 0);
    }
}
