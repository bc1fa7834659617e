use crate::domain::{AnalysisRecord, Symbol};
use serde::Serialize;
use std::sync::Mutex;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Failure,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub detail: String,
}

impl Notification {
    fn new(kind: NotificationKind, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            detail: detail.into(),
        }
    }

    pub fn analyzed(record: &AnalysisRecord) -> Self {
        Self::new(
            NotificationKind::Success,
            format!("{} analyzed", record.symbol),
            format!("Grade: {} - {}", record.grade, record.recommendation),
        )
    }

    pub fn rejected(symbol: &Symbol, reason: &str) -> Self {
        Self::new(
            NotificationKind::Failure,
            format!("Cannot analyze {symbol}"),
            reason,
        )
    }

    pub fn not_found(symbol: &Symbol) -> Self {
        Self::new(
            NotificationKind::Failure,
            format!("{symbol} not found"),
            "Ticker symbol could not be found. Please check and try again.",
        )
    }

    pub fn transport_failure(symbol: &Symbol) -> Self {
        Self::new(
            NotificationKind::Failure,
            format!("Failed to analyze {symbol}"),
            "Connection error or server issue.",
        )
    }

    pub fn batch_summary(succeeded: usize, attempted: usize) -> Self {
        Self::new(
            NotificationKind::Success,
            "Batch analysis complete",
            format!("Successfully analyzed {succeeded} of {attempted} tickers"),
        )
    }

    pub fn nothing_entered() -> Self {
        Self::new(
            NotificationKind::Info,
            "Nothing to analyze",
            "Enter one or more comma-separated tickers.",
        )
    }

    pub fn no_new_tickers() -> Self {
        Self::new(
            NotificationKind::Info,
            "No new tickers",
            "Entered ticker has already been analyzed.",
        )
    }

    pub fn cleared() -> Self {
        Self::new(
            NotificationKind::Info,
            "Cleared all analyses",
            "All stored analyses were removed.",
        )
    }
}

/// Receives orchestrator notifications. Purely observational.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, n: Notification) {
        match n.kind {
            NotificationKind::Failure => {
                tracing::warn!(title = %n.title, detail = %n.detail, "notification")
            }
            _ => tracing::info!(kind = ?n.kind, title = %n.title, detail = %n.detail, "notification"),
        }
    }
}

/// Forwards notifications to a channel, e.g. a UI event loop.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            tracing::debug!("notification receiver dropped");
        }
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    items: Mutex<Vec<Notification>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.lock())
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        self.items.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl NotificationSink for CollectingSink {
    fn notify(&self, notification: Notification) {
        self.lock().push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::fixtures::record;

    #[test]
    fn success_message_carries_grade_and_recommendation() {
        let n = Notification::analyzed(&record("NVDA"));
        assert_eq!(n.kind, NotificationKind::Success);
        assert_eq!(n.title, "NVDA analyzed");
        assert_eq!(n.detail, "Grade: B - Buy");
    }

    #[test]
    fn summary_reports_counts() {
        let n = Notification::batch_summary(2, 3);
        assert_eq!(n.detail, "Successfully analyzed 2 of 3 tickers");
    }

    #[tokio::test]
    async fn channel_sink_forwards_in_order() {
        let (sink, mut rx) = ChannelSink::channel();
        sink.notify(Notification::nothing_entered());
        sink.notify(Notification::cleared());
        assert_eq!(rx.recv().await.unwrap().title, "Nothing to analyze");
        assert_eq!(rx.recv().await.unwrap().title, "Cleared all analyses");
    }

    #[test]
    fn channel_sink_tolerates_dropped_receiver() {
        let (sink, rx) = ChannelSink::channel();
        drop(rx);
        sink.notify(Notification::cleared());
    }
}
