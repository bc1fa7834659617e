use crate::analysis::{AnalysisClient, Outcome};
use crate::config::Settings;
use crate::domain::{normalize, AnalysisRecord, Collection, Symbol};
use crate::notify::{Notification, NotificationSink};
use crate::storage::{PersistenceStore, SlotLease};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub mod dedup;

pub use dedup::select_new;

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Pause between consecutive analysis requests (never before the first).
    pub dispatch_delay: Duration,
}

impl BatchOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            dispatch_delay: settings.dispatch_delay(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("another batch is still in flight")]
    BatchInFlight,

    #[error("failed to load collection: {0:#}")]
    Load(anyhow::Error),

    #[error("failed to persist collection: {0:#}")]
    Persist(anyhow::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolStatus {
    Analyzed {
        grade: String,
        recommendation: String,
        /// False when the durable write after the append failed.
        persisted: bool,
    },
    Rejected {
        reason: String,
    },
    NotFound,
    TransportFailure,
}

impl SymbolStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, SymbolStatus::Analyzed { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolReport {
    pub symbol: Symbol,
    pub status: SymbolStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BatchReport {
    /// The input held no symbols at all.
    NothingEntered,
    /// The input parsed, but every symbol was repeated or already analyzed.
    NoNewTickers { skipped: Vec<Symbol> },
    Completed {
        results: Vec<SymbolReport>,
        succeeded: usize,
        attempted: usize,
    },
}

impl BatchReport {
    pub fn attempted(&self) -> usize {
        match self {
            BatchReport::Completed { attempted, .. } => *attempted,
            _ => 0,
        }
    }

    pub fn succeeded(&self) -> usize {
        match self {
            BatchReport::Completed { succeeded, .. } => *succeeded,
            _ => 0,
        }
    }
}

/// Owns the collection and drives batches of symbols through the analysis
/// client one at a time, mirroring every change to the persistence store.
///
/// Only one batch (or clear) runs at a time; an overlapping call fails with
/// [`OrchestratorError::BatchInFlight`]. The orchestrator also holds an
/// exclusive claim on its slot for its whole life, so a second orchestrator
/// over the same slot, in this process or another, fails to hydrate.
pub struct Orchestrator {
    client: Arc<dyn AnalysisClient>,
    store: PersistenceStore,
    sink: Arc<dyn NotificationSink>,
    options: BatchOptions,
    collection: Mutex<Collection>,
    in_flight: AtomicBool,
    _lease: SlotLease,
}

impl Orchestrator {
    /// Claims the slot and loads the stored collection. This is the only
    /// constructor, so nothing can be saved before hydration has finished.
    pub async fn hydrate(
        store: PersistenceStore,
        client: Arc<dyn AnalysisClient>,
        sink: Arc<dyn NotificationSink>,
        options: BatchOptions,
    ) -> Result<Self, OrchestratorError> {
        let Some(lease) = store.try_claim().map_err(OrchestratorError::Load)? else {
            tracing::warn!(
                slot = store.slot_name(),
                "slot lock not acquired; another run in progress"
            );
            return Err(OrchestratorError::BatchInFlight);
        };

        let collection = store.load().await.map_err(OrchestratorError::Load)?;
        tracing::info!(
            slot = store.slot_name(),
            provider = client.provider_name(),
            records = collection.len(),
            "orchestrator ready"
        );

        Ok(Self {
            client,
            store,
            sink,
            options,
            collection: Mutex::new(collection),
            in_flight: AtomicBool::new(false),
            _lease: lease,
        })
    }

    pub async fn snapshot(&self) -> Collection {
        self.collection.lock().await.clone()
    }

    pub async fn submit_batch(&self, raw_text: &str) -> Result<BatchReport, OrchestratorError> {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;

        let candidates = normalize(raw_text);
        if candidates.is_empty() {
            self.sink.notify(Notification::nothing_entered());
            return Ok(BatchReport::NothingEntered);
        }

        let new_symbols = {
            let collection = self.collection.lock().await;
            select_new(&candidates, &collection)
        };
        if new_symbols.is_empty() {
            let skipped = dedup::unique(&candidates);
            tracing::info!(skipped = skipped.len(), "no new tickers in submission");
            self.sink.notify(Notification::no_new_tickers());
            return Ok(BatchReport::NoNewTickers { skipped });
        }

        let attempted = new_symbols.len();
        tracing::info!(attempted, "dispatching batch");

        let mut queue = VecDeque::from(new_symbols);
        let mut results = Vec::with_capacity(attempted);
        while let Some(symbol) = queue.pop_front() {
            if !results.is_empty() && !self.options.dispatch_delay.is_zero() {
                tokio::time::sleep(self.options.dispatch_delay).await;
            }

            let outcome = self.client.request_analysis(&symbol).await;
            tracing::debug!(%symbol, outcome = outcome.label(), "analysis settled");
            let status = self.settle(&symbol, outcome).await;
            results.push(SymbolReport { symbol, status });
        }

        let succeeded = results.iter().filter(|r| r.status.is_success()).count();
        if attempted > 1 {
            self.sink
                .notify(Notification::batch_summary(succeeded, attempted));
        }
        tracing::info!(attempted, succeeded, "batch complete");

        Ok(BatchReport::Completed {
            results,
            succeeded,
            attempted,
        })
    }

    /// Empties durable storage first, then memory. On a failed write nothing
    /// changes.
    pub async fn clear(&self) -> Result<(), OrchestratorError> {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;

        let mut collection = self.collection.lock().await;
        let empty = Collection::new();
        self.store
            .save(&empty)
            .await
            .map_err(OrchestratorError::Persist)?;

        let removed = collection.len();
        *collection = empty;
        tracing::info!(removed, "collection cleared");
        self.sink.notify(Notification::cleared());
        Ok(())
    }

    async fn settle(&self, symbol: &Symbol, outcome: Outcome) -> SymbolStatus {
        let (notification, status) = match outcome {
            Outcome::Success(record) => {
                let notification = Notification::analyzed(&record);
                let grade = record.grade.clone();
                let recommendation = record.recommendation.clone();
                let persisted = self.append(record).await;
                (
                    notification,
                    SymbolStatus::Analyzed {
                        grade,
                        recommendation,
                        persisted,
                    },
                )
            }
            Outcome::Rejected { reason } => (
                Notification::rejected(symbol, &reason),
                SymbolStatus::Rejected { reason },
            ),
            Outcome::NotFound => (Notification::not_found(symbol), SymbolStatus::NotFound),
            Outcome::TransportFailure { detail } => {
                tracing::warn!(%symbol, %detail, "analysis transport failure");
                (
                    Notification::transport_failure(symbol),
                    SymbolStatus::TransportFailure,
                )
            }
        };

        self.sink.notify(notification);
        status
    }

    /// Appends and mirrors to storage while holding the collection lock, so
    /// durable writes happen in append order. Returns whether the write landed.
    async fn append(&self, record: AnalysisRecord) -> bool {
        let symbol = record.symbol.clone();
        let mut collection = self.collection.lock().await;
        if let Err(err) = collection.push(record) {
            tracing::warn!(%symbol, error = %err, "skipping append");
            return false;
        }

        match self.store.save(&collection).await {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(
                    %symbol,
                    error = ?err,
                    "record kept in memory but not persisted"
                );
                false
            }
        }
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, OrchestratorError> {
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("rejected overlapping batch");
            return Err(OrchestratorError::BatchInFlight);
        }
        Ok(Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
