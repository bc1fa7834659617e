use crate::domain::{AnalysisRecord, Collection};
use anyhow::Context;
use std::any::Any;

pub mod file;
pub mod memory;

pub use file::FileSlot;
pub use memory::MemorySlot;

/// A single named slot holding the serialized collection. Reads and writes are
/// always whole-slot.
#[async_trait::async_trait]
pub trait SlotBackend: Send + Sync {
    fn slot_name(&self) -> &str;

    /// Claims exclusive use of the slot until the lease is dropped. `Ok(None)`
    /// means another owner, possibly in another process, holds it.
    fn try_claim(&self) -> anyhow::Result<Option<SlotLease>>;

    /// `Ok(None)` when the slot has never been written. Bytes are returned as
    /// stored; decoding is left to the store.
    async fn read(&self) -> anyhow::Result<Option<Vec<u8>>>;

    async fn write(&self, contents: &[u8]) -> anyhow::Result<()>;
}

/// Proof of exclusive use of a slot. Dropping it releases the claim.
pub struct SlotLease {
    _held: Box<dyn Any + Send + Sync>,
}

impl SlotLease {
    pub(crate) fn new(held: impl Any + Send + Sync) -> Self {
        Self {
            _held: Box::new(held),
        }
    }
}

impl std::fmt::Debug for SlotLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotLease").finish_non_exhaustive()
    }
}

pub struct PersistenceStore {
    backend: Box<dyn SlotBackend>,
}

impl PersistenceStore {
    pub fn new(backend: impl SlotBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn slot_name(&self) -> &str {
        self.backend.slot_name()
    }

    pub fn try_claim(&self) -> anyhow::Result<Option<SlotLease>> {
        let slot = self.backend.slot_name();
        self.backend
            .try_claim()
            .with_context(|| format!("failed to claim collection slot {slot}"))
    }

    /// Unparseable contents are treated as an empty collection. Backend I/O
    /// errors are returned so that state which could not be read is never
    /// overwritten.
    pub async fn load(&self) -> anyhow::Result<Collection> {
        let slot = self.backend.slot_name();
        let raw = self
            .backend
            .read()
            .await
            .with_context(|| format!("failed to read collection slot {slot}"))?;

        let Some(raw) = raw else {
            tracing::debug!(slot, "no stored collection; starting empty");
            return Ok(Collection::new());
        };

        let records = match serde_json::from_slice::<Vec<AnalysisRecord>>(&raw) {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(
                    slot,
                    error = %err,
                    "stored collection is unreadable; starting empty"
                );
                return Ok(Collection::new());
            }
        };

        let (collection, dropped) = Collection::from_records(records);
        if dropped > 0 {
            tracing::warn!(slot, dropped, "dropped duplicate symbols from stored collection");
        }
        tracing::info!(slot, records = collection.len(), "collection hydrated");
        Ok(collection)
    }

    pub async fn save(&self, collection: &Collection) -> anyhow::Result<()> {
        let slot = self.backend.slot_name();
        let body = serde_json::to_vec_pretty(collection)
            .context("failed to serialize collection")?;
        self.backend
            .write(&body)
            .await
            .with_context(|| format!("failed to write collection slot {slot}"))?;
        tracing::debug!(slot, records = collection.len(), "collection saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::fixtures::{record, record_json};
    use serde_json::json;

    #[tokio::test]
    async fn missing_slot_loads_empty() {
        let store = PersistenceStore::new(MemorySlot::new("analyzedCompanies"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_slot_loads_empty() {
        for raw in ["{not json", "", "{\"ticker\": \"AAPL\"}", "[{\"ticker\": \"AAPL\"}]"] {
            let slot = MemorySlot::with_contents("analyzedCompanies", raw);
            let store = PersistenceStore::new(slot);
            assert!(store.load().await.unwrap().is_empty(), "{raw:?}");
        }
    }

    #[tokio::test]
    async fn round_trip_preserves_order_and_fields() {
        let slot = MemorySlot::new("analyzedCompanies");
        let store = PersistenceStore::new(slot.clone());

        let mut c = Collection::new();
        for t in ["NVDA", "AAPL", "ORCL"] {
            c.push(record(t)).unwrap();
        }
        store.save(&c).await.unwrap();

        // Fresh store over the same slot, as after a restart.
        let reloaded = PersistenceStore::new(slot).load().await.unwrap();
        assert_eq!(reloaded, c);
    }

    #[tokio::test]
    async fn duplicate_symbols_in_stored_data_keep_first() {
        let mut second = record_json("aapl", "0000320193");
        second["grade"] = json!("F");
        let raw = json!([record_json("AAPL", "0000320193"), second]).to_string();

        let store = PersistenceStore::new(MemorySlot::with_contents("analyzedCompanies", &raw));
        let c = store.load().await.unwrap();
        assert_eq!(c.len(), 1);
        assert_eq!(c.iter().next().unwrap().grade, "B");
    }

    #[test]
    fn claim_is_exclusive_until_the_lease_drops() {
        let slot = MemorySlot::new("analyzedCompanies");
        let first = PersistenceStore::new(slot.clone());
        let second = PersistenceStore::new(slot);

        let lease = first.try_claim().unwrap().expect("free slot");
        assert!(second.try_claim().unwrap().is_none());

        drop(lease);
        assert!(second.try_claim().unwrap().is_some());
    }

    #[tokio::test]
    async fn saving_empty_collection_writes_empty_array() {
        let slot = MemorySlot::with_contents("analyzedCompanies", "[]");
        let store = PersistenceStore::new(slot.clone());
        store.save(&Collection::new()).await.unwrap();
        assert_eq!(slot.contents().as_deref(), Some("[]"));
    }
}
