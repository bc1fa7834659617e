use crate::storage::{SlotBackend, SlotLease};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// In-process slot. Clones share the same contents and claim, which lets a
/// test "restart" by building a new store over a clone.
#[derive(Debug, Clone)]
pub struct MemorySlot {
    name: String,
    contents: Arc<Mutex<Option<Vec<u8>>>>,
    fail_writes: Arc<Mutex<bool>>,
    claimed: Arc<AtomicBool>,
}

impl MemorySlot {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            contents: Arc::new(Mutex::new(None)),
            fail_writes: Arc::new(Mutex::new(false)),
            claimed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_contents(name: &str, contents: &str) -> Self {
        let slot = Self::new(name);
        *lock(&slot.contents) = Some(contents.as_bytes().to_vec());
        slot
    }

    /// Current contents as text; invalid UTF-8 is replaced.
    pub fn contents(&self) -> Option<String> {
        lock(&self.contents)
            .as_deref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Makes subsequent writes fail, for exercising persistence errors.
    pub fn set_fail_writes(&self, fail: bool) {
        *lock(&self.fail_writes) = fail;
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct MemoryClaim(Arc<AtomicBool>);

impl Drop for MemoryClaim {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[async_trait::async_trait]
impl SlotBackend for MemorySlot {
    fn slot_name(&self) -> &str {
        &self.name
    }

    fn try_claim(&self) -> anyhow::Result<Option<SlotLease>> {
        if self
            .claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(None);
        }
        Ok(Some(SlotLease::new(MemoryClaim(self.claimed.clone()))))
    }

    async fn read(&self) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(lock(&self.contents).clone())
    }

    async fn write(&self, contents: &[u8]) -> anyhow::Result<()> {
        anyhow::ensure!(!*lock(&self.fail_writes), "memory slot {} rejects writes", self.name);
        *lock(&self.contents) = Some(contents.to_vec());
        Ok(())
    }
}
