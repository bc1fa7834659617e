use crate::storage::{SlotBackend, SlotLease};
use anyhow::Context;
use std::ffi::OsStr;
use std::path::PathBuf;

/// A slot backed by one JSON file. Writes go to a sibling temp file that is
/// then renamed over the slot, so readers never see a partial write.
///
/// Claims are advisory locks on a sibling `.lock` file, so they hold across
/// processes. The slot file itself is replaced on every write and cannot
/// carry the lock.
#[derive(Debug, Clone)]
pub struct FileSlot {
    name: String,
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { name, path }
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut file_name = self
            .path
            .file_name()
            .map(OsStr::to_os_string)
            .unwrap_or_default();
        file_name.push(suffix);
        self.path.with_file_name(file_name)
    }

    fn temp_path(&self) -> PathBuf {
        self.sibling(".tmp")
    }

    fn lock_path(&self) -> PathBuf {
        self.sibling(".lock")
    }
}

#[async_trait::async_trait]
impl SlotBackend for FileSlot {
    fn slot_name(&self) -> &str {
        &self.name
    }

    fn try_claim(&self) -> anyhow::Result<Option<SlotLease>> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let lock_path = self.lock_path();
        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("failed to open {}", lock_path.display()))?;

        let mut lock = fd_lock::RwLock::new(file);
        match lock.try_write() {
            // The OS releases the lock when the handle closes, i.e. when the
            // lease drops, so the borrowed guard is not needed past this point.
            Ok(guard) => std::mem::forget(guard),
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to lock {}", lock_path.display()))
            }
        }

        tracing::debug!(slot = %self.name, lock = %lock_path.display(), "slot claimed");
        Ok(Some(SlotLease::new(lock)))
    }

    async fn read(&self) -> anyhow::Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err)
                .with_context(|| format!("failed to read {}", self.path.display())),
        }
    }

    async fn write(&self, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let tmp = self.temp_path();
        tokio::fs::write(&tmp, contents)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}
