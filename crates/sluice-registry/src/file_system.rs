//! File system backend

use async_trait::async_trait;
use path_absolutize::Absolutize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::{error::RegistryError, traits::RegistryStore, RegistryResult};

/// Backend keeping the snapshot in a single file
///
/// Writes go to a sibling temporary file which is then renamed over the
/// snapshot, so readers see either the old or the new snapshot.
#[derive(Debug, Clone)]
pub struct FileRegistryStore {
    /// Absolute path of the snapshot file
    path: PathBuf,
}

impl FileRegistryStore {
    /// Create a store for `path`; the file need not exist yet
    ///
    /// # Example
    /// ```no_run
    /// use sluice_registry::FileRegistryStore;
    ///
    /// let store = FileRegistryStore::new("data/registry.json").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> RegistryResult<Self> {
        let path = path
            .as_ref()
            .absolutize()
            .map_err(|e| {
                RegistryError::BackendUnavailable(format!("Failed to absolutize path: {}", e))
            })?
            .to_path_buf();

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl RegistryStore for FileRegistryStore {
    async fn read_snapshot(&self) -> RegistryResult<Option<Vec<u8>>> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RegistryError::BackendUnavailable(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn write_snapshot(&self, bytes: &[u8]) -> RegistryResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp = self.temp_path();
        fs::write(&temp, bytes).await?;
        if let Err(e) = fs::rename(&temp, &self.path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }

        debug!(path = %self.path.display(), bytes = bytes.len(), "wrote registry snapshot");
        Ok(())
    }

    async fn teardown(&self) -> RegistryResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
