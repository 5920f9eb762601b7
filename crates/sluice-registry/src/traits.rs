//! Persistence backend contract
//!
//! A backend stores opaque snapshot bytes. It never interprets them; the
//! [`Registry`](crate::Registry) owns encoding and decoding.
//!
//! # Example
//!
//! ```no_run
//! use sluice_registry::{FileRegistryStore, Registry, RegistryConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let store = FileRegistryStore::new("data/registry.json")?;
//! let mut registry = Registry::new(store, RegistryConfig::file("data/registry.json"));
//! registry.refresh().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::RegistryResult;

/// Storage for registry snapshots
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Latest snapshot, `None` if nothing was ever written
    async fn read_snapshot(&self) -> RegistryResult<Option<Vec<u8>>>;

    /// Replace the stored snapshot
    ///
    /// Backends that cannot compare-and-swap are last-writer-wins.
    async fn write_snapshot(&self, bytes: &[u8]) -> RegistryResult<()>;

    /// Irreversibly remove everything this backend stored
    async fn teardown(&self) -> RegistryResult<()>;

    /// Whether snapshots survive the process; resident-only stores are never
    /// read back on refresh
    fn is_persistent(&self) -> bool {
        true
    }

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}
