//! In-memory backend

use async_trait::async_trait;

use crate::{traits::RegistryStore, RegistryResult};

/// Backend that persists nothing; the registry's resident catalog is the
/// only copy of the state.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryRegistryStore;

impl MemoryRegistryStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RegistryStore for MemoryRegistryStore {
    async fn read_snapshot(&self) -> RegistryResult<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn write_snapshot(&self, _bytes: &[u8]) -> RegistryResult<()> {
        Ok(())
    }

    async fn teardown(&self) -> RegistryResult<()> {
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
