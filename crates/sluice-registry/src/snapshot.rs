//! Snapshot codec
//!
//! A snapshot is a JSON document holding the full catalog of every project:
//!
//! ```json
//! { "version": 3, "written_at": "2024-05-01T12:00:00Z", "catalog": { ... } }
//! ```

use crate::catalog::Catalog;
use crate::error::RegistryResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted form of the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Incremented on every commit
    pub version: u64,
    pub written_at: DateTime<Utc>,
    pub catalog: Catalog,
}

impl Snapshot {
    pub fn new(version: u64, catalog: Catalog) -> Self {
        Self {
            version,
            written_at: Utc::now(),
            catalog,
        }
    }

    pub fn encode(&self) -> RegistryResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> RegistryResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;

    #[test]
    fn test_decode_rejects_garbage() {
        let err = Snapshot::decode(b"not json").unwrap_err();
        assert!(matches!(err, RegistryError::Snapshot(_)));
    }

    #[test]
    fn test_empty_catalog_section_defaults() {
        let snapshot =
            Snapshot::decode(br#"{"version":1,"written_at":"2024-05-01T12:00:00Z","catalog":{}}"#)
                .unwrap();
        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.catalog, Catalog::default());
    }
}
