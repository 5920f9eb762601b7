//! Error types for Sluice Core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// A fully-qualified feature name did not have the `view__feature` shape
    #[error("Malformed feature name: {0}")]
    MalformedName(String),

    /// An option string (execution mode, file format, time format) was not recognised
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A feature view kind string did not match any known kind
    #[error("Unknown object kind: {0}")]
    UnknownObjectKind(String),

    /// A catalog object failed validation
    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::MalformedName("conv_rate".to_string());
        assert_eq!(err.to_string(), "Malformed feature name: conv_rate");

        let err = CoreError::Configuration("Unknown mode spark".to_string());
        assert!(err.to_string().contains("spark"));
    }
}
