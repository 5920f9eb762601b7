//! Feature naming
//!
//! A feature can be addressed by its short name (`conv_rate`) or by its
//! fully-qualified name (`driver_hourly_stats__conv_rate`). Feature
//! references used to request features use `view:feature`.

use crate::error::{CoreError, Result};

/// Separator between view name and feature name in a fully-qualified name
pub const FEATURE_NAME_SEPARATOR: &str = "__";

/// Separator between view name and feature name in a feature reference
pub const FEATURE_REF_SEPARATOR: char = ':';

/// Build the fully-qualified name `"<view>__<feature>"`
pub fn qualify(view: &str, feature: &str) -> String {
    format!("{}{}{}", view, FEATURE_NAME_SEPARATOR, feature)
}

/// Split a fully-qualified name into `(view, feature)`
///
/// The name must contain exactly one `__` separator with a non-empty part on
/// each side.
pub fn dequalify(qualified: &str) -> Result<(&str, &str)> {
    if qualified.matches(FEATURE_NAME_SEPARATOR).count() != 1 {
        return Err(CoreError::MalformedName(qualified.to_string()));
    }

    match qualified.split_once(FEATURE_NAME_SEPARATOR) {
        Some((view, feature)) if !view.is_empty() && !feature.is_empty() => Ok((view, feature)),
        _ => Err(CoreError::MalformedName(qualified.to_string())),
    }
}

/// Build a feature reference `"<view>:<feature>"`
pub fn feature_ref(view: &str, feature: &str) -> String {
    format!("{}{}{}", view, FEATURE_REF_SEPARATOR, feature)
}

/// Split a feature reference into `(view, feature)`
pub fn parse_feature_ref(reference: &str) -> Result<(&str, &str)> {
    match reference.split_once(FEATURE_REF_SEPARATOR) {
        Some((view, feature))
            if !view.is_empty() && !feature.is_empty() && !feature.contains(FEATURE_REF_SEPARATOR) =>
        {
            Ok((view, feature))
        }
        _ => Err(CoreError::MalformedName(reference.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualify() {
        assert_eq!(
            qualify("driver_hourly_stats", "conv_rate"),
            "driver_hourly_stats__conv_rate"
        );
    }

    #[test]
    fn test_dequalify_roundtrip() {
        let name = qualify("driver_hourly_stats", "conv_rate");
        assert_eq!(
            dequalify(&name).unwrap(),
            ("driver_hourly_stats", "conv_rate")
        );
    }

    #[test]
    fn test_dequalify_rejects_short_name() {
        assert_eq!(
            dequalify("conv_rate"),
            Err(CoreError::MalformedName("conv_rate".to_string()))
        );
    }

    #[test]
    fn test_dequalify_rejects_repeated_separator() {
        assert!(dequalify("a__b__c").is_err());
    }

    #[test]
    fn test_dequalify_rejects_empty_parts() {
        assert!(dequalify("__conv_rate").is_err());
        assert!(dequalify("driver__").is_err());
    }

    #[test]
    fn test_feature_ref() {
        let reference = feature_ref("transformed_conv_rate", "output");
        assert_eq!(reference, "transformed_conv_rate:output");
        assert_eq!(
            parse_feature_ref(&reference).unwrap(),
            ("transformed_conv_rate", "output")
        );
        assert!(parse_feature_ref("output").is_err());
        assert!(parse_feature_ref("a:b:c").is_err());
    }
}
