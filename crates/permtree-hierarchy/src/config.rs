//! Hierarchy service configuration.

use permtree_core::validation::validate_delimiter;
use serde::Deserialize;

use crate::error::HierarchyError;

/// Configuration for the hierarchy service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Delimiter given to resource servers created without one (default: `:`).
    pub default_delimiter: String,
    /// Page size adapters should use when the caller gives no limit (default: 30).
    pub default_page_size: u64,
    /// Largest accepted `limit` on list operations (default: 100).
    pub max_page_size: u64,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            default_delimiter: ":".into(),
            default_page_size: 30,
            max_page_size: 100,
        }
    }
}

impl HierarchyConfig {
    pub(crate) fn validate(&self) -> Result<(), HierarchyError> {
        validate_delimiter(&self.default_delimiter).map_err(|_| {
            HierarchyError::Configuration(format!(
                "default delimiter {:?} is not one of `._:-/`",
                self.default_delimiter
            ))
        })?;

        if self.max_page_size == 0 {
            return Err(HierarchyError::Configuration(
                "max page size must be at least 1".into(),
            ));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(HierarchyError::Configuration(format!(
                "default page size {} must be between 1 and {}",
                self.default_page_size, self.max_page_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(HierarchyConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_delimiter_and_page_sizes() {
        let bad_delimiter = HierarchyConfig {
            default_delimiter: "::".into(),
            ..Default::default()
        };
        assert!(matches!(
            bad_delimiter.validate(),
            Err(HierarchyError::Configuration(_))
        ));

        let oversized_default = HierarchyConfig {
            default_page_size: 200,
            ..Default::default()
        };
        assert!(oversized_default.validate().is_err());
    }
}
