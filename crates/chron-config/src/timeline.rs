//! Timeline widget options.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const fn default_page_size() -> u32 {
    25
}

const fn default_include_change_data() -> bool {
    true
}

const fn default_height() -> u32 {
    420
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimelineConfig {
    /// Audit records requested per page (`$top`).
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Select and parse `changedata`. Disabling skips payload parsing entirely.
    #[serde(default = "default_include_change_data")]
    pub include_change_data: bool,

    /// Expose the "load more" affordance when the host reports more pages.
    #[serde(default)]
    pub show_load_more: bool,

    #[serde(default)]
    pub enable_sort: bool,

    #[serde(default)]
    pub enable_column_sizing: bool,

    /// Display height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Cache the raw fallback when a record name lookup fails or comes back
    /// empty. Off by default so a transient failure is retried on next access.
    #[serde(default)]
    pub cache_failed_lookups: bool,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            include_change_data: default_include_change_data(),
            show_load_more: false,
            enable_sort: false,
            enable_column_sizing: false,
            height: default_height(),
            cache_failed_lookups: false,
        }
    }
}

impl TimelineConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when `page_size` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeline.page_size".into(),
                reason: "must be a positive integer".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = TimelineConfig::default();
        assert_eq!(config.page_size, 25);
        assert!(config.include_change_data);
        assert!(!config.show_load_more);
        assert!(!config.enable_sort);
        assert!(!config.enable_column_sizing);
        assert_eq!(config.height, 420);
        assert!(!config.cache_failed_lookups);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_page_size_rejected() {
        let config = TimelineConfig {
            page_size: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "timeline.page_size"));
    }
}
