//! Tracker configuration.
//!
//! Every key has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! ledger_field = "history"
//! fields_to_track = ["name", "items.$.qty"]
//! fields_not_to_track = ["secret"]
//! limit = 50
//! log_level = "warn"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::root_segment;
use crate::errors::{Result, TrackError};
use crate::ledger::DEFAULT_LIMIT;
use crate::logger::LogLevel;
use crate::pattern::{is_excluded, FieldFilter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerConfig {
    /// Document field holding the ledger
    pub ledger_field: String,
    /// Field patterns to track; empty tracks everything not excluded
    pub fields_to_track: Vec<String>,
    /// Path prefixes never tracked
    pub fields_not_to_track: Vec<String>,
    /// Maximum number of ledger entries kept
    pub limit: usize,
    pub log_level: LogLevel,
    /// Field the direct-mutation protocol reads the actor from
    pub actor_field: String,
    pub display_field: String,
    pub id_field: String,
    /// Keys skipped at the top level and while recursing into objects
    pub ignored_keys: Vec<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            ledger_field: "history".to_string(),
            fields_to_track: Vec::new(),
            fields_not_to_track: Vec::new(),
            limit: DEFAULT_LIMIT,
            log_level: LogLevel::default(),
            actor_field: "_changedBy".to_string(),
            display_field: "_display".to_string(),
            id_field: "_id".to_string(),
            ignored_keys: vec!["_id".to_string(), "__v".to_string()],
        }
    }
}

impl TrackerConfig {
    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on a syntax error or unknown key.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| TrackError::InvalidConfig {
            reason: e.to_string(),
        })
    }

    /// Read and parse a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the file cannot be read or parsed.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| TrackError::InvalidConfig {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&source)
    }

    /// Check the config and compile its field filter.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an empty ledger, display or id field name,
    /// or `InvalidPattern` for the first pattern that does not compile.
    pub fn validate(&self) -> Result<FieldFilter> {
        for (key, value) in [
            ("ledger_field", &self.ledger_field),
            ("display_field", &self.display_field),
            ("id_field", &self.id_field),
        ] {
            if value.trim().is_empty() {
                return Err(TrackError::InvalidConfig {
                    reason: format!("{} must not be empty", key),
                });
            }
        }
        FieldFilter::new(&self.fields_to_track, &self.fields_not_to_track)
    }

    /// True if `path` belongs to the tracker's own bookkeeping rather than data.
    pub fn is_internal_path(&self, path: &str) -> bool {
        let root = root_segment(path);
        root == self.ledger_field
            || root == self.actor_field
            || root == self.display_field
            || self.ignored_keys.iter().any(|k| k == root)
    }

    /// True if `path` falls under a `fields_not_to_track` prefix.
    pub fn is_excluded(&self, path: &str) -> bool {
        is_excluded(path, &self.fields_not_to_track)
    }

    pub fn is_ignored_key(&self, key: &str) -> bool {
        key == self.display_field || self.ignored_keys.iter().any(|k| k == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.ledger_field, "history");
        assert_eq!(config.limit, 50);
        assert_eq!(config.log_level, LogLevel::Warn);
        assert!(config.fields_to_track.is_empty());
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(
            TrackerConfig::from_toml_str("").unwrap(),
            TrackerConfig::default()
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = TrackerConfig::from_toml_str("ledger = \"x\"").unwrap_err();
        assert!(matches!(err, TrackError::InvalidConfig { .. }));
    }

    #[test]
    fn test_validate_rejects_empty_ledger_field() {
        let config = TrackerConfig {
            ledger_field: " ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TrackError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_pattern() {
        let config = TrackerConfig {
            fields_to_track: vec!["items.$.(".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TrackError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_internal_paths() {
        let config = TrackerConfig::default();
        assert!(config.is_internal_path("history"));
        assert!(config.is_internal_path("history.0.action"));
        assert!(config.is_internal_path("_changedBy"));
        assert!(config.is_internal_path("__v"));
        assert!(!config.is_internal_path("name"));
    }
}
