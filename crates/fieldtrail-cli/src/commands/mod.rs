pub mod diff;
pub mod summary;

use std::path::Path;

use fieldtrail_core::errors::{ExError, ExErrorKind, ExResult};
use fieldtrail_core::{Document, TrackerConfig};

/// Read and parse a JSON document from disk
pub fn read_document(path: &Path) -> ExResult<Document> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        let kind = match e.kind() {
            std::io::ErrorKind::NotFound => ExErrorKind::NotFound,
            _ => ExErrorKind::Io,
        };
        ExError::new(kind)
            .with_op("read_document")
            .with_path(path.display().to_string())
            .with_message(e.to_string())
    })?;
    serde_json::from_str(&text).map_err(|e| {
        ExError::new(ExErrorKind::InvalidInput)
            .with_op("read_document")
            .with_path(path.display().to_string())
            .with_message(format!("not valid JSON: {}", e))
    })
}

/// Load tracker configuration from a TOML file, or use the defaults
pub fn load_config(path: Option<&Path>) -> ExResult<TrackerConfig> {
    match path {
        Some(path) => Ok(TrackerConfig::from_toml_file(path)?),
        None => Ok(TrackerConfig::default()),
    }
}
