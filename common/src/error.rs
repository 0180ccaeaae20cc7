//! エラー型定義

use crate::template::TemplateError;
use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Unknown catalog item: {category}/{item_name}")]
    UnknownItem { category: String, item_name: String },

    #[error("Unknown item instance: {0}")]
    UnknownInstance(String),

    #[error("The first instance of an item cannot be deleted: {0}")]
    BaseInstance(String),

    #[error("Invalid instance id: {0}")]
    InvalidInstanceId(String),

    #[error("Estimate error: {0}")]
    Estimate(String),

    #[error("Unsupported state version: {found} (supported up to {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = Error::Io(io_error);
        let display = format!("{}", error);
        assert!(display.contains("IO error"));
        assert!(display.contains("file not found"));
    }

    #[test]
    fn test_error_display_unknown_item() {
        let error = Error::UnknownItem {
            category: "Mold".to_string(),
            item_name: "Bleach".to_string(),
        };
        assert_eq!(format!("{}", error), "Unknown catalog item: Mold/Bleach");
    }

    #[test]
    fn test_error_display_version() {
        let error = Error::UnsupportedVersion { found: 9, supported: 1 };
        let display = format!("{}", error);
        assert!(display.contains("9"));
        assert!(display.contains("supported up to 1"));
    }

    #[test]
    fn test_error_from_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Json(_)));
    }

    #[test]
    fn test_error_from_template() {
        let error: Error = TemplateError::UnknownPlaceholder("cost".to_string()).into();
        assert!(matches!(error, Error::Template(_)));
        assert!(format!("{}", error).contains("cost"));
    }
}
