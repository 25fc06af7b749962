//! Storage layer for proftrack data.
//!
//! This module handles persistence of professors and activity logs.
//!
//! ## Record Stores
//!
//! proftrack supports two record stores behind the [`RecordStore`] trait:
//!
//! - **SQLite store** (default): `~/.local/share/proftrack/proftrack.db`
//! - **REST store**: a hosted PostgREST endpoint (`<url>/rest/v1/...`), such as Supabase
//!
//! Both stores apply an explicit timeout to every call. A timeout surfaces as
//! [`StoreError::Timeout`] and is handled like any other failure.

pub mod backend;
pub mod rest;
pub mod sqlite;

pub use backend::{BackendType, RecordStore};
pub use rest::RestStore;
pub use sqlite::SqliteStore;

use crate::models::ValidationError;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "PT_DATA_DIR";

/// File name of the SQLite database inside the data directory.
pub const DB_FILE_NAME: &str = "proftrack.db";

/// Default timeout applied to each store call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors returned by a record store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Backend returned HTTP {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Malformed record: {0}")]
    Malformed(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type alias for store calls.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Everything needed to open a record store.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub backend: BackendType,
    /// Directory holding the SQLite database
    pub data_dir: PathBuf,
    /// Base URL of the REST backend
    pub rest_url: Option<String>,
    /// API key sent to the REST backend
    pub api_key: Option<String>,
    pub timeout: Duration,
}

/// Open the configured record store.
pub fn open_store(settings: &StoreSettings) -> Result<Box<dyn RecordStore>> {
    match settings.backend {
        BackendType::Sqlite => {
            let path = settings.data_dir.join(DB_FILE_NAME);
            if !path.exists() {
                return Err(Error::NotInitialized);
            }
            Ok(Box::new(SqliteStore::open(&path, settings.timeout)?))
        }
        BackendType::Rest => {
            let url = settings.rest_url.as_deref().ok_or_else(|| {
                Error::InvalidInput("backend \"rest\" requires rest-url to be set".to_string())
            })?;
            let api_key = settings.api_key.as_deref().ok_or_else(|| {
                Error::InvalidInput(
                    "backend \"rest\" requires an api key (PT_API_KEY or api-key in state.kdl)"
                        .to_string(),
                )
            })?;
            Ok(Box::new(RestStore::new(url, api_key, settings.timeout)))
        }
    }
}

/// Get the data directory.
///
/// `PT_DATA_DIR` wins; otherwise `~/.local/share/proftrack/`.
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let data_dir = dirs::data_dir()
        .ok_or_else(|| Error::Other("Could not determine data directory".to_string()))?;
    Ok(data_dir.join("proftrack"))
}

/// Check if a local database exists in `data_dir`.
pub fn store_exists(data_dir: &Path) -> bool {
    data_dir.join(DB_FILE_NAME).exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn settings(data_dir: &Path, backend: BackendType) -> StoreSettings {
        StoreSettings {
            backend,
            data_dir: data_dir.to_path_buf(),
            rest_url: None,
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[test]
    fn test_open_store_requires_init() {
        let temp = TempDir::new().unwrap();
        let result = open_store(&settings(temp.path(), BackendType::Sqlite));
        assert!(matches!(result, Err(Error::NotInitialized)));
    }

    #[test]
    fn test_open_store_sqlite_after_init() {
        let temp = TempDir::new().unwrap();
        SqliteStore::init(temp.path(), DEFAULT_TIMEOUT).unwrap();
        assert!(store_exists(temp.path()));

        let store = open_store(&settings(temp.path(), BackendType::Sqlite)).unwrap();
        assert_eq!(store.backend_type(), "sqlite");
        assert!(store.list_professors().unwrap().is_empty());
    }

    #[test]
    fn test_open_store_rest_requires_url_and_key() {
        let temp = TempDir::new().unwrap();
        let mut s = settings(temp.path(), BackendType::Rest);
        assert!(matches!(open_store(&s), Err(Error::InvalidInput(_))));

        s.rest_url = Some("https://example.supabase.co".to_string());
        assert!(matches!(open_store(&s), Err(Error::InvalidInput(_))));

        s.api_key = Some("anon-key".to_string());
        let store = open_store(&s).unwrap();
        assert_eq!(store.backend_type(), "rest");
        assert_eq!(store.location(), "https://example.supabase.co/rest/v1");
    }

    #[test]
    fn test_timeout_error_message() {
        let err = StoreError::Timeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "Request timed out after 10s");
    }
}
