//! Record store trait and backend selection.
//!
//! This module provides the contract every record store implements:
//! - `SqliteStore` - Local SQLite database (default)
//! - `RestStore` - Hosted PostgREST-style backend over HTTPS

use super::StoreResult;
use crate::models::{ActivityLog, NewActivityLog, Professor, ProfessorFields};

/// Trait for stores that persist professors and their activity logs.
///
/// Implementations are the durable source of truth. Every returned record is
/// the store's canonical copy, including store-assigned ids and timestamps.
pub trait RecordStore {
    /// List all professors, sorted by name ascending.
    fn list_professors(&self) -> StoreResult<Vec<Professor>>;

    /// List all activity logs, in any order.
    fn list_activity_logs(&self) -> StoreResult<Vec<ActivityLog>>;

    /// Insert a professor and return the stored record.
    fn create_professor(&mut self, fields: &ProfessorFields) -> StoreResult<Professor>;

    /// Overwrite every writable field of an existing professor.
    fn update_professor(&mut self, id: &str, fields: &ProfessorFields) -> StoreResult<Professor>;

    /// Insert an activity log and return the stored record.
    fn create_activity_log(&mut self, log: &NewActivityLog) -> StoreResult<ActivityLog>;

    /// Get the storage location description (for display purposes).
    fn location(&self) -> String;

    /// Get the backend type name.
    fn backend_type(&self) -> &'static str;
}

impl<T: RecordStore + ?Sized> RecordStore for Box<T> {
    fn list_professors(&self) -> StoreResult<Vec<Professor>> {
        (**self).list_professors()
    }

    fn list_activity_logs(&self) -> StoreResult<Vec<ActivityLog>> {
        (**self).list_activity_logs()
    }

    fn create_professor(&mut self, fields: &ProfessorFields) -> StoreResult<Professor> {
        (**self).create_professor(fields)
    }

    fn update_professor(&mut self, id: &str, fields: &ProfessorFields) -> StoreResult<Professor> {
        (**self).update_professor(id, fields)
    }

    fn create_activity_log(&mut self, log: &NewActivityLog) -> StoreResult<ActivityLog> {
        (**self).create_activity_log(log)
    }

    fn location(&self) -> String {
        (**self).location()
    }

    fn backend_type(&self) -> &'static str {
        (**self).backend_type()
    }
}

/// Available record store types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendType {
    /// Local SQLite database - ~/.local/share/proftrack/proftrack.db
    #[default]
    Sqlite,
    /// Hosted PostgREST endpoint (e.g. Supabase)
    Rest,
}

impl BackendType {
    /// Parse a backend type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" | "local" | "default" => Some(Self::Sqlite),
            "rest" | "postgrest" | "supabase" | "remote" => Some(Self::Rest),
            _ => None,
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Rest => "rest",
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
