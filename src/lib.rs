//! proftrack - A relationship tracker for outreach to professors.
//!
//! This library provides the core functionality for the `pt` CLI tool:
//! pipeline status, contact history, staleness tracking, and filtering over
//! records held in a local or hosted record store.

pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod session;
pub mod storage;
pub mod view;

use models::{ActivityLog, ValidationError};
use storage::StoreError;
use view::Action;


/// Library-level error type for proftrack operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("KDL error: {0}")]
    Kdl(#[from] kdl::KdlError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// A store call failed; the in-memory state was left unchanged.
    #[error("Failed to {action}: {source}")]
    ActionFailed {
        action: Action,
        #[source]
        source: StoreError,
    },

    /// The activity log was stored, but advancing last-contacted failed.
    #[error(
        "Activity log {} was saved but last-contacted was not updated: {source}",
        .log.id
    )]
    Inconsistency {
        log: Box<ActivityLog>,
        #[source]
        source: StoreError,
    },

    #[error("Not initialized: run `pt system init` first")]
    NotInitialized,

    #[error("Not logged in: run `pt login` first")]
    NotAuthenticated,

    #[error("Admin mode is off: run `pt admin` to enable editing")]
    AdminModeRequired,

    #[error("No shared secret configured: set PT_SHARED_SECRET or shared-secret in state.kdl")]
    NoSharedSecret,

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for proftrack operations.
pub type Result<T> = std::result::Result<T, Error>;
