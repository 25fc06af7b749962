//! Filter engine over the in-memory professor collection.
//!
//! The visible subset is the AND of four independent predicates. Input order
//! is preserved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::staleness::is_stale;
use crate::models::{Liaison, PipelineStatus, Professor};

/// Either every value, or exactly one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Selection<T> {
    /// Returns true if `value` passes this selection.
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => wanted == value,
        }
    }
}

impl<T> From<Option<T>> for Selection<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Selection::All, Selection::Only)
    }
}

/// Search and filter controls for the professor list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// Case-insensitive substring; empty matches everything
    pub search_query: String,
    pub status: Selection<PipelineStatus>,
    pub liaison: Selection<Liaison>,
    /// Only show professors with no contact inside the window
    pub stale_only: bool,
}

impl FilterState {
    /// Returns true if no control narrows the list.
    pub fn is_empty(&self) -> bool {
        self.search_query.is_empty()
            && self.status == Selection::All
            && self.liaison == Selection::All
            && !self.stale_only
    }
}

/// Name, institution, or any core expertise tag contains the query.
pub fn matches_search(professor: &Professor, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let query = query.to_lowercase();
    professor.name.to_lowercase().contains(&query)
        || professor.institution.to_lowercase().contains(&query)
        || professor
            .core_ip
            .iter()
            .any(|tag| tag.to_lowercase().contains(&query))
}

pub fn matches_status(professor: &Professor, status: &Selection<PipelineStatus>) -> bool {
    status.matches(&professor.status)
}

pub fn matches_liaison(professor: &Professor, liaison: &Selection<Liaison>) -> bool {
    liaison.matches(&professor.liaison)
}

pub fn matches_stale(professor: &Professor, stale_only: bool, now: DateTime<Utc>) -> bool {
    !stale_only || is_stale(professor.last_contacted, now)
}

/// Compute the visible subset of `professors` under `filter` at `now`.
pub fn filter_professors<'a>(
    professors: &'a [Professor],
    filter: &FilterState,
    now: DateTime<Utc>,
) -> Vec<&'a Professor> {
    professors
        .iter()
        .filter(|p| matches_search(p, &filter.search_query))
        .filter(|p| matches_status(p, &filter.status))
        .filter(|p| matches_liaison(p, &filter.liaison))
        .filter(|p| matches_stale(p, filter.stale_only, now))
        .collect()
}
