//! In-memory view over the record store.
//!
//! [`ViewState`] owns the loaded professors and their activity logs and is the
//! only thing that mutates them. Every write goes to the store first; the
//! in-memory copy is changed only after the store confirms, and then with the
//! record the store returned rather than the one that was sent.
//!
//! Filtering and dashboard counters are pure functions over the collection
//! (see [`filter`] and [`aggregate`]), exposed here as read-only projections.

pub mod aggregate;
pub mod filter;
pub mod staleness;

pub use aggregate::{StageCounts, Summary, distinct_liaisons, stage_counts, stale_count};
pub use filter::{FilterState, Selection, filter_professors};
pub use staleness::{STALE_WINDOW_DAYS, is_stale};

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::fmt;

use crate::models::{
    ActivityLog, NewActivityLog, Professor, ProfessorFields, default_created_by,
};
use crate::storage::{RecordStore, StoreError};
use crate::{Error, Result};

/// A user action that reaches the store, named in failure messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Load,
    AddProfessor,
    SaveChanges,
    AddActivityLog,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Load => "load professors",
            Action::AddProfessor => "add professor",
            Action::SaveChanges => "save changes",
            Action::AddActivityLog => "add activity log",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn action_failed(action: Action, source: StoreError) -> Error {
    tracing::error!(action = %action, error = %source, "store call failed");
    Error::ActionFailed { action, source }
}

fn sort_professors(professors: &mut [Professor]) {
    professors.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Group logs by professor, each list newest-first by date then creation time.
fn index_logs(logs: Vec<ActivityLog>) -> HashMap<String, Vec<ActivityLog>> {
    let mut index: HashMap<String, Vec<ActivityLog>> = HashMap::new();
    for log in logs {
        index.entry(log.professor_id.clone()).or_default().push(log);
    }
    for list in index.values_mut() {
        list.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
    }
    index
}

/// Owned state container for professors, activity logs, and the active filter.
pub struct ViewState<S: RecordStore> {
    store: S,
    professors: Vec<Professor>,
    logs_by_professor: HashMap<String, Vec<ActivityLog>>,
    filter: FilterState,
    version: u64,
}

impl<S: RecordStore> ViewState<S> {
    /// Create an empty view over `store`. Call [`ViewState::load`] to populate it.
    pub fn new(store: S) -> Self {
        Self {
            store,
            professors: Vec::new(),
            logs_by_professor: HashMap::new(),
            filter: FilterState::default(),
            version: 0,
        }
    }

    /// Fetch both collections and replace the in-memory copies.
    ///
    /// On failure nothing is replaced.
    pub fn load(&mut self) -> Result<()> {
        let mut professors = self
            .store
            .list_professors()
            .map_err(|e| action_failed(Action::Load, e))?;
        let logs = self
            .store
            .list_activity_logs()
            .map_err(|e| action_failed(Action::Load, e))?;

        sort_professors(&mut professors);
        tracing::debug!(
            professors = professors.len(),
            logs = logs.len(),
            location = %self.store.location(),
            "loaded records"
        );
        self.professors = professors;
        self.logs_by_professor = index_logs(logs);
        self.version += 1;
        Ok(())
    }

    /// Create a professor and insert the stored record.
    pub fn add_professor(&mut self, fields: ProfessorFields) -> Result<&Professor> {
        fields.validate()?;
        let created = self
            .store
            .create_professor(&fields)
            .map_err(|e| action_failed(Action::AddProfessor, e))?;

        let id = created.id.clone();
        self.professors.push(created);
        sort_professors(&mut self.professors);
        self.version += 1;
        self.professor(&id)
            .ok_or_else(|| Error::NotFound(format!("Professor not found: {}", id)))
    }

    /// Overwrite a professor's writable fields.
    ///
    /// The in-memory record is replaced by the store's copy, not merged.
    pub fn update_professor(&mut self, id: &str, fields: ProfessorFields) -> Result<&Professor> {
        let index = self.position(id)?;
        fields.validate()?;
        let updated = self
            .store
            .update_professor(id, &fields)
            .map_err(|e| action_failed(Action::SaveChanges, e))?;

        self.professors[index] = updated;
        sort_professors(&mut self.professors);
        self.version += 1;
        self.professor(id)
            .ok_or_else(|| Error::NotFound(format!("Professor not found: {}", id)))
    }

    /// Record an interaction and advance the professor's last-contacted time.
    ///
    /// `created_by` defaults to the professor's liaison, or "Team".
    pub fn add_activity_log(
        &mut self,
        professor_id: &str,
        date: NaiveDate,
        entry: &str,
        created_by: Option<&str>,
    ) -> Result<ActivityLog> {
        self.add_activity_log_at(professor_id, date, entry, created_by, Utc::now())
    }

    /// Like [`ViewState::add_activity_log`], with `now` as the contact instant.
    ///
    /// The log insert completes before the professor update is sent. If the
    /// update fails the log stays in the list, `last_contacted` is unchanged,
    /// and [`Error::Inconsistency`] is returned.
    pub fn add_activity_log_at(
        &mut self,
        professor_id: &str,
        date: NaiveDate,
        entry: &str,
        created_by: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ActivityLog> {
        let index = self.position(professor_id)?;
        let created_by = match created_by.map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => name.to_string(),
            None => default_created_by(self.professors[index].liaison),
        };
        let new_log = NewActivityLog::new(professor_id, date, entry, created_by);
        new_log.validate()?;

        let log = self
            .store
            .create_activity_log(&new_log)
            .map_err(|e| action_failed(Action::AddActivityLog, e))?;

        let mut fields = self.professors[index].fields();
        fields.last_contacted = Some(now);
        let touched = self.store.update_professor(professor_id, &fields);

        self.logs_by_professor
            .entry(professor_id.to_string())
            .or_default()
            .insert(0, log.clone());
        self.version += 1;

        match touched {
            Ok(updated) => {
                self.professors[index] = updated;
                Ok(log)
            }
            Err(source) => {
                tracing::warn!(
                    log_id = %log.id,
                    professor_id,
                    error = %source,
                    "activity log saved but last-contacted update failed"
                );
                Err(Error::Inconsistency {
                    log: Box::new(log),
                    source,
                })
            }
        }
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.professors
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Error::NotFound(format!("Professor not found: {}", id)))
    }

    /// All professors, sorted by name.
    pub fn professors(&self) -> &[Professor] {
        &self.professors
    }

    pub fn professor(&self, id: &str) -> Option<&Professor> {
        self.professors.iter().find(|p| p.id == id)
    }

    /// Activity logs for a professor, newest first.
    pub fn logs_for(&self, id: &str) -> &[ActivityLog] {
        self.logs_by_professor
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Professors passing the current filter at `now`.
    pub fn visible(&self, now: DateTime<Utc>) -> Vec<&Professor> {
        filter_professors(&self.professors, &self.filter, now)
    }

    /// Counters over the whole collection, ignoring the filter.
    pub fn summary(&self, now: DateTime<Utc>) -> Summary {
        Summary::compute(&self.professors, now)
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: FilterState) {
        self.filter = filter;
    }

    /// Bumped on every applied mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}
