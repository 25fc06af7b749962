//! Dashboard counters over the full professor collection.
//!
//! These never look at the active filter.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::staleness::is_stale;
use crate::models::{Liaison, PipelineStatus, Professor};

/// Number of professors in each pipeline stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageCounts {
    #[serde(rename = "Identified")]
    pub identified: usize,
    #[serde(rename = "In Contact")]
    pub in_contact: usize,
    #[serde(rename = "First Lead")]
    pub first_lead: usize,
    #[serde(rename = "First Client")]
    pub first_client: usize,
}

impl StageCounts {
    /// Count for a single stage.
    pub fn get(&self, status: PipelineStatus) -> usize {
        match status {
            PipelineStatus::Identified => self.identified,
            PipelineStatus::InContact => self.in_contact,
            PipelineStatus::FirstLead => self.first_lead,
            PipelineStatus::FirstClient => self.first_client,
        }
    }

    fn bump(&mut self, status: PipelineStatus) {
        match status {
            PipelineStatus::Identified => self.identified += 1,
            PipelineStatus::InContact => self.in_contact += 1,
            PipelineStatus::FirstLead => self.first_lead += 1,
            PipelineStatus::FirstClient => self.first_client += 1,
        }
    }

    /// Iterate `(status, count)` in pipeline order.
    pub fn iter(&self) -> impl Iterator<Item = (PipelineStatus, usize)> + '_ {
        PipelineStatus::all().iter().map(move |s| (*s, self.get(*s)))
    }

    pub fn total(&self) -> usize {
        self.identified + self.in_contact + self.first_lead + self.first_client
    }
}

pub fn stage_counts(professors: &[Professor]) -> StageCounts {
    let mut counts = StageCounts::default();
    for professor in professors {
        counts.bump(professor.status);
    }
    counts
}

pub fn stale_count(professors: &[Professor], now: DateTime<Utc>) -> usize {
    professors
        .iter()
        .filter(|p| is_stale(p.last_contacted, now))
        .count()
}

/// Assigned liaisons present in the collection, deduplicated and sorted by label.
pub fn distinct_liaisons(professors: &[Professor]) -> Vec<Liaison> {
    let mut liaisons: Vec<Liaison> = professors
        .iter()
        .map(|p| p.liaison)
        .filter(Liaison::is_assigned)
        .collect();
    liaisons.sort_by_key(|l| l.as_str());
    liaisons.dedup();
    liaisons
}

/// Everything the dashboard header shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub stages: StageCounts,
    pub stale: usize,
    pub liaisons: Vec<Liaison>,
}

impl Summary {
    pub fn compute(professors: &[Professor], now: DateTime<Utc>) -> Self {
        Self {
            total: professors.len(),
            stages: stage_counts(professors),
            stale: stale_count(professors, now),
            liaisons: distinct_liaisons(professors),
        }
    }
}
