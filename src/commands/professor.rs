//! Professor, activity log, and summary commands.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::{Output, json, open_view, session};
use crate::config::ResolvedSettings;
use crate::models::{
    ActivityLog, EngagementType, Liaison, LinkKind, ListField, PipelineStatus, Professor,
    ProfessorFields,
};
use crate::view::{FilterState, Selection, Summary};
use crate::{Error, Result};

fn format_contact(last_contacted: Option<DateTime<Utc>>) -> String {
    match last_contacted {
        Some(at) => at.format("%Y-%m-%d").to_string(),
        None => "never".to_string(),
    }
}

fn stale_marker(stale: bool) -> &'static str {
    if stale { " [stale]" } else { "" }
}

// === Single professor ===

#[derive(Serialize)]
pub struct ProfessorResult {
    #[serde(flatten)]
    pub professor: Professor,
    pub stale: bool,
}

impl ProfessorResult {
    fn new(professor: &Professor, now: DateTime<Utc>) -> Self {
        Self {
            professor: professor.clone(),
            stale: professor.is_stale_at(now),
        }
    }
}

impl Output for ProfessorResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let p = &self.professor;
        format!(
            "{} {} ({}){}",
            p.id,
            p.name,
            p.institution,
            stale_marker(self.stale)
        )
    }
}

/// Fields for `pt professor add`.
#[derive(Debug, Default)]
pub struct AddArgs {
    pub role: Option<String>,
    pub status: Option<PipelineStatus>,
    pub liaison: Option<Liaison>,
    pub engagement: Option<EngagementType>,
    pub core_ip: Vec<String>,
    pub notes: Option<String>,
    pub next_action: Option<String>,
}

pub fn professor_add(
    settings: &ResolvedSettings,
    name: &str,
    institution: &str,
    args: AddArgs,
) -> Result<ProfessorResult> {
    session(settings)?.require_admin()?;

    let mut fields = ProfessorFields::new(name, institution);
    if let Some(role) = args.role.filter(|r| !r.trim().is_empty()) {
        fields.role = role.trim().to_string();
    }
    if let Some(status) = args.status {
        fields.status = status;
    }
    if let Some(liaison) = args.liaison {
        fields.liaison = liaison;
    }
    if let Some(engagement) = args.engagement {
        fields.engagement_type = engagement;
    }
    for tag in &args.core_ip {
        fields.add_item(ListField::CoreIp, tag);
    }
    if let Some(notes) = args.notes {
        fields.notes = notes;
    }
    if let Some(next_action) = args.next_action {
        fields.next_action = next_action;
    }

    let mut view = open_view(settings)?;
    let professor = view.add_professor(fields)?;
    Ok(ProfessorResult::new(professor, Utc::now()))
}

/// Changes for `pt professor update`. Unset fields are left alone.
#[derive(Debug, Default)]
pub struct UpdateArgs {
    pub name: Option<String>,
    pub institution: Option<String>,
    pub role: Option<String>,
    pub status: Option<PipelineStatus>,
    pub liaison: Option<Liaison>,
    pub engagement: Option<EngagementType>,
    pub notes: Option<String>,
    pub next_action: Option<String>,
    pub contract_signed: Option<bool>,
    pub add_core_ip: Vec<String>,
    pub remove_core_ip: Vec<usize>,
    pub add_program: Vec<String>,
    pub remove_program: Vec<usize>,
    pub add_client: Vec<String>,
    pub remove_client: Vec<usize>,
    pub links: Vec<(LinkKind, String)>,
}

impl UpdateArgs {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.institution.is_none()
            && self.role.is_none()
            && self.status.is_none()
            && self.liaison.is_none()
            && self.engagement.is_none()
            && self.notes.is_none()
            && self.next_action.is_none()
            && self.contract_signed.is_none()
            && self.add_core_ip.is_empty()
            && self.remove_core_ip.is_empty()
            && self.add_program.is_empty()
            && self.remove_program.is_empty()
            && self.add_client.is_empty()
            && self.remove_client.is_empty()
            && self.links.is_empty()
    }

    /// Apply these changes on top of `fields`.
    pub fn apply(self, fields: &mut ProfessorFields) -> Result<()> {
        if let Some(name) = self.name {
            fields.name = name.trim().to_string();
        }
        if let Some(institution) = self.institution {
            fields.institution = institution.trim().to_string();
        }
        if let Some(role) = self.role {
            fields.role = role.trim().to_string();
        }
        if let Some(status) = self.status {
            fields.status = status;
        }
        if let Some(liaison) = self.liaison {
            fields.liaison = liaison;
        }
        if let Some(engagement) = self.engagement {
            fields.engagement_type = engagement;
        }
        if let Some(notes) = self.notes {
            fields.notes = notes;
        }
        if let Some(next_action) = self.next_action {
            fields.next_action = next_action;
        }
        if let Some(signed) = self.contract_signed {
            fields.contract_signed = signed;
        }

        remove_items(fields, ListField::CoreIp, self.remove_core_ip, "core-ip")?;
        remove_items(fields, ListField::ExecEdPrograms, self.remove_program, "program")?;
        remove_items(fields, ListField::Clients, self.remove_client, "client")?;

        for tag in &self.add_core_ip {
            fields.add_item(ListField::CoreIp, tag);
        }
        for program in &self.add_program {
            fields.add_item(ListField::ExecEdPrograms, program);
        }
        for client in &self.add_client {
            fields.add_item(ListField::Clients, client);
        }

        for (kind, url) in self.links {
            fields.links.set(kind, Some(url));
        }
        Ok(())
    }
}

/// Remove by index, highest first so earlier indexes stay valid.
fn remove_items(
    fields: &mut ProfessorFields,
    field: ListField,
    mut indexes: Vec<usize>,
    label: &str,
) -> Result<()> {
    indexes.sort_unstable();
    indexes.dedup();
    for index in indexes.into_iter().rev() {
        if fields.remove_item(field, index).is_none() {
            return Err(Error::InvalidInput(format!(
                "No {} at index {}",
                label, index
            )));
        }
    }
    Ok(())
}

pub fn professor_update(
    settings: &ResolvedSettings,
    id: &str,
    args: UpdateArgs,
) -> Result<ProfessorResult> {
    session(settings)?.require_admin()?;
    if args.is_empty() {
        return Err(Error::InvalidInput("No changes specified".to_string()));
    }

    let mut view = open_view(settings)?;
    let mut fields = view
        .professor(id)
        .ok_or_else(|| Error::NotFound(format!("Professor not found: {}", id)))?
        .fields();
    args.apply(&mut fields)?;

    let professor = view.update_professor(id, fields)?;
    Ok(ProfessorResult::new(professor, Utc::now()))
}

// === Listing ===

#[derive(Serialize)]
pub struct ProfessorRow {
    pub id: String,
    pub name: String,
    pub institution: String,
    pub status: PipelineStatus,
    pub liaison: Liaison,
    pub last_contacted: Option<DateTime<Utc>>,
    pub stale: bool,
}

#[derive(Serialize)]
pub struct ProfessorList {
    pub count: usize,
    pub total: usize,
    pub filter: FilterState,
    pub professors: Vec<ProfessorRow>,
}

impl Output for ProfessorList {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.professors.is_empty() {
            return if self.total == 0 {
                "No professors yet.".to_string()
            } else {
                format!("No professors match the current filters ({} total).", self.total)
            };
        }
        let mut lines = vec![
            format!("{} of {} professor(s):", self.count, self.total),
            String::new(),
        ];
        for row in &self.professors {
            let liaison = if row.liaison.is_assigned() {
                format!(" - {}", row.liaison)
            } else {
                String::new()
            };
            lines.push(format!(
                "{} {} ({}) [{}]{} last contact: {}{}",
                row.id,
                row.name,
                row.institution,
                row.status,
                liaison,
                format_contact(row.last_contacted),
                stale_marker(row.stale)
            ));
        }
        lines.join("\n")
    }
}

pub fn professor_list(settings: &ResolvedSettings, filter: FilterState) -> Result<ProfessorList> {
    session(settings)?.require_authenticated()?;

    let mut view = open_view(settings)?;
    view.set_filter(filter);
    let now = Utc::now();
    let professors: Vec<ProfessorRow> = view
        .visible(now)
        .into_iter()
        .map(|p| ProfessorRow {
            id: p.id.clone(),
            name: p.name.clone(),
            institution: p.institution.clone(),
            status: p.status,
            liaison: p.liaison,
            last_contacted: p.last_contacted,
            stale: p.is_stale_at(now),
        })
        .collect();

    Ok(ProfessorList {
        count: professors.len(),
        total: view.professors().len(),
        filter: view.filter().clone(),
        professors,
    })
}

/// Build a filter from `pt professor list` flags.
pub fn list_filter(
    search: Option<String>,
    status: Option<PipelineStatus>,
    liaison: Option<Liaison>,
    stale: bool,
) -> FilterState {
    FilterState {
        search_query: search.unwrap_or_default(),
        status: Selection::from(status),
        liaison: Selection::from(liaison),
        stale_only: stale,
    }
}

// === Detail ===

#[derive(Serialize)]
pub struct ProfessorDetail {
    #[serde(flatten)]
    pub professor: Professor,
    pub stale: bool,
    pub activity_logs: Vec<ActivityLog>,
}

impl Output for ProfessorDetail {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let p = &self.professor;
        let mut lines = vec![
            format!("{} {}{}", p.id, p.name, stale_marker(self.stale)),
            format!("  Institution: {}", p.institution),
            format!("  Role: {}", p.role),
            format!("  Status: {}", p.status),
            format!("  Liaison: {}", p.liaison),
            format!("  Engagement: {}", p.engagement_type),
            format!("  Contract signed: {}", if p.contract_signed { "yes" } else { "no" }),
            format!("  Last contact: {}", format_contact(p.last_contacted)),
        ];

        for (label, items) in [
            ("Core IP", &p.core_ip),
            ("Exec-ed programs", &p.exec_ed_programs),
            ("Clients", &p.clients),
        ] {
            if !items.is_empty() {
                lines.push(format!("  {}:", label));
                for (i, item) in items.iter().enumerate() {
                    lines.push(format!("    [{}] {}", i, item));
                }
            }
        }

        if !p.next_action.is_empty() {
            lines.push(format!("  Next action: {}", p.next_action));
        }
        if !p.notes.is_empty() {
            lines.push(format!("  Notes: {}", p.notes));
        }
        for (kind, url) in p.links.iter() {
            lines.push(format!("  {}: {}", kind, url));
        }

        lines.push(String::new());
        if self.activity_logs.is_empty() {
            lines.push("No activity logged.".to_string());
        } else {
            lines.push(format!("Activity ({}):", self.activity_logs.len()));
            for log in &self.activity_logs {
                lines.push(format!("  {} {} - {}", log.date, log.created_by, log.entry));
            }
        }
        lines.join("\n")
    }
}

pub fn professor_show(settings: &ResolvedSettings, id: &str) -> Result<ProfessorDetail> {
    session(settings)?.require_authenticated()?;

    let view = open_view(settings)?;
    let professor = view
        .professor(id)
        .ok_or_else(|| Error::NotFound(format!("Professor not found: {}", id)))?;
    Ok(ProfessorDetail {
        professor: professor.clone(),
        stale: professor.is_stale_at(Utc::now()),
        activity_logs: view.logs_for(id).to_vec(),
    })
}

// === Activity ===

#[derive(Serialize)]
pub struct ActivityAdded {
    #[serde(flatten)]
    pub log: ActivityLog,
    pub last_contacted: Option<DateTime<Utc>>,
}

impl Output for ActivityAdded {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!(
            "Logged activity {} for {} on {}: {}",
            self.log.id, self.log.professor_id, self.log.date, self.log.entry
        )
    }
}

pub fn activity_add(
    settings: &ResolvedSettings,
    professor_id: &str,
    entry: &str,
    date: Option<NaiveDate>,
    created_by: Option<&str>,
) -> Result<ActivityAdded> {
    session(settings)?.require_admin()?;

    let mut view = open_view(settings)?;
    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    let log = view.add_activity_log(professor_id, date, entry, created_by)?;
    let last_contacted = view.professor(professor_id).and_then(|p| p.last_contacted);
    Ok(ActivityAdded { log, last_contacted })
}

#[derive(Serialize)]
pub struct ActivityList {
    pub professor_id: String,
    pub count: usize,
    pub activity_logs: Vec<ActivityLog>,
}

impl Output for ActivityList {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.activity_logs.is_empty() {
            return format!("No activity logged for {}.", self.professor_id);
        }
        let mut lines = vec![format!("{} activity log(s):", self.count)];
        for log in &self.activity_logs {
            lines.push(format!("  {} {} {} - {}", log.id, log.date, log.created_by, log.entry));
        }
        lines.join("\n")
    }
}

pub fn activity_list(settings: &ResolvedSettings, professor_id: &str) -> Result<ActivityList> {
    session(settings)?.require_authenticated()?;

    let view = open_view(settings)?;
    if view.professor(professor_id).is_none() {
        return Err(Error::NotFound(format!("Professor not found: {}", professor_id)));
    }
    let activity_logs = view.logs_for(professor_id).to_vec();
    Ok(ActivityList {
        professor_id: professor_id.to_string(),
        count: activity_logs.len(),
        activity_logs,
    })
}

// === Summary ===

#[derive(Serialize)]
pub struct SummaryResult {
    #[serde(flatten)]
    pub summary: Summary,
}

impl Output for SummaryResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!("{} professor(s)", self.summary.total)];
        for (status, count) in self.summary.stages.iter() {
            lines.push(format!("  {:<13} {}", status.as_str(), count));
        }
        lines.push(format!("  {:<13} {}", "Stale (30d+)", self.summary.stale));
        if !self.summary.liaisons.is_empty() {
            let names: Vec<&str> = self.summary.liaisons.iter().map(|l| l.as_str()).collect();
            lines.push(format!("Liaisons: {}", names.join(", ")));
        }
        lines.join("\n")
    }
}

pub fn summary(settings: &ResolvedSettings) -> Result<SummaryResult> {
    session(settings)?.require_authenticated()?;

    let view = open_view(settings)?;
    Ok(SummaryResult {
        summary: view.summary(Utc::now()),
    })
}
