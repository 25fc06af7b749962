//! Local SQLite record store.
//!
//! List columns and links are stored as JSON text. Enum columns hold the
//! display labels so the database reads the same as the hosted backend.

use super::{DB_FILE_NAME, RecordStore, StoreError, StoreResult};
use crate::models::{
    ActivityLog, EngagementType, Liaison, NewActivityLog, PipelineStatus, Professor,
    ProfessorFields, ProfessorLinks,
};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

const PROFESSOR_COLUMNS: &str = "id, name, institution, role, core_ip, exec_ed_programs, notes, \
     status, clients, liaison, next_action, contract_signed, engagement_type, links, \
     last_contacted, created_at, updated_at";

/// Record store backed by a local SQLite database.
pub struct SqliteStore {
    path: PathBuf,
    conn: Connection,
}

impl SqliteStore {
    /// Open an existing database file.
    pub fn open(path: &Path, timeout: Duration) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(timeout)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::init_schema(&conn)?;
        Ok(Self {
            path: path.to_path_buf(),
            conn,
        })
    }

    /// Create the data directory and database if needed.
    pub fn init(data_dir: &Path, timeout: Duration) -> StoreResult<Self> {
        fs::create_dir_all(data_dir).map_err(|e| {
            StoreError::Transport(format!("Could not create {}: {}", data_dir.display(), e))
        })?;
        Self::open(&data_dir.join(DB_FILE_NAME), timeout)
    }

    /// Open an in-memory database (tests and dry runs).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::init_schema(&conn)?;
        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    fn init_schema(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS professors (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                institution TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT '',
                core_ip TEXT NOT NULL DEFAULT '[]',
                exec_ed_programs TEXT NOT NULL DEFAULT '[]',
                notes TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'Identified',
                clients TEXT NOT NULL DEFAULT '[]',
                liaison TEXT NOT NULL DEFAULT '',
                next_action TEXT NOT NULL DEFAULT '',
                contract_signed INTEGER NOT NULL DEFAULT 0,
                engagement_type TEXT NOT NULL DEFAULT 'Unknown',
                links TEXT NOT NULL DEFAULT '{}',
                last_contacted TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS activity_logs (
                id TEXT PRIMARY KEY,
                professor_id TEXT NOT NULL,
                date TEXT NOT NULL,
                entry TEXT NOT NULL,
                created_by TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                FOREIGN KEY (professor_id) REFERENCES professors(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_professors_name ON professors(name COLLATE NOCASE);
            CREATE INDEX IF NOT EXISTS idx_professors_status ON professors(status);
            CREATE INDEX IF NOT EXISTS idx_activity_logs_professor ON activity_logs(professor_id);
            "#,
        )?;
        Ok(())
    }

    fn get_professor(&self, id: &str) -> StoreResult<Professor> {
        let sql = format!("SELECT {} FROM professors WHERE id = ?1", PROFESSOR_COLUMNS);
        let raw = self
            .conn
            .query_row(&sql, [id], RawProfessor::from_row)
            .optional()?;
        match raw {
            Some(raw) => raw.into_professor(),
            None => Err(StoreError::NotFound(format!("Professor not found: {}", id))),
        }
    }

    fn professor_exists(&self, id: &str) -> StoreResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM professors WHERE id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

impl RecordStore for SqliteStore {
    fn list_professors(&self) -> StoreResult<Vec<Professor>> {
        let sql = format!(
            "SELECT {} FROM professors ORDER BY name COLLATE NOCASE ASC, id ASC",
            PROFESSOR_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], RawProfessor::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RawProfessor::into_professor).collect()
    }

    fn list_activity_logs(&self) -> StoreResult<Vec<ActivityLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, professor_id, date, entry, created_by, created_at
             FROM activity_logs ORDER BY date DESC, created_at DESC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, professor_id, date, entry, created_by, created_at)| {
                Ok(ActivityLog {
                    id,
                    professor_id,
                    date: parse_date(&date)?,
                    entry,
                    created_by,
                    created_at: parse_timestamp(&created_at)?,
                })
            })
            .collect()
    }

    fn create_professor(&mut self, fields: &ProfessorFields) -> StoreResult<Professor> {
        fields.validate()?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        self.conn.execute(
            r#"
            INSERT INTO professors
            (id, name, institution, role, core_ip, exec_ed_programs, notes, status, clients,
             liaison, next_action, contract_signed, engagement_type, links, last_contacted,
             created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?16)
            "#,
            params![
                id,
                fields.name.trim(),
                fields.institution.trim(),
                fields.role,
                to_json(&fields.core_ip)?,
                to_json(&fields.exec_ed_programs)?,
                fields.notes,
                fields.status.as_str(),
                to_json(&fields.clients)?,
                fields.liaison.as_str(),
                fields.next_action,
                fields.contract_signed,
                fields.engagement_type.as_str(),
                to_json(&fields.links)?,
                fields.last_contacted.map(|t| t.to_rfc3339()),
                now.to_rfc3339(),
            ],
        )?;
        tracing::debug!(id = %id, name = %fields.name, "inserted professor");

        self.get_professor(&id)
    }

    fn update_professor(&mut self, id: &str, fields: &ProfessorFields) -> StoreResult<Professor> {
        fields.validate()?;

        let changed = self.conn.execute(
            r#"
            UPDATE professors SET
                name = ?2, institution = ?3, role = ?4, core_ip = ?5, exec_ed_programs = ?6,
                notes = ?7, status = ?8, clients = ?9, liaison = ?10, next_action = ?11,
                contract_signed = ?12, engagement_type = ?13, links = ?14,
                last_contacted = ?15, updated_at = ?16
            WHERE id = ?1
            "#,
            params![
                id,
                fields.name.trim(),
                fields.institution.trim(),
                fields.role,
                to_json(&fields.core_ip)?,
                to_json(&fields.exec_ed_programs)?,
                fields.notes,
                fields.status.as_str(),
                to_json(&fields.clients)?,
                fields.liaison.as_str(),
                fields.next_action,
                fields.contract_signed,
                fields.engagement_type.as_str(),
                to_json(&fields.links)?,
                fields.last_contacted.map(|t| t.to_rfc3339()),
                Utc::now().to_rfc3339(),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("Professor not found: {}", id)));
        }
        tracing::debug!(id = %id, "updated professor");

        self.get_professor(id)
    }

    fn create_activity_log(&mut self, log: &NewActivityLog) -> StoreResult<ActivityLog> {
        log.validate()?;
        if !self.professor_exists(&log.professor_id)? {
            return Err(StoreError::NotFound(format!(
                "Professor not found: {}",
                log.professor_id
            )));
        }

        let stored = ActivityLog {
            id: Uuid::new_v4().to_string(),
            professor_id: log.professor_id.clone(),
            date: log.date,
            entry: log.entry.trim().to_string(),
            created_by: log.created_by.clone(),
            created_at: Utc::now(),
        };
        self.conn.execute(
            "INSERT INTO activity_logs (id, professor_id, date, entry, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                stored.id,
                stored.professor_id,
                stored.date.format("%Y-%m-%d").to_string(),
                stored.entry,
                stored.created_by,
                stored.created_at.to_rfc3339(),
            ],
        )?;
        tracing::debug!(
            id = %stored.id,
            professor_id = %stored.professor_id,
            "inserted activity log"
        );

        Ok(stored)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn backend_type(&self) -> &'static str {
        "sqlite"
    }
}

/// Column values as stored, before enum and timestamp parsing.
struct RawProfessor {
    id: String,
    name: String,
    institution: String,
    role: String,
    core_ip: String,
    exec_ed_programs: String,
    notes: String,
    status: String,
    clients: String,
    liaison: String,
    next_action: String,
    contract_signed: bool,
    engagement_type: String,
    links: String,
    last_contacted: Option<String>,
    created_at: String,
    updated_at: String,
}

impl RawProfessor {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            institution: row.get(2)?,
            role: row.get(3)?,
            core_ip: row.get(4)?,
            exec_ed_programs: row.get(5)?,
            notes: row.get(6)?,
            status: row.get(7)?,
            clients: row.get(8)?,
            liaison: row.get(9)?,
            next_action: row.get(10)?,
            contract_signed: row.get(11)?,
            engagement_type: row.get(12)?,
            links: row.get(13)?,
            last_contacted: row.get(14)?,
            created_at: row.get(15)?,
            updated_at: row.get(16)?,
        })
    }

    fn into_professor(self) -> StoreResult<Professor> {
        let malformed = |e: crate::models::ValidationError| {
            StoreError::Malformed(format!("professor {}: {}", self.id, e))
        };
        let status: PipelineStatus = self.status.parse().map_err(malformed)?;
        let liaison: Liaison = self.liaison.parse().map_err(malformed)?;
        let engagement_type: EngagementType = self.engagement_type.parse().map_err(malformed)?;
        let links: ProfessorLinks = from_json(&self.links)?;

        Ok(Professor {
            name: self.name,
            institution: self.institution,
            role: self.role,
            core_ip: from_json(&self.core_ip)?,
            exec_ed_programs: from_json(&self.exec_ed_programs)?,
            notes: self.notes,
            status,
            clients: from_json(&self.clients)?,
            liaison,
            next_action: self.next_action,
            contract_signed: self.contract_signed,
            engagement_type,
            links,
            last_contacted: self
                .last_contacted
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            id: self.id,
        })
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> StoreResult<String> {
    serde_json::to_string(value).map_err(|e| StoreError::Malformed(e.to_string()))
}

fn from_json<T: serde::de::DeserializeOwned>(text: &str) -> StoreResult<T> {
    serde_json::from_str(text).map_err(|e| StoreError::Malformed(e.to_string()))
}

fn parse_timestamp(s: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Malformed(format!("timestamp {:?}: {}", s, e)))
}

fn parse_date(s: &str) -> StoreResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| StoreError::Malformed(format!("date {:?}: {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LinkKind;
    use tempfile::TempDir;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_init_creates_database_file() {
        let temp = TempDir::new().unwrap();
        let data_dir = temp.path().join("nested");
        SqliteStore::init(&data_dir, Duration::from_secs(1)).unwrap();
        assert!(data_dir.join(DB_FILE_NAME).exists());
    }

    #[test]
    fn test_create_and_list_professor() {
        let mut store = store();
        let created = store
            .create_professor(&ProfessorFields::new("Alice Chen", "Acme School"))
            .unwrap();
        assert!(!created.id.is_empty());
        assert_eq!(created.created_at, created.updated_at);

        let all = store.list_professors().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], created);
    }

    #[test]
    fn test_create_rejects_missing_name() {
        let mut store = store();
        let result = store.create_professor(&ProfessorFields::new(" ", "Acme"));
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert!(store.list_professors().unwrap().is_empty());
    }

    #[test]
    fn test_list_sorted_by_name_case_insensitive() {
        let mut store = store();
        for name in ["carol", "Alice", "bob"] {
            store
                .create_professor(&ProfessorFields::new(name, "Uni"))
                .unwrap();
        }
        let names: Vec<String> = store
            .list_professors()
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Alice", "bob", "carol"]);
    }

    #[test]
    fn test_fields_survive_storage() {
        let mut store = store();
        let mut fields = ProfessorFields::new("Dana", "Tech");
        fields.status = PipelineStatus::FirstLead;
        fields.liaison = Liaison::Melanie;
        fields.engagement_type = EngagementType::OpenToWork;
        fields.core_ip = vec!["Negotiation Strategy".to_string(), "Pricing".to_string()];
        fields.clients = vec!["Globex".to_string()];
        fields.contract_signed = true;
        fields
            .links
            .set(LinkKind::Linkedin, Some("https://linkedin.com/in/dana".to_string()));
        fields.last_contacted = Some(Utc::now());

        let created = store.create_professor(&fields).unwrap();
        let listed = store.list_professors().unwrap().remove(0);
        assert_eq!(listed, created);
        assert_eq!(listed.fields().status, PipelineStatus::FirstLead);
        assert_eq!(listed.links.get(LinkKind::Linkedin), Some("https://linkedin.com/in/dana"));
    }

    #[test]
    fn test_update_overwrites_fields() {
        let mut store = store();
        let created = store
            .create_professor(&ProfessorFields::new("Erin", "Uni"))
            .unwrap();

        let mut fields = created.fields();
        fields.notes = "Prefers email".to_string();
        fields.status = PipelineStatus::InContact;
        let updated = store.update_professor(&created.id, &fields).unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.notes, "Prefers email");
        assert_eq!(updated.status, PipelineStatus::InContact);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[test]
    fn test_update_unknown_id() {
        let mut store = store();
        let result = store.update_professor("missing", &ProfessorFields::new("X", "Y"));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_activity_logs_roundtrip_newest_first() {
        let mut store = store();
        let prof = store
            .create_professor(&ProfessorFields::new("Finn", "Uni"))
            .unwrap();

        store
            .create_activity_log(&NewActivityLog::new(
                &prof.id,
                date(2026, 1, 5),
                "Intro call",
                "Team",
            ))
            .unwrap();
        let newest = store
            .create_activity_log(&NewActivityLog::new(
                &prof.id,
                date(2026, 2, 1),
                "Follow-up",
                "Sara",
            ))
            .unwrap();

        let logs = store.list_activity_logs().unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0], newest);
        assert_eq!(logs[1].entry, "Intro call");
    }

    #[test]
    fn test_activity_log_unknown_professor() {
        let mut store = store();
        let result = store.create_activity_log(&NewActivityLog::new(
            "missing",
            date(2026, 1, 1),
            "Hello",
            "Team",
        ));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_activity_log_rejects_empty_entry() {
        let mut store = store();
        let prof = store
            .create_professor(&ProfessorFields::new("Gail", "Uni"))
            .unwrap();
        let result = store.create_activity_log(&NewActivityLog::new(
            &prof.id,
            date(2026, 1, 1),
            "  ",
            "Team",
        ));
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_corrupt_status_is_malformed() {
        let mut store = store();
        let prof = store
            .create_professor(&ProfessorFields::new("Hal", "Uni"))
            .unwrap();
        store
            .conn
            .execute("UPDATE professors SET status = 'Ghosted' WHERE id = ?1", [&prof.id])
            .unwrap();
        assert!(matches!(store.list_professors(), Err(StoreError::Malformed(_))));
    }
}
