//! Hosted record store over a PostgREST API (e.g. Supabase).
//!
//! Tables are reached under `<base-url>/rest/v1/<table>`. Writes ask for
//! `Prefer: return=representation` so every insert or update answers with the
//! stored row, which becomes the canonical in-memory copy.

use super::{RecordStore, StoreError, StoreResult};
use crate::models::{ActivityLog, NewActivityLog, Professor, ProfessorFields};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// User-Agent header sent with every request
const USER_AGENT: &str = "proftrack-cli";

const PROFESSORS: &str = "professors";
const ACTIVITY_LOGS: &str = "activity_logs";

/// Record store backed by a hosted PostgREST endpoint.
pub struct RestStore {
    base_url: String,
    api_key: String,
    timeout: Duration,
    agent: ureq::Agent,
}

impl RestStore {
    /// Create a client for `base_url` (e.g. `https://xyz.supabase.co`).
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout,
            agent,
        }
    }

    fn endpoint(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: &str, table: &str) -> ureq::Request {
        self.agent
            .request(method, &self.endpoint(table))
            .set("apikey", &self.api_key)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("Accept", "application/json")
    }

    /// Send a request and decode the JSON array PostgREST answers with.
    fn rows<T: DeserializeOwned>(
        &self,
        request: ureq::Request,
        body: Option<serde_json::Value>,
    ) -> StoreResult<Vec<T>> {
        let url = request.url().to_string();
        tracing::debug!(method = request.method(), url = %url, "store request");

        let response = match body {
            Some(body) => request
                .set("Prefer", "return=representation")
                .send_json(body),
            None => request.call(),
        };

        match response {
            Ok(resp) => {
                let text = resp
                    .into_string()
                    .map_err(|e| StoreError::Transport(e.to_string()))?;
                parse_rows(&text)
            }
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                Err(status_error(code, body))
            }
            Err(ureq::Error::Transport(transport)) => {
                if is_timeout(&transport) {
                    Err(StoreError::Timeout(self.timeout))
                } else {
                    Err(StoreError::Transport(transport.to_string()))
                }
            }
        }
    }

    /// Like `rows`, for writes that must return exactly one record.
    fn single<T: DeserializeOwned>(
        &self,
        request: ureq::Request,
        body: serde_json::Value,
        missing: impl FnOnce() -> StoreError,
    ) -> StoreResult<T> {
        self.rows(request, Some(body))?
            .into_iter()
            .next()
            .ok_or_else(missing)
    }
}

impl RecordStore for RestStore {
    fn list_professors(&self) -> StoreResult<Vec<Professor>> {
        let request = self
            .request("GET", PROFESSORS)
            .query("select", "*")
            .query("order", "name.asc");
        self.rows(request, None)
    }

    fn list_activity_logs(&self) -> StoreResult<Vec<ActivityLog>> {
        let request = self
            .request("GET", ACTIVITY_LOGS)
            .query("select", "*")
            .query("order", "date.desc");
        self.rows(request, None)
    }

    fn create_professor(&mut self, fields: &ProfessorFields) -> StoreResult<Professor> {
        fields.validate()?;
        let body = to_body(fields)?;
        self.single(self.request("POST", PROFESSORS), body, || {
            StoreError::Malformed("insert returned no professor".to_string())
        })
    }

    fn update_professor(&mut self, id: &str, fields: &ProfessorFields) -> StoreResult<Professor> {
        fields.validate()?;
        let body = to_body(fields)?;
        let request = self
            .request("PATCH", PROFESSORS)
            .query("id", &format!("eq.{}", id));
        // PostgREST answers an update matching no row with an empty array.
        self.single(request, body, || {
            StoreError::NotFound(format!("Professor not found: {}", id))
        })
    }

    fn create_activity_log(&mut self, log: &NewActivityLog) -> StoreResult<ActivityLog> {
        log.validate()?;
        let body = to_body(log)?;
        self.single(self.request("POST", ACTIVITY_LOGS), body, || {
            StoreError::Malformed("insert returned no activity log".to_string())
        })
    }

    fn location(&self) -> String {
        format!("{}/rest/v1", self.base_url)
    }

    fn backend_type(&self) -> &'static str {
        "rest"
    }
}

fn to_body<T: serde::Serialize>(value: &T) -> StoreResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| StoreError::Malformed(e.to_string()))
}

/// Decode a PostgREST JSON array. Rows that violate the model's closed enums are rejected.
fn parse_rows<T: DeserializeOwned>(text: &str) -> StoreResult<Vec<T>> {
    serde_json::from_str(text).map_err(|e| StoreError::Malformed(e.to_string()))
}

/// Map an HTTP error status to a store error.
fn status_error(code: u16, body: String) -> StoreError {
    match code {
        401 | 403 => StoreError::Unauthorized(format!("HTTP {}: {}", code, body)),
        404 => StoreError::NotFound(body),
        _ => StoreError::Backend { status: code, body },
    }
}

/// Whether a transport failure was caused by the agent timeout.
fn is_timeout(transport: &ureq::Transport) -> bool {
    if !matches!(
        transport.kind(),
        ureq::ErrorKind::Io | ureq::ErrorKind::ConnectionFailed
    ) {
        return false;
    }
    let mut source = std::error::Error::source(transport);
    while let Some(err) = source {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ) {
                return true;
            }
        }
        source = err.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Liaison, PipelineStatus};
    use chrono::NaiveDate;
    use httpmock::prelude::*;
    use httpmock::Method::PATCH;
    use serde_json::json;

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let store = RestStore::new("https://x.supabase.co/", "key", Duration::from_secs(5));
        assert_eq!(store.endpoint("professors"), "https://x.supabase.co/rest/v1/professors");
        assert_eq!(store.location(), "https://x.supabase.co/rest/v1");
        assert_eq!(store.backend_type(), "rest");
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            status_error(401, "bad jwt".to_string()),
            StoreError::Unauthorized(_)
        ));
        assert!(matches!(
            status_error(403, String::new()),
            StoreError::Unauthorized(_)
        ));
        assert!(matches!(
            status_error(404, String::new()),
            StoreError::NotFound(_)
        ));
        match status_error(500, "boom".to_string()) {
            StoreError::Backend { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("Expected Backend, got: {:?}", other),
        }
    }

    #[test]
    fn test_parse_professor_rows() {
        let text = r#"[{
            "id": "a1",
            "name": "Bob",
            "institution": "Uni",
            "role": "Professor",
            "core_ip": [],
            "exec_ed_programs": [],
            "notes": "",
            "status": "First Lead",
            "clients": [],
            "liaison": "Andy",
            "next_action": "",
            "contract_signed": true,
            "engagement_type": "Unknown",
            "links": {},
            "last_contacted": "2026-02-01T12:00:00.123456+00:00",
            "created_at": "2026-01-01T00:00:00+00:00",
            "updated_at": "2026-01-01T00:00:00+00:00"
        }]"#;
        let rows: Vec<Professor> = parse_rows(text).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, PipelineStatus::FirstLead);
        assert_eq!(rows[0].liaison, Liaison::Andy);
        assert!(rows[0].last_contacted.is_some());
    }

    #[test]
    fn test_parse_rows_rejects_bad_enum() {
        let text = r#"[{"id":"a1","name":"Bob","institution":"Uni","status":"Lost","created_at":"2026-01-01T00:00:00Z","updated_at":"2026-01-01T00:00:00Z"}]"#;
        assert!(matches!(
            parse_rows::<Professor>(text),
            Err(StoreError::Malformed(_))
        ));
    }

    #[test]
    fn test_activity_log_body_shape() {
        let log = NewActivityLog::new(
            "a1",
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            "Coffee chat",
            "Team",
        );
        let body = to_body(&log).unwrap();
        assert_eq!(body["date"], "2026-03-01");
        assert_eq!(body["professor_id"], "a1");
        assert_eq!(body["created_by"], "Team");
    }

    #[test]
    fn test_professor_body_uses_labels() {
        let mut fields = ProfessorFields::new("Bob", "Uni");
        fields.status = PipelineStatus::InContact;
        let body = to_body(&fields).unwrap();
        assert_eq!(body["status"], "In Contact");
        assert_eq!(body["liaison"], "");
        assert_eq!(body["last_contacted"], serde_json::Value::Null);
    }

    #[test]
    fn test_create_rejects_invalid_before_request() {
        // Unroutable URL: validation must fail first without touching the network.
        let mut store = RestStore::new("http://127.0.0.1:1", "key", Duration::from_millis(200));
        let result = store.create_professor(&ProfessorFields::new("", "Uni"));
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    fn professor_row(id: &str, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "institution": "Uni",
            "role": "Professor",
            "core_ip": ["Pricing"],
            "exec_ed_programs": [],
            "notes": "",
            "status": "In Contact",
            "clients": [],
            "liaison": "Sara",
            "next_action": "",
            "contract_signed": false,
            "engagement_type": "Unknown",
            "links": {},
            "last_contacted": null,
            "created_at": "2026-01-01T00:00:00+00:00",
            "updated_at": "2026-01-02T00:00:00+00:00"
        })
    }

    fn mock_store(server: &MockServer) -> RestStore {
        RestStore::new(&server.base_url(), "anon-key", Duration::from_secs(5))
    }

    #[test]
    fn test_list_professors_sends_auth_and_order() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/rest/v1/professors")
                .query_param("select", "*")
                .query_param("order", "name.asc")
                .header("apikey", "anon-key")
                .header("Authorization", "Bearer anon-key");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([professor_row("p-1", "Alice"), professor_row("p-2", "Bob")]));
        });

        let rows = mock_store(&server).list_professors().unwrap();
        mock.assert();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Alice");
        assert_eq!(rows[1].status, PipelineStatus::InContact);
        assert_eq!(rows[1].liaison, Liaison::Sara);
    }

    #[test]
    fn test_list_activity_logs_newest_first_query() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/rest/v1/activity_logs")
                .query_param("order", "date.desc");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([{
                    "id": "l-1",
                    "professor_id": "p-1",
                    "date": "2026-03-01",
                    "entry": "Coffee",
                    "created_by": "Team",
                    "created_at": "2026-03-01T10:00:00+00:00"
                }]));
        });

        let logs = mock_store(&server).list_activity_logs().unwrap();
        mock.assert();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].date, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }

    #[test]
    fn test_create_professor_asks_for_representation() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/rest/v1/professors")
                .header("Prefer", "return=representation")
                .header("apikey", "anon-key")
                .body_contains(r#""name":"Alice""#)
                .body_contains(r#""status":"Identified""#);
            then.status(201)
                .header("content-type", "application/json")
                .json_body(json!([professor_row("p-9", "Alice")]));
        });

        let mut store = mock_store(&server);
        let created = store
            .create_professor(&ProfessorFields::new("Alice", "Uni"))
            .unwrap();
        mock.assert();
        assert_eq!(created.id, "p-9");
    }

    #[test]
    fn test_update_professor_filters_by_id() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PATCH)
                .path("/rest/v1/professors")
                .query_param("id", "eq.p-1")
                .header("Prefer", "return=representation")
                .body_contains(r#""name":"Alice Chen""#);
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([professor_row("p-1", "Alice Chen")]));
        });

        let mut store = mock_store(&server);
        let updated = store
            .update_professor("p-1", &ProfessorFields::new("Alice Chen", "Uni"))
            .unwrap();
        mock.assert();
        assert_eq!(updated.name, "Alice Chen");
    }

    #[test]
    fn test_update_matching_no_row_is_not_found() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PATCH)
                .path("/rest/v1/professors")
                .query_param("id", "eq.missing");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([]));
        });

        let mut store = mock_store(&server);
        let result = store.update_professor("missing", &ProfessorFields::new("Bob", "Uni"));
        mock.assert();
        match result {
            Err(StoreError::NotFound(msg)) => assert!(msg.contains("missing")),
            other => panic!("Expected NotFound, got: {:?}", other),
        }
    }

    #[test]
    fn test_create_activity_log_posts_date_and_author() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/rest/v1/activity_logs")
                .header("Prefer", "return=representation")
                .body_contains(r#""date":"2026-03-01""#)
                .body_contains(r#""created_by":"Sara""#);
            then.status(201)
                .header("content-type", "application/json")
                .json_body(json!([{
                    "id": "l-7",
                    "professor_id": "p-1",
                    "date": "2026-03-01",
                    "entry": "Workshop pitch",
                    "created_by": "Sara",
                    "created_at": "2026-03-01T10:00:00+00:00"
                }]));
        });

        let mut store = mock_store(&server);
        let log = store
            .create_activity_log(&NewActivityLog::new(
                "p-1",
                NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                "Workshop pitch",
                "Sara",
            ))
            .unwrap();
        mock.assert();
        assert_eq!(log.id, "l-7");
        assert_eq!(log.entry, "Workshop pitch");
    }

    #[test]
    fn test_unauthorized_response() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/rest/v1/professors");
            then.status(401).body("JWT expired");
        });

        match mock_store(&server).list_professors() {
            Err(StoreError::Unauthorized(msg)) => assert!(msg.contains("JWT expired")),
            other => panic!("Expected Unauthorized, got: {:?}", other),
        }
    }

    #[test]
    fn test_server_error_is_backend_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/rest/v1/activity_logs");
            then.status(500).body("constraint violated");
        });

        let mut store = mock_store(&server);
        let result = store.create_activity_log(&NewActivityLog::new(
            "p-1",
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            "Call",
            "Team",
        ));
        assert!(matches!(
            result,
            Err(StoreError::Backend { status: 500, .. })
        ));
    }

    #[test]
    fn test_slow_response_is_timeout() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/rest/v1/professors");
            then.status(200)
                .delay(Duration::from_secs(3))
                .json_body(json!([]));
        });

        let store = RestStore::new(&server.base_url(), "anon-key", Duration::from_millis(300));
        match store.list_professors() {
            Err(StoreError::Timeout(limit)) => assert_eq!(limit, Duration::from_millis(300)),
            other => panic!("Expected Timeout, got: {:?}", other),
        }
    }

    #[test]
    fn test_unreachable_backend_is_store_error() {
        let store = RestStore::new("http://127.0.0.1:1", "key", Duration::from_millis(500));
        let result = store.list_professors();
        assert!(matches!(
            result,
            Err(StoreError::Transport(_)) | Err(StoreError::Timeout(_))
        ));
    }
}
