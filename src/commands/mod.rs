//! Command implementations for the proftrack CLI.
//!
//! Each command returns a result struct implementing [`Output`], printed as
//! JSON by default or as text with `-H`. Commands are organized by area:
//! - this module - init, session, and config commands
//! - [`professor`] - professor, activity log, and summary commands

pub mod professor;

pub use professor::{
    ActivityAdded, ActivityList, AddArgs, ProfessorDetail, ProfessorList, ProfessorResult,
    SummaryResult, UpdateArgs, activity_add, activity_list, list_filter, professor_add,
    professor_list, professor_show, professor_update, summary,
};

use serde::Serialize;

use crate::config::{
    ResolvedSettings, ValueSource, read_config, read_state, resolve_state,
    schema::mask_secret, write_config, write_state,
};
use crate::session::SessionGate;
use crate::storage::{BackendType, RecordStore, SqliteStore, open_store, store_exists};
use crate::view::ViewState;
use crate::{Error, Result};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    fn to_json(&self) -> String;

    fn to_human(&self) -> String;
}

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

/// Load the session gate for these settings.
pub fn session(settings: &ResolvedSettings) -> Result<SessionGate> {
    SessionGate::load(
        &settings.state_path,
        settings.state.shared_secret().map(str::to_string),
    )
}

/// Open the configured store and load every record.
pub fn open_view(settings: &ResolvedSettings) -> Result<ViewState<Box<dyn RecordStore>>> {
    let store = open_store(&settings.store_settings())?;
    let mut view = ViewState::new(store);
    view.load()?;
    Ok(view)
}

// === System ===

#[derive(Serialize)]
pub struct InitResult {
    pub initialized: bool,
    pub backend: String,
    pub location: String,
    pub secret_saved: bool,
    pub api_key_saved: bool,
}

impl Output for InitResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        if self.initialized {
            lines.push(format!("Initialized {} store at {}", self.backend, self.location));
        } else {
            lines.push(format!("Already initialized: {} store at {}", self.backend, self.location));
        }
        if self.secret_saved {
            lines.push("Saved shared secret to state.kdl".to_string());
        }
        if self.api_key_saved {
            lines.push("Saved API key to state.kdl".to_string());
        }
        lines.join("\n")
    }
}

/// Create the data directory and, for the SQLite backend, the database.
pub fn system_init(
    settings: &ResolvedSettings,
    secret: Option<String>,
    api_key: Option<String>,
) -> Result<InitResult> {
    let data_dir = &settings.config.data_dir.value;
    std::fs::create_dir_all(data_dir)?;

    let secret_saved = secret.is_some();
    let api_key_saved = api_key.is_some();
    let mut settings = settings.clone();
    if secret_saved || api_key_saved {
        let mut state = read_state(&settings.state_path)?;
        if let Some(secret) = secret {
            state.shared_secret = Some(secret);
        }
        if let Some(key) = api_key {
            state.api_key = Some(key);
        }
        write_state(&settings.state_path, &state)?;
        // The store below must see the secrets just written.
        settings.state = resolve_state(&state);
    }

    let timeout = settings.config.request_timeout.value;
    let (initialized, location) = match settings.config.backend.value {
        BackendType::Sqlite => {
            let existed = store_exists(data_dir);
            let store = SqliteStore::init(data_dir, timeout)?;
            (!existed, store.location())
        }
        BackendType::Rest => {
            let store = open_store(&settings.store_settings())?;
            (false, store.location())
        }
    };

    tracing::debug!(location = %location, initialized, "system init");
    Ok(InitResult {
        initialized,
        backend: settings.config.backend.value.to_string(),
        location,
        secret_saved,
        api_key_saved,
    })
}

// === Session ===

#[derive(Serialize)]
pub struct SessionResult {
    pub authenticated: bool,
    pub admin_mode: bool,
    pub secret_configured: bool,
}

impl SessionResult {
    fn from_gate(gate: &SessionGate) -> Self {
        Self {
            authenticated: gate.is_authenticated(),
            admin_mode: gate.is_admin_mode(),
            secret_configured: gate.has_secret(),
        }
    }
}

impl Output for SessionResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let login = if self.authenticated { "logged in" } else { "logged out" };
        let admin = if self.admin_mode { "on" } else { "off" };
        let mut out = format!("Session: {}\nAdmin mode: {}", login, admin);
        if !self.secret_configured {
            out.push_str("\nNo shared secret configured");
        }
        out
    }
}

pub fn login(settings: &ResolvedSettings, secret: &str) -> Result<SessionResult> {
    let mut gate = session(settings)?;
    if !gate.login(secret)? {
        return Err(Error::InvalidInput("Incorrect shared secret".to_string()));
    }
    Ok(SessionResult::from_gate(&gate))
}

pub fn logout(settings: &ResolvedSettings) -> Result<SessionResult> {
    let mut gate = session(settings)?;
    gate.logout()?;
    Ok(SessionResult::from_gate(&gate))
}

/// Toggle admin mode. Only a logged-in session may do this.
pub fn admin_toggle(settings: &ResolvedSettings) -> Result<SessionResult> {
    let mut gate = session(settings)?;
    gate.require_authenticated()?;
    gate.toggle_admin_mode()?;
    Ok(SessionResult::from_gate(&gate))
}

pub fn whoami(settings: &ResolvedSettings) -> Result<SessionResult> {
    Ok(SessionResult::from_gate(&session(settings)?))
}

// === Config ===

#[derive(Serialize)]
pub struct SourcedValue {
    pub value: String,
    pub source: String,
}

impl SourcedValue {
    fn new(value: impl ToString, source: &ValueSource) -> Self {
        Self {
            value: value.to_string(),
            source: source.to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct ConfigShowResult {
    pub config_path: String,
    pub state_path: String,
    pub backend: SourcedValue,
    pub rest_url: Option<SourcedValue>,
    pub request_timeout_secs: SourcedValue,
    pub output_format: SourcedValue,
    pub data_dir: SourcedValue,
    /// Masked
    pub api_key: Option<SourcedValue>,
    pub shared_secret_configured: bool,
}

impl Output for ConfigShowResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let row = |name: &str, v: &SourcedValue| format!("{:<22} {} ({})", name, v.value, v.source);
        let mut lines = vec![
            format!("config: {}", self.config_path),
            format!("state:  {}", self.state_path),
            String::new(),
            row("backend", &self.backend),
        ];
        match self.rest_url {
            Some(ref url) => lines.push(row("rest-url", url)),
            None => lines.push(format!("{:<22} (not set)", "rest-url")),
        }
        lines.push(row("request-timeout-secs", &self.request_timeout_secs));
        lines.push(row("output-format", &self.output_format));
        lines.push(row("data-dir", &self.data_dir));
        match self.api_key {
            Some(ref key) => lines.push(row("api-key", key)),
            None => lines.push(format!("{:<22} (not set)", "api-key")),
        }
        lines.push(format!(
            "{:<22} {}",
            "shared-secret",
            if self.shared_secret_configured { "configured" } else { "(not set)" }
        ));
        lines.join("\n")
    }
}

pub fn config_show(settings: &ResolvedSettings) -> ConfigShowResult {
    let config = &settings.config;
    ConfigShowResult {
        config_path: settings.config_path.display().to_string(),
        state_path: settings.state_path.display().to_string(),
        backend: SourcedValue::new(config.backend.value, &config.backend.source),
        rest_url: config
            .rest_url
            .as_ref()
            .map(|r| SourcedValue::new(&r.value, &r.source)),
        request_timeout_secs: SourcedValue::new(
            config.request_timeout.value.as_secs(),
            &config.request_timeout.source,
        ),
        output_format: SourcedValue::new(config.output_format.value, &config.output_format.source),
        data_dir: SourcedValue::new(config.data_dir.value.display(), &config.data_dir.source),
        api_key: settings
            .state
            .api_key
            .as_ref()
            .map(|r| SourcedValue::new(mask_secret(&r.value), &r.source)),
        shared_secret_configured: settings.state.shared_secret.is_some(),
    }
}

#[derive(Serialize)]
pub struct ConfigSetResult {
    pub key: String,
    pub value: String,
    pub path: String,
}

impl Output for ConfigSetResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Set {} = {} in {}", self.key, self.value, self.path)
    }
}

/// Set a key in config.kdl. Secrets go in state.kdl and are rejected here.
pub fn config_set(settings: &ResolvedSettings, key: &str, value: &str) -> Result<ConfigSetResult> {
    if matches!(key, "shared-secret" | "api-key") {
        return Err(Error::InvalidInput(format!(
            "{} is a secret; set it with `pt system init --{}` or in state.kdl",
            key,
            if key == "api-key" { "api-key" } else { "secret" }
        )));
    }
    let path = &settings.config_path;
    let mut config = read_config(path)?;
    config.set(key, value).map_err(Error::InvalidInput)?;
    write_config(path, &config)?;
    Ok(ConfigSetResult {
        key: key.to_string(),
        value: value.to_string(),
        path: path.display().to_string(),
    })
}
