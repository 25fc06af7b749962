//! KDL schema definitions for config.kdl and state.kdl.
//!
//! This module provides:
//! - Rust structs representing the KDL schema
//! - Serialization/deserialization to/from KDL format
//! - Validation functions

use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::{Deserialize, Serialize};

use crate::storage::BackendType;

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Keys accepted by `pt config set`.
pub const CONFIG_KEYS: &[&str] = &["backend", "rest-url", "request-timeout-secs", "output-format"];

fn first_string(doc: &KdlDocument, name: &str) -> Option<String> {
    doc.get(name)?
        .entries()
        .first()?
        .value()
        .as_string()
        .map(str::to_string)
}

fn string_node(name: &str, value: &str) -> KdlNode {
    let mut node = KdlNode::new(name);
    node.push(KdlEntry::new(KdlValue::String(value.to_string())));
    node
}

/// User preferences stored in config.kdl.
///
/// # KDL Schema
///
/// ```kdl
/// backend "rest"  // or "sqlite"
/// rest-url "https://xyz.supabase.co"
/// request-timeout-secs 10
/// output-format "human"  // or "json"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProftrackConfig {
    /// Which record store to open
    pub backend: Option<BackendType>,

    /// Base URL of the REST backend
    pub rest_url: Option<String>,

    /// Timeout applied to every store call
    pub request_timeout_secs: Option<u64>,

    /// Default output format for CLI commands
    pub output_format: Option<OutputFormat>,
}

impl ProftrackConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    pub fn validate(&self) -> Result<(), String> {
        if self.request_timeout_secs == Some(0) {
            return Err("request-timeout-secs must be greater than 0".to_string());
        }
        if let Some(ref url) = self.rest_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("rest-url must start with http:// or https://, got {}", url));
            }
        }
        Ok(())
    }

    /// Parse config from a KDL document. Unrecognized values are ignored.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        let mut config = Self::new();

        config.backend = first_string(doc, "backend").and_then(|s| BackendType::parse(&s));
        config.rest_url = first_string(doc, "rest-url").filter(|s| !s.is_empty());
        config.output_format =
            first_string(doc, "output-format").and_then(|s| OutputFormat::parse(&s));

        if let Some(node) = doc.get("request-timeout-secs") {
            if let Some(entry) = node.entries().first() {
                if let Some(i) = entry.value().as_integer() {
                    if i > 0 {
                        config.request_timeout_secs = u64::try_from(i).ok();
                    }
                }
            }
        }

        config
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        if let Some(backend) = self.backend {
            doc.nodes_mut().push(string_node("backend", backend.as_str()));
        }

        if let Some(ref url) = self.rest_url {
            doc.nodes_mut().push(string_node("rest-url", url));
        }

        if let Some(secs) = self.request_timeout_secs {
            let mut node = KdlNode::new("request-timeout-secs");
            node.push(KdlEntry::new(KdlValue::Integer(i128::from(secs))));
            doc.nodes_mut().push(node);
        }

        if let Some(format) = self.output_format {
            doc.nodes_mut().push(string_node("output-format", format.as_str()));
        }

        doc
    }

    /// Set a key from its string form, as given to `pt config set`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "backend" => {
                self.backend = Some(
                    BackendType::parse(value)
                        .ok_or_else(|| format!("backend must be sqlite or rest, got {}", value))?,
                );
            }
            "rest-url" => {
                let value = value.trim();
                self.rest_url = (!value.is_empty()).then(|| value.to_string());
            }
            "request-timeout-secs" => {
                let secs: u64 = value
                    .trim()
                    .parse()
                    .map_err(|_| format!("request-timeout-secs must be a number, got {}", value))?;
                self.request_timeout_secs = Some(secs);
            }
            "output-format" => {
                self.output_format = Some(
                    OutputFormat::parse(value).ok_or_else(|| {
                        format!("output-format must be json or human, got {}", value)
                    })?,
                );
            }
            other => {
                return Err(format!(
                    "Unknown config key: {} (expected one of: {})",
                    other,
                    CONFIG_KEYS.join(", ")
                ));
            }
        }
        self.validate()
    }
}

/// Session flags persisted between invocations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub authenticated: bool,
    pub admin_mode: bool,
}

/// Runtime state stored in state.kdl.
///
/// Contains secrets. **MUST be created with 0600 permissions (owner read/write only)**.
///
/// # KDL Schema
///
/// ```kdl
/// shared-secret "team-passphrase"
/// api-key "eyJhbGciOi..."
/// session {
///     authenticated #true
///     admin-mode #false
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProftrackState {
    /// Secret that unlocks `pt login`
    pub shared_secret: Option<String>,

    /// Key sent to the REST backend (sensitive!)
    pub api_key: Option<String>,

    /// Present once someone has logged in
    pub session: Option<SessionState>,
}

impl ProftrackState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mask the API key for display, keeping the first and last 4 characters.
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key.as_deref().map(mask_secret)
    }

    /// Parse state from a KDL document.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        let mut state = Self::new();

        state.shared_secret = first_string(doc, "shared-secret").filter(|s| !s.is_empty());
        state.api_key = first_string(doc, "api-key").filter(|s| !s.is_empty());

        if let Some(children) = doc.get("session").and_then(|node| node.children()) {
            let flag = |name: &str| {
                children
                    .get(name)
                    .and_then(|node| node.entries().first())
                    .and_then(|entry| entry.value().as_bool())
                    .unwrap_or(false)
            };
            state.session = Some(SessionState {
                authenticated: flag("authenticated"),
                admin_mode: flag("admin-mode"),
            });
        }

        state
    }

    /// Convert state to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        if let Some(ref secret) = self.shared_secret {
            doc.nodes_mut().push(string_node("shared-secret", secret));
        }

        if let Some(ref key) = self.api_key {
            doc.nodes_mut().push(string_node("api-key", key));
        }

        if let Some(session) = self.session {
            let mut children = KdlDocument::new();

            let mut authenticated = KdlNode::new("authenticated");
            authenticated.push(KdlEntry::new(KdlValue::Bool(session.authenticated)));
            children.nodes_mut().push(authenticated);

            let mut admin = KdlNode::new("admin-mode");
            admin.push(KdlEntry::new(KdlValue::Bool(session.admin_mode)));
            children.nodes_mut().push(admin);

            let mut node = KdlNode::new("session");
            node.set_children(children);
            doc.nodes_mut().push(node);
        }

        doc
    }
}

/// Show only the ends of a secret.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        let head: String = chars.iter().take(4).collect();
        format!("{}...", head)
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

/// Required permissions for state.kdl (Unix: 0600, owner read/write only).
#[cfg(unix)]
pub const STATE_FILE_MODE: u32 = 0o600;

/// Required permissions for config.kdl (Unix: 0644, readable by all).
#[cfg(unix)]
pub const CONFIG_FILE_MODE: u32 = 0o644;
