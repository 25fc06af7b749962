//! Unified precedence resolution for configuration and state.
//!
//! ## Config Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Environment variables (`PT_BACKEND`, `PT_DATA_DIR`)
//! 3. config.kdl
//! 4. Built-in defaults
//!
//! ## Secret Precedence (highest to lowest)
//!
//! 1. `PT_SHARED_SECRET` / `PT_API_KEY` environment variables
//! 2. state.kdl

use std::path::PathBuf;
use std::time::Duration;

use super::{
    OutputFormat, ProftrackConfig, ProftrackState, config_dir, config_path, read_config,
    read_state, state_path,
};
use crate::storage::{BackendType, DATA_DIR_ENV, DEFAULT_TIMEOUT, StoreSettings, get_data_dir};
use crate::{Error, Result};

/// Environment variable overriding the shared secret.
pub const SHARED_SECRET_ENV: &str = "PT_SHARED_SECRET";

/// Environment variable overriding the REST API key.
pub const API_KEY_ENV: &str = "PT_API_KEY";

/// Environment variable overriding the backend choice.
pub const BACKEND_ENV: &str = "PT_BACKEND";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from environment variable
    EnvVar(String),
    /// Value from config.kdl or state.kdl
    File,
    /// Value from CLI flag
    CliFlag,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::File => write!(f, "file"),
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub backend: Resolved<BackendType>,
    pub rest_url: Option<Resolved<String>>,
    pub request_timeout: Resolved<Duration>,
    pub output_format: Resolved<OutputFormat>,
    pub data_dir: Resolved<PathBuf>,
}

impl ResolvedConfig {
    pub fn output_format(&self) -> OutputFormat {
        self.output_format.value
    }
}

/// Fully resolved secrets with source tracking.
#[derive(Debug, Clone, Default)]
pub struct ResolvedState {
    pub shared_secret: Option<Resolved<String>>,
    pub api_key: Option<Resolved<String>>,
}

impl ResolvedState {
    pub fn shared_secret(&self) -> Option<&str> {
        self.shared_secret.as_ref().map(|r| r.value.as_str())
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|r| r.value.as_str())
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_dir: Option<PathBuf>,
    pub output_format: Option<OutputFormat>,
    pub backend: Option<BackendType>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn with_backend(mut self, backend: BackendType) -> Self {
        self.backend = Some(backend);
        self
    }
}

/// Resolve configuration from `config` (parsed config.kdl), the environment, and `overrides`.
pub fn resolve_config(
    config: &ProftrackConfig,
    overrides: &ConfigOverrides,
) -> Result<ResolvedConfig> {
    let backend = if let Some(backend) = overrides.backend {
        Resolved::new(backend, ValueSource::CliFlag)
    } else if let Some(raw) = non_empty_env(BACKEND_ENV) {
        let backend = BackendType::parse(&raw).ok_or_else(|| {
            Error::InvalidInput(format!("{} must be sqlite or rest, got {}", BACKEND_ENV, raw))
        })?;
        Resolved::new(backend, ValueSource::EnvVar(BACKEND_ENV.to_string()))
    } else if let Some(backend) = config.backend {
        Resolved::new(backend, ValueSource::File)
    } else {
        Resolved::new(BackendType::default(), ValueSource::Default)
    };

    let rest_url = config
        .rest_url
        .clone()
        .map(|url| Resolved::new(url, ValueSource::File));

    let request_timeout = match config.request_timeout_secs {
        Some(secs) => Resolved::new(Duration::from_secs(secs), ValueSource::File),
        None => Resolved::new(DEFAULT_TIMEOUT, ValueSource::Default),
    };

    let output_format = if let Some(format) = overrides.output_format {
        Resolved::new(format, ValueSource::CliFlag)
    } else if let Some(format) = config.output_format {
        Resolved::new(format, ValueSource::File)
    } else {
        Resolved::new(OutputFormat::default(), ValueSource::Default)
    };

    let data_dir = if let Some(ref dir) = overrides.data_dir {
        Resolved::new(dir.clone(), ValueSource::CliFlag)
    } else if let Some(dir) = non_empty_env(DATA_DIR_ENV) {
        Resolved::new(PathBuf::from(dir), ValueSource::EnvVar(DATA_DIR_ENV.to_string()))
    } else {
        Resolved::new(get_data_dir()?, ValueSource::Default)
    };

    Ok(ResolvedConfig {
        backend,
        rest_url,
        request_timeout,
        output_format,
        data_dir,
    })
}

/// Resolve secrets from `state` (parsed state.kdl) and the environment.
pub fn resolve_state(state: &ProftrackState) -> ResolvedState {
    let pick = |env: &str, file: &Option<String>| {
        non_empty_env(env)
            .map(|v| Resolved::new(v, ValueSource::EnvVar(env.to_string())))
            .or_else(|| file.clone().map(|v| Resolved::new(v, ValueSource::File)))
    };
    ResolvedState {
        shared_secret: pick(SHARED_SECRET_ENV, &state.shared_secret),
        api_key: pick(API_KEY_ENV, &state.api_key),
    }
}

/// Combined resolver for both config and state.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub config: ResolvedConfig,
    pub state: ResolvedState,
    /// Location of config.kdl
    pub config_path: PathBuf,
    /// Location of state.kdl
    pub state_path: PathBuf,
}

impl ResolvedSettings {
    /// Read config.kdl and state.kdl and resolve everything with the given overrides.
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        let config_path = config_path(&config_dir()?);
        let file_config = read_config(&config_path)?;
        let config = resolve_config(&file_config, overrides)?;

        let state_path = state_path(&config.data_dir.value);
        let state = resolve_state(&read_state(&state_path)?);

        tracing::debug!(
            backend = %config.backend.value,
            backend_source = %config.backend.source,
            data_dir = %config.data_dir.value.display(),
            "resolved settings"
        );

        Ok(Self {
            config,
            state,
            config_path,
            state_path,
        })
    }

    /// Settings for opening the configured record store.
    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            backend: self.config.backend.value,
            data_dir: self.config.data_dir.value.clone(),
            rest_url: self.config.rest_url.as_ref().map(|r| r.value.clone()),
            api_key: self.state.api_key().map(str::to_string),
            timeout: self.config.request_timeout.value,
        }
    }
}
