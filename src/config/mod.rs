//! Configuration and state management for proftrack.
//!
//! This module defines KDL schemas for two distinct files:
//!
//! ## config.kdl - User preferences (safe to sync across machines)
//!
//! Located at `~/.config/proftrack/config.kdl` (or `$PT_CONFIG_DIR/config.kdl`).
//!
//! Contains:
//! - `backend` - "sqlite" or "rest"
//! - `rest-url` - Base URL of the hosted backend
//! - `request-timeout-secs` - Timeout for every store call
//! - `output-format` - "json" or "human"
//!
//! ## state.kdl - Runtime state (machine-specific, contains secrets)
//!
//! Located at `~/.local/share/proftrack/state.kdl` (or `$PT_DATA_DIR/state.kdl`).
//!
//! Contains:
//! - `shared-secret` - Secret accepted by `pt login`
//! - `api-key` - Key for the hosted backend
//! - `session` block - `authenticated` and `admin-mode` flags
//!
//! ## Security
//!
//! **CRITICAL**: `state.kdl` MUST be written with 0600 permissions (owner read/write only)
//! because it contains secrets.
//!
//! ## Precedence
//!
//! CLI flag > env var > file > defaults. See [`resolver`].

pub mod resolver;
pub mod schema;

pub use resolver::{
    API_KEY_ENV, BACKEND_ENV, ConfigOverrides, Resolved, ResolvedConfig, ResolvedSettings,
    ResolvedState, SHARED_SECRET_ENV, ValueSource, resolve_config, resolve_state,
};
pub use schema::{CONFIG_KEYS, OutputFormat, ProftrackConfig, ProftrackState, SessionState};
#[cfg(unix)]
pub use schema::{CONFIG_FILE_MODE, STATE_FILE_MODE};

use crate::{Error, Result};
use kdl::KdlDocument;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "PT_CONFIG_DIR";

pub const CONFIG_FILE_NAME: &str = "config.kdl";
pub const STATE_FILE_NAME: &str = "state.kdl";

/// Get the config directory.
///
/// `PT_CONFIG_DIR` wins; otherwise `~/.config/proftrack/`.
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let base = dirs::config_dir()
        .ok_or_else(|| Error::Other("Could not determine config directory".to_string()))?;
    Ok(base.join("proftrack"))
}

pub fn config_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

pub fn state_path(data_dir: &Path) -> PathBuf {
    data_dir.join(STATE_FILE_NAME)
}

/// Read a KDL file, treating a missing file as an empty document.
fn read_kdl(path: &Path) -> Result<KdlDocument> {
    if !path.exists() {
        return Ok(KdlDocument::new());
    }
    let content = fs::read_to_string(path)?;
    Ok(content.parse::<KdlDocument>()?)
}

pub fn read_config(path: &Path) -> Result<ProftrackConfig> {
    Ok(ProftrackConfig::from_kdl(&read_kdl(path)?))
}

pub fn write_config(path: &Path, config: &ProftrackConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, config.to_kdl().to_string())?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(CONFIG_FILE_MODE))?;
    }
    Ok(())
}

pub fn read_state(path: &Path) -> Result<ProftrackState> {
    Ok(ProftrackState::from_kdl(&read_kdl(path)?))
}

/// Write state.kdl, creating it owner-only on Unix.
pub fn write_state(path: &Path, state: &ProftrackState) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = state.to_kdl().to_string();

    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(STATE_FILE_MODE)
            .open(path)?;
        // mode() only applies on create
        fs::set_permissions(path, fs::Permissions::from_mode(STATE_FILE_MODE))?;
        file.write_all(content.as_bytes())?;
    }

    #[cfg(not(unix))]
    fs::write(path, content)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;

    #[test]
    fn test_missing_files_read_as_defaults() {
        let env = TestEnv::new();
        assert_eq!(
            read_config(&config_path(env.config_path())).unwrap(),
            ProftrackConfig::default()
        );
        assert_eq!(
            read_state(&state_path(env.data_path())).unwrap(),
            ProftrackState::default()
        );
    }

    #[test]
    fn test_state_written_owner_only() {
        let env = TestEnv::new();
        let path = state_path(env.data_path());
        let state = ProftrackState {
            shared_secret: Some("s3cret".to_string()),
            ..Default::default()
        };
        write_state(&path, &state).unwrap();
        assert_eq!(read_state(&path).unwrap(), state);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, STATE_FILE_MODE);
        }
    }

    #[test]
    fn test_config_roundtrip_on_disk() {
        let env = TestEnv::new();
        let path = config_path(&env.config_path().join("nested"));
        let mut config = ProftrackConfig::new();
        config.set("output-format", "human").unwrap();
        write_config(&path, &config).unwrap();
        assert_eq!(read_config(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_kdl_is_error() {
        let env = TestEnv::new();
        let path = config_path(env.config_path());
        fs::write(&path, "backend \"unterminated").unwrap();
        assert!(matches!(read_config(&path), Err(Error::Kdl(_))));
    }
}
