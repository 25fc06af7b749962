//! Shared-secret session gate.
//!
//! Two flags, `authenticated` and `admin_mode`, persisted in the `session`
//! block of state.kdl. Reading commands need the first; editing commands
//! need both. The flags live on the local machine and are not a security
//! boundary.

use std::path::{Path, PathBuf};

use crate::config::{SessionState, read_state, write_state};
use crate::{Error, Result};

/// Persistent login and admin-mode flags.
#[derive(Debug)]
pub struct SessionGate {
    state_path: PathBuf,
    secret: Option<String>,
    flags: SessionState,
}

impl SessionGate {
    /// Read the persisted flags from `state_path`.
    ///
    /// `secret` is the configured shared secret, if any.
    pub fn load(state_path: &Path, secret: Option<String>) -> Result<Self> {
        let flags = read_state(state_path)?.session.unwrap_or_default();
        Ok(Self {
            state_path: state_path.to_path_buf(),
            secret,
            flags,
        })
    }

    /// Try to log in. Returns false (and changes nothing) on a wrong secret.
    pub fn login(&mut self, attempt: &str) -> Result<bool> {
        let secret = self.secret.as_deref().ok_or(Error::NoSharedSecret)?;
        if attempt != secret {
            tracing::warn!("login rejected");
            return Ok(false);
        }
        self.flags.authenticated = true;
        self.persist(Some(self.flags))?;
        Ok(true)
    }

    /// Clear both flags and remove the persisted session.
    pub fn logout(&mut self) -> Result<()> {
        self.flags = SessionState::default();
        self.persist(None)
    }

    /// Flip admin mode and persist it. Returns the new value.
    pub fn toggle_admin_mode(&mut self) -> Result<bool> {
        self.flags.admin_mode = !self.flags.admin_mode;
        self.persist(Some(self.flags))?;
        Ok(self.flags.admin_mode)
    }

    pub fn is_authenticated(&self) -> bool {
        self.flags.authenticated
    }

    pub fn is_admin_mode(&self) -> bool {
        self.flags.admin_mode
    }

    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    pub fn require_authenticated(&self) -> Result<()> {
        if self.flags.authenticated {
            Ok(())
        } else {
            Err(Error::NotAuthenticated)
        }
    }

    /// Editing needs a logged-in session with admin mode on.
    pub fn require_admin(&self) -> Result<()> {
        self.require_authenticated()?;
        if self.flags.admin_mode {
            Ok(())
        } else {
            Err(Error::AdminModeRequired)
        }
    }

    fn persist(&self, session: Option<SessionState>) -> Result<()> {
        // Re-read so secrets written since load are kept.
        let mut state = read_state(&self.state_path)?;
        state.session = session;
        write_state(&self.state_path, &state)
    }
}
