//! Explicit session context. The API layer asks this object for a bearer
//! token instead of reading ambient state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpendError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Absent,
    Valid { user: String, token: String },
    Expired { user: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    logged_in_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SessionContext {
    path: PathBuf,
    state: SessionState,
}

pub fn session_path() -> PathBuf {
    crate::settings::config_dir().join("session.json")
}

impl SessionContext {
    pub fn load() -> Self {
        Self::load_from(session_path())
    }

    pub fn load_from(path: PathBuf) -> Self {
        let state = read_state(&path);
        Self { path, state }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn user(&self) -> Option<&str> {
        match &self.state {
            SessionState::Absent => None,
            SessionState::Valid { user, .. } | SessionState::Expired { user } => Some(user),
        }
    }

    /// Token for an authenticated call, or `AuthRequired`.
    pub fn bearer(&self) -> Result<&str> {
        match &self.state {
            SessionState::Valid { token, .. } => Ok(token),
            _ => Err(SpendError::AuthRequired),
        }
    }

    pub fn begin(&mut self, user: &str, token: String) -> Result<()> {
        let file = SessionFile {
            user: user.to_string(),
            access_token: Some(token.clone()),
            logged_in_at: Some(chrono::Local::now().to_rfc3339()),
        };
        write_file(&self.path, &file)?;
        self.state = SessionState::Valid {
            user: user.to_string(),
            token,
        };
        tracing::debug!(user = %user, "session started");
        Ok(())
    }

    /// The backend rejected the token. Forget it but remember who it was.
    pub fn expire(&mut self) -> Result<()> {
        let user = self.user().unwrap_or_default().to_string();
        let file = SessionFile {
            user: user.clone(),
            access_token: None,
            logged_in_at: None,
        };
        write_file(&self.path, &file)?;
        tracing::info!(user = %user, "session expired");
        self.state = SessionState::Expired { user };
        Ok(())
    }

    pub fn end(&mut self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        self.state = SessionState::Absent;
        Ok(())
    }
}

fn read_state(path: &Path) -> SessionState {
    let Ok(content) = std::fs::read_to_string(path) else {
        return SessionState::Absent;
    };
    match serde_json::from_str::<SessionFile>(&content) {
        Ok(SessionFile {
            user,
            access_token: Some(token),
            ..
        }) if !token.is_empty() => SessionState::Valid { user, token },
        Ok(SessionFile { user, .. }) => SessionState::Expired { user },
        Err(e) => {
            tracing::warn!("ignoring unreadable session file {}: {e}", path.display());
            SessionState::Absent
        }
    }
}

fn write_file(path: &Path, file: &SessionFile) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(file)?;
    std::fs::write(path, format!("{json}\n"))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}
