use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{dto::LoginResponse, Role};

/// The logged-in user, built once after login and handed to every view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl Session {
    /// `None` unless the login succeeded and carried both user and token.
    pub fn from_login(res: &LoginResponse) -> Option<Self> {
        if !res.success {
            return None;
        }
        let user = res.user.as_ref()?;
        let token = res.token.clone()?;
        Some(Self {
            token,
            user_id: user.user_id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn owns(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session: Option<Session>,
}

/// Session persisted as JSON on disk, next to the authenticated flag.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$HOME/.config/qa-forum/session.json`
    pub fn default_path() -> anyhow::Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("qa-forum")
            .join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> anyhow::Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path.display()))?;
        let file: SessionFile = serde_json::from_str(&raw)
            .with_context(|| format!("parse {}", self.path.display()))?;
        Ok(file.session.filter(|_| file.authenticated))
    }

    pub fn save(&self, session: &Session) -> anyhow::Result<()> {
        self.write(&SessionFile {
            authenticated: true,
            session: Some(session.clone()),
        })
    }

    /// Logs out: keeps the file but flips the flag and forgets the token.
    pub fn clear(&self) -> anyhow::Result<()> {
        self.write(&SessionFile::default())
    }

    fn write(&self, file: &SessionFile) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
        let body = serde_json::to_string_pretty(file)?;
        fs::write(&self.path, body).with_context(|| format!("write {}", self.path.display()))
    }
}
