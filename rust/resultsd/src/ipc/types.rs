use std::path::{Path, PathBuf};

use rusqlite::Connection;
use serde::Deserialize;

use crate::auth::session::SessionStore;
use crate::auth::RequestContext;
use crate::config::Config;
use crate::db;
use crate::repo::users;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    /// Token returned by a login call.
    #[serde(default)]
    pub session: Option<String>,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub config: Config,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            workspace: None,
            db: None,
            config,
            sessions: SessionStore::default(),
        }
    }

    /// Open (or create) the database under `path` and make sure the built-in
    /// admin exists. Any sessions from a previous workspace are dropped.
    /// Returns true when the admin account was created.
    pub fn open_workspace(&mut self, path: &Path) -> anyhow::Result<bool> {
        let conn = db::open_db(path)?;
        let created = users::ensure_default_admin(&conn, self.config.hash_cost)?;
        if created {
            tracing::info!(
                username = users::DEFAULT_ADMIN_USERNAME,
                "created default admin account"
            );
        }
        self.sessions.clear();
        self.workspace = Some(path.to_path_buf());
        self.db = Some(conn);
        tracing::info!(workspace = %path.display(), "workspace opened");
        Ok(created)
    }

    pub fn close_workspace(&mut self) {
        self.sessions.clear();
        self.db = None;
        self.workspace = None;
    }

    pub fn context(&self, session: Option<&str>) -> RequestContext {
        RequestContext::new(
            self.sessions.resolve(session),
            session.map(str::to_string),
        )
    }
}
