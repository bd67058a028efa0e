use crate::auth::repo::{PgUserRepo, UserRepo};
use crate::comments::repo::{CommentRepo, PgCommentRepo};
use crate::config::{AppConfig, JwtConfig};
use crate::memory::MemoryStore;
use crate::questions::repo::{PgQuestionRepo, QuestionRepo};
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub questions: Arc<dyn QuestionRepo>,
    pub comments: Arc<dyn CommentRepo>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        match config.database_url.clone() {
            Some(url) => Self::connect(config, &url).await,
            None => {
                warn!("DATABASE_URL not set; using the in-memory store, data is lost on exit");
                Ok(Self::in_memory(config))
            }
        }
    }

    pub async fn connect(config: Arc<AppConfig>, database_url: &str) -> anyhow::Result<Self> {
        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;

        // Run migrations if present
        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            warn!(error = %e, "migration failed; continuing");
        }
        info!(max_connections = config.max_connections, "connected to postgres");

        Ok(Self {
            config,
            users: Arc::new(PgUserRepo::new(db.clone())),
            questions: Arc::new(PgQuestionRepo::new(db.clone())),
            comments: Arc::new(PgCommentRepo::new(db)),
        })
    }

    pub fn in_memory(config: Arc<AppConfig>) -> Self {
        let store = MemoryStore::new();
        Self {
            config,
            users: Arc::new(store.clone()),
            questions: Arc::new(store.clone()),
            comments: Arc::new(store),
        }
    }

    /// In-memory state with a fixed test JWT configuration.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            max_connections: 1,
            host: "127.0.0.1".into(),
            port: 0,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 60 * 24 * 7,
            },
        });
        Self::in_memory(config)
    }
}
