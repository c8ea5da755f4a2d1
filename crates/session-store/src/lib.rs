//! SQLite persistence for the signed-in PaveOS session.
//!
//! The session is three keyed entries: the access token, the refresh token
//! and the JSON-encoded user. A session is only restored when both the
//! access token and the user are present.
//!
//! # Example
//!
//! ```no_run
//! use session_store::SessionStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SessionStore::connect("sqlite:paveos-session.db?mode=rwc").await?;
//!     store.migrate().await?;
//!
//!     match store.load().await? {
//!         Some(session) => println!("signed in as {}", session.user.email),
//!         None => println!("anonymous"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod entry;
pub mod error;
pub mod models;

pub use error::{Result, StoreError};
pub use models::{StoredSession, AUTH_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Default location of the session database.
pub const DEFAULT_SESSION_DB: &str = "sqlite:paveos-session.db?mode=rwc";

/// Session database wrapper.
#[derive(Debug, Clone)]
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    /// The session is tiny and written rarely.
    const DEFAULT_POOL_SIZE: u32 = 2;

    /// Connect to a SQLite database.
    ///
    /// Use `?mode=rwc` to create the file if it doesn't exist, or
    /// `sqlite::memory:` for tests.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(Self::DEFAULT_POOL_SIZE)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        info!("Connected to session store: {}", url);

        Ok(Self { pool })
    }

    /// Run migrations. Call once after connecting.
    pub async fn migrate(&self) -> Result<()> {
        debug!("Running session store migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Load the persisted session.
    ///
    /// Returns `None` unless both the access token and a readable user are
    /// stored. An unreadable user is treated as signed out.
    pub async fn load(&self) -> Result<Option<StoredSession>> {
        let Some(access_token) = entry::get_entry(&self.pool, AUTH_TOKEN_KEY).await? else {
            return Ok(None);
        };
        let Some(user_json) = entry::get_entry(&self.pool, USER_KEY).await? else {
            return Ok(None);
        };
        let user = match serde_json::from_str(&user_json) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Stored user is unreadable, ignoring session");
                return Ok(None);
            }
        };
        let refresh_token = entry::get_entry(&self.pool, REFRESH_TOKEN_KEY).await?;

        Ok(Some(StoredSession {
            access_token,
            refresh_token,
            user,
        }))
    }

    /// Persist a session, replacing whatever was stored.
    pub async fn save(&self, session: &StoredSession) -> Result<()> {
        let user_json = serde_json::to_string(&session.user)?;

        let mut tx = self.pool.begin().await?;
        entry::set_entry(&mut *tx, AUTH_TOKEN_KEY, &session.access_token).await?;
        match &session.refresh_token {
            Some(token) => entry::set_entry(&mut *tx, REFRESH_TOKEN_KEY, token).await?,
            None => entry::delete_entry(&mut *tx, REFRESH_TOKEN_KEY).await?,
        }
        entry::set_entry(&mut *tx, USER_KEY, &user_json).await?;
        tx.commit().await?;

        debug!(user_id = %session.user.id, "Session saved");
        Ok(())
    }

    /// Remove every stored session entry.
    pub async fn clear(&self) -> Result<()> {
        entry::clear_all(&self.pool).await?;
        debug!("Session cleared");
        Ok(())
    }

    /// Stored refresh token, if any.
    pub async fn refresh_token(&self) -> Result<Option<String>> {
        entry::get_entry(&self.pool, REFRESH_TOKEN_KEY).await
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
