//! Sign-in lifecycle: persisted tokens, bearer auth and the realtime link.

use paveos_api::{AuthResponse, PaveClient, User, WhopHandoff};
use paveos_realtime::ConnectionManager;
use session_store::{SessionStore, StoredSession};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::{Result, ViewError};

/// Owns the signed-in user.
///
/// Every sign-in path persists the session, installs the bearer token and
/// creates the realtime connection. Sign-out undoes all three.
#[derive(Debug)]
pub struct SessionController {
    client: PaveClient,
    store: SessionStore,
    sockets: ConnectionManager,
    user: RwLock<Option<User>>,
}

impl SessionController {
    pub fn new(client: PaveClient, store: SessionStore, sockets: ConnectionManager) -> Self {
        Self {
            client,
            store,
            sockets,
            user: RwLock::new(None),
        }
    }

    pub fn client(&self) -> &PaveClient {
        &self.client
    }

    pub fn sockets(&self) -> &ConnectionManager {
        &self.sockets
    }

    /// Pick up a persisted session at startup. Returns the user when
    /// authenticated, `None` when anonymous.
    pub async fn restore(&self) -> Result<Option<User>> {
        let Some(session) = self.store.load().await? else {
            info!("No stored session");
            return Ok(None);
        };

        info!(user_id = %session.user.id, "Restoring session");
        self.activate(&session).await;
        Ok(Some(session.user))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ViewError::Validation(
                "Email and password are required".to_string(),
            ));
        }
        let auth = self.client.login(email.trim(), password).await?;
        self.establish(auth).await
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User> {
        if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(ViewError::Validation(
                "Name, email and password are required".to_string(),
            ));
        }
        let auth = self
            .client
            .register(name.trim(), email.trim(), password)
            .await?;
        self.establish(auth).await
    }

    /// Sign in to the shared demo account.
    pub async fn login_demo(&self) -> Result<User> {
        let auth = self.client.login_demo().await?;
        self.establish(auth).await
    }

    /// Exchange the embedding host's identity for a session.
    pub async fn login_with_whop(&self, handoff: &WhopHandoff) -> Result<User> {
        if handoff.whop_user_id.trim().is_empty() {
            return Err(ViewError::Validation("Whop user id is required".to_string()));
        }
        let auth = self.client.login_with_whop(handoff).await?;
        self.establish(auth).await
    }

    /// Sign out. The backend call is best effort; local state is always
    /// cleared and the realtime connection destroyed.
    pub async fn logout(&self) -> Result<()> {
        self.sockets.destroy();

        let refresh_token = match self.store.refresh_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Could not read refresh token");
                None
            }
        };
        if let Err(e) = self.client.logout(refresh_token.as_deref()).await {
            warn!(error = %e, "Backend logout failed");
        }

        self.client.set_access_token(None).await;
        *self.user.write().await = None;
        self.store.clear().await?;
        info!("Signed out");
        Ok(())
    }

    pub async fn current_user(&self) -> Option<User> {
        self.user.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.user.read().await.is_some()
    }

    async fn establish(&self, auth: AuthResponse) -> Result<User> {
        let session = StoredSession::from(auth);
        self.store.save(&session).await?;
        self.activate(&session).await;
        info!(user_id = %session.user.id, "Signed in");
        Ok(session.user)
    }

    async fn activate(&self, session: &StoredSession) {
        self.client
            .set_access_token(Some(session.access_token.clone()))
            .await;
        self.sockets.create(&session.user.id, &session.access_token);
        *self.user.write().await = Some(session.user.clone());
    }
}
