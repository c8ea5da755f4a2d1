//! PaveOS REST API client.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::types::*;

/// Client for the PaveOS backend.
///
/// Cheap to clone; clones share the HTTP connection pool and the bearer
/// token, so a token set after sign-in is seen by every clone.
#[derive(Clone)]
pub struct PaveClient {
    http: Client,
    config: ApiConfig,
    access_token: Arc<RwLock<Option<String>>>,
}

impl PaveClient {
    /// Create a client. No request is made until the first call.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(ApiError::Http)?;

        Ok(Self {
            http,
            config,
            access_token: Arc::new(RwLock::new(None)),
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Replace (or clear) the bearer token sent with every request.
    pub async fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write().await = token;
    }

    /// Whether a bearer token is currently set.
    pub async fn has_access_token(&self) -> bool {
        self.access_token.read().await.is_some()
    }

    // ----- auth -----------------------------------------------------------

    /// Create an account.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        let body = RegisterRequest {
            name,
            email,
            password,
        };
        self.call(Method::POST, "/auth/register", Some(&body)).await
    }

    /// Sign in with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let body = LoginRequest { email, password };
        self.call(Method::POST, "/auth/login", Some(&body)).await
    }

    /// Sign in to the shared demo account.
    pub async fn login_demo(&self) -> Result<AuthResponse, ApiError> {
        self.call::<(), _>(Method::POST, "/auth/demo", None).await
    }

    /// Exchange an embedding-host identity for PaveOS tokens.
    pub async fn login_with_whop(&self, handoff: &WhopHandoff) -> Result<AuthResponse, ApiError> {
        info!(whop_user_id = %handoff.whop_user_id, "Exchanging Whop identity for session");
        self.call(Method::POST, "/auth/whop", Some(handoff)).await
    }

    /// Trade a refresh token for a new access token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshResponse, ApiError> {
        let body = serde_json::json!({ "refreshToken": refresh_token });
        self.call(Method::POST, "/auth/refresh", Some(&body)).await
    }

    /// Revoke the refresh token on the backend.
    pub async fn logout(&self, refresh_token: Option<&str>) -> Result<(), ApiError> {
        let body = serde_json::json!({ "refreshToken": refresh_token });
        self.call_unit(Method::POST, "/auth/logout", Some(&body)).await
    }

    // ----- leads ----------------------------------------------------------

    /// List leads matching the query.
    pub async fn list_leads(&self, query: &LeadQuery) -> Result<LeadList, ApiError> {
        let builder = self.request(Method::GET, "/leads").await.query(query);
        self.execute("/leads", builder).await
    }

    /// Fetch one lead with its message history.
    pub async fn get_lead(&self, id: &str) -> Result<LeadDetail, ApiError> {
        self.call::<(), _>(Method::GET, &format!("/leads/{}", encode(id)), None)
            .await
    }

    /// Create a lead.
    pub async fn create_lead(&self, lead: &LeadUpdate) -> Result<Lead, ApiError> {
        match &lead.name {
            Some(name) if !name.trim().is_empty() => {}
            _ => return Err(ApiError::Validation("Lead name is required".to_string())),
        }
        self.call(Method::POST, "/leads", Some(lead)).await
    }

    /// Apply a partial update to a lead.
    pub async fn update_lead(&self, id: &str, update: &LeadUpdate) -> Result<Lead, ApiError> {
        self.call(Method::PATCH, &format!("/leads/{}", encode(id)), Some(update))
            .await
    }

    /// Delete a lead.
    pub async fn delete_lead(&self, id: &str) -> Result<(), ApiError> {
        self.call_unit::<()>(Method::DELETE, &format!("/leads/{}", encode(id)), None)
            .await
    }

    /// Lead counts per stage and source.
    pub async fn lead_stats(&self) -> Result<LeadStats, ApiError> {
        let raw: RawLeadStats = self
            .call::<(), _>(Method::GET, "/leads/stats", None)
            .await?;
        Ok(LeadStats::from(raw))
    }

    // ----- messages -------------------------------------------------------

    /// List conversation messages.
    pub async fn list_messages(&self, query: &MessageQuery) -> Result<MessageList, ApiError> {
        let path = "/integrations/discord/messages";
        let builder = self.request(Method::GET, path).await.query(query);
        self.execute(path, builder).await
    }

    /// Send a message through the Discord bot.
    ///
    /// Any successful envelope counts as sent; the backend may omit `data`.
    pub async fn send_message(&self, message: &SendMessage) -> Result<(), ApiError> {
        if message.content.trim().is_empty() {
            return Err(ApiError::Validation("Please enter a message".to_string()));
        }
        if message.channel_id.is_none() && message.discord_user_id.is_none() {
            return Err(ApiError::Validation(
                "A channel or Discord user is required".to_string(),
            ));
        }
        self.call_unit(Method::POST, "/integrations/discord/send-message", Some(message))
            .await
    }

    /// Mark one message as read.
    pub async fn mark_message_read(&self, message_id: &str) -> Result<(), ApiError> {
        let path = format!("/integrations/discord/messages/{}/read", encode(message_id));
        self.call_unit::<()>(Method::PATCH, &path, None).await
    }

    // ----- analytics & dashboard -----------------------------------------

    /// Analytics summary for a time range.
    pub async fn analytics(&self, range: TimeRange) -> Result<AnalyticsSummary, ApiError> {
        let path = "/dashboard/analytics";
        let builder = self
            .request(Method::GET, path)
            .await
            .query(&[("timeRange", range.as_query())]);
        self.execute(path, builder).await
    }

    /// Dashboard headline numbers.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        self.call::<(), _>(Method::GET, "/dashboard/stats", None).await
    }

    /// Recent activity feed.
    pub async fn recent_activity(&self, limit: u32) -> Result<Vec<RecentActivity>, ApiError> {
        let path = "/dashboard/recent-activity";
        let builder = self.request(Method::GET, path).await.query(&[("limit", limit)]);
        self.execute(path, builder).await
    }

    /// Revenue chart points.
    pub async fn revenue_chart(&self, period: RevenuePeriod) -> Result<Vec<RevenuePoint>, ApiError> {
        let path = "/dashboard/revenue-chart";
        let builder = self
            .request(Method::GET, path)
            .await
            .query(&[("period", period)]);
        self.execute(path, builder).await
    }

    // ----- contacts -------------------------------------------------------

    /// List contacts.
    pub async fn list_contacts(&self, filters: &ContactFilters) -> Result<Page<Contact>, ApiError> {
        let builder = self.request(Method::GET, "/contacts").await.query(filters);
        self.execute_paginated("/contacts", builder).await
    }

    /// Fetch one contact.
    pub async fn get_contact(&self, id: &str) -> Result<Contact, ApiError> {
        self.call::<(), _>(Method::GET, &format!("/contacts/{}", encode(id)), None)
            .await
    }

    /// Create a contact.
    pub async fn create_contact(&self, contact: &ContactDraft) -> Result<Contact, ApiError> {
        match &contact.name {
            Some(name) if !name.trim().is_empty() => {}
            _ => return Err(ApiError::Validation("Contact name is required".to_string())),
        }
        self.call(Method::POST, "/contacts", Some(contact)).await
    }

    /// Update a contact.
    pub async fn update_contact(&self, id: &str, contact: &ContactDraft) -> Result<Contact, ApiError> {
        self.call(Method::PUT, &format!("/contacts/{}", encode(id)), Some(contact))
            .await
    }

    /// Delete a contact.
    pub async fn delete_contact(&self, id: &str) -> Result<(), ApiError> {
        self.call_unit::<()>(Method::DELETE, &format!("/contacts/{}", encode(id)), None)
            .await
    }

    // ----- deals ----------------------------------------------------------

    /// List deals.
    pub async fn list_deals(&self, filters: &DealFilters) -> Result<Page<Deal>, ApiError> {
        let builder = self.request(Method::GET, "/deals").await.query(filters);
        self.execute_paginated("/deals", builder).await
    }

    /// Fetch one deal.
    pub async fn get_deal(&self, id: &str) -> Result<Deal, ApiError> {
        self.call::<(), _>(Method::GET, &format!("/deals/{}", encode(id)), None)
            .await
    }

    /// Create a deal.
    pub async fn create_deal(&self, deal: &DealDraft) -> Result<Deal, ApiError> {
        match &deal.brand_name {
            Some(brand) if !brand.trim().is_empty() => {}
            _ => return Err(ApiError::Validation("Brand name is required".to_string())),
        }
        self.call(Method::POST, "/deals", Some(deal)).await
    }

    /// Update a deal.
    pub async fn update_deal(&self, id: &str, deal: &DealDraft) -> Result<Deal, ApiError> {
        self.call(Method::PUT, &format!("/deals/{}", encode(id)), Some(deal))
            .await
    }

    /// Move a deal to another stage.
    pub async fn update_deal_stage(&self, id: &str, stage: DealStage) -> Result<Deal, ApiError> {
        let body = DealStageUpdate { stage };
        self.call(Method::PATCH, &format!("/deals/{}/stage", encode(id)), Some(&body))
            .await
    }

    /// Delete a deal.
    pub async fn delete_deal(&self, id: &str) -> Result<(), ApiError> {
        self.call_unit::<()>(Method::DELETE, &format!("/deals/{}", encode(id)), None)
            .await
    }

    // ----- integrations ---------------------------------------------------

    /// Discord integration status.
    pub async fn discord_status(&self) -> Result<DiscordStatus, ApiError> {
        self.call::<(), _>(Method::GET, "/integrations/discord/status", None)
            .await
    }

    /// URL the user visits to authorize the Discord bot.
    pub async fn discord_oauth_url(&self) -> Result<String, ApiError> {
        let resp: OAuthUrl = self
            .call::<(), _>(Method::GET, "/integrations/discord/oauth-url", None)
            .await?;
        Ok(resp.url)
    }

    /// Complete the Discord OAuth flow.
    pub async fn discord_callback(&self, code: &str, state: &str) -> Result<DiscordStatus, ApiError> {
        let body = OAuthCallback { code, state };
        self.call(Method::POST, "/integrations/discord/callback", Some(&body))
            .await
    }

    /// Disconnect Discord.
    pub async fn discord_disconnect(&self) -> Result<(), ApiError> {
        self.call_unit::<()>(Method::POST, "/integrations/discord/disconnect", None)
            .await
    }

    /// Import members of the connected Discord server as leads.
    pub async fn discord_sync_members(&self) -> Result<SyncResult, ApiError> {
        self.call::<(), _>(Method::POST, "/integrations/discord/sync-members", None)
            .await
    }

    /// Start the Discord bot.
    pub async fn discord_start_bot(&self) -> Result<(), ApiError> {
        self.call_unit::<()>(Method::POST, "/integrations/discord/start-bot", None)
            .await
    }

    /// Stop the Discord bot.
    pub async fn discord_stop_bot(&self) -> Result<(), ApiError> {
        self.call_unit::<()>(Method::POST, "/integrations/discord/stop-bot", None)
            .await
    }

    /// Whop integration status.
    pub async fn whop_status(&self) -> Result<WhopStatus, ApiError> {
        self.call::<(), _>(Method::GET, "/integrations/whop/status", None)
            .await
    }

    /// Connect the Whop company.
    pub async fn whop_connect(&self) -> Result<WhopConnection, ApiError> {
        self.call::<(), _>(Method::POST, "/integrations/whop/connect", None)
            .await
    }

    /// Disconnect Whop.
    pub async fn whop_disconnect(&self) -> Result<(), ApiError> {
        self.call_unit::<()>(Method::POST, "/integrations/whop/disconnect", None)
            .await
    }

    /// Import Whop customers as leads.
    pub async fn whop_sync(&self) -> Result<SyncResult, ApiError> {
        self.call::<(), _>(Method::POST, "/integrations/whop/sync", None)
            .await
    }

    // ----- plumbing -------------------------------------------------------

    /// Start a request with the bearer token attached.
    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.config.endpoint(path);
        let builder = self.http.request(method, url);
        match self.access_token.read().await.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request with an optional JSON body and unwrap `data`.
    async fn call<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<R, ApiError> {
        let mut builder = self.request(method, path).await;
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.execute(path, builder).await
    }

    /// Like [`call`](Self::call) for endpoints whose `data` is irrelevant.
    async fn call_unit<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), ApiError> {
        let mut builder = self.request(method, path).await;
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let envelope: Envelope<serde_json::Value> = self.send_envelope(path, builder).await?;
        check_success(&envelope)?;
        Ok(())
    }

    async fn execute<R: DeserializeOwned>(
        &self,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<R, ApiError> {
        let envelope: Envelope<R> = self.send_envelope(path, builder).await?;
        check_success(&envelope)?;
        envelope
            .data
            .ok_or_else(|| ApiError::MissingData(path.to_string()))
    }

    async fn execute_paginated<T: DeserializeOwned>(
        &self,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<Page<T>, ApiError> {
        let envelope: PaginatedEnvelope<T> = self.send_envelope(path, builder).await?;
        if !envelope.success {
            return Err(ApiError::Rejected(
                envelope.error.unwrap_or_else(|| "Request failed".to_string()),
            ));
        }
        Ok(Page {
            items: envelope.data,
            pagination: envelope.pagination,
        })
    }

    /// Send the request, map HTTP failures, and decode the body.
    async fn send_envelope<E: DeserializeOwned>(
        &self,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<E, ApiError> {
        debug!("API request: {}", path);

        let response = builder.send().await.map_err(ApiError::Http)?;
        let status = response.status();
        let body = response.text().await.map_err(ApiError::Http)?;

        if !status.is_success() {
            let message = failure_message(status, &body);
            warn!(path = %path, status = status.as_u16(), "API request failed: {}", message);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
                StatusCode::NOT_FOUND => ApiError::NotFound(message),
                _ => ApiError::Server {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        serde_json::from_str(&body).map_err(ApiError::Json)
    }
}

impl std::fmt::Debug for PaveClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaveClient")
            .field("config", &self.config)
            .finish()
    }
}

fn check_success<T>(envelope: &Envelope<T>) -> Result<(), ApiError> {
    if envelope.success {
        Ok(())
    } else {
        Err(ApiError::Rejected(
            envelope.failure_text().unwrap_or("Request failed").to_string(),
        ))
    }
}

/// Pick the most useful text out of an error response.
fn failure_message(status: StatusCode, body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .error
        .or(parsed.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        })
}

fn encode(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}
