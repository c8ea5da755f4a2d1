//! The backend operations view-models depend on.

use async_trait::async_trait;

use crate::client::PaveClient;
use crate::error::ApiError;
use crate::types::{
    AnalyticsSummary, Lead, LeadDetail, LeadList, LeadQuery, LeadStats, LeadUpdate, SendMessage,
    TimeRange,
};

/// Lead, message and analytics operations.
///
/// [`PaveClient`] is the production implementation. View-models are generic
/// over this trait so they can run against an in-memory backend.
#[async_trait]
pub trait LeadService: Send + Sync {
    /// List leads matching the query.
    async fn list_leads(&self, query: &LeadQuery) -> Result<LeadList, ApiError>;

    /// Fetch one lead with its message history.
    async fn get_lead(&self, id: &str) -> Result<LeadDetail, ApiError>;

    /// Apply a partial update and return the stored lead.
    async fn update_lead(&self, id: &str, update: &LeadUpdate) -> Result<Lead, ApiError>;

    /// Mark one message as read.
    async fn mark_message_read(&self, message_id: &str) -> Result<(), ApiError>;

    /// Send an outgoing message.
    async fn send_message(&self, message: &SendMessage) -> Result<(), ApiError>;

    /// Lead counts per stage and source.
    async fn lead_stats(&self) -> Result<LeadStats, ApiError>;

    /// Analytics summary for a time range.
    async fn analytics(&self, range: TimeRange) -> Result<AnalyticsSummary, ApiError>;
}

#[async_trait]
impl LeadService for PaveClient {
    async fn list_leads(&self, query: &LeadQuery) -> Result<LeadList, ApiError> {
        PaveClient::list_leads(self, query).await
    }

    async fn get_lead(&self, id: &str) -> Result<LeadDetail, ApiError> {
        PaveClient::get_lead(self, id).await
    }

    async fn update_lead(&self, id: &str, update: &LeadUpdate) -> Result<Lead, ApiError> {
        PaveClient::update_lead(self, id, update).await
    }

    async fn mark_message_read(&self, message_id: &str) -> Result<(), ApiError> {
        PaveClient::mark_message_read(self, message_id).await
    }

    async fn send_message(&self, message: &SendMessage) -> Result<(), ApiError> {
        PaveClient::send_message(self, message).await
    }

    async fn lead_stats(&self) -> Result<LeadStats, ApiError> {
        PaveClient::lead_stats(self).await
    }

    async fn analytics(&self, range: TimeRange) -> Result<AnalyticsSummary, ApiError> {
        PaveClient::analytics(self, range).await
    }
}
