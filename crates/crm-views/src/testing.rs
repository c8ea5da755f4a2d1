//! In-memory backend for view-model tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use paveos_api::{
    AnalyticsSummary, ApiError, Lead, LeadDetail, LeadList, LeadQuery, LeadService, LeadSource,
    LeadStats, LeadStatus, LeadUpdate, Message, MessageDirection, Pagination, SendMessage,
    TimeRange,
};
use parking_lot::Mutex;

pub(crate) fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_714_557_600 + secs, 0).unwrap()
}

pub(crate) fn lead(id: &str, status: LeadStatus, estimated: Option<f64>) -> Lead {
    Lead {
        id: id.to_string(),
        name: format!("Lead {id}"),
        email: Some(format!("{}@example.com", id.to_lowercase())),
        phone: None,
        discord_user_id: None,
        discord_username: None,
        instagram_username: None,
        tiktok_username: None,
        source: LeadSource::Discord,
        status,
        tags: Vec::new(),
        notes: None,
        last_contact_date: None,
        next_follow_up_date: None,
        estimated_value: estimated,
        actual_value: None,
        won_at: None,
        created_at: at(0),
        updated_at: at(0),
        unread_count: 0,
    }
}

pub(crate) fn message(
    id: &str,
    lead_id: &str,
    direction: MessageDirection,
    secs: i64,
    is_read: bool,
) -> Message {
    Message {
        id: id.to_string(),
        lead_id: Some(lead_id.to_string()),
        content: format!("message {id}"),
        direction,
        author_username: Some("buyer42".to_string()),
        is_read,
        attachments: Vec::new(),
        created_at: at(secs),
    }
}

fn boom() -> ApiError {
    ApiError::Server {
        status: 500,
        message: "boom".to_string(),
    }
}

/// Records every call and answers from in-memory state.
#[derive(Default)]
pub(crate) struct FakeBackend {
    pub leads: Mutex<Vec<Lead>>,
    pub messages: Mutex<HashMap<String, Vec<Message>>>,
    pub summary: Mutex<AnalyticsSummary>,
    pub stats: Mutex<Option<LeadStats>>,

    pub fail_list: Mutex<bool>,
    pub fail_updates: Mutex<bool>,
    pub fail_sends: Mutex<bool>,
    pub fail_analytics: Mutex<bool>,
    pub fail_reads: Mutex<HashSet<String>>,

    pub update_calls: Mutex<Vec<(String, LeadUpdate)>>,
    pub read_calls: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<SendMessage>>,
    pub analytics_calls: Mutex<Vec<TimeRange>>,
}

impl FakeBackend {
    pub fn with_leads(leads: Vec<Lead>) -> Self {
        let backend = Self::default();
        *backend.leads.lock() = leads;
        backend
    }

    pub fn set_messages(&self, lead_id: &str, messages: Vec<Message>) {
        self.messages.lock().insert(lead_id.to_string(), messages);
    }
}

#[async_trait]
impl LeadService for FakeBackend {
    async fn list_leads(&self, query: &LeadQuery) -> Result<LeadList, ApiError> {
        if *self.fail_list.lock() {
            return Err(boom());
        }
        let leads: Vec<Lead> = self
            .leads
            .lock()
            .iter()
            .filter(|lead| query.status.as_ref().map_or(true, |s| &lead.status == s))
            .cloned()
            .collect();
        Ok(LeadList {
            pagination: Pagination {
                page: 1,
                limit: leads.len() as u32,
                total: leads.len() as u64,
                total_pages: 1,
            },
            leads,
        })
    }

    async fn get_lead(&self, id: &str) -> Result<LeadDetail, ApiError> {
        let lead = self
            .leads
            .lock()
            .iter()
            .find(|lead| lead.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound("Lead not found".to_string()))?;
        let messages = self.messages.lock().get(id).cloned().unwrap_or_default();
        Ok(LeadDetail { lead, messages })
    }

    async fn update_lead(&self, id: &str, update: &LeadUpdate) -> Result<Lead, ApiError> {
        self.update_calls
            .lock()
            .push((id.to_string(), update.clone()));
        if *self.fail_updates.lock() {
            return Err(boom());
        }
        let mut leads = self.leads.lock();
        let lead = leads
            .iter_mut()
            .find(|lead| lead.id == id)
            .ok_or_else(|| ApiError::NotFound("Lead not found".to_string()))?;
        if let Some(status) = &update.status {
            lead.status = status.clone();
        }
        if let Some(name) = &update.name {
            lead.name = name.clone();
        }
        if let Some(notes) = &update.notes {
            lead.notes = Some(notes.clone());
        }
        if let Some(value) = update.estimated_value {
            lead.estimated_value = Some(value);
        }
        lead.updated_at = at(60);
        Ok(lead.clone())
    }

    async fn mark_message_read(&self, message_id: &str) -> Result<(), ApiError> {
        self.read_calls.lock().push(message_id.to_string());
        if self.fail_reads.lock().contains(message_id) {
            return Err(boom());
        }
        Ok(())
    }

    async fn send_message(&self, message: &SendMessage) -> Result<(), ApiError> {
        self.sent.lock().push(message.clone());
        if *self.fail_sends.lock() {
            return Err(boom());
        }
        Ok(())
    }

    async fn lead_stats(&self) -> Result<LeadStats, ApiError> {
        self.stats.lock().clone().ok_or_else(boom)
    }

    async fn analytics(&self, range: TimeRange) -> Result<AnalyticsSummary, ApiError> {
        self.analytics_calls.lock().push(range);
        if *self.fail_analytics.lock() {
            return Err(boom());
        }
        Ok(self.summary.lock().clone())
    }
}
