//! Lead inbox: the loaded lead list, client-side filters and stage counts.

use std::sync::Arc;

use paveos_api::{Lead, LeadQuery, LeadService, LeadSource, LeadStats, LeadStatus};
use tracing::warn;

use crate::error::Result;
use crate::notify::Notifier;

/// Client-side filter over a loaded lead list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadFilter {
    /// Case-insensitive match on name, email or Discord username.
    pub search: Option<String>,
    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,
}

impl LeadFilter {
    pub fn is_empty(&self) -> bool {
        self.search.as_deref().map_or(true, |s| s.trim().is_empty())
            && self.status.is_none()
            && self.source.is_none()
    }

    pub fn matches(&self, lead: &Lead) -> bool {
        let matches_search = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                let contains = |field: Option<&str>| {
                    field.is_some_and(|value| value.to_lowercase().contains(&needle))
                };
                contains(Some(lead.name.as_str()))
                    || contains(lead.email.as_deref())
                    || contains(lead.discord_username.as_deref())
            }
        };

        matches_search
            && self.status.as_ref().map_or(true, |s| &lead.status == s)
            && self.source.as_ref().map_or(true, |s| &lead.source == s)
    }

    pub fn apply<'a>(&self, leads: &'a [Lead]) -> Vec<&'a Lead> {
        leads.iter().filter(|lead| self.matches(lead)).collect()
    }
}

pub struct LeadInbox {
    service: Arc<dyn LeadService>,
    notifier: Notifier,
    leads: Vec<Lead>,
    stats: Option<LeadStats>,
}

impl LeadInbox {
    pub fn new(service: Arc<dyn LeadService>, notifier: Notifier) -> Self {
        Self {
            service,
            notifier,
            leads: Vec::new(),
            stats: None,
        }
    }

    /// Load leads and stage counts. A stats failure is only logged.
    pub async fn load(&mut self) -> Result<()> {
        match self.service.list_leads(&LeadQuery::default()).await {
            Ok(list) => self.leads = list.leads,
            Err(e) => {
                self.notifier.error(e.user_message());
                return Err(e.into());
            }
        }

        match self.service.lead_stats().await {
            Ok(stats) => self.stats = Some(stats),
            Err(e) => warn!(error = %e, "Failed to load lead stats"),
        }
        Ok(())
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    pub fn stats(&self) -> Option<&LeadStats> {
        self.stats.as_ref()
    }

    pub fn filtered(&self, filter: &LeadFilter) -> Vec<&Lead> {
        filter.apply(&self.leads)
    }
}
