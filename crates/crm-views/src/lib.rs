//! View-models for the PaveOS CRM.
//!
//! Each view owns the state a screen renders and the operations it offers,
//! talking to the backend through [`paveos_api::LeadService`] and to the
//! realtime channel through [`paveos_realtime::ConnectionManager`]:
//!
//! - [`SessionController`]: sign-in, restore and sign-out
//! - [`LeadInbox`]: lead list with client-side filters
//! - [`LeadConversation`]: one lead's thread with live updates
//! - [`PipelineBoard`]: stage columns, drag-and-drop and metrics
//! - [`AnalyticsView`]: range-scoped summary and chart series
//!
//! User-facing outcomes are reported through a [`Notifier`].

pub mod analytics;
pub mod conversation;
pub mod error;
pub mod leads;
pub mod notify;
pub mod pipeline;
pub mod session;

#[cfg(test)]
mod testing;

pub use analytics::{
    format_currency, AnalyticsView, ChartColor, HeadlineStat, SourceSlice, StagePoint,
};
pub use conversation::LeadConversation;
pub use error::{Result, ViewError};
pub use leads::{LeadFilter, LeadInbox};
pub use notify::{Notification, NotificationLevel, Notifier};
pub use pipeline::{pipeline_metrics, Board, DropOutcome, PipelineBoard, PipelineMetrics, StageColumn};
pub use session::SessionController;
