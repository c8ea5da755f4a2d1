//! PaveOS CRM API client library.
//!
//! This crate provides a Rust client for the PaveOS backend REST API. It
//! covers:
//!
//! - Authentication (email/password, demo account, Whop embedding handoff)
//! - Leads, lead messages and lead statistics
//! - Contacts, deals, dashboard and analytics summaries
//! - Discord and Whop integration management
//!
//! Every endpoint answers with a `{success, data}` envelope which the client
//! unwraps into typed values.
//!
//! # Example
//!
//! ```no_run
//! use paveos_api::{ApiConfig, LeadQuery, PaveClient};
//!
//! # async fn example() -> Result<(), paveos_api::ApiError> {
//! let client = PaveClient::new(ApiConfig::default())?;
//!
//! let auth = client.login("creator@example.com", "hunter2").await?;
//! client.set_access_token(Some(auth.access_token.clone())).await;
//!
//! let page = client.list_leads(&LeadQuery::default()).await?;
//! for lead in page.leads {
//!     println!("{} is {}", lead.name, lead.status.display_name());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod service;
pub mod types;

pub use client::PaveClient;
pub use config::{ApiConfig, ConfigError};
pub use error::ApiError;
pub use service::LeadService;
pub use types::*;

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
