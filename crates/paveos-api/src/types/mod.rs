//! Request and response types for the PaveOS API.

mod analytics;
mod auth;
mod common;
mod contact;
mod dashboard;
mod deal;
mod integration;
mod lead;
mod message;

pub use analytics::*;
pub use auth::*;
pub use common::*;
pub use contact::*;
pub use dashboard::*;
pub use deal::*;
pub use integration::*;
pub use lead::*;
pub use message::*;
