//! Core types for leekcal.
//!
//! This crate provides the pieces of the pipeline with no network or HTML
//! dependencies:
//! - `EventRecord`, the scraper-neutral event type
//! - the ordered icon classifier
//! - feed configuration
//! - ICS generation and round-trip parsing

pub mod classify;
pub mod config;
pub mod error;
pub mod event;
pub mod ics;

pub use classify::{IconRule, IconTable};
pub use config::FeedConfig;
pub use error::{LeekCalError, LeekCalResult};
pub use event::EventRecord;
