//! skill-sync - reconcile plugin and project-local skill metadata into one
//! versioned index.
//!
//! Pipeline: [`sources`] (loader, parser) → [`core::merge`] →
//! [`core::diff`] → [`core::classify`] → [`index`] / [`report`], driven by
//! [`engine::SyncEngine`].

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod index;
pub mod report;
pub mod sources;
pub mod test_utils;
pub mod utils;

pub use error::{Result, SyncError};
