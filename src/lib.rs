//! dashload - partial-data loading and staleness management for dashboards
//!
//! This library provides the client-side orchestration layer that dashboard
//! views sit on top of: independent data sections are loaded through
//! caller-supplied async loaders, failed loads are retried with exponential
//! backoff, loaded data is marked stale after a freshness threshold, and
//! deferred UI panels are prefetched by priority or on hover intent.
//!
//! # High-Level API
//!
//! ```ignore
//! use std::sync::Arc;
//! use dashload::config::{CoordinatorConfig, LoadOptions};
//! use dashload::section::LoadCoordinator;
//!
//! let coordinator = Arc::new(LoadCoordinator::new(CoordinatorConfig::default()));
//!
//! let metrics = coordinator
//!     .load_section("financial", "Financial Metrics", loader, LoadOptions::default())
//!     .await;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod notify;
pub mod preload;
pub mod retry;
pub mod section;

/// Version of the dashload library.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
