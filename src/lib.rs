//! # Esports Insights
//!
//! Long-term trend and correlation analysis over a team's match history
//! and recorded mistakes, with optional AI-written summaries.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (matches, mistakes, players, insights)
//! - **calculate**: The trend and correlation engine
//! - **agents**: AI narrative generation
//! - **storage**: Filesystem data lake operations (JSONL)
//! - **ingest**: Tagged import payloads
//! - **fetch**: GraphQL stats API client
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod agents;
pub mod api;
pub mod calculate;
pub mod config;
pub mod fetch;
pub mod ingest;
pub mod models;
pub mod storage;

pub use calculate::{analyze_long_term_trends, analyze_with, AnalysisParams};
pub use models::*;
