//! Lifeflow Engine - Scoring, correlation and streak engine for daily habit and mood tracking
//!
//! The engine takes a snapshot of habits, wishes and daily check-ins and
//! derives everything the tracker shows: per-day consistency scores,
//! habit/wellbeing correlations, streaks, weekly comparisons, wish progress
//! and period trends.
//!
//! ## Modules
//!
//! - **Engines**: `scoring`, `correlation`, `streaks`, `weekly`, `wishes`, `trends`
//! - **Data**: `store` (in-memory mutation with score bookkeeping), `validation`, `export`
//! - **Surfaces**: `pipeline` (JSON in / JSON out), `ffi` (C ABI), the `lifeflow` CLI

pub mod config;
pub mod correlation;
pub mod dates;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod scoring;
pub mod store;
pub mod streaks;
pub mod trends;
pub mod types;
pub mod validation;
pub mod weekly;
pub mod wishes;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::EngineConfig;
pub use dates::TimePeriod;
pub use error::ComputeError;
pub use pipeline::{recalculate_snapshot, snapshot_to_insights, InsightsProcessor};
pub use store::LifeflowStore;
pub use types::{DailyEntry, Habit, HabitCompletion, HabitType, InsightsReport, Snapshot, Wish};

/// Engine version reported by the CLI and FFI
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by diagnostics
pub const PRODUCER_NAME: &str = "lifeflow-engine";
