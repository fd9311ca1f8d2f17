#![forbid(unsafe_code)]

//! Core domain model and business logic for the Celestial Pulse tracker.
//!
//! This crate provides:
//! - Domain types (movements, skills, step ladders, workout logs, users)
//! - The built-in catalog
//! - XP formulas and the progress state machine
//! - Weekly rollups
//! - User profiles, sessions and persistence (JSON records, export/import, CSV)

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod xp;
pub mod progress;
pub mod weekly;
pub mod transfer;
pub mod repository;
pub mod store;
pub mod csv_export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::Config;
pub use weekly::{WeekWindow, WeeklyStats};
pub use repository::{JsonFileRepository, MemoryRepository, UserRepository};
pub use store::{Session, UserStore};
pub use csv_export::export_logs_csv;
