#![forbid(unsafe_code)]

//! Core domain model and scheduling logic for herdbook.
//!
//! This crate provides:
//! - Domain types (ear tags, sex, category, treatment kinds)
//! - Treatment date derivation and calf treatment chains
//! - The herd registry with ringworm batching and weekly job lists
//! - Persistence (herd CSV store, weight log) and configuration

pub mod types;
pub mod error;
pub mod calendar;
pub mod treatment;
pub mod calf;
pub mod batching;
pub mod herd;
pub mod store;
pub mod weights;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use treatment::Treatment;
pub use calf::{Branch, CalfRecord, Deworming};
pub use herd::{CalfRow, HerdRegistry, Job};
pub use store::{CsvStore, HerdStore};
pub use weights::{append_weights, read_weights, WeightEntry};
pub use config::Config;
