//! Geoflow Core - Domain models, errors, and configuration
//!
//! This crate contains the job, profile and print models shared by the
//! geoprocessing and cartographic crates, plus the layered configuration.

pub mod config;
pub mod error;
pub mod models;

pub use error::{GeoflowError, Result};
