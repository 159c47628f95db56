//! Availability and lead intake engines behind the marketing site.

pub mod availability;
pub mod config;
pub mod error;
pub mod leads;
pub mod telemetry;
