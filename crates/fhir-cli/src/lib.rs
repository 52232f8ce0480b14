//! CLI library components for the FHIR bundler.

pub mod cli;
pub mod config;
pub mod logging;
