//! Infrastructure: errors and configuration management.

pub mod config;
pub mod error;
