//! Workflows tying services and adapters into complete operations.

pub mod sign;

pub use sign::SignWorkflow;
