//! Adapters for the three external collaborators: the local E-IMZO agent,
//! the Multibank timestamp service, and the Directum callback endpoint.

pub mod agent;
pub mod directum;
pub mod timestamp_http_client;

pub use agent::SigningAgent;
pub use directum::DirectumClient;
pub use timestamp_http_client::{TimestampHttpClient, TimestampHttpConfig};
