//! Domain layer: payload parsing, key handle cache, encodings, core types.

pub mod encoding;
pub mod keycache;
pub mod payload;
pub mod types;
