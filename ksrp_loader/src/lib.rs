//! KSRP Document Loading
//!
//! This crate reads protocol specification documents from disk, rejects
//! malformed ones at the boundary and hands validated raw records to the
//! layout builder in a deterministic order.

pub mod file;
pub mod loader;
pub mod validate;

// Re-export commonly used types at the crate root
pub use file::{ProtocolFile, SourceDocument};
pub use loader::SchemaLoader;

// Re-export ksrp_types for convenience
pub use ksrp_types;
