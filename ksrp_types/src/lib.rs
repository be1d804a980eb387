//! KSRP Type Definitions
//!
//! This crate contains the core definitions shared by the status report
//! protocol compiler: the primitive type registry, the raw protocol document
//! model and the error taxonomy. It holds no file I/O or code generation
//! logic.

pub mod error;
pub mod registry;
pub mod types;

// Re-export commonly used types at the crate root
pub use error::{CompileError, CompileResult, Location};
pub use registry::{Storage, TypeClass, TypeEntry, TypeRegistry};
pub use types::*;
