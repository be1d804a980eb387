//! KSRP Layout Compiler
//!
//! Turns validated protocol documents into packed C header declarations.
//! The [`protocol`] module computes the byte layout and synthesizes every
//! symbol; [`codegen`] renders the result through one of two emitters.

pub mod codegen;
pub mod compiler;
pub mod protocol;

pub use codegen::{Artifacts, CodegenView, ConstructEmitter, Emitter, EmitterKind, TemplateEmitter};
pub use compiler::{Compilation, Compiler, CompilerOptions};
pub use protocol::{NameSynthesizer, NamingScheme, Protocol, ProtocolBuilder};

pub use ksrp_loader;
pub use ksrp_types;
