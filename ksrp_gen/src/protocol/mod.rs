pub mod builder;
pub mod ir;
pub mod naming;
pub mod symbols;

pub use builder::ProtocolBuilder;
pub use ir::{Condition, EnumValue, Field, FieldKind, Frame, HealthCheck, Protocol};
pub use naming::{NameSynthesizer, NamingScheme};
pub use symbols::{Owner, SymbolTable};
