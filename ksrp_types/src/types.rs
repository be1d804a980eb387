use serde_derive::{Deserialize, Serialize};
use std::fmt;

/* Literal written in a protocol document (defaults, health-check bounds) */
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(untagged)]
#[serde(expecting = "expected a boolean, an integer, a floating point number or an enum label")]
pub enum Literal {
    Bool(bool),
    Integer(i64),
    /* Only integers above `i64::MAX` land here */
    Unsigned(u64),
    Float(f64),
    Label(String),
}

impl Literal {
    /* Exact value of an integer literal */
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Literal::Integer(i) => Some(i128::from(*i)),
            Literal::Unsigned(u) => Some(i128::from(*u)),
            _ => None,
        }
    }

    /* Numeric view of the literal, used for ordering range bounds */
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Literal::Integer(i) => Some(*i as f64),
            Literal::Unsigned(u) => Some(*u as f64),
            Literal::Float(f) => Some(*f),
            Literal::Label(_) => None,
        }
    }
}

/* C source form of the literal */
impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{}", b),
            /* `-9223372036854775808` negates a constant that does not fit `long long` */
            Literal::Integer(i64::MIN) => write!(f, "(-{}LL - 1)", i64::MAX),
            Literal::Integer(i) => write!(f, "{}", i),
            Literal::Unsigned(u) => write!(f, "{}ULL", u),
            Literal::Float(v) => write!(f, "{:?}", v),
            Literal::Label(label) => write!(f, "{}", label),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum HealthCheckKind {
    Exact,
    Range,
}

impl fmt::Display for HealthCheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthCheckKind::Exact => write!(f, "exact"),
            HealthCheckKind::Range => write!(f, "range"),
        }
    }
}

/* Health check as written in the document; shape is validated by the builder */
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct HealthCheckDef {
    #[serde(rename = "type")]
    pub kind: HealthCheckKind,
    #[serde(default)]
    pub value: Option<Literal>,
    #[serde(default)]
    pub min: Option<Literal>,
    #[serde(default)]
    pub max: Option<Literal>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub troubleshoot: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/* One entry of an enum field's `values` list */
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(untagged)]
#[serde(expecting = "expected an enum label or a mapping with `name` and `value`")]
pub enum EnumValueDef {
    Label(String),
    Explicit { name: String, value: i64 },
}

impl EnumValueDef {
    pub fn name(&self) -> &str {
        match self {
            EnumValueDef::Label(name) => name,
            EnumValueDef::Explicit { name, .. } => name,
        }
    }

    pub fn explicit_value(&self) -> Option<i64> {
        match self {
            EnumValueDef::Label(_) => None,
            EnumValueDef::Explicit { value, .. } => Some(*value),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub default: Option<Literal>,
    #[serde(default)]
    pub values: Vec<EnumValueDef>,
    #[serde(default)]
    pub health_checks: Vec<HealthCheckDef>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct FrameDef {
    pub name: String,
    pub frame_id: u8,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct ProtocolDef {
    pub subsystem: String,
    pub subsystem_id: u8,
    /* Every frame is prefixed with a device id when set */
    #[serde(default, alias = "multiple_devices")]
    pub multi_device: bool,
    #[serde(default)]
    pub frames: Vec<FrameDef>,
}
