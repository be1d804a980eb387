use ksrp_types::Literal;
use serde_derive::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Protocol {
  pub subsystem: String,
  pub subsystem_id: u8,
  pub multi_device: bool,
  pub source: PathBuf,
  pub frames: Vec<Frame>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
  pub name: String,
  pub id: u8,
  pub fields: Vec<Field>,
}

impl Frame {
  /* Total packed size; always derived from the fields, never stored */
  pub fn size(&self) -> u64 {
    self.fields.iter().map(|field| field.width).sum()
  }

  /* Fields written by the document author, without the injected device id */
  pub fn declared_fields(&self) -> impl Iterator<Item = &Field> {
    self.fields.iter().filter(|field| !matches!(field.kind, FieldKind::DeviceId))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumValue {
  pub label: String,
  pub value: u8,
  /* Whether the document spelled the value out */
  pub explicit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
  Native,
  /* Declared `bool`, stored as a byte */
  BoolCast,
  /* Declared `enum`, stored as a byte and named by a synthesized enum type */
  EnumCast { type_name: String, values: Vec<EnumValue> },
  /* Synthetic leading field of multi-device protocols */
  DeviceId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
  pub name: String,
  pub declared_type: String,
  pub storage_type: String,
  pub offset: u64,
  pub width: u64,
  pub kind: FieldKind,
  pub default: Option<Literal>,
  pub health_checks: Vec<HealthCheck>,
}

impl Field {
  pub fn is_type_cast(&self) -> bool {
    matches!(self.kind, FieldKind::BoolCast | FieldKind::EnumCast { .. })
  }

  pub fn enum_type(&self) -> Option<&str> {
    match &self.kind {
      FieldKind::EnumCast { type_name, .. } => Some(type_name),
      _ => None,
    }
  }

  pub fn enum_values(&self) -> &[EnumValue] {
    match &self.kind {
      FieldKind::EnumCast { values, .. } => values,
      _ => &[],
    }
  }

  /* First byte after this field */
  pub fn end(&self) -> u64 {
    self.offset + self.width
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
  Exact { value: Literal },
  Range { min: Literal, max: Literal },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthCheck {
  pub condition: Condition,
  pub result: Option<String>,
  pub troubleshoot: Option<String>,
  pub description: Option<String>,
}
