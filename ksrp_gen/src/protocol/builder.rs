use ksrp_loader::validate::DEVICE_ID_FIELD;
use ksrp_loader::SourceDocument;
use ksrp_types::{
  CompileError, CompileResult, FieldDef, FrameDef, HealthCheckDef, HealthCheckKind, Literal, Location, ProtocolDef,
  TypeClass, TypeRegistry,
};
use std::collections::HashMap;

use super::ir::{Condition, EnumValue, Field, FieldKind, Frame, HealthCheck, Protocol};
use super::naming::NameSynthesizer;

/* Largest number of labels a 1-byte enum can hold */
const MAX_ENUM_LABELS: usize = 256;

/// Builds the layout IR of one protocol document.
///
/// Offsets are assigned in document order with no padding. `bool` and `enum`
/// fields are stored as the registry's byte type while keeping their declared
/// type for the emitted API.
pub struct ProtocolBuilder<'a> {
  registry: &'a TypeRegistry,
  names: &'a NameSynthesizer,
}

impl<'a> ProtocolBuilder<'a> {
  pub fn new(registry: &'a TypeRegistry, names: &'a NameSynthesizer) -> Self {
    Self { registry, names }
  }

  pub fn build(&self, document: &SourceDocument) -> CompileResult<Protocol> {
    let location = Location::document(document.path());
    let def = &document.protocol;

    let frames = def
      .frames
      .iter()
      .map(|frame| self.build_frame(def, frame, &location.frame(&frame.name)))
      .collect::<CompileResult<Vec<_>>>()?;

    tracing::debug!(
      document = %document.path().display(),
      subsystem = %def.subsystem,
      frames = frames.len(),
      "built protocol layout"
    );

    Ok(Protocol {
      subsystem: def.subsystem.clone(),
      subsystem_id: def.subsystem_id,
      multi_device: def.multi_device,
      source: document.path().to_path_buf(),
      frames,
    })
  }

  fn build_frame(&self, protocol: &ProtocolDef, frame: &FrameDef, location: &Location) -> CompileResult<Frame> {
    let mut offset = 0u64;
    let mut fields = Vec::with_capacity(frame.fields.len() + 1);

    /* The device id is laid out before anything the author declared */
    if protocol.multi_device {
      let device_id = self.device_id_field(offset, location)?;
      offset = device_id.end();
      fields.push(device_id);
    }

    for def in &frame.fields {
      let field = self.build_field(protocol, frame, def, offset, &location.field(&def.name))?;
      offset = field.end();
      fields.push(field);
    }

    tracing::trace!(frame = %frame.name, size = offset, "laid out frame");

    Ok(Frame { name: frame.name.clone(), id: frame.frame_id, fields })
  }

  fn device_id_field(&self, offset: u64, location: &Location) -> CompileResult<Field> {
    let location = location.field(DEVICE_ID_FIELD);
    let width = self.width_of(TypeRegistry::BYTE, &location)?;

    Ok(Field {
      name: DEVICE_ID_FIELD.to_string(),
      declared_type: TypeRegistry::BYTE.to_string(),
      storage_type: TypeRegistry::BYTE.to_string(),
      offset,
      width,
      kind: FieldKind::DeviceId,
      default: None,
      health_checks: Vec::new(),
    })
  }

  fn width_of(&self, type_name: &str, location: &Location) -> CompileResult<u64> {
    self.registry.width(type_name).ok_or_else(|| CompileError::UnknownType {
      location: location.clone(),
      type_name: type_name.to_string(),
    })
  }

  fn build_field(
    &self,
    protocol: &ProtocolDef,
    frame: &FrameDef,
    def: &FieldDef,
    offset: u64,
    location: &Location,
  ) -> CompileResult<Field> {
    let unknown = || CompileError::UnknownType { location: location.clone(), type_name: def.type_name.clone() };

    let entry = self.registry.get(&def.type_name).ok_or_else(unknown)?;
    let storage_type = self.registry.storage_type(entry.name).ok_or_else(unknown)?;
    let width = self.width_of(storage_type, location)?;

    let kind = match entry.class {
      TypeClass::Bool => FieldKind::BoolCast,
      TypeClass::Enum => FieldKind::EnumCast {
        type_name: self.names.enum_type(&protocol.subsystem, &frame.name, &def.name),
        values: resolve_enum_values(def, location)?,
      },
      TypeClass::Unsigned | TypeClass::Signed | TypeClass::Float => FieldKind::Native,
    };

    let enum_values: &[EnumValue] = match &kind {
      FieldKind::EnumCast { values, .. } => values.as_slice(),
      _ => &[],
    };

    if let Some(default) = &def.default {
      check_literal(default, entry.class, width, enum_values)
        .map_err(|reason| CompileError::schema(location, format!("invalid default: {}", reason)))?;
    }

    let health_checks = def
      .health_checks
      .iter()
      .enumerate()
      .map(|(i, check)| self.build_health_check(i + 1, check, entry.class, width, enum_values, location))
      .collect::<CompileResult<Vec<_>>>()?;

    Ok(Field {
      name: def.name.clone(),
      declared_type: def.type_name.clone(),
      storage_type: storage_type.to_string(),
      offset,
      width,
      kind,
      default: def.default.clone(),
      health_checks,
    })
  }

  fn build_health_check(
    &self,
    index: usize,
    def: &HealthCheckDef,
    class: TypeClass,
    width: u64,
    enum_values: &[EnumValue],
    location: &Location,
  ) -> CompileResult<HealthCheck> {
    let fail = |reason: String| CompileError::HealthCheck { location: location.clone(), index, reason };
    let check = |literal: &Literal| check_literal(literal, class, width, enum_values).map_err(fail);

    let condition = match def.kind {
      HealthCheckKind::Exact => {
        if def.min.is_some() || def.max.is_some() {
          return Err(fail("`exact` checks must not carry `min` or `max`".to_string()));
        }
        let value = def.value.clone().ok_or_else(|| fail("`exact` check requires `value`".to_string()))?;
        check(&value)?;
        Condition::Exact { value }
      }
      HealthCheckKind::Range => {
        if def.value.is_some() {
          return Err(fail("`range` checks must not carry `value`".to_string()));
        }
        let min = def.min.clone().ok_or_else(|| fail("`range` check requires `min`".to_string()))?;
        let max = def.max.clone().ok_or_else(|| fail("`range` check requires `max`".to_string()))?;
        check(&min)?;
        check(&max)?;

        let inverted = match (min.as_i128(), max.as_i128()) {
          (Some(lo), Some(hi)) => lo > hi,
          _ => matches!(
            (numeric(&min, enum_values), numeric(&max, enum_values)),
            (Some(lo), Some(hi)) if lo > hi
          ),
        };
        if inverted {
          return Err(fail(format!("`min` {} is greater than `max` {}", min, max)));
        }
        Condition::Range { min, max }
      }
    };

    let text = |value: &Option<String>| {
      value.as_deref().map(|t| self.names.normalize_text(t)).filter(|t| !t.is_empty())
    };

    Ok(HealthCheck {
      condition,
      result: def.result.clone(),
      troubleshoot: text(&def.troubleshoot),
      description: text(&def.description),
    })
  }
}

/* Assign numeric values to enum labels, continuing after explicit ones like C does */
fn resolve_enum_values(def: &FieldDef, location: &Location) -> CompileResult<Vec<EnumValue>> {
  if def.values.len() > MAX_ENUM_LABELS {
    return Err(CompileError::schema(
      location,
      format!("enum declares {} labels but its 1-byte storage holds at most {}", def.values.len(), MAX_ENUM_LABELS),
    ));
  }

  let mut values = Vec::with_capacity(def.values.len());
  let mut taken: HashMap<u8, &str> = HashMap::new();
  let mut next = 0i64;

  for entry in &def.values {
    let (value, explicit) = match entry.explicit_value() {
      Some(value) => (value, true),
      None => (next, false),
    };
    let byte = u8::try_from(value).map_err(|_| {
      CompileError::schema(
        location,
        format!("enum label '{}' has value {} which does not fit the 1-byte storage", entry.name(), value),
      )
    })?;
    if let Some(previous) = taken.insert(byte, entry.name()) {
      return Err(CompileError::schema(
        location,
        format!("enum label '{}' repeats value {} of label '{}'", entry.name(), byte, previous),
      ));
    }

    values.push(EnumValue { label: entry.name().to_string(), value: byte, explicit });
    next = value + 1;
  }

  Ok(values)
}

fn integer_bounds(class: TypeClass, width: u64) -> (i128, i128) {
  let bits = (width * 8) as u32;
  match class {
    TypeClass::Signed => (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1),
    _ => (0, (1i128 << bits) - 1),
  }
}

/* Check that a literal can be held by a field of the given type */
fn check_literal(literal: &Literal, class: TypeClass, width: u64, enum_values: &[EnumValue]) -> Result<(), String> {
  match (class, literal) {
    (TypeClass::Unsigned | TypeClass::Signed, Literal::Integer(_) | Literal::Unsigned(_)) => {
      let (lo, hi) = integer_bounds(class, width);
      match literal.as_i128() {
        Some(value) if (lo..=hi).contains(&value) => Ok(()),
        _ => Err(format!("{} is outside the range {}..={} of a {}-byte field", literal, lo, hi, width)),
      }
    }
    (TypeClass::Float, Literal::Integer(_) | Literal::Unsigned(_)) => Ok(()),
    (TypeClass::Float, Literal::Float(value)) if value.is_finite() => Ok(()),
    (TypeClass::Bool, Literal::Bool(_)) => Ok(()),
    (TypeClass::Bool, Literal::Integer(0 | 1)) => Ok(()),
    (TypeClass::Enum, Literal::Label(label)) => {
      if enum_values.iter().any(|v| &v.label == label) {
        Ok(())
      } else {
        Err(format!("'{}' is not one of the enum labels", label))
      }
    }
    (TypeClass::Enum, Literal::Integer(value)) => {
      if enum_values.iter().any(|v| i64::from(v.value) == *value) {
        Ok(())
      } else {
        Err(format!("{} is not the value of any enum label", value))
      }
    }
    (_, literal) => Err(format!("'{}' does not match the field type", literal)),
  }
}

fn numeric(literal: &Literal, enum_values: &[EnumValue]) -> Option<f64> {
  match literal {
    Literal::Label(label) => enum_values.iter().find(|v| &v.label == label).map(|v| f64::from(v.value)),
    other => other.as_f64(),
  }
}
