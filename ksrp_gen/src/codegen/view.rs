use ksrp_types::{CompileResult, Literal};
use serde_derive::Serialize;
use std::path::PathBuf;

use crate::protocol::{Condition, Field, FieldKind, Frame, NameSynthesizer, Owner, Protocol, SymbolTable};

pub const DEFAULT_INCLUDE_ROOT: &str = "kalman-status-report-protocol";

/* Support library headers shipped with the skeleton */
const FRAMES_HEADER: &str = "frames.h";
const COMMON_HEADER: &str = "common.h";

/* Type of the per-frame update clock held by instances */
const CLOCK_TYPE: &str = "uint32_t";

/* One generated header: where it goes and what it pulls in */
#[derive(Debug, Clone, Serialize)]
pub struct HeaderView {
  pub path: String,
  pub guard: String,
  pub clibraries: Vec<String>,
  pub libraries: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConstantView {
  pub name: String,
  pub value: String,
  #[serde(skip)]
  pub role: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnumeratorView {
  pub name: String,
  pub value: u64,
  /* Print `= value`; otherwise C numbering yields the same value */
  pub explicit: bool,
  #[serde(skip)]
  pub role: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnumView {
  pub type_name: String,
  pub enumerators: Vec<EnumeratorView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrototypeView {
  pub return_type: String,
  pub name: String,
  pub params: Vec<String>,
  #[serde(skip)]
  pub role: String,
}

impl PrototypeView {
  fn new(return_type: &str, name: String, params: Vec<String>, role: &str) -> Self {
    Self { return_type: return_type.to_string(), name, params, role: role.to_string() }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
  pub name: String,
  pub declared_type: String,
  pub storage_type: String,
  /* Type the accessors speak: `bool`, the enum type, or the storage type */
  pub api_type: String,
  pub offset: u64,
  pub width: u64,
  pub is_type_cast: bool,
  pub is_device_id: bool,
  pub enum_type: Option<EnumView>,
  pub constants: Vec<ConstantView>,
  pub getter: PrototypeView,
  pub setter: PrototypeView,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameView {
  pub name: String,
  pub id: u8,
  pub type_name: String,
  pub size: u64,
  pub size_constant: ConstantView,
  pub size_assert: String,
  pub type_id: ConstantView,
  pub field_ids: EnumView,
  pub fields: Vec<FieldView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstanceMemberView {
  pub frame_type: String,
  pub frame_member: String,
  pub clock_member: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstanceView {
  pub header: HeaderView,
  pub type_name: String,
  pub clock_type: String,
  pub members: Vec<InstanceMemberView>,
  pub prototypes: Vec<PrototypeView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProtocolView {
  pub subsystem: String,
  pub subsystem_id: u8,
  pub multi_device: bool,
  /* File name printed in the banner */
  pub source: String,
  #[serde(skip)]
  pub document: PathBuf,
  pub header: HeaderView,
  pub frame_ids: EnumView,
  pub frames: Vec<FrameView>,
  pub dispatch: Vec<PrototypeView>,
  pub instance: InstanceView,
}

/// Render-ready projection of every protocol of one compilation.
///
/// All names, C types, offsets and frame sizes are decided here so that both
/// emitters only format what they are given.
#[derive(Debug, Clone, Serialize)]
pub struct CodegenView {
  pub prefix: String,
  pub include_root: String,
  pub common: HeaderView,
  pub subsystem_ids: EnumView,
  pub utils: HeaderView,
  pub subsystem_count: ConstantView,
  pub protocols: Vec<ProtocolView>,
}

/* Escape text into a C string literal */
pub fn c_string(text: &str) -> String {
  let mut out = String::with_capacity(text.len() + 2);
  out.push('"');
  for c in text.chars() {
    match c {
      '\\' => out.push_str("\\\\"),
      '"' => out.push_str("\\\""),
      '\n' => out.push_str("\\n"),
      '\r' => out.push_str("\\r"),
      '\t' => out.push_str("\\t"),
      c => out.push(c),
    }
  }
  out.push('"');
  out
}

struct ViewBuilder<'a> {
  names: &'a NameSynthesizer,
  include_root: &'a str,
}

impl<'a> ViewBuilder<'a> {
  fn include(&self, path: &str) -> String {
    format!("{}/{}", self.include_root, path)
  }

  fn clibraries(headers: &[&str]) -> Vec<String> {
    headers.iter().map(|h| h.to_string()).collect()
  }

  fn protocol_path(subsystem: &str) -> String {
    format!("protocols/subsystems/{}_protocol.h", subsystem)
  }

  fn instance_path(subsystem: &str) -> String {
    format!("instances/{}_instance.h", subsystem)
  }

  fn common_path() -> &'static str {
    "protocols/protocol_common.h"
  }

  fn utils_path() -> &'static str {
    "protocols/protocol_utils.h"
  }

  fn literal(&self, literal: &Literal, subsystem: &str, frame: &str, field: &str) -> String {
    match literal {
      Literal::Label(label) => self.names.enum_label(subsystem, frame, field, label),
      other => other.to_string(),
    }
  }

  fn field(&self, protocol: &Protocol, frame: &Frame, field: &Field) -> FieldView {
    let names = self.names;
    let (sub, frm, fld) = (protocol.subsystem.as_str(), frame.name.as_str(), field.name.as_str());
    let frame_type = names.frame_type(sub, frm);

    let api_type = match &field.kind {
      FieldKind::BoolCast => "bool".to_string(),
      FieldKind::EnumCast { type_name, .. } => type_name.clone(),
      FieldKind::Native | FieldKind::DeviceId => field.storage_type.clone(),
    };

    let enum_type = field.enum_type().map(|type_name| EnumView {
      type_name: type_name.to_string(),
      enumerators: field
        .enum_values()
        .iter()
        .map(|v| EnumeratorView {
          name: names.enum_label(sub, frm, fld, &v.label),
          value: u64::from(v.value),
          explicit: v.explicit,
          role: format!("enum label '{}'", v.label),
        })
        .collect(),
    });

    let mut constants = Vec::new();
    if let Some(default) = &field.default {
      constants.push(ConstantView {
        name: names.default_value(sub, frm, fld),
        value: self.literal(default, sub, frm, fld),
        role: "default value".to_string(),
      });
    }

    for (i, check) in field.health_checks.iter().enumerate() {
      let base = names.health_check(sub, frm, fld, check.result.as_deref(), i + 1);
      let role = format!("health check #{}", i + 1);
      let constant = |name: String, value: String| ConstantView { name, value, role: role.clone() };

      match &check.condition {
        Condition::Exact { value } => {
          constants.push(constant(base.clone(), self.literal(value, sub, frm, fld)));
        }
        Condition::Range { min, max } => {
          constants.push(constant(format!("{}_MIN", base), self.literal(min, sub, frm, fld)));
          constants.push(constant(format!("{}_MAX", base), self.literal(max, sub, frm, fld)));
        }
      }
      if let Some(description) = &check.description {
        constants.push(constant(format!("{}_DESCRIPTION", base), c_string(description)));
      }
      if let Some(troubleshoot) = &check.troubleshoot {
        constants.push(constant(format!("{}_TROUBLESHOOT", base), c_string(troubleshoot)));
      }
    }

    FieldView {
      name: field.name.clone(),
      declared_type: field.declared_type.clone(),
      storage_type: field.storage_type.clone(),
      offset: field.offset,
      width: field.width,
      is_type_cast: field.is_type_cast(),
      is_device_id: matches!(field.kind, FieldKind::DeviceId),
      enum_type,
      constants,
      getter: PrototypeView::new(
        &api_type,
        names.getter(sub, frm, fld),
        vec![format!("const {} *frame", frame_type)],
        "getter",
      ),
      setter: PrototypeView::new(
        "void",
        names.setter(sub, frm, fld),
        vec![format!("{} *frame", frame_type), format!("{} value", api_type)],
        "setter",
      ),
      api_type,
    }
  }

  fn frame(&self, protocol: &Protocol, frame: &Frame) -> FrameView {
    let names = self.names;
    let (sub, frm) = (protocol.subsystem.as_str(), frame.name.as_str());
    let type_name = names.frame_type(sub, frm);
    let size = frame.size();
    let size_constant = ConstantView {
      name: names.frame_size(sub, frm),
      value: size.to_string(),
      role: "frame size".to_string(),
    };

    let field_ids = EnumView {
      type_name: names.field_id_type(sub, frm),
      enumerators: frame
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| EnumeratorView {
          name: names.field_id(sub, frm, &field.name),
          value: i as u64,
          explicit: false,
          role: format!("field id of '{}'", field.name),
        })
        .collect(),
    };

    FrameView {
      name: frame.name.clone(),
      id: frame.id,
      size,
      size_assert: format!("{} must be {} bytes", type_name, size),
      type_id: ConstantView {
        name: names.type_id(sub, frm),
        value: format!("((uint16_t)(({} << 8) | {}))", names.subsystem_id(sub), names.frame_id(sub, frm)),
        role: "type id".to_string(),
      },
      field_ids,
      fields: frame.fields.iter().map(|field| self.field(protocol, frame, field)).collect(),
      size_constant,
      type_name,
    }
  }

  fn instance(&self, protocol: &Protocol) -> InstanceView {
    let names = self.names;
    let sub = protocol.subsystem.as_str();
    let type_name = names.instance_type(sub);
    let frame_id_type = names.frame_id_type(sub);

    InstanceView {
      header: HeaderView {
        path: Self::instance_path(sub),
        guard: names.header_guard(&format!("{}_instance", sub)),
        clibraries: Self::clibraries(&["stdint.h", "stdbool.h", "stddef.h"]),
        libraries: vec![
          self.include(FRAMES_HEADER),
          self.include(COMMON_HEADER),
          self.include(&Self::protocol_path(sub)),
        ],
      },
      clock_type: CLOCK_TYPE.to_string(),
      members: protocol
        .frames
        .iter()
        .map(|frame| InstanceMemberView {
          frame_type: names.frame_type(sub, &frame.name),
          frame_member: format!("{}_instance", frame.name),
          clock_member: format!("{}_ms_since_last_update", frame.name),
        })
        .collect(),
      prototypes: vec![
        PrototypeView::new(
          "bool",
          names.instance_fn(sub, "Init"),
          vec![format!("{} *instance", type_name)],
          "instance init",
        ),
        PrototypeView::new(
          "bool",
          names.instance_fn(sub, "UpdateFrame"),
          vec![
            format!("{} *instance", type_name),
            format!("{} frame_id", frame_id_type),
            "const void *frame".to_string(),
            "size_t frame_size".to_string(),
          ],
          "instance frame update",
        ),
        PrototypeView::new(
          "void",
          names.instance_fn(sub, "UpdateTime"),
          vec![format!("{} *instance", type_name), format!("{} elapsed_ms", CLOCK_TYPE)],
          "instance clock update",
        ),
        PrototypeView::new(
          CLOCK_TYPE,
          names.instance_fn(sub, "GetTimeSinceLastUpdate"),
          vec![format!("const {} *instance", type_name), format!("{} frame_id", frame_id_type)],
          "instance clock lookup",
        ),
      ],
      type_name,
    }
  }

  fn protocol(&self, protocol: &Protocol) -> ProtocolView {
    let names = self.names;
    let sub = protocol.subsystem.as_str();
    let frame_id_type = names.frame_id_type(sub);

    ProtocolView {
      subsystem: protocol.subsystem.clone(),
      subsystem_id: protocol.subsystem_id,
      multi_device: protocol.multi_device,
      source: protocol
        .source
        .file_name()
        .unwrap_or(protocol.source.as_os_str())
        .to_string_lossy()
        .into_owned(),
      document: protocol.source.clone(),
      header: HeaderView {
        path: Self::protocol_path(sub),
        guard: names.header_guard(&format!("{}_protocol", sub)),
        clibraries: Self::clibraries(&["stdint.h", "stdbool.h"]),
        libraries: vec![
          self.include(FRAMES_HEADER),
          self.include(COMMON_HEADER),
          self.include(Self::common_path()),
        ],
      },
      frame_ids: EnumView {
        type_name: frame_id_type.clone(),
        enumerators: protocol
          .frames
          .iter()
          .map(|frame| EnumeratorView {
            name: names.frame_id(sub, &frame.name),
            value: u64::from(frame.id),
            explicit: true,
            role: format!("frame id of '{}'", frame.name),
          })
          .collect(),
      },
      frames: protocol.frames.iter().map(|frame| self.frame(protocol, frame)).collect(),
      dispatch: vec![
        PrototypeView::new(
          "size_t",
          names.frame_size_lookup(sub),
          vec![format!("{} frame_id", frame_id_type)],
          "frame size lookup",
        ),
        PrototypeView::new(
          "bool",
          names.type_id_check(sub),
          vec!["uint16_t type_id".to_string()],
          "type id check",
        ),
      ],
      instance: self.instance(protocol),
    }
  }
}

impl CodegenView {
  /* `protocols` must already be in output order */
  pub fn build(protocols: &[Protocol], names: &NameSynthesizer, include_root: &str) -> Self {
    let builder = ViewBuilder { names, include_root };
    let protocols: Vec<ProtocolView> = protocols.iter().map(|p| builder.protocol(p)).collect();

    let subsystem_ids = EnumView {
      type_name: names.subsystem_id_type(),
      enumerators: protocols
        .iter()
        .map(|p| EnumeratorView {
          name: names.subsystem_id(&p.subsystem),
          value: u64::from(p.subsystem_id),
          explicit: true,
          role: "subsystem id".to_string(),
        })
        .collect(),
    };

    let mut utils_libraries = vec![builder.include(ViewBuilder::common_path())];
    utils_libraries.extend(protocols.iter().map(|p| builder.include(&p.header.path)));

    CodegenView {
      prefix: names.prefix().to_string(),
      include_root: include_root.to_string(),
      common: HeaderView {
        path: ViewBuilder::common_path().to_string(),
        guard: names.header_guard("protocol_common"),
        clibraries: ViewBuilder::clibraries(&["stdint.h"]),
        libraries: Vec::new(),
      },
      subsystem_ids,
      utils: HeaderView {
        path: ViewBuilder::utils_path().to_string(),
        guard: names.header_guard("protocol_utils"),
        clibraries: ViewBuilder::clibraries(&["stdint.h", "stdbool.h", "stddef.h"]),
        libraries: utils_libraries,
      },
      subsystem_count: ConstantView {
        name: names.subsystem_count(),
        value: protocols.len().to_string(),
        role: "subsystem count".to_string(),
      },
      protocols,
    }
  }

  /// Register every symbol the output defines, failing on the first
  /// symbol produced twice.
  pub fn register_symbols(&self, table: &mut SymbolTable) -> CompileResult<()> {
    table.register(&self.common.guard, Owner::output("header guard"))?;
    table.register(&self.utils.guard, Owner::output("header guard"))?;
    table.register(&self.subsystem_ids.type_name, Owner::output("subsystem id enum"))?;
    table.register(&self.subsystem_count.name, Owner::output(self.subsystem_count.role.as_str()))?;

    for (protocol, subsystem_id) in self.protocols.iter().zip(&self.subsystem_ids.enumerators) {
      let sub = protocol.subsystem.as_str();
      let owner = |role: &str| Owner::subsystem(&protocol.document, sub, role);

      table.register(&subsystem_id.name, owner(&subsystem_id.role))?;
      table.register(&protocol.header.guard, owner("header guard"))?;
      table.register(&protocol.instance.header.guard, owner("instance header guard"))?;
      table.register(&protocol.frame_ids.type_name, owner("frame id enum"))?;
      table.register(&protocol.instance.type_name, owner("instance struct"))?;
      for prototype in protocol.dispatch.iter().chain(&protocol.instance.prototypes) {
        table.register(&prototype.name, owner(&prototype.role))?;
      }

      for (frame, frame_id) in protocol.frames.iter().zip(&protocol.frame_ids.enumerators) {
        let frm = frame.name.as_str();
        let owner = |role: &str| Owner::frame(&protocol.document, sub, frm, role);

        table.register(&frame_id.name, owner("frame id"))?;
        table.register(&frame.type_name, owner("frame struct"))?;
        table.register(&frame.size_constant.name, owner(&frame.size_constant.role))?;
        table.register(&frame.type_id.name, owner(&frame.type_id.role))?;
        table.register(&frame.field_ids.type_name, owner("field id enum"))?;

        for (field, field_id) in frame.fields.iter().zip(&frame.field_ids.enumerators) {
          let owner = |role: &str| Owner::field(&protocol.document, sub, frm, &field.name, role);

          table.register(&field_id.name, owner("field id"))?;
          table.register(&field.getter.name, owner(&field.getter.role))?;
          table.register(&field.setter.name, owner(&field.setter.role))?;
          if let Some(enum_type) = &field.enum_type {
            table.register(&enum_type.type_name, owner("enum type"))?;
            for enumerator in &enum_type.enumerators {
              table.register(&enumerator.name, owner(&enumerator.role))?;
            }
          }
          for constant in &field.constants {
            table.register(&constant.name, owner(&constant.role))?;
          }
        }
      }
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use crate::protocol::ProtocolBuilder;
  use ksrp_loader::SchemaLoader;
  use ksrp_types::TypeRegistry;
  use std::path::Path;

  const POWER: &str = "protocol:\n  subsystem: power\n  subsystem_id: 3\n  frames:\n    - name: status\n      frame_id: 1\n      fields:\n        - name: ok\n          type: bool\n          default: true\n";

  fn power_view() -> CodegenView {
    let registry = TypeRegistry::standard();
    let names = NameSynthesizer::default();
    let document = SchemaLoader::new(&registry).load_str(Path::new("specs/power.yaml"), POWER).unwrap();
    let protocol = ProtocolBuilder::new(&registry, &names).build(&document).unwrap();
    CodegenView::build(&[protocol], &names, DEFAULT_INCLUDE_ROOT)
  }

  #[test]
  fn test_c_string_escapes() {
    assert_eq!(c_string("plain"), "\"plain\"");
    assert_eq!(c_string("say \"hi\"\\now\n"), "\"say \\\"hi\\\"\\\\now\\n\"");
  }

  #[test]
  fn test_bool_field_speaks_bool_and_stores_byte() {
    let view = power_view();
    let protocol = &view.protocols[0];
    let field = &protocol.frames[0].fields[0];

    assert_eq!(protocol.source, "power.yaml");
    assert_eq!(field.api_type, "bool");
    assert_eq!(field.storage_type, "uint8_t");
    assert_eq!(field.constants[0].name, "KSRP_POWER_STATUS_OK_DEFAULT");
    assert_eq!(field.constants[0].value, "true");
    assert_eq!(field.setter.params, vec!["KSRP_Power_Status_Frame *frame", "bool value"]);
  }

  #[test]
  fn test_template_context_omits_roles() {
    let json = serde_json::to_value(power_view()).unwrap();
    let field = &json["protocols"][0]["frames"][0]["fields"][0];

    assert_eq!(field["getter"]["name"], "KSRP_Get_Power_Status_Ok");
    assert!(field["getter"].get("role").is_none());
    assert!(field["constants"][0].get("role").is_none());
    assert_eq!(json["subsystem_count"]["value"], "1");
  }

  #[test]
  fn test_every_symbol_registers_once() {
    let view = power_view();
    let mut table = SymbolTable::new();
    view.register_symbols(&mut table).unwrap();

    assert_eq!(
      table.owner("KSRP_POWER_STATUS_OK_DEFAULT").map(|o| o.to_string()).as_deref(),
      Some("power/status/ok (default value) in specs/power.yaml")
    );
    assert!(view.register_symbols(&mut table).is_err());
  }
}
