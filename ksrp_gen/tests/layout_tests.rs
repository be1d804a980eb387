/* Layout Tests
 *
 * These tests build protocol IR from YAML documents and check the byte layout
 * properties every emitter relies on: dense offsets, cast widths, device id
 * injection and shape checks of health checks.
 */

use ksrp_gen::ksrp_loader::{SchemaLoader, SourceDocument};
use ksrp_gen::ksrp_types::{CompileError, Literal, TypeRegistry};
use ksrp_gen::protocol::{Condition, FieldKind, NameSynthesizer, Protocol, ProtocolBuilder};
use std::path::Path;

const POWER: &str = r#"
protocol:
  subsystem: power
  subsystem_id: 3
  frames:
    - name: status
      frame_id: 1
      fields:
        - name: voltage
          type: float
        - name: ok
          type: bool
"#;

const WHEELS: &str = r#"
protocol:
  subsystem: wheels
  subsystem_id: 1
  frames:
    - name: wheels_status
      frame_id: 12
      fields:
        - name: controller_id
          type: uint8_t
        - name: temperature
          type: float
          default: 0.0
          health_checks:
            - type: range
              min: 0
              max: 100
              result: ok
              description: "  Temperatura zbyt wysoka é "
        - name: algorithm_type
          type: enum
          values: [position, velocity, { name: torque, value: 7 }, brake]
          default: velocity
        - name: odometer
          type: uint64_t
        - name: torque
          type: int16_t
    - name: wheels_limits
      frame_id: 13
      fields:
        - name: max_speed
          type: double
"#;

fn load(contents: &str) -> Result<SourceDocument, CompileError> {
  let registry = TypeRegistry::standard();
  SchemaLoader::new(&registry).load_str(Path::new("test.yaml"), contents)
}

fn build(contents: &str) -> Result<Protocol, CompileError> {
  let registry = TypeRegistry::standard();
  let names = NameSynthesizer::default();
  let document = load(contents)?;
  ProtocolBuilder::new(&registry, &names).build(&document)
}

#[test]
fn test_power_example_layout() {
  let protocol = build(POWER).unwrap();
  let frame = &protocol.frames[0];

  assert_eq!(frame.size(), 5);

  let voltage = &frame.fields[0];
  assert_eq!((voltage.offset, voltage.width), (0, 4));
  assert_eq!(voltage.storage_type, "float");
  assert!(!voltage.is_type_cast());

  let ok = &frame.fields[1];
  assert_eq!((ok.offset, ok.width), (4, 1));
  assert_eq!(ok.declared_type, "bool");
  assert_eq!(ok.storage_type, "uint8_t");
  assert_eq!(ok.kind, FieldKind::BoolCast);
}

#[test]
fn test_offsets_are_dense_in_every_frame() {
  let protocol = build(WHEELS).unwrap();

  for frame in &protocol.frames {
    let mut expected = 0;
    for field in &frame.fields {
      assert_eq!(field.offset, expected, "{}.{}", frame.name, field.name);
      expected += field.width;
    }
    assert_eq!(frame.size(), expected);
  }

  let sizes: Vec<u64> = protocol.frames.iter().map(|f| f.size()).collect();
  assert_eq!(sizes, vec![1 + 4 + 1 + 8 + 2, 8]);
}

#[test]
fn test_enum_width_is_one_byte_regardless_of_label_count() {
  let labels: Vec<String> = (0..200).map(|i| format!("state_{}", i)).collect();
  let yaml = format!(
    "protocol:\n  subsystem: big\n  subsystem_id: 9\n  frames:\n    - name: status\n      frame_id: 0\n      fields:\n        - name: state\n          type: enum\n          values: [{}]\n",
    labels.join(", ")
  );

  let protocol = build(&yaml).unwrap();
  let field = &protocol.frames[0].fields[0];
  assert_eq!(field.width, 1);
  assert_eq!(field.storage_type, "uint8_t");
  assert_eq!(field.enum_values().len(), 200);
  assert_eq!(field.enum_type(), Some("KSRP_Big_Status_State"));
}

#[test]
fn test_enum_values_continue_after_explicit_ones() {
  let protocol = build(WHEELS).unwrap();
  let values: Vec<(String, u8, bool)> = protocol.frames[0].fields[2]
    .enum_values()
    .iter()
    .map(|v| (v.label.clone(), v.value, v.explicit))
    .collect();

  assert_eq!(
    values,
    vec![
      ("position".to_string(), 0, false),
      ("velocity".to_string(), 1, false),
      ("torque".to_string(), 7, true),
      ("brake".to_string(), 8, false),
    ]
  );
}

#[test]
fn test_multi_device_injects_device_id_at_offset_zero() {
  let single = build(POWER).unwrap();
  let multi = build(&POWER.replace("  subsystem_id: 3\n", "  subsystem_id: 3\n  multi_device: true\n")).unwrap();

  let frame = &multi.frames[0];
  let device_id = &frame.fields[0];
  assert_eq!(device_id.name, "device_id");
  assert_eq!((device_id.offset, device_id.width), (0, 1));
  assert_eq!(device_id.kind, FieldKind::DeviceId);

  for (declared, shifted) in single.frames[0].fields.iter().zip(frame.declared_fields()) {
    assert_eq!(declared.name, shifted.name);
    assert_eq!(shifted.offset, declared.offset + 1);
  }
  assert_eq!(frame.size(), single.frames[0].size() + 1);
}

#[test]
fn test_multiple_devices_alias_is_accepted() {
  let protocol = build(&POWER.replace("  subsystem_id: 3\n", "  subsystem_id: 3\n  multiple_devices: true\n")).unwrap();
  assert!(protocol.multi_device);
  assert_eq!(protocol.frames[0].fields[0].name, "device_id");
}

#[test]
fn test_health_check_text_is_normalized() {
  let protocol = build(WHEELS).unwrap();
  let check = &protocol.frames[0].fields[1].health_checks[0];

  assert_eq!(check.description.as_deref(), Some("Temperatura zbyt wysoka e"));
  assert_eq!(check.troubleshoot, None);
  assert_eq!(
    check.condition,
    Condition::Range { min: Literal::Integer(0), max: Literal::Integer(100) }
  );
}

#[test]
fn test_range_without_max_is_a_health_check_error() {
  let yaml = WHEELS.replace("              max: 100\n", "");
  match build(&yaml) {
    Err(CompileError::HealthCheck { location, index, reason }) => {
      assert_eq!(index, 1);
      assert_eq!(location.frame.as_deref(), Some("wheels_status"));
      assert_eq!(location.field.as_deref(), Some("temperature"));
      assert!(reason.contains("max"), "{}", reason);
    }
    other => panic!("expected HealthCheck error, got {:?}", other),
  }
}

#[test]
fn test_exact_check_with_bounds_is_rejected() {
  let yaml = WHEELS.replace("            - type: range\n", "            - type: exact\n              value: 5\n");
  let err = build(&yaml).unwrap_err();
  assert!(matches!(err, CompileError::HealthCheck { .. }), "{:?}", err);
}

#[test]
fn test_range_with_inverted_bounds_is_rejected() {
  let yaml = WHEELS.replace("min: 0", "min: 150");
  let err = build(&yaml).unwrap_err();
  assert!(err.to_string().contains("greater than"), "{}", err);
}

#[test]
fn test_default_must_fit_the_field() {
  let yaml = POWER.replace("          type: float\n", "          type: uint8_t\n          default: 300\n");
  let err = build(&yaml).unwrap_err();
  assert!(matches!(err, CompileError::Schema { .. }), "{:?}", err);
  assert!(err.to_string().contains("invalid default"), "{}", err);

  let yaml = WHEELS.replace("default: velocity", "default: reverse");
  let err = build(&yaml).unwrap_err();
  assert!(err.to_string().contains("'reverse' is not one of the enum labels"), "{}", err);
}

#[test]
fn test_enum_values_must_fit_one_byte() {
  let yaml = WHEELS.replace("value: 7", "value: 256");
  let err = build(&yaml).unwrap_err();
  assert!(err.to_string().contains("does not fit the 1-byte storage"), "{}", err);

  let yaml = WHEELS.replace("value: 7", "value: 1");
  let err = build(&yaml).unwrap_err();
  assert!(err.to_string().contains("repeats value 1 of label 'velocity'"), "{}", err);
}

#[test]
fn test_unknown_type_is_rejected_with_field_context() {
  let yaml = POWER.replace("type: float", "type: uint24_t");
  match build(&yaml) {
    Err(CompileError::UnknownType { location, type_name }) => {
      assert_eq!(type_name, "uint24_t");
      assert_eq!(location.field.as_deref(), Some("voltage"));
    }
    other => panic!("expected UnknownType, got {:?}", other),
  }
}

#[test]
fn test_full_width_unsigned_literals_are_accepted() {
  let yaml = WHEELS.replace(
    "          type: uint64_t\n",
    "          type: uint64_t\n          default: 18446744073709551615\n          health_checks:\n            - type: range\n              min: 9223372036854775808\n              max: 18446744073709551615\n",
  );
  let protocol = build(&yaml).unwrap();
  let odometer = &protocol.frames[0].fields[3];

  assert_eq!(odometer.name, "odometer");
  assert_eq!(odometer.default, Some(Literal::Unsigned(u64::MAX)));
  assert_eq!(
    odometer.health_checks[0].condition,
    Condition::Range { min: Literal::Unsigned(1 << 63), max: Literal::Unsigned(u64::MAX) }
  );

  let inverted = yaml.replace("min: 9223372036854775808", "min: 18446744073709551615").replace(
    "max: 18446744073709551615",
    "max: 18446744073709551614",
  );
  let err = build(&inverted).unwrap_err();
  assert!(err.to_string().contains("greater than"), "{}", err);
}

#[test]
fn test_unsigned_literal_beyond_a_signed_field_is_rejected() {
  let yaml = WHEELS.replace(
    "          type: int16_t\n",
    "          type: int64_t\n          default: 9223372036854775808\n",
  );
  let err = build(&yaml).unwrap_err();
  assert!(err.to_string().contains("invalid default"), "{}", err);
}
