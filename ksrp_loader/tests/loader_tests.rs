use ksrp_loader::ksrp_types::{CompileError, TypeRegistry};
use ksrp_loader::SchemaLoader;
use std::fs;
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
  multi_device: true
  frames:
    - name: wheels_status
      frame_id: 12
      fields:
        - name: temperature
          type: float
          health_checks:
            - type: range
              min: 0
              max: 100
              result: ok
        - name: algorithm_type
          type: enum
          values: [position, velocity, { name: torque, value: 7 }]
"#;

fn load(contents: &str) -> Result<ksrp_loader::SourceDocument, CompileError> {
    let registry = TypeRegistry::standard();
    SchemaLoader::new(&registry).load_str(Path::new("test.yaml"), contents)
}

#[test]
fn loads_a_minimal_document() {
    let document = load(POWER).expect("power document should load");
    assert_eq!(document.subsystem(), "power");
    assert_eq!(document.subsystem_id(), 3);
    assert!(!document.protocol.multi_device);
    assert_eq!(document.protocol.frames.len(), 1);

    let fields = &document.protocol.frames[0].fields;
    assert_eq!(fields[0].name, "voltage");
    assert_eq!(fields[1].type_name, "bool");
}

#[test]
fn loads_enum_values_and_health_checks() {
    let document = load(WHEELS).expect("wheels document should load");
    assert!(document.protocol.multi_device);

    let fields = &document.protocol.frames[0].fields;
    assert_eq!(fields[0].health_checks.len(), 1);
    assert_eq!(fields[1].values.len(), 3);
    assert_eq!(fields[1].values[2].explicit_value(), Some(7));
}

#[test]
fn rejects_unknown_types_naming_the_field() {
    let yaml = POWER.replace("type: float", "type: uint24_t");
    match load(&yaml) {
        Err(CompileError::UnknownType { location, type_name }) => {
            assert_eq!(type_name, "uint24_t");
            assert_eq!(location.frame.as_deref(), Some("status"));
            assert_eq!(location.field.as_deref(), Some("voltage"));
        }
        other => panic!("expected UnknownType, got {:?}", other),
    }
}

#[test]
fn rejects_missing_required_keys() {
    let yaml = POWER.replace("  subsystem_id: 3\n", "");
    let err = load(&yaml).unwrap_err();
    assert!(matches!(err, CompileError::Schema { .. }), "{:?}", err);
    assert!(err.to_string().contains("subsystem_id"), "{}", err);
}

#[test]
fn rejects_enum_without_values() {
    let yaml = POWER.replace("type: bool", "type: enum");
    let err = load(&yaml).unwrap_err();
    assert!(err.to_string().contains("non-empty `values`"), "{}", err);
}

#[test]
fn rejects_values_on_non_enum_fields() {
    let yaml = POWER.replace("type: bool", "type: bool\n          values: [a, b]");
    let err = load(&yaml).unwrap_err();
    assert!(err.to_string().contains("only allowed on enum fields"), "{}", err);
}

#[test]
fn rejects_duplicate_frame_ids() {
    let yaml = format!(
        "{}    - name: other\n      frame_id: 1\n      fields:\n        - name: x\n          type: uint8_t\n",
        POWER
    );
    let err = load(&yaml).unwrap_err();
    assert!(err.to_string().contains("frame id 1 is already used by frame 'status'"), "{}", err);
}

#[test]
fn rejects_duplicate_field_names() {
    let yaml = POWER.replace("name: ok", "name: voltage");
    let err = load(&yaml).unwrap_err();
    assert!(err.to_string().contains("duplicate field name"), "{}", err);
}

#[test]
fn rejects_declared_device_id_in_multi_device_protocols() {
    let yaml = WHEELS.replace("name: temperature", "name: device_id");
    let err = load(&yaml).unwrap_err();
    assert!(err.to_string().contains("reserved"), "{}", err);
}

#[test]
fn rejects_frame_ids_wider_than_a_byte() {
    let yaml = POWER.replace("frame_id: 1", "frame_id: 300");
    assert!(matches!(load(&yaml), Err(CompileError::Schema { .. })));
}

#[test]
fn load_dir_sorts_by_subsystem_regardless_of_file_names() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a_wheels.yaml"), WHEELS).unwrap();
    fs::write(dir.path().join("b_power.yml"), POWER).unwrap();
    fs::write(dir.path().join("notes.txt"), "not a protocol").unwrap();

    let registry = TypeRegistry::standard();
    let documents = SchemaLoader::new(&registry).load_dir(dir.path()).unwrap();
    let subsystems: Vec<&str> = documents.iter().map(|d| d.subsystem()).collect();
    assert_eq!(subsystems, vec!["power", "wheels"]);
}

#[test]
fn load_dir_rejects_duplicate_subsystem_ids() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("power.yaml"), POWER).unwrap();
    fs::write(
        dir.path().join("battery.yaml"),
        POWER.replace("subsystem: power", "subsystem: battery"),
    )
    .unwrap();

    let registry = TypeRegistry::standard();
    let err = SchemaLoader::new(&registry).load_dir(dir.path()).unwrap_err();
    assert!(err.to_string().contains("subsystem id 3 is already used by subsystem 'battery'"), "{}", err);
}

#[test]
fn load_file_reports_missing_files_as_io_errors() {
    let registry = TypeRegistry::standard();
    let err = SchemaLoader::new(&registry)
        .load_file(Path::new("/nonexistent/protocol.yaml"))
        .unwrap_err();
    assert!(matches!(err, CompileError::Io { .. }));
}
