use ksrp_types::{CompileError, CompileResult, FieldDef, FrameDef, Location, ProtocolDef, TypeRegistry};
use std::collections::{HashMap, HashSet};

/* Name of the field injected in front of every frame of a multi-device protocol */
pub const DEVICE_ID_FIELD: &str = "device_id";

/* Check that a name can be embedded in a C identifier */
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn require_identifier(location: &Location, what: &str, name: &str) -> CompileResult<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(CompileError::schema(
            location,
            format!(
                "{} '{}' must contain only ASCII letters, digits and underscores and must not start with a digit",
                what, name
            ),
        ))
    }
}

/* Validate the structure of one protocol description */
pub fn validate_protocol(
    protocol: &ProtocolDef,
    registry: &TypeRegistry,
    location: &Location,
) -> CompileResult<()> {
    require_identifier(location, "subsystem name", &protocol.subsystem)?;

    if protocol.frames.is_empty() {
        return Err(CompileError::schema(location, "protocol declares no frames"));
    }

    let mut frame_names = HashSet::new();
    let mut frame_ids: HashMap<u8, &str> = HashMap::new();

    for frame in &protocol.frames {
        let frame_location = location.frame(&frame.name);
        require_identifier(&frame_location, "frame name", &frame.name)?;

        if !frame_names.insert(frame.name.as_str()) {
            return Err(CompileError::schema(&frame_location, "duplicate frame name"));
        }
        if let Some(previous) = frame_ids.insert(frame.frame_id, &frame.name) {
            return Err(CompileError::schema(
                &frame_location,
                format!("frame id {} is already used by frame '{}'", frame.frame_id, previous),
            ));
        }

        validate_frame(frame, protocol.multi_device, registry, &frame_location)?;
    }

    Ok(())
}

fn validate_frame(
    frame: &FrameDef,
    multi_device: bool,
    registry: &TypeRegistry,
    location: &Location,
) -> CompileResult<()> {
    /* A multi-device frame still carries the injected device id */
    if frame.fields.is_empty() && !multi_device {
        return Err(CompileError::schema(location, "frame declares no fields"));
    }

    let mut field_names = HashSet::new();
    for field in &frame.fields {
        let field_location = location.field(&field.name);
        require_identifier(&field_location, "field name", &field.name)?;

        if !field_names.insert(field.name.as_str()) {
            return Err(CompileError::schema(&field_location, "duplicate field name"));
        }
        if multi_device && field.name == DEVICE_ID_FIELD {
            return Err(CompileError::schema(
                &field_location,
                "field name is reserved for the device id of multi-device protocols",
            ));
        }

        validate_field(field, registry, &field_location)?;
    }

    Ok(())
}

fn validate_field(field: &FieldDef, registry: &TypeRegistry, location: &Location) -> CompileResult<()> {
    if !registry.contains(&field.type_name) {
        return Err(CompileError::UnknownType {
            location: location.clone(),
            type_name: field.type_name.clone(),
        });
    }

    if field.type_name == TypeRegistry::ENUM {
        if field.values.is_empty() {
            return Err(CompileError::schema(location, "enum field requires a non-empty `values` list"));
        }
        let mut labels = HashSet::new();
        for value in &field.values {
            require_identifier(location, "enum label", value.name())?;
            if !labels.insert(value.name()) {
                return Err(CompileError::schema(
                    location,
                    format!("duplicate enum label '{}'", value.name()),
                ));
            }
        }
    } else if !field.values.is_empty() {
        return Err(CompileError::schema(
            location,
            format!("`values` is only allowed on enum fields, not on '{}'", field.type_name),
        ));
    }

    for check in &field.health_checks {
        if let Some(result) = &check.result {
            require_identifier(location, "health check result", result)?;
        }
    }

    Ok(())
}
