use convert_case::{Case, Casing};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/* Fixed parts of every synthesized symbol */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingScheme {
  pub prefix: String,
}

impl Default for NamingScheme {
  fn default() -> Self {
    Self { prefix: "KSRP".to_string() }
  }
}

/* Identifiers are snake_case in documents; split on underscores only so that
 * digits stay glued to their word (algorithm_type2 -> AlgorithmType2). */
fn camel(name: &str) -> String {
  name.from_case(Case::Snake).to_case(Case::Pascal)
}

fn upper(name: &str) -> String {
  name.from_case(Case::Snake).to_case(Case::UpperSnake)
}

/* Strip diacritical marks and surrounding whitespace from free text */
pub fn normalize_text(text: &str) -> String {
  let stripped: String = text.nfd().filter(|c| !is_combining_mark(*c)).collect();
  stripped.trim().to_string()
}

/// Derives every C symbol the emitters produce from (subsystem, frame, field)
/// tuples.
///
/// Type-like names use `PREFIX_Subsystem_Frame_Field` in UpperCamelCase
/// parts; constants use `PREFIX_SUBSYSTEM_FRAME_FIELD_...` in upper snake
/// case. Uniqueness across the whole output is checked afterwards by
/// [`crate::protocol::symbols::SymbolTable`].
#[derive(Debug, Clone, Default)]
pub struct NameSynthesizer {
  scheme: NamingScheme,
}

impl NameSynthesizer {
  pub fn new(scheme: NamingScheme) -> Self {
    Self { scheme }
  }

  pub fn prefix(&self) -> &str {
    &self.scheme.prefix
  }

  pub fn normalize_text(&self, text: &str) -> String {
    normalize_text(text)
  }

  /* ----- type names ----- */

  pub fn enum_type(&self, subsystem: &str, frame: &str, field: &str) -> String {
    format!("{}_{}_{}_{}", self.scheme.prefix, camel(subsystem), camel(frame), camel(field))
  }

  pub fn frame_type(&self, subsystem: &str, frame: &str) -> String {
    format!("{}_{}_{}_Frame", self.scheme.prefix, camel(subsystem), camel(frame))
  }

  pub fn field_id_type(&self, subsystem: &str, frame: &str) -> String {
    format!("{}_{}_{}_FieldID", self.scheme.prefix, camel(subsystem), camel(frame))
  }

  pub fn frame_id_type(&self, subsystem: &str) -> String {
    format!("{}_{}_FrameID", self.scheme.prefix, camel(subsystem))
  }

  pub fn instance_type(&self, subsystem: &str) -> String {
    format!("{}_{}_Instance", self.scheme.prefix, camel(subsystem))
  }

  pub fn subsystem_id_type(&self) -> String {
    format!("{}_SubsystemID", self.scheme.prefix)
  }

  /* ----- constants ----- */

  fn subsystem_scope(&self, subsystem: &str) -> String {
    format!("{}_{}", self.scheme.prefix, upper(subsystem))
  }

  fn frame_scope(&self, subsystem: &str, frame: &str) -> String {
    format!("{}_{}", self.subsystem_scope(subsystem), upper(frame))
  }

  fn field_scope(&self, subsystem: &str, frame: &str, field: &str) -> String {
    format!("{}_{}", self.frame_scope(subsystem, frame), upper(field))
  }

  pub fn subsystem_id(&self, subsystem: &str) -> String {
    format!("{}_SUBSYSTEM_ID", self.subsystem_scope(subsystem))
  }

  pub fn subsystem_count(&self) -> String {
    format!("{}_SUBSYSTEM_COUNT", self.scheme.prefix)
  }

  pub fn frame_id(&self, subsystem: &str, frame: &str) -> String {
    format!("{}_FRAME_ID", self.frame_scope(subsystem, frame))
  }

  pub fn frame_size(&self, subsystem: &str, frame: &str) -> String {
    format!("{}_FRAME_SIZE", self.frame_scope(subsystem, frame))
  }

  pub fn type_id(&self, subsystem: &str, frame: &str) -> String {
    format!("{}_TYPE_ID", self.frame_scope(subsystem, frame))
  }

  pub fn field_id(&self, subsystem: &str, frame: &str, field: &str) -> String {
    format!("{}_FIELD_ID", self.field_scope(subsystem, frame, field))
  }

  /* `<FIELD>_<LABEL>`, scoped by subsystem and frame */
  pub fn enum_label(&self, subsystem: &str, frame: &str, field: &str, label: &str) -> String {
    format!("{}_{}", self.field_scope(subsystem, frame, field), upper(label))
  }

  pub fn default_value(&self, subsystem: &str, frame: &str, field: &str) -> String {
    format!("{}_DEFAULT", self.field_scope(subsystem, frame, field))
  }

  /* `<FIELD>_HEALTH_CHECK_<RESULT>`; unlabeled checks use their 1-based position */
  pub fn health_check(
    &self,
    subsystem: &str,
    frame: &str,
    field: &str,
    result: Option<&str>,
    position: usize,
  ) -> String {
    let label = match result {
      Some(result) => upper(result),
      None => position.to_string(),
    };
    format!("{}_HEALTH_CHECK_{}", self.field_scope(subsystem, frame, field), label)
  }

  /* ----- functions ----- */

  pub fn getter(&self, subsystem: &str, frame: &str, field: &str) -> String {
    format!("{}_Get_{}_{}_{}", self.scheme.prefix, camel(subsystem), camel(frame), camel(field))
  }

  pub fn setter(&self, subsystem: &str, frame: &str, field: &str) -> String {
    format!("{}_Set_{}_{}_{}", self.scheme.prefix, camel(subsystem), camel(frame), camel(field))
  }

  pub fn frame_size_lookup(&self, subsystem: &str) -> String {
    format!("{}_FrameSize_{}", self.scheme.prefix, camel(subsystem))
  }

  pub fn type_id_check(&self, subsystem: &str) -> String {
    format!("{}_IsTypeIDOf_{}", self.scheme.prefix, camel(subsystem))
  }

  pub fn instance_fn(&self, subsystem: &str, operation: &str) -> String {
    format!("{}_{}_Instance_{}", self.scheme.prefix, camel(subsystem), operation)
  }

  /* ----- files ----- */

  pub fn header_guard(&self, stem: &str) -> String {
    format!("{}_{}_H_", self.scheme.prefix, upper(stem))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_enum_type_name() {
    let names = NameSynthesizer::default();
    assert_eq!(
      names.enum_type("wheels", "wheels_status", "algorithm_type"),
      "KSRP_Wheels_WheelsStatus_AlgorithmType"
    );
    assert_eq!(
      names.enum_type("wheels", "wheels_status", "algorithm_type2"),
      "KSRP_Wheels_WheelsStatus_AlgorithmType2"
    );
  }

  #[test]
  fn test_enum_label_ends_with_field_and_label() {
    let names = NameSynthesizer::default();
    let label = names.enum_label("wheels", "wheels_status", "algorithm_type", "position");
    assert_eq!(label, "KSRP_WHEELS_WHEELS_STATUS_ALGORITHM_TYPE_POSITION");
    assert!(label.ends_with("ALGORITHM_TYPE_POSITION"));
  }

  #[test]
  fn test_health_check_names() {
    let names = NameSynthesizer::default();
    assert_eq!(
      names.health_check("power", "status", "temperature", Some("over_temp"), 1),
      "KSRP_POWER_STATUS_TEMPERATURE_HEALTH_CHECK_OVER_TEMP"
    );
    assert_eq!(
      names.health_check("power", "status", "temperature", None, 3),
      "KSRP_POWER_STATUS_TEMPERATURE_HEALTH_CHECK_3"
    );
  }

  #[test]
  fn test_custom_prefix() {
    let names = NameSynthesizer::new(NamingScheme { prefix: "ACME".to_string() });
    assert_eq!(names.frame_type("power", "status"), "ACME_Power_Status_Frame");
    assert_eq!(names.subsystem_id("power"), "ACME_POWER_SUBSYSTEM_ID");
    assert_eq!(names.header_guard("power_protocol"), "ACME_POWER_PROTOCOL_H_");
  }

  #[test]
  fn test_normalize_text_strips_diacritics_and_whitespace() {
    assert_eq!(normalize_text("  Temperatura zbyt wysoka é "), "Temperatura zbyt wysoka e");
    assert_eq!(normalize_text("Nie działa uniwersal"), "Nie działa uniwersal");
    assert_eq!(normalize_text("Crème brûlée"), "Creme brulee");
  }
}
