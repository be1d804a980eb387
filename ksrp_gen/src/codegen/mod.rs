pub mod c;
pub mod construct;
pub mod template;
pub mod view;

use ksrp_types::{CompileError, CompileResult};
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub use c::ConstructEmitter;
pub use template::TemplateEmitter;
pub use view::{CodegenView, DEFAULT_INCLUDE_ROOT};

/// Rendered headers keyed by their path below the include root.
pub type Artifacts = BTreeMap<PathBuf, String>;

/// Turns a prepared view into header text.
///
/// Implementations never compute layout; offsets, sizes and names all come
/// from the [`CodegenView`].
pub trait Emitter {
  fn kind(&self) -> EmitterKind;

  fn emit(&self, view: &CodegenView) -> CompileResult<Artifacts>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitterKind {
  #[default]
  Template,
  Construct,
}

impl fmt::Display for EmitterKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      EmitterKind::Template => write!(f, "template"),
      EmitterKind::Construct => write!(f, "construct"),
    }
  }
}

impl FromStr for EmitterKind {
  type Err = CompileError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "template" => Ok(EmitterKind::Template),
      "construct" => Ok(EmitterKind::Construct),
      other => Err(CompileError::Config(format!(
        "unknown emitter '{}' (expected 'template' or 'construct')",
        other
      ))),
    }
  }
}

/* Insert an artifact, refusing to overwrite one that is already there */
pub(crate) fn insert_artifact(artifacts: &mut Artifacts, path: &str, text: String) -> CompileResult<()> {
  let path = PathBuf::from(path);
  if artifacts.contains_key(&path) {
    return Err(CompileError::Render {
      artifact: path.display().to_string(),
      reason: "artifact path is produced twice".to_string(),
    });
  }
  artifacts.insert(path, text);
  Ok(())
}

/* Human-readable header comment shared by both emitters */
pub(crate) fn banner(source: Option<&str>) -> String {
  match source {
    Some(source) => format!("Generated by ksrp from {}. Do not edit.", source),
    None => "Generated by ksrp. Do not edit.".to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_emitter_kind_parsing() {
    assert_eq!("template".parse::<EmitterKind>().unwrap(), EmitterKind::Template);
    assert_eq!("construct".parse::<EmitterKind>().unwrap(), EmitterKind::Construct);
    assert!(matches!("jinja".parse::<EmitterKind>(), Err(CompileError::Config(_))));
    assert_eq!(EmitterKind::default().to_string(), "template");
  }
}
