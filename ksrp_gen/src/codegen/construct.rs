use std::fmt::{self, Display, Write};

use super::view::c_string;

#[derive(Debug, Clone, PartialEq)]
pub struct Member {
  pub c_type: String,
  pub name: String,
  pub comment: Option<String>,
}

impl Member {
  /* Frame member annotated with its byte range */
  pub fn placed(c_type: &str, name: &str, offset: u64, width: u64) -> Self {
    Self {
      c_type: c_type.to_string(),
      name: name.to_string(),
      comment: Some(format!("offset {}, {}", offset, byte_count(width))),
    }
  }

  pub fn plain(c_type: &str, name: &str) -> Self {
    Self { c_type: c_type.to_string(), name: name.to_string(), comment: None }
  }
}

/// Generic C declaration tree.
///
/// Leaves print themselves; `Group` and `Guard` print their children, so a
/// whole header is rendered by formatting its root.
#[derive(Debug, Clone, PartialEq)]
pub enum Construct {
  Comment(String),
  /* Children on consecutive lines under an optional comment title */
  Group { title: Option<String>, items: Vec<Construct> },
  Include { path: String, system: bool },
  Define { name: String, value: String },
  /* Enumerators carry a value only when it must be spelled out */
  Enum { name: String, enumerators: Vec<(String, Option<u64>)> },
  Struct { name: String, packed: bool, members: Vec<Member> },
  StaticAssert { condition: String, message: String },
  Prototype { return_type: String, name: String, params: Vec<String> },
  /* Include guard around blocks separated by blank lines */
  Guard { name: String, body: Vec<Construct> },
}

impl Construct {
  pub fn group(title: impl Into<String>, items: Vec<Construct>) -> Self {
    Construct::Group { title: Some(title.into()), items }
  }

  pub fn lines(items: Vec<Construct>) -> Self {
    Construct::Group { title: None, items }
  }

  pub fn define(name: impl Into<String>, value: impl Into<String>) -> Self {
    Construct::Define { name: name.into(), value: value.into() }
  }

  /* Empty groups print nothing and are skipped by their parent */
  fn is_empty(&self) -> bool {
    matches!(self, Construct::Group { items, .. } if items.iter().all(Construct::is_empty))
  }
}

pub fn byte_count(width: u64) -> String {
  if width == 1 {
    "1 byte".to_string()
  } else {
    format!("{} bytes", width)
  }
}

fn join(items: &[Construct], separator: &str) -> String {
  items
    .iter()
    .filter(|item| !item.is_empty())
    .map(|item| item.to_string())
    .collect::<Vec<_>>()
    .join(separator)
}

impl Display for Construct {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Construct::Comment(text) => write!(f, "/* {} */", text),
      Construct::Group { title, items } => {
        if let Some(title) = title {
          writeln!(f, "/* {} */", title)?;
        }
        f.write_str(&join(items, "\n"))
      }
      Construct::Include { path, system: true } => write!(f, "#include <{}>", path),
      Construct::Include { path, system: false } => write!(f, "#include \"{}\"", path),
      Construct::Define { name, value } => write!(f, "#define {} {}", name, value),
      Construct::Enum { name, enumerators } => {
        let mut body = String::new();
        for (i, (enumerator, value)) in enumerators.iter().enumerate() {
          if i > 0 {
            body.push_str(",\n");
          }
          match value {
            Some(value) => write!(body, "  {} = {}", enumerator, value)?,
            None => write!(body, "  {}", enumerator)?,
          }
        }
        write!(f, "typedef enum {{\n{}\n}} {};", body, name)
      }
      Construct::Struct { name, packed, members } => {
        let attribute = if *packed { " __attribute__((packed))" } else { "" };
        writeln!(f, "typedef struct{} {{", attribute)?;
        for member in members {
          match &member.comment {
            Some(comment) => writeln!(f, "  {} {}; /* {} */", member.c_type, member.name, comment)?,
            None => writeln!(f, "  {} {};", member.c_type, member.name)?,
          }
        }
        write!(f, "}} {};", name)
      }
      Construct::StaticAssert { condition, message } => {
        write!(f, "_Static_assert({}, {});", condition, c_string(message))
      }
      Construct::Prototype { return_type, name, params } => {
        let params = if params.is_empty() { "void".to_string() } else { params.join(", ") };
        write!(f, "{} {}({});", return_type, name, params)
      }
      Construct::Guard { name, body } => {
        writeln!(f, "#ifndef {}", name)?;
        writeln!(f, "#define {}", name)?;
        writeln!(f)?;
        let body = join(body, "\n\n");
        if !body.is_empty() {
          writeln!(f, "{}", body)?;
          writeln!(f)?;
        }
        writeln!(f, "#endif /* {} */", name)
      }
    }
  }
}
