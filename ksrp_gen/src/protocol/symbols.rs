use ksrp_types::{CompileError, CompileResult};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/* Who asked for a symbol: the source document, a (subsystem, frame, field)
 * path, and what the symbol is */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
  document: Option<PathBuf>,
  path: Vec<String>,
  role: String,
}

impl Owner {
  /* Symbols shared by every protocol of the output */
  pub fn output(role: impl Into<String>) -> Self {
    Self { document: None, path: Vec::new(), role: role.into() }
  }

  pub fn subsystem(document: &Path, subsystem: &str, role: impl Into<String>) -> Self {
    Self {
      document: Some(document.to_path_buf()),
      path: vec![subsystem.to_string()],
      role: role.into(),
    }
  }

  pub fn frame(document: &Path, subsystem: &str, frame: &str, role: impl Into<String>) -> Self {
    Self {
      document: Some(document.to_path_buf()),
      path: vec![subsystem.to_string(), frame.to_string()],
      role: role.into(),
    }
  }

  pub fn field(document: &Path, subsystem: &str, frame: &str, field: &str, role: impl Into<String>) -> Self {
    Self {
      document: Some(document.to_path_buf()),
      path: vec![subsystem.to_string(), frame.to_string(), field.to_string()],
      role: role.into(),
    }
  }

  pub fn document(&self) -> Option<&Path> {
    self.document.as_deref()
  }
}

impl fmt::Display for Owner {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.document {
      None => write!(f, "output ({})", self.role),
      Some(document) => write!(f, "{} ({}) in {}", self.path.join("/"), self.role, document.display()),
    }
  }
}

/// Every C symbol the output will define, with the element that produced it.
///
/// C has a single namespace for typedefs, enumerators, macros and functions,
/// so a symbol synthesized twice is an error no matter which kinds collide.
#[derive(Debug, Default)]
pub struct SymbolTable {
  symbols: HashMap<String, Owner>,
}

impl SymbolTable {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register(&mut self, symbol: &str, owner: Owner) -> CompileResult<()> {
    if let Some(first) = self.symbols.get(symbol) {
      return Err(CompileError::NameCollision {
        symbol: symbol.to_string(),
        first: first.to_string(),
        second: owner.to_string(),
      });
    }
    self.symbols.insert(symbol.to_string(), owner);
    Ok(())
  }

  pub fn len(&self) -> usize {
    self.symbols.len()
  }

  pub fn is_empty(&self) -> bool {
    self.symbols.is_empty()
  }

  pub fn owner(&self, symbol: &str) -> Option<&Owner> {
    self.symbols.get(symbol)
  }
}
