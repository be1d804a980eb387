use ksrp_loader::loader::{check_unique_subsystems, sort_documents};
use ksrp_loader::validate::is_identifier;
use ksrp_loader::{SchemaLoader, SourceDocument};
use ksrp_types::{CompileError, CompileResult, TypeRegistry};
use std::path::{Component, Path, PathBuf};

use crate::codegen::{Artifacts, CodegenView, ConstructEmitter, Emitter, EmitterKind, TemplateEmitter, DEFAULT_INCLUDE_ROOT};
use crate::protocol::{NameSynthesizer, NamingScheme, Protocol, ProtocolBuilder, SymbolTable};

/// Settings of one compilation. Everything else is fixed by the documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
  pub prefix: String,
  pub include_root: String,
  pub emitter: EmitterKind,
  pub templates_dir: Option<PathBuf>,
}

impl Default for CompilerOptions {
  fn default() -> Self {
    Self {
      prefix: NamingScheme::default().prefix,
      include_root: DEFAULT_INCLUDE_ROOT.to_string(),
      emitter: EmitterKind::default(),
      templates_dir: None,
    }
  }
}

/* Output of a successful run; nothing has touched the disk yet */
#[derive(Debug)]
pub struct Compilation {
  pub protocols: Vec<Protocol>,
  pub artifacts: Artifacts,
  pub symbols: usize,
}

/// Drives load, build, symbol check and emission for a set of documents.
pub struct Compiler {
  registry: TypeRegistry,
  names: NameSynthesizer,
  options: CompilerOptions,
}

/* The include root is joined below the output directory and spelled in `#include` lines */
fn check_include_root(root: &str) -> CompileResult<()> {
  let path = Path::new(root);
  let relative = path.components().all(|c| matches!(c, Component::Normal(_)));
  if root.is_empty() || !relative || root.contains('\\') {
    return Err(CompileError::Config(format!(
      "include root '{}' must be a non-empty relative path without '..'",
      root
    )));
  }
  Ok(())
}

impl Compiler {
  pub fn new(options: CompilerOptions) -> CompileResult<Self> {
    if !is_identifier(&options.prefix) {
      return Err(CompileError::Config(format!("prefix '{}' is not a valid C identifier", options.prefix)));
    }
    check_include_root(&options.include_root)?;

    let names = NameSynthesizer::new(NamingScheme { prefix: options.prefix.clone() });
    Ok(Self { registry: TypeRegistry::standard(), names, options })
  }

  pub fn registry(&self) -> &TypeRegistry {
    &self.registry
  }

  pub fn names(&self) -> &NameSynthesizer {
    &self.names
  }

  pub fn options(&self) -> &CompilerOptions {
    &self.options
  }

  pub fn load_dir(&self, dir: &Path) -> CompileResult<Vec<SourceDocument>> {
    SchemaLoader::new(&self.registry).load_dir(dir)
  }

  /// Build the layout of every document, in subsystem order.
  pub fn build(&self, documents: &[SourceDocument]) -> CompileResult<Vec<Protocol>> {
    let mut documents = documents.to_vec();
    sort_documents(&mut documents);
    check_unique_subsystems(&documents)?;

    let builder = ProtocolBuilder::new(&self.registry, &self.names);
    documents.iter().map(|document| builder.build(document)).collect()
  }

  /// Project the protocols for rendering and reject colliding symbols.
  pub fn view(&self, protocols: &[Protocol]) -> CompileResult<CodegenView> {
    self.checked_view(protocols).map(|(view, _)| view)
  }

  fn checked_view(&self, protocols: &[Protocol]) -> CompileResult<(CodegenView, SymbolTable)> {
    let view = CodegenView::build(protocols, &self.names, &self.options.include_root);

    let mut symbols = SymbolTable::new();
    view.register_symbols(&mut symbols)?;
    tracing::debug!(symbols = symbols.len(), "symbol table is collision free");

    Ok((view, symbols))
  }

  pub fn emitter(&self) -> Box<dyn Emitter> {
    match self.options.emitter {
      EmitterKind::Template => match &self.options.templates_dir {
        Some(dir) => Box::new(TemplateEmitter::with_templates_dir(dir)),
        None => Box::new(TemplateEmitter::new()),
      },
      EmitterKind::Construct => Box::new(ConstructEmitter::new()),
    }
  }

  pub fn compile(&self, documents: &[SourceDocument]) -> CompileResult<Compilation> {
    let protocols = self.build(documents)?;
    let (view, symbols) = self.checked_view(&protocols)?;

    let artifacts = self.emitter().emit(&view)?;
    tracing::info!(
      protocols = protocols.len(),
      artifacts = artifacts.len(),
      emitter = %self.options.emitter,
      "compiled protocol set"
    );

    Ok(Compilation { protocols, artifacts, symbols: symbols.len() })
  }

  pub fn compile_dir(&self, dir: &Path) -> CompileResult<Compilation> {
    let documents = self.load_dir(dir)?;
    self.compile(&documents)
  }
}
