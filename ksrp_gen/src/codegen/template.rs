use ksrp_types::{CompileError, CompileResult};
use minijinja::{context, Environment, UndefinedBehavior};
use std::path::{Path, PathBuf};

use super::view::CodegenView;
use super::{insert_artifact, Artifacts, Emitter, EmitterKind};

/* (template name, file name in a templates directory, embedded source) */
const TEMPLATES: [(&str, &str, &str); 5] = [
  ("macros", "macros.h.jinja", include_str!("../../templates/macros.h.jinja")),
  ("protocol", "protocol.h.jinja", include_str!("../../templates/protocol.h.jinja")),
  ("instance", "instance.h.jinja", include_str!("../../templates/instance.h.jinja")),
  ("common", "common.h.jinja", include_str!("../../templates/common.h.jinja")),
  ("utils", "utils.h.jinja", include_str!("../../templates/utils.h.jinja")),
];

/// Emitter rendering the view through minijinja templates.
///
/// Templates ship with the crate. A templates directory may override any of
/// them by providing a file with the same name; missing files fall back to
/// the embedded source.
#[derive(Debug, Default, Clone)]
pub struct TemplateEmitter {
  templates_dir: Option<PathBuf>,
}

fn render_error(artifact: &str, err: minijinja::Error) -> CompileError {
  CompileError::Render { artifact: artifact.to_string(), reason: format!("{:#}", err) }
}

impl TemplateEmitter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_templates_dir(dir: impl Into<PathBuf>) -> Self {
    Self { templates_dir: Some(dir.into()) }
  }

  pub fn templates_dir(&self) -> Option<&Path> {
    self.templates_dir.as_deref()
  }

  fn environment(&self) -> CompileResult<Environment<'static>> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);
    env.set_undefined_behavior(UndefinedBehavior::Strict);

    for (name, file, embedded) in TEMPLATES {
      let source = match &self.templates_dir {
        Some(dir) if dir.join(file).is_file() => {
          let path = dir.join(file);
          tracing::debug!(template = name, path = %path.display(), "using template override");
          std::fs::read_to_string(&path).map_err(|e| CompileError::io(&path, e))?
        }
        _ => embedded.to_string(),
      };
      env.add_template_owned(name, source).map_err(|e| render_error(file, e))?;
    }

    Ok(env)
  }

  fn render(
    env: &Environment<'_>,
    template: &str,
    artifact: &str,
    ctx: minijinja::Value,
  ) -> CompileResult<String> {
    env
      .get_template(template)
      .and_then(|tmpl| tmpl.render(ctx))
      .map_err(|e| render_error(artifact, e))
  }
}

impl Emitter for TemplateEmitter {
  fn kind(&self) -> EmitterKind {
    EmitterKind::Template
  }

  fn emit(&self, view: &CodegenView) -> CompileResult<Artifacts> {
    let env = self.environment()?;
    let mut artifacts = Artifacts::new();

    for protocol in &view.protocols {
      let header = &protocol.header;
      let text = Self::render(
        &env,
        "protocol",
        &header.path,
        context! {
          protocol => protocol,
          protocols => &view.protocols,
          clibraries => &header.clibraries,
          libraries => &header.libraries,
          guard => &header.guard,
          prefix => &view.prefix,
        },
      )?;
      insert_artifact(&mut artifacts, &header.path, text)?;

      let header = &protocol.instance.header;
      let text = Self::render(
        &env,
        "instance",
        &header.path,
        context! {
          protocol => protocol,
          clibraries => &header.clibraries,
          libraries => &header.libraries,
          guard => &header.guard,
          prefix => &view.prefix,
        },
      )?;
      insert_artifact(&mut artifacts, &header.path, text)?;
    }

    let text = Self::render(
      &env,
      "common",
      &view.common.path,
      context! {
        protocols => &view.protocols,
        subsystem_ids => &view.subsystem_ids,
        clibraries => &view.common.clibraries,
        libraries => &view.common.libraries,
        guard => &view.common.guard,
        prefix => &view.prefix,
      },
    )?;
    insert_artifact(&mut artifacts, &view.common.path, text)?;

    let text = Self::render(
      &env,
      "utils",
      &view.utils.path,
      context! {
        protocols => &view.protocols,
        subsystem_count => &view.subsystem_count,
        clibraries => &view.utils.clibraries,
        libraries => &view.utils.libraries,
        guard => &view.utils.guard,
        prefix => &view.prefix,
      },
    )?;
    insert_artifact(&mut artifacts, &view.utils.path, text)?;

    tracing::info!(emitter = %self.kind(), artifacts = artifacts.len(), "rendered artifacts");
    Ok(artifacts)
  }
}
