/* Codegen command - compile a protocol directory into the header library */

use crate::config::{LibrarySource, Settings};
use crate::output::OutputWriter;
use anyhow::{bail, Context};
use ksrp_gen::Compiler;

/* Execute the codegen command */
pub fn run(settings: &Settings, verbose: bool) -> anyhow::Result<()> {
    let output_dir = settings.require_output_dir()?;
    let options = &settings.options;

    if verbose {
        println!("KSRP Compiler - Code Generation Tool");
        println!("====================================\n");
        println!("[~] Configuration:");
        if let Some(config) = &settings.config_file {
            println!("  Config file: {}", config.display());
        }
        println!("  Source directory: {}", settings.source_dir.display());
        println!("  Output directory: {}", output_dir.display());
        println!("  Include root: {}", options.include_root);
        println!("  Prefix: {}", options.prefix);
        println!("  Emitter: {}", options.emitter);
        if let Some(dir) = &options.templates_dir {
            println!("  Templates: {}", dir.display());
        }
        println!();
    }

    let compiler = Compiler::new(options.clone())?;

    println!("[~] Loading protocol documents from {}...", settings.source_dir.display());
    let documents = compiler
        .load_dir(&settings.source_dir)
        .with_context(|| format!("Failed to load protocols from {}", settings.source_dir.display()))?;
    if verbose {
        for document in &documents {
            println!("    - {} ({})", document.subsystem(), document.path().display());
        }
    }

    let compilation = compiler.compile(&documents).context("Compilation failed")?;
    let frames: usize = compilation.protocols.iter().map(|p| p.frames.len()).sum();
    println!(
        "[~] Built {} protocol(s), {} frame(s), {} symbol(s)",
        compilation.protocols.len(),
        frames,
        compilation.symbols
    );

    let mut writer = OutputWriter::new(output_dir, &options.include_root);
    match &settings.library {
        LibrarySource::Explicit(dir) => {
            if !dir.is_dir() {
                bail!("Library directory {} does not exist", dir.display());
            }
            writer = writer.with_library(dir);
        }
        LibrarySource::Default(dir) => {
            if dir.is_dir() {
                writer = writer.with_library(dir);
            } else {
                tracing::warn!(library = %dir.display(), "default library skeleton not found, skipping copy");
            }
        }
        LibrarySource::Disabled => {}
    }

    let summary = writer
        .write(&compilation.artifacts)
        .with_context(|| format!("Failed to write output to {}", output_dir.display()))?;

    if verbose {
        for path in compilation.artifacts.keys() {
            println!("    - {}", writer.artifact_root().join(path).display());
        }
    }
    if summary.library_files > 0 {
        println!("[~] Copied {} library file(s)", summary.library_files);
    }
    println!(
        "[✓] Wrote {} header(s) to {}",
        summary.artifacts,
        writer.artifact_root().display()
    );

    Ok(())
}
