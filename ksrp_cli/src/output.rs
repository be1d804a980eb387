//! Writes a finished compilation to disk

use ksrp_gen::Artifacts;
use ksrp_types::{CompileError, CompileResult};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Counts reported after a write
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    pub library_files: usize,
    pub artifacts: usize,
}

/// Places the library skeleton and the rendered artifacts under an output
/// directory. Artifacts land below `<output>/<include_root>/`; existing files
/// are overwritten.
pub struct OutputWriter {
    output_dir: PathBuf,
    include_root: String,
    library_dir: Option<PathBuf>,
}

impl OutputWriter {
    pub fn new(output_dir: impl Into<PathBuf>, include_root: &str) -> Self {
        Self {
            output_dir: output_dir.into(),
            include_root: include_root.to_string(),
            library_dir: None,
        }
    }

    pub fn with_library(mut self, library_dir: impl Into<PathBuf>) -> Self {
        self.library_dir = Some(library_dir.into());
        self
    }

    pub fn artifact_root(&self) -> PathBuf {
        self.output_dir.join(&self.include_root)
    }

    pub fn write(&self, artifacts: &Artifacts) -> CompileResult<WriteSummary> {
        fs::create_dir_all(&self.output_dir).map_err(|e| CompileError::io(&self.output_dir, e))?;

        let library_files = match &self.library_dir {
            Some(dir) => self.copy_library(dir)?,
            None => 0,
        };

        let root = self.artifact_root();
        for (path, text) in artifacts {
            let target = root.join(path);
            create_parent(&target)?;
            fs::write(&target, text).map_err(|e| CompileError::io(&target, e))?;
            tracing::debug!(path = %target.display(), bytes = text.len(), "wrote artifact");
        }

        Ok(WriteSummary {
            library_files,
            artifacts: artifacts.len(),
        })
    }

    fn copy_library(&self, library_dir: &Path) -> CompileResult<usize> {
        let mut copied = 0;
        for entry in WalkDir::new(library_dir).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(library_dir).to_path_buf();
                CompileError::io(path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(library_dir)
                .map_err(|_| CompileError::Config(format!("{} is outside the library", entry.path().display())))?;
            let target = self.output_dir.join(relative);
            create_parent(&target)?;
            fs::copy(entry.path(), &target).map_err(|e| CompileError::io(entry.path(), e))?;
            copied += 1;
        }

        tracing::debug!(library = %library_dir.display(), files = copied, "copied library skeleton");
        Ok(copied)
    }
}

fn create_parent(path: &Path) -> CompileResult<()> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent).map_err(|e| CompileError::io(parent, e)),
        None => Ok(()),
    }
}
