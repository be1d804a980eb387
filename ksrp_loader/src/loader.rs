use ksrp_types::{CompileError, CompileResult, Location, TypeRegistry};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::file::{ProtocolFile, SourceDocument};
use crate::validate::validate_protocol;

/* Loader turning protocol specification files into validated raw records */
pub struct SchemaLoader<'a> {
    registry: &'a TypeRegistry,
}

impl<'a> SchemaLoader<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self { registry }
    }

    /* Parse and validate a document already read into memory */
    pub fn load_str(&self, path: &Path, contents: &str) -> CompileResult<SourceDocument> {
        let location = Location::document(path);
        let file: ProtocolFile = serde_yml::from_str(contents).map_err(|e| {
            CompileError::schema(&location, format!("invalid protocol document: {}", e))
        })?;

        validate_protocol(&file.protocol, self.registry, &location)?;

        tracing::debug!(
            document = %path.display(),
            subsystem = %file.protocol.subsystem,
            frames = file.protocol.frames.len(),
            "loaded protocol document"
        );

        Ok(SourceDocument::new(path, file.protocol))
    }

    /* Read and validate a single document */
    pub fn load_file(&self, path: &Path) -> CompileResult<SourceDocument> {
        let contents = std::fs::read_to_string(path).map_err(|e| CompileError::io(path, e))?;
        self.load_str(path, &contents)
    }

    /* Load a set of documents, returned sorted by subsystem name */
    pub fn load_files(&self, paths: &[PathBuf]) -> CompileResult<Vec<SourceDocument>> {
        let mut documents = paths
            .iter()
            .map(|path| self.load_file(path))
            .collect::<CompileResult<Vec<_>>>()?;

        sort_documents(&mut documents);
        check_unique_subsystems(&documents)?;
        Ok(documents)
    }

    /* Load every `*.yaml` / `*.yml` document of a directory */
    pub fn load_dir(&self, dir: &Path) -> CompileResult<Vec<SourceDocument>> {
        let entries = std::fs::read_dir(dir).map_err(|e| CompileError::io(dir, e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| CompileError::io(dir, e))?.path();
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "yaml" || ext == "yml");
            if path.is_file() && is_yaml {
                paths.push(path);
            }
        }

        if paths.is_empty() {
            return Err(CompileError::schema(
                &Location::document(dir),
                "directory contains no protocol documents (*.yaml, *.yml)",
            ));
        }

        self.load_files(&paths)
    }
}

/* Order documents by subsystem so that output never depends on enumeration order */
pub fn sort_documents(documents: &mut [SourceDocument]) {
    documents.sort_by(|a, b| {
        a.subsystem()
            .cmp(b.subsystem())
            .then_with(|| a.path().cmp(b.path()))
    });
}

/* Subsystem names and ids identify a protocol across the whole output */
pub fn check_unique_subsystems(documents: &[SourceDocument]) -> CompileResult<()> {
    let mut names: HashMap<&str, &Path> = HashMap::new();
    let mut ids: HashMap<u8, &SourceDocument> = HashMap::new();

    for document in documents {
        let location = Location::document(document.path());
        if let Some(previous) = names.insert(document.subsystem(), document.path()) {
            return Err(CompileError::schema(
                &location,
                format!(
                    "subsystem '{}' is already defined in {}",
                    document.subsystem(),
                    previous.display()
                ),
            ));
        }
        if let Some(previous) = ids.insert(document.subsystem_id(), document) {
            return Err(CompileError::schema(
                &location,
                format!(
                    "subsystem id {} is already used by subsystem '{}'",
                    document.subsystem_id(),
                    previous.subsystem()
                ),
            ));
        }
    }

    Ok(())
}
