use ksrp_types::ProtocolDef;
use serde_derive::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/* Top-level layout of a protocol specification document */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProtocolFile {
    pub protocol: ProtocolDef,
}

/* A validated protocol description together with the file it came from */
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub protocol: ProtocolDef,
}

impl SourceDocument {
    pub fn new(path: impl Into<PathBuf>, protocol: ProtocolDef) -> Self {
        Self {
            path: path.into(),
            protocol,
        }
    }

    /* Get the document path */
    pub fn path(&self) -> &Path {
        &self.path
    }

    /* Get the subsystem name */
    pub fn subsystem(&self) -> &str {
        &self.protocol.subsystem
    }

    /* Get the numeric subsystem id */
    pub fn subsystem_id(&self) -> u8 {
        self.protocol.subsystem_id
    }
}
