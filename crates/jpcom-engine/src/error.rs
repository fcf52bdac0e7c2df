//! Errors reported by data-engine calls.

use crate::types::BlockId;

/// Non-success outcome of one engine call.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt container {path}: {message}")]
    Corrupt { path: String, message: String },

    #[error("block {block} already present in {path}")]
    BlockExists { block: BlockId, path: String },

    #[error("file list is empty")]
    EmptyFileList,

    #[error("unknown or closed diagram session #{0}")]
    UnknownDiagram(u64),

    #[error("unknown or closed knowledge session #{0}")]
    UnknownKnowledge(u64),

    #[error("bridge input incomplete: {0}")]
    BridgeInput(String),

    #[error("knowledge session #{0} has no bridged train display line data")]
    NotBridged(u64),
}

impl EngineError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn corrupt(path: &std::path::Path, message: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.display().to_string(),
            message: message.into(),
        }
    }
}
