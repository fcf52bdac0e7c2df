//! Error types for jpcom build runs.

use jpcom_engine::EngineError;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Coarse failure taxonomy reported alongside every error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Config,
    Engine,
    Resource,
}

/// The engine call that reported non-success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineOp {
    InitiateDiagram,
    TerminateDiagram,
    InitiateKnowledge,
    TerminateKnowledge,
    RemoveBlock,
    AppendBlock,
    ReplaceFileId,
    ReplaceDateVersion,
    Bridge,
    WriteTrainDispLinePtn,
    DeleteFile,
}

impl EngineOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InitiateDiagram => "initiate_diagram",
            Self::TerminateDiagram => "terminate_diagram",
            Self::InitiateKnowledge => "initiate_knowledge",
            Self::TerminateKnowledge => "terminate_knowledge",
            Self::RemoveBlock => "remove_block",
            Self::AppendBlock => "append_block",
            Self::ReplaceFileId => "replace_file_id",
            Self::ReplaceDateVersion => "replace_date_version",
            Self::Bridge => "bridge_train_disp_line",
            Self::WriteTrainDispLinePtn => "write_train_disp_line_ptn",
            Self::DeleteFile => "delete_file",
        }
    }
}

impl Display for EngineOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal outcome of a build run. Nothing is recovered locally.
#[derive(Debug, thiserror::Error)]
pub enum JpcomError {
    #[error("failed to read id table {path}: {source}")]
    IdTableRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("id table {path} line {line}: {message}")]
    IdTableParse {
        path: String,
        line: usize,
        message: String,
    },

    #[error("id table {path} line {line}: invalid block id `{value}`")]
    BlockIdParse {
        path: String,
        line: usize,
        value: String,
    },

    #[error("invalid version `{value}`: expected a numeric yyyyMMdd date")]
    VersionParse { value: String },

    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{role} directory is required for bridging but was not configured")]
    MissingDirectory { role: &'static str },

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid toml at {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("output file is required (-o/--output or `output` in config)")]
    MissingOutput,

    #[error("invalid run id `{value}`: expected ascii letters, digits, `-` or `_`")]
    InvalidRunId { value: String },

    #[error("{op} on {target}: {source}")]
    Engine {
        op: EngineOp,
        target: String,
        #[source]
        source: EngineError,
    },

    #[error("failed to read block source {path}: {source}")]
    SourceRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to copy {from} -> {to}: {source}")]
    Copy {
        from: String,
        to: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to commit staged {from} -> {to}: {source}")]
    Commit {
        from: String,
        to: String,
        #[source]
        source: std::io::Error,
    },
}

impl JpcomError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::IdTableRead { .. }
            | Self::IdTableParse { .. }
            | Self::BlockIdParse { .. }
            | Self::VersionParse { .. }
            | Self::DirectoryRead { .. }
            | Self::MissingDirectory { .. }
            | Self::ConfigRead { .. }
            | Self::ConfigParse { .. }
            | Self::MissingOutput
            | Self::InvalidRunId { .. } => ErrorClass::Config,
            Self::Engine { .. } => ErrorClass::Engine,
            Self::SourceRead { .. } | Self::Copy { .. } | Self::Commit { .. } => {
                ErrorClass::Resource
            }
        }
    }

    /// Wrap an engine failure with the operation and what it was aimed at.
    pub fn engine(op: EngineOp, target: impl Display) -> impl FnOnce(EngineError) -> Self {
        let target = target.to_string();
        move |source| Self::Engine { op, target, source }
    }

    pub(crate) fn copy(from: &Path, to: &Path) -> impl FnOnce(std::io::Error) -> Self {
        let from = from.display().to_string();
        let to = to.display().to_string();
        move |source| Self::Copy { from, to, source }
    }
}
