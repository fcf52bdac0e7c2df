//! Run report emitted by a build.

use jpcom_engine::{BlockId, DateVersion, FileId};
use serde::Serialize;

pub const REPORT_SCHEMA: u64 = 1;
pub const REPORT_KIND: &str = "jpcom.build_report.v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryOutcome {
    Substituted,
    SkippedMissingSource,
}

/// What happened to one id table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRecord {
    pub line: usize,
    pub block_id: BlockId,
    pub source: String,
    pub outcome: EntryOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeStatus {
    #[default]
    NotTriggered,
    Fired,
    SkippedNoDiagramData,
    SkippedNoKnowledgeData,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeRecord {
    pub status: BridgeStatus,
    /// Id table line whose substitution completed the required pair.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_line: Option<usize>,
    /// Sources of the master and pattern blocks that triggered bridging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_source: Option<String>,
    pub diagram_files: usize,
    pub knowledge_files: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_block: Option<BlockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub schema: u64,
    pub report_kind: &'static str,
    pub run_id: String,
    pub started_at: String,
    pub output: String,
    pub commit_mode: crate::build::CommitMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_table: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub entries: Vec<EntryRecord>,
    pub bridge: BridgeRecord,
    pub file_id: FileId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_version: Option<DateVersion>,
}

impl RunReport {
    pub fn substituted_count(&self) -> usize {
        self.count(EntryOutcome::Substituted)
    }

    pub fn skipped_count(&self) -> usize {
        self.count(EntryOutcome::SkippedMissingSource)
    }

    fn count(&self, outcome: EntryOutcome) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.outcome == outcome)
            .count()
    }
}
