//! Id-table driven block substitution.
//!
//! Entries are applied strictly in table order. Each substitution is a
//! remove-then-append against the working container and is on disk before the
//! next entry is looked at, because the bridging trigger depends on what has
//! already landed.

use crate::bridge::run_bridge;
use crate::config::BlockLayout;
use crate::error::{EngineOp, JpcomError};
use crate::id_table::IdTableEntry;
use crate::report::{BridgeRecord, EntryOutcome, EntryRecord};
use crate::required::{RequiredBlockTracker, Trigger};
use jpcom_engine::{AppendOptions, BlockId, DataEngine, sha256_hex};
use std::fs;
use std::path::{Path, PathBuf};

/// Paths and block layout one substitution pass works with.
#[derive(Debug, Clone)]
pub struct SubstitutionPlan<'a> {
    /// Container every substitution is applied to.
    pub container: &'a Path,
    /// Scratch duplicate used while bridging.
    pub scratch: PathBuf,
    /// Where the derived train display line pattern block is materialized.
    pub derived_file: PathBuf,
    pub knb_dir: Option<&'a Path>,
    pub dia_dir: Option<&'a Path>,
    pub layout: &'a BlockLayout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDigest {
    pub sha256: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubstitutionOutcome {
    pub entries: Vec<EntryRecord>,
    pub bridge: BridgeRecord,
}

/// Replace block `id` in `container` with the bytes of `source`.
pub fn substitute_block<E: DataEngine>(
    engine: &E,
    container: &Path,
    id: BlockId,
    source: &Path,
) -> Result<SourceDigest, JpcomError> {
    let bytes = fs::read(source).map_err(|source_err| JpcomError::SourceRead {
        path: source.display().to_string(),
        source: source_err,
    })?;
    let target = format!("block {id} in {}", container.display());

    engine
        .remove_block(container, id)
        .map_err(JpcomError::engine(EngineOp::RemoveBlock, &target))?;
    engine
        .append_block(source, AppendOptions::default(), id, container)
        .map_err(JpcomError::engine(EngineOp::AppendBlock, &target))?;

    Ok(SourceDigest {
        sha256: sha256_hex(&bytes),
        size: bytes.len() as u64,
    })
}

/// Apply every entry in order, bridging once when master and pattern are both in.
pub fn apply_id_table<E: DataEngine>(
    engine: &E,
    plan: &SubstitutionPlan<'_>,
    entries: &[IdTableEntry],
) -> Result<SubstitutionOutcome, JpcomError> {
    let mut tracker = RequiredBlockTracker::new(plan.layout.master, plan.layout.pattern);
    let mut outcome = SubstitutionOutcome::default();

    for entry in entries {
        let source = entry.source_file.display().to_string();
        if !entry.source_file.exists() {
            outcome.entries.push(EntryRecord {
                line: entry.line,
                block_id: entry.block_id,
                source,
                outcome: EntryOutcome::SkippedMissingSource,
                sha256: None,
                size: None,
            });
            continue;
        }

        let digest = substitute_block(engine, plan.container, entry.block_id, &entry.source_file)?;
        outcome.entries.push(EntryRecord {
            line: entry.line,
            block_id: entry.block_id,
            source,
            outcome: EntryOutcome::Substituted,
            sha256: Some(digest.sha256),
            size: Some(digest.size),
        });

        if let Trigger::Fire { master, pattern } =
            tracker.observe(entry.block_id, &entry.source_file)
        {
            let mut record = run_bridge(engine, plan)?;
            record.trigger_line = Some(entry.line);
            record.master_source = Some(master.display().to_string());
            record.pattern_source = Some(pattern.display().to_string());
            outcome.bridge = record;
        }
    }

    Ok(outcome)
}
