//! Regeneration of the train display line pattern block.
//!
//! Runs against a scratch duplicate of the working container so the derived
//! block is computed from the freshly substituted master and pattern blocks,
//! never from a stale derived block. Only the final substitution touches the
//! working container.

use crate::error::{EngineOp, JpcomError};
use crate::report::{BridgeRecord, BridgeStatus};
use crate::session::{DiagramSession, KnowledgeSession, knowledge_file_list};
use crate::substitute::{SubstitutionPlan, substitute_block};
use jpcom_engine::DataEngine;
use std::fs;
use std::path::Path;

/// Bridge once. The scratch copy and the derived file are gone on return,
/// whether or not bridging succeeded.
pub fn run_bridge<E: DataEngine>(
    engine: &E,
    plan: &SubstitutionPlan<'_>,
) -> Result<BridgeRecord, JpcomError> {
    fs::copy(plan.container, &plan.scratch)
        .map_err(JpcomError::copy(plan.container, &plan.scratch))?;

    let result = bridge_from_scratch(engine, plan);
    let cleanup = delete_file(engine, &plan.scratch);
    if result.is_err() {
        let _ = engine.delete_file(&plan.derived_file);
    }
    let record = result?;
    cleanup?;
    Ok(record)
}

fn bridge_from_scratch<E: DataEngine>(
    engine: &E,
    plan: &SubstitutionPlan<'_>,
) -> Result<BridgeRecord, JpcomError> {
    let train_block = plan.layout.train_disp_line;
    engine
        .remove_block(&plan.scratch, train_block)
        .map_err(JpcomError::engine(
            EngineOp::RemoveBlock,
            format!("block {train_block} in {}", plan.scratch.display()),
        ))?;

    let dia_dir = plan
        .dia_dir
        .ok_or(JpcomError::MissingDirectory { role: "diagram-data" })?;
    let Some(diagram) = DiagramSession::open(engine, dia_dir)? else {
        return Ok(BridgeRecord {
            status: BridgeStatus::SkippedNoDiagramData,
            ..BridgeRecord::default()
        });
    };

    let record = bridge_with_diagram(engine, plan, &diagram)?;
    diagram.close()?;
    Ok(record)
}

/// Knowledge half of bridging. The knowledge session is closed (or dropped)
/// before this returns, so the caller can always close `diagram` next.
fn bridge_with_diagram<E: DataEngine>(
    engine: &E,
    plan: &SubstitutionPlan<'_>,
    diagram: &DiagramSession<'_, E>,
) -> Result<BridgeRecord, JpcomError> {
    let knb_dir = plan
        .knb_dir
        .ok_or(JpcomError::MissingDirectory { role: "knb-data" })?;
    let knowledge_files = knowledge_file_list(knb_dir, Some(&plan.scratch))?;
    let Some(knowledge) = KnowledgeSession::open(diagram, &knowledge_files)? else {
        return Ok(BridgeRecord {
            status: BridgeStatus::SkippedNoKnowledgeData,
            diagram_files: diagram.file_count(),
            knowledge_files: knowledge_files.len(),
            ..BridgeRecord::default()
        });
    };

    let train_block = plan.layout.train_disp_line;
    knowledge.bridge()?;
    delete_file(engine, &plan.derived_file)?;
    knowledge.write_derived(&plan.derived_file)?;
    let digest = substitute_block(engine, plan.container, train_block, &plan.derived_file)?;
    delete_file(engine, &plan.derived_file)?;

    let record = BridgeRecord {
        status: BridgeStatus::Fired,
        diagram_files: diagram.file_count(),
        knowledge_files: knowledge.file_count(),
        derived_block: Some(train_block),
        derived_sha256: Some(digest.sha256),
        derived_size: Some(digest.size),
        ..BridgeRecord::default()
    };
    knowledge.close()?;
    Ok(record)
}

fn delete_file<E: DataEngine>(engine: &E, path: &Path) -> Result<bool, JpcomError> {
    engine
        .delete_file(path)
        .map_err(JpcomError::engine(EngineOp::DeleteFile, path.display()))
}
