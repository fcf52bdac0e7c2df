use crate::support::{FAILURE_KIND, FAILURE_SCHEMA, print_json, yes_no};
use jpcom_kernel::{BridgeStatus, CommitMode, EntryOutcome, JpcomError, RunReport};
use serde_json::json;

pub fn print_report(report: &RunReport, json_output: bool) {
    if json_output {
        match serde_json::to_value(report) {
            Ok(payload) => print_json(&payload),
            Err(e) => {
                eprintln!("error: failed to render report: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    println!("makejpcom {}", report.output);
    println!("  Run id: {}", report.run_id);
    println!(
        "  Staged: {}",
        yes_no(report.commit_mode == CommitMode::Staged)
    );
    match &report.id_table {
        Some(table) => println!("  Id table: {table}"),
        None => println!("  Id table: (none)"),
    }
    for warning in &report.warnings {
        println!("  Warning: {warning}");
    }

    println!(
        "  Entries: {} substituted, {} skipped",
        report.substituted_count(),
        report.skipped_count()
    );
    for entry in &report.entries {
        let outcome = match entry.outcome {
            EntryOutcome::Substituted => "substituted",
            EntryOutcome::SkippedMissingSource => "skipped (source missing)",
        };
        println!(
            "    - line {}: block {} <- {} [{outcome}]",
            entry.line, entry.block_id, entry.source
        );
    }

    let bridge = &report.bridge;
    let status = match bridge.status {
        BridgeStatus::NotTriggered => "not triggered",
        BridgeStatus::Fired => "fired",
        BridgeStatus::SkippedNoDiagramData => "skipped (no diagram data)",
        BridgeStatus::SkippedNoKnowledgeData => "skipped (no knowledge data)",
    };
    match bridge.trigger_line {
        Some(line) => println!("  Bridge: {status} at line {line}"),
        None => println!("  Bridge: {status}"),
    }
    if let (Some(master), Some(pattern)) = (&bridge.master_source, &bridge.pattern_source) {
        println!("  Bridge inputs: master {master}, pattern {pattern}");
    }
    if bridge.status != BridgeStatus::NotTriggered {
        println!("  Diagram files: {}", bridge.diagram_files);
        println!("  Knowledge files: {}", bridge.knowledge_files);
    }
    if let (Some(block), Some(sha256)) = (bridge.derived_block, &bridge.derived_sha256) {
        println!("  Derived block: {block} ({sha256})");
    }

    println!("  File id: {}", report.file_id);
    match report.date_version {
        Some(date) => println!("  Date version: {date}"),
        None => println!("  Date version: (unchanged)"),
    }
}

/// Report `error` and exit 1.
pub fn fail(error: &JpcomError, run_id: Option<&str>, json_output: bool) -> ! {
    if json_output {
        print_json(&json!({
            "schema": FAILURE_SCHEMA,
            "kind": FAILURE_KIND,
            "runId": run_id,
            "errorClass": error.class(),
            "message": error.to_string(),
        }));
    } else {
        eprintln!("error: {error}");
    }
    std::process::exit(1);
}
