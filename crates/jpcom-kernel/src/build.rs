//! One complete jpcom build: substitutions, bridging, stamping.

use crate::config::BlockLayout;
use crate::error::JpcomError;
use crate::finalize::finalize;
use crate::id_table::{read_id_table, table_dir};
use crate::report::{REPORT_KIND, REPORT_SCHEMA, RunReport};
use crate::substitute::{SubstitutionOutcome, SubstitutionPlan, apply_id_table};
use chrono::Utc;
use jpcom_engine::DataEngine;
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Where substitutions land while the run is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// Mutate the output file directly. A failure leaves it partially updated.
    #[default]
    InPlace,
    /// Work on a staged copy and rename it over the output only on success.
    Staged,
}

#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub output: PathBuf,
    pub id_table: Option<PathBuf>,
    pub knb_dir: Option<PathBuf>,
    pub dia_dir: Option<PathBuf>,
    pub version: Option<String>,
    pub layout: BlockLayout,
    pub commit: CommitMode,
    /// Embedded in every temporary file name of this run.
    pub run_id: String,
}

impl BuildRequest {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            id_table: None,
            knb_dir: None,
            dia_dir: None,
            version: None,
            layout: BlockLayout::default(),
            commit: CommitMode::default(),
            run_id: new_run_id(),
        }
    }

    /// `<output>.<run-id>.copy`: scratch duplicate used while bridging.
    pub fn scratch_path(&self) -> PathBuf {
        suffixed(&self.output, &format!("{}.copy", self.run_id))
    }

    /// `<output>.<run-id>.staged`: working copy in staged mode.
    pub fn staged_path(&self) -> PathBuf {
        suffixed(&self.output, &format!("{}.staged", self.run_id))
    }

    /// `<stem>.<run-id>.dat` next to the id table (or the output without one).
    pub fn derived_path(&self) -> PathBuf {
        let dir = match &self.id_table {
            Some(table) => table_dir(table),
            None => table_dir(&self.output),
        };
        dir.join(format!(
            "{}.{}.dat",
            self.layout.derived_file_stem, self.run_id
        ))
    }
}

pub fn new_run_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Run ids are embedded in file names: ascii letters, digits, `-` and `_` only.
pub fn validate_run_id(value: &str) -> Result<(), JpcomError> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(JpcomError::InvalidRunId {
            value: value.to_string(),
        })
    }
}

fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let mut out: OsString = path.as_os_str().to_os_string();
    out.push(".");
    out.push(suffix);
    PathBuf::from(out)
}

/// Run a full build against `engine`.
pub fn build_jpcom<E: DataEngine>(
    engine: &E,
    request: &BuildRequest,
) -> Result<RunReport, JpcomError> {
    validate_run_id(&request.run_id)?;
    let started_at = Utc::now().to_rfc3339();
    match request.commit {
        CommitMode::InPlace => run_stages(engine, request, &request.output, started_at),
        CommitMode::Staged => {
            let staged = request.staged_path();
            fs::copy(&request.output, &staged)
                .map_err(JpcomError::copy(&request.output, &staged))?;
            let report = match run_stages(engine, request, &staged, started_at) {
                Ok(report) => report,
                Err(error) => {
                    let _ = fs::remove_file(&staged);
                    return Err(error);
                }
            };
            fs::rename(&staged, &request.output).map_err(|source| {
                let _ = fs::remove_file(&staged);
                JpcomError::Commit {
                    from: staged.display().to_string(),
                    to: request.output.display().to_string(),
                    source,
                }
            })?;
            Ok(report)
        }
    }
}

fn run_stages<E: DataEngine>(
    engine: &E,
    request: &BuildRequest,
    container: &Path,
    started_at: String,
) -> Result<RunReport, JpcomError> {
    let mut warnings = Vec::new();
    let entries = match &request.id_table {
        Some(table) if table.exists() => read_id_table(table)?,
        Some(table) => {
            warnings.push(format!(
                "id table not found, no blocks substituted: {}",
                table.display()
            ));
            Vec::new()
        }
        None => Vec::new(),
    };

    let plan = SubstitutionPlan {
        container,
        scratch: request.scratch_path(),
        derived_file: request.derived_path(),
        knb_dir: request.knb_dir.as_deref(),
        dia_dir: request.dia_dir.as_deref(),
        layout: &request.layout,
    };
    let SubstitutionOutcome { entries, bridge } = apply_id_table(engine, &plan, &entries)?;

    let stamp = finalize(
        engine,
        container,
        request.layout.composite_file_id(),
        request.version.as_deref(),
    )?;

    Ok(RunReport {
        schema: REPORT_SCHEMA,
        report_kind: REPORT_KIND,
        run_id: request.run_id.clone(),
        started_at,
        output: request.output.display().to_string(),
        commit_mode: request.commit,
        id_table: request
            .id_table
            .as_ref()
            .map(|table| table.display().to_string()),
        warnings,
        entries,
        bridge,
        file_id: stamp.file_id,
        date_version: stamp.date_version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temporary_names_embed_the_run_id() {
        let mut request = BuildRequest::new("out/jpcom.knb");
        request.run_id = "r1".to_string();
        request.id_table = Some(PathBuf::from("tables/idtable.txt"));

        assert_eq!(request.scratch_path(), PathBuf::from("out/jpcom.knb.r1.copy"));
        assert_eq!(request.staged_path(), PathBuf::from("out/jpcom.knb.r1.staged"));
        assert_eq!(
            request.derived_path(),
            PathBuf::from("tables/train_disp_line_ptn.r1.dat")
        );

        request.id_table = None;
        assert_eq!(
            request.derived_path(),
            PathBuf::from("out/train_disp_line_ptn.r1.dat")
        );
    }

    #[test]
    fn run_ids_are_unique() {
        assert_ne!(new_run_id(), new_run_id());
    }

    #[test]
    fn run_ids_must_be_file_name_safe() {
        validate_run_id(&new_run_id()).expect("generated ids are valid");
        validate_run_id("nightly-2024_04").expect("plain ids are valid");
        for bad in ["", "../x", "a/b", "a.b", "a b"] {
            assert!(
                matches!(validate_run_id(bad), Err(JpcomError::InvalidRunId { .. })),
                "{bad:?} should be rejected"
            );
        }
    }
}
