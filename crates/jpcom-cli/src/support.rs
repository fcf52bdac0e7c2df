use crate::cli::Cli;
use jpcom_kernel::{BuildRequest, CommitMode, JpcomConfig, JpcomError};
use serde_json::Value;

pub const FAILURE_SCHEMA: u64 = 1;
pub const FAILURE_KIND: &str = "jpcom.build_failure.v1";

/// Merge `--config` (if any) with flags; flags win.
pub fn build_request(cli: &Cli) -> Result<BuildRequest, JpcomError> {
    let config = match &cli.config {
        Some(path) => JpcomConfig::load(path)?,
        None => JpcomConfig::default(),
    };

    let output = cli
        .output
        .clone()
        .or(config.output)
        .ok_or(JpcomError::MissingOutput)?;
    let mut request = BuildRequest::new(output);
    request.id_table = cli.id_table.clone().or(config.id_table);
    request.knb_dir = cli.knb_dir.clone().or(config.knb_dir);
    request.dia_dir = cli.dia_dir.clone().or(config.dia_dir);
    request.version = cli.data_version.clone().or(config.version);
    request.layout = config.blocks;
    if cli.staged || config.staged.unwrap_or(false) {
        request.commit = CommitMode::Staged;
    }
    if let Some(run_id) = &cli.run_id {
        request.run_id = run_id.clone();
    }
    Ok(request)
}

pub fn print_json(payload: &Value) {
    match serde_json::to_string_pretty(payload) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("error: failed to render json: {e}");
            std::process::exit(1);
        }
    }
}

pub fn yes_no(ok: bool) -> &'static str {
    if ok { "yes" } else { "no" }
}
