//! Composite file stamping.

use crate::error::{EngineOp, JpcomError};
use jpcom_engine::{DataEngine, DateVersion, FileId};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamp {
    pub file_id: FileId,
    pub date_version: Option<DateVersion>,
}

/// Parse a `yyyyMMdd` version string. Blank means "leave the date alone".
pub fn parse_version(value: &str) -> Result<Option<DateVersion>, JpcomError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<u32>()
        .map(|date| Some(DateVersion(date)))
        .map_err(|_| JpcomError::VersionParse {
            value: value.to_string(),
        })
}

/// Stamp `file_id`, then the version date when one is given.
///
/// The version is parsed before anything is written, so a malformed version
/// leaves the container exactly as the substitutions left it.
pub fn finalize<E: DataEngine>(
    engine: &E,
    container: &Path,
    file_id: FileId,
    version: Option<&str>,
) -> Result<Stamp, JpcomError> {
    let date_version = match version {
        Some(value) => parse_version(value)?,
        None => None,
    };

    engine
        .replace_file_id(container, file_id)
        .map_err(JpcomError::engine(EngineOp::ReplaceFileId, container.display()))?;
    if let Some(date) = date_version {
        engine
            .replace_date_version(container, date)
            .map_err(JpcomError::engine(
                EngineOp::ReplaceDateVersion,
                container.display(),
            ))?;
    }

    Ok(Stamp {
        file_id,
        date_version,
    })
}
