//! Id table: one `blockId,filename` record per line.
//!
//! Filenames resolve against the table's own directory. Lines without
//! visible characters are skipped; fields past the second are ignored.

use crate::error::JpcomError;
use jpcom_engine::BlockId;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdTableEntry {
    /// 1-based line number in the table file.
    pub line: usize,
    pub block_id: BlockId,
    pub source_file: PathBuf,
}

/// Directory filenames in `table` resolve against.
pub fn table_dir(table: &Path) -> PathBuf {
    match table.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Read and parse an id table file.
pub fn read_id_table(path: impl AsRef<Path>) -> Result<Vec<IdTableEntry>, JpcomError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| JpcomError::IdTableRead {
        path: path.display().to_string(),
        source,
    })?;
    parse_id_table(BufReader::new(file), &table_dir(path), path)
}

/// Parse id table records from `reader`; `origin` only labels errors.
///
/// Lines are raw bytes: only the id field has to be ASCII. The filename field
/// is taken verbatim (no trimming) up to the next comma or the line end.
pub fn parse_id_table(
    reader: impl BufRead,
    base_dir: &Path,
    origin: &Path,
) -> Result<Vec<IdTableEntry>, JpcomError> {
    let mut entries = Vec::new();
    for (index, line) in reader.split(b'\n').enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|source| JpcomError::IdTableRead {
            path: origin.display().to_string(),
            source,
        })?;
        let mut line = line.strip_suffix(b"\r").unwrap_or(&line);
        if line_no == 1 {
            line = line.strip_prefix(UTF8_BOM).unwrap_or(line);
        }
        if line.trim_ascii().is_empty() {
            continue;
        }

        let mut fields = line.split(|byte| *byte == b',');
        let id_field = fields.next().unwrap_or_default().trim_ascii();
        let block_id = std::str::from_utf8(id_field)
            .ok()
            .and_then(|text| text.parse::<i32>().ok())
            .filter(|id| *id > 0)
            .ok_or_else(|| JpcomError::BlockIdParse {
                path: origin.display().to_string(),
                line: line_no,
                value: String::from_utf8_lossy(id_field).into_owned(),
            })?;
        let file_field = fields
            .next()
            .filter(|field| !field.trim_ascii().is_empty())
            .ok_or_else(|| JpcomError::IdTableParse {
                path: origin.display().to_string(),
                line: line_no,
                message: "missing source file field".to_string(),
            })?;

        entries.push(IdTableEntry {
            line: line_no,
            block_id: BlockId(block_id),
            source_file: base_dir.join(path_from_bytes(file_field)),
        });
    }
    Ok(entries)
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(bytes))
}

/// Non-unix paths are not byte strings; undecodable bytes become U+FFFD.
#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}
