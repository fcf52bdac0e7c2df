//! Build configuration: block layout constants and the optional TOML file.
//!
//! ```toml
//! output = "out/jpcom.knb"
//! id_table = "blocks/idtable.txt"
//! knb_dir = "knb"
//! dia_dir = "data"
//! version = "20240401"
//! staged = true
//!
//! [blocks]
//! master = 100
//! pattern = 101
//! train_disp_line = 105
//! ```
//!
//! Relative paths resolve against the config file's directory.

use crate::error::JpcomError;
use jpcom_engine::{
    BlockId, COMPOSITE_FILE_ID, DISPLINE_MASTER_BLOCK, DISPLINE_PATTERN_BLOCK, FileId,
    TRAIN_DISP_LINE_PTN_BLOCK, TRAIN_DISP_LINE_PTN_STEM,
};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Fixed block ids and identifiers a build works with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlockLayout {
    pub master: BlockId,
    pub pattern: BlockId,
    pub train_disp_line: BlockId,
    pub derived_file_stem: String,
    pub file_id_kind: u32,
    pub file_id: u32,
}

impl Default for BlockLayout {
    fn default() -> Self {
        Self {
            master: DISPLINE_MASTER_BLOCK,
            pattern: DISPLINE_PATTERN_BLOCK,
            train_disp_line: TRAIN_DISP_LINE_PTN_BLOCK,
            derived_file_stem: TRAIN_DISP_LINE_PTN_STEM.to_string(),
            file_id_kind: COMPOSITE_FILE_ID.kind,
            file_id: COMPOSITE_FILE_ID.id,
        }
    }
}

impl BlockLayout {
    pub fn composite_file_id(&self) -> FileId {
        FileId::new(self.file_id_kind, self.file_id)
    }
}

/// Contents of a `--config` TOML file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JpcomConfig {
    pub knb_dir: Option<PathBuf>,
    pub dia_dir: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub version: Option<String>,
    pub id_table: Option<PathBuf>,
    pub staged: Option<bool>,
    pub blocks: BlockLayout,
}

impl JpcomConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, JpcomError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| JpcomError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::parse(&text, path)?;
        let base = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        config.resolve_relative_to(&base);
        Ok(config)
    }

    pub fn parse(text: &str, origin: &Path) -> Result<Self, JpcomError> {
        toml::from_str(text).map_err(|source| JpcomError::ConfigParse {
            path: origin.display().to_string(),
            source,
        })
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        for path in [
            &mut self.knb_dir,
            &mut self.dia_dir,
            &mut self.output,
            &mut self.id_table,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}
