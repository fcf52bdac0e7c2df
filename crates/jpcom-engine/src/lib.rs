//! # jpcom-engine
//!
//! Capability surface of the KNB data engine.
//!
//! This crate provides:
//! - [`DataEngine`], the narrow interface the jpcom pipeline is written against
//! - engine value types (block ids, file ids, version dates, session handles)
//! - [`FileList`], ordered session inputs tagged with an I/O level
//! - [`knb`], a KNB container codec, and [`LocalEngine`] built on it
//!
//! It intentionally knows nothing about id tables or bridging order. Those
//! concerns live in `jpcom-kernel`.

pub mod engine;
pub mod error;
pub mod file_list;
pub mod knb;
pub mod local;
pub mod types;

pub use engine::DataEngine;
pub use error::EngineError;
pub use file_list::{FileList, FileListEntry, IoLevel};
pub use knb::{KNB_MAGIC, KnbBlock, KnbContainer};
pub use local::{LocalEngine, TRAIN_DISP_LINE_PTN_KIND, sha256_hex};
pub use types::{
    AppendOptions, BlockId, DateVersion, DiagramHandle, FileId, KnowledgeHandle, KnowledgeOptions,
};

/// Display-line master table block.
pub const DISPLINE_MASTER_BLOCK: BlockId = BlockId(100);
/// Display-line pattern table block.
pub const DISPLINE_PATTERN_BLOCK: BlockId = BlockId(101);
/// Derived train display line pattern block.
pub const TRAIN_DISP_LINE_PTN_BLOCK: BlockId = BlockId(105);
/// File name stem of the materialized train display line pattern block.
pub const TRAIN_DISP_LINE_PTN_STEM: &str = "train_disp_line_ptn";
/// File identifier of the composite (JPCOM) knowledge base: KNB type 1, id 100.
pub const COMPOSITE_FILE_ID: FileId = FileId::new(1, 100);

/// Extension of diagram-data files.
pub const DIAGRAM_EXTENSION: &str = "dat";
/// Extension of knowledge-data containers.
pub const KNOWLEDGE_EXTENSION: &str = "knb";
