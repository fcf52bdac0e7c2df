//! The capability surface the substitution pipeline is written against.

use crate::error::EngineError;
use crate::file_list::FileList;
use crate::types::{
    AppendOptions, BlockId, DateVersion, DiagramHandle, FileId, KnowledgeHandle, KnowledgeOptions,
};
use std::path::Path;

/// Narrow interface over a KNB data engine.
///
/// Container operations are addressed by path, not by an open handle; every
/// call is durable on disk when it returns `Ok`. Sessions are minted by
/// `initiate_*` and must be handed back to the matching `terminate_*`.
pub trait DataEngine {
    fn initiate_diagram(&self, files: &FileList) -> Result<DiagramHandle, EngineError>;

    fn terminate_diagram(&self, handle: DiagramHandle) -> Result<(), EngineError>;

    /// Open a knowledge session over `files` with `diagram` attached.
    /// `Ok(None)` when the files yield no usable knowledge database.
    fn initiate_knowledge(
        &self,
        files: &FileList,
        diagram: &DiagramHandle,
        options: KnowledgeOptions,
    ) -> Result<Option<KnowledgeHandle>, EngineError>;

    fn terminate_knowledge(&self, handle: KnowledgeHandle) -> Result<(), EngineError>;

    /// Remove block `id` from `container`. `Ok(false)` when it was absent.
    fn remove_block(&self, container: &Path, id: BlockId) -> Result<bool, EngineError>;

    /// Append the bytes of `source` to `container` under `id`.
    fn append_block(
        &self,
        source: &Path,
        options: AppendOptions,
        id: BlockId,
        container: &Path,
    ) -> Result<(), EngineError>;

    fn replace_file_id(&self, container: &Path, file_id: FileId) -> Result<(), EngineError>;

    fn replace_date_version(
        &self,
        container: &Path,
        version: DateVersion,
    ) -> Result<(), EngineError>;

    /// Derive train display line data inside an open knowledge session.
    fn bridge_train_disp_line(&self, knowledge: &KnowledgeHandle) -> Result<(), EngineError>;

    /// Write the derived train display line pattern block to `path`.
    fn write_train_disp_line_ptn(
        &self,
        knowledge: &KnowledgeHandle,
        path: &Path,
    ) -> Result<(), EngineError>;

    /// Delete a file the engine may hold metadata on. `Ok(false)` when absent.
    fn delete_file(&self, path: &Path) -> Result<bool, EngineError>;
}
