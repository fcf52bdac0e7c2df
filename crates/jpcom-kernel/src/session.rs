//! Scoped diagram and knowledge sessions.
//!
//! A [`KnowledgeSession`] borrows the [`DiagramSession`] it is attached to, so
//! the knowledge side is always closed first. Sessions left open on an early
//! return are terminated on drop, with errors ignored.

use crate::error::{EngineOp, JpcomError};
use crate::file_set::collect_files;
use jpcom_engine::{
    DIAGRAM_EXTENSION, DataEngine, DiagramHandle, FileList, IoLevel, KNOWLEDGE_EXTENSION,
    KnowledgeHandle, KnowledgeOptions,
};
use std::path::Path;

pub struct DiagramSession<'e, E: DataEngine> {
    engine: &'e E,
    handle: DiagramHandle,
    file_count: usize,
    open: bool,
}

impl<'e, E: DataEngine> DiagramSession<'e, E> {
    /// Open over the `.dat` files in `dir`. `Ok(None)` when there are none.
    pub fn open(engine: &'e E, dir: &Path) -> Result<Option<Self>, JpcomError> {
        let files = collect_files(dir, DIAGRAM_EXTENSION)?;
        if files.is_empty() {
            return Ok(None);
        }
        let handle = engine
            .initiate_diagram(&FileList::from_paths(&files, IoLevel::Mapped))
            .map_err(JpcomError::engine(EngineOp::InitiateDiagram, dir.display()))?;
        Ok(Some(Self {
            engine,
            handle,
            file_count: files.len(),
            open: true,
        }))
    }

    pub fn handle(&self) -> &DiagramHandle {
        &self.handle
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }

    pub fn close(mut self) -> Result<(), JpcomError> {
        self.open = false;
        self.engine
            .terminate_diagram(self.handle)
            .map_err(JpcomError::engine(
                EngineOp::TerminateDiagram,
                format!("diagram session #{}", self.handle.raw()),
            ))
    }
}

impl<E: DataEngine> Drop for DiagramSession<'_, E> {
    fn drop(&mut self) {
        if self.open {
            let _ = self.engine.terminate_diagram(self.handle);
        }
    }
}

/// The `.knb` files in `dir` followed by `extra`.
pub fn knowledge_file_list(dir: &Path, extra: Option<&Path>) -> Result<FileList, JpcomError> {
    let files = collect_files(dir, KNOWLEDGE_EXTENSION)?;
    let mut list = FileList::from_paths(&files, IoLevel::Mapped);
    if let Some(extra) = extra {
        list.push(extra, IoLevel::Mapped);
    }
    Ok(list)
}

pub struct KnowledgeSession<'d, 'e, E: DataEngine> {
    diagram: &'d DiagramSession<'e, E>,
    handle: KnowledgeHandle,
    file_count: usize,
    open: bool,
}

impl<'d, 'e, E: DataEngine> KnowledgeSession<'d, 'e, E> {
    /// Open over `files` (see [`knowledge_file_list`]), attached to `diagram`.
    /// `Ok(None)` when the engine reports no usable session.
    pub fn open(
        diagram: &'d DiagramSession<'e, E>,
        files: &FileList,
    ) -> Result<Option<Self>, JpcomError> {
        let handle = diagram
            .engine
            .initiate_knowledge(files, diagram.handle(), KnowledgeOptions::default())
            .map_err(JpcomError::engine(
                EngineOp::InitiateKnowledge,
                format!("{} knowledge file(s)", files.len()),
            ))?;
        Ok(handle.map(|handle| Self {
            diagram,
            handle,
            file_count: files.len(),
            open: true,
        }))
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }

    /// Derive train display line data from the merged knowledge and diagram view.
    pub fn bridge(&self) -> Result<(), JpcomError> {
        self.diagram
            .engine
            .bridge_train_disp_line(&self.handle)
            .map_err(JpcomError::engine(EngineOp::Bridge, self.label()))
    }

    /// Materialize the derived train display line pattern block to `path`.
    pub fn write_derived(&self, path: &Path) -> Result<(), JpcomError> {
        self.diagram
            .engine
            .write_train_disp_line_ptn(&self.handle, path)
            .map_err(JpcomError::engine(
                EngineOp::WriteTrainDispLinePtn,
                path.display(),
            ))
    }

    pub fn close(mut self) -> Result<(), JpcomError> {
        self.open = false;
        self.diagram
            .engine
            .terminate_knowledge(self.handle)
            .map_err(JpcomError::engine(EngineOp::TerminateKnowledge, self.label()))
    }

    fn label(&self) -> String {
        format!("knowledge session #{}", self.handle.raw())
    }
}

impl<E: DataEngine> Drop for KnowledgeSession<'_, '_, E> {
    fn drop(&mut self) {
        if self.open {
            let _ = self.diagram.engine.terminate_knowledge(self.handle);
        }
    }
}
