//! In-process engine over the KNB codec in [`crate::knb`].
//!
//! Sessions live in handle tables owned by the engine. The derived train
//! display line pattern is a JSON document fingerprinting the master block,
//! the pattern block and every diagram file of the attached session, in load
//! order, so any change to those inputs changes the derived block.

use crate::engine::DataEngine;
use crate::error::EngineError;
use crate::file_list::FileList;
use crate::knb::{KnbBlock, KnbContainer, write_atomic};
use crate::types::{
    AppendOptions, BlockId, DateVersion, DiagramHandle, FileId, KnowledgeHandle, KnowledgeOptions,
};
use crate::{DISPLINE_MASTER_BLOCK, DISPLINE_PATTERN_BLOCK};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const TRAIN_DISP_LINE_PTN_KIND: &str = "jpcom.train_disp_line_ptn.v1";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct DiagramFile {
    name: String,
    size: u64,
    sha256: String,
}

#[derive(Debug)]
struct DiagramDb {
    files: Vec<DiagramFile>,
}

#[derive(Debug)]
struct KnowledgeDb {
    diagram: Option<u64>,
    blocks: BTreeMap<BlockId, Vec<u8>>,
    derived: Option<Vec<u8>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrainDispLinePattern<'a> {
    kind: &'static str,
    master_block: BlockId,
    master_sha256: String,
    pattern_block: BlockId,
    pattern_sha256: String,
    diagrams: &'a [DiagramFile],
}

/// File-backed engine for KNB containers.
#[derive(Debug)]
pub struct LocalEngine {
    master_block: BlockId,
    pattern_block: BlockId,
    next_handle: Cell<u64>,
    diagrams: RefCell<BTreeMap<u64, DiagramDb>>,
    knowledge: RefCell<BTreeMap<u64, KnowledgeDb>>,
}

impl Default for LocalEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalEngine {
    pub fn new() -> Self {
        Self::with_bridge_blocks(DISPLINE_MASTER_BLOCK, DISPLINE_PATTERN_BLOCK)
    }

    /// Engine whose bridge reads master/pattern data from the given ids.
    pub fn with_bridge_blocks(master_block: BlockId, pattern_block: BlockId) -> Self {
        Self {
            master_block,
            pattern_block,
            next_handle: Cell::new(1),
            diagrams: RefCell::new(BTreeMap::new()),
            knowledge: RefCell::new(BTreeMap::new()),
        }
    }

    /// Number of sessions (diagram + knowledge) currently open.
    pub fn open_sessions(&self) -> usize {
        self.diagrams.borrow().len() + self.knowledge.borrow().len()
    }

    fn mint(&self) -> u64 {
        let raw = self.next_handle.get();
        self.next_handle.set(raw + 1);
        raw
    }

    fn mutate_container<T>(
        &self,
        container: &Path,
        mutator: impl FnOnce(&mut KnbContainer) -> Result<(T, bool), EngineError>,
    ) -> Result<T, EngineError> {
        let mut loaded = KnbContainer::load(container)?;
        let (value, changed) = mutator(&mut loaded)?;
        if changed {
            loaded.save(container)?;
        }
        Ok(value)
    }
}

impl DataEngine for LocalEngine {
    fn initiate_diagram(&self, files: &FileList) -> Result<DiagramHandle, EngineError> {
        if files.is_empty() {
            return Err(EngineError::EmptyFileList);
        }
        let mut loaded = Vec::with_capacity(files.len());
        for path in files.paths() {
            let bytes = fs::read(path).map_err(|e| EngineError::io(path, e))?;
            loaded.push(DiagramFile {
                name: path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                size: bytes.len() as u64,
                sha256: sha256_hex(&bytes),
            });
        }

        let raw = self.mint();
        self.diagrams
            .borrow_mut()
            .insert(raw, DiagramDb { files: loaded });
        Ok(DiagramHandle::from_raw(raw))
    }

    fn terminate_diagram(&self, handle: DiagramHandle) -> Result<(), EngineError> {
        self.diagrams
            .borrow_mut()
            .remove(&handle.raw())
            .map(|_| ())
            .ok_or(EngineError::UnknownDiagram(handle.raw()))
    }

    fn initiate_knowledge(
        &self,
        files: &FileList,
        diagram: &DiagramHandle,
        options: KnowledgeOptions,
    ) -> Result<Option<KnowledgeHandle>, EngineError> {
        if !self.diagrams.borrow().contains_key(&diagram.raw()) {
            return Err(EngineError::UnknownDiagram(diagram.raw()));
        }

        // Later files override earlier ones block by block.
        let mut blocks = BTreeMap::new();
        for path in files.paths() {
            let container = KnbContainer::load(path)?;
            for block in container.blocks() {
                blocks.insert(block.id, block.data.clone());
            }
        }
        // No blocks at all: nothing a session could serve.
        if blocks.is_empty() {
            return Ok(None);
        }

        let raw = self.mint();
        self.knowledge.borrow_mut().insert(
            raw,
            KnowledgeDb {
                diagram: options.attach_diagram.then(|| diagram.raw()),
                blocks,
                derived: None,
            },
        );
        Ok(Some(KnowledgeHandle::from_raw(raw)))
    }

    fn terminate_knowledge(&self, handle: KnowledgeHandle) -> Result<(), EngineError> {
        self.knowledge
            .borrow_mut()
            .remove(&handle.raw())
            .map(|_| ())
            .ok_or(EngineError::UnknownKnowledge(handle.raw()))
    }

    fn remove_block(&self, container: &Path, id: BlockId) -> Result<bool, EngineError> {
        self.mutate_container(container, |knb| {
            let removed = knb.remove(id);
            Ok((removed, removed))
        })
    }

    fn append_block(
        &self,
        source: &Path,
        options: AppendOptions,
        id: BlockId,
        container: &Path,
    ) -> Result<(), EngineError> {
        let data = fs::read(source).map_err(|e| EngineError::io(source, e))?;
        self.mutate_container(container, |knb| {
            knb.append(KnbBlock { id, options, data })
                .map_err(|_| EngineError::BlockExists {
                    block: id,
                    path: container.display().to_string(),
                })?;
            Ok(((), true))
        })
    }

    fn replace_file_id(&self, container: &Path, file_id: FileId) -> Result<(), EngineError> {
        self.mutate_container(container, |knb| {
            knb.file_id = file_id;
            Ok(((), true))
        })
    }

    fn replace_date_version(
        &self,
        container: &Path,
        version: DateVersion,
    ) -> Result<(), EngineError> {
        self.mutate_container(container, |knb| {
            knb.date_version = version;
            Ok(((), true))
        })
    }

    fn bridge_train_disp_line(&self, knowledge: &KnowledgeHandle) -> Result<(), EngineError> {
        let mut sessions = self.knowledge.borrow_mut();
        let session = sessions
            .get_mut(&knowledge.raw())
            .ok_or(EngineError::UnknownKnowledge(knowledge.raw()))?;

        let diagram_raw = session.diagram.ok_or_else(|| {
            EngineError::BridgeInput("no diagram session attached".to_string())
        })?;
        let diagrams = self.diagrams.borrow();
        let diagram = diagrams
            .get(&diagram_raw)
            .ok_or(EngineError::UnknownDiagram(diagram_raw))?;

        let master = session.blocks.get(&self.master_block).ok_or_else(|| {
            EngineError::BridgeInput(format!("master block {} missing", self.master_block))
        })?;
        let pattern = session.blocks.get(&self.pattern_block).ok_or_else(|| {
            EngineError::BridgeInput(format!("pattern block {} missing", self.pattern_block))
        })?;

        let document = TrainDispLinePattern {
            kind: TRAIN_DISP_LINE_PTN_KIND,
            master_block: self.master_block,
            master_sha256: sha256_hex(master),
            pattern_block: self.pattern_block,
            pattern_sha256: sha256_hex(pattern),
            diagrams: &diagram.files,
        };
        let bytes = serde_json::to_vec(&document)
            .map_err(|e| EngineError::BridgeInput(format!("serialize derived block: {e}")))?;
        session.derived = Some(bytes);
        Ok(())
    }

    fn write_train_disp_line_ptn(
        &self,
        knowledge: &KnowledgeHandle,
        path: &Path,
    ) -> Result<(), EngineError> {
        let sessions = self.knowledge.borrow();
        let session = sessions
            .get(&knowledge.raw())
            .ok_or(EngineError::UnknownKnowledge(knowledge.raw()))?;
        let derived = session
            .derived
            .as_deref()
            .ok_or(EngineError::NotBridged(knowledge.raw()))?;
        write_atomic(path, derived)
    }

    fn delete_file(&self, path: &Path) -> Result<bool, EngineError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(EngineError::io(path, err)),
        }
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex_lower(&Sha256::digest(bytes))
}

fn hex_lower(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
