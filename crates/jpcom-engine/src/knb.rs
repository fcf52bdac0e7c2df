//! KNB container codec used by the local engine.
//!
//! Layout (little-endian):
//!
//! ```text
//! magic "KNB1" | file kind u32 | file id u32 | date version u32 | block count u32
//! block*: id i32 | compression u32 | attributes u32 | len u64 | bytes[len]
//! ```
//!
//! Block order is append order. Saves go through a temp file and a rename so
//! a failed write never leaves a truncated container behind.

use crate::error::EngineError;
use crate::types::{AppendOptions, BlockId, DateVersion, FileId};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const KNB_MAGIC: [u8; 4] = *b"KNB1";

const HEADER_LEN: usize = 20;
const BLOCK_HEADER_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnbBlock {
    pub id: BlockId,
    pub options: AppendOptions,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnbContainer {
    pub file_id: FileId,
    pub date_version: DateVersion,
    blocks: Vec<KnbBlock>,
}

impl KnbContainer {
    pub fn new(file_id: FileId, date_version: DateVersion) -> Self {
        Self {
            file_id,
            date_version,
            blocks: Vec::new(),
        }
    }

    pub fn blocks(&self) -> &[KnbBlock] {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> Option<&KnbBlock> {
        self.blocks.iter().find(|block| block.id == id)
    }

    pub fn block_ids(&self) -> Vec<BlockId> {
        self.blocks.iter().map(|block| block.id).collect()
    }

    /// Drop every block carrying `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: BlockId) -> bool {
        let before = self.blocks.len();
        self.blocks.retain(|block| block.id != id);
        self.blocks.len() != before
    }

    /// Append a block. Fails with the rejected block when `id` is taken.
    pub fn append(&mut self, block: KnbBlock) -> Result<(), KnbBlock> {
        if self.block(block.id).is_some() {
            return Err(block);
        }
        self.blocks.push(block);
        Ok(())
    }

    pub fn encode(&self) -> Vec<u8> {
        let body: usize = self
            .blocks
            .iter()
            .map(|block| BLOCK_HEADER_LEN + block.data.len())
            .sum();
        let mut out = Vec::with_capacity(HEADER_LEN + body);
        out.extend_from_slice(&KNB_MAGIC);
        out.extend_from_slice(&self.file_id.kind.to_le_bytes());
        out.extend_from_slice(&self.file_id.id.to_le_bytes());
        out.extend_from_slice(&self.date_version.0.to_le_bytes());
        out.extend_from_slice(&(self.blocks.len() as u32).to_le_bytes());
        for block in &self.blocks {
            out.extend_from_slice(&block.id.0.to_le_bytes());
            out.extend_from_slice(&block.options.compression.to_le_bytes());
            out.extend_from_slice(&block.options.attributes.to_le_bytes());
            out.extend_from_slice(&(block.data.len() as u64).to_le_bytes());
            out.extend_from_slice(&block.data);
        }
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, String> {
        let mut cursor = Cursor { bytes, pos: 0 };
        let magic = cursor.take(4)?;
        if magic != KNB_MAGIC {
            return Err("bad magic".to_string());
        }
        let file_id = FileId::new(cursor.u32()?, cursor.u32()?);
        let date_version = DateVersion(cursor.u32()?);
        let count = cursor.u32()?;

        let mut blocks = Vec::new();
        for index in 0..count {
            let id = BlockId(cursor.i32()?);
            let options = AppendOptions {
                compression: cursor.u32()?,
                attributes: cursor.u32()?,
            };
            let len = usize::try_from(cursor.u64()?)
                .map_err(|_| format!("block #{index} length overflows"))?;
            let data = cursor
                .take(len)
                .map_err(|e| format!("block #{index} (id {id}): {e}"))?
                .to_vec();
            blocks.push(KnbBlock { id, options, data });
        }
        if cursor.pos != bytes.len() {
            return Err(format!(
                "{} trailing byte(s) after last block",
                bytes.len() - cursor.pos
            ));
        }

        Ok(Self {
            file_id,
            date_version,
            blocks,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| EngineError::io(path, e))?;
        Self::decode(&bytes).map_err(|message| EngineError::corrupt(path, message))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        write_atomic(path.as_ref(), &self.encode())
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], String> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| format!("truncated at offset {}", self.pos))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], String> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u32(&mut self) -> Result<u32, String> {
        self.array().map(u32::from_le_bytes)
    }

    fn i32(&mut self) -> Result<i32, String> {
        self.array().map(i32::from_le_bytes)
    }

    fn u64(&mut self) -> Result<u64, String> {
        self.array().map(u64::from_le_bytes)
    }
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), EngineError> {
    let tmp_path = tmp_write_path(path);
    let write_result = (|| -> std::io::Result<()> {
        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()
    })();

    if let Err(error) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(EngineError::io(&tmp_path, error));
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        EngineError::io(path, e)
    })
}

fn tmp_write_path(path: &Path) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut tmp: OsString = path.as_os_str().to_os_string();
    tmp.push(format!(".tmp.{}.{}", std::process::id(), unique));
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(prefix: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "jpcom-knb-{prefix}-{}-{unique}.knb",
            std::process::id()
        ))
    }

    fn block(id: i32, data: &[u8]) -> KnbBlock {
        KnbBlock {
            id: BlockId(id),
            options: AppendOptions::default(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn save_then_load_preserves_header_and_block_order() {
        let path = temp_path("roundtrip");
        let mut container = KnbContainer::new(FileId::new(1, 100), DateVersion(20240401));
        container.append(block(101, b"pattern")).expect("append");
        container.append(block(100, b"")).expect("append");
        container.save(&path).expect("save should succeed");

        let loaded = KnbContainer::load(&path).expect("load should succeed");
        assert_eq!(loaded, container);
        assert_eq!(loaded.block_ids(), vec![BlockId(101), BlockId(100)]);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn append_rejects_duplicate_id() {
        let mut container = KnbContainer::new(FileId::new(0, 0), DateVersion(0));
        container.append(block(7, b"a")).expect("first append");
        let rejected = container.append(block(7, b"b")).expect_err("duplicate id");
        assert_eq!(rejected.data, b"b");
        assert_eq!(container.block(BlockId(7)).map(|b| b.data.as_slice()), Some(&b"a"[..]));
    }

    #[test]
    fn remove_reports_absence() {
        let mut container = KnbContainer::new(FileId::new(0, 0), DateVersion(0));
        container.append(block(3, b"x")).expect("append");
        assert!(container.remove(BlockId(3)));
        assert!(!container.remove(BlockId(3)));
    }

    #[test]
    fn decode_rejects_bad_magic_truncation_and_trailing_bytes() {
        assert_eq!(
            KnbContainer::decode(b"NOPE\0\0\0\0").expect_err("bad magic"),
            "bad magic"
        );

        let mut container = KnbContainer::new(FileId::new(1, 100), DateVersion(1));
        container.append(block(1, b"abcdef")).expect("append");
        let bytes = container.encode();

        let truncated = KnbContainer::decode(&bytes[..bytes.len() - 2]).expect_err("truncated");
        assert!(truncated.contains("truncated"), "{truncated}");

        let mut padded = bytes.clone();
        padded.push(0);
        let trailing = KnbContainer::decode(&padded).expect_err("trailing");
        assert!(trailing.contains("trailing"), "{trailing}");
    }
}
