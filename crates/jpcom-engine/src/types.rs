//! Value types exchanged with a data engine.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Identifier of one data block inside a KNB container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub i32);

impl BlockId {
    pub fn get(self) -> i32 {
        self.0
    }
}

impl Display for BlockId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// File identifier pair stamped into a container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileId {
    /// File type tag.
    pub kind: u32,
    pub id: u32,
}

impl FileId {
    pub const fn new(kind: u32, id: u32) -> Self {
        Self { kind, id }
    }
}

impl Display for FileId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// Numeric `yyyyMMdd` version date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateVersion(pub u32);

impl Display for DateVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Flags attached to a block when it is appended to a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendOptions {
    pub compression: u32,
    pub attributes: u32,
}

/// Behavioural flags for opening a knowledge session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeOptions {
    /// Merge the attached diagram session into the knowledge view.
    pub attach_diagram: bool,
}

impl Default for KnowledgeOptions {
    fn default() -> Self {
        Self {
            attach_diagram: true,
        }
    }
}

/// Opaque handle to an open diagram database session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagramHandle(u64);

/// Opaque handle to an open knowledge database session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnowledgeHandle(u64);

impl DiagramHandle {
    /// Engines mint handles; callers only pass them back.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl KnowledgeHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}
