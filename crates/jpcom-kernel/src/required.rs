//! Tracking of the two blocks whose joint presence triggers bridging.
//!
//! ```text
//! Neither ──master|pattern──▶ OneSet ──other one──▶ Triggered
//!    └────────── master == pattern ──────────────────▲
//! ```
//!
//! `Triggered` is absorbing: `observe` returns [`Trigger::Fire`] exactly once
//! per tracker.

use jpcom_engine::BlockId;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequiredBlocks {
    pub master: Option<PathBuf>,
    pub pattern: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequiredBlockState {
    #[default]
    Neither,
    OneSet(RequiredBlocks),
    Triggered { master: PathBuf, pattern: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Nothing to do for this substitution.
    Idle,
    /// Both blocks are now in place; run bridging with these sources.
    Fire { master: PathBuf, pattern: PathBuf },
}

#[derive(Debug, Clone)]
pub struct RequiredBlockTracker {
    master_id: BlockId,
    pattern_id: BlockId,
    state: RequiredBlockState,
}

impl RequiredBlockTracker {
    pub fn new(master_id: BlockId, pattern_id: BlockId) -> Self {
        Self {
            master_id,
            pattern_id,
            state: RequiredBlockState::Neither,
        }
    }

    pub fn state(&self) -> &RequiredBlockState {
        &self.state
    }

    pub fn fired(&self) -> bool {
        matches!(self.state, RequiredBlockState::Triggered { .. })
    }

    /// Record a successful substitution of `id` from `source`.
    pub fn observe(&mut self, id: BlockId, source: &Path) -> Trigger {
        if id != self.master_id && id != self.pattern_id {
            return Trigger::Idle;
        }

        let mut blocks = match &self.state {
            RequiredBlockState::Triggered { .. } => return Trigger::Idle,
            RequiredBlockState::Neither => RequiredBlocks::default(),
            RequiredBlockState::OneSet(blocks) => blocks.clone(),
        };
        if id == self.master_id {
            blocks.master = Some(source.to_path_buf());
        }
        if id == self.pattern_id {
            blocks.pattern = Some(source.to_path_buf());
        }

        match blocks {
            RequiredBlocks {
                master: Some(master),
                pattern: Some(pattern),
            } => {
                self.state = RequiredBlockState::Triggered {
                    master: master.clone(),
                    pattern: pattern.clone(),
                };
                Trigger::Fire { master, pattern }
            }
            blocks => {
                self.state = RequiredBlockState::OneSet(blocks);
                Trigger::Idle
            }
        }
    }
}
