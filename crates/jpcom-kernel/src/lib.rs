//! # jpcom-kernel
//!
//! Rebuilds a composite knowledge base ("jpcom") from an id table of block
//! replacements, regenerating the derived train display line pattern block
//! when both of its inputs have been replaced.
//!
//! ## Pipeline
//!
//! ```text
//! id table ──▶ substitute (remove + append, table order)
//!                  │ master and pattern both in?  (once)
//!                  ▼
//!              bridge: scratch copy ─▶ diagram session ─▶ knowledge session
//!                      ─▶ derive ─▶ substitute derived block
//!                  │
//!                  ▼
//!              finalize: file id, version date
//! ```
//!
//! Everything is written against [`jpcom_engine::DataEngine`]; the kernel never
//! touches container bytes itself.

pub mod bridge;
pub mod build;
pub mod config;
pub mod error;
pub mod file_set;
pub mod finalize;
pub mod id_table;
pub mod report;
pub mod required;
pub mod session;
pub mod substitute;

pub use bridge::run_bridge;
pub use build::{BuildRequest, CommitMode, build_jpcom, new_run_id, validate_run_id};
pub use config::{BlockLayout, JpcomConfig};
pub use error::{EngineOp, ErrorClass, JpcomError};
pub use file_set::collect_files;
pub use finalize::{Stamp, finalize, parse_version};
pub use id_table::{IdTableEntry, read_id_table};
pub use report::{
    BridgeRecord, BridgeStatus, EntryOutcome, EntryRecord, REPORT_KIND, REPORT_SCHEMA, RunReport,
};
pub use required::{RequiredBlockState, RequiredBlockTracker, Trigger};
pub use session::{DiagramSession, KnowledgeSession};
pub use substitute::{SubstitutionPlan, apply_id_table, substitute_block};
