//! Core library for auditing texture and sprite-atlas import settings.
//!
//! - Scan: walks an [`store::AssetStore`], resolves per-platform import
//!   profiles, assigns textures to atlases by packable rules, and classifies
//!   every asset with a monotonic severity plus human-readable warnings.
//! - Normalize: batch-rewrites compression quality (crunch and ASTC) on
//!   explicitly overridden platform settings, cooperatively sliced so a
//!   long pass can be paused or abandoned without corrupting the project.
//! - The data model is serde-serializable; a filesystem-backed store and
//!   report rendering live in the CLI crate.
//!
//! Quick example:
//! ```ignore
//! use atlas_audit_core::prelude::*;
//!
//! # fn main() -> atlas_audit_core::Result<()> {
//! let store = MemoryStore::new();
//! let mut engine = AuditEngine::new(store, AuditConfig::default());
//! let report = engine.scan()?;
//! println!("{}", report.summary().description());
//! # Ok(()) }
//! ```

pub mod batch;
pub mod classify;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod format;
pub mod matcher;
pub mod model;
pub mod platform;
pub mod profile;
pub mod report;
pub mod scan;
pub mod sched;
pub mod store;

pub use config::*;
pub use diagnostics::*;
pub use engine::*;
pub use error::*;
pub use format::*;
pub use model::*;
pub use platform::*;
pub use report::*;

/// Convenience prelude for common types and functions.
/// Importing `atlas_audit_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::batch::{BatchOutcome, NormalizeParams, NormalizeTask};
    pub use crate::config::{AuditConfig, AuditConfigBuilder};
    pub use crate::diagnostics::{
        Diagnostics, SEVERITY_DUPLICATE, SEVERITY_INFO, SEVERITY_WARNING,
    };
    pub use crate::engine::AuditEngine;
    pub use crate::error::{AuditError, Result};
    pub use crate::format::TextureFormat;
    pub use crate::model::{AtlasAsset, Geometry, PackableRule, RuleKind, TextureAsset};
    pub use crate::platform::Platform;
    pub use crate::profile::ImportProfile;
    pub use crate::report::{AuditReport, ScanSummary, SortKey};
    pub use crate::scan::scan_project;
    pub use crate::sched::{OwnerHandle, OwnerToken, TaskState};
    pub use crate::store::{AssetStore, MemoryStore, PlatformSettings};
}
