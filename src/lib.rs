//! dep-patcher: guarded, idempotent text patches for a dependency tree
//!
//! Applies a fixed set of exact-text corrections to files inside installed
//! dependencies (for example `node_modules/<pkg>/dist/...`) to work around
//! bugs the published release has not fixed yet. Safe to run after every
//! install.
//!
//! # Architecture
//!
//! - [`PatchSpec`]: one target file plus an ordered list of [`Edit`]s
//! - [`PathResolver`]: project root + target -> absolute path
//! - [`Edit::classify`]: `Pristine`, `AlreadyApplied` or `Drifted`, by exact
//!   substring containment
//! - [`apply_edits`]: plans every edit in memory, then writes once
//! - [`run_patches`]: runs every PatchSpec and aggregates a [`RunReport`]
//!
//! # Safety
//!
//! - A drifted edit aborts its PatchSpec before anything is written
//! - Atomic file writes (tempfile + fsync + rename)
//! - Targets must resolve inside the project root
//! - Idempotent by content inspection; no state is kept between runs
//!
//! # Example
//!
//! ```no_run
//! use dep_patcher::{run_patches, Edit, PatchSpec, PathResolver, RunMode, TargetPath};
//!
//! let spec = PatchSpec::new(
//!     "fix-foo",
//!     TargetPath::in_dependency("some-pkg", "dist/index.js"),
//!     vec![Edit::new("foo()", "bar()")],
//! );
//!
//! let resolver = PathResolver::new("/path/to/project").unwrap();
//! let report = run_patches(&resolver, &[spec], RunMode::Apply);
//! assert!(report.success());
//! ```

pub mod apply;
pub mod config;
pub mod drift;
pub mod edit;
pub mod errors;
pub mod patch;
pub mod report;
pub mod resolve;
pub mod safety;

// Re-exports
pub use apply::{apply_edits, FileChange, Mode};
pub use config::{builtin_specs, load_from_path, load_from_str, load_specs, ConfigError};
pub use edit::{plan, sequence_issues, Drift, Edit, EditIssue, EditPlan, EditState};
pub use errors::{DriftHint, PatchError};
pub use patch::{InvalidSpec, PatchSpec, TargetPath};
pub use report::{run_patches, Outcome, PatchReport, RunMode, RunReport};
pub use resolve::PathResolver;
pub use safety::{RootGuard, SafetyError};
