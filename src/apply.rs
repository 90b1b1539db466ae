//! File-level application: read, plan, and atomically write back.
//!
//! The pure work happens in [`crate::edit::plan`]; this module owns every side
//! effect. A drifted edit aborts before any write, so a PatchSpec is either
//! written in full or not at all.

use crate::drift::closest_line;
use crate::edit::{plan, Edit, EditPlan};
use crate::errors::PatchError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::xxh3_64;

/// Whether planned changes reach the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Write changed files
    #[default]
    Apply,
    /// Plan only; never write
    DryRun,
}

/// What happened (or would happen) to one file.
#[derive(Debug, Clone)]
#[must_use = "FileChange reports whether the file was modified"]
pub struct FileChange {
    pub path: PathBuf,
    /// Content as read before planning
    pub before: String,
    pub plan: EditPlan,
    /// True only if new content was persisted
    pub written: bool,
}

impl FileChange {
    pub fn after(&self) -> &str {
        &self.plan.content
    }

    /// True if at least one edit was (or would be) applied.
    pub fn changed(&self) -> bool {
        !self.plan.is_noop()
    }
}

/// Apply `edits` to the file at `path`.
///
/// The file is read once and written at most once. On drift the file is left
/// byte-identical.
pub fn apply_edits(path: &Path, edits: &[Edit], mode: Mode) -> Result<FileChange, PatchError> {
    let before = fs::read_to_string(path).map_err(|source| PatchError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let plan = plan(&before, edits).map_err(|drift| {
        tracing::warn!(path = %path.display(), index = drift.index, "anchor drifted");
        PatchError::Drifted {
            path: path.to_path_buf(),
            index: drift.index,
            hint: closest_line(&before, &drift.anchor),
            anchor: drift.anchor,
        }
    })?;

    let written = if mode == Mode::Apply && !plan.is_noop() {
        atomic_write(path, xxh3_64(before.as_bytes()), plan.content.as_bytes())?;
        tracing::info!(
            path = %path.display(),
            applied = plan.applied(),
            already_applied = plan.already_applied(),
            "patched file"
        );
        true
    } else {
        false
    };

    Ok(FileChange {
        path: path.to_path_buf(),
        before,
        plan,
        written,
    })
}

/// Atomic file write: tempfile in the same directory + fsync + rename.
///
/// The target is re-hashed right before the rename; if it no longer matches
/// `expected_hash` the write is abandoned. The temp file is removed on every
/// error path when it is dropped.
fn atomic_write(path: &Path, expected_hash: u64, content: &[u8]) -> Result<(), PatchError> {
    let write_err = |source: std::io::Error| PatchError::WriteFailure {
        path: path.to_path_buf(),
        source,
    };

    let parent = path.parent().ok_or_else(|| {
        write_err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path has no parent directory",
        ))
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    temp.write_all(content).map_err(write_err)?;

    // tempfile creates 0600 files; keep the target's mode
    let permissions = fs::metadata(path).map_err(write_err)?.permissions();
    temp.as_file()
        .set_permissions(permissions)
        .map_err(write_err)?;
    temp.as_file().sync_all().map_err(write_err)?;

    let current = fs::read(path).map_err(|source| PatchError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if xxh3_64(&current) != expected_hash {
        return Err(PatchError::Conflict {
            path: path.to_path_buf(),
        });
    }

    temp.persist(path).map_err(|e| write_err(e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_target(content: &str) -> (tempfile::TempDir, PathBuf) {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("target.js");
        fs::write(&file_path, content).unwrap();
        (temp_dir, file_path)
    }

    fn leftover_files(dir: &Path) -> usize {
        fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_apply_writes_new_content() {
        let (dir, path) = write_target("const x = foo();");
        let change = apply_edits(&path, &[Edit::new("foo()", "bar()")], Mode::Apply).unwrap();

        assert!(change.written);
        assert!(change.changed());
        assert_eq!(fs::read_to_string(&path).unwrap(), "const x = bar();");
        assert_eq!(leftover_files(dir.path()), 1);
    }

    #[test]
    fn test_already_applied_does_not_write() {
        let (_dir, path) = write_target("const x = bar();");
        let change = apply_edits(&path, &[Edit::new("foo()", "bar()")], Mode::Apply).unwrap();

        assert!(!change.written);
        assert!(!change.changed());
        assert_eq!(fs::read_to_string(&path).unwrap(), "const x = bar();");
    }

    #[test]
    fn test_drift_leaves_file_untouched() {
        let (dir, path) = write_target("const x = baz();");
        let edits = vec![Edit::new("const", "let"), Edit::new("foo()", "bar()")];
        let err = apply_edits(&path, &edits, Mode::Apply).unwrap_err();

        assert!(matches!(err, PatchError::Drifted { index: 1, .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "const x = baz();");
        assert_eq!(leftover_files(dir.path()), 1);
    }

    #[test]
    fn test_dry_run_never_writes() {
        let (_dir, path) = write_target("const x = foo();");
        let change = apply_edits(&path, &[Edit::new("foo()", "bar()")], Mode::DryRun).unwrap();

        assert!(!change.written);
        assert!(change.changed());
        assert_eq!(change.after(), "const x = bar();");
        assert_eq!(fs::read_to_string(&path).unwrap(), "const x = foo();");
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = apply_edits(&dir.path().join("nope.js"), &[], Mode::Apply).unwrap_err();
        assert!(matches!(err, PatchError::Read { .. }));
    }

    #[test]
    fn test_atomic_write_detects_concurrent_change() {
        let (dir, path) = write_target("original");
        let stale_hash = xxh3_64(b"something else");

        let err = atomic_write(&path, stale_hash, b"patched").unwrap_err();

        assert!(matches!(err, PatchError::Conflict { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
        assert_eq!(leftover_files(dir.path()), 1);
    }

    #[test]
    #[cfg(unix)]
    fn test_atomic_write_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, path) = write_target("foo()");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let _ = apply_edits(&path, &[Edit::new("foo()", "bar()")], Mode::Apply).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    #[cfg(unix)]
    fn test_write_failure_keeps_original() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, path) = write_target("foo()");
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o555)).unwrap();

        // root ignores directory permissions; nothing to assert in that case
        let scratch = tempfile::NamedTempFile::new_in(dir.path());
        if scratch.is_ok() {
            fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let err = apply_edits(&path, &[Edit::new("foo()", "bar()")], Mode::Apply).unwrap_err();
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o755)).unwrap();

        assert!(matches!(err, PatchError::WriteFailure { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "foo()");
    }
}
