//! Maps a PatchSpec's logical target to a file under the project root.

use crate::errors::PatchError;
use crate::patch::TargetPath;
use crate::safety::{RootGuard, SafetyError};
use std::path::{Path, PathBuf};

/// Resolves targets against one project root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    guard: RootGuard,
}

impl PathResolver {
    pub fn new(project_root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        Ok(Self {
            guard: RootGuard::new(project_root)?,
        })
    }

    pub fn project_root(&self) -> &Path {
        self.guard.root()
    }

    /// Absolute location of `target`.
    ///
    /// A missing file is a hard `PathNotFound`: the dependency layout changed.
    pub fn resolve(&self, target: &TargetPath) -> Result<PathBuf, PatchError> {
        let relative = target.relative();
        RootGuard::check_relative(&relative)?;

        let path = self.guard.root().join(&relative);
        if !path.is_file() {
            return Err(PatchError::PathNotFound { path });
        }

        Ok(self.guard.validate_path(&path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_resolve_existing_dependency_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("node_modules/pkg/dist/a.js");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "x").unwrap();

        let resolver = PathResolver::new(temp_dir.path()).unwrap();
        let resolved = resolver
            .resolve(&TargetPath::in_dependency("pkg", "dist/a.js"))
            .unwrap();

        assert!(resolved.is_absolute());
        assert_eq!(fs::read_to_string(resolved).unwrap(), "x");
    }

    #[test]
    fn test_resolve_missing_file_is_path_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let resolver = PathResolver::new(temp_dir.path()).unwrap();

        let err = resolver
            .resolve(&TargetPath::in_dependency("pkg", "missing.js"))
            .unwrap_err();
        assert!(matches!(err, PatchError::PathNotFound { .. }));
    }

    #[test]
    fn test_resolve_directory_is_path_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp_dir.path().join("node_modules/pkg/dist")).unwrap();
        let resolver = PathResolver::new(temp_dir.path()).unwrap();

        let err = resolver
            .resolve(&TargetPath::in_dependency("pkg", "dist"))
            .unwrap_err();
        assert!(matches!(err, PatchError::PathNotFound { .. }));
    }

    #[test]
    fn test_resolve_rejects_parent_components() {
        let temp_dir = tempfile::tempdir().unwrap();
        let resolver = PathResolver::new(temp_dir.path()).unwrap();

        let err = resolver
            .resolve(&TargetPath::in_project("../escape.js"))
            .unwrap_err();
        assert!(matches!(err, PatchError::OutsideRoot(_)));
    }
}
