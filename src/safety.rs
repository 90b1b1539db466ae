use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Keeps every resolved target inside the project root.
#[derive(Debug, Clone)]
pub struct RootGuard {
    /// Canonical project root
    root: PathBuf,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("{path} is outside project root {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("relative path must not be absolute or contain `..`: {0}")]
    NotConfined(PathBuf),

    #[error("failed to canonicalize {path}: {source}")]
    Canonicalize {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl RootGuard {
    /// Create a guard for `root`, canonicalized so symlinked roots compare correctly.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let root = root.as_ref();
        let root = root.canonicalize().map_err(|source| SafetyError::Canonicalize {
            path: root.to_path_buf(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reject relative paths that could climb out of the root lexically.
    pub fn check_relative(relative: &Path) -> Result<(), SafetyError> {
        let confined = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if confined && relative.components().next().is_some() {
            Ok(())
        } else {
            Err(SafetyError::NotConfined(relative.to_path_buf()))
        }
    }

    /// Canonicalize an existing path and confirm it is under the root.
    ///
    /// Catches symlinks inside the dependency tree that point elsewhere.
    pub fn validate_path(&self, path: &Path) -> Result<PathBuf, SafetyError> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let canonical = absolute
            .canonicalize()
            .map_err(|source| SafetyError::Canonicalize {
                path: absolute.clone(),
                source,
            })?;

        if !canonical.starts_with(&self.root) {
            return Err(SafetyError::OutsideRoot {
                path: canonical,
                root: self.root.clone(),
            });
        }

        Ok(canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_validate_path_inside_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        let guard = RootGuard::new(root).unwrap();

        let file = root.join("node_modules/pkg/index.js");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, b"").unwrap();

        let result = guard.validate_path(&file).unwrap();
        assert!(result.starts_with(guard.root()));
    }

    #[test]
    fn test_validate_path_outside_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("project");
        fs::create_dir_all(&root).unwrap();
        let guard = RootGuard::new(&root).unwrap();

        let outside = temp_dir.path().join("outside.js");
        fs::write(&outside, b"").unwrap();

        let result = guard.validate_path(&outside);
        assert!(matches!(result, Err(SafetyError::OutsideRoot { .. })));
    }

    #[test]
    fn test_validate_relative_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let guard = RootGuard::new(temp_dir.path()).unwrap();
        fs::write(temp_dir.path().join("a.js"), b"").unwrap();

        assert!(guard.validate_path(Path::new("a.js")).is_ok());
    }

    #[test]
    fn test_check_relative() {
        assert!(RootGuard::check_relative(Path::new("node_modules/pkg/a.js")).is_ok());
        assert!(RootGuard::check_relative(Path::new("./a.js")).is_ok());
        assert!(RootGuard::check_relative(Path::new("../a.js")).is_err());
        assert!(RootGuard::check_relative(Path::new("a/../../b.js")).is_err());
        assert!(RootGuard::check_relative(Path::new("/etc/passwd")).is_err());
        assert!(RootGuard::check_relative(Path::new("")).is_err());
    }

    #[test]
    #[cfg(unix)]
    fn test_validate_symlink_escape() {
        use std::os::unix::fs::symlink;

        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("project");
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();

        let outside = temp_dir.path().join("outside.js");
        fs::write(&outside, b"").unwrap();

        let link = root.join("node_modules/pkg/escape.js");
        symlink(&outside, &link).unwrap();

        let guard = RootGuard::new(&root).unwrap();
        let result = guard.validate_path(&link);

        assert!(matches!(result, Err(SafetyError::OutsideRoot { .. })));
    }
}
