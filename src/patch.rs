//! Immutable description of the edits to make to one target file.

use crate::edit::{sequence_issues, Edit, EditIssue};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Directory that holds installed dependencies when a patch file does not
/// say otherwise.
pub const DEFAULT_MODULES_DIR: &str = "node_modules";

/// Logical identity of a target file: which dependency, and where inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetPath {
    /// Dependency layout root, relative to the project root
    pub modules_dir: String,
    /// Dependency name; `None` means `file` is relative to the project root
    pub dependency: Option<String>,
    /// Path of the file inside the dependency
    pub file: String,
}

impl TargetPath {
    pub fn in_dependency(dependency: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            modules_dir: DEFAULT_MODULES_DIR.to_string(),
            dependency: Some(dependency.into()),
            file: file.into(),
        }
    }

    pub fn in_project(file: impl Into<String>) -> Self {
        Self {
            modules_dir: DEFAULT_MODULES_DIR.to_string(),
            dependency: None,
            file: file.into(),
        }
    }

    /// Path relative to the project root.
    pub fn relative(&self) -> PathBuf {
        match &self.dependency {
            Some(dependency) => PathBuf::from(&self.modules_dir)
                .join(dependency)
                .join(&self.file),
            None => PathBuf::from(&self.file),
        }
    }
}

impl fmt::Display for TargetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.relative().display())
    }
}

/// One target file and the ordered edits to make to it.
///
/// Later edits may anchor on text produced by earlier ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchSpec {
    pub id: String,
    pub description: Option<String>,
    pub target: TargetPath,
    pub edits: Vec<Edit>,
}

impl PatchSpec {
    pub fn new(id: impl Into<String>, target: TargetPath, edits: Vec<Edit>) -> Self {
        Self {
            id: id.into(),
            description: None,
            target,
            edits,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check that the edits are non-empty and safe to run repeatedly.
    ///
    /// Patch files are validated at load time; this covers specs built in code.
    pub fn validate(&self) -> Result<(), InvalidSpec> {
        if self.edits.is_empty() {
            return Err(InvalidSpec::NoEdits);
        }
        match sequence_issues(&self.edits).into_iter().next() {
            Some((index, issue)) => Err(InvalidSpec::Edit { index, issue }),
            None => Ok(()),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidSpec {
    #[error("no edits declared")]
    NoEdits,
    #[error("edit #{index}: {issue}")]
    Edit { index: usize, issue: EditIssue },
}
