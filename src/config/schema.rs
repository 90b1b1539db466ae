use crate::edit::{sequence_issues, Edit};
use crate::patch::{PatchSpec, TargetPath, DEFAULT_MODULES_DIR};
use crate::safety::RootGuard;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PatchConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub patches: Vec<PatchDefinition>,
}

impl PatchConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.patches.is_empty() {
            issues.push(ValidationIssue::EmptyPatchList);
        }

        if !self.meta.modules_dir.is_empty()
            && RootGuard::check_relative(Path::new(&self.meta.modules_dir)).is_err()
        {
            issues.push(ValidationIssue::InvalidPath {
                patch_id: None,
                path: self.meta.modules_dir.clone(),
            });
        }

        let mut seen = HashSet::new();
        for patch in &self.patches {
            if patch.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    patch_id: None,
                    field: "id",
                });
            } else if !seen.insert(patch.id.as_str()) {
                issues.push(ValidationIssue::DuplicateId(patch.id.clone()));
            }

            if patch.file.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    patch_id: Some(patch.id.clone()),
                    field: "file",
                });
            } else if RootGuard::check_relative(&patch.target(&self.meta).relative()).is_err() {
                issues.push(ValidationIssue::InvalidPath {
                    patch_id: Some(patch.id.clone()),
                    path: patch.file.clone(),
                });
            }

            if let Some(dependency) = &patch.dependency {
                if dependency.trim().is_empty() {
                    issues.push(ValidationIssue::MissingField {
                        patch_id: Some(patch.id.clone()),
                        field: "dependency",
                    });
                }
            }

            if patch.edits.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    patch_id: Some(patch.id.clone()),
                    field: "edits",
                });
            }

            for (index, issue) in sequence_issues(&patch.edits) {
                issues.push(ValidationIssue::InvalidEdit {
                    patch_id: patch.id.clone(),
                    index,
                    message: issue.to_string(),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// The declared PatchSpecs, in file order.
    pub fn specs(&self) -> Vec<PatchSpec> {
        self.patches
            .iter()
            .map(|patch| PatchSpec {
                id: patch.id.clone(),
                description: patch.description.clone(),
                target: patch.target(&self.meta),
                edits: patch.edits.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Where dependencies are installed, relative to the project root
    #[serde(default = "default_modules_dir")]
    pub modules_dir: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            modules_dir: default_modules_dir(),
        }
    }
}

fn default_modules_dir() -> String {
    DEFAULT_MODULES_DIR.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct PatchDefinition {
    pub id: String,
    /// Dependency the file belongs to; absent means project-relative
    #[serde(default)]
    pub dependency: Option<String>,
    pub file: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub edits: Vec<Edit>,
}

impl PatchDefinition {
    pub fn target(&self, meta: &Metadata) -> TargetPath {
        TargetPath {
            modules_dir: meta.modules_dir.clone(),
            dependency: self.dependency.clone(),
            file: self.file.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyPatchList,
    MissingField {
        patch_id: Option<String>,
        field: &'static str,
    },
    DuplicateId(String),
    InvalidPath {
        patch_id: Option<String>,
        path: String,
    },
    InvalidEdit {
        patch_id: String,
        index: usize,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyPatchList => write!(f, "patch config contains no patches"),
            ValidationIssue::MissingField { patch_id, field } => match patch_id {
                Some(id) => write!(f, "patch '{id}' missing required field '{field}'"),
                None => write!(f, "patch missing required field '{field}'"),
            },
            ValidationIssue::DuplicateId(id) => write!(f, "patch id '{id}' is declared twice"),
            ValidationIssue::InvalidPath { patch_id, path } => match patch_id {
                Some(id) => write!(
                    f,
                    "patch '{id}' path '{path}' must be relative and stay inside the project"
                ),
                None => write!(
                    f,
                    "modules_dir '{path}' must be relative and stay inside the project"
                ),
            },
            ValidationIssue::InvalidEdit {
                patch_id,
                index,
                message,
            } => write!(f, "patch '{patch_id}' edit #{index}: {message}"),
        }
    }
}
