use crate::patch::InvalidSpec;
use crate::safety::SafetyError;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Why a single PatchSpec failed. Failures never spread to other PatchSpecs.
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("invalid patch: {0}")]
    Invalid(#[from] InvalidSpec),

    #[error("target file not found: {path}")]
    PathNotFound { path: PathBuf },

    #[error("target rejected: {0}")]
    OutsideRoot(#[from] SafetyError),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} has drifted: edit #{index} anchor not found and edit not already applied{}", hint_suffix(.hint))]
    Drifted {
        path: PathBuf,
        index: usize,
        anchor: String,
        hint: Option<DriftHint>,
    },

    #[error("{path}: {pending} edit(s) not yet applied")]
    NotApplied { path: PathBuf, pending: usize },

    #[error("{path} changed on disk while being patched; left untouched")]
    Conflict { path: PathBuf },

    #[error("failed to write {path}: {source}")]
    WriteFailure {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Closest line to a missing anchor, to point a human at what changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftHint {
    /// One-based line number
    pub line: usize,
    pub text: String,
    pub similarity: f64,
}

fn hint_suffix(hint: &Option<DriftHint>) -> String {
    match hint {
        Some(hint) => format!(" (closest line {}: `{}`)", hint.line, hint.text.trim()),
        None => String::new(),
    }
}

impl PatchError {
    /// Short machine-friendly category, stable across releases.
    pub fn kind(&self) -> &'static str {
        match self {
            PatchError::Invalid(_) => "invalid-patch",
            PatchError::PathNotFound { .. } => "path-not-found",
            PatchError::OutsideRoot(_) => "outside-root",
            PatchError::Read { .. } => "read-failure",
            PatchError::Drifted { .. } => "drifted",
            PatchError::NotApplied { .. } => "not-applied",
            PatchError::Conflict { .. } => "conflict",
            PatchError::WriteFailure { .. } => "write-failure",
        }
    }
}
