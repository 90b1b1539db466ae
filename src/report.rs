//! Runs PatchSpecs in order and aggregates their outcomes.
//!
//! Each PatchSpec goes NotStarted -> Classifying -> Applied | AlreadyApplied |
//! Failed, with no way back. Failures stay local to their PatchSpec but make
//! the whole run fail. Nothing is retried.

use crate::apply::{apply_edits, FileChange, Mode};
use crate::errors::{DriftHint, PatchError};
use crate::patch::{PatchSpec, TargetPath};
use crate::resolve::PathResolver;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// How a run treats the files it classifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// Write every applicable PatchSpec
    #[default]
    Apply,
    /// Report what would be written
    DryRun,
    /// Succeed only if everything is already applied
    Verify,
}

impl RunMode {
    fn write_mode(self) -> Mode {
        match self {
            RunMode::Apply => Mode::Apply,
            RunMode::DryRun | RunMode::Verify => Mode::DryRun,
        }
    }
}

/// Terminal state of one PatchSpec.
#[derive(Debug)]
#[must_use = "Outcome should be checked for success/failure"]
pub enum Outcome {
    /// At least one edit was applied (or would be, in a dry run)
    Applied {
        applied: usize,
        already_applied: usize,
    },
    /// Every edit was already present; the file was not touched
    AlreadyApplied,
    Failed(PatchError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::Failed(_))
    }

    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Applied { .. } => "applied",
            Outcome::AlreadyApplied => "already-applied",
            Outcome::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Applied {
                applied,
                already_applied: 0,
            } => write!(f, "applied {applied} edit(s)"),
            Outcome::Applied {
                applied,
                already_applied,
            } => write!(
                f,
                "applied {applied} edit(s), {already_applied} already present"
            ),
            Outcome::AlreadyApplied => write!(f, "already applied"),
            Outcome::Failed(err) => write!(f, "{err}"),
        }
    }
}

/// Result for one PatchSpec.
#[derive(Debug)]
pub struct PatchReport {
    pub id: String,
    pub target: TargetPath,
    /// Resolved location, when resolution succeeded
    pub path: Option<PathBuf>,
    pub outcome: Outcome,
    /// Before/after content for changed files
    pub change: Option<FileChange>,
}

/// Results of a full run, in declared PatchSpec order.
#[derive(Debug)]
pub struct RunReport {
    pub mode: RunMode,
    pub entries: Vec<PatchReport>,
}

#[derive(Serialize)]
struct EntryView<'a> {
    id: &'a str,
    target: String,
    path: Option<String>,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'a DriftHint>,
    reason: String,
}

#[derive(Serialize)]
struct ReportView<'a> {
    mode: RunMode,
    success: bool,
    applied: usize,
    already_applied: usize,
    failed: usize,
    patches: Vec<EntryView<'a>>,
}

impl RunReport {
    /// True iff every PatchSpec ended applied or already applied.
    pub fn success(&self) -> bool {
        self.entries.iter().all(|e| e.outcome.is_success())
    }

    pub fn applied(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Applied { .. }))
    }

    pub fn already_applied(&self) -> usize {
        self.count(|o| matches!(o, Outcome::AlreadyApplied))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }

    /// Machine-readable rendering of the report.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let view = ReportView {
            mode: self.mode,
            success: self.success(),
            applied: self.applied(),
            already_applied: self.already_applied(),
            failed: self.failed(),
            patches: self
                .entries
                .iter()
                .map(|e| EntryView {
                    id: &e.id,
                    target: e.target.to_string(),
                    path: e.path.as_ref().map(|p| p.display().to_string()),
                    status: e.outcome.status(),
                    error: match &e.outcome {
                        Outcome::Failed(err) => Some(err.kind()),
                        _ => None,
                    },
                    hint: match &e.outcome {
                        Outcome::Failed(PatchError::Drifted { hint, .. }) => hint.as_ref(),
                        _ => None,
                    },
                    reason: e.outcome.to_string(),
                })
                .collect(),
        };
        serde_json::to_string_pretty(&view)
    }
}

/// Run every PatchSpec in order against the resolver's project root.
///
/// One PatchSpec failing never prevents the rest from being attempted.
pub fn run_patches(resolver: &PathResolver, specs: &[PatchSpec], mode: RunMode) -> RunReport {
    let entries = specs
        .iter()
        .map(|spec| run_patch(resolver, spec, mode))
        .collect();
    RunReport { mode, entries }
}

fn run_patch(resolver: &PathResolver, spec: &PatchSpec, mode: RunMode) -> PatchReport {
    let mut report = PatchReport {
        id: spec.id.clone(),
        target: spec.target.clone(),
        path: None,
        outcome: Outcome::AlreadyApplied,
        change: None,
    };

    if let Err(err) = spec.validate() {
        tracing::warn!(id = %spec.id, %err, "refusing invalid patch");
        report.outcome = Outcome::Failed(err.into());
        return report;
    }

    let path = match resolver.resolve(&spec.target) {
        Ok(path) => path,
        Err(err) => {
            report.outcome = Outcome::Failed(err);
            return report;
        }
    };
    report.path = Some(path.clone());

    let change = match apply_edits(&path, &spec.edits, mode.write_mode()) {
        Ok(change) => change,
        Err(err) => {
            report.outcome = Outcome::Failed(err);
            return report;
        }
    };

    report.outcome = if !change.changed() {
        Outcome::AlreadyApplied
    } else if mode == RunMode::Verify {
        Outcome::Failed(PatchError::NotApplied {
            path,
            pending: change.plan.applied(),
        })
    } else {
        Outcome::Applied {
            applied: change.plan.applied(),
            already_applied: change.plan.already_applied(),
        }
    };
    if change.changed() {
        report.change = Some(change);
    }

    report
}
