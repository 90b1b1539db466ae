use serde::Deserialize;
use thiserror::Error;

/// The fundamental edit primitive: exact anchor replacement with an
/// already-applied check.
///
/// Classification and planning are pure functions over file content; all
/// filesystem work lives in [`crate::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Edit {
    /// Exact text expected in the unpatched file
    pub anchor: String,
    /// Exact text substituted for the first occurrence of `anchor`
    pub replacement: String,
    /// Text whose presence proves this edit already ran
    #[serde(default, rename = "marker", alias = "applied_marker")]
    pub applied_marker: Option<String>,
}

/// Per-edit classification of the current content. Never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    /// Anchor present, no evidence of the edit: safe to apply
    Pristine,
    /// Evidence of the edit is present: nothing to do
    AlreadyApplied,
    /// Neither anchor nor evidence present: the baseline moved
    Drifted,
}

impl Edit {
    pub fn new(anchor: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            anchor: anchor.into(),
            replacement: replacement.into(),
            applied_marker: None,
        }
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.applied_marker = Some(marker.into());
        self
    }

    /// Text whose presence counts as proof of prior application.
    ///
    /// The marker when one is declared, otherwise the replacement itself.
    pub fn evidence(&self) -> &str {
        self.applied_marker.as_deref().unwrap_or(&self.replacement)
    }

    /// Classify `content` against this edit using exact substring containment.
    ///
    /// Evidence is checked before the anchor: a replacement that embeds its own
    /// anchor must still read as applied on the second run. Empty evidence
    /// proves nothing.
    pub fn classify(&self, content: &str) -> EditState {
        let evidence = self.evidence();
        if !evidence.is_empty() && content.contains(evidence) {
            EditState::AlreadyApplied
        } else if content.contains(&self.anchor) {
            EditState::Pristine
        } else {
            EditState::Drifted
        }
    }

    /// Replace the first occurrence of the anchor. `None` if the anchor is absent.
    fn splice(&self, content: &str) -> Option<String> {
        let start = content.find(&self.anchor)?;
        let end = start + self.anchor.len();
        let mut out =
            String::with_capacity(content.len() - self.anchor.len() + self.replacement.len());
        out.push_str(&content[..start]);
        out.push_str(&self.replacement);
        out.push_str(&content[end..]);
        Some(out)
    }

    /// Problems with this edit taken on its own.
    pub fn issues(&self) -> Vec<EditIssue> {
        let mut issues = Vec::new();
        if self.anchor.is_empty() {
            issues.push(EditIssue::EmptyAnchor);
        }
        if self.anchor == self.replacement {
            issues.push(EditIssue::Identical);
        } else if self.applied_marker.as_deref() == Some("") {
            issues.push(EditIssue::EmptyMarker);
        } else if self.anchor.contains(self.evidence()) {
            // the edit would read as applied before it ever ran
            issues.push(EditIssue::EvidenceInAnchor);
        }
        issues
    }

    /// True when applying `later` can remove this edit's evidence.
    fn evidence_rewritten_by(&self, later: &Edit) -> bool {
        let evidence = self.evidence();
        if evidence.is_empty() || later.anchor.is_empty() {
            return false;
        }
        if later.anchor.contains(evidence) {
            !later.replacement.contains(evidence)
        } else if evidence.contains(&later.anchor) {
            !evidence
                .replacen(&later.anchor, &later.replacement, 1)
                .contains(evidence)
        } else {
            false
        }
    }
}

/// Why an edit sequence cannot be run safely.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditIssue {
    #[error("anchor is empty")]
    EmptyAnchor,
    #[error("anchor and replacement are identical")]
    Identical,
    #[error("marker is empty")]
    EmptyMarker,
    #[error("anchor already contains the edit's evidence; declare a marker the anchor lacks")]
    EvidenceInAnchor,
    #[error("edit #{later} rewrites this edit's evidence; declare a marker that survives it")]
    EvidenceRewritten { later: usize },
}

/// Every problem in an edit sequence, as `(edit index, issue)` pairs.
///
/// Besides per-edit checks, each edit's evidence must survive the edits that
/// follow it, otherwise a second run sees neither anchor nor evidence and
/// reports drift.
pub fn sequence_issues(edits: &[Edit]) -> Vec<(usize, EditIssue)> {
    let mut issues = Vec::new();
    for (index, edit) in edits.iter().enumerate() {
        issues.extend(edit.issues().into_iter().map(|issue| (index, issue)));
        if let Some(offset) = edits[index + 1..]
            .iter()
            .position(|later| edit.evidence_rewritten_by(later))
        {
            issues.push((
                index,
                EditIssue::EvidenceRewritten {
                    later: index + 1 + offset,
                },
            ));
        }
    }
    issues
}

/// An edit sequence failed to classify: the file no longer matches the
/// baseline the edits were written against.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("edit #{index} drifted: anchor not found and no evidence of prior application")]
pub struct Drift {
    /// Zero-based position of the offending edit
    pub index: usize,
    /// The anchor that could not be found
    pub anchor: String,
}

/// Outcome of planning an edit sequence against some content.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "EditPlan holds the new content; nothing is written until it is applied"]
pub struct EditPlan {
    /// Content after every pristine edit was spliced in
    pub content: String,
    /// Classification of each edit, in edit order, against the progressively
    /// updated content
    pub states: Vec<EditState>,
}

impl EditPlan {
    pub fn applied(&self) -> usize {
        self.count(EditState::Pristine)
    }

    pub fn already_applied(&self) -> usize {
        self.count(EditState::AlreadyApplied)
    }

    /// True when no edit needs to run.
    pub fn is_noop(&self) -> bool {
        self.applied() == 0
    }

    fn count(&self, state: EditState) -> usize {
        self.states.iter().filter(|s| **s == state).count()
    }
}

/// Classify and apply `edits` in order, each against the output of the
/// previous one.
///
/// Returns [`Drift`] on the first drifted edit; the input is never partially
/// transformed from the caller's point of view.
pub fn plan(content: &str, edits: &[Edit]) -> Result<EditPlan, Drift> {
    let mut current = content.to_string();
    let mut states = Vec::with_capacity(edits.len());

    for (index, edit) in edits.iter().enumerate() {
        let state = edit.classify(&current);
        tracing::debug!(index, ?state, "classified edit");
        match state {
            EditState::AlreadyApplied => {}
            EditState::Pristine => {
                current = edit.splice(&current).ok_or_else(|| Drift {
                    index,
                    anchor: edit.anchor.clone(),
                })?;
            }
            EditState::Drifted => {
                return Err(Drift {
                    index,
                    anchor: edit.anchor.clone(),
                });
            }
        }
        states.push(state);
    }

    Ok(EditPlan {
        content: current,
        states,
    })
}
