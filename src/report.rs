use crate::retention::{ArtifactRecord, RetentionPlan};
use crate::sink::DeletionReport;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Images,
    Archives,
}

impl ArtifactKind {
    pub fn noun(&self) -> &'static str {
        match self {
            ArtifactKind::Images => "images",
            ArtifactKind::Archives => "archives",
        }
    }
}

/// Everything one cleanup run found, kept and deleted.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    pub kind: ArtifactKind,
    pub listing: String,
    pub keep: usize,
    pub total: usize,
    pub skipped_lines: usize,
    pub kept: Vec<ArtifactRecord>,
    pub to_delete: Vec<ArtifactRecord>,
    pub deletion: Option<DeletionReport>,
    pub dry_run: bool,
    pub run_at: DateTime<Utc>,
}

impl CleanupReport {
    pub fn new(kind: ArtifactKind, listing: &str, keep: usize, plan: RetentionPlan) -> Self {
        Self {
            kind,
            listing: listing.to_string(),
            keep,
            total: plan.total(),
            skipped_lines: 0,
            kept: plan.kept,
            to_delete: plan.to_delete,
            deletion: None,
            dry_run: false,
            run_at: Utc::now(),
        }
    }

    pub fn needs_cleanup(&self) -> bool {
        !self.to_delete.is_empty()
    }

    /// One-line summary in the same words the cleanup scripts always used.
    pub fn headline(&self) -> String {
        if self.needs_cleanup() {
            format!(
                "Total {}: {}. Keeping newest {}. Deleting {} {}.",
                self.kind.noun(),
                self.total,
                self.keep,
                self.to_delete.len(),
                self.kind.noun()
            )
        } else {
            format!("Found {} {}. No cleanup needed.", self.total, self.kind.noun())
        }
    }

    pub fn has_failures(&self) -> bool {
        self.deletion.as_ref().is_some_and(|d| !d.is_clean())
    }
}
