use crate::retention::ArtifactRecord;
use crate::sink::DeletionSink;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum DeletionStatus {
    Deleted,
    Failed(String),
    Skipped(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletionItem {
    pub identifier: String,
    pub sort_key: String,
    #[serde(flatten)]
    pub status: DeletionStatus,
}

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Stop at the first failure and skip the remainder.
    pub fail_fast: bool,
    /// Cleared by the Ctrl+C handler; the batch stops between items.
    pub running: Option<Arc<AtomicBool>>,
}

impl BatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_running_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = Some(running);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|flag| !flag.load(Ordering::SeqCst))
    }
}

/// Per-item results of one deletion batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeletionReport {
    pub items: Vec<DeletionItem>,
    pub sink: String,
    pub duration: Duration,
    pub cancelled: bool,
}

impl DeletionReport {
    pub fn deleted(&self) -> usize {
        self.count(|s| matches!(s, DeletionStatus::Deleted))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, DeletionStatus::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, DeletionStatus::Skipped(_)))
    }

    pub fn is_clean(&self) -> bool {
        self.failed() == 0 && self.skipped() == 0
    }

    fn count<F: Fn(&DeletionStatus) -> bool>(&self, pred: F) -> usize {
        self.items.iter().filter(|i| pred(&i.status)).count()
    }
}

/// Delete every record in order, collecting one result per record.
///
/// A failed deletion is recorded and the loop moves on unless
/// `options.fail_fast` is set. `on_item` fires after each record.
pub fn execute_batch<S, F>(
    sink: &S,
    batch: &[ArtifactRecord],
    options: &BatchOptions,
    mut on_item: F,
) -> DeletionReport
where
    S: DeletionSink + ?Sized,
    F: FnMut(&DeletionItem),
{
    let start = Instant::now();
    let mut report = DeletionReport {
        items: Vec::with_capacity(batch.len()),
        sink: sink.describe(),
        ..Default::default()
    };
    let mut halt_reason: Option<String> = None;

    for record in batch {
        if halt_reason.is_none() && options.is_cancelled() {
            report.cancelled = true;
            halt_reason = Some("cancelled".to_string());
        }

        let status = match halt_reason {
            Some(ref reason) => DeletionStatus::Skipped(reason.clone()),
            None => match sink.delete(&record.identifier) {
                Ok(()) => {
                    info!(identifier = %record.identifier, "deleted");
                    DeletionStatus::Deleted
                }
                Err(e) => {
                    warn!(identifier = %record.identifier, error = %e, "deletion failed");
                    if options.fail_fast {
                        halt_reason = Some(format!("stopped after {} failed", record.identifier));
                    }
                    DeletionStatus::Failed(e.to_string())
                }
            },
        };

        let item = DeletionItem {
            identifier: record.identifier.clone(),
            sort_key: record.sort_key.clone(),
            status,
        };
        on_item(&item);
        report.items.push(item);
    }

    report.duration = start.elapsed();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{JanitorError, Result};
    use std::cell::RefCell;

    struct RecordingSink {
        failing: Vec<String>,
        calls: RefCell<Vec<String>>,
    }

    impl RecordingSink {
        fn failing_on(ids: &[&str]) -> Self {
            Self {
                failing: ids.iter().map(|s| s.to_string()).collect(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl DeletionSink for RecordingSink {
        fn delete(&self, identifier: &str) -> Result<()> {
            self.calls.borrow_mut().push(identifier.to_string());
            if self.failing.iter().any(|f| f == identifier) {
                return Err(JanitorError::ExternalCall {
                    identifier: identifier.to_string(),
                    message: "exit status: 1".to_string(),
                });
            }
            Ok(())
        }

        fn describe(&self) -> String {
            "recording".to_string()
        }
    }

    fn batch(ids: &[&str]) -> Vec<ArtifactRecord> {
        ids.iter()
            .map(|id| ArtifactRecord::new(*id, "2025-01-01T00:00:00Z"))
            .collect()
    }

    #[test]
    fn test_failure_does_not_abort_batch() {
        let sink = RecordingSink::failing_on(&["b"]);
        let report = execute_batch(&sink, &batch(&["a", "b", "c"]), &BatchOptions::new(), |_| {});

        assert_eq!(*sink.calls.borrow(), vec!["a", "b", "c"]);
        assert_eq!(report.deleted(), 2);
        assert_eq!(report.failed(), 1);
        assert!(matches!(report.items[1].status, DeletionStatus::Failed(_)));
        assert!(!report.is_clean());
    }

    #[test]
    fn test_fail_fast_skips_remainder() {
        let sink = RecordingSink::failing_on(&["b"]);
        let options = BatchOptions::new().with_fail_fast(true);
        let report = execute_batch(&sink, &batch(&["a", "b", "c", "d"]), &options, |_| {});

        assert_eq!(*sink.calls.borrow(), vec!["a", "b"]);
        assert_eq!(report.deleted(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.skipped(), 2);
    }

    #[test]
    fn test_cancelled_batch_skips_everything() {
        let sink = RecordingSink::failing_on(&[]);
        let running = Arc::new(AtomicBool::new(false));
        let options = BatchOptions::new().with_running_flag(running);
        let report = execute_batch(&sink, &batch(&["a", "b"]), &options, |_| {});

        assert!(sink.calls.borrow().is_empty());
        assert!(report.cancelled);
        assert_eq!(report.skipped(), 2);
    }

    #[test]
    fn test_callback_sees_every_item() {
        let sink = RecordingSink::failing_on(&[]);
        let mut seen = Vec::new();
        let report = execute_batch(&sink, &batch(&["a", "b"]), &BatchOptions::new(), |item| {
            seen.push(item.identifier.clone())
        });

        assert_eq!(seen, vec!["a", "b"]);
        assert!(report.is_clean());
        assert_eq!(report.sink, "recording");
    }

    #[test]
    fn test_empty_batch() {
        let report = execute_batch(&crate::sink::DryRunSink, &[], &BatchOptions::new(), |_| {});
        assert!(report.items.is_empty());
        assert!(report.is_clean());
    }
}
