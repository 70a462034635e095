use crate::error::{JanitorError, Result};
use crate::retention::ArtifactRecord;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Keep the `keep` most recently created artifacts, delete the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub keep: usize,
}

impl RetentionPolicy {
    pub fn new(keep: usize) -> Self {
        Self { keep }
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self { keep: 5 }
    }
}

/// Outcome of applying a retention policy: both halves, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetentionPlan {
    pub kept: Vec<ArtifactRecord>,
    pub to_delete: Vec<ArtifactRecord>,
}

impl RetentionPlan {
    pub fn total(&self) -> usize {
        self.kept.len() + self.to_delete.len()
    }
}

/// Split `records` into the newest `policy.keep` and everything older.
///
/// Ordering is a stable sort on `sort_key` descending, so records sharing a
/// timestamp keep their listing order.
pub fn plan_retention(
    records: Vec<ArtifactRecord>,
    policy: RetentionPolicy,
) -> Result<RetentionPlan> {
    if let Some(index) = records.iter().position(|r| !r.has_sort_key()) {
        return Err(JanitorError::MalformedRecord {
            index,
            field: "sort key".to_string(),
        });
    }

    let mut sorted = records;
    sorted.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));

    let to_delete = if sorted.len() > policy.keep {
        sorted.split_off(policy.keep)
    } else {
        Vec::new()
    };

    debug!(
        kept = sorted.len(),
        to_delete = to_delete.len(),
        keep = policy.keep,
        "applied retention policy"
    );

    Ok(RetentionPlan {
        kept: sorted,
        to_delete,
    })
}

/// Records to delete: everything except the `keep` newest.
pub fn select_for_deletion(records: &[ArtifactRecord], keep: usize) -> Result<Vec<ArtifactRecord>> {
    plan_retention(records.to_vec(), RetentionPolicy::new(keep)).map(|plan| plan.to_delete)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(keys: &[&str]) -> Vec<ArtifactRecord> {
        keys.iter()
            .enumerate()
            .map(|(i, k)| ArtifactRecord::new(format!("artifact-{}", i), *k))
            .collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(select_for_deletion(&[], 5).unwrap().is_empty());
    }

    #[test]
    fn test_at_or_below_keep_deletes_nothing() {
        for k in 0..=5 {
            let keys: Vec<String> = (0..k)
                .map(|d| format!("2025-01-0{}T00:00:00Z", d + 1))
                .collect();
            let keys: Vec<&str> = keys.iter().map(|s| s.as_str()).collect();
            assert!(
                select_for_deletion(&records(&keys), 5).unwrap().is_empty(),
                "k = {}",
                k
            );
        }
    }

    #[test]
    fn test_deletes_oldest_beyond_keep() {
        let input = records(&[
            "2025-01-03T00:00:00Z",
            "2025-01-07T00:00:00Z",
            "2025-01-01T00:00:00Z",
            "2025-01-05T00:00:00Z",
            "2025-01-02T00:00:00Z",
            "2025-01-06T00:00:00Z",
            "2025-01-04T00:00:00Z",
        ]);

        let plan = plan_retention(input, RetentionPolicy::new(5)).unwrap();
        assert_eq!(plan.total(), 7);
        assert_eq!(plan.to_delete.len(), 2);

        let deleted: Vec<&str> = plan.to_delete.iter().map(|r| r.sort_key.as_str()).collect();
        assert_eq!(deleted, vec!["2025-01-02T00:00:00Z", "2025-01-01T00:00:00Z"]);

        let oldest_kept = plan.kept.iter().map(|r| &r.sort_key).min().unwrap();
        assert!(plan.to_delete.iter().all(|r| &r.sort_key <= oldest_kept));
    }

    #[test]
    fn test_keep_zero_deletes_everything() {
        let input = records(&["2025-01-01", "2025-01-02"]);
        let deleted = select_for_deletion(&input, 0).unwrap();
        assert_eq!(deleted.len(), 2);
        assert_eq!(deleted[0].sort_key, "2025-01-02");
    }

    #[test]
    fn test_ties_keep_listing_order() {
        let input = records(&["2025-01-01", "2025-01-01", "2025-01-01"]);
        let deleted = select_for_deletion(&input, 1).unwrap();
        let ids: Vec<&str> = deleted.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(ids, vec!["artifact-1", "artifact-2"]);
    }

    #[test]
    fn test_rerun_never_adds_records() {
        let keys: Vec<String> = (10..30).map(|d| format!("2025-01-{}T00:00:00Z", d)).collect();
        let keys: Vec<&str> = keys.iter().map(|s| s.as_str()).collect();
        let first = select_for_deletion(&records(&keys), 5).unwrap();
        assert_eq!(first.len(), 15);

        let second = select_for_deletion(&first, 5).unwrap();
        assert_eq!(second.len(), 10);
        assert!(second.iter().all(|r| first.contains(r)));

        let small = select_for_deletion(&records(&keys[..8]), 5).unwrap();
        assert_eq!(small.len(), 3);
        assert!(select_for_deletion(&small, 5).unwrap().is_empty());
    }

    #[test]
    fn test_missing_sort_key_is_malformed() {
        let mut input = records(&["2025-01-01", "2025-01-02"]);
        input.push(ArtifactRecord::new("gs://b/broken.zip", ""));

        match select_for_deletion(&input, 1) {
            Err(JanitorError::MalformedRecord { index, .. }) => assert_eq!(index, 2),
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }
}
