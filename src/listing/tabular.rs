use crate::config::ListingConfig;
use crate::retention::ArtifactRecord;
use tracing::{debug, trace};

/// Line filter for `gcloud storage ls -l` style listings.
#[derive(Debug, Clone)]
pub struct TabularRules {
    skip_prefixes: Vec<String>,
    suffix: String,
}

impl TabularRules {
    pub fn new(config: &ListingConfig) -> Self {
        Self {
            skip_prefixes: config.skip_prefixes.clone(),
            suffix: config.archive_suffix.clone(),
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    fn is_skipped(&self, line: &str) -> bool {
        line.is_empty() || self.skip_prefixes.iter().any(|p| line.starts_with(p.as_str()))
    }

    /// Turn one listing line into a record, or `None` for anything that is
    /// not a `size date url` row ending in the archive suffix.
    pub fn parse_line(&self, line: &str) -> Option<ArtifactRecord> {
        let line = line.trim();
        if self.is_skipped(line) {
            return None;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            return None;
        }

        let url = parts[parts.len() - 1];
        if !url.ends_with(self.suffix.as_str()) {
            return None;
        }

        Some(ArtifactRecord::new(url, parts[1]))
    }
}

impl Default for TabularRules {
    fn default() -> Self {
        Self::new(&ListingConfig::default())
    }
}

/// Records parsed from a tabular listing plus how many lines were dropped.
#[derive(Debug, Clone, Default)]
pub struct TabularListing {
    pub records: Vec<ArtifactRecord>,
    pub skipped_lines: usize,
}

/// Parse a whitespace-separated listing. Noisy lines (headers, bare object
/// URLs, totals, non-archive objects) are dropped without error.
pub fn parse_tabular_listing(text: &str, rules: &TabularRules) -> TabularListing {
    let mut listing = TabularListing::default();

    for (number, line) in text.lines().enumerate() {
        match rules.parse_line(line) {
            Some(record) => listing.records.push(record),
            None => {
                if !line.trim().is_empty() {
                    trace!(line = number + 1, content = line.trim(), "skipped listing line");
                    listing.skipped_lines += 1;
                }
            }
        }
    }

    debug!(
        records = listing.records.len(),
        skipped = listing.skipped_lines,
        suffix = rules.suffix(),
        "parsed tabular listing"
    );
    listing
}
