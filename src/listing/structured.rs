use crate::error::{JanitorError, Result};
use crate::retention::ArtifactRecord;
use serde::Deserialize;
use tracing::debug;

/// One entry of `gcloud artifacts docker images list --format=json`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageEntry {
    create_time: Option<String>,
    package: Option<String>,
    version: Option<String>,
}

fn require(value: Option<String>, index: usize, field: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(JanitorError::MalformedRecord {
            index,
            field: field.to_string(),
        }),
    }
}

/// Parse a JSON array of image entries into `package@version` records.
///
/// Every entry must carry `createTime`, `package` and `version`; the first
/// entry lacking one fails the whole listing.
pub fn parse_structured_listing(text: &str, source_name: &str) -> Result<Vec<ArtifactRecord>> {
    let entries: Vec<ImageEntry> = serde_json::from_str(text).map_err(|e| JanitorError::Parse {
        source_name: source_name.to_string(),
        message: e.to_string(),
    })?;

    let records = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let create_time = require(entry.create_time, index, "createTime")?;
            let package = require(entry.package, index, "package")?;
            let version = require(entry.version, index, "version")?;
            Ok(ArtifactRecord::image(&package, &version, create_time))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(source = source_name, records = records.len(), "parsed structured listing");
    Ok(records)
}
