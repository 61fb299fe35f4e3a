//! Assembling the list of assets a command works on.

use anyhow::{Context, Result};
use cw_core::AssetId;
use std::path::Path;

/// Parse asset ids given on the command line.
pub fn parse_ids<S: AsRef<str>>(raw: &[S]) -> Result<Vec<AssetId>> {
    raw.iter()
        .map(|s| {
            let s = s.as_ref().trim();
            s.parse::<AssetId>()
                .with_context(|| format!("Invalid asset id: {:?}", s))
        })
        .collect()
}

/// Read asset ids from a list file, one per line.
///
/// Blank lines and lines starting with `#` are ignored. Errors name the line.
pub fn read_id_file(path: &Path) -> Result<Vec<AssetId>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read asset list: {:?}", path))?;

    let mut ids = Vec::new();
    for (n, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let id = line
            .parse::<AssetId>()
            .with_context(|| format!("{}:{}: invalid asset id {:?}", path.display(), n + 1, line))?;
        ids.push(id);
    }

    Ok(ids)
}

/// Command-line ids followed by those from `file`, duplicates dropped with
/// the first occurrence kept.
pub fn collect_ids<S: AsRef<str>>(raw: &[S], file: Option<&Path>) -> Result<Vec<AssetId>> {
    let mut ids = parse_ids(raw)?;
    if let Some(file) = file {
        ids.extend(read_id_file(file)?);
    }

    let mut seen = std::collections::HashSet::new();
    let before = ids.len();
    ids.retain(|id| seen.insert(id.clone()));
    if ids.len() < before {
        tracing::warn!("Dropped {} duplicate asset id(s)", before - ids.len());
    }

    if ids.is_empty() {
        anyhow::bail!("No asset ids given");
    }

    Ok(ids)
}
