//! State file handling
//!
//! Observed pipeline state is persisted as pretty-printed JSON between runs.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use sluice_core::domain::pipeline::Pipeline;

/// Load a state file; `None` if it does not exist yet
pub fn load(path: &Path) -> Result<Option<Pipeline>> {
    if !path.exists() {
        return Ok(None);
    }

    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read state file: {}", path.display()))?;
    let pipeline: Pipeline = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse state file: {}", path.display()))?;
    pipeline
        .check_invariants()
        .with_context(|| format!("State file {} is inconsistent", path.display()))?;

    Ok(Some(pipeline))
}

/// Load a state file that must exist
pub fn load_required(path: &Path) -> Result<Pipeline> {
    load(path)?.ok_or_else(|| anyhow::anyhow!("State file not found: {}", path.display()))
}

pub fn save(path: &Path, pipeline: &Pipeline) -> Result<()> {
    let text = serde_json::to_string_pretty(pipeline).context("Failed to serialize state")?;

    // Write next to the target and rename, so a crash never leaves half a file
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, text)
        .with_context(|| format!("Failed to write state file: {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace state file: {}", path.display()))?;

    Ok(())
}

pub fn remove(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove state file: {}", path.display()))?;
    }
    Ok(())
}
