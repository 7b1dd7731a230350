//! JSON configuration of the demo tool.

use crate::synthetic::SyntheticEventConfig;
use crate::FinderParams;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputConfig {
    /// Where to write the JSON report; nothing is written when unset.
    pub json_out: Option<PathBuf>,
    /// Print every selected track, not only the summary.
    pub list_tracks: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuntimeConfig {
    pub finder: FinderParams,
    pub event: SyntheticEventConfig,
    /// Resolution (mm) assumed by the straight-line fitter.
    pub fit_sigma: Option<f64>,
    pub output: OutputConfig,
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: RuntimeConfig = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    Ok(config)
}

pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}
