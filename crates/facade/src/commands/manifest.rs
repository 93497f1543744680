//! Print the component manifest.

use std::path::Path;

use anyhow::{Context, Result};

use crate::config::load_plugin;

/// Run the manifest command.
pub fn run(config_path: &Path, pretty: bool) -> Result<()> {
    let plugin = load_plugin(config_path)?;
    let manifest = plugin.manifest().context("Failed to build component manifest")?;

    let json = if pretty {
        serde_json::to_string_pretty(&manifest)?
    } else {
        serde_json::to_string(&manifest)?
    };

    println!("{}", json);

    Ok(())
}
