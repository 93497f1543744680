//! Generate the wrapper module and declarations.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use facade_plugin::{BuildContext, WrapperPlugin, VIRTUAL_MODULE_ID};

use crate::config::load_plugin;

/// Run the generate command.
pub async fn run(config_path: &Path, wrapper: Option<PathBuf>) -> Result<()> {
    let plugin = load_plugin(config_path)?;
    generate(&plugin, wrapper.as_deref()).await
}

/// One full lifecycle pass: load the virtual module, then close the bundle.
pub async fn generate(plugin: &WrapperPlugin, wrapper_out: Option<&Path>) -> Result<()> {
    let start = Instant::now();
    let mut context = BuildContext::new();

    let id = plugin
        .resolve_id(VIRTUAL_MODULE_ID)
        .context("Virtual module did not resolve")?;
    let source = plugin
        .load(&id, &mut context)
        .context("Failed to generate wrappers")?
        .context("Virtual module produced no source")?;

    if let Some(path) = wrapper_out {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(path, &source)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("Wrapper module: {}", path.display());
    }

    if let Some(path) = plugin
        .close_bundle(&mut context)
        .await
        .context("Failed to write declarations")?
    {
        tracing::info!("Declarations: {}", path.display());
    }

    tracing::info!("Done in {}ms", start.elapsed().as_millis());

    Ok(())
}
