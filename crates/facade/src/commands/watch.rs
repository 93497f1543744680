//! Regenerate on source changes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use facade_plugin::FileWatcher;

use super::generate::generate;
use crate::config::load_plugin;

/// Run the watch command.
pub async fn run(config_path: &Path, wrapper: Option<PathBuf>) -> Result<()> {
    let plugin = load_plugin(config_path)?;

    // A failing build should not end the session
    if let Err(e) = generate(&plugin, wrapper.as_deref()).await {
        tracing::error!("{:#}", e);
    }

    // Our own output must not retrigger a build
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let mut ignore = vec![plugin.config().declaration_target().out_dir];
    ignore.extend(wrapper.as_ref().map(|path| cwd.join(path)));

    let watch_paths = plugin.config().watch_paths();
    let (watcher, mut rx) =
        FileWatcher::new(&watch_paths, &ignore).context("Failed to start file watcher")?;

    tracing::info!("Watching for changes (Ctrl+C to stop)");

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                tracing::info!("Changed: {}", event.path().display());
                if let Err(e) = generate(&plugin, wrapper.as_deref()).await {
                    tracing::error!("{:#}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping");
                break;
            }
        }
    }

    // Keep watcher alive
    drop(watcher);

    Ok(())
}
