//! Write a default configuration file.

use std::path::Path;

use anyhow::{Context, Result};

/// Run the init command.
pub async fn run(config_path: &Path, yes: bool) -> Result<()> {
    if config_path.exists() && !yes {
        tracing::warn!(
            "{} already exists. Use --yes to overwrite.",
            config_path.display()
        );
        return Ok(());
    }

    tokio::fs::write(config_path, DEFAULT_CONFIG)
        .await
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    tracing::info!("Created {}", config_path.display());
    tracing::info!("Run 'facade generate' to build the React wrappers.");

    Ok(())
}

pub const DEFAULT_CONFIG: &str = r#"# facade configuration

[components]
# Custom element sources; stories and tests are skipped
glob = "src/**/!(*.stories|*.test).ts"

# Stripped from tag names to form wrapper names (custom-button -> Button)
prefix = "custom-"

# "strict" fails on tags without the prefix, "pass-through" keeps the full tag
prefix_policy = "strict"

[output]
# Where the .d.ts file is written
dir = "dist"

# Where the virtual wrapper module is imported from
virtual_location = "src/react/index.ts"

[package]
# Wrappers live in the same package as the components
same_package = true
src_path = "src"

# For wrappers in another package, set same_package = false and use:
# watch_dist = "../components/dist"
# import_path = "@acme/components/{kebab}"
"#;
