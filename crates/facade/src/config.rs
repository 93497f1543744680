//! Configuration file structure (facade.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use facade_plugin::{PluginConfig, PluginOptions, WrapperPlugin};
use facade_react::PrefixPolicy;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    components: ComponentsConfig,
    #[serde(default)]
    output: OutputConfig,
    #[serde(default)]
    package: PackageConfig,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ComponentsConfig {
    glob: String,
    #[serde(default)]
    prefix: String,
    #[serde(default)]
    prefix_policy: PrefixPolicy,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OutputConfig {
    #[serde(default = "default_output")]
    dir: PathBuf,
    #[serde(default = "default_virtual_location")]
    virtual_location: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output(),
            virtual_location: default_virtual_location(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PackageConfig {
    #[serde(default)]
    same_package: bool,
    src_path: Option<PathBuf>,
    watch_dist: Option<PathBuf>,
    import_path: Option<String>,
}

fn default_output() -> PathBuf {
    PathBuf::from("dist")
}
fn default_virtual_location() -> PathBuf {
    PathBuf::from("src/react/index.ts")
}

impl ConfigFile {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn into_options(self) -> PluginOptions {
        PluginOptions {
            glob: self.components.glob,
            prefix: self.components.prefix,
            prefix_policy: self.components.prefix_policy,
            out_dir: self.output.dir,
            virtual_location: self.output.virtual_location,
            same_package: self.package.same_package,
            src_path: self.package.src_path,
            watch_dist: self.package.watch_dist,
            import_path: self.package.import_path,
        }
    }
}

/// Load the config and build a plugin rooted at the config's directory.
pub fn load_plugin(config_path: &Path) -> Result<WrapperPlugin> {
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let config = ConfigFile::parse(&content)
        .with_context(|| format!("Failed to parse {}", config_path.display()))?;
    tracing::debug!("Loaded config from {}", config_path.display());

    let root = std::env::current_dir()
        .context("Failed to read current directory")?
        .join(config_path.parent().unwrap_or(Path::new("")));

    let plugin_config = PluginConfig::from_options(root, config.into_options())
        .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

    Ok(WrapperPlugin::new(plugin_config))
}
