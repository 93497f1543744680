//! Plugin configuration.
//!
//! [`PluginOptions`] is the raw, deserializable surface. It is validated
//! exactly once by [`PluginConfig::from_options`]; lifecycle calls never
//! re-check it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use facade_manifest::{ScanError, SourceGlob};
use facade_react::metadata::ResolveFn;
use facade_react::naming::to_kebab_case;
use facade_react::{DeclarationTarget, ImportResolver, MetadataDeriver, PrefixPolicy};
use serde::Deserialize;

const PLACEHOLDERS: &[&str] = &["name", "lower", "kebab"];

/// Raw plugin options, as written in a config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginOptions {
    /// Component source glob (e.g. `src/**/!(*.stories|*.test).ts`)
    pub glob: String,

    /// Tag prefix stripped from wrapper names (e.g. `custom-`)
    #[serde(default)]
    pub prefix: String,

    #[serde(default)]
    pub prefix_policy: PrefixPolicy,

    /// Directory the declaration file is written to
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    /// Declared location of the virtual module (e.g. `src/react/index.ts`)
    #[serde(default = "default_virtual_location")]
    pub virtual_location: PathBuf,

    /// Whether the wrappers live in the same package as the components
    #[serde(default)]
    pub same_package: bool,

    /// Source root, same-package mode only
    pub src_path: Option<PathBuf>,

    /// Published build to watch, cross-package mode only
    pub watch_dist: Option<PathBuf>,

    /// Import path template for cross-package mode
    pub import_path: Option<String>,
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("./dist")
}

fn default_virtual_location() -> PathBuf {
    PathBuf::from("src/react/index.ts")
}

/// Errors that can occur while validating options.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid component glob: {0}")]
    InvalidGlob(#[source] ScanError),

    #[error("src_path is required when same_package is true")]
    MissingSrcPath,

    #[error("src_path is only allowed when same_package is true")]
    UnexpectedSrcPath,

    #[error("watch_dist is required when same_package is false")]
    MissingWatchDist,

    #[error("watch_dist is only allowed when same_package is false")]
    UnexpectedWatchDist,

    #[error("Cross-package output needs an import_path template or a resolver")]
    MissingImportPath,

    #[error("import_path is only used when same_package is false")]
    UnexpectedImportPath,

    #[error("Both an import_path template and a resolver were supplied")]
    AmbiguousImportPath,

    #[error("Invalid import_path template \"{template}\": {message}")]
    InvalidTemplate { template: String, message: String },

    #[error("virtual_location {} does not name a file", path.display())]
    InvalidVirtualLocation { path: PathBuf },

    #[error("Cannot resolve root directory {}: {source}", path.display())]
    InvalidRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Import path template such as `@acme/components/{kebab}`.
///
/// Placeholders are filled from the wrapper name: `{name}` as is, `{lower}`
/// lower-cased, `{kebab}` kebab-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTemplate {
    template: String,
}

impl ImportTemplate {
    /// Parse a template, rejecting unknown or unclosed placeholders.
    pub fn parse(template: &str) -> Result<Self, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidTemplate {
            template: template.to_string(),
            message,
        };

        if template.trim().is_empty() {
            return Err(invalid("template is empty".to_string()));
        }

        let mut rest = template;
        while let Some(start) = rest.find('{') {
            let after = &rest[start + 1..];
            let end = after
                .find('}')
                .ok_or_else(|| invalid("unclosed placeholder".to_string()))?;
            let placeholder = &after[..end];
            if !PLACEHOLDERS.contains(&placeholder) {
                return Err(invalid(format!("unknown placeholder {{{}}}", placeholder)));
            }
            rest = &after[end + 1..];
        }

        Ok(Self {
            template: template.to_string(),
        })
    }

    pub fn render(&self, wrapper_name: &str) -> String {
        self.template
            .replace("{name}", wrapper_name)
            .replace("{lower}", &wrapper_name.to_lowercase())
            .replace("{kebab}", &to_kebab_case(wrapper_name))
    }
}

/// Where wrapper imports point.
#[derive(Clone)]
pub enum OutputMode {
    /// Wrappers are compiled alongside the component sources.
    SamePackage { src_path: PathBuf },

    /// Wrappers consume another package's published build.
    CrossPackage {
        watch_dist: PathBuf,
        resolver: Arc<ResolveFn>,
    },
}

impl fmt::Debug for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SamePackage { src_path } => f
                .debug_struct("SamePackage")
                .field("src_path", src_path)
                .finish(),
            Self::CrossPackage { watch_dist, .. } => f
                .debug_struct("CrossPackage")
                .field("watch_dist", watch_dist)
                .finish_non_exhaustive(),
        }
    }
}

/// Validated plugin configuration.
#[derive(Debug, Clone)]
pub struct PluginConfig {
    /// Absolute directory every relative path is resolved against
    pub root: PathBuf,

    pub glob: SourceGlob,

    pub prefix: String,

    pub prefix_policy: PrefixPolicy,

    pub out_dir: PathBuf,

    pub virtual_location: PathBuf,

    pub mode: OutputMode,
}

impl PluginConfig {
    /// Validate options, resolving cross-package imports through the
    /// `import_path` template.
    pub fn from_options(root: impl Into<PathBuf>, options: PluginOptions) -> Result<Self, ConfigError> {
        Self::validate(root.into(), options, None)
    }

    /// Validate options, resolving cross-package imports through `resolve`.
    ///
    /// `resolve` is called with each wrapper name and returns the module to
    /// import the element class from.
    pub fn with_resolver<F>(
        root: impl Into<PathBuf>,
        options: PluginOptions,
        resolve: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self::validate(root.into(), options, Some(Arc::new(resolve)))
    }

    fn validate(
        root: PathBuf,
        options: PluginOptions,
        resolver: Option<Arc<ResolveFn>>,
    ) -> Result<Self, ConfigError> {
        // Import specifiers are computed lexically, which needs an absolute base
        let root = std::path::absolute(&root).map_err(|source| ConfigError::InvalidRoot {
            path: root.clone(),
            source,
        })?;

        let glob = SourceGlob::new(&options.glob).map_err(ConfigError::InvalidGlob)?;

        if options.virtual_location.file_stem().is_none() {
            return Err(ConfigError::InvalidVirtualLocation {
                path: options.virtual_location,
            });
        }

        let mode = if options.same_package {
            if options.watch_dist.is_some() {
                return Err(ConfigError::UnexpectedWatchDist);
            }
            if options.import_path.is_some() || resolver.is_some() {
                return Err(ConfigError::UnexpectedImportPath);
            }
            let src_path = options.src_path.ok_or(ConfigError::MissingSrcPath)?;
            OutputMode::SamePackage { src_path }
        } else {
            if options.src_path.is_some() {
                return Err(ConfigError::UnexpectedSrcPath);
            }
            let watch_dist = options.watch_dist.ok_or(ConfigError::MissingWatchDist)?;
            let resolver = match (options.import_path, resolver) {
                (Some(_), Some(_)) => return Err(ConfigError::AmbiguousImportPath),
                (None, None) => return Err(ConfigError::MissingImportPath),
                (None, Some(resolver)) => resolver,
                (Some(template), None) => {
                    let template = ImportTemplate::parse(&template)?;
                    Arc::new(move |name: &str| Some(template.render(name))) as Arc<ResolveFn>
                }
            };
            OutputMode::CrossPackage {
                watch_dist,
                resolver,
            }
        };

        Ok(Self {
            root,
            glob,
            prefix: options.prefix,
            prefix_policy: options.prefix_policy,
            out_dir: options.out_dir,
            virtual_location: options.virtual_location,
            mode,
        })
    }

    pub fn is_same_package(&self) -> bool {
        matches!(self.mode, OutputMode::SamePackage { .. })
    }

    /// Metadata deriver for this configuration.
    pub fn deriver(&self) -> MetadataDeriver {
        let resolver = match &self.mode {
            OutputMode::SamePackage { src_path } => ImportResolver::SamePackage {
                root: self.root.clone(),
                src_root: src_path.clone(),
                virtual_location: self.virtual_location.clone(),
            },
            OutputMode::CrossPackage { resolver, .. } => ImportResolver::CrossPackage(Arc::clone(resolver)),
        };
        MetadataDeriver::new(self.prefix.clone(), self.prefix_policy, resolver)
    }

    /// Where declarations are written, with paths anchored at the root.
    pub fn declaration_target(&self) -> DeclarationTarget {
        DeclarationTarget {
            out_dir: self.root.join(&self.out_dir),
            virtual_location: self.root.join(&self.virtual_location),
            same_package: self.is_same_package(),
        }
    }

    /// Absolute source root, same-package mode only.
    pub fn source_root(&self) -> Option<PathBuf> {
        match &self.mode {
            OutputMode::SamePackage { src_path } => Some(self.root.join(src_path)),
            OutputMode::CrossPackage { .. } => None,
        }
    }

    /// Directory containing the virtual module.
    pub fn virtual_dir(&self) -> PathBuf {
        self.root
            .join(&self.virtual_location)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone())
    }

    /// Paths whose changes should trigger a rebuild.
    pub fn watch_paths(&self) -> Vec<PathBuf> {
        match &self.mode {
            OutputMode::SamePackage { .. } => vec![self.root.join(self.glob.base())],
            OutputMode::CrossPackage { watch_dist, .. } => vec![self.root.join(watch_dist)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn options(json: &str) -> PluginOptions {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn applies_defaults() {
        let opts = options(r#"{ "glob": "src/**/*.ts", "same_package": true, "src_path": "src" }"#);

        assert_eq!(opts.out_dir, PathBuf::from("./dist"));
        assert_eq!(opts.virtual_location, PathBuf::from("src/react/index.ts"));
        assert_eq!(opts.prefix_policy, PrefixPolicy::Strict);
    }

    #[test]
    fn reads_prefix_policy() {
        let opts = options(
            r#"{ "glob": "src/**/*.ts", "prefix_policy": "pass-through", "same_package": true, "src_path": "src" }"#,
        );
        assert_eq!(opts.prefix_policy, PrefixPolicy::PassThrough);
    }

    #[test]
    fn rejects_unknown_fields() {
        let result: Result<PluginOptions, _> =
            serde_json::from_str(r#"{ "glob": "src/**/*.ts", "outPath": "dist" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn builds_same_package_config() {
        let opts = options(r#"{ "glob": "src/**/*.ts", "same_package": true, "src_path": "src" }"#);
        let config = PluginConfig::from_options("/repo", opts).unwrap();

        assert!(config.is_same_package());
        assert_eq!(config.source_root(), Some(PathBuf::from("/repo/src")));
        assert_eq!(config.virtual_dir(), PathBuf::from("/repo/src/react"));
        assert_eq!(config.watch_paths(), vec![PathBuf::from("/repo/src")]);
        assert_eq!(
            config.declaration_target().output_path(),
            PathBuf::from("/repo/dist/index.d.ts")
        );
    }

    #[test]
    fn requires_mode_specific_fields() {
        let same = options(r#"{ "glob": "src/**/*.ts", "same_package": true }"#);
        assert!(matches!(
            PluginConfig::from_options("/repo", same),
            Err(ConfigError::MissingSrcPath)
        ));

        let cross = options(r#"{ "glob": "src/**/*.ts", "import_path": "@acme/{kebab}" }"#);
        assert!(matches!(
            PluginConfig::from_options("/repo", cross),
            Err(ConfigError::MissingWatchDist)
        ));
    }

    #[test]
    fn rejects_fields_from_the_other_mode() {
        let same = options(
            r#"{ "glob": "src/**/*.ts", "same_package": true, "src_path": "src", "watch_dist": "dist" }"#,
        );
        assert!(matches!(
            PluginConfig::from_options("/repo", same),
            Err(ConfigError::UnexpectedWatchDist)
        ));

        let cross = options(
            r#"{ "glob": "src/**/*.ts", "src_path": "src", "watch_dist": "dist", "import_path": "x" }"#,
        );
        assert!(matches!(
            PluginConfig::from_options("/repo", cross),
            Err(ConfigError::UnexpectedSrcPath)
        ));
    }

    #[test]
    fn cross_package_needs_exactly_one_resolver() {
        let bare = options(r#"{ "glob": "src/**/*.ts", "watch_dist": "../lib/dist" }"#);
        assert!(matches!(
            PluginConfig::from_options("/repo", bare.clone()),
            Err(ConfigError::MissingImportPath)
        ));

        let both = options(
            r#"{ "glob": "src/**/*.ts", "watch_dist": "../lib/dist", "import_path": "../lib/{lower}" }"#,
        );
        assert!(matches!(
            PluginConfig::with_resolver("/repo", both, |_| None),
            Err(ConfigError::AmbiguousImportPath)
        ));

        let config = PluginConfig::with_resolver("/repo", bare, |name| Some(name.to_string())).unwrap();
        assert_eq!(config.watch_paths(), vec![PathBuf::from("/repo/../lib/dist")]);
    }

    #[test]
    fn renders_import_templates() {
        let template = ImportTemplate::parse("@acme/{kebab}/{lower}/{name}").unwrap();
        assert_eq!(template.render("IconButton"), "@acme/icon-button/iconbutton/IconButton");
    }

    #[test]
    fn rejects_bad_templates() {
        assert!(matches!(
            ImportTemplate::parse("../lib/{tag}"),
            Err(ConfigError::InvalidTemplate { .. })
        ));
        assert!(matches!(
            ImportTemplate::parse("../lib/{lower"),
            Err(ConfigError::InvalidTemplate { .. })
        ));
        assert!(matches!(
            ImportTemplate::parse("  "),
            Err(ConfigError::InvalidTemplate { .. })
        ));
    }

    #[test]
    fn anchors_relative_root_at_current_directory() {
        let opts = options(r#"{ "glob": "src/**/*.ts", "same_package": true, "src_path": "src", "out_dir": "../types" }"#);
        let config = PluginConfig::from_options("packages/ui", opts).unwrap();

        let cwd = std::env::current_dir().unwrap();
        assert!(config.root.is_absolute());
        assert_eq!(config.root, cwd.join("packages/ui"));
        assert_eq!(
            config.declaration_target().specifier("../button/button"),
            "../ui/src/button/button"
        );
    }

    #[test]
    fn rejects_empty_root() {
        let opts = options(r#"{ "glob": "src/**/*.ts", "same_package": true, "src_path": "src" }"#);
        assert!(matches!(
            PluginConfig::from_options("", opts),
            Err(ConfigError::InvalidRoot { .. })
        ));
    }

    #[test]
    fn rejects_invalid_glob() {
        let opts = options(r#"{ "glob": "src/**/[.ts", "same_package": true, "src_path": "src" }"#);
        assert!(matches!(
            PluginConfig::from_options("/repo", opts),
            Err(ConfigError::InvalidGlob(_))
        ));
    }
}
