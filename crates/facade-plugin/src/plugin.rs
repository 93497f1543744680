//! Plugin lifecycle.

use std::path::{Path, PathBuf};

use facade_manifest::{ComponentManifest, ManifestBuilder, ManifestError, ScanError};
use facade_react::paths::{is_within, normalize};
use facade_react::{emit_wrapper, write_declarations, DeclarationError, MetadataDeriver, MetadataError};

use crate::config::{OutputMode, PluginConfig};
use crate::context::{BuildContext, CachedBuild};

/// Module id application code imports the wrappers from.
pub const VIRTUAL_MODULE_ID: &str = "virtual:web-components-react-bindings";

/// Resolved form of [`VIRTUAL_MODULE_ID`]; the leading NUL keeps other
/// plugins from treating it as a file.
pub const RESOLVED_VIRTUAL_MODULE_ID: &str = "\0virtual:web-components-react-bindings";

/// Result of stripping types from the generated module.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput {
    pub code: String,

    /// Source map as JSON, when the transform produced one
    pub map: Option<String>,
}

/// Errors reported by a [`SourceTransform`].
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("Failed to strip types: {0}")]
    Strip(String),
}

/// Type-stripping transform supplied by the host.
pub trait SourceTransform {
    fn transform(&self, source: &str, id: &str) -> Result<TransformOutput, TransformError>;
}

/// Returns the TypeScript untouched, for hosts that compile it themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTransform;

impl SourceTransform for PassthroughTransform {
    fn transform(&self, source: &str, _id: &str) -> Result<TransformOutput, TransformError> {
        Ok(TransformOutput {
            code: source.to_string(),
            map: None,
        })
    }
}

/// Host services available during `transform`.
pub trait HostContext {
    /// Rebuild the virtual module when `path` changes.
    fn add_watch_file(&mut self, path: &Path);
}

/// Errors surfaced by lifecycle calls.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    #[error("Failed to transform {id}: {source}")]
    Transform {
        id: String,
        #[source]
        source: TransformError,
    },
}

/// Generates the virtual wrapper module and its declarations.
#[derive(Debug)]
pub struct WrapperPlugin {
    config: PluginConfig,
    builder: ManifestBuilder,
    deriver: MetadataDeriver,
}

impl WrapperPlugin {
    pub const NAME: &'static str = "facade-react-wrappers";

    pub fn new(config: PluginConfig) -> Self {
        let deriver = config.deriver();
        Self {
            config,
            builder: ManifestBuilder::new(),
            deriver,
        }
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// Resolve the virtual module id.
    ///
    /// In same-package mode, relative ids are resolved against the virtual
    /// module's directory and, when they land inside the source root,
    /// returned as absolute `.ts` paths.
    pub fn resolve_id(&self, id: &str) -> Option<String> {
        if id == VIRTUAL_MODULE_ID {
            return Some(RESOLVED_VIRTUAL_MODULE_ID.to_string());
        }

        let src_root = self.config.source_root()?;
        if !id.starts_with('.') {
            return None;
        }

        let resolved = normalize(&self.config.virtual_dir().join(id));
        if !is_within(&resolved, &src_root) {
            return None;
        }

        let has_extension = matches!(
            resolved.extension().and_then(|e| e.to_str()),
            Some("ts" | "tsx")
        );
        let file = if has_extension {
            resolved
        } else {
            let mut path = resolved.into_os_string();
            path.push(".ts");
            PathBuf::from(path)
        };

        tracing::debug!("Resolved {} to {}", id, file.display());
        Some(file.to_string_lossy().into_owned())
    }

    /// Scan the component glob and build its manifest.
    pub fn manifest(&self) -> Result<ComponentManifest, PluginError> {
        let files = self.config.glob.scan(&self.config.root)?;
        Ok(self.builder.build(&files)?)
    }

    /// Generate the wrapper module for the virtual id.
    ///
    /// Runs the whole pipeline from scratch and caches the result in
    /// `context` for [`WrapperPlugin::close_bundle`]. Any error leaves the
    /// context untouched.
    pub fn load(&self, id: &str, context: &mut BuildContext) -> Result<Option<String>, PluginError> {
        if id != RESOLVED_VIRTUAL_MODULE_ID {
            return Ok(None);
        }

        let manifest = self.manifest()?;
        let wrappers = self.deriver.derive(&manifest)?;
        let wrapper = emit_wrapper(&wrappers);

        tracing::info!("Generated {} React wrappers", wrappers.len());

        context.store(CachedBuild {
            wrappers,
            wrapper: wrapper.clone(),
        });

        Ok(Some(wrapper))
    }

    /// Strip types from the generated module through the host's transform.
    pub fn transform(
        &self,
        source: &str,
        id: &str,
        transformer: &dyn SourceTransform,
        host: &mut dyn HostContext,
    ) -> Result<Option<TransformOutput>, PluginError> {
        if id != RESOLVED_VIRTUAL_MODULE_ID {
            return Ok(None);
        }

        if let OutputMode::CrossPackage { watch_dist, .. } = &self.config.mode {
            host.add_watch_file(&self.config.root.join(watch_dist));
        }

        transformer
            .transform(source, id)
            .map(Some)
            .map_err(|source| PluginError::Transform {
                id: id.to_string(),
                source,
            })
    }

    /// Write declarations for the build cached by the last `load`.
    ///
    /// Returns `None` when nothing was loaded in this build.
    pub async fn close_bundle(&self, context: &mut BuildContext) -> Result<Option<PathBuf>, PluginError> {
        let Some(build) = context.take() else {
            tracing::info!("Wrapper module was not loaded in this build, skipping declarations");
            return Ok(None);
        };

        let path = write_declarations(&build.wrappers, &self.config.declaration_target()).await?;
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PluginOptions;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct RecordingHost {
        watched: Vec<PathBuf>,
    }

    impl HostContext for RecordingHost {
        fn add_watch_file(&mut self, path: &Path) {
            self.watched.push(path.to_path_buf());
        }
    }

    struct FailingTransform;

    impl SourceTransform for FailingTransform {
        fn transform(&self, _source: &str, _id: &str) -> Result<TransformOutput, TransformError> {
            Err(TransformError::Strip("unexpected token".to_string()))
        }
    }

    fn same_package() -> WrapperPlugin {
        let options: PluginOptions = serde_json::from_str(
            r#"{ "glob": "src/**/*.ts", "prefix": "custom-", "same_package": true, "src_path": "src" }"#,
        )
        .unwrap();
        WrapperPlugin::new(PluginConfig::from_options("/repo", options).unwrap())
    }

    fn cross_package() -> WrapperPlugin {
        let options: PluginOptions = serde_json::from_str(
            r#"{ "glob": "../lib/src/**/*.ts", "prefix": "custom-", "watch_dist": "../lib/dist", "import_path": "../lib/{lower}" }"#,
        )
        .unwrap();
        WrapperPlugin::new(PluginConfig::from_options("/app", options).unwrap())
    }

    #[test]
    fn resolves_virtual_module() {
        assert_eq!(
            same_package().resolve_id(VIRTUAL_MODULE_ID).as_deref(),
            Some(RESOLVED_VIRTUAL_MODULE_ID)
        );
        assert_eq!(same_package().resolve_id("react"), None);
    }

    #[test]
    fn resolves_relative_ids_into_source_root() {
        let plugin = same_package();

        assert_eq!(
            plugin.resolve_id("../button/button").as_deref(),
            Some("/repo/src/button/button.ts")
        );
        assert_eq!(
            plugin.resolve_id("../button/button.element").as_deref(),
            Some("/repo/src/button/button.element.ts")
        );
        assert_eq!(plugin.resolve_id("../../lib/button"), None);
    }

    #[test]
    fn leaves_relative_ids_alone_across_packages() {
        assert_eq!(cross_package().resolve_id("../lib/button"), None);
    }

    #[test]
    fn load_ignores_other_ids() {
        let mut context = BuildContext::new();
        assert!(same_package().load("src/main.ts", &mut context).unwrap().is_none());
        assert!(context.is_empty());
    }

    #[test]
    fn transform_registers_dist_watch_across_packages() {
        let mut host = RecordingHost::default();

        let output = cross_package()
            .transform("export {};", RESOLVED_VIRTUAL_MODULE_ID, &PassthroughTransform, &mut host)
            .unwrap();

        assert_eq!(output.map(|o| o.code).as_deref(), Some("export {};"));
        assert_eq!(host.watched, vec![PathBuf::from("/app/../lib/dist")]);
    }

    #[test]
    fn transform_skips_watch_in_same_package() {
        let mut host = RecordingHost::default();

        same_package()
            .transform("export {};", RESOLVED_VIRTUAL_MODULE_ID, &PassthroughTransform, &mut host)
            .unwrap();

        assert!(host.watched.is_empty());
    }

    #[test]
    fn transform_ignores_other_ids() {
        let mut host = RecordingHost::default();
        let output = cross_package()
            .transform("export {};", "src/main.ts", &PassthroughTransform, &mut host)
            .unwrap();

        assert!(output.is_none());
        assert!(host.watched.is_empty());
    }

    #[test]
    fn transform_surfaces_host_errors() {
        let mut host = RecordingHost::default();
        let result = same_package().transform("export {", RESOLVED_VIRTUAL_MODULE_ID, &FailingTransform, &mut host);

        assert!(matches!(result, Err(PluginError::Transform { .. })));
    }

    #[tokio::test]
    async fn close_bundle_without_load_is_a_no_op() {
        let mut context = BuildContext::new();
        let result = same_package().close_bundle(&mut context).await.unwrap();
        assert!(result.is_none());
    }
}
