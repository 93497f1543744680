//! Wrapper metadata derivation.
//!
//! Combines the manifest with naming and import-path configuration. The
//! resulting [`WrapperMetadata`] is everything the emitters need; no path
//! resolution happens past this point.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use facade_manifest::{ComponentDescriptor, ComponentManifest, ExportKind, PropertyDescriptor};
use serde::Deserialize;

use crate::naming::{handler_name, is_component_name, to_pascal_case};
use crate::paths::{is_within, normalize, relative_specifier, strip_extension};

/// What to do with a tag that does not start with the configured prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrefixPolicy {
    /// Fail the build
    #[default]
    Strict,

    /// Derive the wrapper name from the full tag
    PassThrough,
}

/// Caller-supplied import path lookup, called with the wrapper name.
pub type ResolveFn = dyn Fn(&str) -> Option<String> + Send + Sync;

/// How wrapper import paths are produced.
#[derive(Clone)]
pub enum ImportResolver {
    /// Wrappers live next to the scanned sources; paths are computed
    /// relative to the virtual module's declared location.
    SamePackage {
        /// Base for relative source and virtual-module paths
        root: PathBuf,
        src_root: PathBuf,
        virtual_location: PathBuf,
    },

    /// Wrappers consume a published build; paths come from the callback.
    CrossPackage(Arc<ResolveFn>),
}

impl ImportResolver {
    /// Build a cross-package resolver from a closure.
    pub fn cross_package<F>(resolve: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self::CrossPackage(Arc::new(resolve))
    }

    fn resolve(&self, descriptor: &ComponentDescriptor, wrapper_name: &str) -> Result<String, MetadataError> {
        match self {
            Self::SamePackage {
                root,
                src_root,
                virtual_location,
            } => {
                let source = normalize(&root.join(&descriptor.source_module_path));
                if !is_within(&source, &root.join(src_root)) {
                    tracing::warn!(
                        "<{}> is declared outside the source root: {}",
                        descriptor.tag_name,
                        source.display()
                    );
                }
                let virtual_dir = root
                    .join(virtual_location)
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.clone());
                relative_specifier(&virtual_dir, &strip_extension(&source)).ok_or_else(|| {
                    MetadataError::UnresolvedImport {
                        tag: descriptor.tag_name.clone(),
                    }
                })
            }
            Self::CrossPackage(resolve) => match resolve(wrapper_name) {
                Some(path) if !path.trim().is_empty() => Ok(path),
                _ => Err(MetadataError::UnresolvedImport {
                    tag: descriptor.tag_name.clone(),
                }),
            },
        }
    }
}

impl fmt::Debug for ImportResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SamePackage {
                root,
                src_root,
                virtual_location,
            } => f
                .debug_struct("SamePackage")
                .field("root", root)
                .field("src_root", src_root)
                .field("virtual_location", virtual_location)
                .finish(),
            Self::CrossPackage(_) => f.write_str("CrossPackage(..)"),
        }
    }
}

/// Everything needed to render one React wrapper.
#[derive(Debug, Clone, PartialEq)]
pub struct WrapperMetadata {
    /// Exported component name (e.g. "Button")
    pub wrapper_name: String,

    pub tag_name: String,

    /// Element class defined by `import_path`
    pub class_name: String,

    /// Whether the class is imported by name, as the default export, or not at all
    pub export_kind: ExportKind,

    /// Module specifier the class is imported from
    pub import_path: String,

    pub properties: Vec<PropertyDescriptor>,

    pub events: Vec<EventBinding>,

    pub slots: Vec<String>,

    pub description: Option<String>,
}

impl WrapperMetadata {
    /// Name of the generated props type.
    pub fn props_type_name(&self) -> String {
        format!("{}Props", self.wrapper_name)
    }
}

/// An event together with its React handler prop.
#[derive(Debug, Clone, PartialEq)]
pub struct EventBinding {
    pub name: String,

    pub detail_type: Option<String>,

    /// Handler prop name (e.g. "onButtonClick")
    pub handler: String,
}

impl EventBinding {
    /// TypeScript type of the event object passed to the handler.
    pub fn event_type(&self) -> String {
        match &self.detail_type {
            Some(detail) => format!("CustomEvent<{}>", detail),
            None => "Event".to_string(),
        }
    }
}

/// Errors that can occur while deriving wrapper metadata.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Tag <{tag}> does not start with the configured prefix \"{prefix}\"")]
    PrefixMismatch { tag: String, prefix: String },

    #[error("No import path resolved for <{tag}>")]
    UnresolvedImport { tag: String },

    #[error("<{tag}> derives wrapper name {name}, which is not a valid component name")]
    InvalidWrapperName { tag: String, name: String },

    #[error("Wrapper name {name} is derived from both <{first}> and <{second}>")]
    DuplicateWrapperName {
        name: String,
        first: String,
        second: String,
    },

    #[error("{wrapper} declares {name} more than once")]
    PropConflict { wrapper: String, name: String },
}

/// Derives [`WrapperMetadata`] from a manifest.
#[derive(Debug, Clone)]
pub struct MetadataDeriver {
    prefix: String,
    policy: PrefixPolicy,
    resolver: ImportResolver,
}

impl MetadataDeriver {
    /// Create a deriver for one pipeline instance.
    pub fn new(prefix: impl Into<String>, policy: PrefixPolicy, resolver: ImportResolver) -> Self {
        Self {
            prefix: prefix.into(),
            policy,
            resolver,
        }
    }

    /// Derive one metadata record per descriptor, in manifest order.
    pub fn derive(&self, manifest: &ComponentManifest) -> Result<Vec<WrapperMetadata>, MetadataError> {
        let mut wrappers: Vec<WrapperMetadata> = Vec::with_capacity(manifest.len());

        for descriptor in manifest.iter() {
            let wrapper_name = self.wrapper_name(&descriptor.tag_name)?;

            if let Some(existing) = wrappers.iter().find(|w| w.wrapper_name == wrapper_name) {
                return Err(MetadataError::DuplicateWrapperName {
                    name: wrapper_name,
                    first: existing.tag_name.clone(),
                    second: descriptor.tag_name.clone(),
                });
            }

            let import_path = self.resolver.resolve(descriptor, &wrapper_name)?;
            let events = bind_events(descriptor, &wrapper_name)?;

            tracing::debug!("<{}> -> {} from {}", descriptor.tag_name, wrapper_name, import_path);

            wrappers.push(WrapperMetadata {
                wrapper_name,
                tag_name: descriptor.tag_name.clone(),
                class_name: descriptor.class_name.clone(),
                export_kind: descriptor.export_kind,
                import_path,
                properties: descriptor.properties.clone(),
                events,
                slots: descriptor.slots.clone(),
                description: descriptor.description.clone(),
            });
        }

        Ok(wrappers)
    }

    /// Strip the prefix from `tag` and convert the rest to PascalCase.
    pub fn wrapper_name(&self, tag: &str) -> Result<String, MetadataError> {
        let mismatch = || MetadataError::PrefixMismatch {
            tag: tag.to_string(),
            prefix: self.prefix.clone(),
        };

        let stem = match tag.strip_prefix(self.prefix.as_str()) {
            Some("") => return Err(mismatch()),
            Some(rest) => rest,
            None => match self.policy {
                PrefixPolicy::Strict => return Err(mismatch()),
                PrefixPolicy::PassThrough => tag,
            },
        };

        let name = to_pascal_case(stem);
        if !is_component_name(&name) {
            return Err(MetadataError::InvalidWrapperName {
                tag: tag.to_string(),
                name,
            });
        }

        Ok(name)
    }
}

fn bind_events(descriptor: &ComponentDescriptor, wrapper_name: &str) -> Result<Vec<EventBinding>, MetadataError> {
    let mut bindings: Vec<EventBinding> = Vec::with_capacity(descriptor.events.len());

    for event in &descriptor.events {
        let handler = handler_name(&event.name);
        let taken = descriptor.properties.iter().any(|p| p.name == handler)
            || bindings.iter().any(|b| b.handler == handler);
        if taken {
            return Err(MetadataError::PropConflict {
                wrapper: wrapper_name.to_string(),
                name: handler,
            });
        }
        bindings.push(EventBinding {
            name: event.name.clone(),
            detail_type: event.detail_type.clone(),
            handler,
        });
    }

    Ok(bindings)
}
