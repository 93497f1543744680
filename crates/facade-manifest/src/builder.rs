//! Manifest builder.
//!
//! Parses each scanned file with oxc and turns every registered custom
//! element into a [`ComponentDescriptor`]. Files without a registration are
//! skipped; a tag registered twice fails the whole build.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use oxc_allocator::Allocator;
use oxc_parser::Parser;
use oxc_span::SourceType;

use crate::extract::{extract_module, ClassSurface};
use crate::types::{ComponentDescriptor, ComponentManifest, EventDescriptor};

/// Errors that can occur while building a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid tag name <{tag}> in {}: custom element names must contain a hyphen", path.display())]
    InvalidTagName { tag: String, path: PathBuf },

    #[error("Tag <{tag}> is registered twice: {} and {}", first.display(), second.display())]
    Conflict {
        tag: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// Builds a [`ComponentManifest`] from component source files.
#[derive(Debug, Default)]
pub struct ManifestBuilder;

impl ManifestBuilder {
    /// Create a new manifest builder.
    pub fn new() -> Self {
        Self
    }

    /// Build a manifest from files in scan order.
    pub fn build(&self, paths: &[PathBuf]) -> Result<ComponentManifest, ManifestError> {
        let mut manifest = ComponentManifest::default();
        let mut seen: HashMap<String, PathBuf> = HashMap::new();

        for path in paths {
            let source = fs::read_to_string(path).map_err(|source| ManifestError::Read {
                path: path.clone(),
                source,
            })?;

            let descriptors = self.build_source(path, &source)?;
            if descriptors.is_empty() {
                tracing::debug!("No custom element registered in {}", path.display());
                continue;
            }

            for descriptor in descriptors {
                if let Some(first) = seen.get(&descriptor.tag_name) {
                    return Err(ManifestError::Conflict {
                        tag: descriptor.tag_name,
                        first: first.clone(),
                        second: path.clone(),
                    });
                }
                seen.insert(descriptor.tag_name.clone(), path.clone());
                manifest.components.push(descriptor);
            }
        }

        tracing::info!(
            "Found {} custom elements in {} files",
            manifest.len(),
            paths.len()
        );

        Ok(manifest)
    }

    /// Extract the descriptors declared by a single source file.
    pub fn build_source(
        &self,
        path: &Path,
        source: &str,
    ) -> Result<Vec<ComponentDescriptor>, ManifestError> {
        let allocator = Allocator::default();
        let source_type = SourceType::from_path(path).unwrap_or(SourceType::ts());
        let ret = Parser::new(&allocator, source, source_type).parse();

        if ret.panicked {
            let message = ret
                .errors
                .first()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unrecoverable syntax error".to_string());
            return Err(ManifestError::Parse {
                path: path.to_path_buf(),
                message,
            });
        }

        for error in &ret.errors {
            tracing::warn!("{}: {}", path.display(), error);
        }

        let surface = extract_module(source, &ret.program);

        // Decorator registrations first, then define() calls, in source order
        let mut registrations: Vec<(String, String)> = surface
            .classes
            .iter()
            .filter_map(|c| c.decorator_tag.clone().map(|tag| (tag, c.name.clone())))
            .collect();
        for registration in surface.registrations {
            if !registrations.contains(&registration) {
                registrations.push(registration);
            }
        }

        let mut descriptors: Vec<ComponentDescriptor> = Vec::new();

        for (tag, class_name) in registrations {
            if !tag.contains('-') {
                return Err(ManifestError::InvalidTagName {
                    tag,
                    path: path.to_path_buf(),
                });
            }
            if descriptors.iter().any(|d| d.tag_name == tag) {
                return Err(ManifestError::Conflict {
                    tag,
                    first: path.to_path_buf(),
                    second: path.to_path_buf(),
                });
            }

            let Some(class) = surface.classes.iter().find(|c| c.name == class_name) else {
                tracing::debug!(
                    "{}: <{}> registers {} which is not declared here",
                    path.display(),
                    tag,
                    class_name
                );
                continue;
            };

            descriptors.push(describe(tag, class, path));
        }

        Ok(descriptors)
    }
}

fn describe(tag_name: String, class: &ClassSurface, path: &Path) -> ComponentDescriptor {
    let mut events: Vec<EventDescriptor> = Vec::new();

    let sightings = class
        .doc
        .events
        .iter()
        .cloned()
        .chain(class.static_events.iter().map(|name| (name.clone(), None)))
        .chain(class.dispatched_events.iter().cloned());

    for (name, detail_type) in sightings {
        match events.iter_mut().find(|e| e.name == name) {
            Some(existing) => {
                if existing.detail_type.is_none() {
                    existing.detail_type = detail_type;
                }
            }
            None => events.push(EventDescriptor { name, detail_type }),
        }
    }

    let mut slots: Vec<String> = class.doc.slots.clone();
    for slot in &class.template_slots {
        if !slots.contains(slot) {
            slots.push(slot.clone());
        }
    }

    ComponentDescriptor {
        tag_name,
        class_name: class.name.clone(),
        export_kind: class.export_kind,
        source_module_path: path.to_path_buf(),
        properties: class.properties.clone(),
        events,
        slots,
        description: class.doc.description.clone(),
    }
}
