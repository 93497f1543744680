//! Manifest data model.

use std::path::PathBuf;

use serde::Serialize;

/// The structural description of every discovered custom element, in scan order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ComponentManifest {
    pub components: Vec<ComponentDescriptor>,
}

impl ComponentManifest {
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.components.iter()
    }

    /// Look up a descriptor by its registered tag.
    pub fn get(&self, tag_name: &str) -> Option<&ComponentDescriptor> {
        self.components.iter().find(|c| c.tag_name == tag_name)
    }
}

/// One registered custom element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDescriptor {
    /// Registered tag (always contains a hyphen)
    pub tag_name: String,

    /// Name of the class registered under the tag
    pub class_name: String,

    /// How the class is exported from its module
    pub export_kind: ExportKind,

    /// File the class was read from
    pub source_module_path: PathBuf,

    /// Public reactive properties, in declaration order
    pub properties: Vec<PropertyDescriptor>,

    /// Custom events the element dispatches
    pub events: Vec<EventDescriptor>,

    /// Slot names; the default slot is the empty string
    pub slots: Vec<String>,

    /// First paragraph of the class documentation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// How a component class can be imported from its module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportKind {
    /// `export class X` or `export { X }`
    Named,

    /// `export default class X` or `export { X as default }`
    Default,

    /// Not exported; the module registers the element as a side effect
    #[default]
    None,
}

/// A public property of a custom element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    pub name: String,

    /// Declared TypeScript type, as written in the source
    #[serde(rename = "type")]
    pub ty: String,

    pub required: bool,

    /// Initializer source text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,

    pub reflects_to_attribute: bool,

    /// Observed attribute name, `None` when the property has no attribute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl PropertyDescriptor {
    pub fn is_boolean(&self) -> bool {
        self.ty == "boolean"
    }
}

/// A custom event an element dispatches.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDescriptor {
    pub name: String,

    /// `CustomEvent` detail type; `None` for a plain `Event`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail_type: Option<String>,
}
