//! Static manifest extraction for custom elements.
//!
//! Scans a glob of Lit-style TypeScript components and reads each element's
//! public surface (tag, properties, events, slots) straight from the syntax
//! tree. Nothing is ever executed.

pub mod builder;
pub mod extract;
pub mod jsdoc;
pub mod scan;
pub mod types;

pub use builder::{ManifestBuilder, ManifestError};
pub use scan::{scan, ScanError, SourceGlob};
pub use types::{
    ComponentDescriptor, ComponentManifest, EventDescriptor, ExportKind, PropertyDescriptor,
};
