//! React bindings for custom elements.
//!
//! Turns a [`facade_manifest::ComponentManifest`] into wrapper metadata, then
//! renders that metadata into a TypeScript wrapper module and a matching
//! `.d.ts` declaration file.

pub mod declarations;
pub mod imports;
pub mod metadata;
pub mod naming;
pub mod paths;
pub mod props;
pub mod wrapper;

pub use declarations::{emit_declarations, write_declarations, DeclarationError, DeclarationTarget};
pub use metadata::{
    EventBinding, ImportResolver, MetadataDeriver, MetadataError, PrefixPolicy, WrapperMetadata,
};
pub use wrapper::emit_wrapper;
