//! Build-tool lifecycle for generating React bindings to custom elements.
//!
//! [`WrapperPlugin`] serves a virtual module whose source is generated from
//! the component glob on every load, and writes the matching `.d.ts` file
//! when the bundle is finalized.

pub mod config;
pub mod context;
pub mod plugin;
pub mod watcher;

pub use config::{ConfigError, ImportTemplate, OutputMode, PluginConfig, PluginOptions};
pub use context::{BuildContext, CachedBuild};
pub use plugin::{
    HostContext, PassthroughTransform, PluginError, SourceTransform, TransformError,
    TransformOutput, WrapperPlugin, RESOLVED_VIRTUAL_MODULE_ID, VIRTUAL_MODULE_ID,
};
pub use watcher::{FileWatcher, WatchEvent};
