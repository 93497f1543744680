//! Per-build state shared between `load` and `close_bundle`.

use facade_react::WrapperMetadata;

/// Output of one successful `load`.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedBuild {
    pub wrappers: Vec<WrapperMetadata>,

    /// Generated wrapper module source
    pub wrapper: String,
}

/// Build state owned by the host and threaded through the lifecycle.
///
/// `load` replaces the cached build; `close_bundle` takes it.
#[derive(Debug, Default)]
pub struct BuildContext {
    cached: Option<CachedBuild>,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, build: CachedBuild) {
        if self.cached.replace(build).is_some() {
            tracing::debug!("Replacing cached build");
        }
    }

    pub fn get(&self) -> Option<&CachedBuild> {
        self.cached.as_ref()
    }

    pub fn take(&mut self) -> Option<CachedBuild> {
        self.cached.take()
    }

    pub fn is_empty(&self) -> bool {
        self.cached.is_none()
    }
}
