//! Type declarations for the wrapper module.

use std::path::{Path, PathBuf};

use crate::imports::{ImportStyle, ImportTable};
use crate::metadata::WrapperMetadata;
use crate::paths::{normalize, relative_specifier};
use crate::props::{render_doc, render_props_type};
use crate::wrapper::GENERATED_HEADER;

/// Where the declaration file goes and how its imports are rooted.
#[derive(Debug, Clone)]
pub struct DeclarationTarget {
    /// Directory the `.d.ts` file is written to
    pub out_dir: PathBuf,

    /// Declared location of the virtual wrapper module (e.g. `src/react/index.ts`)
    pub virtual_location: PathBuf,

    /// Import paths are relative to the virtual module and must be re-rooted
    pub same_package: bool,
}

impl DeclarationTarget {
    /// `<out_dir>/<virtual module stem>.d.ts`
    pub fn output_path(&self) -> PathBuf {
        let stem = self
            .virtual_location
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("index");
        self.out_dir.join(format!("{}.d.ts", stem))
    }

    /// Import specifier as seen from the declaration file.
    ///
    /// `out_dir` and `virtual_location` should share an absolute base. When
    /// the path cannot be re-rooted the import is kept verbatim.
    pub fn specifier(&self, import_path: &str) -> String {
        if !self.same_package || !import_path.starts_with('.') {
            return import_path.to_string();
        }
        let virtual_dir = self.virtual_location.parent().unwrap_or(Path::new(""));
        let target = normalize(&virtual_dir.join(import_path));
        match relative_specifier(&self.out_dir, &target) {
            Some(specifier) => specifier,
            None => {
                tracing::warn!(
                    "Cannot re-root {} from {}; keeping it as written",
                    import_path,
                    self.out_dir.display()
                );
                import_path.to_string()
            }
        }
    }
}

/// Errors that can occur while writing declarations.
#[derive(Debug, thiserror::Error)]
pub enum DeclarationError {
    #[error("Failed to write declarations to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Render the declaration module for `wrappers`.
pub fn emit_declarations(wrappers: &[WrapperMetadata], target: &DeclarationTarget) -> String {
    let imports = ImportTable::plan(wrappers, |path| target.specifier(path));

    let mut out = String::from(GENERATED_HEADER);
    out.push_str("import type * as React from \"react\";\n");
    out.push_str(&imports.render(ImportStyle::Type));

    for (index, wrapper) in wrappers.iter().enumerate() {
        out.push('\n');
        out.push_str(&render_doc(wrapper));
        out.push_str(&render_props_type(wrapper));
        out.push('\n');
        out.push_str(&render_doc(wrapper));
        out.push_str(&format!(
            "export declare const {}: React.ForwardRefExoticComponent<{} & React.RefAttributes<{}>>;\n",
            wrapper.wrapper_name,
            wrapper.props_type_name(),
            imports.element_type(index)
        ));
    }

    out
}

/// Write the declaration file, returning its path.
///
/// Identical content already on disk is left untouched.
pub async fn write_declarations(
    wrappers: &[WrapperMetadata],
    target: &DeclarationTarget,
) -> Result<PathBuf, DeclarationError> {
    let path = target.output_path();
    let content = emit_declarations(wrappers, target);

    let write_error = |source| DeclarationError::Write {
        path: path.clone(),
        source,
    };

    if let Ok(existing) = tokio::fs::read_to_string(&path).await {
        if existing == content {
            tracing::debug!("{} is up to date", path.display());
            return Ok(path);
        }
    }

    tokio::fs::create_dir_all(&target.out_dir)
        .await
        .map_err(write_error)?;
    tokio::fs::write(&path, content).await.map_err(write_error)?;

    tracing::info!("Wrote declarations for {} wrappers to {}", wrappers.len(), path.display());

    Ok(path)
}
