//! Import statement planning shared by both emitters.

use std::collections::HashSet;

use facade_manifest::ExportKind;

use crate::metadata::WrapperMetadata;
use crate::wrapper::MODULE_BINDINGS;

/// Whether imports bind values or only types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStyle {
    Value,
    Type,
}

/// The imports taken from one module specifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportGroup {
    pub specifier: String,

    /// Local binding of the module's default export
    pub default: Option<String>,

    /// `(exported class name, local binding)`
    pub named: Vec<(String, String)>,
}

/// Import statements in first-use order, one group per distinct specifier.
#[derive(Debug, Clone, Default)]
pub struct ImportTable {
    groups: Vec<ImportGroup>,

    /// Local class binding for each wrapper, parallel to the metadata slice;
    /// `None` for classes that are not exported
    locals: Vec<Option<String>>,
}

impl ImportTable {
    /// Plan imports for `wrappers`, mapping each import path through `specifier`.
    ///
    /// Class bindings that would shadow a wrapper export, a module helper or
    /// another class are aliased with an `Element` suffix, then a counter.
    pub fn plan(wrappers: &[WrapperMetadata], specifier: impl Fn(&str) -> String) -> Self {
        let reserved: HashSet<&str> = wrappers
            .iter()
            .map(|w| w.wrapper_name.as_str())
            .chain(MODULE_BINDINGS.iter().copied())
            .collect();

        let mut table = Self::default();
        let mut taken: HashSet<String> = HashSet::new();

        for wrapper in wrappers {
            let module = specifier(&wrapper.import_path);

            let index = match table.groups.iter().position(|g| g.specifier == module) {
                Some(index) => index,
                None => {
                    table.groups.push(ImportGroup {
                        specifier: module,
                        default: None,
                        named: Vec::new(),
                    });
                    table.groups.len() - 1
                }
            };
            let group = &mut table.groups[index];

            let local = match wrapper.export_kind {
                ExportKind::Named => {
                    let existing = group
                        .named
                        .iter()
                        .find(|(class, _)| *class == wrapper.class_name)
                        .map(|(_, local)| local.clone());
                    Some(existing.unwrap_or_else(|| {
                        let local = unique_local(&wrapper.class_name, &reserved, &taken);
                        taken.insert(local.clone());
                        group.named.push((wrapper.class_name.clone(), local.clone()));
                        local
                    }))
                }
                ExportKind::Default => Some(group.default.clone().unwrap_or_else(|| {
                    let local = unique_local(&wrapper.class_name, &reserved, &taken);
                    taken.insert(local.clone());
                    group.default = Some(local.clone());
                    local
                })),
                ExportKind::None => None,
            };

            table.locals.push(local);
        }

        table
    }

    pub fn groups(&self) -> &[ImportGroup] {
        &self.groups
    }

    /// Local binding of the element class for the wrapper at `index`.
    pub fn local(&self, index: usize) -> Option<&str> {
        self.locals[index].as_deref()
    }

    /// Element type for the wrapper at `index`; `HTMLElement` when the class
    /// is not importable.
    pub fn element_type(&self, index: usize) -> &str {
        self.local(index).unwrap_or("HTMLElement")
    }

    /// Render the import statements.
    ///
    /// Modules with no importable class get a bare `import "..."` in value
    /// style so they still register their elements, and nothing in type style.
    pub fn render(&self, style: ImportStyle) -> String {
        let keyword = match style {
            ImportStyle::Value => "import",
            ImportStyle::Type => "import type",
        };

        let mut out = String::new();
        for group in &self.groups {
            let specifier = escape_string(&group.specifier);

            if let Some(local) = &group.default {
                out.push_str(&format!("{} {} from \"{}\";\n", keyword, local, specifier));
            }

            if !group.named.is_empty() {
                let names: Vec<String> = group
                    .named
                    .iter()
                    .map(|(class, local)| {
                        if class == local {
                            class.clone()
                        } else {
                            format!("{} as {}", class, local)
                        }
                    })
                    .collect();
                out.push_str(&format!(
                    "{} {{ {} }} from \"{}\";\n",
                    keyword,
                    names.join(", "),
                    specifier
                ));
            }

            if group.default.is_none() && group.named.is_empty() && style == ImportStyle::Value {
                out.push_str(&format!("import \"{}\";\n", specifier));
            }
        }
        out
    }
}

fn unique_local(class: &str, reserved: &HashSet<&str>, taken: &HashSet<String>) -> String {
    let free = |name: &str| !reserved.contains(name) && !taken.contains(name);

    if free(class) {
        return class.to_string();
    }
    let aliased = format!("{}Element", class);
    if free(&aliased) {
        return aliased;
    }
    (2..)
        .map(|n| format!("{}Element{}", class, n))
        .find(|name| free(name))
        .unwrap_or(aliased)
}

/// Escape a string for a double-quoted TypeScript literal.
pub fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
