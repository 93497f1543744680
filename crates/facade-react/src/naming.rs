//! Naming conventions between custom elements and React.

/// Convert kebab-case to PascalCase.
///
/// Each `-`-separated segment gets its first character upper-cased and is
/// appended unchanged otherwise: `icon-button` becomes `IconButton`.
pub fn to_pascal_case(s: &str) -> String {
    pascal_segments(s.split('-'))
}

/// React handler prop for an event: `button-click` becomes `onButtonClick`.
pub fn handler_name(event: &str) -> String {
    format!("on{}", pascal_segments(event.split(['-', '_', ':', '.'])))
}

/// Convert PascalCase to kebab-case: `IconButton` becomes `icon-button`.
pub fn to_kebab_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Whether `name` can be exported as a component from the wrapper module.
pub fn is_component_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn pascal_segments<'a>(segments: impl Iterator<Item = &'a str>) -> String {
    segments
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
