//! Props type rendering shared by the wrapper and declaration emitters.

use crate::imports::escape_string;
use crate::metadata::WrapperMetadata;

/// Render the doc comment placed above a wrapper's exported items.
pub fn render_doc(meta: &WrapperMetadata) -> String {
    let mut lines: Vec<String> = Vec::new();

    if let Some(description) = &meta.description {
        lines.push(description.replace("*/", "*\\/"));
        lines.push(String::new());
    }
    lines.push(format!("React wrapper for `<{}>`.", meta.tag_name));

    if !meta.slots.is_empty() {
        let slots: Vec<String> = meta
            .slots
            .iter()
            .map(|s| if s.is_empty() { "(default)".to_string() } else { s.clone() })
            .collect();
        lines.push(format!("Slots: {}", slots.join(", ")));
    }

    let mut out = String::from("/**\n");
    for line in lines {
        if line.is_empty() {
            out.push_str(" *\n");
        } else {
            out.push_str(&format!(" * {}\n", line));
        }
    }
    out.push_str(" */\n");
    out
}

/// Render `export type <Name>Props = ...;` for a wrapper.
pub fn render_props_type(meta: &WrapperMetadata) -> String {
    let own: Vec<&str> = meta
        .properties
        .iter()
        .map(|p| p.name.as_str())
        .chain(meta.events.iter().map(|e| e.handler.as_str()))
        .collect();

    let base = if own.is_empty() {
        "React.HTMLAttributes<HTMLElement>".to_string()
    } else {
        let keys: Vec<String> = own.iter().map(|k| format!("\"{}\"", escape_string(k))).collect();
        format!("Omit<React.HTMLAttributes<HTMLElement>, {}>", keys.join(" | "))
    };

    let mut out = format!("export type {} = {} & {{\n", meta.props_type_name(), base);

    for prop in &meta.properties {
        if let Some(default) = &prop.default_value {
            if !default.contains('\n') && !default.contains("*/") {
                out.push_str(&format!("  /** @default {} */\n", default));
            }
        }
        let optional = if prop.required { "" } else { "?" };
        out.push_str(&format!("  {}{}: {};\n", prop.name, optional, prop.ty));
    }

    for event in &meta.events {
        out.push_str(&format!(
            "  {}?: (event: {}) => void;\n",
            event.handler,
            event.event_type()
        ));
    }

    out.push_str("  children?: React.ReactNode;\n");
    out.push_str("};\n");
    out
}
