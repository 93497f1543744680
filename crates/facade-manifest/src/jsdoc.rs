//! JSDoc tag extraction for component classes.
//!
//! Reads `@fires`/`@event` and `@slot` tags plus the leading description from
//! the doc comment attached to a class declaration.

use regex::Regex;
use std::sync::LazyLock;

/// Documentation attached to a component class.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassDoc {
    /// First paragraph of free text
    pub description: Option<String>,

    /// Events as `(name, detail type)`
    pub events: Vec<(String, Option<String>)>,

    /// Slot names, the default slot as ""
    pub slots: Vec<String>,
}

static BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*\*(.*?)\*/").expect("Invalid doc block regex"));

static LINE_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\*?\s?").expect("Invalid line prefix regex"));

static FIRES_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Match: @fires {CustomEvent<Detail>} name or @event name
    Regex::new(r"@(?:fires|event)\b(?:\s+\{((?:[^{}]|\{[^{}]*\})*)\})?\s+([A-Za-z_][\w:.-]*)")
        .expect("Invalid fires regex")
});

static SLOT_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Match: @slot name - text, or @slot - text for the default slot
    Regex::new(r"@slot\b(?:[ \t]+([A-Za-z_][\w-]*))?").expect("Invalid slot regex")
});

static CUSTOM_EVENT_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^CustomEvent\s*(?:<(.+)>)?$").expect("Invalid custom event type regex")
});

/// Parse the last doc block in `region`, the text between the previous
/// statement and a class declaration.
pub fn parse_class_doc(region: &str) -> ClassDoc {
    let Some(block) = BLOCK_RE.captures_iter(region).last() else {
        return ClassDoc::default();
    };

    let lines: Vec<String> = block[1]
        .lines()
        .map(|line| LINE_PREFIX_RE.replace(line, "").trim_end().to_string())
        .collect();

    let mut doc = ClassDoc {
        description: description(&lines),
        ..Default::default()
    };

    for line in &lines {
        if let Some(cap) = FIRES_RE.captures(line) {
            let name = cap[2].to_string();
            if !doc.events.iter().any(|(n, _)| *n == name) {
                let detail = cap.get(1).and_then(|t| detail_from_event_type(t.as_str()));
                doc.events.push((name, detail));
            }
        } else if let Some(cap) = SLOT_RE.captures(line) {
            let name = cap.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
            if !doc.slots.contains(&name) {
                doc.slots.push(name);
            }
        }
    }

    doc
}

/// Map a documented event type to a `CustomEvent` detail type.
///
/// `Event` means no detail, `CustomEvent<T>` means `T`, a bare `CustomEvent`
/// carries an unknown detail, and anything else is taken as the detail itself.
pub fn detail_from_event_type(ty: &str) -> Option<String> {
    let ty = ty.trim();
    if ty.is_empty() || ty == "Event" {
        return None;
    }
    match CUSTOM_EVENT_TYPE_RE.captures(ty) {
        Some(cap) => Some(
            cap.get(1)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        ),
        None => Some(ty.to_string()),
    }
}

fn description(lines: &[String]) -> Option<String> {
    let text: Vec<&str> = lines
        .iter()
        .map(|l| l.trim())
        .skip_while(|l| l.is_empty())
        .take_while(|l| !l.is_empty() && !l.starts_with('@'))
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_events_slots_and_description() {
        let region = r#"
/**
 * A clickable button.
 * Supports an icon.
 *
 * @fires {CustomEvent<{ id: string }>} button-click - Fired on click
 * @fires focus-change - Focus moved
 * @slot - Label content
 * @slot icon - Leading icon
 */
"#;

        let doc = parse_class_doc(region);

        assert_eq!(
            doc.description.as_deref(),
            Some("A clickable button. Supports an icon.")
        );
        assert_eq!(
            doc.events,
            vec![
                ("button-click".to_string(), Some("{ id: string }".to_string())),
                ("focus-change".to_string(), None),
            ]
        );
        assert_eq!(doc.slots, vec!["".to_string(), "icon".to_string()]);
    }

    #[test]
    fn uses_closest_doc_block() {
        let region = "/** @fires stale */\nconst x = 1;\n/** @event fresh */\n";
        let doc = parse_class_doc(region);
        assert_eq!(doc.events, vec![("fresh".to_string(), None)]);
    }

    #[test]
    fn ignores_plain_comments() {
        let doc = parse_class_doc("// @fires nope\n/* @slot nope */");
        assert_eq!(doc, ClassDoc::default());
    }

    #[test]
    fn maps_event_types() {
        assert_eq!(detail_from_event_type("Event"), None);
        assert_eq!(detail_from_event_type("CustomEvent"), Some("unknown".to_string()));
        assert_eq!(
            detail_from_event_type("CustomEvent<number>"),
            Some("number".to_string())
        );
        assert_eq!(detail_from_event_type("string"), Some("string".to_string()));
    }
}
