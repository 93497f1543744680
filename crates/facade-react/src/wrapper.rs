//! React wrapper module generator.
//!
//! Emits one TypeScript module exposing a `forwardRef` component per custom
//! element. The host strips the type syntax afterwards.

use std::collections::HashSet;

use crate::imports::{escape_string, ImportStyle, ImportTable};
use crate::metadata::WrapperMetadata;
use crate::props::{render_doc, render_props_type};

/// First line of every generated file.
pub const GENERATED_HEADER: &str =
    "// Generated by facade from custom element sources. Do not edit.\n";

/// Module-level names the wrapper file declares itself.
pub(crate) const MODULE_BINDINGS: &[&str] = &[
    "React",
    "setAttribute",
    "setProperty",
    "defineElement",
    "assignedProperties",
];

/// Names bound inside every generated component body.
const COMPONENT_BINDINGS: &[&str] = &[
    "props",
    "forwardedRef",
    "elementRef",
    "element",
    "listener",
    "event",
    "rest",
    "children",
];

const HELPERS: &str = r#"function setAttribute(element: HTMLElement, name: string, value: unknown): void {
  if (value === undefined || value === null || value === false) {
    element.removeAttribute(name);
  } else {
    element.setAttribute(name, value === true ? "" : String(value));
  }
}

const assignedProperties = new WeakMap<HTMLElement, Set<PropertyKey>>();

function setProperty<E extends HTMLElement, K extends keyof E>(element: E, name: K, value: E[K] | undefined): void {
  let assigned = assignedProperties.get(element);
  if (value === undefined) {
    if (assigned?.delete(name)) {
      element[name] = undefined as E[K];
    }
    return;
  }
  if (!assigned) {
    assigned = new Set();
    assignedProperties.set(element, assigned);
  }
  assigned.add(name);
  element[name] = value;
}

function defineElement(tagName: string, constructor: CustomElementConstructor): void {
  if (typeof customElements !== "undefined" && !customElements.get(tagName)) {
    customElements.define(tagName, constructor);
  }
}
"#;

/// Generate the wrapper module for `wrappers`, preserving their order.
pub fn emit_wrapper(wrappers: &[WrapperMetadata]) -> String {
    let imports = ImportTable::plan(wrappers, str::to_string);

    let mut out = String::from(GENERATED_HEADER);
    out.push_str("import * as React from \"react\";\n");
    out.push_str(&imports.render(ImportStyle::Value));
    out.push('\n');
    out.push_str(HELPERS);
    out.push('\n');

    // Unexported classes register themselves when their module is imported
    for (index, wrapper) in wrappers.iter().enumerate() {
        if let Some(local) = imports.local(index) {
            out.push_str(&format!(
                "defineElement(\"{}\", {});\n",
                escape_string(&wrapper.tag_name),
                local
            ));
        }
    }

    for (index, wrapper) in wrappers.iter().enumerate() {
        out.push('\n');
        out.push_str(&render_component(wrapper, imports.element_type(index)));
    }

    tracing::debug!("Generated {} wrappers", wrappers.len());

    out
}

/// Local variable for each destructured prop and handler, in destructuring order.
///
/// Keys that would shadow a name the component body or module relies on are
/// bound as `<key>Prop` instead.
fn prop_locals<'a>(meta: &'a WrapperMetadata, element: &str) -> Vec<(&'a str, String)> {
    let keys: Vec<&str> = meta
        .properties
        .iter()
        .map(|p| p.name.as_str())
        .chain(meta.events.iter().map(|e| e.handler.as_str()))
        .collect();

    let reserved: HashSet<&str> = COMPONENT_BINDINGS
        .iter()
        .chain(MODULE_BINDINGS)
        .copied()
        .chain([element, meta.wrapper_name.as_str()])
        .collect();

    let mut taken: HashSet<String> = keys
        .iter()
        .filter(|key| !reserved.contains(*key))
        .map(|key| key.to_string())
        .collect();

    keys.into_iter()
        .map(|key| {
            if !reserved.contains(key) {
                return (key, key.to_string());
            }
            let local = std::iter::once(format!("{}Prop", key))
                .chain((2..).map(|n| format!("{}Prop{}", key, n)))
                .find(|name| !reserved.contains(name.as_str()) && !taken.contains(name))
                .unwrap_or_else(|| format!("{}Prop", key));
            taken.insert(local.clone());
            (key, local)
        })
        .collect()
}

fn render_component(meta: &WrapperMetadata, element: &str) -> String {
    let name = &meta.wrapper_name;
    let props_type = meta.props_type_name();
    let tag = escape_string(&meta.tag_name);

    let locals = prop_locals(meta, element);
    let (property_locals, handler_locals) = locals.split_at(meta.properties.len());

    let mut bindings: Vec<String> = locals
        .iter()
        .map(|(key, local)| {
            if key == local {
                local.clone()
            } else {
                format!("{}: {}", key, local)
            }
        })
        .collect();
    bindings.push("children".to_string());
    bindings.push("...rest".to_string());

    let mut out = render_doc(meta);
    out.push_str(&render_props_type(meta));
    out.push('\n');
    out.push_str(&render_doc(meta));
    out.push_str(&format!(
        "export const {name} = React.forwardRef<{element}, {props_type}>(function {name}(props, forwardedRef) {{\n"
    ));
    out.push_str(&format!("  const {{ {} }} = props;\n", bindings.join(", ")));
    out.push_str(&format!(
        "  const elementRef = React.useRef<{element} | null>(null);\n\n"
    ));
    out.push_str(&format!(
        "  React.useImperativeHandle(forwardedRef, () => elementRef.current as {element});\n"
    ));

    for (prop, (_, local)) in meta.properties.iter().zip(property_locals) {
        // Reflected properties go through the attribute so booleans toggle
        // presence instead of being stringified.
        let assignment = match (&prop.attribute, prop.reflects_to_attribute) {
            (Some(attribute), true) => format!(
                "setAttribute(element, \"{}\", {})",
                escape_string(attribute),
                local
            ),
            _ => format!("setProperty(element, \"{}\", {})", prop.name, local),
        };
        out.push_str(&format!(
            "\n  React.useLayoutEffect(() => {{\n    const element = elementRef.current;\n    if (element) {assignment};\n  }}, [{local}]);\n"
        ));
    }

    for (event, (_, handler)) in meta.events.iter().zip(handler_locals) {
        let call = match &event.detail_type {
            Some(_) => format!("{handler}(event as {})", event.event_type()),
            None => format!("{handler}(event)"),
        };
        out.push_str(&format!(
            r#"
  React.useEffect(() => {{
    const element = elementRef.current;
    if (!element || !{handler}) return;
    const listener = (event: Event) => {call};
    element.addEventListener("{event_name}", listener);
    return () => element.removeEventListener("{event_name}", listener);
  }}, [{handler}]);
"#,
            event_name = escape_string(&event.name),
        ));
    }

    out.push_str(&format!(
        "\n  return React.createElement(\"{tag}\", {{ ...rest, ref: elementRef }}, children);\n}});\n\n"
    ));
    out.push_str(&format!("{name}.displayName = \"{name}\";\n"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::EventBinding;
    use facade_manifest::{ExportKind, PropertyDescriptor};
    use pretty_assertions::assert_eq;

    fn prop(name: &str, ty: &str, reflect: bool) -> PropertyDescriptor {
        PropertyDescriptor {
            name: name.to_string(),
            ty: ty.to_string(),
            required: false,
            default_value: None,
            reflects_to_attribute: reflect,
            attribute: Some(name.to_lowercase()),
        }
    }

    fn wrapper(name: &str, tag: &str, class: &str, path: &str) -> WrapperMetadata {
        WrapperMetadata {
            wrapper_name: name.to_string(),
            tag_name: tag.to_string(),
            class_name: class.to_string(),
            export_kind: ExportKind::Named,
            import_path: path.to_string(),
            properties: Vec::new(),
            events: Vec::new(),
            slots: Vec::new(),
            description: None,
        }
    }

    #[test]
    fn emits_one_wrapper_per_entry_in_order() {
        let wrappers = vec![
            wrapper("Card", "custom-card", "CustomCard", "../card/card"),
            wrapper("Alert", "custom-alert", "CustomAlert", "../alert/alert"),
            wrapper("Button", "custom-button", "CustomButton", "../button/button"),
        ];

        let output = emit_wrapper(&wrappers);

        let positions: Vec<usize> = ["Card", "Alert", "Button"]
            .iter()
            .map(|n| output.find(&format!("export const {} =", n)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(output.matches("React.forwardRef").count(), 3);
        assert!(output.contains("defineElement(\"custom-card\", CustomCard);"));
    }

    #[test]
    fn routes_reflected_properties_through_attributes() {
        let mut button = wrapper("Button", "custom-button", "CustomButton", "../button/button");
        button.properties = vec![
            prop("disabled", "boolean", true),
            prop("items", "string[]", false),
        ];
        button.properties[1].attribute = None;

        let output = emit_wrapper(&[button]);

        assert!(output.contains("if (element) setAttribute(element, \"disabled\", disabled);"));
        assert!(output.contains("if (element) setProperty(element, \"items\", items);"));
        assert!(!output.contains("setProperty(element, \"disabled\""));
        assert!(!output.contains("setAttribute(element, \"items\""));
    }

    #[test]
    fn uses_custom_attribute_name_for_reflection() {
        let mut input = wrapper("Input", "custom-input", "CustomInput", "../input");
        let mut max = prop("maxLength", "number", true);
        max.attribute = Some("max-length".to_string());
        input.properties = vec![max];

        let output = emit_wrapper(&[input]);

        assert!(output.contains("setAttribute(element, \"max-length\", maxLength)"));
    }

    #[test]
    fn subscribes_and_unsubscribes_events() {
        let mut button = wrapper("Button", "custom-button", "CustomButton", "../button/button");
        button.events = vec![EventBinding {
            name: "button-click".to_string(),
            detail_type: Some("{ id: string }".to_string()),
            handler: "onButtonClick".to_string(),
        }];

        let output = emit_wrapper(&[button]);

        assert!(output.contains("element.addEventListener(\"button-click\", listener);"));
        assert!(output.contains("return () => element.removeEventListener(\"button-click\", listener);"));
        assert!(output.contains("const listener = (event: Event) => onButtonClick(event as CustomEvent<{ id: string }>);"));
        assert!(output.contains("}, [onButtonClick]);"));
    }

    #[test]
    fn deduplicates_imports() {
        let wrappers = vec![
            wrapper("Tabs", "custom-tabs", "CustomTabs", "../tabs/tabs"),
            wrapper("Tab", "custom-tab", "CustomTab", "../tabs/tabs"),
        ];

        let output = emit_wrapper(&wrappers);

        assert_eq!(output.matches("from \"../tabs/tabs\"").count(), 1);
        assert!(output.contains("import { CustomTabs, CustomTab } from \"../tabs/tabs\";"));
    }

    #[test]
    fn renders_complete_component() {
        let mut chip = wrapper("Chip", "custom-chip", "CustomChip", "./chip");
        chip.properties = vec![prop("selected", "boolean", true)];

        let output = emit_wrapper(&[chip]);
        let component = &output[output.find("/**").unwrap()..];

        let expected = r#"/**
 * React wrapper for `<custom-chip>`.
 */
export type ChipProps = Omit<React.HTMLAttributes<HTMLElement>, "selected"> & {
  selected?: boolean;
  children?: React.ReactNode;
};

/**
 * React wrapper for `<custom-chip>`.
 */
export const Chip = React.forwardRef<CustomChip, ChipProps>(function Chip(props, forwardedRef) {
  const { selected, children, ...rest } = props;
  const elementRef = React.useRef<CustomChip | null>(null);

  React.useImperativeHandle(forwardedRef, () => elementRef.current as CustomChip);

  React.useLayoutEffect(() => {
    const element = elementRef.current;
    if (element) setAttribute(element, "selected", selected);
  }, [selected]);

  return React.createElement("custom-chip", { ...rest, ref: elementRef }, children);
});

Chip.displayName = "Chip";
"#;

        assert_eq!(component, expected);
    }

    #[test]
    fn imports_default_export_and_registers_it() {
        let mut dialog = wrapper("Dialog", "custom-dialog", "CustomDialog", "../dialog/dialog");
        dialog.export_kind = ExportKind::Default;

        let output = emit_wrapper(&[dialog]);

        assert!(output.contains("import CustomDialog from \"../dialog/dialog\";\n"));
        assert!(!output.contains("{ CustomDialog }"));
        assert!(output.contains("defineElement(\"custom-dialog\", CustomDialog);"));
        assert!(output.contains("React.forwardRef<CustomDialog, DialogProps>"));
    }

    #[test]
    fn imports_unexported_class_for_registration_only() {
        let mut card = wrapper("Card", "custom-card", "CustomCard", "../card/card");
        card.export_kind = ExportKind::None;

        let output = emit_wrapper(&[card]);

        assert!(output.contains("import \"../card/card\";\n"));
        assert!(!output.contains("CustomCard"));
        assert!(!output.contains("defineElement(\"custom-card\""));
        assert!(output.contains("React.forwardRef<HTMLElement, CardProps>"));
        assert!(output.contains("React.useRef<HTMLElement | null>(null);"));
    }

    #[test]
    fn renames_props_that_shadow_component_locals() {
        let mut panel = wrapper("Panel", "custom-panel", "CustomPanel", "./panel");
        let mut element = prop("element", "string", false);
        element.attribute = None;
        panel.properties = vec![element, prop("rest", "boolean", true), prop("open", "boolean", true)];
        panel.events = vec![EventBinding {
            name: "listener".to_string(),
            detail_type: None,
            handler: "listener".to_string(),
        }];

        let output = emit_wrapper(&[panel]);

        assert!(output.contains(
            "  const { element: elementProp, rest: restProp, open, listener: listenerProp, children, ...rest } = props;\n"
        ));
        assert!(output.contains("if (element) setProperty(element, \"element\", elementProp);\n  }, [elementProp]);"));
        assert!(output.contains("if (element) setAttribute(element, \"rest\", restProp);\n  }, [restProp]);"));
        assert!(output.contains("if (element) setAttribute(element, \"open\", open);"));
        assert!(output.contains("if (!element || !listenerProp) return;"));
        assert!(output.contains("const listener = (event: Event) => listenerProp(event);"));
        assert!(output.contains("React.createElement(\"custom-panel\", { ...rest, ref: elementRef }, children);"));
    }

    #[test]
    fn alias_skips_names_taken_by_other_props() {
        let mut field = wrapper("Field", "custom-field", "CustomField", "./field");
        field.properties = vec![prop("event", "string", false), prop("eventProp", "string", false)];
        field.properties[0].attribute = None;
        field.properties[1].attribute = None;

        let output = emit_wrapper(&[field]);

        assert!(output.contains("const { event: eventProp2, eventProp, children, ...rest } = props;"));
        assert!(output.contains("setProperty(element, \"event\", eventProp2)"));
    }

    #[test]
    fn clears_properties_that_become_undefined() {
        let output = emit_wrapper(&[wrapper("Card", "custom-card", "CustomCard", "../card/card")]);

        assert!(output.contains("const assignedProperties = new WeakMap<HTMLElement, Set<PropertyKey>>();"));
        assert!(output.contains(
            "  if (value === undefined) {\n    if (assigned?.delete(name)) {\n      element[name] = undefined as E[K];\n    }\n    return;\n  }"
        ));
        assert!(output.contains("  assigned.add(name);\n  element[name] = value;"));
    }

    #[test]
    fn output_is_stable() {
        let wrappers = vec![wrapper("Card", "custom-card", "CustomCard", "../card/card")];
        assert_eq!(emit_wrapper(&wrappers), emit_wrapper(&wrappers));
    }
}
