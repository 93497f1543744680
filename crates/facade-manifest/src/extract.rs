//! Syntax-tree extraction of component classes and tag registrations.
//!
//! Decorators, option objects and type annotations are read as data. The
//! class body text is additionally scanned for event dispatch sites and
//! `<slot>` elements in render templates.

use std::collections::HashMap;
use std::sync::LazyLock;

use oxc_ast::ast::{
    Argument, Class, ClassElement, Declaration, Decorator, ExportDefaultDeclarationKind,
    Expression, MethodDefinitionKind, ObjectExpression, ObjectPropertyKind, Program, PropertyKey,
    Statement, TSAccessibility, TSTypeAnnotation,
};
use oxc_span::{GetSpan, Span};
use regex::Regex;

use crate::jsdoc::{parse_class_doc, ClassDoc};
use crate::types::{ExportKind, PropertyDescriptor};

/// Everything a single module declares.
#[derive(Debug, Clone, Default)]
pub struct ModuleSurface {
    pub classes: Vec<ClassSurface>,

    /// `customElements.define(tag, Class)` calls as `(tag, class name)`
    pub registrations: Vec<(String, String)>,
}

/// The public surface of one class declaration.
#[derive(Debug, Clone, Default)]
pub struct ClassSurface {
    pub name: String,

    pub export_kind: ExportKind,

    /// Tag from a `@customElement("...")` decorator
    pub decorator_tag: Option<String>,

    pub properties: Vec<PropertyDescriptor>,

    /// Event names from a `static events = [...]` declaration
    pub static_events: Vec<String>,

    /// Events found at dispatch sites, as `(name, detail type)`
    pub dispatched_events: Vec<(String, Option<String>)>,

    /// Slots found in render templates
    pub template_slots: Vec<String>,

    pub doc: ClassDoc,
}

/// Options read from `@property({...})` or a `static properties` entry.
#[derive(Debug, Clone, Default, PartialEq)]
struct PropertyOptions {
    /// Constructor named by `type:` (e.g. `Boolean`)
    type_hint: Option<String>,
    reflect: bool,
    attribute: AttributeOption,
    state: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
enum AttributeOption {
    #[default]
    Lowercase,
    Named(String),
    Disabled,
}

/// A class field as read from the tree, before it is known to be public API.
struct Field<'s> {
    name: String,
    annotation: Option<&'s str>,
    initializer: Option<&'s str>,
    literal_type: Option<&'static str>,
    definite: bool,
}

impl Field<'_> {
    /// A member with no annotation or initializer of its own.
    fn bare(name: String) -> Self {
        Self {
            name,
            annotation: None,
            initializer: None,
            literal_type: None,
            definite: false,
        }
    }
}

static DISPATCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Match: new CustomEvent<Detail>("name" or new Event('name'
    Regex::new(r#"new\s+(CustomEvent|Event)\s*(?:<(.+?)>)?\s*\(\s*['"`]([^'"`$]+)['"`]"#)
        .expect("Invalid dispatch regex")
});

static SLOT_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<slot\b([^>]*)>").expect("Invalid slot tag regex"));

static SLOT_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bname\s*=\s*(?:"([^"$]*)"|'([^'$]*)')"#).expect("Invalid slot name regex")
});

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][\w$]*$").expect("Invalid identifier regex"));

const RESERVED_WORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "enum", "export", "extends", "false", "finally", "for", "function", "if", "import",
    "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw", "true", "try",
    "typeof", "var", "void", "while", "with", "children", "key", "ref",
];

/// Whether `name` can be used as a plain binding in generated code.
pub fn is_bindable_identifier(name: &str) -> bool {
    IDENTIFIER_RE.is_match(name) && !RESERVED_WORDS.contains(&name)
}

/// Walk the top-level statements of a parsed module.
pub fn extract_module(source: &str, program: &Program<'_>) -> ModuleSurface {
    let mut surface = ModuleSurface::default();
    let mut previous_end = 0u32;

    for statement in &program.body {
        let class = match statement {
            Statement::ClassDeclaration(class) => Some((&**class, ExportKind::None)),
            Statement::ExportNamedDeclaration(export) => match &export.declaration {
                Some(Declaration::ClassDeclaration(class)) => Some((&**class, ExportKind::Named)),
                _ => None,
            },
            Statement::ExportDefaultDeclaration(export) => match &export.declaration {
                ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                    Some((&**class, ExportKind::Default))
                }
                _ => None,
            },
            _ => None,
        };

        match class {
            Some((class, export_kind)) => {
                let doc_region = slice(source, Span::new(previous_end, class.body.span.start));
                if let Some(mut extracted) = extract_class(source, class, doc_region) {
                    extracted.export_kind = export_kind;
                    surface.classes.push(extracted);
                }
            }
            None => collect_registrations(statement, &mut surface.registrations),
        }

        previous_end = statement.span().end;
    }

    // `export { X }`, `export { X as default }` and `export default X` after the declaration
    for (name, export_kind) in deferred_exports(program) {
        if let Some(class) = surface.classes.iter_mut().find(|c| c.name == name) {
            if class.export_kind == ExportKind::None {
                class.export_kind = export_kind;
            }
        }
    }

    surface
}

fn deferred_exports(program: &Program<'_>) -> Vec<(String, ExportKind)> {
    let mut exports = Vec::new();

    for statement in &program.body {
        match statement {
            Statement::ExportNamedDeclaration(export)
                if export.declaration.is_none() && export.source.is_none() =>
            {
                for specifier in &export.specifiers {
                    let local = specifier.local.name();
                    let exported = specifier.exported.name();
                    if exported.as_str() == "default" {
                        exports.push((local.to_string(), ExportKind::Default));
                    } else if exported.as_str() == local.as_str() {
                        exports.push((local.to_string(), ExportKind::Named));
                    } else {
                        tracing::debug!("Ignoring renamed export {} as {}", local, exported);
                    }
                }
            }
            Statement::ExportDefaultDeclaration(export) => {
                if let ExportDefaultDeclarationKind::Identifier(id) = &export.declaration {
                    exports.push((id.name.to_string(), ExportKind::Default));
                }
            }
            _ => {}
        }
    }

    exports
}

fn extract_class(source: &str, class: &Class<'_>, doc_region: &str) -> Option<ClassSurface> {
    let Some(id) = &class.id else {
        tracing::debug!("Skipping anonymous class");
        return None;
    };

    let decorator_tag = class.decorators.iter().find_map(|d| {
        let call = decorator_call(d, "customElement")?;
        first_string_argument(&call.arguments)
    });

    let mut static_options: Vec<(String, PropertyOptions)> = Vec::new();
    let mut static_events = Vec::new();
    let mut decorated: Vec<(Field<'_>, PropertyOptions)> = Vec::new();
    let mut undecorated: HashMap<String, Field<'_>> = HashMap::new();
    let mut accessor_types: HashMap<String, &str> = HashMap::new();

    for element in &class.body.body {
        match element {
            ClassElement::PropertyDefinition(prop) if prop.r#static => {
                match (prop.key.name().as_deref(), &prop.value) {
                    (Some("properties"), Some(value)) => {
                        static_options.extend(static_properties(value));
                    }
                    (Some("events"), Some(value)) => {
                        static_events.extend(string_array(value));
                    }
                    _ => {}
                }
            }
            ClassElement::MethodDefinition(method) if method.r#static => {
                // static get properties() { return { ... } }
                if method.key.name().as_deref() == Some("properties") {
                    if let Some(body) = &method.value.body {
                        for statement in &body.statements {
                            if let Statement::ReturnStatement(ret) = statement {
                                if let Some(argument) = &ret.argument {
                                    static_options.extend(static_properties(argument));
                                }
                            }
                        }
                    }
                }
            }
            ClassElement::MethodDefinition(method)
                if matches!(method.kind, MethodDefinitionKind::Get | MethodDefinitionKind::Set) =>
            {
                if method.computed || !is_public(&method.key, method.accessibility) {
                    continue;
                }
                let Some(name) = method.key.name().map(|n| n.to_string()) else {
                    continue;
                };
                if !is_bindable_identifier(&name) {
                    continue;
                }

                // Getter return type, else the setter's parameter type
                let annotation = match method.kind {
                    MethodDefinitionKind::Get => method.value.return_type.as_deref(),
                    _ => method
                        .value
                        .params
                        .items
                        .first()
                        .and_then(|param| param.pattern.type_annotation.as_deref()),
                };
                if let Some(annotation) = annotation {
                    accessor_types
                        .entry(name.clone())
                        .or_insert_with(|| slice(source, annotation.type_annotation.span()));
                }

                if decorated.iter().any(|(field, _)| field.name == name) {
                    continue;
                }
                match member_options(&method.decorators) {
                    Some(options) => decorated.push((Field::bare(name), options)),
                    None => {
                        undecorated.entry(name.clone()).or_insert_with(|| Field::bare(name));
                    }
                }
            }
            ClassElement::PropertyDefinition(prop) => {
                if prop.computed || !is_public(&prop.key, prop.accessibility) {
                    continue;
                }
                let Some(field) = read_field(
                    source,
                    &prop.key,
                    prop.type_annotation.as_deref(),
                    prop.value.as_ref(),
                    prop.definite,
                ) else {
                    continue;
                };
                match member_options(&prop.decorators) {
                    Some(options) => decorated.push((field, options)),
                    None => {
                        undecorated.insert(field.name.clone(), field);
                    }
                }
            }
            ClassElement::AccessorProperty(prop) => {
                if prop.r#static || prop.computed || !is_public(&prop.key, prop.accessibility) {
                    continue;
                }
                let Some(field) = read_field(
                    source,
                    &prop.key,
                    prop.type_annotation.as_deref(),
                    prop.value.as_ref(),
                    prop.definite,
                ) else {
                    continue;
                };
                if let Some(options) = member_options(&prop.decorators) {
                    decorated.push((field, options));
                }
            }
            _ => {}
        }
    }

    for field in decorated
        .iter_mut()
        .map(|(field, _)| field)
        .chain(undecorated.values_mut())
    {
        if field.annotation.is_none() {
            field.annotation = accessor_types.get(&field.name).copied();
        }
    }

    let mut properties: Vec<PropertyDescriptor> = Vec::new();

    for (field, options) in decorated {
        if !options.state {
            properties.push(to_descriptor(field, &options));
        }
    }

    for (name, options) in static_options {
        if options.state || properties.iter().any(|p| p.name == name) {
            continue;
        }
        let field = undecorated.remove(&name).unwrap_or_else(|| Field::bare(name));
        properties.push(to_descriptor(field, &options));
    }

    let body_text = slice(source, class.body.span);

    Some(ClassSurface {
        name: id.name.to_string(),
        export_kind: ExportKind::None,
        decorator_tag,
        properties,
        static_events,
        dispatched_events: dispatched_events(body_text),
        template_slots: template_slots(body_text),
        doc: parse_class_doc(doc_region),
    })
}

fn read_field<'s>(
    source: &'s str,
    key: &PropertyKey<'_>,
    annotation: Option<&TSTypeAnnotation<'_>>,
    value: Option<&Expression<'_>>,
    definite: bool,
) -> Option<Field<'s>> {
    let name = key.name()?.to_string();
    if !is_bindable_identifier(&name) {
        tracing::debug!("Skipping property {} (not a plain identifier)", name);
        return None;
    }

    Some(Field {
        name,
        annotation: annotation.map(|a| slice(source, a.type_annotation.span())),
        initializer: value.map(|v| slice(source, v.span())),
        literal_type: value.and_then(literal_type),
        definite,
    })
}

fn to_descriptor(field: Field<'_>, options: &PropertyOptions) -> PropertyDescriptor {
    let ty = field
        .annotation
        .map(|a| a.trim().to_string())
        .or_else(|| options.type_hint.as_deref().and_then(type_from_constructor))
        .or_else(|| field.literal_type.map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string());

    let attribute = match &options.attribute {
        AttributeOption::Lowercase => Some(field.name.to_lowercase()),
        AttributeOption::Named(name) => Some(name.clone()),
        AttributeOption::Disabled => None,
    };

    PropertyDescriptor {
        required: field.definite && field.initializer.is_none(),
        default_value: field.initializer.map(str::to_string),
        reflects_to_attribute: options.reflect && attribute.is_some(),
        attribute,
        name: field.name,
        ty,
    }
}

/// Map a Lit `type:` converter to a TypeScript type.
fn type_from_constructor(constructor: &str) -> Option<String> {
    let ty = match constructor {
        "Boolean" => "boolean",
        "Number" => "number",
        "String" => "string",
        "Array" => "unknown[]",
        "Object" => "Record<string, unknown>",
        _ => return None,
    };
    Some(ty.to_string())
}

fn literal_type(expr: &Expression<'_>) -> Option<&'static str> {
    match expr {
        Expression::StringLiteral(_) | Expression::TemplateLiteral(_) => Some("string"),
        Expression::NumericLiteral(_) => Some("number"),
        Expression::BooleanLiteral(_) => Some("boolean"),
        _ => None,
    }
}

fn is_public(key: &PropertyKey<'_>, accessibility: Option<TSAccessibility>) -> bool {
    !matches!(key, PropertyKey::PrivateIdentifier(_))
        && !matches!(
            accessibility,
            Some(TSAccessibility::Private | TSAccessibility::Protected)
        )
}

/// Options of the reactive-property decorator on a member, if any.
fn member_options(decorators: &[Decorator<'_>]) -> Option<PropertyOptions> {
    for decorator in decorators {
        match decorator_name(decorator).as_str() {
            "property" => {
                let options = match &decorator.expression {
                    Expression::CallExpression(call) => call
                        .arguments
                        .first()
                        .and_then(Argument::as_expression)
                        .and_then(object_expression)
                        .map(property_options)
                        .unwrap_or_default(),
                    _ => PropertyOptions::default(),
                };
                return Some(options);
            }
            "state" | "internalProperty" => {
                return Some(PropertyOptions {
                    state: true,
                    ..Default::default()
                });
            }
            _ => {}
        }
    }
    None
}

fn decorator_name(decorator: &Decorator<'_>) -> String {
    match &decorator.expression {
        Expression::CallExpression(call) => match &call.callee {
            Expression::Identifier(id) => id.name.to_string(),
            _ => String::new(),
        },
        Expression::Identifier(id) => id.name.to_string(),
        _ => String::new(),
    }
}

fn decorator_call<'d, 'a>(
    decorator: &'d Decorator<'a>,
    name: &str,
) -> Option<&'d oxc_ast::ast::CallExpression<'a>> {
    match &decorator.expression {
        Expression::CallExpression(call) => match &call.callee {
            Expression::Identifier(id) if id.name.as_str() == name => Some(call),
            _ => None,
        },
        _ => None,
    }
}

fn object_expression<'e, 'a>(expr: &'e Expression<'a>) -> Option<&'e ObjectExpression<'a>> {
    match expr {
        Expression::ObjectExpression(obj) => Some(obj),
        Expression::TSAsExpression(e) => object_expression(&e.expression),
        Expression::ParenthesizedExpression(e) => object_expression(&e.expression),
        _ => None,
    }
}

fn property_options(obj: &ObjectExpression<'_>) -> PropertyOptions {
    let mut options = PropertyOptions::default();

    for prop in &obj.properties {
        let ObjectPropertyKind::ObjectProperty(p) = prop else {
            continue;
        };
        let Some(key) = p.key.name() else {
            continue;
        };
        match (key.as_ref(), &p.value) {
            ("type", Expression::Identifier(id)) => {
                options.type_hint = Some(id.name.to_string());
            }
            ("reflect", Expression::BooleanLiteral(b)) => options.reflect = b.value,
            ("state", Expression::BooleanLiteral(b)) => options.state = b.value,
            ("attribute", Expression::StringLiteral(s)) => {
                options.attribute = AttributeOption::Named(s.value.to_string());
            }
            ("attribute", Expression::BooleanLiteral(b)) if !b.value => {
                options.attribute = AttributeOption::Disabled;
            }
            _ => {}
        }
    }

    options
}

/// Entries of a `static properties = { name: { ... } }` object.
fn static_properties(expr: &Expression<'_>) -> Vec<(String, PropertyOptions)> {
    let Some(obj) = object_expression(expr) else {
        return Vec::new();
    };

    obj.properties
        .iter()
        .filter_map(|prop| match prop {
            ObjectPropertyKind::ObjectProperty(p) => {
                let name = p.key.name()?.to_string();
                if !is_bindable_identifier(&name) {
                    return None;
                }
                let options = object_expression(&p.value)
                    .map(property_options)
                    .unwrap_or_default();
                Some((name, options))
            }
            _ => None,
        })
        .collect()
}

fn string_array(expr: &Expression<'_>) -> Vec<String> {
    match expr {
        Expression::ArrayExpression(arr) => arr
            .elements
            .iter()
            .filter_map(|el| match el.as_expression() {
                Some(Expression::StringLiteral(s)) => Some(s.value.to_string()),
                _ => None,
            })
            .collect(),
        Expression::TSAsExpression(e) => string_array(&e.expression),
        _ => Vec::new(),
    }
}

fn first_string_argument(arguments: &[Argument<'_>]) -> Option<String> {
    match arguments.first()?.as_expression()? {
        Expression::StringLiteral(s) => Some(s.value.to_string()),
        _ => None,
    }
}

/// Find `customElements.define("tag", Class)` calls, including inside `if` guards.
fn collect_registrations(statement: &Statement<'_>, out: &mut Vec<(String, String)>) {
    match statement {
        Statement::ExpressionStatement(stmt) => {
            if let Some(registration) = registration(&stmt.expression) {
                out.push(registration);
            }
        }
        Statement::IfStatement(stmt) => {
            collect_registrations(&stmt.consequent, out);
            if let Some(alternate) = &stmt.alternate {
                collect_registrations(alternate, out);
            }
        }
        Statement::BlockStatement(block) => {
            for inner in &block.body {
                collect_registrations(inner, out);
            }
        }
        _ => {}
    }
}

fn registration(expr: &Expression<'_>) -> Option<(String, String)> {
    let Expression::CallExpression(call) = expr else {
        return None;
    };
    let Expression::StaticMemberExpression(callee) = &call.callee else {
        return None;
    };
    if callee.property.name.as_str() != "define" || !is_custom_elements(&callee.object) {
        return None;
    }

    let tag = first_string_argument(&call.arguments)?;
    let class_name = match call.arguments.get(1)?.as_expression()? {
        Expression::Identifier(id) => id.name.to_string(),
        _ => return None,
    };

    Some((tag, class_name))
}

/// `customElements`, `window.customElements` or `globalThis.customElements`.
fn is_custom_elements(expr: &Expression<'_>) -> bool {
    match expr {
        Expression::Identifier(id) => id.name.as_str() == "customElements",
        Expression::StaticMemberExpression(member) => {
            member.property.name.as_str() == "customElements"
                && matches!(&member.object, Expression::Identifier(id)
                    if id.name.as_str() == "window" || id.name.as_str() == "globalThis")
        }
        _ => false,
    }
}

/// Events constructed in the class body, in order of appearance.
pub fn dispatched_events(body: &str) -> Vec<(String, Option<String>)> {
    let mut events: Vec<(String, Option<String>)> = Vec::new();

    for cap in DISPATCH_RE.captures_iter(body) {
        let name = cap[3].to_string();
        if events.iter().any(|(n, _)| *n == name) {
            continue;
        }
        let detail = match &cap[1] {
            "CustomEvent" => Some(
                cap.get(2)
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
            ),
            _ => None,
        };
        events.push((name, detail));
    }

    events
}

/// Slot names used by `<slot>` elements in the class body.
pub fn template_slots(body: &str) -> Vec<String> {
    let mut slots: Vec<String> = Vec::new();

    for cap in SLOT_TAG_RE.captures_iter(body) {
        let attrs = &cap[1];
        let name = match SLOT_NAME_RE.captures(attrs) {
            Some(name) => name
                .get(1)
                .or_else(|| name.get(2))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            // A dynamic name cannot be read statically
            None if attrs.contains("name=") => continue,
            None => String::new(),
        };
        if !slots.contains(&name) {
            slots.push(name);
        }
    }

    slots
}

fn slice(source: &str, span: Span) -> &str {
    source
        .get(span.start as usize..span.end as usize)
        .unwrap_or_default()
}
