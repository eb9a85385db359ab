//! Typed descriptors extracted from application source text
//!
//! The parser understands the decorator conventions of the target framework
//! (`@Command({ authorize })`, `@Reduces(Event)`, `@Projects(Entity, 'id')`,
//! `@EventHandler(Event)`, `register.events(new Event(..))`) and the
//! constructor-parameter style of declaring fields. It never fails: anything
//! it cannot recognize is simply absent from the descriptor.

use bpt_model::{ValueType, ALL_ROLES};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

static BLOCK_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("block comment regex is valid"));
static LINE_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(^|[^:])//.*$").expect("line comment regex is valid"));
static CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bclass\s+([A-Za-z_$][\w$]*)").expect("class regex is valid"));
static EXPORTED_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bexport\s+(?:default\s+)?class\s+([A-Za-z_$][\w$]*)")
        .expect("exported class regex is valid")
});
static AUTHORIZE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bauthorize\s*:\s*(\[[^\]]*\]|'[^']*'|"[^"]*"|[A-Za-z_$][\w$]*)"#)
        .expect("authorize regex is valid")
});
static NEW_EXPR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bnew\s+([A-Z][\w$]*)\s*[(<]").expect("new regex is valid"));
static REDUCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@Reduces\(\s*([\w$]+)\s*\)").expect("reduces regex is valid"));
static PROJECTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@Projects\(\s*([\w$]+)").expect("projects regex is valid"));
static EVENT_HANDLER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@EventHandler\(\s*([\w$]+)\s*\)").expect("event handler regex is valid")
});
static PROPERTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:(?:public|readonly)\s+)+([A-Za-z_$][\w$]*)(\?)?\s*:\s*([^=;]+?)\s*(=[^;]*)?;?\s*$")
        .expect("property regex is valid")
});

/// Constructed types that never count as event registration
const NOT_EVENTS: &[&str] = &[
    "Array", "Date", "Map", "Object", "Promise", "RegExp", "Set", "URL",
];

/// Declared authorization of a command or read model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    /// Open to every caller
    All,
    /// Restricted to the named roles
    Roles(BTreeSet<String>),
}

impl Authorization {
    fn parse(expression: &str) -> Self {
        let expression = expression.trim();
        let items: Vec<&str> = match expression.strip_prefix('[') {
            Some(rest) => rest.trim_end_matches(']').split(',').collect(),
            None => vec![expression],
        };
        let roles: BTreeSet<String> = items
            .into_iter()
            .map(|item| item.trim().trim_matches(|c| c == '\'' || c == '"').trim())
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect();
        if roles.contains(ALL_ROLES) {
            Self::All
        } else {
            Self::Roles(roles)
        }
    }

    /// True if this declaration grants exactly what `expected` asks for.
    ///
    /// An expected `{"all"}` needs an open declaration; otherwise the
    /// declared roles must include every expected role.
    #[must_use]
    pub fn satisfies(&self, expected: &BTreeSet<String>) -> bool {
        let expects_all = expected.contains(ALL_ROLES);
        match self {
            Self::All => expects_all,
            Self::Roles(roles) => !expects_all && roles.is_superset(expected),
        }
    }
}

impl fmt::Display for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("'all'"),
            Self::Roles(roles) => {
                write!(f, "[{}]", roles.iter().cloned().collect::<Vec<_>>().join(", "))
            }
        }
    }
}

/// One declared input or field
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeclaredField {
    pub types: BTreeSet<ValueType>,
    pub required: bool,
}

impl DeclaredField {
    /// True if some declared type can hold a value of shape `expected`
    #[must_use]
    pub fn accepts(&self, expected: ValueType) -> bool {
        matches!(expected, ValueType::Unknown | ValueType::Undefined)
            || self.types.iter().any(|declared| declared.accepts(expected))
    }

    #[must_use]
    pub fn describe_types(&self) -> String {
        self.types
            .iter()
            .map(ValueType::as_str)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Everything static confirmation needs to know about one source file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArtifactDescriptor {
    /// First exported class
    pub class_name: Option<String>,
    /// Every class defined in the file
    pub classes: BTreeSet<String>,
    pub authorization: Option<Authorization>,
    /// Constructor parameters and public class properties
    pub fields: BTreeMap<String, DeclaredField>,
    pub registered_events: BTreeSet<String>,
    pub reduced_events: BTreeSet<String>,
    pub projected_entities: BTreeSet<String>,
    pub handled_events: BTreeSet<String>,
}

impl ArtifactDescriptor {
    /// Parse source text into a descriptor
    #[must_use]
    pub fn parse(source: &str) -> Self {
        let source = strip_comments(source);
        let classes: BTreeSet<String> = captures(&CLASS, &source).collect();
        let class_name = EXPORTED_CLASS
            .captures(&source)
            .or_else(|| CLASS.captures(&source))
            .map(|c| c[1].to_string());

        let authorization = AUTHORIZE
            .captures(&source)
            .map(|c| Authorization::parse(&c[1]));

        let registered_events = captures(&NEW_EXPR, &source)
            .filter(|name| is_event_construction(name, &classes))
            .collect();

        Self {
            fields: parse_fields(&source),
            reduced_events: captures(&REDUCES, &source).collect(),
            projected_entities: captures(&PROJECTS, &source).collect(),
            handled_events: captures(&EVENT_HANDLER, &source).collect(),
            class_name,
            classes,
            authorization,
            registered_events,
        }
    }

    /// Field by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&DeclaredField> {
        self.fields.get(name)
    }
}

fn captures<'a>(regex: &'a Regex, source: &'a str) -> impl Iterator<Item = String> + 'a {
    regex.captures_iter(source).map(|c| c[1].to_string())
}

fn strip_comments(source: &str) -> String {
    let without_blocks = BLOCK_COMMENT.replace_all(source, "");
    LINE_COMMENT.replace_all(&without_blocks, "$1").into_owned()
}

fn is_event_construction(name: &str, own_classes: &BTreeSet<String>) -> bool {
    !NOT_EVENTS.contains(&name) && !name.ends_with("Error") && !own_classes.contains(name)
}

/// Constructor parameters first, then class-level property declarations
fn parse_fields(source: &str) -> BTreeMap<String, DeclaredField> {
    let mut fields = BTreeMap::new();
    let mut rest = source.to_string();

    if let Some((start, end)) = constructor_span(source) {
        for parameter in split_top_level(&source[start..end], ',') {
            if let Some((name, field)) = parse_parameter(parameter) {
                fields.insert(name, field);
            }
        }
        rest.replace_range(start..end, "");
    }

    for c in PROPERTY.captures_iter(&rest) {
        let name = c[1].to_string();
        let optional = c.get(2).is_some() || c.get(4).is_some();
        let ty = c[3].trim().trim_end_matches(',');
        fields.entry(name).or_insert_with(|| declared(ty, optional));
    }
    fields
}

/// Byte range of the constructor parameter list, parentheses excluded
fn constructor_span(source: &str) -> Option<(usize, usize)> {
    let keyword = source.find("constructor")?;
    let open = keyword + source[keyword..].find('(')?;
    let mut depth = 0usize;
    for (offset, c) in source[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((open + 1, open + offset));
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on `separator` outside brackets, braces, parentheses and generics
fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut previous = '\0';
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' | '{' | '<' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            '>' if previous != '=' => depth -= 1,
            c if c == separator && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
        previous = c;
    }
    parts.push(&text[start..]);
    parts.into_iter().map(str::trim).filter(|p| !p.is_empty()).collect()
}

fn parse_parameter(parameter: &str) -> Option<(String, DeclaredField)> {
    let mut text = parameter.trim();
    while let Some(rest) = ["public ", "private ", "protected ", "readonly ", "override "]
        .iter()
        .find_map(|modifier| text.strip_prefix(modifier))
    {
        text = rest.trim_start();
    }

    let (declaration, has_default) = match split_default(text) {
        Some((declaration, _)) => (declaration, true),
        None => (text, false),
    };
    let (name, ty) = match declaration.split_once(':') {
        Some((name, ty)) => (name.trim(), ty.trim()),
        None => (declaration.trim(), ""),
    };
    let (name, optional) = match name.strip_suffix('?') {
        Some(name) => (name.trim(), true),
        None => (name, false),
    };
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$') {
        return None;
    }
    Some((name.to_string(), declared(ty, optional || has_default)))
}

/// Split `name: T = value` at the default-value `=` (not `=>`, `==`)
fn split_default(text: &str) -> Option<(&str, &str)> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'[' | b'{' | b'<' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            b'>' if i > 0 && bytes[i - 1] != b'=' => depth -= 1,
            b'=' if depth == 0
                && bytes.get(i + 1).map_or(true, |n| *n != b'>' && *n != b'=')
                && (i == 0 || bytes[i - 1] != b'=') =>
            {
                return Some((&text[..i], &text[i + 1..]));
            }
            _ => {}
        }
    }
    None
}

fn declared(ty: &str, optional: bool) -> DeclaredField {
    let mut types = BTreeSet::new();
    let mut nullable = false;

    if ty.trim().is_empty() {
        types.insert(ValueType::Unknown);
    }
    for member in split_top_level(ty, '|') {
        match classify(member) {
            Some(value_type) => {
                types.insert(value_type);
            }
            None => nullable = true,
        }
    }
    DeclaredField {
        types,
        required: !optional && !nullable,
    }
}

/// Shape of one union member; `None` for `undefined`/`null`
fn classify(member: &str) -> Option<ValueType> {
    let member = member.trim();
    let quoted = |q: char| member.len() >= 2 && member.starts_with(q) && member.ends_with(q);
    Some(match member {
        "undefined" | "null" | "void" => return None,
        "string" | "String" | "Date" => ValueType::String,
        "number" | "Number" | "bigint" => ValueType::Number,
        "boolean" | "Boolean" | "true" | "false" => ValueType::Boolean,
        "UUID" => ValueType::Identifier,
        "unknown" | "any" => ValueType::Unknown,
        m if m.ends_with("[]") || m.starts_with("Array<") || m.starts_with("ReadonlyArray<") => {
            ValueType::Array
        }
        _ if quoted('\'') || quoted('"') || quoted('`') => ValueType::String,
        m if m.parse::<f64>().is_ok() => ValueType::Number,
        _ => ValueType::Object,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const COMMAND: &str = r"
import { Guest, Bartender } from '../roles'

// @Command({ authorize: 'all' })
@Command({
  authorize: [Guest, Bartender],
})
export class OrderCocktail {
  public constructor(
    readonly drink: string,
    readonly size: 'small' | 'large' = 'small',
    readonly extras: Array<string>,
    readonly note: string | undefined,
    readonly tid?: UUID,
  ) {}

  public static async handle(command: OrderCocktail, register: Register): Promise<void> {
    if (!command.drink) throw new InvalidParameterError('drink')
    register.events(new CocktailOrdered(command.tid, command.drink, new Date().toISOString()))
  }
}
";

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn parses_command() {
        let descriptor = ArtifactDescriptor::parse(COMMAND);
        assert_eq!(descriptor.class_name.as_deref(), Some("OrderCocktail"));
        assert_eq!(
            descriptor.authorization,
            Some(Authorization::Roles(set(&["Bartender", "Guest"])))
        );
        assert_eq!(descriptor.registered_events, set(&["CocktailOrdered"]));

        let drink = descriptor.field("drink").unwrap();
        assert!(drink.required);
        assert_eq!(drink.types, BTreeSet::from([ValueType::String]));

        assert!(!descriptor.field("size").unwrap().required);
        assert!(!descriptor.field("note").unwrap().required);
        assert!(!descriptor.field("tid").unwrap().required);
        assert_eq!(
            descriptor.field("tid").unwrap().types,
            BTreeSet::from([ValueType::Identifier])
        );
        assert_eq!(
            descriptor.field("extras").unwrap().types,
            BTreeSet::from([ValueType::Array])
        );
        assert_eq!(descriptor.fields.len(), 5);
    }

    #[test]
    fn commented_authorization_is_ignored() {
        let descriptor = ArtifactDescriptor::parse("// authorize: 'all'\nclass A {}");
        assert_eq!(descriptor.authorization, None);
    }

    #[test]
    fn open_authorization() {
        let source = "@Command({ authorize: 'all' })\nexport class Ping {}";
        assert_eq!(
            ArtifactDescriptor::parse(source).authorization,
            Some(Authorization::All)
        );
    }

    #[test]
    fn wiring_decorators() {
        let source = r"
@Entity
export class Drink {
  public constructor(readonly id: UUID, readonly served: boolean) {}

  @Reduces(DrinkPoured)
  public static reducePoured(event: DrinkPoured): Drink {
    return new Drink(event.tid, false)
  }

  @Reduces(DrinkServed)
  public static reduceServed(event: DrinkServed, current: Drink): Drink {
    return new Drink(current.id, true)
  }
}
";
        let descriptor = ArtifactDescriptor::parse(source);
        assert_eq!(descriptor.reduced_events, set(&["DrinkPoured", "DrinkServed"]));
        assert!(descriptor.registered_events.is_empty());
        assert_eq!(
            descriptor.field("served").unwrap().types,
            BTreeSet::from([ValueType::Boolean])
        );

        let handler = ArtifactDescriptor::parse(
            "@EventHandler(CocktailOrdered)\nexport class PourDrink {}\n@Projects(Drink, 'id')",
        );
        assert_eq!(handler.handled_events, set(&["CocktailOrdered"]));
        assert_eq!(handler.projected_entities, set(&["Drink"]));
    }

    #[test]
    fn class_properties_count_as_fields() {
        let source = r"
export class Tab {
  public readonly total: number
  public owner?: string;
  public constructor(readonly id: UUID) {}
}
";
        let descriptor = ArtifactDescriptor::parse(source);
        assert!(descriptor.field("total").unwrap().required);
        assert!(!descriptor.field("owner").unwrap().required);
        assert!(descriptor.field("id").is_some());
        assert_eq!(descriptor.fields.len(), 3);
    }

    #[test]
    fn roles_file_classes() {
        let source = "@Role({})\nexport class Guest {}\n@Role({})\nexport class Bartender {}";
        assert_eq!(ArtifactDescriptor::parse(source).classes, set(&["Bartender", "Guest"]));
    }

    #[test]
    fn satisfies_rules() {
        let guest = set(&["Guest"]);
        let all = set(&["all"]);
        assert!(Authorization::All.satisfies(&all));
        assert!(!Authorization::All.satisfies(&guest));
        assert!(Authorization::Roles(set(&["Guest", "Admin"])).satisfies(&guest));
        assert!(!Authorization::Roles(set(&["Admin"])).satisfies(&guest));
        assert!(!Authorization::Roles(guest.clone()).satisfies(&all));
        assert_eq!(Authorization::Roles(set(&["B", "A"])).to_string(), "[A, B]");
    }

    #[test]
    fn type_classification() {
        assert_eq!(classify("Record<string, number>"), Some(ValueType::Object));
        assert_eq!(classify("{ a: string }"), Some(ValueType::Object));
        assert_eq!(classify("Drink[]"), Some(ValueType::Array));
        assert_eq!(classify("42"), Some(ValueType::Number));
        assert_eq!(classify("null"), None);
    }
}
