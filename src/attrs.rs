//! Attribute schema (external interface §6.1).
//!
//! Attributes are namespaced by class (`graph`, `node`, `edge`, `group` plus
//! user-defined subclasses such as `node.city`). Each attribute has a type
//! tag, an optional default and a validator; validation returns a parsed,
//! canonical value rather than the raw string, per the teacher-adjacent
//! "Attribute storage as a nested hash of hashes" design note (spec §9).

use std::collections::HashMap;
use std::fmt;

use crate::error::GraphError;

/// The base class an attribute key belongs to. Subclasses (`node.city`)
/// are represented as `(Base, Some("city"))` — see `ClassName`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseClass {
    Graph,
    Node,
    Edge,
    Group,
}

impl BaseClass {
    pub fn as_str(self) -> &'static str {
        match self {
            BaseClass::Graph => "graph",
            BaseClass::Node => "node",
            BaseClass::Edge => "edge",
            BaseClass::Group => "group",
        }
    }
}

/// A two-part class tag: base class plus optional subclass name, e.g.
/// `node` or `node.city` (spec §9 "Dynamic dispatch on string class
/// names").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassName {
    pub base: BaseClass,
    pub subclass: Option<String>,
}

impl ClassName {
    pub fn base(base: BaseClass) -> Self {
        Self { base, subclass: None }
    }

    pub fn sub(base: BaseClass, subclass: impl Into<String>) -> Self {
        Self {
            base,
            subclass: Some(subclass.into()),
        }
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subclass {
            Some(s) => write!(f, "{}.{}", self.base.as_str(), s),
            None => write!(f, "{}", self.base.as_str()),
        }
    }
}

/// A validated, canonical attribute value. Colours normalise to
/// `#rrggbb`/`#rrggbbaa`; everything else round-trips as text (spec §6.1
/// lists string/colour/angle/port/uint/url/enum/text/lctext as the type
/// tags; this engine only needs to distinguish "plain text" from "colour"
/// for layout-affecting validation, the rest pass through as `Text`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Text(String),
    Color(String),
    Uint(u32),
    Bool(bool),
    /// `|`-separated multi-value attribute (spec §6.1).
    List(Vec<String>),
}

impl AttrValue {
    pub fn as_text(&self) -> String {
        match self {
            AttrValue::Text(s) => s.clone(),
            AttrValue::Color(s) => s.clone(),
            AttrValue::Uint(n) => n.to_string(),
            AttrValue::Bool(b) => b.to_string(),
            AttrValue::List(v) => v.join("|"),
        }
    }
}

/// The type tag an attribute's validator enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    Text,
    Color,
    Uint,
    Bool,
    /// One of a fixed set of strings (the enum list is provided at call
    /// site since it differs per attribute, e.g. `shape`, `flow`).
    Enum,
}

/// Validates a raw attribute string against its declared type, returning a
/// canonical `AttrValue` or the specific §7 error kind.
pub fn validate(
    class: &ClassName,
    name: &str,
    raw: &str,
    ty: AttrType,
    enum_values: &[&str],
) -> Result<AttrValue, GraphError> {
    match ty {
        AttrType::Text => Ok(AttrValue::Text(raw.to_string())),
        AttrType::Bool => match raw {
            "1" | "true" | "yes" => Ok(AttrValue::Bool(true)),
            "0" | "false" | "no" => Ok(AttrValue::Bool(false)),
            _ => Err(invalid_value(class, name, raw, "boolean")),
        },
        AttrType::Uint => raw
            .parse::<u32>()
            .map(AttrValue::Uint)
            .map_err(|_| invalid_value(class, name, raw, "non-negative integer")),
        AttrType::Enum => {
            if raw.contains('|') {
                let parts: Vec<String> = raw.split('|').map(|s| s.to_string()).collect();
                for p in &parts {
                    if !enum_values.contains(&p.as_str()) {
                        return Err(invalid_value(class, name, p, "enum value"));
                    }
                }
                Ok(AttrValue::List(parts))
            } else if enum_values.contains(&raw) {
                Ok(AttrValue::Text(raw.to_string()))
            } else {
                Err(invalid_value(class, name, raw, "enum value"))
            }
        }
        AttrType::Color => parse_color(raw)
            .map(AttrValue::Color)
            .ok_or_else(|| invalid_value(class, name, raw, "color")),
    }
}

fn invalid_value(class: &ClassName, name: &str, value: &str, kind: &str) -> GraphError {
    GraphError::InvalidAttributeValue {
        class: class.to_string(),
        name: name.to_string(),
        value: value.to_string(),
        kind: kind.to_string(),
    }
}

/// Normalises named/hex/functional colour syntax to `#rrggbb` or
/// `#rrggbbaa`, per spec §6.1. The named-colour table is a small, open
/// subset (W3C basics); the original's full X11/ColorBrewer tables are a
/// rendering concern layered on top of this core validator, not part of
/// the layout engine proper.
fn parse_color(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let Some(hex) = raw.strip_prefix('#') {
        return normalize_hex(hex);
    }
    if let Some(inner) = raw.strip_prefix("rgb(").and_then(|s| s.strip_suffix(')')) {
        let parts: Vec<&str> = inner.split(',').map(|s| s.trim()).collect();
        if parts.len() == 3 {
            let mut out = String::from("#");
            for p in parts {
                let v: u32 = p.parse().ok()?;
                if v > 255 {
                    return None;
                }
                out.push_str(&format!("{:02x}", v));
            }
            return Some(out);
        }
        return None;
    }
    named_color(raw).map(|s| s.to_string())
}

fn normalize_hex(hex: &str) -> Option<String> {
    match hex.len() {
        3 => {
            let mut out = String::from("#");
            for c in hex.chars() {
                if !c.is_ascii_hexdigit() {
                    return None;
                }
                out.push(c);
                out.push(c);
            }
            Some(out)
        }
        6 | 8 => {
            if hex.chars().all(|c| c.is_ascii_hexdigit()) {
                Some(format!("#{}", hex.to_lowercase()))
            } else {
                None
            }
        }
        _ => None,
    }
}

fn named_color(name: &str) -> Option<&'static str> {
    let table: &[(&str, &str)] = &[
        ("black", "#000000"),
        ("white", "#ffffff"),
        ("red", "#ff0000"),
        ("green", "#008000"),
        ("blue", "#0000ff"),
        ("yellow", "#ffff00"),
        ("gray", "#808080"),
        ("grey", "#808080"),
        ("orange", "#ffa500"),
        ("purple", "#800080"),
    ];
    table
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| *v)
}

/// Map-of-maps attribute store: class -> attribute name -> value, plus a
/// per-object override map keyed by an opaque object key (spec §9 keeps
/// the nested-hash shape but types the values).
#[derive(Debug, Clone, Default)]
pub struct AttributeTable {
    class_values: HashMap<ClassName, HashMap<String, AttrValue>>,
    object_values: HashMap<u64, HashMap<String, AttrValue>>,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_class(&mut self, class: ClassName, name: impl Into<String>, value: AttrValue) {
        self.class_values.entry(class).or_default().insert(name.into(), value);
    }

    pub fn set_object(&mut self, object_key: u64, name: impl Into<String>, value: AttrValue) {
        self.object_values.entry(object_key).or_default().insert(name.into(), value);
    }

    /// `raw_attribute`: returns `None` when unset anywhere in the
    /// inheritance chain object -> subclass -> base class.
    pub fn raw_attribute(&self, object_key: Option<u64>, class: &ClassName, name: &str) -> Option<&AttrValue> {
        if let Some(key) = object_key {
            if let Some(v) = self.object_values.get(&key).and_then(|m| m.get(name)) {
                return Some(v);
            }
        }
        if let Some(v) = self.class_values.get(class).and_then(|m| m.get(name)) {
            return Some(v);
        }
        if class.subclass.is_some() {
            let base = ClassName::base(class.base);
            if let Some(v) = self.class_values.get(&base).and_then(|m| m.get(name)) {
                return Some(v);
            }
        }
        None
    }

    /// `attribute`: always returns the effective value, falling back to
    /// `default` when nothing in the chain set it.
    pub fn attribute(&self, object_key: Option<u64>, class: &ClassName, name: &str, default: &AttrValue) -> AttrValue {
        self.raw_attribute(object_key, class, name).cloned().unwrap_or_else(|| default.clone())
    }
}
