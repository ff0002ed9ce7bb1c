//! Utility registry and the CSS-in-JS object conventions plugins use.

use crate::css::Node;
use crate::errors::{CompilerError, Result};
use crate::theme::{value_to_css, ThemeStore};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Value part of a functional utility candidate (`bg-red-500`, `bg-[#fff]`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtilityValue<'a> {
    Named(&'a str),
    /// Bracket contents with `_` read as a space
    Arbitrary(String),
}

pub type UtilityResolver =
    Arc<dyn Fn(&UtilityValue<'_>, &ThemeStore) -> Option<Vec<Node>> + Send + Sync>;

/// Utility name/root -> declaration producer
#[derive(Clone, Default)]
pub struct UtilityRegistry {
    statics: IndexMap<String, Vec<Node>>,
    functionals: IndexMap<String, UtilityResolver>,
}

impl fmt::Debug for UtilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UtilityRegistry")
            .field("statics", &self.statics.keys().collect::<Vec<_>>())
            .field("functionals", &self.functionals.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl UtilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a static utility, replacing any earlier one with that name
    pub fn add_static(&mut self, name: impl Into<String>, nodes: Vec<Node>) {
        self.statics.insert(name.into(), nodes);
    }

    /// Register a functional utility under `root` (matches `root-<value>`)
    pub fn add_functional<F>(&mut self, root: impl Into<String>, resolver: F)
    where
        F: Fn(&UtilityValue<'_>, &ThemeStore) -> Option<Vec<Node>> + Send + Sync + 'static,
    {
        self.functionals.insert(root.into(), Arc::new(resolver));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.statics.contains_key(name) || self.functionals.contains_key(name)
    }

    /// Resolve a base utility token to its declarations
    ///
    /// Static names win. Otherwise every `-` is tried as the root/value
    /// boundary, longest root first, so `border-x-red` prefers a `border-x`
    /// root over `border`.
    pub fn resolve(&self, token: &str, theme: &ThemeStore) -> Option<Vec<Node>> {
        if let Some(nodes) = self.statics.get(token) {
            return Some(nodes.clone());
        }

        let boundaries: Vec<usize> = token
            .char_indices()
            .filter(|&(idx, ch)| ch == '-' && idx > 0 && !inside_brackets(token, idx))
            .map(|(idx, _)| idx)
            .collect();

        for &idx in boundaries.iter().rev() {
            let (root, rest) = (&token[..idx], &token[idx + 1..]);
            if rest.is_empty() {
                continue;
            }
            let Some(resolver) = self.functionals.get(root) else {
                continue;
            };
            let value = match rest.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
                Some("") => continue,
                Some(raw) => UtilityValue::Arbitrary(raw.replace('_', " ")),
                None => UtilityValue::Named(rest),
            };
            if let Some(nodes) = resolver(&value, theme) {
                return Some(nodes);
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.statics.len() + self.functionals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn inside_brackets(token: &str, idx: usize) -> bool {
    let mut depth = 0i32;
    for ch in token[..idx].chars() {
        match ch {
            '[' => depth += 1,
            ']' => depth -= 1,
            _ => {}
        }
    }
    depth > 0
}

/// Turn an `addUtilities`-style object into `(class name, nodes)` pairs
///
/// Keys are class selectors (`.no-scrollbar`, `.btn:hover`, `.a, .b`);
/// anything after the class name becomes a nested `&...` block.
pub fn parse_utility_object(utilities: &Value) -> Result<Vec<(String, Vec<Node>)>> {
    let mut out = Vec::new();
    match utilities {
        Value::Object(map) => {
            for (selector, body) in map {
                let Value::Object(body) = body else {
                    return Err(CompilerError::InvalidUtility {
                        selector: selector.clone(),
                        message: "utility body must be an object".to_string(),
                    });
                };
                let nodes = declarations_from_object(body);
                for part in selector.split(',') {
                    let (name, suffix) = split_class_selector(part.trim())?;
                    let nodes = if suffix.is_empty() {
                        nodes.clone()
                    } else {
                        vec![Node::block(format!("&{}", suffix), nodes.clone())]
                    };
                    out.push((name, nodes));
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                out.extend(parse_utility_object(item)?);
            }
        }
        other => {
            return Err(CompilerError::InvalidUtility {
                selector: other.to_string(),
                message: "expected an object of selectors".to_string(),
            });
        }
    }
    Ok(out)
}

/// Split `.btn:hover` into (`btn`, `:hover`), honouring `\` escapes
fn split_class_selector(selector: &str) -> Result<(String, &str)> {
    let invalid = |message: &str| CompilerError::InvalidUtility {
        selector: selector.to_string(),
        message: message.to_string(),
    };

    let rest = selector
        .strip_prefix('.')
        .ok_or_else(|| invalid("selector must start with a class, e.g. `.name`"))?;

    let mut name = String::new();
    let mut chars = rest.char_indices();
    let mut end = rest.len();
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some((_, escaped)) => name.push(escaped),
                None => return Err(invalid("dangling escape")),
            },
            c if c.is_alphanumeric() || c == '-' || c == '_' => name.push(c),
            _ => {
                end = idx;
                break;
            }
        }
    }

    if name.is_empty() {
        return Err(invalid("class name is empty"));
    }
    Ok((name, &rest[end..]))
}

/// Convert a CSS-in-JS declaration object into nodes
///
/// Object values become nested blocks, arrays emit one declaration per
/// fallback, `null` is skipped.
pub fn declarations_from_object(body: &Map<String, Value>) -> Vec<Node> {
    let mut nodes = Vec::new();
    for (key, value) in body {
        match value {
            Value::Object(inner) => nodes.push(Node::block(key.clone(), declarations_from_object(inner))),
            Value::Array(values) => {
                let property = to_css_property(key);
                for value in values {
                    if let Some(css) = value_to_css(value) {
                        nodes.push(Node::decl(property.clone(), css));
                    }
                }
            }
            other => {
                if let Some(css) = value_to_css(other) {
                    nodes.push(Node::decl(to_css_property(key), css));
                }
            }
        }
    }
    nodes
}

/// `scrollbarColor` -> `scrollbar-color`, `WebkitAppearance` -> `-webkit-appearance`
pub fn to_css_property(key: &str) -> String {
    if key.starts_with("--") || !key.chars().any(|c| c.is_ascii_uppercase()) {
        return key.to_string();
    }
    let mut out = String::with_capacity(key.len() + 4);
    // `ms` is the one vendor prefix written lowercase in CSS-in-JS
    if key.starts_with("ms") && key[2..].starts_with(|c: char| c.is_ascii_uppercase()) {
        out.push('-');
    }
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
