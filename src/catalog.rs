//! Default utility catalog.
//!
//! A small stand-in for a full built-in catalog: enough static utilities and
//! theme-driven functional roots for config-driven tokens to be usable.

use crate::css::Node;
use crate::theme::ThemeStore;
use crate::utilities::{UtilityRegistry, UtilityValue};

const STATIC_UTILITIES: &[(&str, &str, &str)] = &[
    ("underline", "text-decoration-line", "underline"),
    ("overline", "text-decoration-line", "overline"),
    ("line-through", "text-decoration-line", "line-through"),
    ("no-underline", "text-decoration-line", "none"),
    ("block", "display", "block"),
    ("inline-block", "display", "inline-block"),
    ("inline", "display", "inline"),
    ("flex", "display", "flex"),
    ("inline-flex", "display", "inline-flex"),
    ("grid", "display", "grid"),
    ("hidden", "display", "none"),
    ("italic", "font-style", "italic"),
    ("not-italic", "font-style", "normal"),
];

/// (root, theme namespace, properties)
const COLOR_UTILITIES: &[(&str, &str, &[&str])] = &[
    ("bg", "colors", &["background-color"]),
    ("text", "colors", &["color"]),
    ("border", "colors", &["border-color"]),
    ("decoration", "colors", &["text-decoration-color"]),
];

const SPACING_UTILITIES: &[(&str, &str, &[&str])] = &[
    ("p", "spacing", &["padding"]),
    ("px", "spacing", &["padding-inline"]),
    ("py", "spacing", &["padding-block"]),
    ("m", "spacing", &["margin"]),
    ("mx", "spacing", &["margin-inline"]),
    ("my", "spacing", &["margin-block"]),
    ("gap", "spacing", &["gap"]),
    ("w", "spacing", &["width"]),
    ("h", "spacing", &["height"]),
];

/// Keyword values every sizing utility understands
const SIZE_KEYWORDS: &[(&str, &str)] = &[("auto", "auto"), ("full", "100%"), ("px", "1px")];

/// Keyword values every color utility understands
const COLOR_KEYWORDS: &[(&str, &str)] = &[
    ("inherit", "inherit"),
    ("current", "currentColor"),
    ("transparent", "transparent"),
];

pub fn register_defaults(registry: &mut UtilityRegistry) {
    for &(name, property, value) in STATIC_UTILITIES {
        registry.add_static(name, vec![Node::decl(property, value)]);
    }
    for &(root, namespace, properties) in COLOR_UTILITIES {
        themed(registry, root, namespace, properties, COLOR_KEYWORDS);
    }
    for &(root, namespace, properties) in SPACING_UTILITIES {
        themed(registry, root, namespace, properties, SIZE_KEYWORDS);
    }
}

fn themed(
    registry: &mut UtilityRegistry,
    root: &str,
    namespace: &'static str,
    properties: &'static [&'static str],
    keywords: &'static [(&'static str, &'static str)],
) {
    registry.add_functional(root, move |value: &UtilityValue<'_>, theme: &ThemeStore| {
        let css = match value {
            UtilityValue::Arbitrary(raw) => raw.clone(),
            UtilityValue::Named(name) => theme.resolve(namespace, name).or_else(|| {
                keywords
                    .iter()
                    .find(|(keyword, _)| keyword == name)
                    .map(|(_, css)| css.to_string())
            })?,
        };
        Some(
            properties
                .iter()
                .map(|property| Node::decl(*property, css.clone()))
                .collect(),
        )
    });
}
