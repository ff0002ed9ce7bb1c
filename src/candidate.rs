use crate::css::{escape_class, CompiledRule};
use crate::design::DesignSystem;
use crate::variants::VariantRule;
use tracing::trace;

/// Variant separator inside a candidate
pub const SEPARATOR: char = ':';

/// A candidate split into its variant chain and base utility
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCandidate<'a> {
    pub raw: &'a str,
    /// Variant names, outermost first
    pub variants: Vec<&'a str>,
    pub base: &'a str,
    pub important: bool,
}

/// Split a candidate on top-level separators
///
/// Separators inside `[...]` or `(...)` and backslash-escaped separators are
/// not split points. Returns `None` for empty segments (`dark::x`, `x:`).
pub fn parse(raw: &str) -> Option<ParsedCandidate<'_>> {
    if raw.is_empty() {
        return None;
    }

    let mut paren_depth = 0usize;
    let mut bracket_depth = 0usize;
    let mut escaped = false;
    let mut segments = Vec::new();
    let mut start = 0usize;

    for (idx, ch) in raw.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '(' => paren_depth += 1,
            ')' => paren_depth = paren_depth.saturating_sub(1),
            '[' => bracket_depth += 1,
            ']' => bracket_depth = bracket_depth.saturating_sub(1),
            SEPARATOR if paren_depth == 0 && bracket_depth == 0 => {
                segments.push(&raw[start..idx]);
                start = idx + SEPARATOR.len_utf8();
            }
            _ => {}
        }
    }
    segments.push(&raw[start..]);

    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }

    let mut base = segments.pop()?;
    let mut important = false;
    if let Some(stripped) = base.strip_suffix('!') {
        base = stripped;
        important = true;
    } else if let Some(stripped) = base.strip_prefix('!') {
        base = stripped;
        important = true;
    }
    if base.is_empty() {
        return None;
    }

    Some(ParsedCandidate {
        raw,
        variants: segments,
        base,
        important,
    })
}

/// Compile one candidate against a frozen design system
///
/// Unknown variants or utilities yield `None`; they are expected in large
/// speculative candidate lists and are not errors.
pub fn compile(design: &DesignSystem, raw: &str) -> Option<CompiledRule> {
    let Some(parsed) = parse(raw) else {
        trace!(candidate = raw, "unparseable candidate");
        return None;
    };

    let mut rules = Vec::with_capacity(parsed.variants.len());
    for name in &parsed.variants {
        match resolve_variant(design, name) {
            Some(rule) => rules.push(rule),
            None => {
                trace!(candidate = raw, variant = *name, "unknown variant");
                return None;
            }
        }
    }

    let Some(mut nodes) = design.utilities.resolve(parsed.base, &design.theme) else {
        trace!(candidate = raw, utility = parsed.base, "unknown utility");
        return None;
    };
    if nodes.is_empty() {
        return None;
    }

    if parsed.important {
        nodes.iter_mut().for_each(|node| node.make_important());
    }

    // Rightmost variant wraps the declarations first
    for rule in rules.iter().rev() {
        nodes = rule.wrap(nodes);
    }

    Some(CompiledRule {
        selector: format!(".{}", escape_class(raw)),
        nodes,
    })
}

fn resolve_variant(design: &DesignSystem, name: &str) -> Option<VariantRule> {
    // Arbitrary variant, e.g. `[&>*]` or `[@media(hover:hover)]`
    if let Some(body) = name.strip_prefix('[').and_then(|n| n.strip_suffix(']')) {
        let body = body.replace('_', " ");
        if body.trim().is_empty() {
            return None;
        }
        if body.starts_with('@') {
            return Some(VariantRule::AtRule(body));
        }
        if !body.contains('&') {
            return None;
        }
        return Some(VariantRule::Selector(body));
    }
    design.variants.get(name).map(|entry| entry.rule.clone())
}
