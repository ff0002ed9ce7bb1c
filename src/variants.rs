use crate::config::DarkModeSpec;
use crate::css::Node;
use crate::errors::{CompilerError, Result};
use indexmap::IndexMap;
use tracing::debug;

/// Precedence class of a variant's source
///
/// The ordering is total: a higher tier always wins over a lower one, and
/// within one tier the last write wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    /// Installed by the compiler itself
    Builtin,
    /// Legacy config files, presets and plugins
    Config,
    /// `@variant` directives in the stylesheet
    Native,
}

/// How a variant wraps the declarations it applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantRule {
    /// Nested selector, `&` standing for the utility selector
    Selector(String),
    /// At-rule prelude such as `@media (prefers-color-scheme: dark)`
    AtRule(String),
    /// Several wraps, outermost first
    Stack(Vec<VariantRule>),
}

impl VariantRule {
    /// Parse a rule string as given to `addVariant` or `@variant`
    ///
    /// Strings starting with `@` are at-rules, everything else is a nested
    /// selector used verbatim.
    pub fn parse(name: &str, rule: &str) -> Result<Self> {
        let rule = rule.trim();
        if rule.is_empty() {
            return Err(CompilerError::InvalidVariant {
                name: name.to_string(),
                message: "variant rule is empty".to_string(),
            });
        }
        Ok(Self::parse_unchecked(rule))
    }

    // Callers have already rejected empty rules
    fn parse_unchecked(rule: &str) -> Self {
        let rule = rule.trim();
        if rule.starts_with('@') {
            VariantRule::AtRule(rule.to_string())
        } else {
            VariantRule::Selector(rule.to_string())
        }
    }

    /// Wrap `nodes` in this rule
    pub fn wrap(&self, nodes: Vec<Node>) -> Vec<Node> {
        match self {
            VariantRule::Selector(header) | VariantRule::AtRule(header) => {
                vec![Node::block(header.clone(), nodes)]
            }
            VariantRule::Stack(rules) => rules
                .iter()
                .rev()
                .fold(nodes, |inner, rule| rule.wrap(inner)),
        }
    }
}

/// A named variant and the tier it was registered at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantEntry {
    pub name: String,
    pub rule: VariantRule,
    pub tier: Tier,
}

/// Variant name -> definition, resolved by tier then write order
#[derive(Debug, Clone, Default)]
pub struct VariantRegistry {
    entries: IndexMap<String, VariantEntry>,
}

impl VariantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the compiler's own variants
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, rule) in BUILTIN_VARIANTS {
            registry.set(name, VariantRule::parse_unchecked(rule), Tier::Builtin);
        }
        registry
    }

    /// Register `name`, replacing any entry at the same or a lower tier
    ///
    /// Returns `false` when an existing higher-tier entry kept its place.
    pub fn set(&mut self, name: &str, rule: VariantRule, tier: Tier) -> bool {
        if let Some(existing) = self.entries.get(name) {
            if existing.tier > tier {
                debug!(
                    variant = name,
                    existing = ?existing.tier,
                    incoming = ?tier,
                    "refusing to overwrite higher-tier variant"
                );
                return false;
            }
        }
        self.entries.insert(
            name.to_string(),
            VariantEntry {
                name: name.to_string(),
                rule,
                tier,
            },
        );
        true
    }

    pub fn set_entry(&mut self, entry: VariantEntry) -> bool {
        let VariantEntry { name, rule, tier } = entry;
        self.set(&name, rule, tier)
    }

    pub fn get(&self, name: &str) -> Option<&VariantEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

const BUILTIN_VARIANTS: &[(&str, &str)] = &[
    ("hover", "&:hover"),
    ("focus", "&:focus"),
    ("focus-visible", "&:focus-visible"),
    ("focus-within", "&:focus-within"),
    ("active", "&:active"),
    ("visited", "&:visited"),
    ("disabled", "&:disabled"),
    ("first", "&:first-child"),
    ("last", "&:last-child"),
    ("odd", "&:nth-child(odd)"),
    ("even", "&:nth-child(even)"),
    ("sm", "@media (width >= 40rem)"),
    ("md", "@media (width >= 48rem)"),
    ("lg", "@media (width >= 64rem)"),
    ("xl", "@media (width >= 80rem)"),
    ("2xl", "@media (width >= 96rem)"),
    ("print", "@media print"),
    ("motion-safe", "@media (prefers-reduced-motion: no-preference)"),
    ("motion-reduce", "@media (prefers-reduced-motion: reduce)"),
    ("dark", "@media (prefers-color-scheme: dark)"),
];

/// Build the `dark` variant a dark-mode strategy asks for
pub fn dark_mode_variant(spec: &DarkModeSpec) -> VariantEntry {
    let rule = match spec {
        DarkModeSpec::Media => VariantRule::AtRule("@media (prefers-color-scheme: dark)".to_string()),
        DarkModeSpec::Selector(selector) => {
            let selector = selector.as_deref().unwrap_or(".dark");
            VariantRule::Selector(format!("&:where({}, {} *)", selector, selector))
        }
        DarkModeSpec::Variant(selectors) => match selectors.as_slice() {
            [single] => VariantRule::parse_unchecked(single),
            many => VariantRule::Stack(many.iter().map(|s| VariantRule::parse_unchecked(s)).collect()),
        },
    };

    VariantEntry {
        name: "dark".to_string(),
        rule,
        tier: Tier::Config,
    }
}
