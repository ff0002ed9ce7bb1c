use crate::candidate;
use crate::catalog;
use crate::css::CompiledRule;
use crate::theme::ThemeStore;
use crate::utilities::UtilityRegistry;
use crate::variants::VariantRegistry;

/// The three stores a compiler resolves candidates against
///
/// Mutable while directives, config files and plugins are applied; the
/// compiler then wraps it in an `Arc` and only ever reads it.
#[derive(Debug, Clone, Default)]
pub struct DesignSystem {
    pub theme: ThemeStore,
    pub variants: VariantRegistry,
    pub utilities: UtilityRegistry,
}

impl DesignSystem {
    /// Empty theme, built-in variants and the default utility catalog
    pub fn new() -> Self {
        let mut utilities = UtilityRegistry::new();
        catalog::register_defaults(&mut utilities);
        Self {
            theme: ThemeStore::new(),
            variants: VariantRegistry::with_builtins(),
            utilities,
        }
    }

    pub fn with_theme(mut self, theme: ThemeStore) -> Self {
        self.theme = theme;
        self
    }

    /// Compile one candidate, `None` when it does not match
    pub fn compile_candidate(&self, candidate: &str) -> Option<CompiledRule> {
        candidate::compile(self, candidate)
    }
}
