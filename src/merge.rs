//! Config merger: flattens preset and plugin-config trees into one linear
//! application order, then folds theme, dark mode and content into the
//! stores.

use crate::config::{ConfigTree, DarkModeSpec, ThemeConfig};
use crate::errors::Result;
use crate::plugin::Plugin;
use crate::theme::ThemeStore;
use crate::variants::{dark_mode_variant, VariantEntry};
use tracing::debug;

/// The fields one tree contributes at its place in the application order
#[derive(Debug, Clone, Copy, Default)]
pub struct Layer<'a> {
    pub theme: Option<&'a ThemeConfig>,
    pub dark_mode: Option<&'a DarkModeSpec>,
    /// Empty for plugin config fragments
    pub content: &'a [String],
}

impl<'a> Layer<'a> {
    fn tree(tree: &'a ConfigTree) -> Self {
        Self {
            theme: tree.theme.as_ref(),
            dark_mode: tree.dark_mode.as_ref(),
            content: &tree.content,
        }
    }

    fn fragment(tree: &'a ConfigTree) -> Self {
        Self {
            content: &[],
            ..Self::tree(tree)
        }
    }
}

/// Config layers in application order, plus the plugins they declare
#[derive(Debug, Default)]
pub struct Flattened<'a> {
    /// Presets come first, a tree's own fields come after everything it pulls in
    pub layers: Vec<Layer<'a>>,
    pub plugins: Vec<&'a Plugin>,
}

/// Flatten `root` depth-first
///
/// For each tree: its presets (recursively, left to right), then the config
/// fragments of its plugins, then the tree itself. A plugin is queued before
/// any plugin nested in its own config fragment, so nested plugins run after
/// their parent's handler.
pub fn flatten(root: &ConfigTree) -> Flattened<'_> {
    let mut flattened = Flattened::default();
    extract(root, &mut flattened);
    flattened
}

fn extract<'a>(tree: &'a ConfigTree, out: &mut Flattened<'a>) {
    for preset in &tree.presets {
        extract(preset, out);
    }
    extract_plugins(&tree.plugins, out);
    out.layers.push(Layer::tree(tree));
}

// A plugin's config fragment is root-less: theme, darkMode and nested
// plugins only. Its content and presets are not applied.
fn extract_plugins<'a>(plugins: &'a [Plugin], out: &mut Flattened<'a>) {
    for plugin in plugins {
        out.plugins.push(plugin);
        let Some(config) = plugin.config() else {
            continue;
        };
        if !config.content.is_empty() || !config.presets.is_empty() {
            debug!(
                plugin = plugin.name(),
                content = config.content.len(),
                presets = config.presets.len(),
                "ignoring content and presets in plugin config"
            );
        }
        extract_plugins(&config.plugins, out);
        out.layers.push(Layer::fragment(config));
    }
}

/// Result of merging one or more config roots
#[derive(Debug, Default)]
pub struct MergedConfig {
    pub theme: ThemeStore,
    /// Variant entries synthesized from the config (currently only `dark`)
    pub variants: Vec<VariantEntry>,
    /// Content globs, concatenated in application order
    pub content: Vec<String>,
    /// Plugins whose handlers still have to run, in order
    pub plugins: Vec<Plugin>,
}

/// Merge config roots on top of `base`
///
/// Every tree is validated before anything is applied, so the caller sees
/// either a fully merged result or an error.
pub fn merge(base: ThemeStore, roots: &[ConfigTree]) -> Result<MergedConfig> {
    for root in roots {
        root.validate()?;
    }

    let mut layers = Vec::new();
    let mut plugins = Vec::new();
    for root in roots {
        let flattened = flatten(root);
        layers.extend(flattened.layers);
        plugins.extend(flattened.plugins.into_iter().cloned());
    }

    debug!(roots = roots.len(), layers = layers.len(), plugins = plugins.len(), "merging config");

    // Per layer: replace namespaces, then extend
    let mut theme = base;
    for config in layers.iter().filter_map(|layer| layer.theme) {
        for (namespace, value) in &config.overrides {
            theme.replace(namespace, value.clone());
        }
        theme.extend(&config.extend);
    }

    let dark_mode = layers.iter().filter_map(|layer| layer.dark_mode).last();
    let variants = dark_mode.map(dark_mode_variant).into_iter().collect();

    let content = layers
        .iter()
        .flat_map(|layer| layer.content.iter().cloned())
        .collect();

    Ok(MergedConfig {
        theme,
        variants,
        content,
        plugins,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::VariantRule;
    use serde_json::json;

    fn tree(value: serde_json::Value) -> ConfigTree {
        ConfigTree::from_value(&value).unwrap()
    }

    fn primary(config: &MergedConfig) -> Option<String> {
        config.theme.get_css("colors.primary")
    }

    #[test]
    fn test_flatten_order_is_depth_first_presets_before_own_fields() {
        let root = ConfigTree::new()
            .with_content("root")
            .with_preset(
                ConfigTree::new()
                    .with_content("a")
                    .with_preset(ConfigTree::new().with_content("a.inner")),
            )
            .with_preset(ConfigTree::new().with_content("b"));

        let order: Vec<&str> = flatten(&root)
            .layers
            .iter()
            .flat_map(|layer| layer.content.iter().map(String::as_str))
            .collect();
        assert_eq!(order, vec!["a.inner", "a", "b", "root"]);
    }

    #[test]
    fn test_root_overrides_presets() {
        let root = tree(json!({
            "presets": [
                { "theme": { "extend": { "colors": { "primary": "a" } } } },
                { "theme": { "extend": { "colors": { "primary": "b" } } } }
            ],
            "theme": { "extend": { "colors": { "primary": "root" } } }
        }));
        assert_eq!(primary(&merge(ThemeStore::new(), &[root]).unwrap()).as_deref(), Some("root"));
    }

    #[test]
    fn test_later_preset_overrides_earlier() {
        let root = tree(json!({
            "presets": [
                { "theme": { "extend": { "colors": { "secondary": "a" } } } },
                { "theme": { "extend": { "colors": { "primary": "b" } } } }
            ]
        }));
        let merged = merge(ThemeStore::new(), &[root]).unwrap();
        assert_eq!(primary(&merged).as_deref(), Some("b"));
        assert_eq!(merged.theme.get_css("colors.secondary").as_deref(), Some("a"));
    }

    #[test]
    fn test_extend_keeps_inherited_leaves() {
        let mut base = ThemeStore::new();
        base.extend(json!({ "colors": { "red": { "500": "#f00", "600": "#d00" } } }).as_object().unwrap());

        let root = tree(json!({
            "theme": { "extend": { "colors": { "red": { "500": "#e11" } } } }
        }));
        let merged = merge(base, &[root]).unwrap();
        assert_eq!(merged.theme.get_css("colors.red.500").as_deref(), Some("#e11"));
        assert_eq!(merged.theme.get_css("colors.red.600").as_deref(), Some("#d00"));
    }

    #[test]
    fn test_root_override_beats_preset_extend() {
        let root = tree(json!({
            "presets": [
                { "theme": { "extend": { "colors": { "primary": "#aaa" } } } },
                { "theme": { "extend": { "colors": { "primary": "#bbb", "accent": "#a00" } } } }
            ],
            "theme": { "colors": { "primary": "#root" } }
        }));
        let merged = merge(ThemeStore::new(), &[root]).unwrap();
        assert_eq!(primary(&merged).as_deref(), Some("#root"));
        // The root replaced the whole namespace
        assert_eq!(merged.theme.get_css("colors.accent"), None);
    }

    #[test]
    fn test_own_extend_applies_after_own_override() {
        let root = tree(json!({
            "presets": [{ "theme": { "colors": { "primary": "#aaa" } } }],
            "theme": {
                "colors": { "brand": "#123" },
                "extend": { "colors": { "accent": "#a00" } }
            }
        }));
        let merged = merge(ThemeStore::new(), &[root]).unwrap();
        assert_eq!(merged.theme.get_css("colors.brand").as_deref(), Some("#123"));
        assert_eq!(merged.theme.get_css("colors.accent").as_deref(), Some("#a00"));
        assert_eq!(primary(&merged), None);
    }

    #[test]
    fn test_later_preset_extend_beats_earlier_preset_override() {
        let root = tree(json!({
            "presets": [
                { "theme": { "colors": { "primary": "#aaa", "red": "#f00" } } },
                { "theme": { "extend": { "colors": { "primary": "#bbb" } } } }
            ]
        }));
        let merged = merge(ThemeStore::new(), &[root]).unwrap();
        assert_eq!(primary(&merged).as_deref(), Some("#bbb"));
        assert_eq!(merged.theme.get_css("colors.red").as_deref(), Some("#f00"));
    }

    #[test]
    fn test_dark_mode_last_write_wins() {
        let root = tree(json!({
            "presets": [{ "darkMode": "media" }],
            "darkMode": ["variant", "&:is(.dark)"]
        }));
        let merged = merge(ThemeStore::new(), &[root]).unwrap();
        assert_eq!(merged.variants.len(), 1);
        assert_eq!(merged.variants[0].rule, VariantRule::Selector("&:is(.dark)".into()));
    }

    #[test]
    fn test_no_dark_mode_installs_nothing() {
        let merged = merge(ThemeStore::new(), &[tree(json!({ "content": ["x"] }))]).unwrap();
        assert!(merged.variants.is_empty());
    }

    #[test]
    fn test_content_concatenated_in_order() {
        let root = tree(json!({
            "presets": [{ "content": ["./preset/**"] }],
            "content": ["./file.txt", "./src/**/*.html"]
        }));
        let merged = merge(ThemeStore::new(), &[root]).unwrap();
        assert_eq!(merged.content, vec!["./preset/**", "./file.txt", "./src/**/*.html"]);
    }

    #[test]
    fn test_plugin_config_fragments_fold_before_their_owner() {
        let plugin = Plugin::config_only(
            "dark-plugin",
            ConfigTree::new().with_dark_mode(DarkModeSpec::Variant(vec!["&:where(:not(.light))".into()])),
        );
        let merged = merge(ThemeStore::new(), &[ConfigTree::new().with_plugin(plugin)]).unwrap();
        assert_eq!(
            merged.variants[0].rule,
            VariantRule::Selector("&:where(:not(.light))".into())
        );

        // The owning tree's own darkMode still wins
        let plugin = Plugin::config_only("p", ConfigTree::new().with_dark_mode(DarkModeSpec::Media));
        let root = ConfigTree::new()
            .with_plugin(plugin)
            .with_dark_mode(DarkModeSpec::Selector(None));
        let merged = merge(ThemeStore::new(), &[root]).unwrap();
        assert_eq!(
            merged.variants[0].rule,
            VariantRule::Selector("&:where(.dark, .dark *)".into())
        );
    }

    #[test]
    fn test_plugin_fragment_contributes_theme_and_dark_mode_only() {
        let fragment = tree(json!({
            "content": ["x"],
            "presets": [{ "content": ["from-fragment-preset"], "theme": { "colors": { "primary": "#bad" } } }],
            "theme": { "extend": { "colors": { "accent": "#a00" } } },
            "darkMode": "media"
        }));
        let root = ConfigTree::new()
            .with_content("./root.html")
            .with_plugin(Plugin::config_only("fragment", fragment));

        let merged = merge(ThemeStore::new(), &[root]).unwrap();
        assert_eq!(merged.content, vec!["./root.html"]);
        assert_eq!(merged.theme.get_css("colors.accent").as_deref(), Some("#a00"));
        assert_eq!(primary(&merged), None);
        assert_eq!(
            merged.variants[0].rule,
            VariantRule::AtRule("@media (prefers-color-scheme: dark)".into())
        );
    }

    #[test]
    fn test_plugin_order_presets_first_nested_after_parent() {
        let nested = Plugin::new("nested", |_| Ok(()));
        let parent = Plugin::with_config("parent", |_| Ok(()), ConfigTree::new().with_plugin(nested));
        let root = ConfigTree::new()
            .with_preset(ConfigTree::new().with_plugin(Plugin::new("from-preset", |_| Ok(()))))
            .with_plugin(parent)
            .with_plugin(Plugin::new("last", |_| Ok(())));

        let merged = merge(ThemeStore::new(), &[root]).unwrap();
        let names: Vec<&str> = merged.plugins.iter().map(Plugin::name).collect();
        assert_eq!(names, vec!["from-preset", "parent", "nested", "last"]);
    }

    #[test]
    fn test_invalid_tree_applies_nothing() {
        let good = ConfigTree::new().with_theme(crate::config::ThemeConfig {
            extend: json!({ "colors": { "primary": "x" } }).as_object().unwrap().clone(),
            ..ThemeConfig::default()
        });
        let bad = ConfigTree::new().with_dark_mode(DarkModeSpec::Variant(vec!["".into()]));
        assert!(merge(ThemeStore::new(), &[good, bad]).is_err());
    }
}
