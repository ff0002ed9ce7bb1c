//! Plugins and the capability object handed to their handlers.
//!
//! A handler never touches the registries directly: it receives a
//! [`PluginApi`] that can read the theme and register utilities and
//! variants, and nothing else.

use crate::config::ConfigTree;
use crate::design::DesignSystem;
use crate::errors::{CompilerError, Result};
use crate::theme::value_to_css;
use crate::utilities::{declarations_from_object, parse_utility_object, UtilityValue};
use crate::variants::{Tier, VariantRule};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Imperative part of a plugin
pub type PluginHandler = Arc<dyn Fn(&mut PluginApi<'_>) -> anyhow::Result<()> + Send + Sync>;

/// A plugin reference: an optional handler plus an optional config fragment
#[derive(Clone)]
pub struct Plugin {
    name: String,
    handler: Option<PluginHandler>,
    config: Option<Box<ConfigTree>>,
}

impl Plugin {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut PluginApi<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            handler: Some(Arc::new(handler)),
            config: None,
        }
    }

    /// A plugin that also contributes declaratively to the config
    pub fn with_config<F>(name: impl Into<String>, handler: F, config: ConfigTree) -> Self
    where
        F: Fn(&mut PluginApi<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            config: Some(Box::new(config)),
            ..Self::new(name, handler)
        }
    }

    /// A plugin with no handler, only a config fragment
    pub fn config_only(name: impl Into<String>, config: ConfigTree) -> Self {
        Self {
            name: name.into(),
            handler: None,
            config: Some(Box::new(config)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> Option<&ConfigTree> {
        self.config.as_deref()
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("handler", &self.handler.is_some())
            .field("config", &self.config)
            .finish()
    }
}

/// Capabilities exposed to a plugin handler
pub struct PluginApi<'a> {
    plugin: &'a str,
    design: &'a mut DesignSystem,
}

impl<'a> PluginApi<'a> {
    pub(crate) fn new(plugin: &'a str, design: &'a mut DesignSystem) -> Self {
        Self { plugin, design }
    }

    /// Name of the plugin being run
    pub fn plugin_name(&self) -> &str {
        self.plugin
    }

    /// Read a theme value, e.g. `theme("colors.primary")`
    pub fn theme(&self, path: &str) -> Option<Value> {
        self.design.theme.get(path).cloned()
    }

    /// Read a theme value, falling back to `default`
    pub fn theme_or(&self, path: &str, default: impl Into<Value>) -> Value {
        self.theme(path).unwrap_or_else(|| default.into())
    }

    /// A theme namespace flattened to utility value names
    pub fn theme_values(&self, namespace: &str) -> IndexMap<String, String> {
        self.design.theme.namespace(namespace)
    }

    /// Register static utilities from a `{ ".name": { prop: value } }` object
    pub fn add_utilities(&mut self, utilities: Value) -> Result<()> {
        for (name, nodes) in parse_utility_object(&utilities)? {
            debug!(plugin = self.plugin, utility = %name, "registering utility");
            self.design.utilities.add_static(name, nodes);
        }
        Ok(())
    }

    /// Components share the utility registry
    pub fn add_components(&mut self, components: Value) -> Result<()> {
        self.add_utilities(components)
    }

    /// Register or overwrite a variant at config tier
    ///
    /// A variant defined by an `@variant` directive keeps its place.
    pub fn add_variant(&mut self, name: &str, rule: &str) -> Result<()> {
        let rule = VariantRule::parse(name, rule)?;
        self.design.variants.set(name, rule, Tier::Config);
        Ok(())
    }

    /// Register a functional utility `name-<value>`
    ///
    /// Named values come from `values`; arbitrary `name-[...]` values are
    /// passed through as-is. `build` returns a CSS-in-JS declaration object.
    pub fn match_utilities<F>(&mut self, name: &str, values: IndexMap<String, String>, build: F)
    where
        F: Fn(&str) -> Value + Send + Sync + 'static,
    {
        debug!(plugin = self.plugin, utility = name, values = values.len(), "registering functional utility");
        self.design.utilities.add_functional(name, move |value, _theme| {
            let resolved = match value {
                UtilityValue::Named(key) => values.get(*key)?.clone(),
                UtilityValue::Arbitrary(raw) => raw.clone(),
            };
            match build(&resolved) {
                Value::Object(body) => Some(declarations_from_object(&body)),
                _ => None,
            }
        });
    }

    /// Convenience for `theme(path)` rendered as CSS text
    pub fn theme_css(&self, path: &str) -> Option<String> {
        self.design.theme.get(path).and_then(value_to_css)
    }
}

/// Run plugin handlers in order against the design system
///
/// Config fragments were already folded in by the merger; only handlers run
/// here. The first failing handler aborts the run.
pub fn run_plugins(plugins: &[Plugin], design: &mut DesignSystem) -> Result<()> {
    for plugin in plugins {
        let Some(handler) = &plugin.handler else {
            continue;
        };
        debug!(plugin = %plugin.name, "running plugin");
        let mut api = PluginApi::new(&plugin.name, design);
        handler(&mut api).map_err(|e| CompilerError::Plugin {
            plugin: plugin.name.clone(),
            message: format!("{:#}", e),
        })?;
    }
    Ok(())
}
