use crate::errors::{CompilerError, Result};
use crate::plugin::Plugin;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, warn};

/// Legacy configuration tree
///
/// Mirrors the nested object of a legacy config file: theme tokens, a
/// dark-mode strategy, content globs, plugins and presets. Presets are
/// themselves config trees and may nest further presets.
#[derive(Debug, Clone, Default)]
pub struct ConfigTree {
    pub theme: Option<ThemeConfig>,
    pub dark_mode: Option<DarkModeSpec>,
    pub plugins: Vec<Plugin>,
    pub presets: Vec<ConfigTree>,
    pub content: Vec<String>,
}

/// The `theme` key of a config tree
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ThemeConfig {
    /// Top-level namespaces that replace the inherited namespace wholesale
    #[serde(flatten)]
    pub overrides: Map<String, Value>,
    /// Fragment deep-merged on top of the inherited theme
    #[serde(default)]
    pub extend: Map<String, Value>,
}

/// How the `dark` variant is synthesized
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DarkModeSpec {
    /// `prefers-color-scheme: dark` media query
    Media,
    /// Ancestor-or-self matches the selector (`.dark` when not given)
    Selector(Option<String>),
    /// Selector(s) used verbatim, outermost first
    Variant(Vec<String>),
}

/// Supported config file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("json") => Ok(ConfigFormat::Json),
            _ => Err(CompilerError::Load {
                path: path.display().to_string(),
                message: "unsupported config file format, use .json, .yaml or .yml".to_string(),
            }),
        }
    }
}

impl ConfigTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config tree from a JSON value, validating known keys
    ///
    /// Unknown keys are ignored. The first malformed known key fails the
    /// whole conversion with its dotted path.
    pub fn from_value(value: &Value) -> Result<Self> {
        Self::from_value_at(value, "")
    }

    /// Parse config text in the given format
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        let value: Value = match format {
            ConfigFormat::Json => serde_json::from_str(content)?,
            ConfigFormat::Yaml => {
                // Going through serde_yaml::Value keeps numeric keys such as `500:`
                let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;
                serde_json::to_value(yaml)?
            }
        };
        Self::from_value(&value)
    }

    /// Load configuration from a file (auto-detect format)
    pub fn from_file(path: &Path) -> Result<Self> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| CompilerError::Load {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&content, format)
    }

    fn from_value_at(value: &Value, path: &str) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(CompilerError::config(
                display_path(path),
                format!("expected an object, found {}", kind(value)),
            ));
        };

        let mut tree = ConfigTree::default();

        if let Some(theme) = map.get("theme") {
            tree.theme = Some(ThemeConfig::from_value_at(theme, &join(path, "theme"))?);
        }

        if let Some(dark_mode) = map.get("darkMode") {
            tree.dark_mode = DarkModeSpec::from_value_at(dark_mode, &join(path, "darkMode"))?;
        }

        if let Some(content) = map.get("content") {
            tree.content = parse_content(content, &join(path, "content"))?;
        }

        if let Some(presets) = map.get("presets") {
            let presets_path = join(path, "presets");
            let Value::Array(items) = presets else {
                return Err(CompilerError::config(
                    presets_path,
                    format!("expected an array, found {}", kind(presets)),
                ));
            };
            for (idx, preset) in items.iter().enumerate() {
                tree.presets
                    .push(Self::from_value_at(preset, &format!("{}[{}]", presets_path, idx))?);
            }
        }

        if let Some(plugins) = map.get("plugins") {
            let plugins_path = join(path, "plugins");
            match plugins {
                Value::Array(items) if items.is_empty() => {}
                Value::Array(items) => {
                    warn!(
                        path = %plugins_path,
                        count = items.len(),
                        "plugins listed in config data are ignored, attach them with ConfigTree::with_plugin"
                    );
                }
                other => {
                    return Err(CompilerError::config(
                        plugins_path,
                        format!("expected an array, found {}", kind(other)),
                    ));
                }
            }
        }

        debug!(
            path = %display_path(path),
            presets = tree.presets.len(),
            content = tree.content.len(),
            "parsed config tree"
        );

        Ok(tree)
    }

    pub fn with_theme(mut self, theme: ThemeConfig) -> Self {
        self.theme = Some(theme);
        self
    }

    pub fn with_dark_mode(mut self, dark_mode: DarkModeSpec) -> Self {
        self.dark_mode = Some(dark_mode);
        self
    }

    pub fn with_plugin(mut self, plugin: Plugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn with_preset(mut self, preset: ConfigTree) -> Self {
        self.presets.push(preset);
        self
    }

    pub fn with_content(mut self, glob: impl Into<String>) -> Self {
        self.content.push(glob.into());
        self
    }

    /// Check invariants the typed builders cannot express
    ///
    /// Walks presets and plugin config fragments so that a bad nested value
    /// is reported before anything is merged.
    pub fn validate(&self) -> Result<()> {
        self.validate_at("")
    }

    fn validate_at(&self, path: &str) -> Result<()> {
        if let Some(DarkModeSpec::Variant(selectors)) = &self.dark_mode {
            if selectors.is_empty() {
                return Err(CompilerError::config(
                    join(path, "darkMode"),
                    "variant dark mode needs at least one selector",
                ));
            }
            if let Some(idx) = selectors.iter().position(|s| s.trim().is_empty()) {
                return Err(CompilerError::config(
                    format!("{}[1][{}]", join(path, "darkMode"), idx),
                    "selector must not be empty",
                ));
            }
        }
        if let Some(DarkModeSpec::Selector(Some(selector))) = &self.dark_mode {
            if selector.trim().is_empty() {
                return Err(CompilerError::config(
                    join(path, "darkMode"),
                    "selector must not be empty",
                ));
            }
        }
        for (idx, preset) in self.presets.iter().enumerate() {
            preset.validate_at(&format!("{}[{}]", join(path, "presets"), idx))?;
        }
        for (idx, plugin) in self.plugins.iter().enumerate() {
            if let Some(config) = plugin.config() {
                config.validate_at(&format!("{}[{}].config", join(path, "plugins"), idx))?;
            }
        }
        Ok(())
    }
}

impl ThemeConfig {
    pub fn from_value(value: &Value) -> Result<Self> {
        Self::from_value_at(value, "theme")
    }

    fn from_value_at(value: &Value, path: &str) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(CompilerError::config(
                path,
                format!("expected an object, found {}", kind(value)),
            ));
        };
        if let Some(extend) = map.get("extend").filter(|v| !v.is_object()) {
            return Err(CompilerError::config(
                format!("{}.extend", path),
                format!("expected an object, found {}", kind(extend)),
            ));
        }
        ThemeConfig::deserialize(value).map_err(|e| CompilerError::config(path, e.to_string()))
    }
}

impl DarkModeSpec {
    /// `false` means "not configured" and yields `None`
    fn from_value_at(value: &Value, path: &str) -> Result<Option<Self>> {
        let invalid = |message: String| Err(CompilerError::config(path, message));

        match value {
            Value::Bool(false) | Value::Null => Ok(None),
            Value::String(mode) => match mode.as_str() {
                "media" => Ok(Some(DarkModeSpec::Media)),
                "selector" | "class" => Ok(Some(DarkModeSpec::Selector(None))),
                other => invalid(format!(
                    "unknown dark mode `{}`, expected `media`, `selector` or `class`",
                    other
                )),
            },
            Value::Array(items) => {
                let Some(Value::String(mode)) = items.first() else {
                    return invalid("expected `[mode, selector]`".to_string());
                };
                let argument = items.get(1);
                match (mode.as_str(), argument) {
                    ("variant", Some(Value::String(selector))) if !selector.trim().is_empty() => {
                        Ok(Some(DarkModeSpec::Variant(vec![selector.clone()])))
                    }
                    ("variant", Some(Value::Array(selectors))) if !selectors.is_empty() => {
                        let mut out = Vec::with_capacity(selectors.len());
                        for (idx, selector) in selectors.iter().enumerate() {
                            match selector {
                                Value::String(s) if !s.trim().is_empty() => out.push(s.clone()),
                                other => {
                                    return Err(CompilerError::config(
                                        format!("{}[1][{}]", path, idx),
                                        format!("expected a non-empty selector string, found {}", kind(other)),
                                    ));
                                }
                            }
                        }
                        Ok(Some(DarkModeSpec::Variant(out)))
                    }
                    ("variant", _) => invalid("`variant` dark mode needs a selector or a list of selectors".to_string()),
                    ("selector" | "class", None) => Ok(Some(DarkModeSpec::Selector(None))),
                    ("selector" | "class", Some(Value::String(selector))) if !selector.trim().is_empty() => {
                        Ok(Some(DarkModeSpec::Selector(Some(selector.clone()))))
                    }
                    ("selector" | "class", Some(other)) => invalid(format!(
                        "expected a non-empty selector string, found {}",
                        kind(other)
                    )),
                    (other, _) => invalid(format!("unknown dark mode `{}`", other)),
                }
            }
            other => invalid(format!("expected a string or an array, found {}", kind(other))),
        }
    }
}

fn parse_content(value: &Value, path: &str) -> Result<Vec<String>> {
    let (items, items_path) = match value {
        Value::Array(items) => (items, path.to_string()),
        Value::Object(map) => match map.get("files") {
            Some(Value::Array(items)) => (items, format!("{}.files", path)),
            Some(other) => {
                return Err(CompilerError::config(
                    format!("{}.files", path),
                    format!("expected an array, found {}", kind(other)),
                ));
            }
            None => return Ok(Vec::new()),
        },
        other => {
            return Err(CompilerError::config(
                path,
                format!("expected an array, found {}", kind(other)),
            ));
        }
    };

    let mut globs = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        match item {
            Value::String(glob) => globs.push(glob.clone()),
            // Inline `{ raw: "..." }` sources carry no glob
            Value::Object(raw) if raw.contains_key("raw") => {}
            other => {
                return Err(CompilerError::config(
                    format!("{}[{}]", items_path, idx),
                    format!("expected a glob string, found {}", kind(other)),
                ));
            }
        }
    }
    Ok(globs)
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
