use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Resolved design tokens, keyed by namespace (`colors`, `spacing`, ...)
///
/// Values keep the nested shape of the legacy config, so `colors.red.500`
/// is the `500` key inside the `red` object inside the `colors` namespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThemeStore {
    tokens: Map<String, Value>,
}

impl ThemeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a dot-separated path such as `colors.primary` or `spacing[2.5]`
    ///
    /// Keys that themselves contain dots are matched greedily, so
    /// `spacing.2.5` finds a `2.5` key before trying `2` then `5`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let segments = parse_path(path);
        if segments.is_empty() {
            return None;
        }
        lookup(&self.tokens, &segments)
    }

    /// Same as [`ThemeStore::get`], rendered as a CSS value
    pub fn get_css(&self, path: &str) -> Option<String> {
        self.get(path).and_then(value_to_css)
    }

    /// Replace a whole namespace (non-`extend` theme keys)
    pub fn replace(&mut self, namespace: &str, value: Value) {
        self.tokens.insert(namespace.to_string(), value);
    }

    /// Deep-merge an `extend` fragment on top of the current tokens
    pub fn extend(&mut self, extension: &Map<String, Value>) {
        deep_merge(&mut self.tokens, extension);
    }

    /// Flatten one namespace into utility-style names
    ///
    /// `{ red: { 500: "#f00", DEFAULT: "#e00" } }` becomes
    /// `red-500 => #f00` and `red => #e00`.
    pub fn namespace(&self, namespace: &str) -> IndexMap<String, String> {
        let mut out = IndexMap::new();
        if let Some(Value::Object(map)) = self.tokens.get(namespace) {
            flatten_into(&mut out, None, map);
        }
        out
    }

    /// Resolve a utility value name (`red-500`) inside a namespace
    ///
    /// Walks the nested tokens directly, trying the longest dash-joined key
    /// at each level, so `light-blue-500` finds a `light-blue` object.
    pub fn resolve(&self, namespace: &str, name: &str) -> Option<String> {
        match self.tokens.get(namespace) {
            Some(Value::Object(map)) => resolve_name(map, name),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.tokens
    }
}

impl From<Map<String, Value>> for ThemeStore {
    fn from(tokens: Map<String, Value>) -> Self {
        Self { tokens }
    }
}

/// Split `a.b[c.d].e` into `["a", "b", "c.d", "e"]`
fn parse_path(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_bracket = false;

    for ch in path.trim().chars() {
        match ch {
            '[' if !in_bracket => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
                in_bracket = true;
            }
            ']' if in_bracket => {
                segments.push(std::mem::take(&mut current));
                in_bracket = false;
            }
            '.' if !in_bracket => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

fn lookup<'a>(map: &'a Map<String, Value>, segments: &[String]) -> Option<&'a Value> {
    // Longest joined key first
    for take in (1..=segments.len()).rev() {
        let key = segments[..take].join(".");
        let Some(value) = map.get(&key) else {
            continue;
        };
        let rest = &segments[take..];
        if rest.is_empty() {
            return Some(value);
        }
        if let Value::Object(inner) = value {
            if let Some(found) = lookup(inner, rest) {
                return Some(found);
            }
        }
    }
    None
}

/// Merge `overlay` into `base`: objects recurse, every other value is a leaf
/// that overwrites the leaf at the same path. Keys absent from `overlay` are
/// left untouched.
pub(crate) fn deep_merge(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                deep_merge(existing, incoming);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

fn resolve_name(map: &Map<String, Value>, name: &str) -> Option<String> {
    if name.is_empty() || name == "DEFAULT" {
        return None;
    }
    if let Some(value) = map.get(name) {
        if let Some(css) = value_to_css(value) {
            return Some(css);
        }
    }
    let boundaries = name.match_indices('-').map(|(idx, _)| idx).collect::<Vec<_>>();
    for &idx in boundaries.iter().rev() {
        let (key, rest) = (&name[..idx], &name[idx + 1..]);
        if key == "DEFAULT" {
            continue;
        }
        if let Some(Value::Object(inner)) = map.get(key) {
            if let Some(css) = resolve_name(inner, rest) {
                return Some(css);
            }
        }
    }
    None
}

fn flatten_into(out: &mut IndexMap<String, String>, prefix: Option<&str>, map: &Map<String, Value>) {
    for (key, value) in map {
        let name = match (prefix, key.as_str()) {
            (Some(prefix), "DEFAULT") => prefix.to_string(),
            (None, "DEFAULT") => continue,
            (Some(prefix), key) => format!("{}-{}", prefix, key),
            (None, key) => key.to_string(),
        };
        match value {
            Value::Object(inner) => flatten_into(out, Some(&name), inner),
            other => {
                if let Some(css) = value_to_css(other) {
                    out.insert(name, css);
                }
            }
        }
    }
}

/// Render a theme value as CSS text
pub(crate) fn value_to_css(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        // Font stacks and similar lists
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(value_to_css).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        Value::Object(map) => map.get("DEFAULT").and_then(value_to_css),
        Value::Null => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store(value: Value) -> ThemeStore {
        match value {
            Value::Object(map) => ThemeStore::from(map),
            _ => panic!("theme fixture must be an object"),
        }
    }

    #[test]
    fn test_get_dotted_and_bracket_paths() {
        let theme = store(json!({
            "colors": { "primary": "#c0ffee", "red": { "500": "#f00" } },
            "spacing": { "2.5": "0.625rem" }
        }));

        assert_eq!(theme.get("colors.primary"), Some(&json!("#c0ffee")));
        assert_eq!(theme.get("colors.red.500"), Some(&json!("#f00")));
        assert_eq!(theme.get("spacing[2.5]"), Some(&json!("0.625rem")));
        assert_eq!(theme.get("spacing.2.5"), Some(&json!("0.625rem")));
        assert_eq!(theme.get("colors.missing"), None);
        assert_eq!(theme.get(""), None);
    }

    #[test]
    fn test_extend_is_a_deep_merge() {
        let mut theme = store(json!({
            "colors": { "red": { "500": "#f00", "600": "#d00" }, "blue": "#00f" }
        }));
        let extension = json!({ "colors": { "red": { "500": "#e11" }, "green": "#0f0" } });
        theme.extend(extension.as_object().unwrap());

        assert_eq!(theme.get_css("colors.red.500").as_deref(), Some("#e11"));
        assert_eq!(theme.get_css("colors.red.600").as_deref(), Some("#d00"));
        assert_eq!(theme.get_css("colors.blue").as_deref(), Some("#00f"));
        assert_eq!(theme.get_css("colors.green").as_deref(), Some("#0f0"));
    }

    #[test]
    fn test_replace_drops_previous_namespace() {
        let mut theme = store(json!({ "colors": { "red": "#f00" } }));
        theme.replace("colors", json!({ "brand": "#123" }));
        assert_eq!(theme.get("colors.red"), None);
        assert_eq!(theme.get_css("colors.brand").as_deref(), Some("#123"));
    }

    #[test]
    fn test_namespace_flattening() {
        let theme = store(json!({
            "colors": {
                "primary": "#c0ffee",
                "red": { "DEFAULT": "#e00", "500": "#f00" }
            },
            "fontFamily": { "sans": ["Inter", "sans-serif"] }
        }));

        let colors = theme.namespace("colors");
        assert_eq!(colors.get("primary").map(String::as_str), Some("#c0ffee"));
        assert_eq!(colors.get("red").map(String::as_str), Some("#e00"));
        assert_eq!(colors.get("red-500").map(String::as_str), Some("#f00"));
        assert_eq!(theme.resolve("fontFamily", "sans").as_deref(), Some("Inter, sans-serif"));
        assert!(theme.namespace("nope").is_empty());
    }

    #[test]
    fn test_resolve_walks_nested_tokens() {
        let theme = store(json!({
            "colors": {
                "light-blue": { "500": "#0af", "DEFAULT": "#0bf" },
                "red": { "DEFAULT": "#e00", "500": "#f00", "dark": { "900": "#300" } },
                "primary": "#c0ffee"
            }
        }));

        assert_eq!(theme.resolve("colors", "primary").as_deref(), Some("#c0ffee"));
        assert_eq!(theme.resolve("colors", "light-blue-500").as_deref(), Some("#0af"));
        assert_eq!(theme.resolve("colors", "light-blue").as_deref(), Some("#0bf"));
        assert_eq!(theme.resolve("colors", "red").as_deref(), Some("#e00"));
        assert_eq!(theme.resolve("colors", "red-dark-900").as_deref(), Some("#300"));
        assert_eq!(theme.resolve("colors", "red-DEFAULT"), None);
        assert_eq!(theme.resolve("colors", "red-700"), None);
        assert_eq!(theme.resolve("spacing", "4"), None);

        // Agrees with the flattened view used by plugins
        for (name, css) in theme.namespace("colors") {
            assert_eq!(theme.resolve("colors", &name), Some(css));
        }
    }
}
