use crate::errors::{CompilerError, Result};

/// A native directive, as produced by the stylesheet parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `@tailwind <layer>;`
    Tailwind(String),
    /// `@config "<path>";`
    Config(String),
    /// `@variant <name> (<body>);`
    Variant { name: String, body: String },
}

impl Directive {
    pub fn tailwind(layer: impl Into<String>) -> Self {
        Directive::Tailwind(layer.into())
    }

    pub fn config(path: impl Into<String>) -> Self {
        Directive::Config(path.into())
    }

    pub fn variant(name: impl Into<String>, body: impl Into<String>) -> Self {
        Directive::Variant {
            name: name.into(),
            body: body.into(),
        }
    }

    /// Build a directive from an at-rule name and its raw params
    ///
    /// `("variant", "dark (&:is(.my-dark))")` gives a `dark` variant with
    /// body `&:is(.my-dark)`; `("config", "\"./config.js\"")` strips quotes.
    pub fn from_at_rule(name: &str, params: &str) -> Result<Self> {
        let params = params.trim().trim_end_matches(';').trim();
        match name {
            "tailwind" => {
                if params.is_empty() {
                    return Err(CompilerError::InvalidInput("@tailwind needs a layer name".to_string()));
                }
                Ok(Directive::tailwind(params))
            }
            "config" => {
                let path = unquote(params);
                if path.is_empty() {
                    return Err(CompilerError::InvalidInput("@config needs a path".to_string()));
                }
                Ok(Directive::config(path))
            }
            "variant" => parse_variant(params),
            other => Err(CompilerError::InvalidInput(format!(
                "unsupported directive @{}",
                other
            ))),
        }
    }
}

fn parse_variant(params: &str) -> Result<Directive> {
    let (name, rest) = match params.find(|c: char| c.is_whitespace() || c == '(') {
        Some(idx) => (&params[..idx], params[idx..].trim()),
        None => (params, ""),
    };
    if name.is_empty() {
        return Err(CompilerError::InvalidInput("@variant needs a name".to_string()));
    }

    let body = rest
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .unwrap_or(rest)
        .trim();
    if body.is_empty() {
        return Err(CompilerError::InvalidVariant {
            name: name.to_string(),
            message: "variant rule is empty".to_string(),
        });
    }
    Ok(Directive::variant(name, body))
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value.strip_prefix(quote).and_then(|v| v.strip_suffix(quote)) {
            return inner;
        }
    }
    value
}
