use thiserror::Error;

/// Main error type for the tailwind-compat crate
#[derive(Debug, Error)]
pub enum CompilerError {
    #[error("Pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Glob error: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A config tree had the wrong shape at `path`
    #[error("Configuration error at `{path}`: {message}")]
    Config { path: String, message: String },

    /// A plugin handler returned an error
    #[error("Plugin `{plugin}` failed: {message}")]
    Plugin { plugin: String, message: String },

    /// The injected config loader could not produce a config tree
    #[error("Failed to load config {path}: {message}")]
    Load { path: String, message: String },

    #[error("Invalid utility `{selector}`: {message}")]
    InvalidUtility { selector: String, message: String },

    #[error("Invalid variant `{name}`: {message}")]
    InvalidVariant { name: String, message: String },

    #[error("Failed to write output to {path}: {message}")]
    OutputError { path: String, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CompilerError {
    /// Shorthand for a config shape error at a dotted path
    pub fn config(path: impl Into<String>, message: impl Into<String>) -> Self {
        CompilerError::Config {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CompilerError>;
