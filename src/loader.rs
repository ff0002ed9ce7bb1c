use crate::config::{ConfigFormat, ConfigTree};
use crate::errors::{CompilerError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Injected capability that turns a `@config` path into a config tree
///
/// Awaited once per `@config` directive before the merge runs; errors are
/// returned to the caller of `compile` unchanged.
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    async fn load_config(&self, path: &str) -> Result<ConfigTree>;
}

/// Reads JSON or YAML config files relative to a base directory
#[derive(Debug, Clone)]
pub struct FileConfigLoader {
    base: PathBuf,
}

impl FileConfigLoader {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        }
    }
}

impl Default for FileConfigLoader {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}

#[async_trait]
impl ConfigLoader for FileConfigLoader {
    async fn load_config(&self, path: &str) -> Result<ConfigTree> {
        let resolved = self.resolve(path);
        let format = ConfigFormat::from_path(&resolved)?;
        debug!(path = %resolved.display(), ?format, "loading config file");

        let content = tokio::fs::read_to_string(&resolved)
            .await
            .map_err(|e| CompilerError::Load {
                path: resolved.display().to_string(),
                message: e.to_string(),
            })?;

        ConfigTree::parse(&content, format)
    }
}

/// Hands out a prebuilt config tree for every path
///
/// Config trees built in code are the only way to attach plugin handlers,
/// so embedders use this to feed them to `compile`.
#[derive(Debug, Clone, Default)]
pub struct InlineConfigLoader {
    tree: ConfigTree,
}

impl InlineConfigLoader {
    pub fn new(tree: ConfigTree) -> Self {
        Self { tree }
    }
}

#[async_trait]
impl ConfigLoader for InlineConfigLoader {
    async fn load_config(&self, _path: &str) -> Result<ConfigTree> {
        Ok(self.tree.clone())
    }
}
