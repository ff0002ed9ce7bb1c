pub mod args;
pub mod candidate;
pub mod catalog;
pub mod config;
pub mod css;
pub mod design;
pub mod directives;
pub mod errors;
pub mod loader;
pub mod merge;
pub mod plugin;
pub mod scanner;
pub mod theme;
pub mod utilities;
pub mod variants;

pub use args::{BuildArgs, Cli, Commands};
pub use config::{ConfigFormat, ConfigTree, DarkModeSpec, ThemeConfig};
pub use css::{CompiledRule, Node};
pub use design::DesignSystem;
pub use directives::Directive;
pub use errors::{CompilerError, Result};
pub use loader::{ConfigLoader, FileConfigLoader, InlineConfigLoader};
pub use plugin::{Plugin, PluginApi};
pub use theme::ThemeStore;
pub use variants::{Tier, VariantEntry, VariantRegistry, VariantRule};

use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Options for building a compiler
#[derive(Clone)]
pub struct CompileOptions {
    /// Resolves `@config` paths to config trees
    pub loader: Arc<dyn ConfigLoader>,
    /// Theme the config files are merged on top of
    pub theme: ThemeStore,
    /// Drop repeated candidates within one `build` call
    pub dedupe: bool,
    /// Emit minified CSS
    pub minify: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            loader: Arc::new(FileConfigLoader::default()),
            theme: ThemeStore::new(),
            dedupe: false,
            minify: false,
        }
    }
}

impl CompileOptions {
    pub fn with_loader(loader: impl ConfigLoader + 'static) -> Self {
        Self {
            loader: Arc::new(loader),
            ..Self::default()
        }
    }
}

impl std::fmt::Debug for CompileOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompileOptions")
            .field("theme", &self.theme)
            .field("dedupe", &self.dedupe)
            .field("minify", &self.minify)
            .finish_non_exhaustive()
    }
}

/// A frozen compiler: build as many times as needed
///
/// Cheap to clone and safe to share across threads; nothing reachable from
/// here is mutated after [`compile`] returns.
#[derive(Debug, Clone)]
pub struct Compiler {
    design: Arc<DesignSystem>,
    globs: Arc<[String]>,
    emit_utilities: bool,
    dedupe: bool,
    minify: bool,
}

/// Apply directives, load and merge config files, run plugins, then freeze
///
/// Order: `@config` files are loaded (the only await) and merged, plugin
/// handlers run, and `@variant` directives are applied last at native tier.
/// Any failure aborts the whole compilation.
pub async fn compile(directives: &[Directive], options: CompileOptions) -> Result<Compiler> {
    let mut emit_utilities = false;
    let mut roots = Vec::new();
    let mut native_variants = Vec::new();

    for directive in directives {
        match directive {
            Directive::Tailwind(layer) => {
                if layer == "utilities" {
                    emit_utilities = true;
                }
            }
            Directive::Config(path) => {
                debug!(path = %path, "loading @config");
                roots.push(options.loader.load_config(path).await?);
            }
            Directive::Variant { name, body } => {
                native_variants.push((name, VariantRule::parse(name, body)?));
            }
        }
    }

    let merged = merge::merge(options.theme.clone(), &roots)?;

    let mut design = DesignSystem::new().with_theme(merged.theme);
    for entry in merged.variants {
        design.variants.set_entry(entry);
    }

    plugin::run_plugins(&merged.plugins, &mut design)?;

    for (name, rule) in native_variants {
        design.variants.set(name, rule, Tier::Native);
    }

    debug!(
        variants = design.variants.len(),
        utilities = design.utilities.len(),
        globs = merged.content.len(),
        "compiler frozen"
    );

    Ok(Compiler {
        design: Arc::new(design),
        globs: merged.content.into(),
        emit_utilities,
        dedupe: options.dedupe,
        minify: options.minify,
    })
}

impl Compiler {
    /// Content globs contributed by config files, in application order
    pub fn globs(&self) -> &[String] {
        &self.globs
    }

    pub fn design(&self) -> &DesignSystem {
        &self.design
    }

    /// Compile candidates, keeping matched rules in input order
    pub fn compile_candidates<I, S>(&self, candidates: I) -> Vec<CompiledRule>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.emit_utilities {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut rules = Vec::new();
        for candidate in candidates {
            let candidate = candidate.as_ref();
            if self.dedupe && !seen.insert(candidate.to_string()) {
                continue;
            }
            if let Some(rule) = self.design.compile_candidate(candidate) {
                rules.push(rule);
            }
        }
        rules
    }

    /// Compile candidates into a stylesheet
    ///
    /// Unmatched candidates are dropped. The sheet ends with a single
    /// newline, or is empty when nothing matched.
    pub fn build<I, S>(&self, candidates: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = self.compile_candidates(candidates);
        let mut css = String::new();
        for rule in &rules {
            rule.write_css(&mut css, self.minify);
        }
        if self.minify && !css.is_empty() {
            css.push('\n');
        }
        css
    }
}

/// Write `content` to `path` through a temp file and a rename
///
/// Readers never observe a half-written stylesheet.
pub fn write_atomic<P: AsRef<std::path::Path>>(path: P, content: &str) -> Result<()> {
    use std::fs;
    use std::io::Write;

    let path = path.as_ref();
    let temp_path = path.with_extension("tmp");
    let output_error = |e: std::io::Error| CompilerError::OutputError {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    let mut file = fs::File::create(&temp_path).map_err(output_error)?;
    file.write_all(content.as_bytes()).map_err(output_error)?;
    file.sync_all().map_err(output_error)?;

    fs::rename(&temp_path, path).map_err(output_error)?;
    Ok(())
}
