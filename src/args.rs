use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::directives::Directive;

/// Tailwind config-compat compiler - builds utility CSS from candidates and config files
#[derive(Parser, Debug)]
#[command(name = "tailwind-compat-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile candidates into CSS
    Build(BuildArgs),
}

/// Arguments for the build command
#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    /// Candidate class names to compile
    #[arg(value_name = "CANDIDATE", help = "Candidate class names, e.g. `dark:underline`")]
    pub candidates: Vec<String>,

    /// Config file path (JSON or YAML)
    #[arg(
        short = 'c',
        long = "config",
        value_name = "PATH",
        help = "Config file applied through @config (JSON or YAML)"
    )]
    pub config: Option<PathBuf>,

    /// Native variant definitions
    #[arg(
        long = "variant",
        value_name = "NAME=RULE",
        help = "Native @variant definition, e.g. `dark=&:is(.my-dark)`"
    )]
    pub variants: Vec<String>,

    /// Scan the config's content globs for candidates
    #[arg(
        short = 's',
        long = "scan",
        default_value_t = false,
        help = "Also compile candidates found in the config's content files"
    )]
    pub scan: bool,

    /// Output CSS file path
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        help = "Path where the generated CSS is written (stdout when omitted)"
    )]
    pub output: Option<PathBuf>,

    /// Enable CSS minification
    #[arg(
        long = "minify",
        default_value_t = false,
        help = "Enable minification of the output CSS"
    )]
    pub minify: bool,

    /// Drop repeated candidates
    #[arg(
        long = "dedupe",
        default_value_t = false,
        help = "Emit each candidate at most once"
    )]
    pub dedupe: bool,

    /// Verbose output
    #[arg(
        short = 'v',
        long = "verbose",
        default_value_t = false,
        help = "Enable verbose output"
    )]
    pub verbose: bool,
}

impl BuildArgs {
    /// Validate that the arguments are consistent
    pub fn validate(&self) -> Result<(), String> {
        if self.candidates.is_empty() && !self.scan {
            return Err("Provide at least one candidate or pass --scan".to_string());
        }

        if self.scan && self.config.is_none() {
            return Err("--scan needs a --config that declares content globs".to_string());
        }

        for variant in &self.variants {
            parse_variant_arg(variant)?;
        }

        Ok(())
    }

    /// Directives equivalent to these arguments, in stylesheet order
    pub fn directives(&self) -> Result<Vec<Directive>, String> {
        let mut directives = vec![Directive::tailwind("utilities")];
        if let Some(config) = &self.config {
            directives.push(Directive::config(config.display().to_string()));
        }
        for variant in &self.variants {
            let (name, rule) = parse_variant_arg(variant)?;
            directives.push(Directive::variant(name, rule));
        }
        Ok(directives)
    }
}

/// Split a `NAME=RULE` argument
pub fn parse_variant_arg(arg: &str) -> Result<(&str, &str), String> {
    let (name, rule) = arg
        .split_once('=')
        .ok_or_else(|| format!("Variant `{}` must look like NAME=RULE", arg))?;
    let (name, rule) = (name.trim(), rule.trim());
    if name.is_empty() || rule.is_empty() {
        return Err(format!("Variant `{}` needs both a name and a rule", arg));
    }
    Ok((name, rule))
}
