use anyhow::Context;
use clap::Parser;
use std::io::Write;
use tailwind_compat::scanner::Scanner;
use tailwind_compat::{compile, write_atomic, BuildArgs, Cli, Commands, CompileOptions, FileConfigLoader};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn build(args: BuildArgs) -> anyhow::Result<()> {
    args.validate().map_err(anyhow::Error::msg)?;
    let directives = args.directives().map_err(anyhow::Error::msg)?;

    let options = CompileOptions {
        loader: std::sync::Arc::new(FileConfigLoader::default()),
        dedupe: args.dedupe,
        minify: args.minify,
        ..CompileOptions::default()
    };
    let compiler = compile(&directives, options).await.context("compilation failed")?;

    let mut candidates = args.candidates.clone();
    if args.scan {
        let scanned = Scanner::new()?.scan(compiler.globs())?;
        info!(
            files = scanned.files_scanned,
            skipped = scanned.files_skipped,
            candidates = scanned.candidates.len(),
            "scanned content"
        );
        candidates.extend(scanned.candidates);
    }

    let css = compiler.build(&candidates);

    match &args.output {
        Some(path) => {
            write_atomic(path, &css).with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), bytes = css.len(), "wrote stylesheet");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(css.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    match cli.command {
        Commands::Build(args) => {
            init_tracing(args.verbose);
            if let Err(e) = build(args).await {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
