//! extsecret - ExternalSecret generator for kustomize
//!
//! Reads the manifest named by the first argument, resolves every value
//! against AWS Secrets Manager, and prints the resulting Secret on stdout.

mod cli;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use extsecret_core::ManifestLoader;
use extsecret_secrets::generate_secret;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let manifest = ManifestLoader::load(&cli.manifest)
        .with_context(|| format!("Failed to load manifest {}", cli.manifest))?;
    debug!(
        "Generating Secret '{}' ({} data, {} dataFrom)",
        manifest.metadata.name,
        manifest.spec.data.len(),
        manifest.spec.data_from.len()
    );

    let secret = generate_secret(&manifest, cli.store_options(), cli.generator_options())
        .await
        .with_context(|| format!("Failed to generate Secret from {}", cli.manifest))?;

    let stdout = std::io::stdout();
    output::write_secret(&mut stdout.lock(), &secret, cli.output_format())
}

/// Initialize tracing on stderr with the requested verbosity
///
/// `RUST_LOG` takes precedence over the flags when set.
fn init_tracing(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
