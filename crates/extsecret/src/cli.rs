//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::Parser;
use extsecret_secrets::{GeneratorOptions, StoreOptions, DEFAULT_CONCURRENCY};

use crate::output::OutputFormat;

/// extsecret - render ExternalSecret manifests into Kubernetes Secrets
///
/// Invoked by kustomize as an exec plugin: the manifest path is the first
/// argument and the generated Secret is written to stdout.
#[derive(Parser, Debug)]
#[command(name = "extsecret")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the ExternalSecret manifest
    pub manifest: Utf8PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output as JSON instead of YAML
    #[arg(long)]
    pub json: bool,

    /// Default region when the manifest sets no storeConfig.region
    #[arg(long, env = "EXTSECRET_REGION")]
    pub region: Option<String>,

    /// Secrets Manager endpoint override
    #[arg(long, env = "EXTSECRET_SM_ENDPOINT")]
    pub endpoint_url: Option<String>,

    /// Version stage to read (defaults to AWSCURRENT)
    #[arg(long, env = "EXTSECRET_VERSION_STAGE")]
    pub version_stage: Option<String>,

    /// Maximum number of secrets fetched at once
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY, value_parser = clap::value_parser!(usize))]
    pub concurrency: usize,
}

impl Cli {
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Yaml
        }
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            endpoint_url: self.endpoint_url.clone(),
            version_stage: self.version_stage.clone(),
        }
    }

    pub fn generator_options(&self) -> GeneratorOptions {
        GeneratorOptions {
            concurrency: self.concurrency,
            default_region: self.region.clone(),
        }
    }
}
