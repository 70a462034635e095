use crate::config::{CliOverrides, Config};
use crate::error::Result;
use crate::listing::TextEncoding;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "janitor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Prune old deployment artifacts and verify live site bundles")]
#[command(
    long_about = "Janitor reads artifact listings exported from your cloud CLI, keeps the newest \
                  few and deletes the rest, and checks that a deployed site serves the script \
                  bundles you expect."
)]
#[command(after_help = "EXAMPLES:\n  \
    gcloud artifacts docker images list REPO --format=json > images.json\n  \
    janitor images images.json\n\n  \
    gcloud storage ls -l gs://run-sources-PROJECT-REGION/services/web/ > buckets.txt\n  \
    janitor archives buckets.txt --keep 3 --dry-run\n\n  \
    janitor verify --url https://example.com --target \"Customer Support\"")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Configuration file path
    #[arg(short, long, global = true, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Number of newest artifacts to keep
    #[arg(short, long, global = true)]
    pub keep: Option<usize>,

    /// Text encoding of the listing file
    #[arg(short, long, global = true, value_enum)]
    pub encoding: Option<TextEncoding>,

    /// Program used to delete artifacts (default: gcloud)
    #[arg(long, global = true)]
    pub program: Option<String>,

    /// Output format for results
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show what would be deleted without running the deletion program
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Stop a deletion batch at the first failure
    #[arg(long, global = true)]
    pub fail_fast: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Delete all but the newest container images from a JSON listing
    Images {
        /// Output of `gcloud artifacts docker images list --format=json`
        listing: PathBuf,
    },
    /// Delete all but the newest source archives from a `gcloud storage ls -l` listing
    Archives {
        /// Output of `gcloud storage ls -l`
        listing: PathBuf,
    },
    /// Check that the live site serves a script containing a target snippet
    Verify {
        /// Page to inspect
        #[arg(long, value_parser = validate_http_url)]
        url: Option<String>,

        /// Text to look for (repeatable); replaces the configured targets
        #[arg(short, long = "target")]
        targets: Vec<String>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        let (base_url, targets, timeout) = match self.command {
            Some(Command::Verify {
                ref url,
                ref targets,
                timeout,
            }) => (url.clone(), Some(targets.clone()), timeout),
            _ => (None, None, None),
        };

        CliOverrides::new()
            .with_keep(self.keep)
            .with_encoding(self.encoding)
            .with_program(self.program.clone())
            .with_fail_fast(self.fail_fast)
            .with_base_url(base_url)
            .with_targets(targets)
            .with_timeout(timeout)
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

pub fn validate_http_url(s: &str) -> std::result::Result<String, String> {
    let url =
        Url::parse(s).map_err(|_| "Invalid URL format. Please provide a valid URL.".to_string())?;

    match url.scheme() {
        "https" | "http" => {}
        _ => return Err("Only http:// and https:// URLs can be verified".to_string()),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err("URL must include a valid hostname".to_string());
    }

    Ok(s.to_string())
}
