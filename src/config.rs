use crate::error::{JanitorError, Result};
use crate::listing::TextEncoding;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub retention: RetentionConfig,
    pub listing: ListingConfig,
    pub sink: SinkConfig,
    pub verify: VerifyConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub keep: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListingConfig {
    pub encoding: TextEncoding,
    pub skip_prefixes: Vec<String>,
    pub archive_suffix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SinkConfig {
    pub program: String,
    /// Arguments for image deletion; `{id}` is replaced by `package@version`.
    pub image_args: Vec<String>,
    /// Arguments for archive deletion; `{id}` is replaced by the object URL.
    pub archive_args: Vec<String>,
    pub fail_fast: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VerifyConfig {
    pub base_url: String,
    pub user_agent: String,
    pub chunk_pattern: String,
    pub targets: Vec<String>,
    pub timeout: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self { keep: 5 }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            encoding: TextEncoding::Utf16,
            skip_prefixes: vec!["gs://".to_string()],
            archive_suffix: ".zip".to_string(),
        }
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        let program = if cfg!(windows) { "gcloud.cmd" } else { "gcloud" };
        Self {
            program: program.to_string(),
            image_args: ["artifacts", "docker", "images", "delete", "{id}", "--quiet"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            archive_args: ["storage", "rm", "{id}", "--quiet"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            fail_fast: false,
        }
    }
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            base_url: "https://kkshop.cc".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            chunk_pattern: r#"src="(/_next/static/chunks/[^"]+\.js)""#.to_string(),
            targets: vec![
                "Customer Support".to_string(),
                "고객센터".to_string(),
                "고객지원".to_string(),
            ],
            timeout: 30, // seconds
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(JanitorError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| JanitorError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| JanitorError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["janitor.toml", "janitor.config.toml", ".janitor.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(keep) = cli_args.keep {
            self.retention.keep = keep;
        }

        if let Some(encoding) = cli_args.encoding {
            self.listing.encoding = encoding;
        }

        if let Some(ref program) = cli_args.program {
            self.sink.program = program.clone();
        }

        if cli_args.fail_fast {
            self.sink.fail_fast = true;
        }

        if let Some(ref base_url) = cli_args.base_url {
            self.verify.base_url = base_url.clone();
        }

        if let Some(ref targets) = cli_args.targets {
            if !targets.is_empty() {
                self.verify.targets = targets.clone();
            }
        }

        if let Some(timeout) = cli_args.timeout {
            self.verify.timeout = timeout;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.listing.archive_suffix.trim().is_empty() {
            return Err(JanitorError::Config {
                message: "Archive suffix must not be empty".to_string(),
            });
        }

        if self.sink.program.trim().is_empty() {
            return Err(JanitorError::Config {
                message: "Deletion program must be specified".to_string(),
            });
        }

        for (name, args) in [
            ("image_args", &self.sink.image_args),
            ("archive_args", &self.sink.archive_args),
        ] {
            if !args.iter().any(|a| a.contains("{id}")) {
                return Err(JanitorError::Config {
                    message: format!("sink.{} must contain an {{id}} placeholder", name),
                });
            }
        }

        let pattern = Regex::new(&self.verify.chunk_pattern).map_err(|e| JanitorError::Config {
            message: format!("Invalid chunk pattern: {}", e),
        })?;
        if pattern.captures_len() < 2 {
            return Err(JanitorError::Config {
                message: "Chunk pattern must contain a capture group for the script path"
                    .to_string(),
            });
        }

        if self.verify.targets.iter().all(|t| t.is_empty()) {
            return Err(JanitorError::Config {
                message: "At least one verification target must be specified".to_string(),
            });
        }

        if self.verify.timeout == 0 {
            return Err(JanitorError::Config {
                message: "Verification timeout must be greater than 0".to_string(),
            });
        }

        let base = Url::parse(&self.verify.base_url).map_err(|_| JanitorError::InvalidUrl {
            url: self.verify.base_url.clone(),
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(JanitorError::InvalidUrl {
                url: self.verify.base_url.clone(),
            });
        }

        Ok(())
    }

    pub fn verify_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.verify.timeout)
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub keep: Option<usize>,
    pub encoding: Option<TextEncoding>,
    pub program: Option<String>,
    pub fail_fast: bool,
    pub base_url: Option<String>,
    pub targets: Option<Vec<String>>,
    pub timeout: Option<u64>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keep(mut self, keep: Option<usize>) -> Self {
        self.keep = keep;
        self
    }

    pub fn with_encoding(mut self, encoding: Option<TextEncoding>) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_program(mut self, program: Option<String>) -> Self {
        self.program = program;
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_targets(mut self, targets: Option<Vec<String>>) -> Self {
        self.targets = targets;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<u64>) -> Self {
        self.timeout = timeout;
        self
    }
}
