use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// IBM Cloud IAM token endpoint
pub const DEFAULT_IAM_URL: &str = "https://iam.cloud.ibm.com/identity/token";

/// watsonx.ai text generation gateway
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Server host address
    #[arg(short = 'H', long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Server port
    #[arg(short, long, env = "SERVER_PORT", default_value = "4060")]
    pub port: u16,

    /// Path to a YAML config file with a `watsonxai` section
    #[arg(short, long, env = "WXAI_CONFIG")]
    pub config: Option<PathBuf>,

    /// IBM Cloud API key
    #[arg(short = 'k', long, env = "WATSONX_API_KEY")]
    pub api_key: Option<String>,

    /// watsonx.ai project id
    #[arg(long, env = "WATSONX_PROJECT_ID")]
    pub project_id: Option<String>,

    /// watsonx.ai API base endpoint, e.g. https://us-south.ml.cloud.ibm.com
    #[arg(short = 'e', long, env = "WATSONX_API_ENDPOINT")]
    pub api_endpoint: Option<String>,

    /// IAM token endpoint
    #[arg(long, env = "IAM_TOKEN_URL", default_value = DEFAULT_IAM_URL)]
    pub iam_url: String,

    /// HTTP connect timeout in seconds
    #[arg(long, env = "HTTP_CONNECT_TIMEOUT", default_value = "30")]
    pub http_connect_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Settings needed by the generation client. Immutable once built.
#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub project_id: String,
    pub api_endpoint: String,
    pub iam_url: String,
    pub connect_timeout: u64,
}

impl ClientConfig {
    pub fn new(
        api_key: impl Into<String>,
        project_id: impl Into<String>,
        api_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            project_id: project_id.into(),
            api_endpoint: api_endpoint.into(),
            iam_url: DEFAULT_IAM_URL.to_string(),
            connect_timeout: 30,
        }
    }

    /// Point token exchanges at a different IAM endpoint
    pub fn with_iam_url(mut self, iam_url: impl Into<String>) -> Self {
        self.iam_url = iam_url.into();
        self
    }

    /// Check that every required field is present and the URLs parse
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("api_key"));
        }
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::Missing("project_id"));
        }
        if self.api_endpoint.trim().is_empty() {
            return Err(ConfigError::Missing("api_endpoint"));
        }
        if self.iam_url.trim().is_empty() {
            return Err(ConfigError::Missing("iam_url"));
        }

        check_http_url(&self.api_endpoint)?;
        check_http_url(&self.iam_url)?;

        Ok(())
    }

    /// Join a path onto the API endpoint
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.api_endpoint.trim_end_matches('/'), path)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("project_id", &self.project_id)
            .field("api_endpoint", &self.api_endpoint)
            .field("iam_url", &self.iam_url)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

fn check_http_url(url: &str) -> Result<(), ConfigError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| ConfigError::InvalidEndpoint {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidEndpoint {
            url: url.to_string(),
            reason: format!("unsupported scheme {}", other),
        }),
    }
}

/// YAML config file layout. Sections other than `watsonxai` are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub watsonxai: WatsonxSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct WatsonxSection {
    pub api_key: Option<String>,
    pub project_id: Option<String>,
    pub api_endpoint: Option<String>,
}

/// Read a config file; the format follows the file extension
pub fn load_file(path: &Path) -> Result<FileConfig> {
    ::config::Config::builder()
        .add_source(::config::File::from(path))
        .build()
        .with_context(|| format!("Error reading config file: {}", path.display()))?
        .try_deserialize()
        .with_context(|| format!("Error parsing config file: {}", path.display()))
}

#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub server_host: String,
    pub server_port: u16,

    // Logging
    pub log_level: String,

    // watsonx.ai client
    pub client: ClientConfig,
}

impl Config {
    /// Load configuration from all sources with priority: CLI > ENV > file > defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let args = CliArgs::parse();

        let file = match args.config.as_deref() {
            Some(path) => load_file(path)?,
            None => FileConfig::default(),
        };

        Ok(Self::from_sources(args, file))
    }

    /// Merge parsed arguments over file values. Missing values stay empty
    /// so that `validate` reports them.
    pub fn from_sources(args: CliArgs, file: FileConfig) -> Self {
        let section = file.watsonxai;

        let client = ClientConfig {
            api_key: args.api_key.or(section.api_key).unwrap_or_default(),
            project_id: args.project_id.or(section.project_id).unwrap_or_default(),
            api_endpoint: args
                .api_endpoint
                .or(section.api_endpoint)
                .unwrap_or_default(),
            iam_url: args.iam_url,
            connect_timeout: args.http_connect_timeout,
        };

        Self {
            server_host: args.host,
            server_port: args.port,
            log_level: args.log_level,
            client,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.client.validate()
    }
}
