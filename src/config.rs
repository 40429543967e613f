use crate::backend::RestTableClient;
use crate::error::ConfigError;
use clap::{Args, Parser};
use reqwest::Url;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Connection settings for the remote table, shared by both binaries.
#[derive(Args, Clone, Debug)]
pub struct BackendArgs {
    /// Base URL of the hosted backend, e.g. https://xyz.supabase.co
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: String,

    /// API key sent as `apikey` and bearer token
    #[arg(long, env = "SUPABASE_KEY", hide_env_values = true)]
    pub supabase_key: String,

    /// Table receiving the rows
    #[arg(long, env = "IMPORT_TABLE", default_value = "corridas")]
    pub table: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "IMPORT_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

impl BackendArgs {
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_base_url(&self.supabase_url)?;
        if self.supabase_key.trim().is_empty() {
            return Err(ConfigError::MissingKey);
        }
        if self.table.trim().is_empty() {
            return Err(ConfigError::MissingTable);
        }
        Ok(())
    }

    pub fn client(&self) -> Result<RestTableClient, ConfigError> {
        self.validate()?;
        RestTableClient::new(
            parse_base_url(&self.supabase_url)?,
            self.supabase_key.clone(),
            Duration::from_secs(self.timeout_secs),
        )
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

/// Settings of the dashboard web server.
#[derive(Parser, Clone, Debug)]
#[command(name = "dashboard", about = "Corridas dashboard and spreadsheet importer")]
pub struct ServerArgs {
    #[command(flatten)]
    pub backend: BackendArgs,

    /// Address the server listens on
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Largest accepted spreadsheet upload, in megabytes
    #[arg(long, env = "MAX_UPLOAD_MB", default_value_t = 50)]
    pub max_upload_mb: usize,

    /// Directory holding the dashboard script and stylesheet
    #[arg(long, env = "STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,
}

impl ServerArgs {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

/// Settings of the headless importer.
#[derive(Parser, Clone, Debug)]
#[command(name = "import", about = "Import a spreadsheet into the corridas table")]
pub struct ImportArgs {
    /// Spreadsheet to import (.xlsx / .xls)
    pub file: PathBuf,

    #[command(flatten)]
    pub backend: BackendArgs,
}
