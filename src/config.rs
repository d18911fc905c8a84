use crate::services::object_store::S3Settings;
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub bucket: String,
    pub s3: S3Settings,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Multipart upload bridge for S3-compatible object stores")]
pub struct Args {
    /// Host to bind to (overrides BULK_BRIDGE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Object store region (overrides AWS_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Target bucket (overrides AWS_S3_BUCKET_NAME)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Custom S3-compatible endpoint (overrides AWS_S3_ENDPOINT)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Use path-style bucket addressing (overrides AWS_S3_FORCE_PATH_STYLE)
    #[arg(long)]
    pub force_path_style: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::resolve(Args::parse(), |name| env::var(name).ok())
    }

    /// Merge CLI args over an environment lookup. Every value the store
    /// needs must be present; nothing is served on a partial config.
    pub fn resolve(args: Args, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |flag: Option<String>, name: &str| -> Result<String> {
            flag.or_else(|| lookup(name))
                .filter(|value| !value.is_empty())
                .ok_or_else(|| anyhow!("{} is not defined in the environment variables", name))
        };

        let env_port = match lookup("PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing PORT value `{}`", value))?,
            None => 3000,
        };
        let env_path_style = match lookup("AWS_S3_FORCE_PATH_STYLE") {
            Some(value) => value
                .parse::<bool>()
                .with_context(|| format!("parsing AWS_S3_FORCE_PATH_STYLE value `{}`", value))?,
            None => false,
        };

        let s3 = S3Settings {
            region: required(args.region, "AWS_REGION")?,
            access_key_id: required(None, "AWS_ACCESS_KEY_ID")?,
            secret_access_key: required(None, "AWS_SECRET_ACCESS_KEY")?,
            endpoint: args.endpoint.or_else(|| lookup("AWS_S3_ENDPOINT")),
            force_path_style: args.force_path_style || env_path_style,
        };

        Ok(Self {
            host: args
                .host
                .or_else(|| lookup("BULK_BRIDGE_HOST"))
                .unwrap_or_else(|| "0.0.0.0".into()),
            port: args.port.unwrap_or(env_port),
            bucket: required(args.bucket, "AWS_S3_BUCKET_NAME")?,
            s3,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
