use clap::{ArgAction, Parser, ValueEnum};
use jiff::SignedDuration;
use shortlink_telemetry::Environment;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const ENV_ENV: &str = "SHORTLINK_ENV";
pub const HTTP_ADDRESS_ENV: &str = "SHORTLINK_HTTP_ADDRESS";
pub const HTTP_TIMEOUT_ENV: &str = "SHORTLINK_HTTP_TIMEOUT";
pub const SHUTDOWN_TIMEOUT_ENV: &str = "SHORTLINK_SHUTDOWN_TIMEOUT";
pub const PUBLIC_BASE_URL_ENV: &str = "SHORTLINK_PUBLIC_BASE_URL";
pub const STORAGE_BACKEND_ENV: &str = "SHORTLINK_STORAGE";
pub const STORAGE_PATH_ENV: &str = "SHORTLINK_STORAGE_PATH";
pub const RUN_MIGRATIONS_ENV: &str = "SHORTLINK_RUN_MIGRATIONS";
pub const OPERATION_TIMEOUT_ENV: &str = "SHORTLINK_OPERATION_TIMEOUT";
pub const SSO_ADDRESS_ENV: &str = "SHORTLINK_SSO_ADDRESS";
pub const SSO_TIMEOUT_ENV: &str = "SHORTLINK_SSO_TIMEOUT";
pub const SSO_RETRIES_ENV: &str = "SHORTLINK_SSO_RETRIES";
pub const SSO_INSECURE_ENV: &str = "SHORTLINK_SSO_INSECURE";
pub const ADMIN_USER_IDS_ENV: &str = "SHORTLINK_ADMIN_USER_IDS";
pub const JWT_PUBLIC_KEY_ENV: &str = "SHORTLINK_JWT_PUBLIC_KEY";
pub const JWT_PUBLIC_KEY_FILE_ENV: &str = "SHORTLINK_JWT_PUBLIC_KEY_FILE";

pub const DEFAULT_HTTP_ADDRESS: &str = "127.0.0.1:8080";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("a storage path is required when the storage backend is sqlite")]
    MissingStoragePath,
    #[error("either a JWT public key or a JWT public key file is required")]
    MissingJwtPublicKey,
    #[error("failed to read JWT public key from {path}: {source}")]
    ReadJwtPublicKey {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "sqlite")]
    Sqlite,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Parses a friendly duration such as `5s` or `1m 30s`.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let signed: SignedDuration = value
        .parse()
        .map_err(|e| format!("invalid duration '{value}': {e}"))?;
    Duration::try_from(signed).map_err(|e| format!("invalid duration '{value}': {e}"))
}

#[derive(Debug, Clone, Parser)]
#[command(name = "shortlink-gateway", about = "JWT-protected URL shortener")]
pub struct Cli {
    #[arg(long, env = ENV_ENV, default_value_t = Environment::Local)]
    pub env: Environment,

    #[arg(long, env = HTTP_ADDRESS_ENV, default_value = DEFAULT_HTTP_ADDRESS)]
    pub http_address: SocketAddr,

    /// Upper bound on the time spent handling one request.
    #[arg(long, env = HTTP_TIMEOUT_ENV, default_value = "5s", value_parser = parse_duration)]
    pub http_timeout: Duration,

    /// Time given to in-flight requests once a shutdown signal arrives.
    #[arg(long, env = SHUTDOWN_TIMEOUT_ENV, default_value = "10s", value_parser = parse_duration)]
    pub shutdown_timeout: Duration,

    /// Base used to render `short_url` in responses.
    #[arg(long, env = PUBLIC_BASE_URL_ENV, default_value = DEFAULT_PUBLIC_BASE_URL)]
    pub public_base_url: String,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::Sqlite
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = STORAGE_PATH_ENV)]
    pub storage_path: Option<String>,

    /// Apply pending schema migrations at startup.
    #[arg(long, env = RUN_MIGRATIONS_ENV)]
    pub run_migrations: bool,

    /// Deadline for each storage or admin-check call made by the service.
    #[arg(long, env = OPERATION_TIMEOUT_ENV, default_value = "5s", value_parser = parse_duration)]
    pub operation_timeout: Duration,

    /// Address of the identity service. Without it, admins come from `--admin-user-ids`.
    #[arg(long, env = SSO_ADDRESS_ENV)]
    pub sso_address: Option<String>,

    #[arg(long, env = SSO_TIMEOUT_ENV, default_value = "5s", value_parser = parse_duration)]
    pub sso_timeout: Duration,

    #[arg(long, env = SSO_RETRIES_ENV, default_value_t = 3)]
    pub sso_retries: u32,

    #[arg(long, env = SSO_INSECURE_ENV, default_value_t = true, action = ArgAction::Set)]
    pub sso_insecure: bool,

    #[arg(long, env = ADMIN_USER_IDS_ENV, value_delimiter = ',')]
    pub admin_user_ids: Vec<i64>,

    /// PEM encoded RSA public key used to verify access tokens.
    #[arg(long, env = JWT_PUBLIC_KEY_ENV, conflicts_with = "jwt_public_key_file")]
    pub jwt_public_key: Option<String>,

    #[arg(long, env = JWT_PUBLIC_KEY_FILE_ENV)]
    pub jwt_public_key_file: Option<PathBuf>,
}

impl Cli {
    /// Returns the JWT public key, reading it from disk when given as a file.
    pub fn jwt_public_key_pem(&self) -> Result<String, ConfigError> {
        if let Some(pem) = &self.jwt_public_key {
            return Ok(pem.clone());
        }

        let path = self
            .jwt_public_key_file
            .as_ref()
            .ok_or(ConfigError::MissingJwtPublicKey)?;
        std::fs::read_to_string(path).map_err(|source| ConfigError::ReadJwtPublicKey {
            path: path.clone(),
            source,
        })
    }

    /// Returns the SQLite path, which only the sqlite backend requires.
    pub fn sqlite_path(&self) -> Result<&str, ConfigError> {
        self.storage_path
            .as_deref()
            .ok_or(ConfigError::MissingStoragePath)
    }
}
