use std::env;
use std::path::PathBuf;

use thiserror::Error;

/// `DATABASE_URL` value that selects the in-process record store.
pub const MEMORY_DATABASE_URL: &str = "memory";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Where uploaded images are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Local {
        dir: PathBuf,
        url_prefix: String,
    },
    S3 {
        bucket: String,
        region: String,
        endpoint: Option<String>,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
        public_url: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    pub cors_origin: Option<String>,
    pub storage: StorageConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let server_port = match get("SERVER_PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                key: "SERVER_PORT",
                value,
            })?,
            None => 8080,
        };

        let storage = match get("STORAGE_BACKEND").as_deref() {
            None | Some("local") => StorageConfig::Local {
                dir: PathBuf::from(get("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string())),
                url_prefix: get("UPLOAD_URL_PREFIX")
                    .map(|prefix| prefix.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| "/uploads".to_string()),
            },
            Some("s3") => {
                let access_key_id = get("AWS_ACCESS_KEY_ID");
                let secret_access_key = get("AWS_SECRET_ACCESS_KEY");
                if access_key_id.is_some() != secret_access_key.is_some() {
                    return Err(ConfigError::Missing(if access_key_id.is_some() {
                        "AWS_SECRET_ACCESS_KEY"
                    } else {
                        "AWS_ACCESS_KEY_ID"
                    }));
                }
                StorageConfig::S3 {
                    bucket: require("AWS_S3_BUCKET_NAME")?,
                    region: get("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                    endpoint: get("S3_ENDPOINT"),
                    access_key_id,
                    secret_access_key,
                    public_url: get("S3_PUBLIC_URL"),
                }
            }
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "STORAGE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            database_url: require("DATABASE_URL")?,
            server_port,
            server_host: get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            jwt_secret: require("JWT_SECRET")?,
            cors_origin: get("CORS_ORIGIN"),
            storage,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE_URL
    }
}
