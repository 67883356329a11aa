//! Configuration loaded from the environment.

use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} env var required")]
    Missing(&'static str),
}

/// Blob-store connection settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    /// Endpoint URL, e.g. `https://ams3.digitaloceanspaces.com`
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    /// Signing region; S3-compatible providers accept `us-east-1`
    pub region: String,
    /// Public CDN base URL for playback links
    pub cdn_url: String,
}

/// Configuration of the background worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerConfig {
    /// PostgreSQL connection URL
    pub database_url: String,
    pub storage: StorageConfig,
    /// Temporary-storage root, owned exclusively by the worker
    pub work_dir: PathBuf,
    /// Transcoder executable
    pub ffmpeg_bin: PathBuf,
}

impl WorkerConfig {
    /// Load configuration from `.env` and environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        Ok(Self {
            database_url: require("DATABASE_URL")?,
            storage: StorageConfig {
                endpoint: require("SPACES_ENDPOINT")?,
                bucket: require("SPACES_BUCKET")?,
                access_key: require("SPACES_KEY")?,
                secret_key: require("SPACES_SECRET")?,
                region: get("SPACES_REGION").unwrap_or_else(|| String::from("us-east-1")),
                cdn_url: require("SPACES_CDN_URL")?,
            },
            work_dir: get("VIDLINK_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| env::temp_dir().join("vidlink")),
            ffmpeg_bin: get("FFMPEG_BIN")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("ffmpeg")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn required() -> HashMap<String, String> {
        vars(&[
            ("DATABASE_URL", "postgres://localhost/vidlink_development"),
            ("SPACES_ENDPOINT", "https://ams3.digitaloceanspaces.com"),
            ("SPACES_BUCKET", "vidlink"),
            ("SPACES_KEY", "key"),
            ("SPACES_SECRET", "secret"),
            ("SPACES_CDN_URL", "https://vidlink.ams3.cdn.digitaloceanspaces.com"),
        ])
    }

    #[test]
    fn test_defaults() {
        let env = required();
        let config = WorkerConfig::from_lookup(|k| env.get(k).cloned()).unwrap();

        assert_eq!(config.storage.region, "us-east-1");
        assert_eq!(config.storage.bucket, "vidlink");
        assert_eq!(config.work_dir, env::temp_dir().join("vidlink"));
        assert_eq!(config.ffmpeg_bin, PathBuf::from("ffmpeg"));
    }

    #[test]
    fn test_overrides() {
        let mut env = required();
        env.extend(vars(&[
            ("SPACES_REGION", "ams3"),
            ("VIDLINK_WORK_DIR", "/var/tmp/vidlink"),
            ("FFMPEG_BIN", "/opt/ffmpeg/bin/ffmpeg"),
        ]));
        let config = WorkerConfig::from_lookup(|k| env.get(k).cloned()).unwrap();

        assert_eq!(config.storage.region, "ams3");
        assert_eq!(config.work_dir, PathBuf::from("/var/tmp/vidlink"));
        assert_eq!(config.ffmpeg_bin, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
    }

    #[test]
    fn test_missing_and_empty_values() {
        let mut env = required();
        env.remove("SPACES_SECRET");
        let result = WorkerConfig::from_lookup(|k| env.get(k).cloned());
        assert_eq!(result, Err(ConfigError::Missing("SPACES_SECRET")));

        let mut env = required();
        env.insert("SPACES_BUCKET".to_string(), "  ".to_string());
        let result = WorkerConfig::from_lookup(|k| env.get(k).cloned());
        assert_eq!(result, Err(ConfigError::Missing("SPACES_BUCKET")));
    }
}
