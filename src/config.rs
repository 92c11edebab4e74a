//! Environment configuration.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{AppError, Result};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";
/// The service returns at most 10 labels unless asked otherwise.
pub const DEFAULT_MAX_RESULTS: u32 = 10;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    pub max_results: u32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        VisionConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            access_token: None,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub static_dir: PathBuf,
    pub vision: VisionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            static_dir: PathBuf::from("public"),
            vision: VisionConfig::default(),
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        Ok(Config {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or("PORT", get("PORT"), defaults.port)?,
            max_upload_bytes: parse_or(
                "MAX_UPLOAD_BYTES",
                get("MAX_UPLOAD_BYTES"),
                defaults.max_upload_bytes,
            )?,
            static_dir: get("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            vision: VisionConfig {
                endpoint: get("VISION_ENDPOINT").unwrap_or(defaults.vision.endpoint),
                api_key: get("VISION_API_KEY").or_else(|| get("GOOGLE_API_KEY")),
                access_token: get("VISION_ACCESS_TOKEN"),
                max_results: parse_or(
                    "VISION_MAX_RESULTS",
                    get("VISION_MAX_RESULTS"),
                    defaults.vision.max_results,
                )?,
            },
        })
    }

    /// Host and port for `TcpListener::bind`. Host names are resolved there.
    pub fn bind_addr(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{}={:?}: {}", key, raw, e))),
    }
}
