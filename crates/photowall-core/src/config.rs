//! Configuration module
//!
//! This module provides the settings consumed by the publishing core: API
//! credentials, file limits, retry and rate limits, statistics and temp-file
//! housekeeping. The process entry point loads a [`Config`] once and hands each
//! component the section it needs; nothing here is global.

use std::env;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;

use crate::constants::*;

/// Credentials and endpoints for the wall API
#[derive(Clone)]
pub struct ApiCredentials {
    /// User token, used for photo upload and save calls
    pub access_token: String,
    /// Community token, used for wall posts
    pub group_token: String,
    /// Positive community id; the wall owner is `-group_id`
    pub group_id: u64,
    pub api_version: String,
    pub base_url: String,
    pub request_timeout: Duration,
    pub upload_timeout: Duration,
}

impl Debug for ApiCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ApiCredentials")
            .field("access_token", &"***")
            .field("group_token", &"***")
            .field("group_id", &self.group_id)
            .field("api_version", &self.api_version)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ApiCredentials {
    /// Wall owner id as the API expects it (communities are negative)
    pub fn wall_owner_id(&self) -> i64 {
        -(self.group_id as i64)
    }
}

/// Limits applied by the file gate
#[derive(Clone, Debug)]
pub struct FileLimits {
    /// Lower-case extensions without the leading dot
    pub allowed_extensions: Vec<String>,
    pub min_size_bytes: u64,
    pub max_size_bytes: u64,
    pub read_chunk_size: usize,
    pub ready_max_attempts: u32,
    pub ready_initial_delay: Duration,
}

impl Default for FileLimits {
    fn default() -> Self {
        Self {
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            min_size_bytes: MIN_FILE_SIZE_BYTES,
            max_size_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
            read_chunk_size: FILE_READ_CHUNK_SIZE,
            ready_max_attempts: FILE_READY_MAX_ATTEMPTS,
            ready_initial_delay: Duration::from_millis(FILE_READY_INITIAL_DELAY_MS),
        }
    }
}

/// Retry and throttling settings for the publisher
#[derive(Clone, Debug)]
pub struct PublishSettings {
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub rate_limit_per_second: usize,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            retry_base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
            rate_limit_per_second: RATE_LIMIT_PER_SECOND,
        }
    }
}

#[derive(Clone, Debug)]
pub struct StatsSettings {
    pub report_interval: u64,
    pub timezone: Tz,
}

impl Default for StatsSettings {
    fn default() -> Self {
        Self {
            report_interval: STATS_REPORT_INTERVAL,
            timezone: chrono_tz::Europe::Moscow,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CleanupSettings {
    pub temp_dir: PathBuf,
    pub max_age: Duration,
    pub interval: Duration,
}

impl Default for CleanupSettings {
    fn default() -> Self {
        Self {
            temp_dir: PathBuf::from(TEMP_PHOTOS_DIR),
            max_age: Duration::from_secs(CLEANUP_AGE_HOURS * 3600),
            interval: Duration::from_secs(CLEANUP_INTERVAL_HOURS * 3600),
        }
    }
}

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid log format: {}", s)),
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub api: ApiCredentials,
    pub files: FileLimits,
    pub publish: PublishSettings,
    pub stats: StatsSettings,
    pub cleanup: CleanupSettings,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from the process environment (and `.env` if present)
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, anyhow::Error> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow::anyhow!("{} must be set", key))
        };

        let group_id_raw = required("GROUP_ID")?;
        let group_id = group_id_raw
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("GROUP_ID must be a positive number, got '{}'", group_id_raw))?;

        let api = ApiCredentials {
            access_token: required("ACCESS_TOKEN")?,
            group_token: required("GROUP_TOKEN")?,
            group_id,
            api_version: lookup("V").unwrap_or_else(|| API_VERSION.to_string()),
            base_url: lookup("API_BASE_URL")
                .unwrap_or_else(|| API_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "API_TIMEOUT_SECS",
                API_TIMEOUT_SECS,
            )?),
            upload_timeout: Duration::from_secs(parse_or(
                &lookup,
                "UPLOAD_TIMEOUT_SECS",
                UPLOAD_TIMEOUT_SECS,
            )?),
        };

        let allowed_extensions = match lookup("ALLOWED_EXTENSIONS") {
            Some(raw) => parse_extensions(&raw),
            None => FileLimits::default().allowed_extensions,
        };

        let max_file_size_mb: u64 = parse_or(&lookup, "MAX_FILE_SIZE_MB", MAX_FILE_SIZE_MB)?;

        let files = FileLimits {
            allowed_extensions,
            min_size_bytes: parse_or(&lookup, "MIN_FILE_SIZE_BYTES", MIN_FILE_SIZE_BYTES)?,
            max_size_bytes: scaled("MAX_FILE_SIZE_MB", max_file_size_mb, 1024 * 1024)?,
            read_chunk_size: parse_or(&lookup, "FILE_READ_CHUNK_SIZE", FILE_READ_CHUNK_SIZE)?,
            ready_max_attempts: parse_or(
                &lookup,
                "FILE_READY_MAX_ATTEMPTS",
                FILE_READY_MAX_ATTEMPTS,
            )?,
            ready_initial_delay: Duration::from_millis(parse_or(
                &lookup,
                "FILE_READY_INITIAL_DELAY_MS",
                FILE_READY_INITIAL_DELAY_MS,
            )?),
        };

        let publish = PublishSettings {
            max_retries: parse_or(&lookup, "MAX_RETRIES", MAX_RETRIES)?,
            retry_base_delay: Duration::from_millis(parse_or(
                &lookup,
                "RETRY_BASE_DELAY_MS",
                RETRY_BASE_DELAY_MS,
            )?),
            rate_limit_per_second: parse_or(&lookup, "RATE_LIMIT_PER_SECOND", RATE_LIMIT_PER_SECOND)?,
        };

        let timezone_name = lookup("STATS_TIMEZONE").unwrap_or_else(|| STATS_TIMEZONE.to_string());
        let timezone = Tz::from_str(timezone_name.trim()).map_err(|e| {
            anyhow::anyhow!(
                "STATS_TIMEZONE '{}' is not a known IANA timezone: {}",
                timezone_name,
                e
            )
        })?;

        let stats = StatsSettings {
            report_interval: parse_or(&lookup, "STATS_REPORT_INTERVAL", STATS_REPORT_INTERVAL)?,
            timezone,
        };

        let cleanup = CleanupSettings {
            temp_dir: PathBuf::from(
                lookup("TEMP_PHOTOS_DIR").unwrap_or_else(|| TEMP_PHOTOS_DIR.to_string()),
            ),
            max_age: Duration::from_secs(scaled(
                "CLEANUP_AGE_HOURS",
                parse_or(&lookup, "CLEANUP_AGE_HOURS", CLEANUP_AGE_HOURS)?,
                3600,
            )?),
            interval: Duration::from_secs(scaled(
                "CLEANUP_INTERVAL_HOURS",
                parse_or(&lookup, "CLEANUP_INTERVAL_HOURS", CLEANUP_INTERVAL_HOURS)?,
                3600,
            )?),
        };

        let log_format = match lookup("LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        Ok(Config {
            api,
            files,
            publish,
            stats,
            cleanup,
            log_format,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.api.access_token.is_empty() || self.api.group_token.is_empty() {
            return Err(anyhow::anyhow!(
                "ACCESS_TOKEN and GROUP_TOKEN must not be empty"
            ));
        }

        if self.api.group_id == 0 {
            return Err(anyhow::anyhow!("GROUP_ID must be a positive number"));
        }

        if self.files.max_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be positive"));
        }

        if self.files.min_size_bytes > self.files.max_size_bytes {
            return Err(anyhow::anyhow!(
                "MIN_FILE_SIZE_BYTES ({}) exceeds the maximum file size ({} bytes)",
                self.files.min_size_bytes,
                self.files.max_size_bytes
            ));
        }

        if self.files.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_EXTENSIONS must list at least one extension"));
        }

        if self.files.ready_max_attempts == 0 {
            return Err(anyhow::anyhow!("FILE_READY_MAX_ATTEMPTS must be positive"));
        }

        if self.files.read_chunk_size == 0 {
            return Err(anyhow::anyhow!("FILE_READ_CHUNK_SIZE must be positive"));
        }

        if self.publish.max_retries == 0 {
            return Err(anyhow::anyhow!("MAX_RETRIES must be positive"));
        }

        if self.publish.rate_limit_per_second == 0 {
            return Err(anyhow::anyhow!("RATE_LIMIT_PER_SECOND must be positive"));
        }

        if self.stats.report_interval == 0 {
            return Err(anyhow::anyhow!("STATS_REPORT_INTERVAL must be positive"));
        }

        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number, got '{}'", key, raw)),
        _ => Ok(default),
    }
}

/// Convert a configured amount to base units, rejecting values that overflow
fn scaled(key: &str, value: u64, factor: u64) -> Result<u64, anyhow::Error> {
    value
        .checked_mul(factor)
        .ok_or_else(|| anyhow::anyhow!("{} is too large, got {}", key, value))
}

fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
