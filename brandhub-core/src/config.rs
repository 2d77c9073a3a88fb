use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Weeks-scale retention; entries older than this are reaped.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(14 * 24 * 3600);
/// Bound on a single remote thumbnail download.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
/// How often the background reaper runs.
pub const DEFAULT_REAP_INTERVAL: Duration = Duration::from_secs(3600);
/// Route prefix under which the serving layer exposes cached thumbnails.
pub const DEFAULT_SERVING_PREFIX: &str = "/api/assets";

/// Validated runtime configuration for the thumbnail cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailCacheConfig {
    pub cache_dir: PathBuf,
    pub retention: Duration,
    pub fetch_timeout: Duration,
    pub reap_interval: Duration,
    pub serving_prefix: String,
}

impl ThumbnailCacheConfig {
    /// Defaults for everything except the cache root, which has no
    /// sensible universal default.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            retention: DEFAULT_RETENTION,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            reap_interval: DEFAULT_REAP_INTERVAL,
            serving_prefix: DEFAULT_SERVING_PREFIX.to_owned(),
        }
    }

    /// Load from a TOML document, then apply `BRANDHUB_THUMBNAIL_*`
    /// environment overrides.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let raw: RawThumbnailCacheConfig = toml::from_str(document)?;
        let config = Self::from_raw(raw)?;
        config.with_overrides(|key| std::env::var(key).ok())
    }

    fn from_raw(raw: RawThumbnailCacheConfig) -> Result<Self, ConfigError> {
        let cache_dir = raw.cache_dir.ok_or(ConfigError::Invalid {
            field: "cache_dir",
            reason: "a cache directory is required".to_owned(),
        })?;
        let mut config = Self::new(cache_dir);
        if let Some(value) = raw.retention {
            config.retention = parse_duration("retention", &value)?;
        }
        if let Some(value) = raw.fetch_timeout {
            config.fetch_timeout = parse_duration("fetch_timeout", &value)?;
        }
        if let Some(value) = raw.reap_interval {
            config.reap_interval = parse_duration("reap_interval", &value)?;
        }
        if let Some(value) = raw.serving_prefix {
            config.serving_prefix = value;
        }
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup. Separated from `std::env` so
    /// tests can drive it without mutating process state.
    fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup("BRANDHUB_THUMBNAIL_CACHE_DIR") {
            self.cache_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("BRANDHUB_THUMBNAIL_RETENTION") {
            self.retention = parse_duration("retention", &value)?;
        }
        if let Some(value) = lookup("BRANDHUB_THUMBNAIL_FETCH_TIMEOUT") {
            self.fetch_timeout = parse_duration("fetch_timeout", &value)?;
        }
        if let Some(value) = lookup("BRANDHUB_THUMBNAIL_REAP_INTERVAL") {
            self.reap_interval = parse_duration("reap_interval", &value)?;
        }
        if let Some(value) = lookup("BRANDHUB_THUMBNAIL_SERVING_PREFIX") {
            self.serving_prefix = value;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.retention.is_zero() {
            return Err(ConfigError::Invalid {
                field: "retention",
                reason: "retention must be positive".to_owned(),
            });
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "fetch_timeout",
                reason: "fetch timeout must be positive".to_owned(),
            });
        }
        if self.reap_interval.is_zero() {
            return Err(ConfigError::Invalid {
                field: "reap_interval",
                reason: "reap interval must be positive".to_owned(),
            });
        }
        if !self.serving_prefix.starts_with('/') {
            return Err(ConfigError::Invalid {
                field: "serving_prefix",
                reason: format!(
                    "serving prefix must start with '/': {}",
                    self.serving_prefix
                ),
            });
        }
        Ok(())
    }
}

/// TOML-facing model; durations are humantime strings ("14d", "10s").
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawThumbnailCacheConfig {
    cache_dir: Option<PathBuf>,
    retention: Option<String>,
    fetch_timeout: Option<String>,
    reap_interval: Option<String>,
    serving_prefix: Option<String>,
}

fn parse_duration(
    field: &'static str,
    value: &str,
) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value).map_err(|err| ConfigError::Invalid {
        field,
        reason: format!("{value:?}: {err}"),
    })
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid thumbnail cache config field {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },

    #[error("failed to parse thumbnail cache config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_weeks_scale() {
        let config = ThumbnailCacheConfig::new("/var/cache/brandhub");
        assert_eq!(config.retention, Duration::from_secs(14 * 24 * 3600));
        assert_eq!(config.serving_prefix, "/api/assets");
    }

    #[test]
    fn toml_fields_override_defaults() {
        let config = ThumbnailCacheConfig::from_toml_str(
            r#"
            cache_dir = "/tmp/thumbs"
            retention = "7d"
            fetch_timeout = "3s"
            "#,
        )
        .unwrap();
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/thumbs"));
        assert_eq!(config.retention, Duration::from_secs(7 * 24 * 3600));
        assert_eq!(config.fetch_timeout, Duration::from_secs(3));
        assert_eq!(config.reap_interval, DEFAULT_REAP_INTERVAL);
    }

    #[test]
    fn cache_dir_is_required() {
        let err =
            ThumbnailCacheConfig::from_toml_str("retention = \"7d\"")
                .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "cache_dir",
                ..
            }
        ));
    }

    #[test]
    fn malformed_duration_is_rejected() {
        let err = ThumbnailCacheConfig::from_toml_str(
            "cache_dir = \"/tmp/thumbs\"\nretention = \"fortnight\"",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "retention",
                ..
            }
        ));
    }

    #[test]
    fn zero_retention_is_rejected() {
        let err = ThumbnailCacheConfig::from_toml_str(
            "cache_dir = \"/tmp/thumbs\"\nretention = \"0s\"",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "retention",
                ..
            }
        ));
    }

    #[test]
    fn env_overrides_win_over_toml() {
        let config = ThumbnailCacheConfig::new("/var/cache/brandhub")
            .with_overrides(|key| match key {
                "BRANDHUB_THUMBNAIL_CACHE_DIR" => {
                    Some("/srv/thumbs".to_owned())
                }
                "BRANDHUB_THUMBNAIL_RETENTION" => Some("21d".to_owned()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.cache_dir, PathBuf::from("/srv/thumbs"));
        assert_eq!(config.retention, Duration::from_secs(21 * 24 * 3600));
    }

    #[test]
    fn serving_prefix_must_be_rooted() {
        let err = ThumbnailCacheConfig::from_toml_str(
            "cache_dir = \"/tmp/thumbs\"\nserving_prefix = \"thumbs\"",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "serving_prefix",
                ..
            }
        ));
    }
}
