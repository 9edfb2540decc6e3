use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_DATA_URL: &str = "http://crimproject.org/data/relationships/";
pub const DEFAULT_EXPORT_MIME: &str = "text/csv";
pub const DEFAULT_LINK_TEXT: &str = "Click here to download your data!";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Endpoint returning the JSON array of relationships.
    pub data_url: String,
    /// HTTP timeout for the fetch; `None` waits indefinitely.
    pub http_timeout: Option<Duration>,
    /// MIME type written into download data URIs.
    pub export_mime: String,
    pub link_text: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            data_url: DEFAULT_DATA_URL.to_string(),
            http_timeout: None,
            export_mime: DEFAULT_EXPORT_MIME.to_string(),
            link_text: DEFAULT_LINK_TEXT.to_string(),
        }
    }
}

impl ViewerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_data_url(None)
    }

    /// Like [`ViewerConfig::load`], with `data_url` (e.g. a `--url` flag)
    /// taking the place of `CRIM_DATA_URL`. The override is validated too.
    pub fn load_with_data_url(data_url: Option<&str>) -> Result<Self, ConfigError> {
        Self::from_lookup_overriding(|key| std::env::var(key).ok(), data_url)
    }

    fn from_lookup_overriding<F>(lookup: F, data_url: Option<&str>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup(|key| match data_url {
            Some(url) if key == "CRIM_DATA_URL" => Some(url.to_string()),
            _ => lookup(key),
        })
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let data_url = lookup("CRIM_DATA_URL").unwrap_or(defaults.data_url);

        let http_timeout = match lookup("CRIM_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    ConfigError::ValidationError(format!(
                        "CRIM_HTTP_TIMEOUT_SECS must be a whole number of seconds, got {raw:?}"
                    ))
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let export_mime = lookup("CRIM_EXPORT_MIME").unwrap_or(defaults.export_mime);
        let link_text = lookup("CRIM_LINK_TEXT").unwrap_or(defaults.link_text);

        let config = ViewerConfig {
            data_url,
            http_timeout,
            export_mime,
            link_text,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.data_url.starts_with("http://") || self.data_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "CRIM_DATA_URL must be an http(s) URL, got {:?}",
                self.data_url
            )));
        }

        if self.export_mime.trim().is_empty() || !self.export_mime.contains('/') {
            return Err(ConfigError::ValidationError(format!(
                "CRIM_EXPORT_MIME must look like type/subtype, got {:?}",
                self.export_mime
            )));
        }

        if self.http_timeout == Some(Duration::ZERO) {
            log::warn!("CRIM_HTTP_TIMEOUT_SECS=0 makes every fetch time out immediately");
        }

        Ok(())
    }
}
