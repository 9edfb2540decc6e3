use std::time::Duration;

use reqwest::blocking::Client;

use super::loader::parse_relationships;
use super::model::RelationshipTable;
use crate::config::ViewerConfig;
use crate::error::{Result, ViewerError};

/// Anything that can produce the relationship table.
pub trait RelationshipSource {
    fn fetch_relationships(&self) -> Result<RelationshipTable>;

    /// Short description used in log lines and the status bar.
    fn describe(&self) -> String;
}

/// Fetches the dataset over HTTP with a blocking client.
pub struct HttpSource {
    url: String,
    client: Client,
}

impl HttpSource {
    pub fn new(url: &str, timeout: Option<Duration>) -> Result<Self> {
        // The blocking client defaults to 30s; `None` disables the timeout.
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.to_string(),
            client,
        })
    }

    pub fn from_config(config: &ViewerConfig) -> Result<Self> {
        Self::new(&config.data_url, config.http_timeout)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RelationshipSource for HttpSource {
    fn fetch_relationships(&self) -> Result<RelationshipTable> {
        log::info!("Fetching relationships from {}", self.url);
        let response = self.client.get(&self.url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ViewerError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text()?;
        let table = parse_relationships(&body)?;
        log::info!(
            "Fetched {} relationships with {} columns",
            table.len(),
            table.columns.len()
        );
        Ok(table)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// A fixed table, e.g. a snapshot opened from disk.
pub struct StaticSource {
    label: String,
    table: RelationshipTable,
}

impl StaticSource {
    pub fn new(label: impl Into<String>, table: RelationshipTable) -> Self {
        Self {
            label: label.into(),
            table,
        }
    }
}

impl RelationshipSource for StaticSource {
    fn fetch_relationships(&self) -> Result<RelationshipTable> {
        Ok(self.table.clone())
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}
