use thiserror::Error;

/// Errors raised while retrieving, shaping, filtering or exporting the dataset.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("Fetch error: {url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Parse error: expected a top-level JSON array")]
    NotAnArray,
    #[error("Parse error: record {0} is not a JSON object")]
    RecordNotObject(usize),
    #[error("Schema drift: upstream data is missing columns {0:?}")]
    SchemaDrift(Vec<String>),
    #[error("Unknown column: {0}")]
    FilterFieldMissing(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ViewerError {
    /// Whether the error comes from retrieving or decoding the upstream data.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            ViewerError::Fetch(_)
                | ViewerError::Status { .. }
                | ViewerError::Parse(_)
                | ViewerError::NotAnArray
                | ViewerError::RecordNotObject(_)
                | ViewerError::SchemaDrift(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ViewerError>;
