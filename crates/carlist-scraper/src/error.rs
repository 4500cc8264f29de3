use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("empty response body from {url}")]
    EmptyBody { url: String },

    #[error("invalid listing URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid proxy \"{proxy}\": {source}")]
    InvalidProxy {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },
}

/// A field that was present in the card text but could not be used.
///
/// Absence is not an error: extractors return `Ok(None)` for that.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("{field}: cannot parse \"{raw}\" as a number")]
    Malformed { field: &'static str, raw: String },

    #[error("{field}: value {value} outside accepted range")]
    OutOfRange { field: &'static str, value: f64 },
}
