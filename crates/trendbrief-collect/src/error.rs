use thiserror::Error;

/// Errors from the upstream collectors.
///
/// None of these are fatal for a pipeline run: the orchestration layer maps
/// any collector failure to an empty record set plus a "skipped" coverage
/// entry, so the differencing engine never sees an error from this crate.
#[derive(Debug, Error)]
pub enum CollectError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream asked us to back off (HTTP 429).
    #[error("rate limited fetching {url}")]
    RateLimited { url: String },

    /// A non-2xx status that is not a rate limit.
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// A response body could not be deserialized into the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Malformed XML in a feed body.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),
}
