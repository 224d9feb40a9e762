use thiserror::Error;

/// Maximum number of characters of a provider response body kept in an error.
const MAX_BODY: usize = 200;

/// Failures surfaced by the fetcher and the refresh orchestrator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SunboardError {
    /// The API credential is missing or still the placeholder. Fatal to a whole cycle.
    #[error("{0}")]
    Configuration(String),

    /// A single city's request failed: bad status, transport error or malformed JSON.
    #[error("{}", provider_message(*.status, .message))]
    Provider { status: Option<u16>, message: String },

    /// Anything the orchestration itself tripped over.
    #[error("Refresh failed: {0}")]
    Unexpected(String),
}

impl SunboardError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Provider failure for a non-success HTTP status, carrying the response body.
    pub fn http_status(status: u16, body: &str) -> Self {
        Self::Provider { status: Some(status), message: truncate_body(body) }
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider { status: None, message: message.into() }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

fn provider_message(status: Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("HTTP {code} from WeatherAPI. {message}").trim().to_string(),
        None => message.to_string(),
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    if body.chars().count() > MAX_BODY {
        let cut: String = body.chars().take(MAX_BODY).collect();
        format!("{cut}...")
    } else {
        body.to_string()
    }
}
