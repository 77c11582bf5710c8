use thiserror::Error;

/// Failure of a single weather lookup.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// The provider could not be reached (timeout, DNS, connection refused...).
    #[error("Network error: {0}")]
    Network(String),

    /// The provider answered with a non-200 status.
    #[error("City not found or API error: {status_code} ({message})")]
    Provider { status_code: u16, message: String },

    /// The provider answered 200 but the body is missing expected fields.
    #[error("Malformed weather response: {0}")]
    MalformedResponse(String),
}

impl WeatherError {
    /// Short description suitable for an external host, preferring the provider's own message.
    pub fn host_message(&self) -> String {
        match self {
            WeatherError::Provider { message, .. } => format!("API error: {message}"),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        WeatherError::Network(err.to_string())
    }
}

/// Failure talking to the language-model backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("{status_code} - {body}")]
    Status { status_code: u16, body: String },

    #[error("unexpected response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Network(err.to_string())
    }
}
