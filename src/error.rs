use thiserror::Error;

/// Error types that can occur while loading samples, generating text or
/// writing evaluation artifacts.
#[derive(Debug, Error)]
pub enum EvalError {
    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    HttpError(String),
    /// A generation attempt did not finish in time
    #[error("Generation timed out after {seconds}s")]
    Timeout { seconds: u64 },
    /// Authentication and authorization errors
    #[error("Auth error: {0}")]
    AuthError(String),
    /// Invalid request parameters or format
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// Errors returned by the generation service (rate limits, 5xx)
    #[error("Provider error: {0}")]
    ProviderError(String),
    /// API response parsing or format error
    #[error("Response format error: {message}. Raw response: {raw_response}")]
    ResponseFormatError {
        message: String,
        raw_response: String,
    },
    /// JSON serialization/deserialization errors
    #[error("JSON parse error: {0}")]
    JsonError(String),
    /// The local inference program failed
    #[error("Local generation error: {0}")]
    LocalProcess(String),
    /// Retry attempts exceeded
    #[error("Retry attempts exceeded after {attempts} tries: {last_error}")]
    RetryExceeded { attempts: usize, last_error: String },
    /// The sample collection is missing or malformed
    #[error("Input format error: {0}")]
    InputFormat(String),
    /// Configuration could not be read or is inconsistent
    #[error("Config error: {0}")]
    Config(String),
    /// Filesystem errors while reading or writing artifacts
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EvalError {
    /// Whether a failed generation attempt is worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            EvalError::HttpError(_) => true,
            EvalError::Timeout { .. } => true,
            EvalError::ProviderError(_) => true,
            EvalError::ResponseFormatError { .. } => true,
            EvalError::JsonError(_) => true,
            EvalError::LocalProcess(_) => true,
            EvalError::AuthError(_) => false,
            EvalError::InvalidRequest(_) => false,
            EvalError::RetryExceeded { .. } => false,
            EvalError::InputFormat(_) => false,
            EvalError::Config(_) => false,
            EvalError::Io(_) => false,
        }
    }
}

/// Converts reqwest HTTP errors into EvalErrors
impl From<reqwest::Error> for EvalError {
    fn from(err: reqwest::Error) -> Self {
        EvalError::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for EvalError {
    fn from(err: serde_json::Error) -> Self {
        EvalError::JsonError(format!(
            "{} at line {} column {}",
            err,
            err.line(),
            err.column()
        ))
    }
}

impl From<toml::de::Error> for EvalError {
    fn from(err: toml::de::Error) -> Self {
        EvalError::Config(err.to_string())
    }
}
