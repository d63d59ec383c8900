use thiserror::Error;

pub type NominaResult<T> = Result<T, NominaError>;

#[derive(Error, Debug)]
pub enum NominaError {
    /// Rejected before any request was sent (extension, size, empty selection).
    #[error("{0}")]
    LocalValidation(String),

    /// The backend answered with an envelope whose status is not a success code.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed payload: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A workflow stage ended in failure; carries the message it displayed.
    #[error("{stage} failed: {message}")]
    Stage { stage: &'static str, message: String },
}

impl NominaError {
    /// The single string a stage shows to the user.
    ///
    /// Local and application failures carry the message verbatim; the
    /// remaining variants use their `Display` text.
    pub fn user_message(&self) -> String {
        match self {
            NominaError::LocalValidation(message) => message.clone(),
            NominaError::Api { message, .. } => message.clone(),
            NominaError::Transport(message) => message.clone(),
            NominaError::Stage { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// True when no request reached the backend.
    pub fn is_local(&self) -> bool {
        matches!(self, NominaError::LocalValidation(_))
    }
}

impl From<reqwest::Error> for NominaError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            NominaError::Decode(err.to_string())
        } else {
            NominaError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for NominaError {
    fn from(err: serde_json::Error) -> Self {
        NominaError::Decode(err.to_string())
    }
}
