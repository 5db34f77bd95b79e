pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("forum access denied: {0}")]
    ForumAccess(String),
    #[error("{0}")]
    Validation(String),
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("url: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Whether the current view should be abandoned instead of showing a notice.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Error::ForumAccess(_))
    }

    /// Text suitable for an inline notification.
    pub fn user_message(&self) -> String {
        match self {
            Error::ForumAccess(msg) | Error::Validation(msg) => msg.clone(),
            Error::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
