use thiserror::Error;

/// Errors surfaced by the core library
#[derive(Debug, Error)]
pub enum CoreError {
    /// The playback backend reported a load or decode failure
    #[error("Playback source unavailable: {0}")]
    PlaybackSourceUnavailable(String),

    /// A transport command did not reach the backend
    #[error("Backend control failure: {0}")]
    BackendControlFailure(String),

    /// Trailer mode was requested but no trailer key is known
    #[error("No trailer is available for this title")]
    TrailerUnavailable,

    /// The session has been closed and no longer accepts commands
    #[error("Playback session is closed")]
    SessionClosed,

    /// Playback requires a connected wallet
    #[error("Connect your wallet to watch this title")]
    WalletRequired,

    /// Wallet provider returned an error
    #[error("Wallet error ({code}): {message}")]
    Wallet { code: i64, message: String },

    /// Metadata provider returned an unexpected response
    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CoreError {
    /// Shorthand for control failures coming from backend adapters
    pub fn control(message: impl Into<String>) -> Self {
        CoreError::BackendControlFailure(message.into())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
