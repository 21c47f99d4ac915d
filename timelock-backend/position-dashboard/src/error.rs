use thiserror::Error;

/// Bad user input, caught before any side effect.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct ValidationError(pub String);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Stacks API unreachable: {0}")]
    Transport(String),

    #[error("Stacks API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Read-only call rejected: {0}")]
    Rejected(String),

    #[error("Contract returned an error: {0}")]
    ContractErr(String),

    #[error("Failed to decode Clarity value: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for QueryError {
    fn from(e: reqwest::Error) -> Self {
        QueryError::Transport(e.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PasskeyError {
    #[error("Challenge must be at least {min} random bytes (got {len})")]
    WeakChallenge { len: usize, min: usize },

    #[error("Passkeys are not supported on this platform")]
    Unsupported,

    #[error("Passkey ceremony was cancelled")]
    Cancelled,

    #[error("Passkey ceremony rejected: {0}")]
    Rejected(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WalletError {
    #[error("A wallet session is already active")]
    AlreadyConnected,

    #[error("No wallet session is active")]
    NotConnected,

    #[error("Wallet handshake failed: {0}")]
    Handshake(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Position submission failed: {0}")]
pub struct SubmissionError(pub String);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DashboardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Passkey(#[from] PasskeyError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid contract identifier {0:?}, expected ADDRESS.contract-name")]
    InvalidContract(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
