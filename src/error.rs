use thiserror::Error;


#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid {
        key: &'static str,
        value: String,
    },
}

/// The payload could not be read as an audit event at all.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InterpretError {
    #[error("event payload is not a JSON object")]
    NotAnObject,

    #[error("event payload has no detail object")]
    MissingDetail,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchErrorKind {
    Transport,
    Rejected,
    Encode,
}

/// Delivery of a rendered message failed.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Connection refused, DNS failure, timeout and the like.
    #[error("webhook request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("webhook rejected message with HTTP {status}: {body}")]
    Rejected {
        status: u16,
        body: String,
    },

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

impl DispatchError {
    pub fn kind(&self) -> DispatchErrorKind {
        match self {
            DispatchError::Transport(_) => DispatchErrorKind::Transport,
            DispatchError::Rejected { .. } => DispatchErrorKind::Rejected,
            DispatchError::Encode(_) => DispatchErrorKind::Encode,
        }
    }
}


#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Interpret(#[from] InterpretError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
