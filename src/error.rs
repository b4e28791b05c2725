use thiserror::Error;

/// Failure reported by the HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No response was received (connect failure, timeout, bad request setup).
    #[error("{message}")]
    Client { message: String },

    /// A response arrived but its status was not a success, or its body did not decode.
    #[error("{status}: {message}")]
    Server { status: u16, message: String },
}

/// The only error value that leaves the post store: a preformatted message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StoreError {
    message: String,
}

impl StoreError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<TransportError> for StoreError {
    fn from(err: TransportError) -> Self {
        let message = match err {
            TransportError::Client { message } => format!("Client error: {message}"),
            TransportError::Server { status, message } => {
                format!("Server error: {status}, message: {message}")
            }
        };
        tracing::error!("{message}");
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_failures_are_prefixed() {
        let err = StoreError::from(TransportError::Client {
            message: "timeout".to_string(),
        });
        assert_eq!(err.message(), "Client error: timeout");
    }

    #[test]
    fn server_failures_carry_status() {
        let err = StoreError::from(TransportError::Server {
            status: 500,
            message: "Internal".to_string(),
        });
        assert_eq!(err.to_string(), "Server error: 500, message: Internal");
    }
}
