use thiserror::Error;

use crate::transport::TransportError;

/// The failure categories callers of the gateway client act on.
#[derive(Debug, Error)]
pub enum PesapalError {
    /// Required configuration is missing. Raised before any network traffic.
    #[error("PesaPal is not configured: {0}")]
    Configuration(String),
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    /// The gateway refused our credentials.
    #[error("Authentication with the payment gateway failed: {0}")]
    Auth(String),
    /// The network path to the gateway failed, retries included.
    #[error("{0}")]
    Transport(#[from] TransportError),
    /// A well-formed response carrying a rejection.
    #[error("The payment gateway rejected the request: {0}")]
    Gateway(String),
    #[error("Could not deserialize JSON: {0}")]
    Json(String),
}
