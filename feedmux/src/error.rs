use feedmux_integration::error::SocketError;
use thiserror::Error;

/// All errors generated in `feedmux`.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("SocketError: {0}")]
    Socket(String),

    #[error(
        "request must name exactly one channel and one product, got {channels} channel(s) and {product_ids} product(s)"
    )]
    MultiTopicRequest {
        channels: usize,
        product_ids: usize,
    },

    #[error("connection already initialised: the Transport may only be created once")]
    ConnectionAlreadyInitialised,

    #[error("no Tokio runtime available to drive the connection task")]
    NoRuntime,
}

impl From<SocketError> for DataError {
    fn from(value: SocketError) -> Self {
        Self::Socket(value.to_string())
    }
}
