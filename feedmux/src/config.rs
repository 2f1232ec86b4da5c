use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration for a [`Multiplexer`](crate::multiplexer::Multiplexer).
///
/// Every field has a default, so a partial (or empty) JSON object is a valid configuration.
///
/// ### Example
/// ```json
/// {
///     "url": "wss://ws-feed.exchange.coinbase.com",
///     "connect_retry": {
///         "backoff_ms_initial": 125,
///         "backoff_multiplier": 2,
///         "backoff_ms_max": 60000,
///         "max_retries": 3
///     }
/// }
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MultiplexerConfig {
    /// Overrides the exchange [`Connector::url`](crate::exchange::Connector::url) endpoint.
    pub url: Option<Url>,

    /// Backoff applied while opening the connection.
    pub connect_retry: RetryPolicy,
}

impl MultiplexerConfig {
    pub fn with_url(self, url: Url) -> Self {
        Self {
            url: Some(url),
            ..self
        }
    }

    pub fn with_connect_retry(self, connect_retry: RetryPolicy) -> Self {
        Self {
            connect_retry,
            ..self
        }
    }
}
