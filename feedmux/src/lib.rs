#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::needless_return,
    clippy::useless_let_if_seq,
    future_incompatible,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity)]

//! # Feedmux
//! Single-connection, multi-subscription stream multiplexer for publish/subscribe market data
//! feeds such as the Coinbase Exchange WebSocket feed.
//!
//! One physical connection carries many logical topics, each identified by a
//! `(channel, product_id)` [`TopicKey`](subscription::key::TopicKey). The [`Multiplexer`]:
//! * Lazily opens the connection on first subscribe, and never opens a second one.
//! * Sends each subscribe frame once per topic, however many callers subscribe.
//! * Routes every inbound message to its topic, resolving exchange specific message `type`
//!   aliases (eg/ Coinbase `l2update` belongs to the `level2` channel).
//! * Replays the latest message of a topic to late joining consumers.
//!
//! ## Example
//! ```rust,no_run
//! use feedmux::{
//!     Multiplexer,
//!     exchange::coinbase::{Coinbase, channel::CoinbaseChannel, market::CoinbaseMarket},
//!     subscription::Request,
//! };
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() {
//!     let multiplexer = Multiplexer::<Coinbase>::default();
//!
//!     let request = Request::subscribe(CoinbaseChannel::TICKER, CoinbaseMarket::new("btc", "usd"));
//!     let mut tickers = multiplexer.subscribe::<serde_json::Value>(&request);
//!
//!     while let Some(ticker) = tickers.next().await {
//!         println!("{ticker}");
//!     }
//! }
//! ```

/// [`MultiplexerConfig`](config::MultiplexerConfig) for endpoint and connect retry overrides.
pub mod config;

/// All [`Error`](std::error::Error)s generated in Feedmux.
pub mod error;

/// [`Connector`](exchange::Connector) implementations for each exchange, defining the endpoint
/// and inbound message `type` to channel aliases.
pub mod exchange;

/// The [`Multiplexer`] that owns the connection and topic table.
pub mod multiplexer;

/// Exponential backoff [`RetryPolicy`](retry::RetryPolicy) used when opening a connection.
pub mod retry;

/// Topic handles, consumer streams and the spawned connection task.
pub mod streams;

/// Singleton subscription [`Request`](subscription::Request)s and
/// [`TopicKey`](subscription::key::TopicKey) derivation.
pub mod subscription;

pub use multiplexer::{ConnectionStatus, Multiplexer};
pub use streams::handle::TopicStream;
