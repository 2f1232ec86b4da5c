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

//! # Feedmux-Integration
//! Low-level transport plumbing used by `feedmux`.
//!
//! Provides:
//! * The [`Transport`](protocol::Transport) contract: open a [`Connection`](protocol::Connection)
//!   to an endpoint, yielding an outbound text frame sink and a lazily driven stream of decoded
//!   inbound frames.
//! * A `tokio-tungstenite` backed [`WebSocketTransport`](protocol::websocket::WebSocketTransport).
//! * The [`SocketError`](error::SocketError) taxonomy shared by every transport.

/// All [`Error`](std::error::Error)s generated in Feedmux-Integration.
pub mod error;

/// Contains the [`Transport`](protocol::Transport) contract and the concrete WebSocket
/// implementation.
pub mod protocol;
