/// [`TopicHandle`](handle::TopicHandle) single-slot replay fan-out and the consumer facing
/// [`TopicStream`](handle::TopicStream).
pub mod handle;

/// Topic table shared between a [`Multiplexer`](crate::multiplexer::Multiplexer) and its
/// connection task, holding the lazily initialised connection state and inbound routing.
pub(crate) mod table;

/// Spawned connection task that owns the [`Transport`](feedmux_integration::protocol::Transport)
/// connection, using `tokio::select!` to multiplex outbound commands and inbound frames.
pub(crate) mod task;
