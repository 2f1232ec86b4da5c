use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{
    marker::PhantomData,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::warn;

/// Owns the output of one topic: a single-slot replay value plus the ordered list of live
/// consumers.
///
/// Dropping the [`TopicHandle`] drops every consumer sender, completing each [`TopicStream`].
#[derive(Debug, Default)]
pub struct TopicHandle {
    latest: Option<Arc<Value>>,
    consumers: Vec<mpsc::UnboundedSender<Arc<Value>>>,
}

impl TopicHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently published message, replayed to every newly registered consumer.
    pub fn latest(&self) -> Option<&Value> {
        self.latest.as_deref()
    }

    /// Number of consumers registered and not yet known to be dropped.
    pub fn consumers(&self) -> usize {
        self.consumers.len()
    }

    /// Register a new consumer, returning a [`TopicStream`] that first yields the latest
    /// message (if any), then every subsequently published message.
    pub fn register<T>(&mut self) -> TopicStream<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.consumers.push(tx);
        TopicStream::new(self.latest.clone(), rx)
    }

    /// Publish a message to every consumer in registration order, replacing the replay value.
    ///
    /// Consumers that have dropped their [`TopicStream`] are pruned, the topic itself stays
    /// alive until explicitly removed.
    pub fn publish(&mut self, message: Value) {
        let message = Arc::new(message);
        self.consumers
            .retain(|consumer| consumer.send(Arc::clone(&message)).is_ok());
        self.latest = Some(message);
    }
}

/// Consumer view over a topic.
///
/// Yields the topic's replay value first (if one existed at registration), then live messages
/// in arrival order, each decoded into `T`. Messages that cannot be decoded into `T` are
/// skipped. The stream ends when the topic is unsubscribed or the connection is lost.
#[derive(Debug)]
pub struct TopicStream<T> {
    replay: Option<Arc<Value>>,
    live: Option<UnboundedReceiverStream<Arc<Value>>>,
    phantom: PhantomData<fn() -> T>,
}

impl<T> TopicStream<T> {
    pub(crate) fn new(replay: Option<Arc<Value>>, rx: mpsc::UnboundedReceiver<Arc<Value>>) -> Self {
        Self {
            replay,
            live: Some(UnboundedReceiverStream::new(rx)),
            phantom: PhantomData,
        }
    }

    /// Construct an already terminated [`TopicStream`] that yields nothing.
    pub fn empty() -> Self {
        Self {
            replay: None,
            live: None,
            phantom: PhantomData,
        }
    }
}

impl<T> Stream for TopicStream<T>
where
    T: DeserializeOwned,
{
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if let Some(message) = this.replay.take() {
            if let Some(item) = decode(&message) {
                return Poll::Ready(Some(item));
            }
        }

        let Some(live) = this.live.as_mut() else {
            return Poll::Ready(None);
        };

        loop {
            match live.poll_next_unpin(cx) {
                Poll::Ready(Some(message)) => {
                    if let Some(item) = decode(&message) {
                        return Poll::Ready(Some(item));
                    }
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

fn decode<T>(message: &Value) -> Option<T>
where
    T: DeserializeOwned,
{
    T::deserialize(message)
        .inspect_err(|error| {
            warn!(
                %error,
                output = std::any::type_name::<T>(),
                "skipping message that failed to decode into topic output type"
            )
        })
        .ok()
}
