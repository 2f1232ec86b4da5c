use super::Request;
use crate::exchange::Connector;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

/// Uniquely identifies one logical subscription (topic) by its `(channel, product_id)` pair.
///
/// Both components are kept separately, so distinct pairs never collide. The same key is
/// derived from outbound [`Request`]s and from inbound messages, see [`TopicKey::from_inbound`].
#[derive(
    Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize, Display,
)]
#[display("{channel}|{product_id}")]
pub struct TopicKey {
    pub channel: SmolStr,
    pub product_id: SmolStr,
}

impl TopicKey {
    pub fn new<C, P>(channel: C, product_id: P) -> Self
    where
        C: AsRef<str>,
        P: AsRef<str>,
    {
        Self {
            channel: SmolStr::new(channel),
            product_id: SmolStr::new(product_id),
        }
    }

    /// Derive the [`TopicKey`] of an inbound message.
    ///
    /// The message `type` is resolved to a channel via the exchange [`Connector::channel`]
    /// alias table. Returns `None` if the message lacks a string `type` or `product_id`.
    pub fn from_inbound<Exchange>(message: &Value) -> Option<Self>
    where
        Exchange: Connector,
    {
        let kind = message.get("type")?.as_str()?;
        let product_id = message.get("product_id")?.as_str()?;
        Some(Self::new(Exchange::channel(kind), product_id))
    }
}

impl From<&Request> for TopicKey {
    fn from(request: &Request) -> Self {
        Self {
            channel: request.channel.clone(),
            product_id: request.product_id.clone(),
        }
    }
}
