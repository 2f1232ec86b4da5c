use self::key::TopicKey;
use crate::error::DataError;
use derive_more::Display;
use serde::{Deserialize, Serialize, Serializer, ser::SerializeStruct};
use smol_str::SmolStr;

/// Defines the [`TopicKey`] that uniquely identifies one logical subscription.
pub mod key;

/// Whether a [`Request`] opens or closes a topic.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    #[display("subscribe")]
    Subscribe,
    #[display("unsubscribe")]
    Unsubscribe,
}

/// Singleton subscription request naming exactly one channel and one product.
///
/// Serialises to the wire frame sent to the exchange server, with single element arrays:
/// ```json
/// {"type":"subscribe","product_ids":["BTC-USD"],"channels":["ticker"]}
/// ```
///
/// Deserialising goes via [`WireRequest`], rejecting frames that name more or fewer than one
/// channel and one product.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize)]
#[serde(try_from = "WireRequest")]
pub struct Request {
    pub kind: RequestKind,
    pub channel: SmolStr,
    pub product_id: SmolStr,
}

impl Request {
    pub fn new<C, P>(kind: RequestKind, channel: C, product_id: P) -> Self
    where
        C: AsRef<str>,
        P: AsRef<str>,
    {
        Self {
            kind,
            channel: SmolStr::new(channel),
            product_id: SmolStr::new(product_id),
        }
    }

    /// Construct a [`RequestKind::Subscribe`] [`Request`].
    pub fn subscribe<C, P>(channel: C, product_id: P) -> Self
    where
        C: AsRef<str>,
        P: AsRef<str>,
    {
        Self::new(RequestKind::Subscribe, channel, product_id)
    }

    /// Construct a [`RequestKind::Unsubscribe`] [`Request`].
    pub fn unsubscribe<C, P>(channel: C, product_id: P) -> Self
    where
        C: AsRef<str>,
        P: AsRef<str>,
    {
        Self::new(RequestKind::Unsubscribe, channel, product_id)
    }

    /// The [`TopicKey`] this [`Request`] addresses.
    pub fn key(&self) -> TopicKey {
        TopicKey::from(self)
    }

    /// Serialise this [`Request`] into the text frame sent to the exchange server.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Serialize for Request {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Request", 3)?;
        state.serialize_field("type", &self.kind)?;
        state.serialize_field("product_ids", std::slice::from_ref(&self.product_id))?;
        state.serialize_field("channels", std::slice::from_ref(&self.channel))?;
        state.end()
    }
}

/// Raw subscription frame shape as it appears on the wire, with arbitrary length
/// `product_ids` and `channels`.
///
/// Only the singleton form converts into a [`Request`].
#[derive(Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
pub struct WireRequest {
    #[serde(rename = "type")]
    pub kind: RequestKind,
    pub product_ids: Vec<SmolStr>,
    pub channels: Vec<SmolStr>,
}

impl TryFrom<WireRequest> for Request {
    type Error = DataError;

    fn try_from(wire: WireRequest) -> Result<Self, Self::Error> {
        match (wire.channels.as_slice(), wire.product_ids.as_slice()) {
            ([channel], [product_id]) => Ok(Self {
                kind: wire.kind,
                channel: channel.clone(),
                product_id: product_id.clone(),
            }),
            (channels, product_ids) => Err(DataError::MultiTopicRequest {
                channels: channels.len(),
                product_ids: product_ids.len(),
            }),
        }
    }
}
