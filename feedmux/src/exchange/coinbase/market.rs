use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, StrExt, format_smolstr};

/// Type that names a [`Coinbase`](super::Coinbase) market (`product_id`) that can be
/// subscribed to, eg/ "BTC-USD".
///
/// See docs: <https://docs.cloud.coinbase.com/exchange/docs/websocket-overview#subscribe>
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
pub struct CoinbaseMarket(pub SmolStr);

impl CoinbaseMarket {
    /// Construct the [`CoinbaseMarket`] for the provided base and quote assets.
    pub fn new(base: &str, quote: &str) -> Self {
        Self(format_smolstr!("{base}-{quote}").to_uppercase_smolstr())
    }
}

impl AsRef<str> for CoinbaseMarket {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CoinbaseMarket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}
