use feedmux::{
    Multiplexer,
    exchange::coinbase::{Coinbase, channel::CoinbaseChannel, market::CoinbaseMarket},
    subscription::Request,
};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Ticker {
    product_id: String,
    price: String,
    best_bid: String,
    best_ask: String,
}

#[tokio::main]
async fn main() {
    // Initialise INFO Tracing log subscriber
    init_logging();

    // Single connection shared by every topic, opened on first subscribe
    let multiplexer = Multiplexer::<Coinbase>::default();

    let btc_usd = CoinbaseMarket::new("btc", "usd");
    let eth_usd = CoinbaseMarket::new("eth", "usd");

    // Typed ticker stream
    let mut tickers =
        multiplexer.subscribe::<Ticker>(&Request::subscribe(CoinbaseChannel::TICKER, &btc_usd));

    // Raw level2 stream, yields both `snapshot` & `l2update` messages
    let mut books =
        multiplexer.subscribe::<Value>(&Request::subscribe(CoinbaseChannel::LEVEL2, &eth_usd));

    // Subscribing again reuses the live ticker topic without another subscribe frame
    let mut tickers_again =
        multiplexer.subscribe::<Value>(&Request::subscribe(CoinbaseChannel::TICKER, &btc_usd));

    tokio::spawn(async move {
        while let Some(ticker) = tickers.next().await {
            info!(?ticker, "ticker");
        }
        info!("ticker stream ended");
    });

    tokio::spawn(async move {
        while let Some(update) = books.next().await {
            info!(kind = %update["type"], "level2");
        }
        info!("level2 stream ended");
    });

    tokio::spawn(async move {
        while let Some(ticker) = tickers_again.next().await {
            info!(price = %ticker["price"], "ticker (second consumer)");
        }
    });

    tokio::time::sleep(Duration::from_secs(10)).await;
    info!(topics = ?multiplexer.active_topics(), "unsubscribing from level2");
    multiplexer.unsubscribe(&Request::unsubscribe(CoinbaseChannel::LEVEL2, &eth_usd));

    tokio::time::sleep(Duration::from_secs(10)).await;
    info!(status = %multiplexer.connection_status(), "shutting down");
}

// Initialise an INFO `Subscriber` for `Tracing` Json logs and install it as the global default.
fn init_logging() {
    tracing_subscriber::fmt()
        // Filter messages based on the INFO
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        // Disable colours on release builds
        .with_ansi(cfg!(debug_assertions))
        // Enable Json formatting
        .json()
        // Install this Tracing subscriber as global default
        .init()
}
