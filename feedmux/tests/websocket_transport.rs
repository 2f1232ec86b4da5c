use feedmux::{
    ConnectionStatus, Multiplexer,
    config::MultiplexerConfig,
    exchange::coinbase::{Coinbase, channel::CoinbaseChannel},
    retry::RetryPolicy,
    subscription::Request,
};
use feedmux_integration::protocol::websocket::WebSocketTransport;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::{net::TcpListener, sync::oneshot, time::timeout};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use url::Url;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Spawn a local WebSocket server that accepts one client, records its first frame, replies
/// with `replies`, then closes the connection once `close_rx` fires.
async fn spawn_server(
    replies: Vec<Value>,
    close_rx: oneshot::Receiver<()>,
) -> (Url, oneshot::Receiver<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = Url::parse(&format!("ws://{}", listener.local_addr().unwrap())).unwrap();
    let (frame_tx, frame_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut websocket = accept_async(tcp).await.unwrap();

        let frame = loop {
            match websocket.next().await {
                Some(Ok(Message::Text(text))) => break serde_json::from_str::<Value>(&text).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("unexpected client frame: {other:?}"),
            }
        };
        frame_tx.send(frame).unwrap();

        for reply in replies {
            websocket
                .send(Message::text(reply.to_string()))
                .await
                .unwrap();
        }

        let _ = close_rx.await;
        websocket.close(None).await.unwrap();
    });

    (url, frame_rx)
}

fn multiplexer(url: Url) -> Multiplexer<Coinbase> {
    let config = MultiplexerConfig::default()
        .with_url(url)
        .with_connect_retry(RetryPolicy {
            backoff_ms_initial: 10,
            backoff_multiplier: 2,
            backoff_ms_max: 100,
            max_retries: 1,
        });

    Multiplexer::with_config(WebSocketTransport, config)
}

#[tokio::test]
async fn test_websocket_subscribe_receives_ticker_and_completes_on_close() {
    let ticker = json!({"type": "ticker", "product_id": "BTC-USD", "price": "50000"});
    let (close_tx, close_rx) = oneshot::channel();
    let (url, frame_rx) = spawn_server(
        vec![
            json!({"type": "subscriptions", "channels": [{"name": "ticker", "product_ids": ["BTC-USD"]}]}),
            ticker.clone(),
        ],
        close_rx,
    )
    .await;

    let multiplexer = multiplexer(url);
    let mut tickers =
        multiplexer.subscribe::<Value>(&Request::subscribe(CoinbaseChannel::TICKER, "BTC-USD"));

    let frame = timeout(TIMEOUT, frame_rx).await.unwrap().unwrap();
    assert_eq!(
        frame,
        json!({"type": "subscribe", "product_ids": ["BTC-USD"], "channels": ["ticker"]})
    );

    assert_eq!(timeout(TIMEOUT, tickers.next()).await.unwrap(), Some(ticker));
    assert_eq!(multiplexer.connection_status(), ConnectionStatus::Ready);

    close_tx.send(()).unwrap();
    assert_eq!(timeout(TIMEOUT, tickers.next()).await.unwrap(), None);
    assert_eq!(multiplexer.connection_status(), ConnectionStatus::Closed);
}

#[tokio::test]
async fn test_websocket_unreachable_endpoint_closes_connection() {
    // Bind then drop a listener to obtain a local port with nothing listening
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = Url::parse(&format!("ws://{}", listener.local_addr().unwrap())).unwrap();
    drop(listener);

    let multiplexer = multiplexer(url);
    let mut tickers = multiplexer.subscribe::<Value>(&Request::subscribe("ticker", "BTC-USD"));

    assert_eq!(timeout(TIMEOUT, tickers.next()).await.unwrap(), None);
    assert_eq!(multiplexer.connection_status(), ConnectionStatus::Closed);
}
