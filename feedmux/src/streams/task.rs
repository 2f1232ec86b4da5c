use super::table::{Command, Routed, TopicTable, lock};
use crate::{
    exchange::{Connector, ExchangeId},
    retry::{RetryPolicy, retry_with_backoff},
};
use feedmux_integration::{
    error::SocketError,
    protocol::{Connection, Transport},
};
use futures::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};
use url::Url;

/// Spawned connection task that owns the [`Transport`] connection.
///
/// Opens the connection with exponential backoff, then uses `tokio::select!` to multiplex
/// outbound [`Command`]s and inbound frame routing. The [`TopicTable`] is only held weakly:
/// once the owning [`Multiplexer`](crate::multiplexer::Multiplexer) is dropped, the command
/// channel closes and the task exits.
///
/// [`Transport::open`] is attempted up to `max_retries + 1` times, retrying only errors for
/// which [`SocketError::is_retriable`] holds. If the connection still cannot be opened, fails,
/// or is closed by the server, the table is closed, completing every open topic stream.
pub(crate) async fn connection_task<Exchange, Tr>(
    transport: Arc<Tr>,
    url: Url,
    policy: RetryPolicy,
    mut command_rx: mpsc::UnboundedReceiver<Command>,
    table: Weak<Mutex<TopicTable>>,
) where
    Exchange: Connector,
    Tr: Transport,
{
    let exchange = Exchange::ID;

    // === Connect phase ===
    let should_retry = |error: &SocketError| {
        let retriable = error.is_retriable();
        if retriable {
            warn!(%exchange, %url, %error, "failed to open connection, retrying");
        }
        retriable
    };

    let connection = retry_with_backoff(&policy, should_retry, || transport.open(&url)).await;

    let Connection {
        mut sink,
        mut stream,
    } = match connection {
        Ok(connection) => connection,
        Err(error) => {
            error!(%exchange, %url, %error, "failed to open connection");
            close(&table, exchange);
            return;
        }
    };

    match table.upgrade() {
        Some(table) => lock(&table).mark_ready(),
        None => return,
    }
    info!(%exchange, %url, "connection ready");

    // === Multiplex commands & frames ===
    loop {
        tokio::select! {
            command = command_rx.recv() => {
                let Some(command) = command else {
                    // Multiplexer dropped, shut down task
                    debug!(%exchange, "multiplexer dropped, closing connection");
                    let _ = sink.close().await;
                    return;
                };

                let frame = match command.request().to_frame() {
                    Ok(frame) => frame,
                    Err(error) => {
                        warn!(%exchange, ?command, %error, "failed to serialise request, skipping");
                        continue;
                    }
                };

                debug!(%exchange, %frame, "sending request frame");
                if let Err(error) = sink.send(frame).await {
                    warn!(%exchange, %error, "failed to send request frame");
                    break;
                }
            }
            frame = stream.next() => {
                let message = match frame {
                    Some(Ok(message)) => message,
                    Some(Err(error)) if !error.is_terminal() => {
                        warn!(%exchange, %error, "skipping undecodable frame");
                        continue;
                    }
                    Some(Err(error)) => {
                        warn!(%exchange, %error, "connection failed");
                        break;
                    }
                    None => {
                        warn!(%exchange, "connection closed by server");
                        break;
                    }
                };

                let Some(table) = table.upgrade() else {
                    return;
                };

                match lock(&table).route::<Exchange>(message) {
                    Routed::Delivered(key) => trace!(%exchange, %key, "delivered message"),
                    Routed::Unrouted(key) => trace!(%exchange, %key, "discarded message for inactive topic"),
                    Routed::Malformed => trace!(%exchange, "discarded message without type or product_id"),
                }
            }
        }
    }

    close(&table, exchange);
}

fn close(table: &Weak<Mutex<TopicTable>>, exchange: ExchangeId) {
    if let Some(table) = table.upgrade() {
        let closed = lock(&table).close();
        warn!(%exchange, topics = closed, "connection lost, completed all open topic streams");
    }
}
