//! Background task driving one connection
//!
//! The task owns the WebSocket stream. It opens the socket, forwards inbound
//! frames to message observers, answers transport pings, sends keepalive
//! pings of its own, and walks the reconnect state machine when the link
//! drops. Handles feed it serialized frames over an outbound channel and
//! signal teardown through a dedicated notifier; state they need to read
//! synchronously (status, attempt counter, liveness) lives in the shared
//! [`ConnectionInner`].

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::protocol::ServerFrame;

use super::handle::ConnectionInner;
use super::status::ConnectionStatus;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why the per-socket loop ended
enum LoopExit {
    /// The link dropped; the reconnect state machine decides what happens
    Lost,
    /// Explicit teardown; the task must end
    Shutdown,
}

/// Run the connection until teardown or retry exhaustion
pub(super) async fn run(inner: Arc<ConnectionInner>, mut outbound_rx: mpsc::Receiver<String>) {
    loop {
        inner.set_status(ConnectionStatus::Connecting);

        match tokio_tungstenite::connect_async(inner.url.as_str()).await {
            Ok((ws, _response)) => {
                inner.reconnect_attempts.store(0, Ordering::SeqCst);
                inner.set_status(ConnectionStatus::Connected);
                tracing::info!(path = %inner.path, "Connection open");

                match drive(ws, &inner, &mut outbound_rx).await {
                    LoopExit::Shutdown => {
                        finish(&inner);
                        return;
                    }
                    LoopExit::Lost => {
                        tracing::warn!(path = %inner.path, "Connection lost");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(path = %inner.path, error = %e, "Connection open failed");
            }
        }

        // Link is down; decide between a retry and giving up
        if !inner.should_reconnect.load(Ordering::SeqCst) {
            finish(&inner);
            return;
        }

        // Incremented before the delay is computed, so the 1st retry waits
        // one base interval
        let attempts = inner.reconnect_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if !inner.config.can_retry(attempts) {
            tracing::warn!(
                path = %inner.path,
                attempts,
                max = inner.config.max_reconnect_attempts,
                "Reconnect attempts exhausted, abandoning connection"
            );
            finish(&inner);
            return;
        }

        inner.set_status(ConnectionStatus::Reconnecting);
        let delay = inner.config.backoff_delay(attempts);
        tracing::info!(
            path = %inner.path,
            attempt = attempts,
            delay_ms = delay.as_millis() as u64,
            "Reconnecting after backoff"
        );

        // Backoff sleep, cancellable by teardown so no timer outlives
        // disconnect()
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => break,
                _ = inner.shutdown.notified() => {
                    finish(&inner);
                    return;
                }
                frame = outbound_rx.recv() => match frame {
                    Some(_) => {
                        tracing::warn!(path = %inner.path, "Dropping outbound frame, connection not open");
                    }
                    None => {
                        finish(&inner);
                        return;
                    }
                },
            }
        }
    }
}

/// Terminal exit: record the final status and drop the registry entry so a
/// later `connect()` on the path starts fresh
///
/// Removal is identity-checked: if the path was already reconnected through
/// a fresh `connect()`, the new entry stays.
fn finish(inner: &Arc<ConnectionInner>) {
    inner.set_status(ConnectionStatus::Disconnected);
    if let Some(registry) = inner.registry.upgrade() {
        registry.remove(&inner.path, inner);
    }
}

/// Pump one open socket until it drops or teardown is requested
async fn drive(
    mut ws: WsStream,
    inner: &ConnectionInner,
    outbound_rx: &mut mpsc::Receiver<String>,
) -> LoopExit {
    let mut keepalive = tokio::time::interval_at(
        tokio::time::Instant::now() + inner.config.ping_interval,
        inner.config.ping_interval,
    );

    loop {
        tokio::select! {
            _ = inner.shutdown.notified() => {
                let _ = ws.close(None).await;
                return LoopExit::Shutdown;
            }

            frame = outbound_rx.recv() => match frame {
                Some(text) => {
                    if let Err(e) = ws.send(Message::text(text)).await {
                        tracing::warn!(path = %inner.path, error = %e, "Outbound send failed");
                        return LoopExit::Lost;
                    }
                }
                None => {
                    let _ = ws.close(None).await;
                    return LoopExit::Shutdown;
                }
            },

            _ = keepalive.tick() => {
                if let Err(e) = ws.send(Message::Ping(Bytes::new())).await {
                    tracing::warn!(path = %inner.path, error = %e, "Keepalive ping failed");
                    return LoopExit::Lost;
                }
            }

            frame = ws.next() => match frame {
                Some(Ok(Message::Text(text))) => handle_text(inner, text.as_str()),
                Some(Ok(Message::Ping(payload))) => {
                    let _ = ws.send(Message::Pong(payload)).await;
                }
                Some(Ok(Message::Pong(_))) => {
                    // Transport-level pong; the JSON liveness frame is what
                    // updates the timestamp
                }
                Some(Ok(Message::Binary(_))) => {
                    tracing::warn!(path = %inner.path, "Dropping unexpected binary frame");
                }
                Some(Ok(Message::Close(_))) => return LoopExit::Lost,
                Some(Ok(Message::Frame(_))) => {}
                Some(Err(e)) => {
                    // Transport errors are logged; the lost stream is what
                    // feeds the reconnect state machine
                    tracing::error!(path = %inner.path, error = %e, "Transport error");
                    return LoopExit::Lost;
                }
                None => return LoopExit::Lost,
            },
        }
    }
}

/// Parse one inbound text frame and route it
///
/// `pong` frames update the liveness timestamp and are swallowed; everything
/// else goes verbatim to every message observer. Malformed text is logged and
/// dropped without disturbing the connection.
fn handle_text(inner: &ConnectionInner, text: &str) {
    match ServerFrame::parse(text) {
        Ok(ServerFrame::Pong) => {
            *inner.last_pong.lock().expect("liveness poisoned") = Some(Instant::now());
            tracing::trace!(path = %inner.path, "Liveness ack");
        }
        Ok(frame) => inner.message_observers.notify(&frame),
        Err(e) => {
            tracing::warn!(path = %inner.path, error = %e, "Dropping malformed frame");
        }
    }
}
