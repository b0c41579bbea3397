//! MLLP listener
//!
//! One task per connection, each owning its own framing buffer. Frames on a
//! connection are handled strictly in order: the ack for frame N is flushed
//! before frame N+1 is read. The number of live connections is bounded by a
//! semaphore; when it is exhausted the listener stops accepting until a
//! connection closes.

use super::ack::{build_ack, AckCode};
use super::codec::MllpCodec;
use super::sink::InboundSink;
use crate::config::MllpConfig;
use crate::domain::{Document, MllpError, Result};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Semaphore};
use tokio_util::codec::Framed;

struct ConnectionContext {
    sink: Arc<dyn InboundSink>,
    read_timeout: Duration,
    max_frame_bytes: usize,
    supported_versions: Vec<String>,
}

/// Bound MLLP server
pub struct MllpServer {
    listener: TcpListener,
    limit: Arc<Semaphore>,
    context: Arc<ConnectionContext>,
}

impl MllpServer {
    /// Bind the listener described by `config`
    ///
    /// # Errors
    ///
    /// Returns [`MllpError::ConnectionFailed`] when the address cannot be bound.
    pub async fn bind(config: &MllpConfig, sink: Arc<dyn InboundSink>) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| MllpError::ConnectionFailed(format!("bind {addr}: {e}")))?;

        tracing::info!(
            address = %addr,
            max_connections = config.max_connections,
            sink = sink.name(),
            "MLLP listener bound"
        );

        Ok(Self {
            listener,
            limit: Arc::new(Semaphore::new(config.max_connections.max(1))),
            context: Arc::new(ConnectionContext {
                sink,
                read_timeout: Duration::from_secs(config.read_timeout_seconds),
                max_frame_bytes: config.max_frame_bytes,
                supported_versions: config.supported_versions.clone(),
            }),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr().map_err(MllpError::from)?)
    }

    /// Accept connections until `shutdown` flips to `true`
    ///
    /// Connections already being served finish on their own; only the
    /// listener is closed.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        loop {
            let permit = tokio::select! {
                _ = wait_for_shutdown(&mut shutdown) => break,
                permit = self.limit.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let (stream, peer) = tokio::select! {
                _ = wait_for_shutdown(&mut shutdown) => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to accept connection");
                        continue;
                    }
                },
            };

            tracing::debug!(peer = %peer, "Connection accepted");
            let context = Arc::clone(&self.context);
            tokio::spawn(async move {
                serve_connection(stream, peer, context).await;
                drop(permit);
            });
        }

        tracing::info!("MLLP listener stopped");
        Ok(())
    }
}

async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            // Sender gone: nobody can ask us to stop any more
            std::future::pending::<()>().await;
        }
    }
}

async fn serve_connection(stream: TcpStream, peer: SocketAddr, context: Arc<ConnectionContext>) {
    let mut transport = Framed::new(
        stream,
        MllpCodec::with_max_frame_bytes(context.max_frame_bytes),
    );
    let mut frames = 0u64;

    loop {
        let payload = match tokio::time::timeout(context.read_timeout, transport.next()).await {
            Err(_) => {
                tracing::debug!(peer = %peer, "Connection idle timeout");
                break;
            }
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                tracing::warn!(peer = %peer, error = %e, "Closing connection after read error");
                break;
            }
            Ok(Some(Ok(payload))) => payload,
        };

        frames += 1;
        let ack = acknowledge(&context, &payload).await;
        if let Err(e) = transport.send(ack.as_bytes()).await {
            tracing::warn!(peer = %peer, error = %e, "Failed to send acknowledgment");
            break;
        }
    }

    tracing::debug!(peer = %peer, frames = frames, "Connection closed");
}

async fn acknowledge(context: &ConnectionContext, payload: &[u8]) -> String {
    let doc = match Document::parse_supported(payload, &context.supported_versions) {
        Ok(doc) => doc,
        Err(e) => {
            let doc = Document::parse(payload);
            tracing::warn!(control_id = doc.control_id(), error = %e, "Rejecting message");
            return build_ack(Some(&doc), AckCode::Reject);
        }
    };
    crate::log_frame_received!(doc.control_id(), doc.message_type(), payload.len());

    match context.sink.accept(payload, &doc).await {
        Ok(()) => build_ack(Some(&doc), AckCode::Accept),
        Err(e) => {
            tracing::error!(
                control_id = doc.control_id(),
                sink = context.sink.name(),
                error = %e,
                "Inbound sink failed"
            );
            build_ack(Some(&doc), AckCode::Error)
        }
    }
}
