//! HTTP endpoint that accepts log payloads and relays them to the sinks.
mod handler;
mod http;
mod payload;


use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::error::{AppError, AppResult, HttpError, ValidationError};
use crate::sinks::Sinks;
use crate::system::shutdown::ShutdownReceiver;

pub use handler::dispatch;
pub use payload::{ExceptionInfo, LogPayload, Mdc};

/// Shared, read-only state of the ingest server.
#[derive(Debug)]
pub struct IngestState {
    pub sinks: Sinks,
    /// `version` tag for metrics records.
    pub version: String,
    /// Fixed `source` tag; the request's `Host` header is used when unset.
    pub source: Option<String>,
    /// Time a client has to deliver a complete request.
    pub read_timeout: Duration,
}

/// Binds the ingest listener.
///
/// # Errors
///
/// Returns an error when the address is invalid or cannot be bound.
pub async fn bind(listen: &str) -> AppResult<TcpListener> {
    let addr: SocketAddr = listen.parse().map_err(|err| {
        AppError::validation(ValidationError::InvalidListenAddr {
            value: listen.to_owned(),
            source: err,
        })
    })?;
    TcpListener::bind(addr).await.map_err(|err| {
        AppError::http(HttpError::Bind {
            addr: listen.to_owned(),
            source: err,
        })
    })
}

/// Accepts connections until a shutdown notification arrives. Each
/// connection is served on its own task.
pub async fn serve(
    listener: TcpListener,
    state: Arc<IngestState>,
    mut shutdown_rx: ShutdownReceiver,
) {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Listening for logs on http://{}", addr);
    }

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                tracing::info!("Ingest server stopped");
                break;
            }
            accepted = listener.accept() => {
                let (socket, peer) = match accepted {
                    Ok(result) => result,
                    Err(err) => {
                        tracing::warn!("Failed to accept connection: {}", err);
                        continue;
                    }
                };
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    tracing::trace!("Connection from {}", peer);
                    handler::handle_connection(socket, &state).await;
                });
            }
        }
    }
}
