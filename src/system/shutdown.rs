use tokio::sync::broadcast;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

pub type ShutdownSender = broadcast::Sender<()>;
pub type ShutdownReceiver = broadcast::Receiver<()>;

/// Broadcast channel size for shutdown notifications (single signal fan-out).
const SHUTDOWN_CHANNEL_CAPACITY: usize = 1;

#[must_use]
pub fn shutdown_channel() -> (ShutdownSender, ShutdownReceiver) {
    broadcast::channel::<()>(SHUTDOWN_CHANNEL_CAPACITY)
}

/// Fans SIGINT/SIGTERM out to every shutdown subscriber. The task exits on
/// its own once any other party sends on the channel.
pub fn setup_signal_shutdown_handler(shutdown_tx: &ShutdownSender) -> tokio::task::JoinHandle<()> {
    let shutdown_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        let mut shutdown_rx = shutdown_tx.subscribe();

        #[cfg(unix)]
        let mut term_signal = match signal(SignalKind::terminate()) {
            Ok(signal) => Some(signal),
            Err(err) => {
                tracing::warn!("Failed to register SIGTERM handler: {}", err);
                None
            }
        };

        #[cfg(unix)]
        {
            tokio::select! {
                _ = shutdown_rx.recv() => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received Ctrl+C, shutting down");
                    drop(shutdown_tx.send(()));
                }
                () = async {
                    if let Some(signal) = term_signal.as_mut() {
                        signal.recv().await;
                    } else {
                        std::future::pending::<()>().await;
                    }
                } => {
                    tracing::info!("Received SIGTERM, shutting down");
                    drop(shutdown_tx.send(()));
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                _ = shutdown_rx.recv() => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received Ctrl+C, shutting down");
                    drop(shutdown_tx.send(()));
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const SIGNAL_HANDLER_SETTLE: Duration = Duration::from_millis(10);
    const SHUTDOWN_HANDLER_TIMEOUT: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn signal_handler_exits_on_shutdown() -> Result<(), String> {
        let (shutdown_tx, _) = shutdown_channel();
        let handle = setup_signal_shutdown_handler(&shutdown_tx);

        tokio::time::sleep(SIGNAL_HANDLER_SETTLE).await;
        if shutdown_tx.send(()).is_err() {
            return Err("Failed to send shutdown".to_owned());
        }

        tokio::time::timeout(SHUTDOWN_HANDLER_TIMEOUT, handle)
            .await
            .map_err(|err| format!("Timed out waiting for shutdown handler: {}", err))?
            .map_err(|err| format!("Shutdown task join error: {}", err))?;
        Ok(())
    }

    #[tokio::test]
    async fn every_subscriber_sees_shutdown() -> Result<(), String> {
        let (shutdown_tx, mut first) = shutdown_channel();
        let mut second = shutdown_tx.subscribe();

        shutdown_tx
            .send(())
            .map_err(|err| format!("send failed: {}", err))?;

        first
            .recv()
            .await
            .map_err(|err| format!("first recv failed: {}", err))?;
        second
            .recv()
            .await
            .map_err(|err| format!("second recv failed: {}", err))?;
        Ok(())
    }
}
