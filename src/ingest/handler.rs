use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use super::IngestState;
use super::http::{HttpRequest, read_http_request, write_response};
use super::payload::LogPayload;
use crate::error::HttpError;
use crate::parser::{TaggedMetrics, parse_log_line, should_parse};

pub(super) async fn handle_connection(mut socket: TcpStream, state: &IngestState) {
    let read = tokio::time::timeout(state.read_timeout, read_http_request(&mut socket))
        .await
        .unwrap_or_else(|_elapsed| {
            Err(HttpError::ReadTimeout {
                timeout_ms: state.read_timeout.as_millis(),
            })
        });
    let status = match read {
        Ok(request) => match process_request(&request, state) {
            Ok(()) => 200,
            Err(err) => {
                log_rejection(&err);
                err.status()
            }
        },
        Err(err) => {
            log_rejection(&err);
            err.status()
        }
    };

    if let Err(err) = write_response(&mut socket, status).await {
        tracing::debug!("Failed to answer request: {}", err);
    }
}

fn log_rejection(err: &HttpError) {
    if err.status() >= 500 {
        tracing::error!("Error processing request: {}", err);
    } else {
        tracing::debug!("Rejected request: {}", err);
    }
}

pub(super) fn process_request(request: &HttpRequest, state: &IngestState) -> Result<(), HttpError> {
    if request.method != "POST" || !request.path.contains("logs") {
        return Err(HttpError::NotFound);
    }

    let payload: LogPayload = serde_json::from_slice(&request.body)
        .map_err(|err| HttpError::InvalidPayload { source: err })?;

    drop(dispatch(
        state,
        &payload,
        request.header("traceparent"),
        request.header("host"),
    ));
    Ok(())
}

/// Spawns one task per sink write for an accepted payload.
///
/// The returned handles may be dropped; the writes continue detached and
/// report failures through the log.
pub fn dispatch(
    state: &IngestState,
    payload: &LogPayload,
    traceparent: Option<&str>,
    host: Option<&str>,
) -> Vec<JoinHandle<()>> {
    let mut tasks = Vec::new();

    if let Some(loki) = state.sinks.loki.as_ref() {
        let loki = Arc::clone(loki);
        let entry = payload.to_loki_entry(traceparent);
        tasks.push(tokio::spawn(async move {
            if let Err(err) = loki.push(&entry).await {
                tracing::error!("Error sending logs to Loki: {}", err);
            }
        }));
    }

    if !state.sinks.wants_metrics() {
        return tasks;
    }
    let Some(message) = payload.message.as_deref() else {
        return tasks;
    };
    if !should_parse(message) {
        return tasks;
    }

    let metrics = Arc::new(TaggedMetrics {
        version: state.version.clone(),
        source: state
            .source
            .as_deref()
            .or(host)
            .unwrap_or_default()
            .to_owned(),
        record: parse_log_line(message),
    });
    tracing::debug!("Parsed metrics for {} {:?}", metrics.record.verb, metrics.record.endpoint);

    for sink in &state.sinks.metrics {
        let sink = Arc::clone(sink);
        let metrics = Arc::clone(&metrics);
        tasks.push(tokio::spawn(async move {
            if let Err(err) = sink.write(&metrics).await {
                tracing::error!("Error writing metrics to {}: {}", sink.name(), err);
            }
        }));
    }
    tasks
}
