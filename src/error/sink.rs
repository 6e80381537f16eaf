use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to build HTTP client: {source}")]
    BuildClient {
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to send logs to Loki: {source}")]
    LokiRequest {
        #[source]
        source: reqwest::Error,
    },
    #[error("Loki rejected logs with HTTP status {status}")]
    LokiStatus { status: u16 },
    #[error("Failed to send metrics to InfluxDB: {source}")]
    InfluxRequest {
        #[source]
        source: reqwest::Error,
    },
    #[error("InfluxDB rejected metrics with HTTP status {status}")]
    InfluxStatus { status: u16 },
    #[error("Failed to write line: {source}")]
    WriteLine {
        #[source]
        source: std::fmt::Error,
    },
    #[error("{context}: {source}")]
    Database {
        context: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("{name} writer has stopped")]
    WriterStopped { name: &'static str },
}
