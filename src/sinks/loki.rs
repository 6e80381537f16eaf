use serde::Serialize;

use crate::error::{AppError, AppResult, SinkError};

/// Structured metadata attached to a pushed log line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LokiMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceparent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

/// One log line ready to be pushed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LokiEntry {
    pub source: Option<String>,
    pub level: Option<String>,
    pub logger: Option<String>,
    pub timestamp: String,
    pub line: String,
    pub metadata: LokiMetadata,
}

#[derive(Debug, Serialize)]
pub struct PushBody<'entry> {
    streams: [PushStream<'entry>; 1],
}

#[derive(Debug, Serialize)]
struct PushStream<'entry> {
    stream: StreamLabels<'entry>,
    values: [(&'entry str, &'entry str, &'entry LokiMetadata); 1],
}

#[derive(Debug, Serialize)]
struct StreamLabels<'entry> {
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'entry str>,
    service_name: &'entry str,
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<&'entry str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    logger: Option<&'entry str>,
}

/// Builds the push API body for a single entry: one stream, one value.
#[must_use]
pub fn push_body<'entry>(entry: &'entry LokiEntry, service_name: &'entry str) -> PushBody<'entry> {
    PushBody {
        streams: [PushStream {
            stream: StreamLabels {
                source: entry.source.as_deref(),
                service_name,
                level: entry.level.as_deref(),
                logger: entry.logger.as_deref(),
            },
            values: [(
                entry.timestamp.as_str(),
                entry.line.as_str(),
                &entry.metadata,
            )],
        }],
    }
}

#[derive(Debug)]
pub struct LokiSink {
    client: reqwest::Client,
    url: String,
    service_name: String,
}

impl LokiSink {
    #[must_use]
    pub const fn new(client: reqwest::Client, url: String, service_name: String) -> Self {
        Self {
            client,
            url,
            service_name,
        }
    }

    /// Pushes one entry to the Loki push API.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails or Loki answers with a
    /// non-success status.
    pub async fn push(&self, entry: &LokiEntry) -> AppResult<()> {
        let body = push_body(entry, &self.service_name);
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|err| AppError::sink(SinkError::LokiRequest { source: err }))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::sink(SinkError::LokiStatus {
                status: status.as_u16(),
            }));
        }
        tracing::debug!("Pushed log line to Loki ({})", status.as_u16());
        Ok(())
    }
}
