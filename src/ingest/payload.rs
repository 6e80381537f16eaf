use serde::Deserialize;

use crate::sinks::{LokiEntry, LokiMetadata};

/// JSON log event as emitted by the application's log appender.
///
/// Only the fields the relay forwards are modelled; everything else is
/// ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogPayload {
    pub message: Option<String>,
    pub timestamp: Option<serde_json::Value>,
    pub level: Option<String>,
    pub logger_name: Option<String>,
    pub source_host: Option<String>,
    pub mdc: Option<Mdc>,
    pub exception: Option<ExceptionInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Mdc {
    pub traceid: Option<String>,
    pub span_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExceptionInfo {
    pub exception_class: Option<String>,
    pub stacktrace: Option<String>,
}

impl LogPayload {
    /// Timestamp as sent, or the current time in nanoseconds when missing.
    #[must_use]
    pub fn timestamp_text(&self) -> String {
        match self.timestamp.as_ref() {
            Some(serde_json::Value::String(text)) => text.clone(),
            Some(serde_json::Value::Number(number)) => number.to_string(),
            Some(_) | None => chrono::Utc::now()
                .timestamp_nanos_opt()
                .map_or_else(String::new, |nanos| nanos.to_string()),
        }
    }

    /// The message, with the stacktrace appended on its own line when an
    /// exception is attached.
    #[must_use]
    pub fn line(&self) -> String {
        let message = self.message.as_deref().unwrap_or_default();
        self.exception
            .as_ref()
            .and_then(|exception| exception.stacktrace.as_deref())
            .map_or_else(
                || message.to_owned(),
                |stacktrace| format!("{}\n{}", message, stacktrace),
            )
    }

    #[must_use]
    pub fn to_loki_entry(&self, traceparent: Option<&str>) -> LokiEntry {
        LokiEntry {
            source: self.source_host.clone(),
            level: self.level.clone(),
            logger: self.logger_name.clone(),
            timestamp: self.timestamp_text(),
            line: self.line(),
            metadata: LokiMetadata {
                traceparent: traceparent.map(str::to_owned),
                trace_id: self.mdc.as_ref().and_then(|mdc| mdc.traceid.clone()),
                span_id: self.mdc.as_ref().and_then(|mdc| mdc.span_id.clone()),
                exception: self
                    .exception
                    .as_ref()
                    .and_then(|exception| exception.exception_class.clone()),
            },
        }
    }
}
