use std::fmt::Write as _;

use async_trait::async_trait;
use url::Url;

use super::MetricsSink;
use super::config::InfluxSinkConfig;
use crate::error::{AppError, AppResult, SinkError, ValidationError};
use crate::parser::{FieldValue, TaggedMetrics};

const MEASUREMENT: &str = "metrics";

/// Renders one record as an InfluxDB line-protocol line.
///
/// Tags with an empty value are left out; InfluxDB rejects them.
///
/// # Errors
///
/// Returns an error if the line cannot be written.
pub fn render_line(metrics: &TaggedMetrics, timestamp_ms: i64) -> AppResult<String> {
    let mut line = String::from(MEASUREMENT);
    for (tag, value) in [("version", &metrics.version), ("source", &metrics.source)] {
        if !value.is_empty() {
            write!(line, ",{}={}", tag, escape_tag(value)).map_err(write_error)?;
        }
    }
    line.push(' ');

    for (position, (name, value)) in metrics.record.fields().iter().enumerate() {
        if position > 0 {
            line.push(',');
        }
        match value {
            FieldValue::Int(value) => write!(line, "{}={}", name, value),
            FieldValue::Float(value) => write!(line, "{}={}", name, value),
            FieldValue::Bool(value) => write!(line, "{}={}", name, value),
            FieldValue::Str(value) => write!(line, "{}=\"{}\"", name, escape_string(value)),
        }
        .map_err(write_error)?;
    }

    write!(line, " {}", timestamp_ms).map_err(write_error)?;
    Ok(line)
}

fn write_error(err: std::fmt::Error) -> AppError {
    AppError::sink(SinkError::WriteLine { source: err })
}

fn escape_tag(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, ',' | '=' | ' ') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn escape_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Writes records to the InfluxDB v2 write API with millisecond precision.
#[derive(Debug)]
pub struct InfluxSink {
    client: reqwest::Client,
    write_url: Url,
    token: String,
}

impl InfluxSink {
    /// # Errors
    ///
    /// Returns an error when the endpoint is not a valid URL.
    pub fn new(client: reqwest::Client, config: &InfluxSinkConfig) -> AppResult<Self> {
        let raw = format!("{}/api/v2/write", config.endpoint.trim_end_matches('/'));
        let mut write_url = Url::parse(&raw).map_err(|err| {
            AppError::validation(ValidationError::InvalidUrl {
                url: config.endpoint.clone(),
                source: err,
            })
        })?;
        write_url
            .query_pairs_mut()
            .append_pair("org", &config.org)
            .append_pair("bucket", &config.bucket)
            .append_pair("precision", "ms");

        Ok(Self {
            client,
            write_url,
            token: config.token.clone(),
        })
    }

    #[must_use]
    pub const fn write_url(&self) -> &Url {
        &self.write_url
    }
}

#[async_trait]
impl MetricsSink for InfluxSink {
    fn name(&self) -> &'static str {
        "influx"
    }

    async fn write(&self, metrics: &TaggedMetrics) -> AppResult<()> {
        let line = render_line(metrics, chrono::Utc::now().timestamp_millis())?;

        let response = self
            .client
            .post(self.write_url.clone())
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", self.token))
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .header(reqwest::header::ACCEPT, "application/json")
            .body(line)
            .send()
            .await
            .map_err(|err| AppError::sink(SinkError::InfluxRequest { source: err }))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::sink(SinkError::InfluxStatus {
                status: status.as_u16(),
            }));
        }
        Ok(())
    }
}
