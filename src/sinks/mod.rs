//! Destinations for relayed logs and extracted metrics.
//!
//! Log lines go to Loki. Metrics records go to every configured
//! [`MetricsSink`]: the InfluxDB line-protocol writer and the SQLite table
//! writer.
mod config;
mod db;
mod influx;
mod loki;
mod pg;


use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{AppError, AppResult, SinkError};
use crate::parser::TaggedMetrics;

pub use config::{DbSinkConfig, InfluxSinkConfig, PostgresSinkConfig, SinksConfig};
pub use db::MetricsDb;
pub use influx::{InfluxSink, render_line};
pub use loki::{LokiEntry, LokiMetadata, LokiSink, PushBody, push_body};
pub use pg::PostgresSink;

/// A destination for tagged metrics records.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Short name used in log messages.
    fn name(&self) -> &'static str;

    /// Writes one record.
    ///
    /// # Errors
    ///
    /// Returns an error when the destination rejects or cannot receive the
    /// record.
    async fn write(&self, metrics: &TaggedMetrics) -> AppResult<()>;
}

/// The set of sinks built from the serve configuration.
#[derive(Clone)]
pub struct Sinks {
    pub loki: Option<Arc<LokiSink>>,
    pub metrics: Vec<Arc<dyn MetricsSink>>,
}

impl std::fmt::Debug for Sinks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&'static str> = self.metrics.iter().map(|sink| sink.name()).collect();
        f.debug_struct("Sinks")
            .field("loki", &self.loki.is_some())
            .field("metrics", &names)
            .finish()
    }
}

impl Sinks {
    /// Connects every configured sink.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built, an endpoint is
    /// not a valid URL, or a database cannot be opened.
    pub async fn connect(config: &SinksConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|err| AppError::sink(SinkError::BuildClient { source: err }))?;

        let loki = config.loki_url.as_ref().map(|url| {
            Arc::new(LokiSink::new(
                client.clone(),
                url.clone(),
                config.service_name.clone(),
            ))
        });

        let mut metrics: Vec<Arc<dyn MetricsSink>> = Vec::new();
        if let Some(influx) = config.influx.as_ref() {
            metrics.push(Arc::new(InfluxSink::new(client.clone(), influx)?));
        }
        if let Some(postgres) = config.postgres.as_ref() {
            metrics.push(Arc::new(PostgresSink::connect(postgres).await?));
        }
        if let Some(db) = config.db.as_ref() {
            metrics.push(Arc::new(MetricsDb::open(db).await?));
        }

        Ok(Self { loki, metrics })
    }

    /// True when at least one metrics sink is configured.
    #[must_use]
    pub fn wants_metrics(&self) -> bool {
        !self.metrics.is_empty()
    }
}
