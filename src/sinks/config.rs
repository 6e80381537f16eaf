use std::time::Duration;

use crate::args::{DEFAULT_USER_AGENT, ServeArgs};
use crate::error::{AppError, AppResult, ValidationError};

#[derive(Debug, Clone)]
pub struct SinksConfig {
    pub loki_url: Option<String>,
    pub service_name: String,
    pub influx: Option<InfluxSinkConfig>,
    pub db: Option<DbSinkConfig>,
    pub postgres: Option<PostgresSinkConfig>,
    pub timeout: Duration,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct InfluxSinkConfig {
    pub endpoint: String,
    pub org: String,
    pub bucket: String,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct DbSinkConfig {
    pub path: String,
    pub recreate_table: bool,
}

#[derive(Clone)]
pub struct PostgresSinkConfig {
    pub url: String,
    pub recreate_table: bool,
}

impl std::fmt::Debug for PostgresSinkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresSinkConfig")
            .field("url", &"<redacted>")
            .field("recreate_table", &self.recreate_table)
            .finish()
    }
}

impl SinksConfig {
    /// Derives the sink configuration from the resolved serve arguments.
    ///
    /// The Influx sink is enabled by its endpoint; once enabled, org, bucket
    /// and token are required.
    ///
    /// # Errors
    ///
    /// Returns an error when the Influx endpoint is set without the rest of
    /// its settings.
    pub fn from_args(args: &ServeArgs) -> AppResult<Self> {
        let influx = non_empty(args.influx_endpoint.as_deref())
            .map(|endpoint| -> AppResult<InfluxSinkConfig> {
                Ok(InfluxSinkConfig {
                    endpoint: endpoint.to_owned(),
                    org: required(args.influx_org.as_deref(), "INFLUX_ORG")?,
                    bucket: required(args.influx_bucket.as_deref(), "INFLUX_BUCKET")?,
                    token: required(args.influx_token.as_deref(), "INFLUX_TOKEN")?,
                })
            })
            .transpose()?;

        let db = non_empty(args.db_path.as_deref()).map(|path| DbSinkConfig {
            path: path.to_owned(),
            recreate_table: args.create_metrics_table,
        });

        let postgres = non_empty(args.postgres_url.as_deref()).map(|url| PostgresSinkConfig {
            url: url.to_owned(),
            recreate_table: args.create_metrics_table,
        });

        Ok(Self {
            loki_url: non_empty(args.loki_url.as_deref()).map(str::to_owned),
            service_name: args.service_name.clone(),
            influx,
            db,
            postgres,
            timeout: args.sink_timeout,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

fn required(value: Option<&str>, missing: &'static str) -> AppResult<String> {
    non_empty(value)
        .map(str::to_owned)
        .ok_or_else(|| AppError::validation(ValidationError::IncompleteInfluxConfig { missing }))
}
