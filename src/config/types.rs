use std::time::Duration;

use serde::Deserialize;

use crate::args::parsers::parse_duration;
use crate::error::ValidationError;

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub serve: Option<ServeConfig>,
    pub load: Option<LoadConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServeConfig {
    pub listen: Option<String>,
    #[serde(alias = "loki_host")]
    pub loki_url: Option<String>,
    pub service_name: Option<String>,
    #[serde(alias = "version")]
    pub app_version: Option<String>,
    pub source: Option<String>,
    pub sink_timeout: Option<DurationValue>,
    pub read_timeout: Option<DurationValue>,
    pub influx: Option<InfluxConfig>,
    pub db: Option<DbConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InfluxConfig {
    pub endpoint: Option<String>,
    pub org: Option<String>,
    pub bucket: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DbConfig {
    pub path: Option<String>,
    #[serde(alias = "postgres_conn_string")]
    pub postgres_url: Option<String>,
    pub create_metrics_table: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoadConfig {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub vus: Option<usize>,
    pub iterations: Option<u64>,
    pub duration: Option<DurationValue>,
    pub think_time: Option<DurationValue>,
    pub timeout: Option<DurationValue>,
    pub dashboard_id: Option<u64>,
    pub dashboard_param: Option<String>,
}

/// A duration given either as whole seconds or as text with a unit suffix.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(ValidationError::DurationZero)
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => parse_duration(text),
        }
    }
}
