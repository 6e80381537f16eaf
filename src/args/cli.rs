use clap::{ArgAction, Args, Parser, Subcommand};
use std::time::Duration;

use super::defaults::{
    DEFAULT_DASHBOARD_ID, DEFAULT_DASHBOARD_PARAM, DEFAULT_LISTEN, DEFAULT_SERVICE_NAME,
    DEFAULT_VERSION,
};
use super::parsers::{
    parse_duration_arg, parse_positive_u64, parse_positive_usize, parse_strict_flag,
};
use super::types::{PositiveU64, PositiveUsize};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Forward application logs to Loki, extract access-log metrics into InfluxDB/PostgreSQL/SQLite, and replay a fixed API sequence for load generation."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging (sets log level to debug unless overridden by LOGRELAY_LOG/RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(long = "no-color", env = "NO_COLOR", global = true)]
    pub no_color: bool,

    /// Path to config file (TOML/JSON). Defaults to ./logrelay.toml or ./logrelay.json if present.
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Accept log payloads over HTTP and relay them to the configured sinks
    Serve(ServeArgs),
    /// Replay the fixed API sequence against a target host
    Load(LoadArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "LOGRELAY_LISTEN", default_value = DEFAULT_LISTEN)]
    pub listen: String,

    /// Loki push endpoint (e.g. http://loki:3100/loki/api/v1/push)
    #[arg(long = "loki-url", env = "LOKI_HOST")]
    pub loki_url: Option<String>,

    /// `service_name` label attached to forwarded log streams
    #[arg(long = "service-name", default_value = DEFAULT_SERVICE_NAME)]
    pub service_name: String,

    /// InfluxDB base URL (enables the Influx metrics sink)
    #[arg(long = "influx-endpoint", env = "INFLUX_ENDPOINT")]
    pub influx_endpoint: Option<String>,

    /// InfluxDB organization
    #[arg(long = "influx-org", env = "INFLUX_ORG")]
    pub influx_org: Option<String>,

    /// InfluxDB bucket
    #[arg(long = "influx-bucket", env = "INFLUX_BUCKET")]
    pub influx_bucket: Option<String>,

    /// InfluxDB API token
    #[arg(long = "influx-token", env = "INFLUX_TOKEN", hide_env_values = true)]
    pub influx_token: Option<String>,

    /// SQLite database file (enables the SQLite metrics sink)
    #[arg(long = "db-path", env = "LOGRELAY_DB_PATH")]
    pub db_path: Option<String>,

    /// PostgreSQL connection string (enables the PostgreSQL metrics sink)
    #[arg(long = "postgres-url", env = "POSTGRES_CONN_STRING", hide_env_values = true)]
    pub postgres_url: Option<String>,

    /// Drop and recreate the metrics table on startup (env value must be exactly `true`)
    #[arg(
        long = "create-metrics-table",
        env = "CREATE_METRICS_TABLE",
        action = ArgAction::SetTrue,
        value_parser = parse_strict_flag()
    )]
    pub create_metrics_table: bool,

    /// Version tag attached to every metrics record
    #[arg(long = "app-version", env = "VERSION", default_value = DEFAULT_VERSION)]
    pub app_version: String,

    /// Source tag attached to every metrics record (defaults to the request Host header)
    #[arg(long, env = "SOURCE")]
    pub source: Option<String>,

    /// Timeout for outgoing sink requests (supports ms/s/m/h)
    #[arg(
        long = "sink-timeout",
        default_value = "10s",
        value_parser = parse_duration_arg
    )]
    pub sink_timeout: Duration,

    /// Time allowed for a client to send a complete request (supports ms/s/m/h)
    #[arg(
        long = "read-timeout",
        default_value = "30s",
        value_parser = parse_duration_arg
    )]
    pub read_timeout: Duration,
}

#[derive(Debug, Args, Clone)]
pub struct LoadArgs {
    /// Base URL of the target host
    #[arg(long, env = "LOGRELAY_HOST")]
    pub host: Option<String>,

    /// Username used for the session login
    #[arg(long, env = "LOGRELAY_USER")]
    pub user: Option<String>,

    /// Password used for the session login
    #[arg(long, env = "LOGRELAY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Number of concurrent virtual users
    #[arg(long, default_value = "1", value_parser = parse_positive_usize)]
    pub vus: PositiveUsize,

    /// Iterations per virtual user (runs until --duration or Ctrl+C when unset)
    #[arg(long, value_parser = parse_positive_u64)]
    pub iterations: Option<PositiveU64>,

    /// Stop after this long (supports ms/s/m/h)
    #[arg(long, value_parser = parse_duration_arg)]
    pub duration: Option<Duration>,

    /// Pause at the start and end of every iteration (supports ms/s/m/h)
    #[arg(
        long = "think-time",
        default_value = "1s",
        value_parser = parse_duration_arg
    )]
    pub think_time: Duration,

    /// Request timeout (supports ms/s/m/h)
    #[arg(
        long = "timeout",
        default_value = "10s",
        value_parser = parse_duration_arg
    )]
    pub request_timeout: Duration,

    /// Dashboard id used by the dashboard requests
    #[arg(long = "dashboard-id", default_value_t = DEFAULT_DASHBOARD_ID)]
    pub dashboard_id: u64,

    /// Dashboard parameter id used by the parameter values request
    #[arg(long = "dashboard-param", default_value = DEFAULT_DASHBOARD_PARAM)]
    pub dashboard_param: String,
}
