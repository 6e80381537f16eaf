use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{LoadArgs, PositiveU64, PositiveUsize, ServeArgs};
use crate::error::{AppError, AppResult, ConfigError};

use super::types::{DurationValue, LoadConfig, ServeConfig};

/// Applies `[serve]` config values to arguments not set on the command line
/// or through the environment.
///
/// # Errors
///
/// Returns an error when a config value is invalid.
pub fn apply_serve_config(
    args: &mut ServeArgs,
    matches: &ArgMatches,
    config: &ServeConfig,
) -> AppResult<()> {
    if !is_explicit(matches, "listen")
        && let Some(listen) = config.listen.clone()
    {
        args.listen = listen;
    }

    if !is_explicit(matches, "loki_url")
        && let Some(url) = config.loki_url.clone()
    {
        args.loki_url = Some(url);
    }

    if !is_explicit(matches, "service_name")
        && let Some(name) = config.service_name.clone()
    {
        args.service_name = name;
    }

    if !is_explicit(matches, "app_version")
        && let Some(version) = config.app_version.clone()
    {
        args.app_version = version;
    }

    if !is_explicit(matches, "source")
        && let Some(source) = config.source.clone()
    {
        args.source = Some(source);
    }

    if !is_explicit(matches, "sink_timeout")
        && let Some(timeout) = config.sink_timeout.as_ref()
    {
        args.sink_timeout = to_duration(timeout, "serve.sink_timeout")?;
    }

    if !is_explicit(matches, "read_timeout")
        && let Some(timeout) = config.read_timeout.as_ref()
    {
        args.read_timeout = to_duration(timeout, "serve.read_timeout")?;
    }

    if let Some(influx) = config.influx.as_ref() {
        if !is_explicit(matches, "influx_endpoint")
            && let Some(endpoint) = influx.endpoint.clone()
        {
            args.influx_endpoint = Some(endpoint);
        }
        if !is_explicit(matches, "influx_org")
            && let Some(org) = influx.org.clone()
        {
            args.influx_org = Some(org);
        }
        if !is_explicit(matches, "influx_bucket")
            && let Some(bucket) = influx.bucket.clone()
        {
            args.influx_bucket = Some(bucket);
        }
        if !is_explicit(matches, "influx_token")
            && let Some(token) = influx.token.clone()
        {
            args.influx_token = Some(token);
        }
    }

    if let Some(db) = config.db.as_ref() {
        if !is_explicit(matches, "db_path")
            && let Some(path) = db.path.clone()
        {
            args.db_path = Some(path);
        }
        if !is_explicit(matches, "postgres_url")
            && let Some(url) = db.postgres_url.clone()
        {
            args.postgres_url = Some(url);
        }
        if !is_explicit(matches, "create_metrics_table")
            && let Some(create) = db.create_metrics_table
        {
            args.create_metrics_table = create;
        }
    }

    Ok(())
}

/// Applies `[load]` config values to arguments not set on the command line
/// or through the environment.
///
/// # Errors
///
/// Returns an error when a config value is invalid.
pub fn apply_load_config(
    args: &mut LoadArgs,
    matches: &ArgMatches,
    config: &LoadConfig,
) -> AppResult<()> {
    if !is_explicit(matches, "host")
        && let Some(host) = config.host.clone()
    {
        args.host = Some(host);
    }

    if !is_explicit(matches, "user")
        && let Some(user) = config.user.clone()
    {
        args.user = Some(user);
    }

    if !is_explicit(matches, "password")
        && let Some(password) = config.password.clone()
    {
        args.password = Some(password);
    }

    if !is_explicit(matches, "vus")
        && let Some(vus) = config.vus
    {
        args.vus = PositiveUsize::try_from(vus).map_err(|err| positive_error("load.vus", err))?;
    }

    if !is_explicit(matches, "iterations")
        && let Some(iterations) = config.iterations
    {
        args.iterations = Some(
            PositiveU64::try_from(iterations)
                .map_err(|err| positive_error("load.iterations", err))?,
        );
    }

    if !is_explicit(matches, "duration")
        && let Some(duration) = config.duration.as_ref()
    {
        args.duration = Some(to_duration(duration, "load.duration")?);
    }

    if !is_explicit(matches, "think_time")
        && let Some(think_time) = config.think_time.as_ref()
    {
        args.think_time = to_duration(think_time, "load.think_time")?;
    }

    if !is_explicit(matches, "request_timeout")
        && let Some(timeout) = config.timeout.as_ref()
    {
        args.request_timeout = to_duration(timeout, "load.timeout")?;
    }

    if !is_explicit(matches, "dashboard_id")
        && let Some(id) = config.dashboard_id
    {
        args.dashboard_id = id;
    }

    if !is_explicit(matches, "dashboard_param")
        && let Some(param) = config.dashboard_param.clone()
    {
        args.dashboard_param = param;
    }

    Ok(())
}

/// Command line and environment both win over the config file.
fn is_explicit(matches: &ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(ValueSource::CommandLine | ValueSource::EnvVariable)
    )
}

fn to_duration(value: &DurationValue, field: &'static str) -> AppResult<std::time::Duration> {
    value
        .to_duration()
        .map_err(|err| AppError::config(ConfigError::InvalidDuration { field, source: err }))
}

fn positive_error(field: &str, source: crate::error::ValidationError) -> AppError {
    AppError::config(ConfigError::FieldMustBePositive {
        field: field.to_owned(),
        source,
    })
}
