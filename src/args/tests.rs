use super::*;
use crate::args::parsers::{parse_duration, parse_strict_flag};
use clap::Parser;
use clap::builder::TypedValueParser;
use std::ffi::OsStr;
use std::time::Duration;

fn parse_test_args<I, T>(args: I) -> Result<Cli, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args).map_err(|err| format!("parse failed: {}", err))
}

#[test]
fn serve_defaults() -> Result<(), String> {
    let cli = parse_test_args(["logrelay", "serve"])?;
    let Command::Serve(args) = cli.command else {
        return Err("Expected serve command".to_owned());
    };

    if args.listen != DEFAULT_LISTEN && std::env::var_os("LOGRELAY_LISTEN").is_none() {
        return Err(format!("Unexpected listen: {}", args.listen));
    }
    if args.service_name != "metabase" {
        return Err(format!("Unexpected service_name: {}", args.service_name));
    }
    if args.sink_timeout != Duration::from_secs(10) {
        return Err("Unexpected sink_timeout".to_owned());
    }
    if std::env::var_os("VERSION").is_none() && args.app_version != "vUNKNOWN" {
        return Err(format!("Unexpected app_version: {}", args.app_version));
    }
    Ok(())
}

#[test]
fn serve_sink_flags() -> Result<(), String> {
    let cli = parse_test_args([
        "logrelay",
        "serve",
        "--listen",
        "127.0.0.1:9000",
        "--loki-url",
        "http://loki:3100/loki/api/v1/push",
        "--influx-endpoint",
        "http://influx:8086",
        "--influx-org",
        "acme",
        "--influx-bucket",
        "metrics",
        "--influx-token",
        "secret",
        "--db-path",
        "/tmp/metrics.db",
        "--create-metrics-table",
        "--app-version",
        "v50.1",
        "--source",
        "prod",
        "--sink-timeout",
        "500ms",
    ])?;
    let Command::Serve(args) = cli.command else {
        return Err("Expected serve command".to_owned());
    };

    let checks = [
        (args.listen == "127.0.0.1:9000", "listen"),
        (
            args.loki_url.as_deref() == Some("http://loki:3100/loki/api/v1/push"),
            "loki_url",
        ),
        (
            args.influx_endpoint.as_deref() == Some("http://influx:8086"),
            "influx_endpoint",
        ),
        (args.influx_org.as_deref() == Some("acme"), "influx_org"),
        (args.influx_bucket.as_deref() == Some("metrics"), "influx_bucket"),
        (args.influx_token.as_deref() == Some("secret"), "influx_token"),
        (args.db_path.as_deref() == Some("/tmp/metrics.db"), "db_path"),
        (args.create_metrics_table, "create_metrics_table"),
        (args.app_version == "v50.1", "app_version"),
        (args.source.as_deref() == Some("prod"), "source"),
        (args.sink_timeout == Duration::from_millis(500), "sink_timeout"),
        (args.read_timeout == Duration::from_secs(30), "read_timeout"),
    ];
    for (ok, name) in checks {
        if !ok {
            return Err(format!("Unexpected {}", name));
        }
    }
    Ok(())
}

#[test]
fn serve_postgres_and_read_timeout_flags() -> Result<(), String> {
    let cli = parse_test_args([
        "logrelay",
        "serve",
        "--postgres-url",
        "postgres://relay@db:5432/metrics",
        "--read-timeout",
        "5s",
    ])?;
    let Command::Serve(args) = cli.command else {
        return Err("Expected serve command".to_owned());
    };
    if args.postgres_url.as_deref() != Some("postgres://relay@db:5432/metrics") {
        return Err(format!("Unexpected postgres_url: {:?}", args.postgres_url));
    }
    if args.read_timeout != Duration::from_secs(5) {
        return Err("Unexpected read_timeout".to_owned());
    }
    if std::env::var_os("CREATE_METRICS_TABLE").is_none() && args.create_metrics_table {
        return Err("create_metrics_table should default to off".to_owned());
    }
    Ok(())
}

#[test]
fn metrics_table_flag_needs_exact_true() -> Result<(), String> {
    let cmd = clap::Command::new("logrelay");
    let parser = parse_strict_flag();
    let cases = [
        ("true", true),
        ("false", false),
        ("1", false),
        ("yes", false),
        ("TRUE", false),
        ("", false),
    ];
    for (input, expected) in cases {
        let parsed = parser
            .parse_ref(&cmd, None, OsStr::new(input))
            .map_err(|err| format!("{}: {}", input, err))?;
        if parsed != expected {
            return Err(format!("Unexpected flag value for {:?}: {}", input, parsed));
        }
    }
    Ok(())
}

#[test]
fn load_flags() -> Result<(), String> {
    let cli = parse_test_args([
        "logrelay",
        "--verbose",
        "load",
        "--host",
        "http://metabase:3000",
        "--user",
        "admin@example.com",
        "--password",
        "pw",
        "--vus",
        "4",
        "--iterations",
        "3",
        "--duration",
        "2m",
        "--think-time",
        "250ms",
        "--dashboard-id",
        "12",
    ])?;
    if !cli.verbose {
        return Err("Expected global --verbose before subcommand".to_owned());
    }
    let Command::Load(args) = cli.command else {
        return Err("Expected load command".to_owned());
    };

    if args.host.as_deref() != Some("http://metabase:3000") {
        return Err("Unexpected host".to_owned());
    }
    if args.vus.get() != 4 {
        return Err("Unexpected vus".to_owned());
    }
    if args.iterations.map(PositiveU64::get) != Some(3) {
        return Err("Unexpected iterations".to_owned());
    }
    if args.duration != Some(Duration::from_secs(120)) {
        return Err("Unexpected duration".to_owned());
    }
    if args.think_time != Duration::from_millis(250) {
        return Err("Unexpected think_time".to_owned());
    }
    if args.dashboard_id != 12 {
        return Err("Unexpected dashboard_id".to_owned());
    }
    if args.dashboard_param != DEFAULT_DASHBOARD_PARAM {
        return Err("Unexpected dashboard_param".to_owned());
    }
    Ok(())
}

#[test]
fn load_rejects_zero_vus() {
    assert!(parse_test_args(["logrelay", "load", "--vus", "0"]).is_err());
}

#[test]
fn subcommand_is_required() {
    assert!(parse_test_args(["logrelay"]).is_err());
}

#[test]
fn parse_duration_units() -> Result<(), String> {
    let cases = [
        ("250ms", Duration::from_millis(250)),
        ("3", Duration::from_secs(3)),
        ("3s", Duration::from_secs(3)),
        ("2m", Duration::from_secs(120)),
        ("1h", Duration::from_secs(3600)),
    ];
    for (input, expected) in cases {
        let parsed = parse_duration(input).map_err(|err| format!("{}: {}", input, err))?;
        if parsed != expected {
            return Err(format!("Unexpected duration for {}", input));
        }
    }
    for input in ["", "ms", "0", "5d", "0ms"] {
        if parse_duration(input).is_ok() {
            return Err(format!("Expected '{}' to be rejected", input));
        }
    }
    Ok(())
}
