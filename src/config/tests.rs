use super::{
    apply_load_config, apply_serve_config, load_config_file,
    types::{DbConfig, DurationValue, LoadConfig, ServeConfig},
};
use clap::{CommandFactory, FromArgMatches};
use std::time::Duration;
use tempfile::tempdir;

use crate::args::{Cli, Command, LoadArgs, ServeArgs};

fn serve_matches(argv: &[&str]) -> Result<(ServeArgs, clap::ArgMatches), String> {
    let matches = Cli::command()
        .try_get_matches_from(argv)
        .map_err(|err| format!("parse failed: {}", err))?;
    let cli = Cli::from_arg_matches(&matches).map_err(|err| format!("from matches: {}", err))?;
    let Command::Serve(args) = cli.command else {
        return Err("Expected serve command".to_owned());
    };
    let Some(("serve", sub)) = matches.subcommand() else {
        return Err("Missing serve matches".to_owned());
    };
    Ok((args, sub.clone()))
}

fn load_matches(argv: &[&str]) -> Result<(LoadArgs, clap::ArgMatches), String> {
    let matches = Cli::command()
        .try_get_matches_from(argv)
        .map_err(|err| format!("parse failed: {}", err))?;
    let cli = Cli::from_arg_matches(&matches).map_err(|err| format!("from matches: {}", err))?;
    let Command::Load(args) = cli.command else {
        return Err("Expected load command".to_owned());
    };
    let Some(("load", sub)) = matches.subcommand() else {
        return Err("Missing load matches".to_owned());
    };
    Ok((args, sub.clone()))
}

#[test]
fn parse_toml_config_sections() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("logrelay.toml");
    let content = r#"
[serve]
listen = "127.0.0.1:4000"
loki_url = "http://loki:3100/loki/api/v1/push"
version = "v50.2"
sink_timeout = "2s"

[serve.influx]
endpoint = "http://influx:8086"
org = "acme"
bucket = "metrics"
token = "secret"

[serve.db]
path = "metrics.db"
postgres_url = "postgres://relay@db:5432/metrics"
create_metrics_table = true

[load]
host = "http://metabase:3000"
vus = 5
think_time = "500ms"
duration = 30
"#;
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;

    let config = load_config_file(&path).map_err(|err| err.to_string())?;
    let Some(serve) = config.serve else {
        return Err("Expected serve section".to_owned());
    };
    if serve.app_version.as_deref() != Some("v50.2") {
        return Err("Expected version alias to populate app_version".to_owned());
    }
    if serve.sink_timeout != Some(DurationValue::Text("2s".to_owned())) {
        return Err("Unexpected sink_timeout".to_owned());
    }
    let influx = serve.influx.ok_or("Expected influx table")?;
    if influx.bucket.as_deref() != Some("metrics") {
        return Err("Unexpected bucket".to_owned());
    }
    let db = serve.db.ok_or("Expected db table")?;
    if db.postgres_url.as_deref() != Some("postgres://relay@db:5432/metrics") {
        return Err("Unexpected postgres_url".to_owned());
    }
    if db.create_metrics_table != Some(true) {
        return Err("Unexpected create_metrics_table".to_owned());
    }

    let load = config.load.ok_or("Expected load section")?;
    if load.vus != Some(5) {
        return Err("Unexpected vus".to_owned());
    }
    if load.duration != Some(DurationValue::Seconds(30)) {
        return Err("Unexpected duration".to_owned());
    }
    Ok(())
}

#[test]
fn parse_json_config_sections() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("logrelay.json");
    let content = r#"{
  "serve": { "loki_host": "http://loki:3100/loki/api/v1/push", "source": "prod" },
  "load": { "user": "admin@example.com", "iterations": 3 }
}"#;
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;

    let config = load_config_file(&path).map_err(|err| err.to_string())?;
    let serve = config.serve.ok_or("Expected serve section")?;
    if serve.loki_url.as_deref() != Some("http://loki:3100/loki/api/v1/push") {
        return Err("Expected loki_host alias".to_owned());
    }
    let load = config.load.ok_or("Expected load section")?;
    if load.iterations != Some(3) {
        return Err("Unexpected iterations".to_owned());
    }
    Ok(())
}

#[test]
fn rejects_unknown_extension() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("logrelay.yaml");
    std::fs::write(&path, "serve: {}").map_err(|err| format!("write failed: {}", err))?;
    if load_config_file(&path).is_ok() {
        return Err("Expected yaml to be rejected".to_owned());
    }
    Ok(())
}

#[test]
fn serve_config_fills_unset_values() -> Result<(), String> {
    let (mut args, matches) = serve_matches(&["logrelay", "serve", "--listen", "127.0.0.1:9"])?;
    let config = ServeConfig {
        listen: Some("0.0.0.0:1".to_owned()),
        service_name: Some("analytics".to_owned()),
        sink_timeout: Some(DurationValue::Seconds(3)),
        ..ServeConfig::default()
    };

    apply_serve_config(&mut args, &matches, &config).map_err(|err| err.to_string())?;

    if args.listen != "127.0.0.1:9" {
        return Err("CLI listen should win over config".to_owned());
    }
    if args.service_name != "analytics" {
        return Err("Expected service_name from config".to_owned());
    }
    if args.sink_timeout != Duration::from_secs(3) {
        return Err("Expected sink_timeout from config".to_owned());
    }
    Ok(())
}

#[test]
fn serve_config_fills_postgres_and_read_timeout() -> Result<(), String> {
    let (mut args, matches) = serve_matches(&["logrelay", "serve"])?;
    let config = ServeConfig {
        read_timeout: Some(DurationValue::Text("750ms".to_owned())),
        db: Some(DbConfig {
            postgres_url: Some("postgres://relay@db/metrics".to_owned()),
            ..DbConfig::default()
        }),
        ..ServeConfig::default()
    };

    apply_serve_config(&mut args, &matches, &config).map_err(|err| err.to_string())?;

    if std::env::var_os("POSTGRES_CONN_STRING").is_none()
        && args.postgres_url.as_deref() != Some("postgres://relay@db/metrics")
    {
        return Err(format!("Unexpected postgres_url: {:?}", args.postgres_url));
    }
    if args.read_timeout != Duration::from_millis(750) {
        return Err("Expected read_timeout from config".to_owned());
    }
    Ok(())
}

#[test]
fn serve_config_rejects_zero_timeout() -> Result<(), String> {
    let (mut args, matches) = serve_matches(&["logrelay", "serve"])?;
    let config = ServeConfig {
        sink_timeout: Some(DurationValue::Seconds(0)),
        ..ServeConfig::default()
    };
    if apply_serve_config(&mut args, &matches, &config).is_ok() {
        return Err("Expected zero timeout to be rejected".to_owned());
    }
    Ok(())
}

#[test]
fn load_config_fills_unset_values() -> Result<(), String> {
    let (mut args, matches) = load_matches(&["logrelay", "load", "--vus", "2"])?;
    let config = LoadConfig {
        vus: Some(8),
        iterations: Some(4),
        think_time: Some(DurationValue::Text("100ms".to_owned())),
        dashboard_id: Some(21),
        ..LoadConfig::default()
    };

    apply_load_config(&mut args, &matches, &config).map_err(|err| err.to_string())?;

    if args.vus.get() != 2 {
        return Err("CLI vus should win over config".to_owned());
    }
    if args.iterations.map(crate::args::PositiveU64::get) != Some(4) {
        return Err("Expected iterations from config".to_owned());
    }
    if args.think_time != Duration::from_millis(100) {
        return Err("Expected think_time from config".to_owned());
    }
    if args.dashboard_id != 21 {
        return Err("Expected dashboard_id from config".to_owned());
    }
    Ok(())
}

#[test]
fn load_config_rejects_zero_vus() -> Result<(), String> {
    let (mut args, matches) = load_matches(&["logrelay", "load"])?;
    let config = LoadConfig {
        vus: Some(0),
        ..LoadConfig::default()
    };
    if apply_load_config(&mut args, &matches, &config).is_ok() {
        return Err("Expected zero vus to be rejected".to_owned());
    }
    Ok(())
}
