use clap::ArgMatches;

use crate::args::{Cli, Command, LoadArgs, ServeArgs};
use crate::config::types::ConfigFile;
use crate::config::{apply_load_config, apply_serve_config, load_config};
use crate::error::AppResult;
use crate::loadgen::LoadPlan;
use crate::sinks::SinksConfig;

use super::types::{RunPlan, ServePlan};

pub(crate) fn build_plan(cli: Cli, matches: &ArgMatches) -> AppResult<RunPlan> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Serve(args) => {
            let sub = matches.subcommand_matches("serve").unwrap_or(matches);
            let args = resolve_serve(args, sub, config.as_ref())?;
            Ok(RunPlan::Serve(ServePlan {
                sinks: SinksConfig::from_args(&args)?,
                listen: args.listen,
                version: args.app_version,
                source: args.source.filter(|source| !source.trim().is_empty()),
                read_timeout: args.read_timeout,
            }))
        }
        Command::Load(args) => {
            let sub = matches.subcommand_matches("load").unwrap_or(matches);
            let args = resolve_load(args, sub, config.as_ref())?;
            Ok(RunPlan::Load(LoadPlan::from_args(&args)?))
        }
    }
}

fn resolve_serve(
    mut args: ServeArgs,
    matches: &ArgMatches,
    config: Option<&ConfigFile>,
) -> AppResult<ServeArgs> {
    if let Some(serve) = config.and_then(|config| config.serve.as_ref()) {
        apply_serve_config(&mut args, matches, serve)?;
    }
    Ok(args)
}

fn resolve_load(
    mut args: LoadArgs,
    matches: &ArgMatches,
    config: Option<&ConfigFile>,
) -> AppResult<LoadArgs> {
    if let Some(load) = config.and_then(|config| config.load.as_ref()) {
        apply_load_config(&mut args, matches, load)?;
    }
    Ok(args)
}
