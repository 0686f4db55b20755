/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, anyhow};
use clap::{Arg, ArgMatches, Command, value_parser};
use clap_complete::Shell;
use log::{info, warn};

use g3load::config::RunConfig;
use g3load::opts::{COMMAND_RUN, COMMAND_VALIDATE, RunArgs};
use g3load::run::{Run, RunError, RunErrorKind};

const COMMAND_VERSION: &str = "version";
const COMMAND_COMPLETION: &str = "completion";

const EXIT_THRESHOLDS_FAILED: u8 = 99;
const EXIT_INVALID_CONFIG: u8 = 104;
const EXIT_SCRIPT_EXCEPTION: u8 = 107;
const EXIT_SCRIPT_ABORTED: u8 = 108;

fn build_cli_args() -> Command {
    g3load::opts::add_global_args(Command::new(g3load::build::PKG_NAME))
        .subcommand_required(true)
        .subcommand(Command::new(COMMAND_VERSION).override_help("Show version"))
        .subcommand(
            Command::new(COMMAND_COMPLETION).arg(
                Arg::new("target")
                    .value_name("SHELL")
                    .required(true)
                    .num_args(1)
                    .value_parser(value_parser!(Shell)),
            ),
        )
        .subcommand(g3load::opts::run_command())
        .subcommand(g3load::opts::validate_command())
}

fn exit_code(kind: RunErrorKind) -> ExitCode {
    let code = match kind {
        RunErrorKind::ThresholdsFailed => EXIT_THRESHOLDS_FAILED,
        RunErrorKind::InvalidConfig => EXIT_INVALID_CONFIG,
        RunErrorKind::ScriptException => EXIT_SCRIPT_EXCEPTION,
        RunErrorKind::ScriptAborted => EXIT_SCRIPT_ABORTED,
    };
    ExitCode::from(code)
}

fn main() -> anyhow::Result<ExitCode> {
    let args = build_cli_args().get_matches();

    let (subcommand, sub_args) = args
        .subcommand()
        .ok_or_else(|| anyhow!("no subcommand found"))?;

    match subcommand {
        COMMAND_VERSION => {
            g3load::build::print_version();
            return Ok(ExitCode::SUCCESS);
        }
        COMMAND_COMPLETION => {
            generate_completion(sub_args);
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    let _log_guard = g3load::log::setup(g3load::opts::verbose_level(&args))
        .context("failed to setup logger")?;

    let r = match subcommand {
        COMMAND_RUN => g3load::opts::parse_run_args(sub_args).and_then(run),
        COMMAND_VALIDATE => g3load::opts::parse_validate_args(sub_args).and_then(validate),
        cmd => Err(anyhow!("invalid subcommand {cmd}")),
    };
    match r {
        Ok(code) => Ok(code),
        Err(e) => match RunError::classify(&e) {
            Some(kind) => {
                eprintln!("{e:?}");
                Ok(exit_code(kind))
            }
            None => Err(e),
        },
    }
}

fn load_config(args: &RunArgs) -> anyhow::Result<RunConfig> {
    RunConfig::load(&args.config).map_err(|e| RunError::invalid_config(e).into())
}

fn validate(args: RunArgs) -> anyhow::Result<ExitCode> {
    let config = load_config(&args)?;
    let run = Run::prepare(config, &args.overrides)?;

    let mut stdout = io::stdout().lock();
    write_validation(&run, &mut stdout).context("failed to write validation result")?;
    Ok(ExitCode::SUCCESS)
}

fn write_validation<W: Write>(run: &Run, w: &mut W) -> io::Result<()> {
    let registry = run.registry();
    writeln!(
        w,
        "config is valid, {} metrics and {} thresholds",
        registry.len(),
        run.thresholds().len()
    )?;
    for metric in registry.metrics() {
        writeln!(
            w,
            "  {} {} {}",
            metric.name(),
            metric.metric_type(),
            metric.value_type()
        )?;
    }
    w.flush()
}

fn run(args: RunArgs) -> anyhow::Result<ExitCode> {
    let config = load_config(&args)?;
    let run = Run::prepare(config, &args.overrides)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    let outcome = rt.block_on(async move {
        let control = run.control().clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupted, stopping the run");
                control.stop();
            }
        });
        run.execute().await
    })?;

    if !args.no_summary {
        outcome.summary().context("failed to write summary")?;
    }
    match outcome.exit_class() {
        Some(kind) => {
            warn!("run finished with failure: {kind}");
            Ok(exit_code(kind))
        }
        None => Ok(ExitCode::SUCCESS),
    }
}

fn generate_completion(args: &ArgMatches) {
    if let Some(target) = args.get_one::<Shell>("target") {
        let mut app = build_cli_args();
        let bin_name = app.get_name().to_string();
        clap_complete::generate(*target, &mut app, bin_name, &mut io::stdout());
    }
}
