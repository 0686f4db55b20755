/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::anyhow;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint, value_parser};

use crate::config::RunOverrides;

pub const COMMAND_RUN: &str = "run";
pub const COMMAND_VALIDATE: &str = "validate";

const GLOBAL_ARG_VERBOSE: &str = "verbose";

const ARG_CONFIG: &str = "config";
const ARG_NO_THRESHOLDS: &str = "no-thresholds";
const ARG_THROW: &str = "throw";
const ARG_VUS: &str = "vus";
const ARG_DURATION: &str = "duration";
const ARG_ITERATIONS: &str = "iterations";
const ARG_EVALUATION_INTERVAL: &str = "evaluation-interval";
const ARG_NO_SUMMARY: &str = "no-summary";

pub fn add_global_args(app: Command) -> Command {
    app.arg(
        Arg::new(GLOBAL_ARG_VERBOSE)
            .help("Show verbose output")
            .action(ArgAction::Count)
            .short('v')
            .long(GLOBAL_ARG_VERBOSE)
            .global(true),
    )
}

pub fn verbose_level(args: &ArgMatches) -> u8 {
    args.get_count(GLOBAL_ARG_VERBOSE)
}

fn config_arg() -> Arg {
    Arg::new(ARG_CONFIG)
        .help("Run config file")
        .value_name("CONFIG FILE")
        .required(true)
        .num_args(1)
        .value_parser(value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn no_thresholds_arg() -> Arg {
    Arg::new(ARG_NO_THRESHOLDS)
        .help("Do not parse or evaluate thresholds")
        .action(ArgAction::SetTrue)
        .long(ARG_NO_THRESHOLDS)
}

pub fn run_command() -> Command {
    Command::new(COMMAND_RUN)
        .about("Run the load test described in the config file")
        .arg(config_arg())
        .arg(no_thresholds_arg())
        .arg(
            Arg::new(ARG_THROW)
                .help("Fail the run on invalid metric values instead of logging them")
                .action(ArgAction::SetTrue)
                .long(ARG_THROW),
        )
        .arg(
            Arg::new(ARG_VUS)
                .help("Number of VUs")
                .value_name("COUNT")
                .long(ARG_VUS)
                .num_args(1)
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new(ARG_DURATION)
                .help("Run duration")
                .value_name("DURATION")
                .long(ARG_DURATION)
                .short('d')
                .num_args(1),
        )
        .arg(
            Arg::new(ARG_ITERATIONS)
                .help("Total iterations shared by all VUs")
                .value_name("COUNT")
                .long(ARG_ITERATIONS)
                .short('i')
                .num_args(1)
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new(ARG_EVALUATION_INTERVAL)
                .help("Threshold evaluation interval")
                .value_name("DURATION")
                .long(ARG_EVALUATION_INTERVAL)
                .num_args(1),
        )
        .arg(
            Arg::new(ARG_NO_SUMMARY)
                .help("Do not print the end of run summary")
                .action(ArgAction::SetTrue)
                .long(ARG_NO_SUMMARY),
        )
}

pub fn validate_command() -> Command {
    Command::new(COMMAND_VALIDATE)
        .about("Check the config file and exit")
        .arg(config_arg())
        .arg(no_thresholds_arg())
}

pub struct RunArgs {
    pub config: PathBuf,
    pub overrides: RunOverrides,
    pub no_summary: bool,
}

fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    if let Ok(secs) = u64::from_str(s) {
        return Ok(Duration::from_secs(secs));
    }
    humanize_rs::duration::parse(s).map_err(|e| anyhow!("invalid duration {s}: {e}"))
}

fn get_duration(args: &ArgMatches, id: &str) -> anyhow::Result<Option<Duration>> {
    match args.get_one::<String>(id) {
        Some(s) => parse_duration(s)
            .map(Some)
            .map_err(|e| anyhow!("invalid {id} value: {e}")),
        None => Ok(None),
    }
}

pub fn parse_run_args(args: &ArgMatches) -> anyhow::Result<RunArgs> {
    let config = args
        .get_one::<PathBuf>(ARG_CONFIG)
        .cloned()
        .ok_or_else(|| anyhow!("no config file set"))?;

    let overrides = RunOverrides {
        vus: args.get_one::<usize>(ARG_VUS).copied(),
        duration: get_duration(args, ARG_DURATION)?,
        iterations: args.get_one::<usize>(ARG_ITERATIONS).copied(),
        evaluation_interval: get_duration(args, ARG_EVALUATION_INTERVAL)?,
        throw: args.get_flag(ARG_THROW),
        no_thresholds: args.get_flag(ARG_NO_THRESHOLDS),
    };

    Ok(RunArgs {
        config,
        overrides,
        no_summary: args.get_flag(ARG_NO_SUMMARY),
    })
}

pub fn parse_validate_args(args: &ArgMatches) -> anyhow::Result<RunArgs> {
    let config = args
        .get_one::<PathBuf>(ARG_CONFIG)
        .cloned()
        .ok_or_else(|| anyhow!("no config file set"))?;
    let overrides = RunOverrides {
        no_thresholds: args.get_flag(ARG_NO_THRESHOLDS),
        ..Default::default()
    };
    Ok(RunArgs {
        config,
        overrides,
        no_summary: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(argv: &[&str]) -> ArgMatches {
        add_global_args(Command::new("g3load"))
            .subcommand(run_command())
            .subcommand(validate_command())
            .try_get_matches_from(argv)
            .unwrap()
    }

    #[test]
    fn run_overrides() {
        let m = matches(&[
            "g3load",
            "run",
            "load.yaml",
            "--vus",
            "4",
            "-d",
            "1m30s",
            "--evaluation-interval",
            "5",
            "--throw",
            "-vv",
        ]);
        assert_eq!(verbose_level(&m), 2);
        let (_, sub) = m.subcommand().unwrap();
        let args = parse_run_args(sub).unwrap();
        assert_eq!(args.config, PathBuf::from("load.yaml"));
        assert_eq!(args.overrides.vus, Some(4));
        assert_eq!(args.overrides.duration, Some(Duration::from_secs(90)));
        assert_eq!(
            args.overrides.evaluation_interval,
            Some(Duration::from_secs(5))
        );
        assert!(args.overrides.throw);
        assert!(!args.overrides.no_thresholds);
        assert!(!args.no_summary);
    }

    #[test]
    fn validate() {
        let m = matches(&["g3load", "validate", "load.yaml", "--no-thresholds"]);
        let (_, sub) = m.subcommand().unwrap();
        let args = parse_validate_args(sub).unwrap();
        assert!(args.overrides.no_thresholds);
        assert!(args.overrides.vus.is_none());
    }

    #[test]
    fn invalid_duration() {
        let m = matches(&["g3load", "run", "load.yaml", "-d", "soon"]);
        let (_, sub) = m.subcommand().unwrap();
        assert!(parse_run_args(sub).is_err());
    }
}
