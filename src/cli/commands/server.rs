use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;

pub const ARG_CONFIG: &str = "config";
pub const ARG_PORT: &str = "port";

pub const DEFAULT_CONFIG: &str = "config.yml";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_CONFIG)
                .short('c')
                .long("config")
                .help("Configuration file; repeat or separate with commas to try several, the first existing one wins")
                .env("DASHGATE_CONFIG")
                .default_value(DEFAULT_CONFIG)
                .value_delimiter(',')
                .action(ArgAction::Append)
                .global(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long("port")
                .help("Port to listen on, overrides app.port from the configuration")
                .env("DASHGATE_PORT")
                .global(true)
                .value_parser(clap::value_parser!(u16)),
        )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub config: Vec<PathBuf>,
    pub port: Option<u16>,
}

impl Options {
    /// Extract server options from the parsed arguments.
    ///
    /// # Errors
    /// Returns an error if no configuration path was supplied.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let config: Vec<PathBuf> = matches
            .get_many::<PathBuf>(ARG_CONFIG)
            .map(|paths| paths.cloned().collect())
            .unwrap_or_default();

        if config.is_empty() {
            anyhow::bail!("missing required argument: --{ARG_CONFIG}");
        }

        Ok(Self {
            config,
            port: matches.get_one::<u16>(ARG_PORT).copied(),
        })
    }
}
