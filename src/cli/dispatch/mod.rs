//! Map parsed arguments to the action the binary runs.

use crate::cli::actions::{hash, server, Action};
use crate::cli::commands::{self, hash::CMD_HASH_PASSWORD, CMD_SERVER};
use anyhow::{bail, Result};

/// Map validated CLI matches to an action. No subcommand means `server`.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        None => server_action(matches),
        Some((CMD_SERVER, sub)) => server_action(sub),
        Some((CMD_HASH_PASSWORD, sub)) => Ok(Action::HashPassword(hash::Args {
            password: commands::hash::password(sub),
        })),
        Some((other, _)) => bail!("unknown command: {other}"),
    }
}

fn server_action(matches: &clap::ArgMatches) -> Result<Action> {
    let options = commands::server::Options::parse(matches)?;
    Ok(Action::Server(server::Args {
        config: options.config,
        port: options.port,
    }))
}
