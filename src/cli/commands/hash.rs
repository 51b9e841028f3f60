use clap::{Arg, Command};

pub const CMD_HASH_PASSWORD: &str = "hash-password";
pub const ARG_PASSWORD: &str = "password";

#[must_use]
pub fn subcommand() -> Command {
    Command::new(CMD_HASH_PASSWORD)
        .about("Print an argon2 hash for the `pass` field of a user")
        .arg(
            Arg::new(ARG_PASSWORD)
                .help("Password to hash; read from stdin when omitted")
                .env("DASHGATE_PASSWORD")
                .hide_env_values(true),
        )
}

#[must_use]
pub fn password(matches: &clap::ArgMatches) -> Option<String> {
    matches.get_one::<String>(ARG_PASSWORD).cloned()
}
