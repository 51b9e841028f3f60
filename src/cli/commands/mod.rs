pub mod hash;
pub mod logging;
pub mod server;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    ColorChoice, Command,
};

pub const CMD_SERVER: &str = "server";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("dashgate")
        .about("Dashboard front door with server-side sessions")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand(Command::new(CMD_SERVER).about("Serve the dashboard (default)"))
        .subcommand(hash::subcommand());

    let command = server::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn without_env<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        temp_env::with_vars(
            [
                ("DASHGATE_CONFIG", None::<&str>),
                ("DASHGATE_PORT", None::<&str>),
                ("DASHGATE_LOG_LEVEL", None::<&str>),
                ("DASHGATE_PASSWORD", None::<&str>),
            ],
            f,
        )
    }

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "dashgate");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Dashboard front door with server-side sessions".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_defaults() {
        without_env(|| {
            let matches = new().get_matches_from(vec!["dashgate"]);
            let paths: Vec<PathBuf> = matches
                .get_many::<PathBuf>(server::ARG_CONFIG)
                .unwrap()
                .cloned()
                .collect();
            assert_eq!(paths, vec![PathBuf::from(server::DEFAULT_CONFIG)]);
            assert_eq!(matches.get_one::<u16>(server::ARG_PORT), None);
            assert_eq!(matches.subcommand_name(), None);
        });
    }

    #[test]
    fn test_check_config_and_port() {
        without_env(|| {
            let matches = new().get_matches_from(vec![
                "dashgate",
                "--config",
                "/etc/dashgate.yml",
                "-c",
                "local.yml",
                "--port",
                "9090",
            ]);
            let paths: Vec<PathBuf> = matches
                .get_many::<PathBuf>(server::ARG_CONFIG)
                .unwrap()
                .cloned()
                .collect();
            assert_eq!(
                paths,
                vec![PathBuf::from("/etc/dashgate.yml"), PathBuf::from("local.yml")]
            );
            assert_eq!(matches.get_one::<u16>(server::ARG_PORT).copied(), Some(9090));
        });
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("DASHGATE_CONFIG", Some("/etc/a.yml,/etc/b.yml")),
                ("DASHGATE_PORT", Some("443")),
                ("DASHGATE_LOG_LEVEL", Some("info")),
            ],
            || {
                let matches = new().get_matches_from(vec!["dashgate"]);
                assert_eq!(
                    matches
                        .get_many::<PathBuf>(server::ARG_CONFIG)
                        .map(Iterator::count),
                    Some(2)
                );
                assert_eq!(matches.get_one::<u16>(server::ARG_PORT).copied(), Some(443));
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    Some(2)
                );
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars([("DASHGATE_LOG_LEVEL", Some(level))], || {
                let matches = new().get_matches_from(vec!["dashgate"]);
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            without_env(|| {
                let mut args = vec!["dashgate".to_string()];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    args.push(format!("-{}", "v".repeat(index)));
                }

                let matches = new().get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_invalid_port_fails() {
        without_env(|| {
            let result = new().try_get_matches_from(vec!["dashgate", "--port", "http"]);
            assert_eq!(
                result.map_err(|e| e.kind()),
                Err(clap::error::ErrorKind::ValueValidation)
            );
        });
    }

    #[test]
    fn test_hash_password_subcommand() {
        without_env(|| {
            let matches = new().get_matches_from(vec!["dashgate", "hash-password", "s3cret"]);
            let (name, sub) = matches.subcommand().unwrap();
            assert_eq!(name, hash::CMD_HASH_PASSWORD);
            assert_eq!(hash::password(sub), Some("s3cret".to_string()));
        });
    }
}
