//! Configuration loading helpers for the DenDen client.
//!
//! Configuration flags precede the subcommand. The helpers here split them
//! off so `ortho-config` only sees supported flags while clap parses the rest.

use std::ffi::{OsStr, OsString};

use denden_config::Config;

use crate::AppError;

/// CLI flags recognised by the configuration loader.
///
/// Keep in sync with the fields of `denden_config::Config`.
pub(crate) const CONFIG_CLI_FLAGS: &[&str] = &[
    "--daemon-socket",
    "--log-filter",
    "--log-format",
    "--max-workers",
    "--shutdown-grace-ms",
    "--request-timeout-secs",
    "--modules",
];

pub(crate) trait ConfigLoader {
    /// Loads configuration from the split-off configuration arguments.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_with_aliases(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Stop,
}

fn classify(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    if !text.starts_with("--") {
        return FlagAction::Stop;
    }
    let (flag, inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (text.as_ref(), false),
    };
    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !inline_value,
        }
    } else {
        FlagAction::Stop
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) command_arguments: Vec<OsString>,
}

/// Splits leading configuration flags from the command arguments.
///
/// Both halves keep the program name in first position.
pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let Some((program, rest)) = args.split_first() else {
        return ConfigArgumentSplit {
            config_arguments: Vec::new(),
            command_arguments: Vec::new(),
        };
    };

    let mut config_arguments = vec![program.clone()];
    let mut index = 0;
    while let Some(argument) = rest.get(index) {
        match classify(argument) {
            FlagAction::Include { needs_value } => {
                config_arguments.push(argument.clone());
                index += 1;
                if needs_value && let Some(value) = rest.get(index) {
                    config_arguments.push(value.clone());
                    index += 1;
                }
            }
            FlagAction::Stop => break,
        }
    }

    let mut command_arguments = vec![program.clone()];
    command_arguments.extend(rest.iter().skip(index).cloned());
    ConfigArgumentSplit {
        config_arguments,
        command_arguments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn os(values: &[&str]) -> Vec<OsString> {
        values.iter().map(OsString::from).collect()
    }

    #[rstest]
    #[case("--log-filter=debug", FlagAction::Include { needs_value: false })]
    #[case("--daemon-socket", FlagAction::Include { needs_value: true })]
    #[case("status", FlagAction::Stop)]
    #[case("--unknown", FlagAction::Stop)]
    fn classifies_arguments(#[case] argument: &str, #[case] expected: FlagAction) {
        assert_eq!(classify(OsStr::new(argument)), expected);
    }

    #[rstest]
    fn splits_flags_before_subcommand() {
        let split = split_config_arguments(&os(&[
            "denden",
            "--daemon-socket",
            "tcp://127.0.0.1:9800",
            "--request-timeout-secs=2",
            "send",
            "{}",
        ]));
        assert_eq!(
            split.config_arguments,
            os(&[
                "denden",
                "--daemon-socket",
                "tcp://127.0.0.1:9800",
                "--request-timeout-secs=2",
            ])
        );
        assert_eq!(split.command_arguments, os(&["denden", "send", "{}"]));
    }

    #[rstest]
    fn flags_after_subcommand_stay_with_command() {
        let split = split_config_arguments(&os(&["denden", "status", "--log-filter", "debug"]));
        assert_eq!(split.config_arguments, os(&["denden"]));
        assert_eq!(
            split.command_arguments,
            os(&["denden", "status", "--log-filter", "debug"])
        );
    }

    #[rstest]
    fn empty_arguments_split_to_nothing() {
        let split = split_config_arguments(&[]);
        assert!(split.config_arguments.is_empty());
        assert!(split.command_arguments.is_empty());
    }
}
