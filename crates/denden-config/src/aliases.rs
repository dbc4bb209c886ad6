//! Compatibility spellings for configuration values.
//!
//! Orchestrators export `DENDEN_ADDR` (a bare `host:port`) and
//! `DENDEN_TIMEOUT` (a duration such as `30s` or `1m30s`) to the agents they
//! spawn, and launch the server with `--addr`, `--load-module` and
//! `--verbose`. These are rewritten into the canonical flags before the
//! layered loader runs. Canonical flags and `DENDEN_*` variables win over
//! the aliases.

use std::ffi::OsString;
use std::time::Duration;

/// Environment variable holding a bare `host:port` server address.
pub const ADDR_ENV: &str = "DENDEN_ADDR";

/// Environment variable holding the client call timeout as a duration.
pub const TIMEOUT_ENV: &str = "DENDEN_TIMEOUT";

const SOCKET_FLAG: &str = "--daemon-socket";
const SOCKET_ENV: &str = "DENDEN_DAEMON_SOCKET";
const TIMEOUT_FLAG: &str = "--request-timeout-secs";
const TIMEOUT_SECS_ENV: &str = "DENDEN_REQUEST_TIMEOUT_SECS";

/// Rewrites alias flags and appends flags for alias environment variables.
///
/// `args` includes the program name in first position. `lookup` resolves
/// environment variables; an empty value counts as unset. A `DENDEN_TIMEOUT`
/// that does not parse is ignored and the configured timeout applies.
#[must_use]
pub fn resolve_aliases<F>(args: Vec<OsString>, lookup: F) -> Vec<OsString>
where
    F: Fn(&str) -> Option<String>,
{
    let mut resolved = rewrite_flags(args);
    let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());

    if !has_flag(&resolved, SOCKET_FLAG)
        && lookup(SOCKET_ENV).is_none()
        && let Some(addr) = lookup(ADDR_ENV)
    {
        resolved.push(SOCKET_FLAG.into());
        resolved.push(addr.into());
    }

    if !has_flag(&resolved, TIMEOUT_FLAG)
        && lookup(TIMEOUT_SECS_ENV).is_none()
        && let Some(timeout) = lookup(TIMEOUT_ENV).and_then(|raw| parse_duration(&raw))
    {
        resolved.push(TIMEOUT_FLAG.into());
        resolved.push(whole_seconds(timeout).to_string().into());
    }

    resolved
}

fn rewrite_flags(args: Vec<OsString>) -> Vec<OsString> {
    let mut rewritten = Vec::with_capacity(args.len());
    for argument in args {
        let text = argument.to_string_lossy();
        let replacement = match text.split_once('=') {
            Some(("--addr", value)) => Some(vec![format!("{SOCKET_FLAG}={value}")]),
            Some(("--load-module", value)) => Some(vec![format!("--modules={value}")]),
            _ => match text.as_ref() {
                "--addr" => Some(vec![SOCKET_FLAG.to_owned()]),
                "--load-module" => Some(vec!["--modules".to_owned()]),
                "--verbose" | "-v" => Some(vec!["--log-filter".to_owned(), "debug".to_owned()]),
                _ => None,
            },
        };
        match replacement {
            Some(parts) => rewritten.extend(parts.into_iter().map(OsString::from)),
            None => rewritten.push(argument),
        }
    }
    rewritten
}

fn has_flag(args: &[OsString], flag: &str) -> bool {
    args.iter().any(|argument| {
        let text = argument.to_string_lossy();
        text == flag
            || text
                .strip_prefix(flag)
                .is_some_and(|rest| rest.starts_with('='))
    })
}

/// Parses a duration written as one or more `<integer><unit>` groups.
///
/// Units are `h`, `m`, `s` and `ms`. A bare integer counts as seconds.
#[must_use]
pub fn parse_duration(input: &str) -> Option<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(seconds) = input.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let mut total = Duration::ZERO;
    let mut rest = input;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return None;
        }
        let value: u64 = rest[..digits].parse().ok()?;
        rest = &rest[digits..];
        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let part = match &rest[..unit_len] {
            "h" => Duration::from_secs(value.checked_mul(3_600)?),
            "m" => Duration::from_secs(value.checked_mul(60)?),
            "s" => Duration::from_secs(value),
            "ms" => Duration::from_millis(value),
            _ => return None,
        };
        total = total.checked_add(part)?;
        rest = &rest[unit_len..];
    }
    Some(total)
}

/// Rounds partial seconds up so short timeouts never collapse to zero.
fn whole_seconds(duration: Duration) -> u64 {
    let seconds = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        seconds.saturating_add(1)
    } else {
        seconds
    }
}
