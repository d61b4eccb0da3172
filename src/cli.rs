//! Command-line interface for session-gate.
//!
//! Uses lexopt to keep argument parsing small.

use std::ffi::OsString;
use std::io::BufRead;
use std::net::IpAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Command-line arguments.
///
/// Options left unset fall through to the environment, the config file and
/// then the built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Host address to bind to.
    pub host: Option<IpAddr>,
    /// Port to listen on.
    pub port: Option<u16>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Key used to sign session tokens.
    pub signing_key: Option<String>,
    /// Redis connection URL.
    pub redis_url: Option<String>,
    /// Keep sessions in process memory instead of Redis.
    pub memory_store: bool,
    /// Session lifetime in seconds.
    pub session_secs: Option<u64>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Hash a password read from stdin for a user entry, then exit.
    pub hash_password: bool,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('H') | Long("host") => {
                let value: String = parser.value()?.parse()?;
                let host = value
                    .parse()
                    .map_err(|_| ArgsError::InvalidValue("host", value))?;
                result.host = Some(host);
            }
            Short('p') | Long("port") => {
                let value: String = parser.value()?.parse()?;
                let port = value
                    .parse()
                    .map_err(|_| ArgsError::InvalidValue("port", value))?;
                result.port = Some(port);
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('k') | Long("signing-key") => {
                result.signing_key = Some(parser.value()?.parse()?);
            }
            Short('r') | Long("redis-url") => {
                result.redis_url = Some(parser.value()?.parse()?);
            }
            Long("memory-store") => {
                result.memory_store = true;
            }
            Short('d') | Long("session-secs") => {
                let value: String = parser.value()?.parse()?;
                let secs = value
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or(ArgsError::InvalidValue("session-secs", value))?;
                result.session_secs = Some(secs);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Long("hash-password") => {
                result.hash_password = true;
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"session-gate {version}
Signed-token session authentication service

USAGE:
    session-gate [OPTIONS]

OPTIONS:
    -H, --host <ADDR>          Host address to bind [default: 127.0.0.1]
    -p, --port <PORT>          Port to listen on [default: 3000]
    -c, --config <FILE>        Path to configuration file (JSON)
    -k, --signing-key <KEY>    Key used to sign session tokens (required)
    -r, --redis-url <URL>      Redis URL [default: redis://127.0.0.1:6379]
        --memory-store         Keep sessions in process memory
    -d, --session-secs <SECS>  Session lifetime in seconds [default: 3600]
    -l, --log-level <LVL>      Log level (error, warn, info, debug, trace)
        --hash-password        Read a password from stdin, print its argon2
                               hash for a user entry and exit
    -h, --help                 Print help
    -V, --version              Print version

ENVIRONMENT VARIABLES:
    SESSION_GATE_HOST          Host address (overrides config)
    SESSION_GATE_PORT          Port number (overrides config)
    SESSION_GATE_SIGNING_KEY   Signing key (overrides config)
    SESSION_GATE_REDIS_URL     Redis URL (overrides config)
    SESSION_GATE_STORE         Store backend: redis or memory
    SESSION_GATE_SESSION_SECS  Session lifetime in seconds
    SESSION_GATE_LOG_LEVEL     Log level (overrides config)
    RUST_LOG                   Alternative log level setting

EXAMPLES:
    # Start against a local Redis
    session-gate -k my-signing-key

    # Start on all interfaces with a config file
    session-gate -H 0.0.0.0 -p 8080 -c /etc/session-gate/config.json

    # Development mode without Redis
    session-gate -k dev-key --memory-store

    # Hash a password for the users section of the config file
    read -rs PW && printf '%s\n' "$PW" | session-gate --hash-password
"#
    );
}

/// Read one password line for `--hash-password`.
///
/// Only the line terminator is stripped; an empty line is rejected.
pub fn read_password<R: BufRead>(mut input: R) -> std::io::Result<String> {
    let mut line = String::new();
    input.read_line(&mut line)?;

    let password = line.trim_end_matches(['\n', '\r']);
    if password.is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "no password given on stdin",
        ));
    }
    Ok(password.to_string())
}

/// Print version.
pub fn print_version() {
    println!("session-gate {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Error, Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    #[error("{0}")]
    Lexopt(#[from] lexopt::Error),
    /// Invalid argument value.
    #[error("invalid value for --{0}: '{1}'")]
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    #[error("unexpected argument: '{0}'")]
    UnexpectedArgument(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(args: &[&str]) -> Vec<OsString> {
        std::iter::once("session-gate")
            .chain(args.iter().copied())
            .map(OsString::from)
            .collect()
    }

    #[test]
    fn test_default_args() {
        let result = parse_args_from(args(&[])).unwrap();
        assert!(result.host.is_none());
        assert!(result.port.is_none());
        assert!(result.signing_key.is_none());
        assert!(!result.memory_store);
    }

    #[test]
    fn test_host_port() {
        let result = parse_args_from(args(&["-H", "0.0.0.0", "-p", "8080"])).unwrap();
        assert_eq!(result.host.unwrap().to_string(), "0.0.0.0");
        assert_eq!(result.port, Some(8080));
    }

    #[test]
    fn test_long_options() {
        let result =
            parse_args_from(args(&["--host", "192.168.1.1", "--port", "9000"])).unwrap();
        assert_eq!(result.host.unwrap().to_string(), "192.168.1.1");
        assert_eq!(result.port, Some(9000));
    }

    #[test]
    fn test_signing_key() {
        let result = parse_args_from(args(&["-k", "topsecret"])).unwrap();
        assert_eq!(result.signing_key.as_deref(), Some("topsecret"));

        let result = parse_args_from(args(&["--signing-key", "other"])).unwrap();
        assert_eq!(result.signing_key.as_deref(), Some("other"));
    }

    #[test]
    fn test_store_options() {
        let result = parse_args_from(args(&["-r", "redis://cache:6379"])).unwrap();
        assert_eq!(result.redis_url.as_deref(), Some("redis://cache:6379"));

        let result = parse_args_from(args(&["--memory-store"])).unwrap();
        assert!(result.memory_store);
    }

    #[test]
    fn test_session_secs() {
        let result = parse_args_from(args(&["-d", "600"])).unwrap();
        assert_eq!(result.session_secs, Some(600));
    }

    #[test]
    fn test_zero_session_secs_rejected() {
        let result = parse_args_from(args(&["--session-secs", "0"]));
        assert!(matches!(
            result,
            Err(ArgsError::InvalidValue("session-secs", _))
        ));
    }

    #[test]
    fn test_config_file() {
        let result = parse_args_from(args(&["-c", "/etc/config.json"])).unwrap();
        assert_eq!(result.config, Some(PathBuf::from("/etc/config.json")));
    }

    #[test]
    fn test_hash_password_takes_no_value() {
        let result = parse_args_from(args(&["--hash-password"])).unwrap();
        assert!(result.hash_password);

        // A password on the command line is rejected
        let result = parse_args_from(args(&["--hash-password", "hunter2"]));
        assert!(matches!(result, Err(ArgsError::UnexpectedArgument(_))));
    }

    #[test]
    fn test_read_password() {
        let password = read_password(&b"  correct horse \r\nignored\n"[..]).unwrap();
        assert_eq!(password, "  correct horse ");

        let password = read_password(&b"no-newline"[..]).unwrap();
        assert_eq!(password, "no-newline");
    }

    #[test]
    fn test_read_password_empty() {
        assert!(read_password(&b"\n"[..]).is_err());
        assert!(read_password(&b""[..]).is_err());
    }

    #[test]
    fn test_help_flag() {
        let result = parse_args_from(args(&["-h"])).unwrap();
        assert!(result.help);

        let result = parse_args_from(args(&["--help"])).unwrap();
        assert!(result.help);
    }

    #[test]
    fn test_version_flag() {
        let result = parse_args_from(args(&["-V"])).unwrap();
        assert!(result.version);

        let result = parse_args_from(args(&["--version"])).unwrap();
        assert!(result.version);
    }

    #[test]
    fn test_log_level() {
        let result = parse_args_from(args(&["-l", "debug"])).unwrap();
        assert_eq!(result.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_invalid_port() {
        let result = parse_args_from(args(&["-p", "invalid"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_host() {
        let result = parse_args_from(args(&["-H", "not-an-ip"]));
        assert!(matches!(result, Err(ArgsError::InvalidValue("host", _))));
    }

    #[test]
    fn test_unexpected_positional() {
        let result = parse_args_from(args(&["serve"]));
        assert!(matches!(result, Err(ArgsError::UnexpectedArgument(_))));
    }

    #[test]
    fn test_unknown_flag() {
        let result = parse_args_from(args(&["--no-auth"]));
        assert!(matches!(result, Err(ArgsError::Lexopt(_))));
    }

    #[test]
    fn test_combined_options() {
        let result = parse_args_from(args(&[
            "-H",
            "0.0.0.0",
            "-p",
            "8080",
            "-k",
            "secret",
            "-l",
            "debug",
            "--memory-store",
        ]))
        .unwrap();

        assert_eq!(result.host.unwrap().to_string(), "0.0.0.0");
        assert_eq!(result.port, Some(8080));
        assert_eq!(result.signing_key, Some("secret".to_string()));
        assert_eq!(result.log_level, Some("debug".to_string()));
        assert!(result.memory_store);
        assert!(result.redis_url.is_none());
    }
}
