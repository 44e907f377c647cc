//! Run configuration derived from the command line
//!
//! ```text
//! stepviz [--speed X] [--headless] [--repr-limit N] [--max-ops N] <file>
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::interpreter::engine::EngineConfig;

/// Playback speed multiplier used when `--speed` is absent
pub const DEFAULT_SPEED: f64 = 1.0;

/// Slowest and fastest playback speeds
pub const MIN_SPEED: f64 = 0.1;
pub const MAX_SPEED: f64 = 3.0;

/// Increment applied by the `+` / `-` keys
pub const SPEED_STEP: f64 = 0.1;

/// Delay between steps at speed 1.0
pub const DEFAULT_BASE_INTERVAL: Duration = Duration::from_secs(1);

/// Longest value representation shown before truncation with `...`
pub const DEFAULT_REPR_LIMIT: usize = 100;

/// Invalid command-line input
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("no input file provided")]
    MissingFile,

    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),

    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("option '{0}' requires a value")]
    MissingValue(String),

    #[error("invalid value '{value}' for '{option}'")]
    InvalidNumber { option: String, value: String },

    #[error("speed must be a positive finite number, got {0}")]
    InvalidSpeed(f64),

    #[error("'{0}' must be at least {1}")]
    TooSmall(String, u64),

    #[error("help requested")]
    HelpRequested,
}

/// Settings for one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Initial playback speed multiplier, already clamped
    pub speed: f64,

    /// Run every step without the TUI and print a summary
    pub headless: bool,

    /// Longest value representation shown in the variables pane
    pub repr_limit: usize,

    /// Delay between steps at speed 1.0
    pub base_interval: Duration,

    pub engine: EngineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            speed: DEFAULT_SPEED,
            headless: false,
            repr_limit: DEFAULT_REPR_LIMIT,
            base_interval: DEFAULT_BASE_INTERVAL,
            engine: EngineConfig::default(),
        }
    }
}

/// A parsed command line: the program to run plus its settings
#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    pub file: PathBuf,
    pub config: Config,
}

/// Validate a speed multiplier and clamp it to the supported range
pub fn clamp_speed(speed: f64) -> Result<f64, ConfigError> {
    if !speed.is_finite() || speed <= 0.0 {
        return Err(ConfigError::InvalidSpeed(speed));
    }
    Ok(speed.clamp(MIN_SPEED, MAX_SPEED))
}

fn parse_number<T: std::str::FromStr>(option: &str, value: Option<String>) -> Result<T, ConfigError> {
    let value = value.ok_or_else(|| ConfigError::MissingValue(option.to_string()))?;
    value.parse().map_err(|_| ConfigError::InvalidNumber {
        option: option.to_string(),
        value,
    })
}

impl Args {
    /// Parse arguments, excluding the program name
    pub fn parse<I>(args: I) -> Result<Args, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Config::default();
        let mut file = None;
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => return Err(ConfigError::HelpRequested),
                "--headless" => config.headless = true,
                "--speed" => config.speed = clamp_speed(parse_number(&arg, args.next())?)?,
                "--repr-limit" => {
                    let limit: usize = parse_number(&arg, args.next())?;
                    if limit < 4 {
                        return Err(ConfigError::TooSmall(arg, 4));
                    }
                    config.repr_limit = limit;
                }
                "--max-ops" => {
                    let max: u64 = parse_number(&arg, args.next())?;
                    if max == 0 {
                        return Err(ConfigError::TooSmall(arg, 1));
                    }
                    config.engine.max_operations = max;
                }
                _ if arg.starts_with("--") => {
                    return Err(ConfigError::UnknownOption(arg));
                }
                _ if file.is_none() => file = Some(PathBuf::from(arg)),
                _ => return Err(ConfigError::UnexpectedArgument(arg)),
            }
        }

        Ok(Args {
            file: file.ok_or(ConfigError::MissingFile)?,
            config,
        })
    }
}

/// Usage text for `--help` and argument errors
pub fn usage(program_name: &str) -> String {
    format!(
        "Usage: {name} [OPTIONS] <file.py>\n\
         \n\
         Options:\n\
         \x20 --speed X        playback speed multiplier ({min}-{max}, default {speed})\n\
         \x20 --headless       run every step and print a summary instead of the TUI\n\
         \x20 --repr-limit N   truncate value representations to N characters (default {repr})\n\
         \x20 --max-ops N      operation budget per step (default {ops})\n\
         \x20 -h, --help       show this message\n\
         \n\
         Logging: set STEPVIZ_LOG (e.g. stepviz=debug); output goes to STEPVIZ_LOG_FILE\n\
         (default stepviz.log).",
        name = program_name,
        min = MIN_SPEED,
        max = MAX_SPEED,
        speed = DEFAULT_SPEED,
        repr = DEFAULT_REPR_LIMIT,
        ops = EngineConfig::default().max_operations,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ConfigError> {
        Args::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["prog.py"]).unwrap();
        assert_eq!(args.file, PathBuf::from("prog.py"));
        assert_eq!(args.config, Config::default());
    }

    #[test]
    fn test_all_options() {
        let args = parse(&["--speed", "2.5", "--headless", "--repr-limit", "40", "--max-ops", "500", "p.py"])
            .unwrap();
        assert_eq!(args.config.speed, 2.5);
        assert!(args.config.headless);
        assert_eq!(args.config.repr_limit, 40);
        assert_eq!(args.config.engine.max_operations, 500);
    }

    #[test]
    fn test_speed_is_clamped() {
        assert_eq!(parse(&["--speed", "10", "p.py"]).unwrap().config.speed, MAX_SPEED);
        assert_eq!(parse(&["--speed", "0.01", "p.py"]).unwrap().config.speed, MIN_SPEED);
        assert_eq!(
            parse(&["--speed", "-1", "p.py"]),
            Err(ConfigError::InvalidSpeed(-1.0))
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse(&[]), Err(ConfigError::MissingFile));
        assert_eq!(
            parse(&["--speed"]),
            Err(ConfigError::MissingValue("--speed".to_string()))
        );
        assert_eq!(
            parse(&["--max-ops", "lots", "p.py"]),
            Err(ConfigError::InvalidNumber {
                option: "--max-ops".to_string(),
                value: "lots".to_string()
            })
        );
        assert_eq!(
            parse(&["--verbose", "p.py"]),
            Err(ConfigError::UnknownOption("--verbose".to_string()))
        );
        assert_eq!(
            parse(&["a.py", "b.py"]),
            Err(ConfigError::UnexpectedArgument("b.py".to_string()))
        );
    }
}
