use std::path::PathBuf;

use thiserror::Error;

/// Validated process environment.
///
/// Parsed once at startup; everything downstream receives these values
/// already checked, so the scanner never reads the environment itself.
#[derive(Debug, Clone)]
pub struct Env {
    /// Root directory under which all scanning occurs.
    pub code_base_path: PathBuf,
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Fatal,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl std::str::FromStr for LogLevel {
    type Err = EnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogLevel::parse(s).ok_or_else(|| EnvError::InvalidLogLevel(s.to_string()))
    }
}

impl LogLevel {
    fn parse(text: &str) -> Option<Self> {
        match text {
            "fatal" => Some(LogLevel::Fatal),
            "error" => Some(LogLevel::Error),
            "warn" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    /// The equivalent `tracing` filter directive. `tracing` has no `fatal`
    /// level, so `fatal` maps to `error`.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Fatal | LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    #[error("CODE_BASE_PATH must be set to the directory containing your projects")]
    MissingRoot,

    #[error("CODE_BASE_PATH must not be empty")]
    EmptyRoot,

    #[error("LOG_LEVEL must be one of fatal, error, warn, info, debug, trace (got `{0}`)")]
    InvalidLogLevel(String),
}

impl Env {
    /// Read and validate the environment, failing fast on bad values.
    pub fn from_env() -> Result<Self, EnvError> {
        Self::from_vars(
            std::env::var("CODE_BASE_PATH").ok().as_deref(),
            std::env::var("LOG_LEVEL").ok().as_deref(),
        )
    }

    fn from_vars(code_base_path: Option<&str>, log_level: Option<&str>) -> Result<Self, EnvError> {
        let root = code_base_path.ok_or(EnvError::MissingRoot)?;
        if root.is_empty() {
            return Err(EnvError::EmptyRoot);
        }

        let log_level = match log_level {
            None | Some("") => LogLevel::default(),
            Some(text) => {
                LogLevel::parse(text).ok_or_else(|| EnvError::InvalidLogLevel(text.to_string()))?
            }
        };

        Ok(Env {
            code_base_path: PathBuf::from(root),
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_a_root() {
        assert_eq!(Env::from_vars(None, None).unwrap_err(), EnvError::MissingRoot);
        assert_eq!(Env::from_vars(Some(""), None).unwrap_err(), EnvError::EmptyRoot);
    }

    #[test]
    fn defaults_log_level_to_info() {
        let env = Env::from_vars(Some("/srv/code"), None).unwrap();
        assert_eq!(env.log_level, LogLevel::Info);
        assert_eq!(env.code_base_path, PathBuf::from("/srv/code"));
    }

    #[test]
    fn rejects_unknown_log_levels() {
        assert_eq!(
            Env::from_vars(Some("/srv/code"), Some("verbose")).unwrap_err(),
            EnvError::InvalidLogLevel("verbose".to_string())
        );
        let env = Env::from_vars(Some("/srv/code"), Some("trace")).unwrap();
        assert_eq!(env.log_level.as_directive(), "trace");
    }

    #[test]
    fn fatal_maps_to_error_directive() {
        let env = Env::from_vars(Some("/srv/code"), Some("fatal")).unwrap();
        assert_eq!(env.log_level.as_directive(), "error");
    }
}
