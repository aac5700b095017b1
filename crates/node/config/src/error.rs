//! Configuration error types.

use std::path::PathBuf;

/// Errors that can occur when loading or parsing configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// The path that failed to read.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize configuration to TOML.
    #[error("failed to serialize config to TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Failed to write file.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Path.
        path: PathBuf,
        /// IO error.
        source: std::io::Error,
    },

    /// A value is out of range.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use std::io::{Error as IoError, ErrorKind};

    use super::*;

    #[test]
    fn test_read_error_display() {
        let err = ConfigError::Read {
            path: PathBuf::from("/etc/sigag/config.toml"),
            source: IoError::new(ErrorKind::NotFound, "file not found"),
        };
        let display = err.to_string();
        assert!(display.contains("failed to read config file"));
        assert!(display.contains("/etc/sigag/config.toml"));
        assert!(display.contains("file not found"));
    }

    #[test]
    fn test_write_error_display() {
        let err = ConfigError::Write {
            path: PathBuf::from("/tmp/sigag.toml"),
            source: IoError::new(ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "failed to write /tmp/sigag.toml: denied");
    }

    #[test]
    fn test_toml_parse_error_from() {
        let toml_err = toml::from_str::<toml::Table>("= nope").unwrap_err();
        let err: ConfigError = toml_err.into();
        assert!(err.to_string().starts_with("failed to parse TOML config"));
    }

    #[test]
    fn test_invalid_display() {
        let err = ConfigError::Invalid { field: "threshold_factor", reason: "must be > 0".into() };
        assert_eq!(err.to_string(), "invalid threshold_factor: must be > 0");
    }
}
