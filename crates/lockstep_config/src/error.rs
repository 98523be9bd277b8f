//! Error types for suite file loading and validation.

/// Errors that can occur when loading or validating a `lockstep.toml` file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the file.
    #[error("cannot read suite file: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("malformed suite file: {0}")]
    ParseError(String),

    /// A configuration value failed validation.
    #[error("invalid suite: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_parse_error() {
        let err = ConfigError::ParseError("expected '=' at line 3".to_string());
        assert_eq!(
            format!("{err}"),
            "malformed suite file: expected '=' at line 3"
        );
    }

    #[test]
    fn display_validation_error() {
        let err = ConfigError::ValidationError("counter[0]: bad".to_string());
        assert_eq!(format!("{err}"), "invalid suite: counter[0]: bad");
    }

    #[test]
    fn display_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::IoError(io_err);
        assert!(format!("{err}").starts_with("cannot read suite file:"));
    }
}
