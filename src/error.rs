use thiserror::Error;

/// The closed set of recoverable drive-communication failures.
///
/// Every operation executed by the dispatch worker fails with one of these
/// kinds. Anything outside this set (a panic inside an operation, a poisoned
/// lock) is a programming error and is deliberately not represented here:
/// it propagates and terminates the worker thread instead of being reported
/// as an operational condition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriveError {
    /// Establishing or using the drive link failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// The communication layer rejected a configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A parameter was out of range or inconsistent.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// A register or lookup key does not exist.
    #[error("missing key: {0}")]
    MissingKey(String),

    /// A required file or resource is absent.
    #[error("{0}")]
    MissingResource(String),

    /// The drive link was closed while in use.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),
}

/// Discriminant of [`DriveError`], for matching without the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Connection,
    Configuration,
    InvalidValue,
    MissingKey,
    MissingResource,
    ConnectionClosed,
}

impl DriveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DriveError::Connection(_) => ErrorKind::Connection,
            DriveError::Configuration(_) => ErrorKind::Configuration,
            DriveError::InvalidValue(_) => ErrorKind::InvalidValue,
            DriveError::MissingKey(_) => ErrorKind::MissingKey,
            DriveError::MissingResource(_) => ErrorKind::MissingResource,
            DriveError::ConnectionClosed(_) => ErrorKind::ConnectionClosed,
        }
    }

    /// The message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            DriveError::Connection(m)
            | DriveError::Configuration(m)
            | DriveError::InvalidValue(m)
            | DriveError::MissingKey(m)
            | DriveError::MissingResource(m)
            | DriveError::ConnectionClosed(m) => m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        let err = DriveError::MissingResource("No dictionary selected.".to_string());
        assert_eq!(err.kind(), ErrorKind::MissingResource);
        assert_eq!(err.message(), "No dictionary selected.");
    }

    #[test]
    fn test_display_includes_message() {
        let err = DriveError::InvalidValue("Node IDs cannot be the same.".to_string());
        assert!(err.to_string().contains("Node IDs cannot be the same."));
    }
}
