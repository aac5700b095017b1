use thiserror::Error;

/// Errors raised by the store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failure.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The on-disk image could not be encoded or decoded.
    #[error("storage encoding error: {0}")]
    Encoding(String),

    /// A party id collides with the reserved metadata key space.
    #[error("key {0} is reserved")]
    ReservedKey(String),

    /// A metadata value could not be parsed.
    #[error("corrupt value for {key}: {value}")]
    Corrupt {
        /// Metadata key.
        key: String,
        /// Stored value.
        value: String,
    },
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        Self::Encoding(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_display() {
        let err = StorageError::from(std::io::Error::other("disk full"));
        assert_eq!(err.to_string(), "storage I/O error: disk full");
    }

    #[test]
    fn test_reserved_key_display() {
        let err = StorageError::ReservedKey("__meta/epoch".into());
        assert_eq!(err.to_string(), "key __meta/epoch is reserved");
    }

    #[test]
    fn test_corrupt_display() {
        let err = StorageError::Corrupt { key: "__meta/epoch".into(), value: "x".into() };
        assert_eq!(err.to_string(), "corrupt value for __meta/epoch: x");
    }

    #[test]
    fn test_json_error_from() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(StorageError::from(json_err).to_string().starts_with("storage encoding error"));
    }
}
