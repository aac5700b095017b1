use thiserror::Error;

/// Errors returned by [`crate::PeerRegistry`] mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A party with this id is already registered.
    #[error("address already registered")]
    Duplicate {
        /// Party id.
        id: String,
    },

    /// No party with this id is registered.
    #[error("party {id} not found")]
    NotFound {
        /// Party id.
        id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_display() {
        let err = RegistryError::Duplicate { id: "8801".into() };
        assert_eq!(err.to_string(), "address already registered");
    }

    #[test]
    fn test_not_found_display() {
        let err = RegistryError::NotFound { id: "8801".into() };
        assert_eq!(err.to_string(), "party 8801 not found");
    }
}
