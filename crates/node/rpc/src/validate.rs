//! Required-field validation for decoded method parameters.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

/// Raised when a required parameter field holds its empty value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The named field is empty, zero or absent.
    #[error("field '{field}' is required but missing or null in JSON")]
    Missing {
        /// Wire name of the field.
        field: &'static str,
    },
}

/// Values that have a distinguished "empty" state.
pub trait IsEmpty {
    /// Returns `true` for the zero, empty or absent value.
    fn is_empty_value(&self) -> bool;
}

impl IsEmpty for String {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl IsEmpty for bool {
    fn is_empty_value(&self) -> bool {
        false
    }
}

impl<T> IsEmpty for Option<T> {
    fn is_empty_value(&self) -> bool {
        self.is_none()
    }
}

impl<T> IsEmpty for Vec<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> IsEmpty for BTreeMap<K, V> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V, S> IsEmpty for HashMap<K, V, S> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

macro_rules! impl_is_empty_int {
    ($($ty:ty),*) => {
        $(impl IsEmpty for $ty {
            fn is_empty_value(&self) -> bool {
                *self == 0
            }
        })*
    };
}

impl_is_empty_int!(u8, u16, u32, u64, usize, i32, i64);

/// Parameter types that declare required fields.
///
/// Implement through [`required_fields!`](crate::required_fields); types with
/// no required fields can use the empty default impl.
pub trait RequiredFields {
    /// First required field holding its empty value, by wire name.
    fn missing_field(&self) -> Option<&'static str> {
        None
    }

    /// Fails on the first empty required field.
    fn validate(&self) -> Result<(), ValidationError> {
        match self.missing_field() {
            Some(field) => Err(ValidationError::Missing { field }),
            None => Ok(()),
        }
    }
}

impl RequiredFields for () {}

impl RequiredFields for serde_json::Value {}

/// Declares the required fields of a parameter struct.
///
/// ```ignore
/// required_fields!(RegisterParams { address => "address", url => "url" });
/// ```
#[macro_export]
macro_rules! required_fields {
    ($ty:ty { $($field:ident => $name:literal),* $(,)? }) => {
        impl $crate::RequiredFields for $ty {
            fn missing_field(&self) -> Option<&'static str> {
                $(
                    if $crate::IsEmpty::is_empty_value(&self.$field) {
                        return Some($name);
                    }
                )*
                None
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Sample {
        address: String,
        epoch: u64,
        tags: Vec<String>,
        flag: bool,
    }

    required_fields!(Sample { address => "address", epoch => "epoch", tags => "tags", flag => "noTLS" });

    #[test]
    fn reports_first_missing_field() {
        let sample = Sample::default();
        assert_eq!(sample.missing_field(), Some("address"));

        let sample = Sample { address: "p1".into(), ..Default::default() };
        assert_eq!(sample.missing_field(), Some("epoch"));

        let sample = Sample { address: "p1".into(), epoch: 3, ..Default::default() };
        assert_eq!(
            sample.validate().unwrap_err().to_string(),
            "field 'tags' is required but missing or null in JSON"
        );
    }

    #[test]
    fn bool_is_never_empty() {
        let sample = Sample { address: "p1".into(), epoch: 1, tags: vec!["a".into()], flag: false };
        assert!(sample.validate().is_ok());
    }

    #[test]
    fn unit_has_no_required_fields() {
        assert!(().validate().is_ok());
    }
}
