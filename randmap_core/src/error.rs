//! Error definitions.
use thiserror::Error;

/// Project-wise error type.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandMapError {
    /// A random entry was requested from a map that holds no entries.
    #[error("Unable to sample from an empty collection.")]
    EmptyCollection,
    /// An iterator was bound to output references whose types differ from the key and value types
    /// of the map.
    #[error("Output references do not match the map types ({expected_key}, {expected_value}).")]
    TypeMismatch {
        expected_key: &'static str,
        expected_value: &'static str,
    },
    /// A configuration value is out of its valid range.
    #[error("Invalid configuration: {0}.")]
    InvalidConfig(&'static str),
}
