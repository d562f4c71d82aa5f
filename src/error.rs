//! Error types for geogate
//!
//! This module defines the error hierarchy used throughout the engine.
//! We use `thiserror` for library-style errors that are part of the API,
//! and leave the mapping to wire responses to the embedding adapter.
//!
//! Decision-path errors (`AccessError` and everything it wraps) are `Clone`
//! so that a single failed computation can be shared with every caller
//! joined on the same in-flight cache entry.

use crate::model::RuleId;
use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// IPv4 address and CIDR range errors
///
/// IPv6 is explicitly unsupported: supplying an IPv6 address or range is an
/// error, never a silent non-match.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("IPv6 addresses are not supported: {0}")]
    Ipv6Unsupported(String),

    #[error("Invalid CIDR range '{range}': {reason}")]
    InvalidCidr { range: String, reason: String },

    #[error("Invalid IPv4 address '{0}'")]
    InvalidAddress(String),
}

/// Allowed-area geometry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("Invalid WKT '{wkt}': {reason}")]
    InvalidWkt { wkt: String, reason: String },

    #[error("Unsupported geometry type '{0}': allowed areas must be polygonal")]
    UnsupportedGeometry(String),
}

/// Storage-port errors
///
/// Raised by `RuleRepository`/`AdminRuleRepository` implementations. The
/// in-memory reference store only produces `Corrupted` (index desync, which
/// indicates a bug); relational implementations map their driver errors to
/// `Backend`.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Rule {0} not found in store")]
    NotFound(RuleId),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Store index corrupted: {0}")]
    Corrupted(String),
}

/// Rule administration errors
#[derive(Error, Debug)]
pub enum RuleError {
    /// Insert was given a rule that already carries a store-assigned id.
    #[error("Cannot insert a rule that already has an id ({0})")]
    IdentifierPresent(RuleId),

    /// Update was given a rule without an id.
    #[error("Cannot update a rule without an id")]
    IdentifierMissing,

    #[error("Rule {0} does not exist")]
    NotFound(RuleId),

    /// Another rule of the same type already carries this (grant, identifier)
    /// pair. Recoverable: the adapter maps it to a conflict response.
    #[error("A rule with the same identifier already exists (rule {existing})")]
    DuplicateIdentifier { existing: RuleId },

    /// The priority allocation critical section could not settle within its
    /// retry budget. Only reachable with a misbehaving store backend.
    #[error("Priority allocation retry budget exhausted after {attempts} attempts")]
    PriorityRetryExhausted { attempts: u32 },

    #[error("Address error: {0}")]
    Address(#[from] AddressError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Authorization decision errors
#[derive(Error, Debug, Clone)]
pub enum AccessError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Address error: {0}")]
    Address(#[from] AddressError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),
}

/// Result type alias for rule administration operations
pub type RuleResult<T> = std::result::Result<T, RuleError>;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for authorization decisions
pub type AccessResult<T> = std::result::Result<T, AccessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_identifier_message() {
        let err = RuleError::DuplicateIdentifier {
            existing: RuleId::new(42),
        };
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_store_error_converts_to_rule_error() {
        let err: RuleError = StoreError::NotFound(RuleId::new(7)).into();
        assert!(matches!(err, RuleError::Store(StoreError::NotFound(_))));
    }

    #[test]
    fn test_access_error_is_clone() {
        let err = AccessError::Address(AddressError::Ipv6Unsupported("::1".into()));
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }
}
