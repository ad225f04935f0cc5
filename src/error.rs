//! Error types for the authorization engine

use thiserror::Error;

/// Authorization engine errors
///
/// Lookup operations return `Result<usize>`: `Ok(n)` is the number of
/// successfully decoded documents (zero means "no matching record", which is
/// a normal negative result, not an error), and `Err(_)` is an operational
/// failure the caller must treat as fatal for the in-flight request.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Invalid module configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Connection pool could not be constructed
    #[error("Could not create connection pool: {0}")]
    PoolInit(String),

    /// No connection available in the pool
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A borrowed connection could not be returned to the pool
    #[error("Connection was not returned to the pool")]
    ConnectionRelease,

    /// A query reply arrived but the result cursor could not be opened
    #[error("Could not create result cursor")]
    CursorCreate,

    /// A group lookup was attempted with an empty group name
    #[error("Empty group name")]
    EmptyGroupName,

    /// An operator token outside the recognized set
    #[error("Invalid operator token '{0}'")]
    InvalidOperator(String),

    /// A policy attribute could not be constructed
    #[error("Invalid attribute name '{0}'")]
    InvalidAttribute(String),

    /// Store session error (dialing, transport setup)
    #[error("Store error: {0}")]
    Store(String),
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;
