//! Error types
//!
//! Only surface resolution can fail. Every other operation on the engine is
//! total and treats redundant calls as no-ops.

/// Error type for media operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A surface query matched nothing
    #[error("Selector matched no surface: {selector}")]
    NotFound {
        /// The query that failed to resolve
        selector: String,
    },
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
