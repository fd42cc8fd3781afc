//! Error types for the catalog security core.

use thiserror::Error;

/// The main error type for catalog security operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Role with the given authority name already exists.
    #[error("Role '{0}' already exists")]
    RoleAlreadyExists(String),

    /// Role with the given authority name was not found.
    #[error("Role '{0}' not found")]
    RoleNotFound(String),

    /// User with the given username already exists.
    #[error("User '{0}' already exists")]
    UserAlreadyExists(String),

    /// User with the given username was not found.
    #[error("User '{0}' not found")]
    UserNotFound(String),

    /// Group with the given name already exists.
    #[error("Group '{0}' already exists")]
    GroupAlreadyExists(String),

    /// Group with the given name was not found.
    #[error("Group '{0}' not found")]
    GroupNotFound(String),

    /// An authority name was empty.
    #[error("Authority name must not be empty")]
    EmptyAuthorityName,

    /// A personalized role instance was handed to a store.
    #[error("Role '{0}' is personalized and cannot be stored")]
    TransientRole(String),

    /// Assigning the parent would create a cycle or a self-parent.
    #[error("Role '{parent}' is not a valid parent for role '{role}'")]
    InvalidParent {
        /// The role whose parent was being set.
        role: String,
        /// The rejected parent candidate.
        parent: String,
    },

    /// The principal carries no granted authority at all.
    #[error("Insufficient authentication to access '{0}'")]
    InsufficientAuthentication(String),

    /// The principal is authenticated but not authorized.
    #[error("Access denied to '{0}'")]
    AccessDenied(String),

    /// Durable backend read or write failed.
    #[error("Security backend i/o failure: {0}")]
    Backend(#[from] std::io::Error),

    /// Durable backend produced or consumed malformed records.
    #[cfg(feature = "persistence")]
    #[error("Security backend serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for catalog security operations.
pub type Result<T> = std::result::Result<T, Error>;
