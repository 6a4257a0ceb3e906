//! Administrative interface of the backing store
//!
//! The runner only sees these traits. Adapters classify their native errors
//! into [`StoreError`] right after each call returns.

mod mongo;

pub use mongo::{classify, MongoAdmin, MongoDatabase, DUPLICATE_USER_CODE};

use crate::users::UserSpec;
use std::future::Future;
use thiserror::Error;

/// Outcome of a failed create-user call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// An account with the same name already exists on the database.
    #[error("user {username} already exists")]
    DuplicateUser { username: String },

    /// Anything else: permissions, malformed request, lost connection.
    #[error("{message}")]
    Failure { message: String },
}

impl StoreError {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }
}

/// Capability to select a database by name.
pub trait AdminClient {
    type Handle: DatabaseHandle;

    fn database(&self, name: &str) -> Self::Handle;
}

/// A database selected on the admin connection.
pub trait DatabaseHandle {
    fn name(&self) -> &str;

    /// Create one user with its role scoped to this database.
    fn create_user(&self, user: &UserSpec) -> impl Future<Output = Result<(), StoreError>> + Send;
}
