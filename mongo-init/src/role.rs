//! Built-in database roles granted by the bootstrap

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Privilege level granted to a user on a single database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Schema and user management on the database.
    #[serde(rename = "dbOwner")]
    DbOwner,
    /// Read and write on data.
    #[serde(rename = "readWrite")]
    ReadWrite,
    /// Read-only.
    #[serde(rename = "read")]
    Read,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::DbOwner, Role::ReadWrite, Role::Read];

    /// Name of the role as the server knows it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DbOwner => "dbOwner",
            Self::ReadWrite => "readWrite",
            Self::Read => "read",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported role '{0}' (expected dbOwner, readWrite or read)")]
pub struct RoleParseError(pub String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| RoleParseError(s.to_string()))
    }
}
