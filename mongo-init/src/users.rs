//! User accounts provisioned by the bootstrap
//!
//! The three accounts are fixed: an owner, an application writer and a
//! read-only reader. Their names and passwords come from placeholders.

use crate::placeholders::{substitute, PlaceholderError};
use crate::role::Role;
use common::EnvSource;
use std::fmt;
use thiserror::Error;

/// Placeholder holding the target database name.
pub const DB_NAME_PLACEHOLDER: &str = "__DB_NAME__";

/// One user to create on the target database.
#[derive(Clone, PartialEq, Eq)]
pub struct UserSpec {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub database: String,
    pub comment: String,
}

impl fmt::Debug for UserSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserSpec")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .field("database", &self.database)
            .field("comment", &self.comment)
            .finish()
    }
}

/// Reason a user cannot be sent to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidUser {
    EmptyUsername,
    /// The role is scoped to another database than the one targeted.
    DatabaseMismatch { expected: String, found: String },
}

impl fmt::Display for InvalidUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUsername => f.write_str("le nom d'utilisateur est vide"),
            Self::DatabaseMismatch { expected, found } => write!(
                f,
                "le rôle vise la base {} au lieu de {}",
                found, expected
            ),
        }
    }
}

impl UserSpec {
    /// Check the invariants that must hold before creating the user on `target`.
    pub fn validate(&self, target: &str) -> Result<(), InvalidUser> {
        if self.username.is_empty() {
            return Err(InvalidUser::EmptyUsername);
        }
        if self.database != target {
            return Err(InvalidUser::DatabaseMismatch {
                expected: target.to_string(),
                found: self.database.clone(),
            });
        }
        Ok(())
    }
}

/// Longest database name the server accepts, in bytes.
pub const MAX_DATABASE_NAME_LEN: usize = 63;

const FORBIDDEN_DATABASE_CHARS: &[char] = &['/', '\\', '.', ' ', '"', '$', '\0'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidDatabaseName {
    #[error("database name must not be empty")]
    Empty,
    #[error("database name '{0}' is longer than 63 bytes")]
    TooLong(String),
    #[error("database name '{name}' contains forbidden character {ch:?}")]
    ForbiddenChar { name: String, ch: char },
}

/// Check `name` against the server's database naming rules.
pub fn validate_database_name(name: &str) -> Result<(), InvalidDatabaseName> {
    if name.is_empty() {
        return Err(InvalidDatabaseName::Empty);
    }
    if name.len() > MAX_DATABASE_NAME_LEN {
        return Err(InvalidDatabaseName::TooLong(name.to_string()));
    }
    if let Some(ch) = name.chars().find(|c| FORBIDDEN_DATABASE_CHARS.contains(c)) {
        return Err(InvalidDatabaseName::ForbiddenChar {
            name: name.to_string(),
            ch,
        });
    }
    Ok(())
}

/// Fixed shape of one provisioned account.
#[derive(Debug, Clone, Copy)]
pub struct RoleTemplate {
    pub label: &'static str,
    pub user: &'static str,
    pub password: &'static str,
    pub role: Role,
    pub comment: &'static str,
}

/// Owner, writer and reader, in creation order.
pub const TEMPLATES: [RoleTemplate; 3] = [
    RoleTemplate {
        label: "owner",
        user: "__OWNER_USER__",
        password: "__OWNER_PWD__",
        role: Role::DbOwner,
        comment: "Administrateur de la base de données, pour la gestion du schéma et des utilisateurs.",
    },
    RoleTemplate {
        label: "writer",
        user: "__WRITER_USER__",
        password: "__WRITER_PWD__",
        role: Role::ReadWrite,
        comment: "Utilisateur applicatif principal, pour les opérations CRUD sur les données.",
    },
    RoleTemplate {
        label: "reader",
        user: "__READER_USER__",
        password: "__READER_PWD__",
        role: Role::Read,
        comment: "Utilisateur pour les outils de BI ou l'analyse en lecture seule.",
    },
];

impl RoleTemplate {
    /// Fill in the placeholders for `database`.
    pub fn render(
        &self,
        database: &str,
        values: &impl EnvSource,
    ) -> Result<UserSpec, PlaceholderError> {
        Ok(UserSpec {
            username: substitute(self.user, values)?,
            password: substitute(self.password, values)?,
            role: self.role,
            database: database.to_string(),
            comment: self.comment.to_string(),
        })
    }
}

/// Render the target database and the three fixed users.
pub fn render_users(values: &impl EnvSource) -> Result<(String, Vec<UserSpec>), PlaceholderError> {
    let database = substitute(DB_NAME_PLACEHOLDER, values)?;
    let users = TEMPLATES
        .iter()
        .map(|template| template.render(&database, values))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((database, users))
}

/// Every placeholder name the templates need, database first.
pub fn required_placeholders() -> Vec<&'static str> {
    let mut names = crate::placeholders::placeholders(DB_NAME_PLACEHOLDER);
    for template in &TEMPLATES {
        names.extend(crate::placeholders::placeholders(template.user));
        names.extend(crate::placeholders::placeholders(template.password));
    }
    names
}
