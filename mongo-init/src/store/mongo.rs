//! MongoDB adapter for the store traits

use super::{AdminClient, DatabaseHandle, StoreError};
use crate::users::UserSpec;
use anyhow::{anyhow, Context, Result};
use mongodb::bson::{doc, Document};
use mongodb::error::{Error, ErrorKind};
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use std::time::Duration;
use tracing::{debug, instrument};

/// Server error code for `createUser` on an existing account.
pub const DUPLICATE_USER_CODE: i32 = 51003;

/// Administrative connection to a MongoDB deployment.
#[derive(Clone)]
pub struct MongoAdmin {
    client: Client,
}

impl MongoAdmin {
    /// Connect and make sure a server answers before any user is created.
    #[instrument(skip_all, fields(app_name = %app_name))]
    pub async fn connect(
        uri: &str,
        app_name: &str,
        server_selection_timeout: Duration,
    ) -> Result<Self> {
        let mut options = ClientOptions::parse(uri)
            .await
            .context("Invalid MongoDB connection string")?;
        options.app_name = Some(app_name.to_string());
        options.server_selection_timeout = Some(server_selection_timeout);

        let client = Client::with_options(options).context("Failed to build MongoDB client")?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .context("MongoDB did not answer ping")?;
        debug!("MongoDB reachable");

        Ok(Self { client })
    }
}

impl AdminClient for MongoAdmin {
    type Handle = MongoDatabase;

    fn database(&self, name: &str) -> MongoDatabase {
        MongoDatabase {
            db: self.client.database(name),
        }
    }
}

/// Target database on an admin connection.
#[derive(Clone)]
pub struct MongoDatabase {
    db: Database,
}

impl MongoDatabase {
    /// Roles granted to `username` on this database, as `(role, db)` pairs.
    pub async fn user_roles(&self, username: &str) -> Result<Vec<(String, String)>> {
        let reply = self
            .db
            .run_command(doc! { "usersInfo": username })
            .await
            .context("usersInfo failed")?;

        let users = reply.get_array("users").context("usersInfo reply without users")?;
        let user = users
            .iter()
            .filter_map(|u| u.as_document())
            .find(|u| u.get_str("user").ok() == Some(username))
            .ok_or_else(|| anyhow!("user {} not found on {}", username, self.db.name()))?;

        user.get_array("roles")
            .context("user without roles")?
            .iter()
            .filter_map(|r| r.as_document())
            .map(|r| -> Result<(String, String)> {
                Ok((
                    r.get_str("role").context("role without name")?.to_string(),
                    r.get_str("db").context("role without db")?.to_string(),
                ))
            })
            .collect()
    }

    pub async fn drop_user(&self, username: &str) -> Result<()> {
        self.db
            .run_command(doc! { "dropUser": username })
            .await
            .with_context(|| format!("dropUser {} failed", username))?;
        Ok(())
    }
}

impl DatabaseHandle for MongoDatabase {
    fn name(&self) -> &str {
        self.db.name()
    }

    async fn create_user(&self, user: &UserSpec) -> Result<(), StoreError> {
        self.db
            .run_command(create_user_command(user, self.db.name()))
            .await
            .map(|_| ())
            .map_err(|e| classify(&user.username, &e))
    }
}

/// `createUser` command for one user, with its role scoped to `database`.
pub(crate) fn create_user_command(user: &UserSpec, database: &str) -> Document {
    doc! {
        "createUser": user.username.as_str(),
        "pwd": user.password.as_str(),
        "roles": [ { "role": user.role.as_str(), "db": database } ],
        "comment": user.comment.as_str(),
    }
}

/// Map a driver error onto the store taxonomy.
pub fn classify(username: &str, err: &Error) -> StoreError {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => {
            classify_code(username, Some(command.code), command.message.clone())
        }
        _ => classify_code(username, None, err.to_string()),
    }
}

fn classify_code(username: &str, code: Option<i32>, message: String) -> StoreError {
    match code {
        Some(DUPLICATE_USER_CODE) => StoreError::DuplicateUser {
            username: username.to_string(),
        },
        _ => StoreError::Failure { message },
    }
}
