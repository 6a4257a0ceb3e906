//! Idempotent bootstrap of MongoDB user accounts
//!
//! Creates an owner, a writer and a reader on one target database. Re-running
//! against a database where the users exist reports them as already present
//! instead of failing.

pub mod bootstrap;
pub mod placeholders;
pub mod role;
pub mod store;
pub mod users;

pub use bootstrap::{bootstrap, run, Config, Outcome, Report};
pub use role::Role;
pub use store::{AdminClient, DatabaseHandle, MongoAdmin, MongoDatabase, StoreError};
pub use users::{render_users, UserSpec, TEMPLATES};
