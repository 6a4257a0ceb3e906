//! Sequential, idempotent user creation

use crate::store::{AdminClient, DatabaseHandle, StoreError};
use crate::users::{validate_database_name, InvalidDatabaseName, UserSpec};
use std::fmt;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// What happened to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created { username: String },
    AlreadyExists { username: String },
    Failed { username: String, message: String },
}

impl Outcome {
    pub fn username(&self) -> &str {
        match self {
            Self::Created { username }
            | Self::AlreadyExists { username }
            | Self::Failed { username, .. } => username,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created { username } => write!(f, ">> Utilisateur créé : {}", username),
            Self::AlreadyExists { username } => {
                write!(f, ">> Utilisateur déjà existant (Ignoré) : {}", username)
            }
            Self::Failed { username, message } => write!(
                f,
                ">> ERREUR critique lors de la création de l'utilisateur {} : {}",
                username, message
            ),
        }
    }
}

/// Ordered outcomes of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub database: String,
    pub outcomes: Vec<Outcome>,
}

impl Report {
    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Created { .. }))
    }

    pub fn already_existing(&self) -> usize {
        self.count(|o| matches!(o, Outcome::AlreadyExists { .. }))
    }

    pub fn failures(&self) -> usize {
        self.count(Outcome::is_failure)
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(Outcome::is_failure)
    }

    /// Final line naming the target database.
    pub fn summary(&self) -> String {
        format!(
            "Création des utilisateurs terminée sur la base de données : {}",
            self.database
        )
    }

    /// One line per outcome followed by the summary.
    pub fn lines(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .map(ToString::to_string)
            .chain(std::iter::once(self.summary()))
            .collect()
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|&o| pred(o)).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootstrapError {
    #[error("invalid target database: {0}")]
    InvalidDatabase(#[from] InvalidDatabaseName),
}

/// Select `target` on the admin connection and run the bootstrap on it.
pub async fn bootstrap<A: AdminClient>(
    admin: &A,
    target: &str,
    users: &[UserSpec],
) -> Result<Report, BootstrapError> {
    validate_database_name(target)?;
    let handle = admin.database(target);
    Ok(run(&handle, users).await)
}

/// Create every user in order on `db`.
///
/// Never stops early: duplicates are expected on re-runs and any other failure
/// is recorded and logged before moving on to the next user. A user whose role
/// targets another database than `db` fails without reaching the store.
#[instrument(skip_all, fields(database = %db.name()))]
pub async fn run<H: DatabaseHandle>(db: &H, users: &[UserSpec]) -> Report {
    let mut outcomes = Vec::with_capacity(users.len());

    for user in users {
        let outcome = create_one(db, user).await;
        match &outcome {
            Outcome::Failed { .. } => error!(user = %user.username, role = %user.role, "{}", outcome),
            _ => info!(user = %user.username, role = %user.role, "{}", outcome),
        }
        outcomes.push(outcome);
    }

    let report = Report {
        database: db.name().to_string(),
        outcomes,
    };
    info!(
        created = report.created(),
        already_existing = report.already_existing(),
        failed = report.failures(),
        "{}",
        report.summary()
    );
    report
}

async fn create_one<H: DatabaseHandle>(db: &H, user: &UserSpec) -> Outcome {
    let username = user.username.clone();

    if let Err(invalid) = user.validate(db.name()) {
        return Outcome::Failed {
            username,
            message: invalid.to_string(),
        };
    }
    if user.password.is_empty() {
        warn!(user = %user.username, "Empty password");
    }

    match db.create_user(user).await {
        Ok(()) => Outcome::Created { username },
        Err(StoreError::DuplicateUser { .. }) => Outcome::AlreadyExists { username },
        Err(StoreError::Failure { message }) => Outcome::Failed { username, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// In-memory user store: `database -> username -> role`.
    #[derive(Clone, Default)]
    struct MemoryStore {
        users: Arc<Mutex<HashMap<String, HashMap<String, Role>>>>,
        calls: Arc<Mutex<Vec<String>>>,
        broken: Vec<String>,
    }

    impl MemoryStore {
        fn failing_for(username: &str) -> Self {
            Self {
                broken: vec![username.to_string()],
                ..Self::default()
            }
        }

        fn role_of(&self, database: &str, username: &str) -> Option<Role> {
            let users = self.users.lock().unwrap();
            users.get(database)?.get(username).copied()
        }

        fn user_count(&self, database: &str) -> usize {
            let users = self.users.lock().unwrap();
            users.get(database).map(HashMap::len).unwrap_or(0)
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    struct MemoryDatabase {
        name: String,
        store: MemoryStore,
    }

    impl AdminClient for MemoryStore {
        type Handle = MemoryDatabase;

        fn database(&self, name: &str) -> MemoryDatabase {
            MemoryDatabase {
                name: name.to_string(),
                store: self.clone(),
            }
        }
    }

    impl DatabaseHandle for MemoryDatabase {
        fn name(&self) -> &str {
            &self.name
        }

        async fn create_user(&self, user: &UserSpec) -> Result<(), StoreError> {
            self.store.calls.lock().unwrap().push(user.username.clone());

            if self.store.broken.contains(&user.username) {
                return Err(StoreError::failure("not authorized on shopdb"));
            }

            let mut users = self.store.users.lock().unwrap();
            let db = users.entry(self.name.clone()).or_default();
            if db.contains_key(&user.username) {
                return Err(StoreError::DuplicateUser {
                    username: user.username.clone(),
                });
            }
            db.insert(user.username.clone(), user.role);
            Ok(())
        }
    }

    fn user(username: &str, password: &str, role: Role) -> UserSpec {
        UserSpec {
            username: username.to_string(),
            password: password.to_string(),
            role,
            database: "shopdb".to_string(),
            comment: String::new(),
        }
    }

    fn shop_users() -> Vec<UserSpec> {
        vec![
            user("admin_shop", "pw1", Role::DbOwner),
            user("app_shop", "pw2", Role::ReadWrite),
            user("bi_shop", "pw3", Role::Read),
        ]
    }

    #[tokio::test]
    async fn test_fresh_database_creates_every_user() {
        let store = MemoryStore::default();

        let report = bootstrap(&store, "shopdb", &shop_users()).await.unwrap();

        assert_eq!(report.created(), 3);
        assert!(!report.has_failures());
        assert_eq!(
            report.lines(),
            vec![
                ">> Utilisateur créé : admin_shop",
                ">> Utilisateur créé : app_shop",
                ">> Utilisateur créé : bi_shop",
                "Création des utilisateurs terminée sur la base de données : shopdb",
            ]
        );
    }

    #[tokio::test]
    async fn test_second_run_reports_already_existing() {
        let store = MemoryStore::default();
        bootstrap(&store, "shopdb", &shop_users()).await.unwrap();

        let report = bootstrap(&store, "shopdb", &shop_users()).await.unwrap();

        assert_eq!(report.already_existing(), 3);
        assert_eq!(report.created(), 0);
        assert!(!report.has_failures());
        assert_eq!(store.user_count("shopdb"), 3);
        assert_eq!(
            report.lines(),
            vec![
                ">> Utilisateur déjà existant (Ignoré) : admin_shop",
                ">> Utilisateur déjà existant (Ignoré) : app_shop",
                ">> Utilisateur déjà existant (Ignoré) : bi_shop",
                "Création des utilisateurs terminée sur la base de données : shopdb",
            ]
        );
    }

    #[tokio::test]
    async fn test_users_get_their_configured_role() {
        let store = MemoryStore::default();
        bootstrap(&store, "shopdb", &shop_users()).await.unwrap();

        assert_eq!(store.role_of("shopdb", "admin_shop"), Some(Role::DbOwner));
        assert_eq!(store.role_of("shopdb", "app_shop"), Some(Role::ReadWrite));
        assert_eq!(store.role_of("shopdb", "bi_shop"), Some(Role::Read));
        assert_eq!(store.role_of("otherdb", "bi_shop"), None);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_the_run() {
        let store = MemoryStore::failing_for("app_shop");

        let report = bootstrap(&store, "shopdb", &shop_users()).await.unwrap();

        assert_eq!(store.calls(), vec!["admin_shop", "app_shop", "bi_shop"]);
        assert_eq!(
            report.outcomes,
            vec![
                Outcome::Created {
                    username: "admin_shop".to_string()
                },
                Outcome::Failed {
                    username: "app_shop".to_string(),
                    message: "not authorized on shopdb".to_string()
                },
                Outcome::Created {
                    username: "bi_shop".to_string()
                },
            ]
        );
        assert!(report.has_failures());
        assert_eq!(report.failures(), 1);
        assert_eq!(
            report.outcomes[1].to_string(),
            ">> ERREUR critique lors de la création de l'utilisateur app_shop : not authorized on shopdb"
        );
    }

    #[tokio::test]
    async fn test_empty_username_is_rejected_without_calling_the_store() {
        let store = MemoryStore::default();
        let users = vec![
            user("", "pw1", Role::DbOwner),
            user("app_shop", "", Role::ReadWrite),
        ];

        let report = bootstrap(&store, "shopdb", &users).await.unwrap();

        assert_eq!(store.calls(), vec!["app_shop"]);
        assert_eq!(
            report.outcomes[0],
            Outcome::Failed {
                username: String::new(),
                message: "le nom d'utilisateur est vide".to_string()
            }
        );
        assert_eq!(
            report.outcomes[1],
            Outcome::Created {
                username: "app_shop".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_target_database_is_rejected() {
        let store = MemoryStore::default();

        let err = bootstrap(&store, "", &shop_users()).await.unwrap_err();
        assert_eq!(err, BootstrapError::InvalidDatabase(InvalidDatabaseName::Empty));

        let err = bootstrap(&store, "shop.db", &shop_users()).await.unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::InvalidDatabase(InvalidDatabaseName::ForbiddenChar { ch: '.', .. })
        ));

        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_uses_the_given_handle() {
        let store = MemoryStore::default();
        let handle = store.database("analytics");
        let users: Vec<UserSpec> = shop_users()
            .into_iter()
            .map(|u| UserSpec {
                database: "analytics".to_string(),
                ..u
            })
            .collect();

        let report = run(&handle, &users).await;

        assert_eq!(report.database, "analytics");
        assert_eq!(report.created(), 3);
        assert_eq!(store.role_of("analytics", "app_shop"), Some(Role::ReadWrite));
        assert_eq!(store.user_count("shopdb"), 0);
    }

    #[tokio::test]
    async fn test_users_rendered_for_another_database_are_not_created() {
        let store = MemoryStore::default();

        let report = bootstrap(&store, "analytics", &shop_users()).await.unwrap();

        assert!(store.calls().is_empty());
        assert_eq!(store.user_count("analytics"), 0);
        assert_eq!(report.failures(), 3);
        assert_eq!(
            report.outcomes[0],
            Outcome::Failed {
                username: "admin_shop".to_string(),
                message: "le rôle vise la base shopdb au lieu de analytics".to_string()
            }
        );
    }
}
