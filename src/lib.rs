// ABOUTME: Main library for the SQL Server credential binding manager
// ABOUTME: Exposes the Binder facade plus module declarations and re-exports

// Module declarations
pub mod binding;
pub mod config;
pub mod db;
pub mod models;

pub use binding::{BindingEngine, DEFAULT_OWNER};
pub use config::{ConfigError, ServerSettings};
pub use db::{ErrorKind, Session, SqlServerSession, StatementError};
pub use models::{BindingRequest, RequestError, MAX_ROLES};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BinderError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Statement(#[from] StatementError),
}

/// Caller-facing handle for binding operations against one target database.
///
/// The target database is fixed per handle; [`Binder::with_database`] derives
/// an independent handle for a different database instead of mutating shared
/// state, so handles are safe to share across concurrent operations. Each
/// operation opens its own session and runs a short, ordered statement
/// sequence; dropping the returned future cancels between statements.
#[derive(Debug, Clone)]
pub struct Binder {
    settings: ServerSettings,
    database: String,
}

impl Binder {
    /// Create a handle targeting the settings' default database
    pub fn new(settings: ServerSettings) -> Self {
        let database = settings.database.clone();
        Self { settings, database }
    }

    /// Derive a handle targeting a different database
    pub fn with_database(&self, database: &str) -> Self {
        Self {
            settings: self.settings.clone(),
            database: database.to_string(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    async fn engine(&self) -> Result<BindingEngine<SqlServerSession>, StatementError> {
        let session = SqlServerSession::connect(&self.settings, &self.database).await?;
        Ok(BindingEngine::new(session))
    }

    /// Create a binding (idempotent). See [`BindingEngine::create_binding`].
    pub async fn create_binding(
        &self,
        username: &str,
        password: &str,
        roles: &[String],
    ) -> Result<(), StatementError> {
        log::info!("creating binding {} in database {}", username, self.database);
        self.engine().await?.create_binding(username, password, roles).await
    }

    /// Check whether a binding's user exists
    pub async fn read_binding(&self, username: &str) -> Result<bool, StatementError> {
        self.engine().await?.read_binding(username).await
    }

    /// Delete a binding, preserving schema objects it created. Fails when the
    /// binding does not exist. See [`BindingEngine::delete_binding`].
    pub async fn delete_binding(&self, username: &str) -> Result<(), StatementError> {
        log::info!("deleting binding {} in database {}", username, self.database);
        self.engine().await?.delete_binding(username).await
    }

    /// Validate a request and create the binding it describes, honoring the
    /// request's database override. This is the mapping a resource adapter
    /// calls with its declared attributes.
    pub async fn apply(&self, request: &BindingRequest) -> Result<(), BinderError> {
        request.validate()?;

        let derived;
        let target = match request.database.as_deref() {
            Some(db) if !db.is_empty() => {
                derived = self.with_database(db);
                &derived
            }
            _ => self,
        };

        target
            .create_binding(&request.username, &request.password, &request.roles)
            .await?;
        Ok(())
    }
}
