// ABOUTME: Binding lifecycle engine: create, read, and delete database credential bindings
// ABOUTME: Encodes idempotency, legacy login cleanup, and ownership reassignment policy

use std::collections::HashSet;

use crate::db::session::{ErrorKind, Session, StatementError};

/// Built-in principal that inherits ownership of schema objects when the
/// owning binding user is dropped.
pub const DEFAULT_OWNER: &str = "dbo";

const USER_EXISTS: &str =
    "SELECT name FROM sys.database_principals WHERE type IN ('S', 'E', 'X') AND name = @P1";

const LOGIN_EXISTS: &str = "SELECT name FROM sys.sql_logins WHERE name = @P1";

const USER_ROLES: &str = "SELECT r.name FROM sys.database_role_members m \
     JOIN sys.database_principals r ON m.role_principal_id = r.principal_id \
     JOIN sys.database_principals u ON m.member_principal_id = u.principal_id \
     WHERE u.name = @P1";

const OWNED_SCHEMAS: &str = "SELECT s.name FROM sys.schemas s \
     JOIN sys.database_principals p ON s.principal_id = p.principal_id \
     WHERE p.name = @P1";

/// Quote an identifier for use in DDL, which the server cannot parameterize.
fn quote_ident(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// Quote a string literal (passwords in CREATE USER).
fn quote_literal(value: &str) -> String {
    format!("N'{}'", value.replace('\'', "''"))
}

/// Lifecycle engine for credential bindings, generic over the session so the
/// statement sequences can be exercised against an in-memory store.
///
/// Every create step is check-then-act, so a create interrupted partway
/// (cancellation, transient failure) converges when re-invoked.
pub struct BindingEngine<S: Session> {
    session: S,
}

impl<S: Session> BindingEngine<S> {
    pub fn new(session: S) -> Self {
        Self { session }
    }

    /// Create a binding: ensure the user exists, holds at least the requested
    /// roles, and can execute stored procedures. Idempotent.
    pub async fn create_binding(
        &mut self,
        username: &str,
        password: &str,
        roles: &[String],
    ) -> Result<(), StatementError> {
        self.ensure_user(username, password).await?;
        self.ensure_roles(username, roles).await?;
        self.grant_execute(username).await?;
        Ok(())
    }

    /// Check whether a binding user exists. Absence is a normal `false`
    /// result, never an error.
    pub async fn read_binding(&mut self, username: &str) -> Result<bool, StatementError> {
        let rows = self.session.query_strings(USER_EXISTS, &[username]).await?;
        Ok(!rows.is_empty())
    }

    /// Delete a binding: reassign owned schemas to [`DEFAULT_OWNER`], drop the
    /// user, and drop a same-named legacy login if one exists. Deleting an
    /// absent binding fails with the server's own principal-not-found error.
    pub async fn delete_binding(&mut self, username: &str) -> Result<(), StatementError> {
        let schemas = self.session.query_strings(OWNED_SCHEMAS, &[username]).await?;
        for schema in &schemas {
            let statement = format!(
                "ALTER AUTHORIZATION ON SCHEMA::{} TO {}",
                quote_ident(schema),
                quote_ident(DEFAULT_OWNER)
            );
            self.session.exec(&statement, &[]).await?;
            log::info!("reassigned schema {} from {} to {}", schema, username, DEFAULT_OWNER);
        }

        // No IF EXISTS: callers must see delete-of-absent as an error.
        let statement = format!("DROP USER {}", quote_ident(username));
        self.session.exec(&statement, &[]).await?;

        let logins = self.session.query_strings(LOGIN_EXISTS, &[username]).await?;
        if !logins.is_empty() {
            let statement = format!("DROP LOGIN {}", quote_ident(username));
            self.session.exec(&statement, &[]).await?;
            log::info!("dropped legacy login {}", username);
        }

        Ok(())
    }

    async fn ensure_user(&mut self, username: &str, password: &str) -> Result<(), StatementError> {
        let users = self.session.query_strings(USER_EXISTS, &[username]).await?;
        if !users.is_empty() {
            log::debug!("user {} already exists, skipping creation", username);
            return Ok(());
        }

        let logins = self.session.query_strings(LOGIN_EXISTS, &[username]).await?;
        let statement = if logins.is_empty() {
            format!(
                "CREATE USER {} WITH PASSWORD = {}",
                quote_ident(username),
                quote_literal(password)
            )
        } else {
            // Legacy binding: an instance-level login of the same name exists,
            // so bind the user to it instead of creating a contained user.
            log::info!("binding user {} to existing legacy login", username);
            format!("CREATE USER {u} FOR LOGIN {u}", u = quote_ident(username))
        };

        self.exec_tolerating_existing(&statement, username).await
    }

    async fn ensure_roles(&mut self, username: &str, roles: &[String]) -> Result<(), StatementError> {
        if roles.is_empty() {
            return Ok(());
        }

        let current: HashSet<String> = self
            .session
            .query_strings(USER_ROLES, &[username])
            .await?
            .into_iter()
            .collect();

        // Additive only: roles the user already holds are never revoked.
        for role in roles {
            if current.contains(role) {
                continue;
            }
            let statement = format!(
                "ALTER ROLE {} ADD MEMBER {}",
                quote_ident(role),
                quote_ident(username)
            );
            self.exec_tolerating_existing(&statement, username).await?;
            log::info!("granted role {} to {}", role, username);
        }

        Ok(())
    }

    async fn grant_execute(&mut self, username: &str) -> Result<(), StatementError> {
        let statement = format!("GRANT EXECUTE TO {}", quote_ident(username));
        self.exec_tolerating_existing(&statement, username).await
    }

    /// Execute a create-phase statement, treating an already-exists failure as
    /// success. Covers the race where a concurrent create wins between our
    /// catalog check and the statement.
    async fn exec_tolerating_existing(
        &mut self,
        statement: &str,
        username: &str,
    ) -> Result<(), StatementError> {
        match self.session.exec(statement, &[]).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                log::debug!("statement for {} hit existing state, continuing: {}", username, err);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}
