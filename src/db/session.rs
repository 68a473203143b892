// ABOUTME: Session abstraction over an open database connection
// ABOUTME: Defines the statement error taxonomy and idempotency classification

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatementError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// An error raised by the server itself. Display is the server's own
    /// message text so callers see the store's wording unchanged.
    #[error("{message}")]
    Server { code: u32, message: String },
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Classification of a statement failure for idempotency decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The principal, membership, or grant being created already exists.
    AlreadyExists,
    /// The principal being dropped or altered does not exist (or the caller
    /// lacks permission to see it, which the server reports identically).
    MissingPrincipal,
    Other,
}

// Server error codes for principal management:
//   15023  user, group, or role already exists in the database
//   15025  server principal already exists
//   15151  cannot drop/alter the principal, does not exist or no permission
const ALREADY_EXISTS_CODES: [u32; 2] = [15023, 15025];
const MISSING_PRINCIPAL_CODES: [u32; 1] = [15151];

impl StatementError {
    /// Classify this error, preferring the server error code and falling back
    /// to matching the message text. The fallback is a compatibility shim for
    /// stores and proxies that rewrite codes but keep the standard wording.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StatementError::Server { code, message } => {
                if ALREADY_EXISTS_CODES.contains(code) {
                    ErrorKind::AlreadyExists
                } else if MISSING_PRINCIPAL_CODES.contains(code) {
                    ErrorKind::MissingPrincipal
                } else {
                    classify_message(message)
                }
            }
            _ => ErrorKind::Other,
        }
    }
}

fn classify_message(message: &str) -> ErrorKind {
    if message.contains("already exists") {
        ErrorKind::AlreadyExists
    } else if message.contains("does not exist or you do not have permission") {
        ErrorKind::MissingPrincipal
    } else {
        ErrorKind::Other
    }
}

/// An open session against one target database, able to execute parameterized
/// statements. Catalog queries use `@P1`-style parameters; DDL statements
/// carry bracket-quoted identifiers since the server does not parameterize
/// identifiers.
pub trait Session {
    /// Execute a statement, discarding any result rows.
    fn exec(
        &mut self,
        statement: &str,
        params: &[&str],
    ) -> impl std::future::Future<Output = Result<(), StatementError>> + Send;

    /// Run a query and collect the first column of each row as a string.
    fn query_strings(
        &mut self,
        statement: &str,
        params: &[&str],
    ) -> impl std::future::Future<Output = Result<Vec<String>, StatementError>> + Send;
}
