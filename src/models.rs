// ABOUTME: Request model for binding operations as supplied by a resource adapter
// ABOUTME: Validates usernames, passwords, and role lists before they reach the engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on the number of roles a single binding may request.
pub const MAX_ROLES: usize = 100;

#[derive(Error, Debug, PartialEq)]
pub enum RequestError {
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("password must not be empty")]
    EmptyPassword,
    #[error("too many roles: {0} (maximum {MAX_ROLES})")]
    TooManyRoles(usize),
    #[error("role name at position {0} is empty")]
    EmptyRole(usize),
}

/// A request to bind a username to a database with a set of roles.
///
/// The username identifies the binding; it is supplied by the caller and
/// treated as opaque. `database` overrides the engine's default target
/// database when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub database: Option<String>,
}

impl BindingRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.username.is_empty() {
            return Err(RequestError::EmptyUsername);
        }
        if self.password.is_empty() {
            return Err(RequestError::EmptyPassword);
        }
        if self.roles.len() > MAX_ROLES {
            return Err(RequestError::TooManyRoles(self.roles.len()));
        }
        if let Some(pos) = self.roles.iter().position(|r| r.is_empty()) {
            return Err(RequestError::EmptyRole(pos));
        }
        Ok(())
    }
}
