// ABOUTME: Database module exports
// ABOUTME: Contains the session abstraction and the tiberius-backed implementation

pub mod session;
pub mod sqlserver;

pub use session::{ErrorKind, Session, StatementError};
pub use sqlserver::SqlServerSession;
