// ABOUTME: SQL Server session management using tiberius
// ABOUTME: Maps driver errors into the statement error taxonomy

use tiberius::{AuthMethod, Client, Config};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::config::ServerSettings;
use crate::db::session::{Session, StatementError};

pub struct SqlServerSession {
    client: Client<Compat<TcpStream>>,
}

impl SqlServerSession {
    /// Connect a session scoped to the given database
    pub async fn connect(settings: &ServerSettings, database: &str) -> Result<Self, StatementError> {
        let mut config = Config::new();
        config.host(&settings.host);
        config.port(settings.port);
        config.database(database);
        config.authentication(AuthMethod::sql_server(&settings.username, &settings.password));

        if settings.trust_certificate {
            config.trust_cert();
        }

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| StatementError::ConnectionFailed(e.to_string()))?;

        tcp.set_nodelay(true)?;

        let client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(|e| StatementError::ConnectionFailed(e.to_string()))?;

        log::debug!("connected to {}:{} database {}", settings.host, settings.port, database);

        Ok(Self { client })
    }
}

fn map_error(err: tiberius::error::Error) -> StatementError {
    match err {
        tiberius::error::Error::Server(token) => StatementError::Server {
            code: token.code(),
            message: token.message().to_string(),
        },
        tiberius::error::Error::Io { message, .. } => StatementError::ConnectionFailed(message),
        other => StatementError::QueryFailed(other.to_string()),
    }
}

impl Session for SqlServerSession {
    async fn exec(&mut self, statement: &str, params: &[&str]) -> Result<(), StatementError> {
        let args: Vec<&dyn tiberius::ToSql> =
            params.iter().map(|p| p as &dyn tiberius::ToSql).collect();
        self.client
            .execute(statement, &args)
            .await
            .map_err(map_error)?;
        Ok(())
    }

    async fn query_strings(
        &mut self,
        statement: &str,
        params: &[&str],
    ) -> Result<Vec<String>, StatementError> {
        let args: Vec<&dyn tiberius::ToSql> =
            params.iter().map(|p| p as &dyn tiberius::ToSql).collect();
        let stream = self
            .client
            .query(statement, &args)
            .await
            .map_err(map_error)?;
        let rows = stream.into_first_result().await.map_err(map_error)?;

        Ok(rows
            .iter()
            .filter_map(|row| row.get::<&str, _>(0).map(|s| s.to_string()))
            .collect())
    }
}
