use crate::error::Result;
use crate::materializer::{MAX_ROWS, materialize};
use crate::{ClassifiedError, ConnectionTarget, Principal, QueryRequest, QueryResult, RowRecord};
use sqlgate_driver::{Connection, Credentials, DriverManager, SqlError, Statement};
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};

/// Timeouts applied by the [`QueryExecutor`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExecutorConfig {
    connection_timeout: Duration,
    query_timeout: Duration,
}

impl ExecutorConfig {
    /// A zero duration leaves the corresponding step unbounded.
    #[must_use]
    pub fn new(connection_timeout: Duration, query_timeout: Duration) -> Self {
        Self {
            connection_timeout,
            query_timeout,
        }
    }

    #[must_use]
    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }

    #[must_use]
    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(30), Duration::ZERO)
    }
}

/// Runs each query on a connection opened for that request alone, using the endpoint and
/// credentials carried by the request.
#[derive(Clone, Debug)]
pub struct QueryExecutor {
    config: ExecutorConfig,
    driver_manager: DriverManager,
}

impl QueryExecutor {
    #[must_use]
    pub fn new(config: ExecutorConfig, driver_manager: DriverManager) -> Self {
        Self {
            config,
            driver_manager,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute the request; every failure is reported in the returned result.
    #[instrument(name = "execute", level = "info", skip_all, fields(subject = %principal))]
    pub async fn execute(&self, principal: &Principal, request: &QueryRequest) -> QueryResult {
        let start = Instant::now();
        info!(
            host = %request.connection.host,
            username = %request.connection.username,
            "Executing query for {principal}"
        );

        match self.run(request).await {
            Ok(rows) => {
                let result = QueryResult::success(rows, elapsed_millis(start));
                info!(
                    "Query returned {} rows in {} ms",
                    result.row_count(),
                    result.execution_time_ms()
                );
                result
            }
            Err(error) => {
                let error =
                    ClassifiedError::classify_redacted(&error, &request.connection.password);
                error!(kind = ?error.kind(), "Query failed: {}", error.error());
                QueryResult::failure(error, elapsed_millis(start))
            }
        }
    }

    async fn run(&self, request: &QueryRequest) -> Result<Vec<RowRecord>> {
        request.validate()?;

        let target = ConnectionTarget::from(&request.connection);
        let credentials = request.connection.credentials();
        let mut connection = self.connect(&target, &credentials).await?;

        let result = self.run_on_connection(connection.as_mut(), &request.sql).await;
        release("connection", connection.close().await);
        result
    }

    async fn connect(
        &self,
        target: &ConnectionTarget,
        credentials: &Credentials,
    ) -> Result<Box<dyn Connection>> {
        let target_string = target.to_string();
        let connect = self.driver_manager.connect(&target_string, credentials);
        let timeout = self.config.connection_timeout;
        if timeout.is_zero() {
            return Ok(connect.await?);
        }

        match tokio::time::timeout(timeout, connect).await {
            Ok(connection) => Ok(connection?),
            Err(_) => Err(SqlError::new(
                "08001",
                0,
                format!(
                    "Connection to {} timed out after {} ms",
                    target.address(),
                    timeout.as_millis()
                ),
            )
            .into()),
        }
    }

    async fn run_on_connection(
        &self,
        connection: &mut dyn Connection,
        sql: &str,
    ) -> Result<Vec<RowRecord>> {
        let mut statement = connection.create_statement().await?;
        let result = self.run_statement(statement.as_mut(), sql).await;
        release("statement", statement.close().await);
        result
    }

    async fn run_statement(
        &self,
        statement: &mut (dyn Statement + '_),
        sql: &str,
    ) -> Result<Vec<RowRecord>> {
        if !self.config.query_timeout.is_zero() {
            statement.set_query_timeout(self.config.query_timeout)?;
        }

        let mut cursor = statement.execute_query(sql).await?;
        let result = materialize(cursor.as_mut(), MAX_ROWS).await;
        release("cursor", cursor.close().await);
        result
    }
}

/// Close failures are logged and never replace the outcome of the query.
fn release(resource: &str, result: sqlgate_driver::Result<()>) {
    if let Err(error) = result {
        warn!("Failed to close {resource}: {error}");
    }
}

fn elapsed_millis(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_executor_config_default() {
        let config = ExecutorConfig::default();
        assert_eq!(config.connection_timeout(), Duration::from_secs(30));
        assert_eq!(config.query_timeout(), Duration::ZERO);
    }

    #[test]
    fn test_elapsed_millis() {
        let start = Instant::now();
        assert!(elapsed_millis(start) < 1_000);
    }

    #[test]
    fn test_release_ignores_failure() {
        release("cursor", Ok(()));
        release(
            "cursor",
            Err(sqlgate_driver::Error::IoError("closed".to_string())),
        );
    }
}
