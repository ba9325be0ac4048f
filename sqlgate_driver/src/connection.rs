use crate::error::Result;
use crate::{Column, Value};
use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;

/// A single row of a query result, one value per column
pub type Row = Vec<Value>;

/// Connection to a database
#[async_trait]
pub trait Connection: Debug + Send {
    /// Create a statement; the statement borrows the connection for its lifetime.
    async fn create_statement<'a>(&'a mut self) -> Result<Box<dyn Statement + 'a>>;

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A statement created from a [`Connection`]
#[async_trait]
pub trait Statement: Debug + Send {
    /// Bound the execution time of subsequent queries.
    ///
    /// # Errors
    /// * If the driver rejects the timeout
    fn set_query_timeout(&mut self, timeout: Duration) -> Result<()>;

    /// Execute a single query; the cursor borrows the statement for its lifetime.
    async fn execute_query<'a>(&'a mut self, sql: &str) -> Result<Box<dyn Cursor + 'a>>;

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Cursor over the rows of a query result
#[async_trait]
pub trait Cursor: Debug + Send {
    fn columns(&self) -> &[Column];
    async fn next(&mut self) -> Result<Option<Row>>;

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// In-memory cursor
#[derive(Clone, Debug, Default)]
pub struct MemoryCursor {
    columns: Vec<Column>,
    row_index: usize,
    rows: Vec<Row>,
}

impl MemoryCursor {
    #[must_use]
    pub fn new(columns: Vec<Column>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            row_index: 0,
            rows,
        }
    }
}

#[async_trait]
impl Cursor for MemoryCursor {
    fn columns(&self) -> &[Column] {
        &self.columns
    }

    async fn next(&mut self) -> Result<Option<Row>> {
        if self.row_index >= self.rows.len() {
            return Ok(None);
        }
        let row = self.rows[self.row_index].clone();
        self.row_index += 1;
        Ok(Some(row))
    }
}

type MockCloseFn = Box<dyn FnMut() -> Result<()> + Send + Sync>;
type MockCreateStatementFn = Box<dyn FnMut() -> Result<MockStatement> + Send + Sync>;
type MockTimeoutFn = Box<dyn FnMut(Duration) -> Result<()> + Send + Sync>;
type MockExecuteQueryFn = Box<dyn FnMut(&str) -> Result<Box<dyn Cursor>> + Send + Sync>;
type MockNextFn = Box<dyn FnMut() -> Result<Option<Row>> + Send + Sync>;

/// Builder for setting a close expectation on a mock.
pub struct MockCloseExpectation<'a> {
    close_fn: &'a mut Option<MockCloseFn>,
}

impl MockCloseExpectation<'_> {
    /// Set the closure to call when the expectation is matched.
    pub fn returning<F>(self, f: F)
    where
        F: FnMut() -> Result<()> + Send + Sync + 'static,
    {
        *self.close_fn = Some(Box::new(f));
    }
}

/// A mock implementation of [`Connection`] for testing.
///
/// Supports setting expectations via `expect_*` methods with `.returning()` closures.
#[derive(Default)]
pub struct MockConnection {
    create_statement_fn: Option<MockCreateStatementFn>,
    close_fn: Option<MockCloseFn>,
}

impl Debug for MockConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockConnection").finish()
    }
}

/// Builder for setting a create statement expectation on [`MockConnection`].
pub struct MockCreateStatementExpectation<'a> {
    mock: &'a mut MockConnection,
}

impl MockCreateStatementExpectation<'_> {
    /// Set the closure to call when the expectation is matched.
    pub fn returning<F>(self, f: F)
    where
        F: FnMut() -> Result<MockStatement> + Send + Sync + 'static,
    {
        self.mock.create_statement_fn = Some(Box::new(f));
    }
}

impl MockConnection {
    /// Create a new mock with no expectations set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an expectation for [`Connection::create_statement`].
    pub fn expect_create_statement(&mut self) -> MockCreateStatementExpectation<'_> {
        MockCreateStatementExpectation { mock: self }
    }

    /// Set an expectation for [`Connection::close`].
    pub fn expect_close(&mut self) -> MockCloseExpectation<'_> {
        MockCloseExpectation {
            close_fn: &mut self.close_fn,
        }
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn create_statement<'a>(&'a mut self) -> Result<Box<dyn Statement + 'a>> {
        let f = self
            .create_statement_fn
            .as_mut()
            .expect("MockConnection: create_statement called without expectation");
        let statement = f()?;
        Ok(Box::new(statement))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(f) = self.close_fn.as_mut() {
            f()
        } else {
            Ok(())
        }
    }
}

/// A mock implementation of [`Statement`] for testing.
#[derive(Default)]
pub struct MockStatement {
    set_query_timeout_fn: Option<MockTimeoutFn>,
    execute_query_fn: Option<MockExecuteQueryFn>,
    close_fn: Option<MockCloseFn>,
}

impl Debug for MockStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStatement").finish()
    }
}

/// Builder for setting a query timeout expectation on [`MockStatement`].
pub struct MockSetQueryTimeoutExpectation<'a> {
    mock: &'a mut MockStatement,
}

impl MockSetQueryTimeoutExpectation<'_> {
    /// Set the closure to call when the expectation is matched.
    pub fn returning<F>(self, f: F)
    where
        F: FnMut(Duration) -> Result<()> + Send + Sync + 'static,
    {
        self.mock.set_query_timeout_fn = Some(Box::new(f));
    }
}

/// Builder for setting an execute query expectation on [`MockStatement`].
pub struct MockExecuteQueryExpectation<'a> {
    mock: &'a mut MockStatement,
}

impl MockExecuteQueryExpectation<'_> {
    /// Set the closure to call when the expectation is matched.
    pub fn returning<F>(self, f: F)
    where
        F: FnMut(&str) -> Result<Box<dyn Cursor>> + Send + Sync + 'static,
    {
        self.mock.execute_query_fn = Some(Box::new(f));
    }
}

impl MockStatement {
    /// Create a new mock with no expectations set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an expectation for [`Statement::set_query_timeout`].
    pub fn expect_set_query_timeout(&mut self) -> MockSetQueryTimeoutExpectation<'_> {
        MockSetQueryTimeoutExpectation { mock: self }
    }

    /// Set an expectation for [`Statement::execute_query`].
    pub fn expect_execute_query(&mut self) -> MockExecuteQueryExpectation<'_> {
        MockExecuteQueryExpectation { mock: self }
    }

    /// Set an expectation for [`Statement::close`].
    pub fn expect_close(&mut self) -> MockCloseExpectation<'_> {
        MockCloseExpectation {
            close_fn: &mut self.close_fn,
        }
    }
}

#[async_trait]
impl Statement for MockStatement {
    fn set_query_timeout(&mut self, timeout: Duration) -> Result<()> {
        let f = self
            .set_query_timeout_fn
            .as_mut()
            .expect("MockStatement: set_query_timeout called without expectation");
        f(timeout)
    }

    async fn execute_query<'a>(&'a mut self, sql: &str) -> Result<Box<dyn Cursor + 'a>> {
        let f = self
            .execute_query_fn
            .as_mut()
            .expect("MockStatement: execute_query called without expectation");
        let cursor = f(sql)?;
        Ok(cursor)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(f) = self.close_fn.as_mut() {
            f()
        } else {
            Ok(())
        }
    }
}

/// A mock implementation of [`Cursor`] for testing.
pub struct MockCursor {
    columns: Vec<Column>,
    next_fn: Option<MockNextFn>,
    close_fn: Option<MockCloseFn>,
}

impl Debug for MockCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCursor")
            .field("columns", &self.columns)
            .finish()
    }
}

/// Builder for setting a next row expectation on [`MockCursor`].
pub struct MockNextExpectation<'a> {
    mock: &'a mut MockCursor,
}

impl MockNextExpectation<'_> {
    /// Set the closure to call when the expectation is matched.
    pub fn returning<F>(self, f: F)
    where
        F: FnMut() -> Result<Option<Row>> + Send + Sync + 'static,
    {
        self.mock.next_fn = Some(Box::new(f));
    }
}

impl MockCursor {
    /// Create a new mock reporting the given columns with no expectations set.
    #[must_use]
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            next_fn: None,
            close_fn: None,
        }
    }

    /// Set an expectation for [`Cursor::next`].
    pub fn expect_next(&mut self) -> MockNextExpectation<'_> {
        MockNextExpectation { mock: self }
    }

    /// Set an expectation for [`Cursor::close`].
    pub fn expect_close(&mut self) -> MockCloseExpectation<'_> {
        MockCloseExpectation {
            close_fn: &mut self.close_fn,
        }
    }
}

#[async_trait]
impl Cursor for MockCursor {
    fn columns(&self) -> &[Column] {
        &self.columns
    }

    async fn next(&mut self) -> Result<Option<Row>> {
        let f = self
            .next_fn
            .as_mut()
            .expect("MockCursor: next called without expectation");
        f()
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(f) = self.close_fn.as_mut() {
            f()
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Error, SqlType};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_memory_cursor_new() -> Result<()> {
        let columns = vec![Column::new("a", SqlType::VarChar)];
        let rows = vec![vec![Value::String("foo".to_string())]];

        let mut cursor = MemoryCursor::new(columns, rows);

        let column = cursor.columns().first().expect("no column");
        assert_eq!(column.name(), "a");

        let row = cursor.next().await?.expect("no row");
        let value = row.first().expect("no value");
        assert_eq!(value, &Value::String("foo".to_string()));
        assert!(cursor.next().await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_memory_cursor_default() -> Result<()> {
        let mut cursor = MemoryCursor::default();
        assert!(cursor.columns().is_empty());
        assert!(cursor.next().await?.is_none());
        cursor.close().await
    }

    #[tokio::test]
    async fn test_mock_chain() -> Result<()> {
        let closed = Arc::new(AtomicUsize::new(0));
        let mut connection = MockConnection::new();
        let statement_closed = closed.clone();
        connection.expect_create_statement().returning(move || {
            let mut statement = MockStatement::new();
            statement.expect_set_query_timeout().returning(|_| Ok(()));
            statement.expect_execute_query().returning(|sql| {
                let columns = vec![Column::new("SQL", SqlType::VarChar)];
                let rows = vec![vec![Value::from(sql)]];
                Ok(Box::new(MemoryCursor::new(columns, rows)))
            });
            let statement_closed = statement_closed.clone();
            statement.expect_close().returning(move || {
                statement_closed.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
            Ok(statement)
        });

        {
            let mut statement = connection.create_statement().await?;
            statement.set_query_timeout(Duration::from_secs(5))?;
            {
                let mut cursor = statement.execute_query("SELECT 1").await?;
                let row = cursor.next().await?.expect("no row");
                assert_eq!(row, vec![Value::from("SELECT 1")]);
            }
            statement.close().await?;
        }
        connection.close().await?;

        assert_eq!(closed.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_mock_cursor_failure() {
        let mut cursor = MockCursor::new(vec![Column::new("ID", SqlType::Integer)]);
        cursor
            .expect_next()
            .returning(|| Err(Error::IoError("connection reset".to_string())));
        cursor
            .expect_close()
            .returning(|| Err(Error::IoError("already closed".to_string())));

        assert_eq!(cursor.columns().len(), 1);
        assert!(cursor.next().await.is_err());
        assert!(cursor.close().await.is_err());
        assert!(format!("{cursor:?}").contains("MockCursor"));
    }
}
