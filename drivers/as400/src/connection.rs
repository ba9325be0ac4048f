use crate::connection_string::ConnectionString;
use crate::error::to_error;
use crate::metadata::{is_binary, sql_type};
use async_trait::async_trait;
use odbc_api::{ConnectionOptions, Environment, ResultSetMetadata};
use sqlgate_driver::Error::IoError;
use sqlgate_driver::{Column, Result, Row, Value};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::sync::oneshot;
use tracing::debug;

const CLOSED: &str = "as400 connection is closed";

type Reply<T> = oneshot::Sender<Result<T>>;

/// Work for the thread that owns the ODBC handles of one connection.
///
/// The borrows of the driver traits guarantee requests arrive properly nested: a statement
/// is only created on an open connection and a cursor only read while its statement is open.
enum Request {
    CreateStatement(Reply<()>),
    ExecuteQuery {
        sql: String,
        query_timeout: Option<usize>,
        reply: Reply<Vec<Column>>,
    },
    Next(Reply<Option<Row>>),
    CloseCursor(Reply<()>),
    CloseStatement(Reply<()>),
    Close(Reply<()>),
}

impl Request {
    fn reject(self, open: &str) {
        let error = IoError(format!("request is not valid while a {open} is open"));
        match self {
            Request::CreateStatement(reply)
            | Request::CloseCursor(reply)
            | Request::CloseStatement(reply)
            | Request::Close(reply) => {
                let _ = reply.send(Err(error));
            }
            Request::ExecuteQuery { reply, .. } => {
                let _ = reply.send(Err(error));
            }
            Request::Next(reply) => {
                let _ = reply.send(Err(error));
            }
        }
    }
}

/// Sending half of the request channel, shared by a connection and its statement and cursor.
#[derive(Clone, Debug)]
struct Channel {
    requests: UnboundedSender<Request>,
}

impl Channel {
    async fn request<T, F>(&self, request: F) -> Result<T>
    where
        T: Send,
        F: FnOnce(Reply<T>) -> Request + Send,
    {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(request(reply))
            .map_err(|_| IoError(CLOSED.to_string()))?;
        response.await.map_err(|_| IoError(CLOSED.to_string()))?
    }
}

#[derive(Debug)]
pub(crate) struct Connection {
    channel: Channel,
}

impl Connection {
    /// Connect on a new thread that owns the ODBC environment and connection.
    pub(crate) async fn open(connection_string: ConnectionString) -> Result<Connection> {
        let (requests, receiver) = unbounded_channel();
        let (connected, response) = oneshot::channel();
        thread::Builder::new()
            .name("as400-connection".to_string())
            .spawn(move || serve(&connection_string, connected, receiver))?;
        response.await.map_err(|_| IoError(CLOSED.to_string()))??;

        Ok(Connection {
            channel: Channel { requests },
        })
    }
}

#[async_trait]
impl sqlgate_driver::Connection for Connection {
    async fn create_statement<'a>(
        &'a mut self,
    ) -> Result<Box<dyn sqlgate_driver::Statement + 'a>> {
        self.channel.request(Request::CreateStatement).await?;
        Ok(Box::new(Statement {
            channel: self.channel.clone(),
            query_timeout: None,
        }))
    }

    async fn close(&mut self) -> Result<()> {
        self.channel.request(Request::Close).await
    }
}

#[derive(Debug)]
pub(crate) struct Statement {
    channel: Channel,
    query_timeout: Option<usize>,
}

#[async_trait]
impl sqlgate_driver::Statement for Statement {
    fn set_query_timeout(&mut self, timeout: Duration) -> Result<()> {
        // ODBC query timeouts are whole seconds
        let seconds = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
        self.query_timeout = Some(usize::try_from(seconds)?);
        Ok(())
    }

    async fn execute_query<'a>(
        &'a mut self,
        sql: &str,
    ) -> Result<Box<dyn sqlgate_driver::Cursor + 'a>> {
        let sql = sql.to_string();
        let query_timeout = self.query_timeout;
        let columns = self
            .channel
            .request(|reply| Request::ExecuteQuery {
                sql,
                query_timeout,
                reply,
            })
            .await?;
        Ok(Box::new(Cursor {
            channel: self.channel.clone(),
            columns,
        }))
    }

    async fn close(&mut self) -> Result<()> {
        self.channel.request(Request::CloseStatement).await
    }
}

#[derive(Debug)]
pub(crate) struct Cursor {
    channel: Channel,
    columns: Vec<Column>,
}

#[async_trait]
impl sqlgate_driver::Cursor for Cursor {
    fn columns(&self) -> &[Column] {
        &self.columns
    }

    async fn next(&mut self) -> Result<Option<Row>> {
        self.channel.request(Request::Next).await
    }

    async fn close(&mut self) -> Result<()> {
        self.channel.request(Request::CloseCursor).await
    }
}

/// Body of the connection thread. ODBC handles are released when their scope ends, before
/// the matching close request is answered.
fn serve(
    connection_string: &ConnectionString,
    connected: Reply<()>,
    mut requests: UnboundedReceiver<Request>,
) {
    let environment = match Environment::new() {
        Ok(environment) => environment,
        Err(error) => {
            let _ = connected.send(Err(to_error(error)));
            return;
        }
    };
    let connection = match environment
        .connect_with_connection_string(connection_string.as_str(), ConnectionOptions::default())
    {
        Ok(connection) => connection,
        Err(error) => {
            let _ = connected.send(Err(to_error(error)));
            return;
        }
    };
    if connected.send(Ok(())).is_err() {
        debug!("Connection abandoned before it was established");
        return;
    }

    let close = serve_connection(&connection, &mut requests);
    drop(connection);
    if let Some(reply) = close {
        let _ = reply.send(Ok(()));
    }
}

fn serve_connection(
    connection: &odbc_api::Connection<'_>,
    requests: &mut UnboundedReceiver<Request>,
) -> Option<Reply<()>> {
    while let Some(request) = requests.blocking_recv() {
        match request {
            Request::CreateStatement(reply) => {
                let _ = reply.send(Ok(()));
                if let Some(reply) = serve_statement(connection, requests) {
                    let _ = reply.send(Ok(()));
                }
            }
            Request::Close(reply) => return Some(reply),
            request => request.reject("connection"),
        }
    }
    None
}

fn serve_statement(
    connection: &odbc_api::Connection<'_>,
    requests: &mut UnboundedReceiver<Request>,
) -> Option<Reply<()>> {
    while let Some(request) = requests.blocking_recv() {
        match request {
            Request::ExecuteQuery {
                sql,
                query_timeout,
                reply,
            } => match connection.execute(&sql, (), query_timeout) {
                Ok(Some(mut cursor)) => {
                    let columns = match result_columns(&mut cursor) {
                        Ok(columns) => columns,
                        Err(error) => {
                            let _ = reply.send(Err(error));
                            continue;
                        }
                    };
                    let binary = columns
                        .iter()
                        .map(|column| is_binary(column.sql_type()))
                        .collect::<Vec<_>>();
                    let _ = reply.send(Ok(columns));
                    let mut buffer = Vec::new();
                    let close =
                        serve_cursor(requests, || next_row(&mut cursor, &binary, &mut buffer));
                    drop(cursor);
                    if let Some(reply) = close {
                        let _ = reply.send(Ok(()));
                    }
                }
                Ok(None) => {
                    // The statement produced no result set
                    let _ = reply.send(Ok(Vec::new()));
                    if let Some(reply) = serve_cursor(requests, || Ok(None)) {
                        let _ = reply.send(Ok(()));
                    }
                }
                Err(error) => {
                    let _ = reply.send(Err(to_error(error)));
                }
            },
            Request::CloseStatement(reply) => return Some(reply),
            request => request.reject("statement"),
        }
    }
    None
}

fn serve_cursor<F>(requests: &mut UnboundedReceiver<Request>, mut next: F) -> Option<Reply<()>>
where
    F: FnMut() -> Result<Option<Row>>,
{
    while let Some(request) = requests.blocking_recv() {
        match request {
            Request::Next(reply) => {
                let _ = reply.send(next());
            }
            Request::CloseCursor(reply) => return Some(reply),
            request => request.reject("cursor"),
        }
    }
    None
}

fn result_columns<C: ResultSetMetadata>(cursor: &mut C) -> Result<Vec<Column>> {
    let count = cursor.num_result_cols().map_err(to_error)?;
    (1..=count)
        .map(|index| -> Result<Column> {
            let index = u16::try_from(index)?;
            let name = cursor.col_name(index).map_err(to_error)?;
            let data_type = cursor.col_data_type(index).map_err(to_error)?;
            Ok(Column::new(name, sql_type(data_type)))
        })
        .collect()
}

/// Fetch the next row; binary columns as bytes, all others as text converted by the
/// column type later.
fn next_row<C: odbc_api::Cursor>(
    cursor: &mut C,
    binary: &[bool],
    buffer: &mut Vec<u8>,
) -> Result<Option<Row>> {
    let Some(mut row) = cursor.next_row().map_err(to_error)? else {
        return Ok(None);
    };

    let mut values = Vec::with_capacity(binary.len());
    for (index, is_binary) in binary.iter().enumerate() {
        let column = u16::try_from(index + 1)?;
        buffer.clear();
        let present = if *is_binary {
            row.get_binary(column, buffer)
        } else {
            row.get_text(column, buffer)
        }
        .map_err(to_error)?;

        let value = match (present, *is_binary) {
            (false, _) => Value::Null,
            (true, true) => Value::Bytes(buffer.clone()),
            (true, false) => Value::String(String::from_utf8(buffer.clone())?),
        };
        values.push(value);
    }
    Ok(Some(values))
}

#[cfg(test)]
mod test {
    use super::*;
    use sqlgate_driver::Statement as _;

    #[test]
    fn test_query_timeout_rounds_up_to_seconds() -> Result<()> {
        let (requests, _receiver) = unbounded_channel();
        let mut statement = Statement {
            channel: Channel { requests },
            query_timeout: None,
        };

        statement.set_query_timeout(Duration::from_millis(1_500))?;
        assert_eq!(statement.query_timeout, Some(2));
        statement.set_query_timeout(Duration::from_secs(30))?;
        assert_eq!(statement.query_timeout, Some(30));
        Ok(())
    }

    #[tokio::test]
    async fn test_request_after_thread_exit() {
        let (requests, receiver) = unbounded_channel();
        drop(receiver);
        let channel = Channel { requests };

        let error = channel
            .request(Request::Close)
            .await
            .expect_err("closed channel");

        assert_eq!(error.to_string(), CLOSED);
    }

    #[tokio::test]
    async fn test_requests_served_in_order() -> Result<()> {
        let (requests, mut receiver) = unbounded_channel();
        let server = thread::spawn(move || {
            let mut rows = vec![vec![Value::I32(1)]].into_iter();
            serve_cursor(&mut receiver, || Ok(rows.next()))
        });
        let channel = Channel { requests };

        assert_eq!(
            channel.request(Request::Next).await?,
            Some(vec![Value::I32(1)])
        );
        assert_eq!(channel.request(Request::Next).await?, None);
        let error = channel
            .request(Request::CreateStatement)
            .await
            .expect_err("statement while a cursor is open");
        assert_eq!(
            error.to_string(),
            "request is not valid while a cursor is open"
        );

        let (reply, response) = oneshot::channel();
        let _ = channel.requests.send(Request::CloseCursor(reply));
        let close = server.join().expect("cursor thread");
        assert!(close.is_some());
        drop(response);
        Ok(())
    }
}
