use crate::{AuthError, AuthGate, QueryExecutor, QueryRequest, QueryResult};
use tracing::{info, warn};

/// Response to a query request
#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    /// Authentication failed; the query was never executed
    Rejected(AuthError),
    /// The query ran, successfully or not
    Completed(QueryResult),
}

impl Response {
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Response::Rejected(error) => error.status_code(),
            Response::Completed(result) => result.status_code(),
        }
    }
}

/// Authenticates each request and hands it to the executor.
#[derive(Debug)]
pub struct QueryService {
    gate: AuthGate,
    executor: QueryExecutor,
}

impl QueryService {
    #[must_use]
    pub fn new(gate: AuthGate, executor: QueryExecutor) -> Self {
        Self { gate, executor }
    }

    /// Handle a request given the value of its `Authorization` header.
    pub async fn handle(&self, authorization: Option<&str>, request: &QueryRequest) -> Response {
        let principal = match self.gate.authenticate(authorization) {
            Ok(principal) => principal,
            Err(error) => {
                warn!("Rejected query request: {error}");
                return Response::Rejected(error);
            }
        };

        info!("Received query request from {principal}");
        let result = self.executor.execute(&principal, request).await;
        if result.is_success() {
            info!(
                "Query for {principal} completed with {} rows",
                result.row_count()
            );
        } else {
            warn!("Query for {principal} failed");
        }
        Response::Completed(result)
    }
}
