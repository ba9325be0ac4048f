use jwt_simple::prelude::{Claims, Duration, HS256Key, MACLike};
use sqlgate_core::{
    AuthError, ConfigurationBuilder, ConnectionSpec, PROTOCOL, QueryExecutor, QueryRequest,
    QueryService, Response,
};
use sqlgate_driver::{
    Column, DriverManager, MemoryCursor, MockConnection, MockDriver, MockStatement, SqlType, Value,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use test_log::test;

const SECRET: &str = "an HS256 secret used only by these tests";

fn service(connects: Arc<AtomicUsize>) -> anyhow::Result<QueryService> {
    let configuration = ConfigurationBuilder::new()
        .with_env_prefix("SQLGATE_SERVICE_TEST")
        .with_auth_secret(SECRET)
        .build()?;

    let mut driver = MockDriver::new();
    driver.expect_identifier().returning(|| PROTOCOL);
    driver.expect_connect().returning(move |_, _| {
        connects.fetch_add(1, Ordering::SeqCst);
        let mut connection = MockConnection::new();
        connection.expect_create_statement().returning(|| {
            let mut statement = MockStatement::new();
            statement.expect_execute_query().returning(|_| {
                let columns = vec![Column::new("GREETING", SqlType::VarChar)];
                let rows = vec![vec![Value::from("hello")]];
                Ok(Box::new(MemoryCursor::new(columns, rows)))
            });
            Ok(statement)
        });
        Ok(Box::new(connection))
    });
    let driver_manager = DriverManager::new();
    driver_manager.add(Arc::new(driver))?;

    let executor = QueryExecutor::new(configuration.executor_config(), driver_manager);
    Ok(QueryService::new(configuration.auth_gate()?, executor))
}

fn bearer(subject: &str) -> anyhow::Result<String> {
    let key = HS256Key::from_bytes(SECRET.as_bytes());
    let claims = Claims::create(Duration::from_hours(1)).with_subject(subject);
    Ok(format!("Bearer {}", key.authenticate(claims)?))
}

fn request(sql: &str) -> QueryRequest {
    let connection = ConnectionSpec {
        host: "ibmi.example.com".to_string(),
        username: "QUSER".to_string(),
        password: "secret".to_string(),
        ..Default::default()
    };
    QueryRequest::new(connection, sql)
}

#[test(tokio::test)]
async fn test_authenticated_request() -> anyhow::Result<()> {
    let connects = Arc::new(AtomicUsize::new(0));
    let service = service(connects.clone())?;
    let authorization = bearer("alice")?;

    let response = service
        .handle(
            Some(authorization.as_str()),
            &request("SELECT 'hello' AS GREETING FROM SYSIBM.SYSDUMMY1"),
        )
        .await;

    assert_eq!(response.status_code(), 200);
    let Response::Completed(result) = response else {
        anyhow::bail!("expected a completed response");
    };
    assert!(result.is_success());
    assert_eq!(result.row_count(), 1);
    assert_eq!(serde_json::to_string(result.rows())?, r#"[{"GREETING":"hello"}]"#);
    assert_eq!(connects.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test(tokio::test)]
async fn test_missing_token_rejected() -> anyhow::Result<()> {
    let connects = Arc::new(AtomicUsize::new(0));
    let service = service(connects.clone())?;

    let response = service.handle(None, &request("SELECT 1")).await;

    assert_eq!(response, Response::Rejected(AuthError::MissingToken));
    assert_eq!(response.status_code(), 401);
    assert_eq!(connects.load(Ordering::SeqCst), 0);
    Ok(())
}

#[test(tokio::test)]
async fn test_invalid_token_rejected() -> anyhow::Result<()> {
    let connects = Arc::new(AtomicUsize::new(0));
    let service = service(connects.clone())?;

    let response = service
        .handle(Some("Bearer eyJhbGciOiJIUzI1NiJ9.e30.invalid"), &request("SELECT 1"))
        .await;

    assert_eq!(response, Response::Rejected(AuthError::InvalidToken));
    assert_eq!(response.status_code(), 401);
    assert_eq!(connects.load(Ordering::SeqCst), 0);
    Ok(())
}

#[test(tokio::test)]
async fn test_validation_failure_is_completed() -> anyhow::Result<()> {
    let connects = Arc::new(AtomicUsize::new(0));
    let service = service(connects.clone())?;
    let authorization = bearer("alice")?;

    let response = service
        .handle(Some(authorization.as_str()), &request("  "))
        .await;

    assert_eq!(response.status_code(), 500);
    let Response::Completed(result) = response else {
        anyhow::bail!("expected a completed response");
    };
    assert_eq!(result.error(), Some("SQL query cannot be empty"));
    assert_eq!(connects.load(Ordering::SeqCst), 0);
    Ok(())
}
