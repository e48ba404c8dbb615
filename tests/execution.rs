//! End-to-end execution engine tests using wiremock to simulate a GraphQL
//! server.

use graphite_client::interceptor::{RequestInterceptor, ResponseInterceptor};
use graphite_client::{
    BackoffStrategy, Client, Error, Operation, RateLimiter, RawResponse, Result, RetryListener,
    RetryPolicy, TimeoutPhase, WireRequest,
};
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, PartialEq)]
struct NameData {
    name: String,
}

fn quick_backoff() -> BackoffStrategy {
    BackoffStrategy::fixed(Duration::from_millis(10))
}

async fn client_for(server: &MockServer) -> Client {
    Client::builder()
        .endpoint(format!("{}/graphql", server.uri()))
        .unwrap()
        .build()
        .unwrap()
}

#[derive(Clone, Default)]
struct RecordingListener {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingListener {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl RetryListener for RecordingListener {
    fn on_retry(&self, attempt: u32, _delay: Duration, _error: &Error) {
        self.events.lock().unwrap().push(format!("retry:{attempt}"));
    }

    fn on_success(&self, attempts_taken: u32) {
        self.events
            .lock()
            .unwrap()
            .push(format!("success:{attempts_taken}"));
    }

    fn on_exhausted(&self, retries: u32, _error: &Error) {
        self.events
            .lock()
            .unwrap()
            .push(format!("exhausted:{retries}"));
    }
}

#[tokio::test]
async fn test_successful_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"data": {"name": "John"}}"#),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let op = Operation::new("GetName", "query GetName { name }");
    let response = client.execute::<NameData>(&op).await.unwrap();

    assert!(response.has_data());
    assert!(!response.has_errors());
    assert_eq!(response.into_data().unwrap().name, "John");
}

#[tokio::test]
async fn test_wire_envelope_omits_empty_variables() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_json(serde_json::json!({
            "query": "query Ping { ping }",
            "operationName": "Ping"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data": {"ping": true}}"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let op = Operation::new("Ping", "query Ping { ping }");
    client.execute::<serde_json::Value>(&op).await.unwrap();
}

#[tokio::test]
async fn test_wire_envelope_carries_variables() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_json(serde_json::json!({
            "query": "query GetUser($id: ID!) { user(id: $id) { name } }",
            "operationName": "GetUser",
            "variables": {"id": "42"}
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"data": {"user": {"name": "John"}}}"#),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let op = Operation::new("GetUser", "query GetUser($id: ID!) { user(id: $id) { name } }")
        .variable("id", "42")
        .unwrap();
    client.execute::<serde_json::Value>(&op).await.unwrap();
}

#[tokio::test]
async fn test_partial_success_returns_both_sides() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"data": {"name": "John"}, "errors": [{"message": "partial failure"}]}"#,
        ))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let op = Operation::new("GetName", "query GetName { name }");
    let response = client.execute::<NameData>(&op).await.unwrap();

    assert!(response.has_data());
    assert!(response.has_errors());
    assert_eq!(response.data().unwrap().name, "John");

    let err = response.into_data().unwrap_err();
    assert!(err.to_string().contains("partial failure"));
    assert_eq!(err.graphql_errors().unwrap().len(), 1);
}

#[tokio::test]
async fn test_retry_on_5xx_then_success_notifies_listener() {
    let mock_server = MockServer::start().await;
    let attempt_count = Arc::new(AtomicUsize::new(0));
    let attempt_count_clone = attempt_count.clone();

    // First two requests fail with 500, third succeeds.
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(move |_req: &wiremock::Request| {
            let count = attempt_count_clone.fetch_add(1, Ordering::SeqCst);
            if count < 2 {
                ResponseTemplate::new(500).set_body_string("server error")
            } else {
                ResponseTemplate::new(200).set_body_string(r#"{"data": {"name": "John"}}"#)
            }
        })
        .mount(&mock_server)
        .await;

    let listener = RecordingListener::default();
    let client = Client::builder()
        .endpoint(format!("{}/graphql", mock_server.uri()))
        .unwrap()
        .retry_policy(RetryPolicy::on_server_errors(3, quick_backoff()))
        .retry_listener(Box::new(listener.clone()))
        .build()
        .unwrap();

    let op = Operation::new("GetName", "query GetName { name }");
    let response = client.execute::<NameData>(&op).await.unwrap();

    assert_eq!(response.into_data().unwrap().name, "John");
    assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
    // Two retry notifications, then one success carrying the total tries.
    assert_eq!(listener.events(), vec!["retry:1", "retry:2", "success:3"]);
}

#[tokio::test]
async fn test_retry_exhaustion_propagates_last_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(503).set_body_string("still down"))
        .expect(3) // initial try + 2 retries
        .mount(&mock_server)
        .await;

    let listener = RecordingListener::default();
    let client = Client::builder()
        .endpoint(format!("{}/graphql", mock_server.uri()))
        .unwrap()
        .retry_policy(RetryPolicy::on_server_errors(2, quick_backoff()))
        .retry_listener(Box::new(listener.clone()))
        .build()
        .unwrap();

    let op = Operation::new("GetName", "query GetName { name }");
    let err = client.execute::<NameData>(&op).await.unwrap_err();

    match &err {
        Error::Http {
            status,
            raw_response,
            ..
        } => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(raw_response, "still down");
        }
        other => panic!("expected HTTP error, got {other:?}"),
    }
    assert_eq!(listener.events(), vec!["retry:1", "retry:2", "exhausted:2"]);
}

#[tokio::test]
async fn test_4xx_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .endpoint(format!("{}/graphql", mock_server.uri()))
        .unwrap()
        .retry_policy(RetryPolicy::on_any_retryable(3, quick_backoff()))
        .build()
        .unwrap();

    let op = Operation::new("GetName", "query GetName { name }");
    let err = client.execute::<NameData>(&op).await.unwrap_err();

    assert!(matches!(err, Error::Http { status, .. } if status.as_u16() == 404));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn test_429_is_classified_with_header_hints() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "2")
                .insert_header("x-ratelimit-limit", "100")
                .insert_header("x-ratelimit-remaining", "0"),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let op = Operation::new("GetName", "query GetName { name }");
    let err = client.execute::<NameData>(&op).await.unwrap_err();

    match err {
        Error::RateLimited { info } => {
            assert_eq!(info.retry_after, Some(Duration::from_secs(2)));
            assert_eq!(info.limit, Some(100));
            assert_eq!(info.remaining, Some(0));
        }
        other => panic!("expected rate limit error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_local_rate_limit_denial_skips_the_wire() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data": {"name": "J"}}"#))
        .expect(1) // the denied call must never reach the server
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .endpoint(format!("{}/graphql", mock_server.uri()))
        .unwrap()
        .rate_limiter(RateLimiter::new(0.1, 1).unwrap())
        .retry_policy(RetryPolicy::on_any_retryable(3, quick_backoff()))
        .build()
        .unwrap();

    let op = Operation::new("GetName", "query GetName { name }");
    client.execute::<NameData>(&op).await.unwrap();

    let err = client.execute::<NameData>(&op).await.unwrap_err();
    match err {
        Error::RateLimited { info } => {
            // Local denial carries no server hints and is not retried.
            assert!(info.retry_after.is_none());
            assert!(info.reset_at.is_none());
        }
        other => panic!("expected rate limit error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_body_is_a_decode_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let op = Operation::new("GetName", "query GetName { name }");
    let err = client.execute::<NameData>(&op).await.unwrap_err();

    assert!(matches!(err, Error::DeserializationFailed { .. }));
}

#[tokio::test]
async fn test_request_timeout_is_phase_tagged() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"data": {"name": "slow"}}"#)
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .endpoint(format!("{}/graphql", mock_server.uri()))
        .unwrap()
        .request_timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let op = Operation::new("GetName", "query GetName { name }");
    let err = client.execute::<NameData>(&op).await.unwrap_err();

    match err {
        Error::Timeout { phase } => assert_eq!(phase, TimeoutPhase::Request),
        other => panic!("expected timeout, got {other:?}"),
    }
}

struct HeaderStamp;

impl RequestInterceptor for HeaderStamp {
    fn intercept(&self, mut request: WireRequest) -> Result<WireRequest> {
        request
            .headers
            .insert("x-stamp", "stamped".parse().expect("static header value"));
        Ok(request)
    }
}

#[tokio::test]
async fn test_request_interceptor_transforms_outgoing_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("x-stamp", "stamped"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data": {"name": "J"}}"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .endpoint(format!("{}/graphql", mock_server.uri()))
        .unwrap()
        .request_interceptor(Box::new(HeaderStamp))
        .build()
        .unwrap();

    let op = Operation::new("GetName", "query GetName { name }");
    client.execute::<NameData>(&op).await.unwrap();
}

struct BodyRewrite {
    order: Arc<Mutex<Vec<&'static str>>>,
    tag: &'static str,
    body: &'static str,
}

impl ResponseInterceptor for BodyRewrite {
    fn intercept(&self, mut response: RawResponse) -> Result<RawResponse> {
        self.order.lock().unwrap().push(self.tag);
        response.body = self.body.to_string();
        Ok(response)
    }
}

#[tokio::test]
async fn test_response_interceptors_run_in_registration_order() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data": {"name": "raw"}}"#))
        .mount(&mock_server)
        .await;

    let order = Arc::new(Mutex::new(Vec::new()));
    let client = Client::builder()
        .endpoint(format!("{}/graphql", mock_server.uri()))
        .unwrap()
        .response_interceptor(Box::new(BodyRewrite {
            order: order.clone(),
            tag: "first",
            body: r#"{"data": {"name": "first"}}"#,
        }))
        .response_interceptor(Box::new(BodyRewrite {
            order: order.clone(),
            tag: "second",
            body: r#"{"data": {"name": "second"}}"#,
        }))
        .build()
        .unwrap();

    let op = Operation::new("GetName", "query GetName { name }");
    let response = client.execute::<NameData>(&op).await.unwrap();

    // The last interceptor's transformation is what gets decoded.
    assert_eq!(response.into_data().unwrap().name, "second");
    assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
}

#[tokio::test]
async fn test_execute_after_close_fails_fast() {
    let mock_server = MockServer::start().await;
    let client = client_for(&mock_server).await;

    client.close();
    client.close(); // idempotent

    let op = Operation::new("GetName", "query GetName { name }");
    let err = client.execute::<NameData>(&op).await.unwrap_err();
    assert!(matches!(err, Error::TransportClosed));
}

struct ViewerQuery;

impl graphite_client::PreparedOperation for ViewerQuery {
    const NAME: &'static str = "Viewer";
    const DOCUMENT: &'static str = "query Viewer { viewer { name } }";
    type Response = ViewerData;
}

#[derive(Debug, Deserialize)]
struct ViewerData {
    viewer: NameData,
}

#[tokio::test]
async fn test_prepared_operation_execution() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_json(serde_json::json!({
            "query": "query Viewer { viewer { name } }",
            "operationName": "Viewer"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"data": {"viewer": {"name": "John"}}}"#),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).await;
    let response = client
        .execute_prepared::<ViewerQuery>(serde_json::Map::new())
        .await
        .unwrap();
    assert_eq!(response.into_data().unwrap().viewer.name, "John");
}
