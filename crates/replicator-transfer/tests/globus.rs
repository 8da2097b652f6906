//! GlobusClient against a scripted local server.

use replicator_testkit::{MockResponse, MockServer};
use replicator_transfer::{
    ActivationCode, GlobusClient, GlobusConfig, Poller, PollerConfig, RequestState, TaskId,
    TaskStatus, TransferData, TransferError, TransferRequest, TransferService, Transferer,
};

fn client(server: &MockServer) -> GlobusClient {
    let mut config = GlobusConfig::new("client-1", "refresh-1");
    config.auth_url = server.url().to_string();
    config.transfer_url = format!("{}/v0.10", server.url());
    GlobusClient::new(config).unwrap()
}

fn token(access_token: &str, expires_in: u64) -> MockResponse {
    MockResponse::json(
        200,
        format!(
            r#"{{"access_token":"{access_token}","expires_in":{expires_in},"resource_server":"transfer.api.globus.org"}}"#
        ),
    )
}

fn task(status: &str) -> MockResponse {
    MockResponse::json(200, format!(r#"{{"task_id":"t1","status":"{status}"}}"#))
}

#[tokio::test]
async fn test_access_token_is_cached() {
    let server = MockServer::start(vec![
        token("xfer-1", 3600),
        task("ACTIVE"),
        task("SUCCEEDED"),
    ])
    .await;
    let client = client(&server);

    let id = TaskId::from("t1");
    assert_eq!(client.get_task(&id).await.unwrap(), TaskStatus::Active);
    assert_eq!(client.get_task(&id).await.unwrap(), TaskStatus::Succeeded);

    assert_eq!(
        server.request_lines(),
        vec![
            "post /v2/oauth2/token http/1.1",
            "get /v0.10/task/t1 http/1.1",
            "get /v0.10/task/t1 http/1.1",
        ]
    );
    let requests = server.requests();
    assert!(requests[0].contains("grant_type=refresh_token"));
    assert!(requests[0].contains("refresh_token=refresh-1"));
    assert!(requests[0].contains("client_id=client-1"));
    assert!(requests[1].contains("authorization: bearer xfer-1"));
    assert!(requests[2].contains("authorization: bearer xfer-1"));
}

#[tokio::test]
async fn test_token_near_expiry_is_refreshed() {
    // 30 s of lifetime is inside the refresh margin, so every call refreshes.
    let server = MockServer::start(vec![
        token("xfer-1", 30),
        task("ACTIVE"),
        token("xfer-2", 30),
        task("ACTIVE"),
    ])
    .await;
    let client = client(&server);

    let id = TaskId::from("t1");
    client.get_task(&id).await.unwrap();
    client.get_task(&id).await.unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 4);
    assert!(requests[2].starts_with("post /v2/oauth2/token"));
    assert!(requests[3].contains("authorization: bearer xfer-2"));
}

#[tokio::test]
async fn test_refresh_rejected_is_auth_error() {
    let server =
        MockServer::start(vec![MockResponse::json(400, r#"{"error":"invalid_grant"}"#)]).await;
    let client = client(&server);

    let err = client.get_task(&TaskId::from("t1")).await.unwrap_err();
    assert!(matches!(err, TransferError::Auth(msg) if msg.contains("invalid_grant")));
}

#[tokio::test]
async fn test_unknown_task_is_task_not_found() {
    let server = MockServer::start(vec![
        token("xfer-1", 3600),
        MockResponse::json(404, r#"{"code":"ClientError.NotFound"}"#),
    ])
    .await;
    let client = client(&server);

    let err = client.get_task(&TaskId::from("gone")).await.unwrap_err();
    assert!(matches!(err, TransferError::TaskNotFound(id) if id == "gone"));
}

#[tokio::test]
async fn test_server_error_is_api_error() {
    let server = MockServer::start(vec![
        token("xfer-1", 3600),
        MockResponse::text(502, "bad gateway"),
    ])
    .await;
    let client = client(&server);

    let err = client.get_task(&TaskId::from("t1")).await.unwrap_err();
    assert!(matches!(
        err,
        TransferError::Api { status: 502, body } if body == "bad gateway"
    ));
}

#[tokio::test]
async fn test_autoactivate_and_submit() {
    let server = MockServer::start(vec![
        token("xfer-1", 3600),
        MockResponse::json(200, r#"{"code":"AlreadyActivated","message":"ok"}"#),
        MockResponse::json(200, r#"{"value":"sub-42"}"#),
        MockResponse::json(202, r#"{"code":"Accepted","task_id":"task-7"}"#),
    ])
    .await;
    let client = client(&server);

    let activation = client
        .autoactivate_endpoint(&"ep one".into(), 172800)
        .await
        .unwrap();
    assert_eq!(activation.code, ActivationCode::AlreadyActivated);

    let mut data = TransferData::new("src-ep".into(), "dst-ep".into(), "nightly");
    data.add_item("/~/a.h5", "/archive/a.h5", false);
    let task_id = client.submit_transfer(&data).await.unwrap();
    assert_eq!(task_id, TaskId::from("task-7"));

    let requests = server.requests();
    assert!(requests[1]
        .starts_with("post /v0.10/endpoint/ep%20one/autoactivate?if_expires_in=172800"));
    assert!(requests[2].starts_with("get /v0.10/submission_id"));
    assert!(requests[3].starts_with("post /v0.10/transfer"));
    assert!(requests[3].contains(r#""submission_id":"sub-42""#));
    assert!(requests[3].contains(r#""destination_path":"/archive/a.h5""#));
}

#[tokio::test]
async fn test_poller_marks_unknown_task_lost() {
    let server = MockServer::start(vec![
        token("xfer-1", 3600),
        task("SUCCEEDED"),
        MockResponse::json(404, r#"{"code":"ClientError.NotFound"}"#),
    ])
    .await;
    let poller = Poller::new(Transferer::new(client(&server)), PollerConfig::default());

    let mut requests = vec![
        TransferRequest::submitted("r1", "t1"),
        TransferRequest::submitted("r2", "t2"),
    ];
    let report = poller.poll_once(&mut requests).await;

    assert_eq!(report.polled, 2);
    assert_eq!(report.lost, 1);
    assert_eq!(requests[0].state, RequestState::Done);
    assert_eq!(requests[1].state, RequestState::Lost);
}
