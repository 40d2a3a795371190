use bhvr_client::view::render_api_response;
use bhvr_client::{ApiClientError, HelloClient};
use bhvr_infra::ClientConfig;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let app = bhvr_api::app::build_app();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A port that was free a moment ago and has nothing listening now.
async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

#[tokio::test]
async fn send_request_returns_the_acknowledgement() {
    let srv = TestServer::spawn().await;
    let client = HelloClient::new(format!("{}/", srv.base_url));

    let resp = client.send_request().await.expect("hello should succeed");

    assert_eq!(resp.message, "Hello BHVR!");
    assert!(resp.success);
    assert_eq!(render_api_response(&resp), "Message: Hello BHVR!\nSuccess: true");
}

#[tokio::test]
async fn client_built_from_config_uses_server_url() {
    let srv = TestServer::spawn().await;
    let url = srv.base_url.clone();
    let config = ClientConfig::from_lookup(|key| match key {
        "BHVR_SERVER_URL" => Some(url.clone()),
        _ => None,
    })
    .unwrap();

    let client = HelloClient::from_config(&config);

    assert_eq!(client.base_url(), srv.base_url);
    assert!(client.fetch().await.is_ok());
}

#[tokio::test]
async fn unreachable_server_yields_nothing() {
    let client = HelloClient::new(dead_url().await);

    assert!(matches!(client.fetch().await, Err(ApiClientError::Network(_))));
    assert!(client.send_request().await.is_none());
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let srv = TestServer::spawn().await;
    let client = HelloClient::new(format!("{}/missing", srv.base_url));

    assert!(matches!(client.fetch().await, Err(ApiClientError::Status(404))));
}
