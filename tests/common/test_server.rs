use std::path::Path;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde_json::Value;
use tempfile::TempDir;
use tokio::task::JoinHandle;

use shopfront::auth::SessionManager;
use shopfront::server::{AppState, create_router};
use shopfront::store::{SqliteStore, Store};

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestServer {
    pub temp_dir: TempDir,
    pub base_url: String,
    pub client: Client,
    server_task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");

        let store = SqliteStore::new(temp_dir.path().join("shopfront.db")).expect("open store");
        store.initialize().expect("initialize schema");

        let sessions = SessionManager::new(TEST_SECRET, 3600).expect("session manager");
        let state = Arc::new(AppState::new(Arc::new(store), temp_dir.path(), sessions));
        let app = create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        let base_url = format!("http://127.0.0.1:{port}");

        let server_task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        let client = Client::new();
        Self::wait_for_ready(&client, &base_url).await;

        Self {
            temp_dir,
            base_url,
            client,
            server_task,
        }
    }

    async fn wait_for_ready(client: &Client, base_url: &str) {
        for _ in 0..50 {
            if client
                .get(format!("{base_url}/health"))
                .send()
                .await
                .is_ok()
            {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
        panic!("Server did not become ready");
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub async fn register(&self, username: &str, password: &str) -> Response {
        self.client
            .post(self.url("/api/user/"))
            .basic_auth(username, Some(password))
            .send()
            .await
            .expect("register request")
    }

    /// Registers a user and returns its id.
    pub async fn create_user(&self, username: &str, password: &str) -> i64 {
        let resp = self.register(username, password).await;
        assert_eq!(resp.status(), 201, "register {username}");
        let body: Value = resp.json().await.expect("parse user");
        body["id"].as_i64().expect("user id")
    }

    pub async fn login(&self, username: &str, password: &str) -> Response {
        self.client
            .post(self.url("/api/user/login/"))
            .basic_auth(username, Some(password))
            .send()
            .await
            .expect("login request")
    }

    /// Logs in and returns the session token.
    pub async fn session_token(&self, username: &str, password: &str) -> String {
        let resp = self.login(username, password).await;
        assert_eq!(resp.status(), 200, "login {username}");
        resp.headers()
            .get("x-session-token")
            .expect("session token header")
            .to_str()
            .expect("ascii token")
            .to_string()
    }

    pub async fn post_item(&self, data: &str, image: Option<(&str, &[u8])>) -> Response {
        let mut form = Form::new().text("data", data.to_string());
        if let Some((file_name, bytes)) = image {
            form = form.part("image", Part::bytes(bytes.to_vec()).file_name(file_name.to_string()));
        }

        self.client
            .post(self.url("/api/item/"))
            .multipart(form)
            .send()
            .await
            .expect("create item request")
    }

    /// Creates an item from JSON metadata and returns the response body.
    pub async fn create_item(&self, data: Value) -> Value {
        let resp = self.post_item(&data.to_string(), None).await;
        assert_eq!(resp.status(), 201, "create item {data}");
        resp.json().await.expect("parse item")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server_task.abort();
    }
}
