#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;

use authgate::configuration::AuthSettings;
use authgate::startup::run;
use authgate::store::MemoryStore;
use serde_json::{json, Value};

pub const JWT_SECRET: &str = "test-secret-key-at-least-32-characters-long";
pub const WEBHOOK_API_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";

pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
}

pub fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let store = Arc::new(MemoryStore::new());
    let settings = AuthSettings {
        jwt_secret: JWT_SECRET.to_string(),
        webhook_api_key: WEBHOOK_API_KEY.to_string(),
    };

    let server = run(listener, store.clone(), settings).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        store,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Register through the API and return the created user body
    pub async fn register(&self, email: &str, password: &str) -> Value {
        let response = self
            .client
            .post(self.url("/users"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(201, response.status().as_u16(), "registration should succeed");
        response.json().await.expect("Failed to parse response")
    }

    pub async fn post_login(&self, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url("/login"))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Log in and return the response body
    pub async fn login(&self, email: &str, password: &str) -> Value {
        let response = self
            .post_login(&json!({ "email": email, "password": password }))
            .await;
        assert_eq!(200, response.status().as_u16(), "login should succeed");
        response.json().await.expect("Failed to parse response")
    }

    pub async fn post_with_authorization(&self, path: &str, authorization: &str) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header("Authorization", authorization)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_webhook(&self, authorization: Option<&str>, body: String) -> reqwest::Response {
        let mut request = self
            .client
            .post(self.url("/webhooks"))
            .header("Content-Type", "application/json")
            .body(body);
        if let Some(value) = authorization {
            request = request.header("Authorization", value);
        }
        request.send().await.expect("Failed to execute request.")
    }
}
