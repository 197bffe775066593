//! Shared helpers for integration tests

#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;

use authgate::auth::CredentialService;
use authgate::configuration::{JwtSettings, PasswordSettings};
use authgate::startup::run;
use authgate::store::InMemoryAccountStore;
use serde_json::{json, Value};

pub const PASSWORD: &str = "P@ssw0rd1";

pub fn jwt_settings() -> JwtSettings {
    JwtSettings {
        secret: "integration-secret-key-at-least-32-bytes".to_string(),
        issuer: "authgate-test".to_string(),
        audience: "authgate-test-clients".to_string(),
    }
}

/// Lowest bcrypt cost, to keep the suite fast
pub fn password_settings() -> PasswordSettings {
    PasswordSettings { hash_cost: 4 }
}

pub fn credential_service() -> (CredentialService, InMemoryAccountStore) {
    let store = InMemoryAccountStore::new();
    let service =
        CredentialService::new(Arc::new(store.clone()), &jwt_settings(), &password_settings())
            .expect("Failed to build credential service");
    (service, store)
}

pub struct TestApp {
    pub address: String,
    pub store: InMemoryAccountStore,
    pub client: reqwest::Client,
}

pub fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let (service, store) = credential_service();
    let server = run(listener, service).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        store,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", &self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> reqwest::Response {
        self.post_json(
            "/auth/register",
            &json!({ "name": name, "email": email, "password": password }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.post_json("/auth/login", &json!({ "email": email, "password": password }))
            .await
    }

    pub async fn refresh(&self, access_token: &str, refresh_token: &str) -> reqwest::Response {
        self.post_json(
            "/auth/refresh",
            &json!({ "access_token": access_token, "refresh_token": refresh_token }),
        )
        .await
    }

    /// Register and log in, returning the login response body
    pub async fn signed_in(&self, email: &str) -> Value {
        assert_eq!(201, self.register("Test User", email, PASSWORD).await.status().as_u16());
        let response = self.login(email, PASSWORD).await;
        assert_eq!(200, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }
}

pub fn field<'a>(body: &'a Value, name: &str) -> &'a str {
    body.get(name)
        .and_then(Value::as_str)
        .unwrap_or_else(|| panic!("response has no string field {:?}: {}", name, body))
}
