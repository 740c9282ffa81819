#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use chartsheet_api::config::{AppConfig, StoreBackend};
use chartsheet_api::database::{DatabaseManager, MemoryStore, Store};
use chartsheet_api::{app, AppState};

pub const TEST_SECRET: &str = "chartsheet-test-secret";
pub const PASSWORD: &str = "secret123";

const BOUNDARY: &str = "chartsheet-test-boundary";

/// Router wired to a store, driven without a socket
pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn Store>,
    pub state: AppState,
}

/// Token and id handed back by register/login
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub email: String,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::in_memory(TEST_SECRET))
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(config: AppConfig, store: Arc<dyn Store>) -> Self {
        let state = AppState::new(config, store.clone()).expect("test config has a JWT secret");
        Self { router: app(state.clone()), store, state }
    }

    /// Router over the Postgres store at `DATABASE_URL`, migrated first.
    /// `None` when no database is configured, so callers can skip.
    pub async fn postgres() -> Result<Option<Self>> {
        let _ = dotenvy::dotenv();
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping Postgres suite");
            return Ok(None);
        };

        let mut config = AppConfig::in_memory(TEST_SECRET);
        config.database.backend = StoreBackend::Postgres;
        config.database.url = Some(url);
        config.database.max_connections = 2;
        config.database.run_migrations = true;

        let store = DatabaseManager::open_store(&config.database)
            .await
            .context("failed to open Postgres store")?;
        Ok(Some(Self::with_store(config, store)))
    }

    pub async fn send(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .with_context(|| format!("non-JSON body: {}", String::from_utf8_lossy(&bytes)))?
        };
        Ok((status, body))
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Register a user with valid profile fields and the shared test password
    pub async fn register(&self, username: &str, email: &str) -> Result<Session> {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({
                    "username": username,
                    "email": email,
                    "phone": "5551234567",
                    "password": PASSWORD,
                }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "register failed: {} {}", status, body);
        session(&body, email)
    }

    /// Register a user, then flip the admin flag directly in the store
    pub async fn register_admin(&self, username: &str, email: &str) -> Result<Session> {
        let session = self.register(username, email).await?;
        self.store.set_admin(email, true).await?;
        Ok(session)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(StatusCode, Value)> {
        self.post("/api/auth/login", None, json!({ "email": email, "password": password }))
            .await
    }

    pub async fn save_chart(&self, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.post("/api/charts/save", Some(token), body).await
    }

    /// POST a multipart upload; `file` is (filename, bytes) for the `file` field
    pub async fn upload(&self, file: Option<(&str, Vec<u8>)>) -> Result<(StatusCode, Value)> {
        let mut body = Vec::new();
        match file {
            Some((filename, bytes)) => {
                body.extend_from_slice(
                    format!(
                        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(&bytes);
                body.extend_from_slice(b"\r\n");
            }
            None => {
                body.extend_from_slice(
                    format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n").as_bytes(),
                );
            }
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/files/upload")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))?;
        self.send(request).await
    }
}

fn session(body: &Value, email: &str) -> Result<Session> {
    Ok(Session {
        token: body["token"].as_str().context("missing token")?.to_string(),
        user_id: body["userId"].as_str().context("missing userId")?.to_string(),
        email: email.to_string(),
    })
}

/// First worksheet built from JSON cells: strings, numbers and bools are
/// written, nulls are left blank.
pub fn workbook(rows: &[Vec<Value>]) -> Result<Vec<u8>> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();

    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let (r, c) = (r as u32, c as u16);
            match cell {
                Value::String(s) => {
                    sheet.write_string(r, c, s.as_str())?;
                }
                Value::Number(n) => {
                    sheet.write_number(r, c, n.as_f64().context("number out of range")?)?;
                }
                Value::Bool(b) => {
                    sheet.write_boolean(r, c, *b)?;
                }
                _ => {}
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// The real server binary on a free port with the in-memory store.
/// Killed when dropped.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let child = Command::new(env!("CARGO_BIN_EXE_chartsheet-api"))
            .env("CHARTSHEET_PORT", port.to_string())
            .env("SERVER_HOST", "127.0.0.1")
            .env("STORE_BACKEND", "memory")
            .env("JWT_SECRET", TEST_SECRET)
            .env("APP_ENV", "development")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn server binary")?;

        let server = Self { port, base_url, child };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        let url = format!("{}/health", self.base_url);
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
