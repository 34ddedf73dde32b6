//! Spawns the application for integration tests, with the REST store pointed at a mock server.

use std::{net::SocketAddr, sync::OnceLock};

use anyhow::Result;
use reqwest::{header::CONTENT_TYPE, Client, Response};
use secrecy::SecretString;
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};
use waitlist::{
    config::{AppConfig, NetConfig, RestConfig, StoreConfig},
    App,
};
use wiremock::{
    matchers::{body_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const TEST_SERVICE_KEY: &str = "test-service-role-key";
pub const STORE_TABLE_PATH: &str = "/rest/v1/email_submissions";

pub struct TestApp {
    pub addr: SocketAddr,
    pub http_client: Client,
    pub store_server: MockServer,
}

/// Logs are only printed when `TEST_LOG` is set, they would drown the test output otherwise.
fn init_test_subscriber() {
    static SUBSCRIBER: OnceLock<()> = OnceLock::new();
    SUBSCRIBER.get_or_init(|| {
        if std::env::var("TEST_LOG").is_ok() {
            tracing_subscriber::fmt()
                .without_time()
                .with_span_events(FmtSpan::CLOSE)
                .with_target(false)
                .with_env_filter(EnvFilter::new("debug"))
                .compact()
                .init();
        }
    });
}

impl TestApp {
    /// Tries to spawn a separate task serving our app.
    /// Binding *port 0* will trigger an OS scan for an available port.
    pub async fn spawn() -> Result<Self> {
        init_test_subscriber();

        let store_server = MockServer::start().await;
        let config = AppConfig {
            net_config: NetConfig {
                host: [127, 0, 0, 1],
                app_port: 0,
            },
            store_config: StoreConfig::Rest(RestConfig {
                url: store_server.uri(),
                service_key: SecretString::from(TEST_SERVICE_KEY.to_string()),
            }),
        };

        let app = App::build_from_config(config).await?;
        let addr = app.listener.local_addr()?;
        info!("Listening on {addr}");

        tokio::spawn(waitlist::serve(app));

        Ok(TestApp {
            addr,
            http_client: Client::new(),
            store_server,
        })
    }

    pub fn submit_url(&self) -> String {
        format!("http://{}/submit-email", self.addr)
    }

    pub async fn post_json(&self, body: &Value) -> Result<Response> {
        let res = self
            .http_client
            .post(self.submit_url())
            .json(body)
            .send()
            .await?;
        Ok(res)
    }

    pub async fn post_form(&self, body: &str, headers: &[(&str, &str)]) -> Result<Response> {
        let mut req = self
            .http_client
            .post(self.submit_url())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body.to_string());
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        Ok(req.send().await?)
    }

    /// The store accepts exactly one insert of `email` from `ip_address` and hands the row back.
    pub async fn mock_store_insert_ok(&self, email: &str, ip_address: &str) {
        Mock::given(method("POST"))
            .and(path(STORE_TABLE_PATH))
            .and(body_json(json!({ "email": email, "ip_address": ip_address })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "7c4e8f2a-51a0-4a8e-9d0e-2f6b1c3d4e5f",
                "email": email,
                "ip_address": ip_address,
                "created_at": "2024-05-01T12:00:00+00:00",
            })))
            .up_to_n_times(1)
            .expect(1)
            .mount(&self.store_server)
            .await;
    }

    /// Every further insert of `email` violates the unique constraint.
    pub async fn mock_store_insert_duplicate(&self, email: &str) {
        Mock::given(method("POST"))
            .and(path(STORE_TABLE_PATH))
            .and(body_json_email(email))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "23505",
                "details": format!("Key (email)=({email}) already exists."),
                "hint": null,
                "message": "duplicate key value violates unique constraint \"email_submissions_email_key\"",
            })))
            .mount(&self.store_server)
            .await;
    }
}

/// Matches any insert of the given email, regardless of the client IP.
fn body_json_email(email: &str) -> EmailBodyMatcher {
    EmailBodyMatcher(email.to_string())
}

pub struct EmailBodyMatcher(String);

impl wiremock::Match for EmailBodyMatcher {
    fn matches(&self, request: &wiremock::Request) -> bool {
        serde_json::from_slice::<Value>(&request.body)
            .ok()
            .and_then(|body| body.get("email").and_then(Value::as_str).map(str::to_owned))
            .is_some_and(|email| email == self.0)
    }
}

pub async fn body_json_of(res: Response) -> Result<Value> {
    Ok(res.json().await?)
}
