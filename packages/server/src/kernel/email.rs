//! Notifier transports: a transactional-email HTTP API, and a log-only
//! fallback for environments without one.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use super::BaseNotifier;
use crate::config::EmailConfig;

/// Sends email by POSTing JSON to an HTTP email API with a bearer token.
pub struct HttpEmailNotifier {
    client: Client,
    api_url: String,
    api_key: String,
    from_address: String,
}

#[derive(Debug, Serialize)]
struct EmailMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

impl HttpEmailNotifier {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build email HTTP client")?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl BaseNotifier for HttpEmailNotifier {
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<()> {
        let message = EmailMessage {
            from: &self.from_address,
            to: address,
            subject,
            html: body,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&message)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Email API rejected message to {}: {} {}", address, status, body);
            anyhow::bail!("Email API error {}: {}", status, body);
        }

        info!("Email sent to {}: {}", address, subject);
        Ok(())
    }
}

/// Logs messages instead of sending them.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl BaseNotifier for LogNotifier {
    async fn send(&self, address: &str, subject: &str, _body: &str) -> Result<()> {
        info!(to = address, subject, "Email transport not configured, message logged only");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Captured = Arc<Mutex<Vec<(Option<String>, serde_json::Value)>>>;

    async fn spawn_api(status: StatusCode) -> (String, Captured) {
        let captured: Captured = Arc::default();
        let app = Router::new()
            .route(
                "/send",
                post(
                    move |State(captured): State<Captured>,
                          headers: HeaderMap,
                          Json(body): Json<serde_json::Value>| async move {
                        let auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        captured.lock().unwrap().push((auth, body));
                        status
                    },
                ),
            )
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/send", addr), captured)
    }

    fn config(api_url: String) -> EmailConfig {
        EmailConfig {
            api_url,
            api_key: "test-key".into(),
            from_address: "reminders@example.org".into(),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn posts_json_with_bearer_token() {
        let (url, captured) = spawn_api(StatusCode::OK).await;
        let notifier = HttpEmailNotifier::new(&config(url)).unwrap();

        notifier
            .send("ada@example.org", "Hello", "<p>Hi</p>")
            .await
            .unwrap();

        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 1);
        let (auth, body) = &captured[0];
        assert_eq!(auth.as_deref(), Some("Bearer test-key"));
        assert_eq!(body["to"], "ada@example.org");
        assert_eq!(body["from"], "reminders@example.org");
        assert_eq!(body["subject"], "Hello");
        assert_eq!(body["html"], "<p>Hi</p>");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let (url, _captured) = spawn_api(StatusCode::UNPROCESSABLE_ENTITY).await;
        let notifier = HttpEmailNotifier::new(&config(url)).unwrap();

        let err = notifier
            .send("ada@example.org", "Hello", "<p>Hi</p>")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("422"));
    }

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        assert!(LogNotifier.send("ada@example.org", "Hello", "body").await.is_ok());
    }
}
