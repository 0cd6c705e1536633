//! Notification delivery

use std::time::Duration;

use async_trait::async_trait;

use super::message::{with_details, ExpiryAlert};

/// Outbound notification channel
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a certificate expiry alert
    async fn send_alert(&self, alert: &ExpiryAlert) -> Result<(), NotifierError>;

    /// Deliver free-form text, e.g. a heartbeat
    async fn send_message(
        &self,
        text: &str,
        details: Option<&serde_json::Value>,
    ) -> Result<(), NotifierError>;
}

/// Notifier posting `{"text": ...}` to a Slack-compatible webhook
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    /// Create a notifier whose requests are bounded by `timeout`
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifierError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifierError::Webhook(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send webhook notification
    async fn post_text(&self, text: &str) -> Result<(), NotifierError> {
        let payload = serde_json::json!({ "text": text });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifierError::Webhook(format!("Failed to send webhook: {}", e)))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(url = %self.url, "Webhook notification sent");
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_alert(&self, alert: &ExpiryAlert) -> Result<(), NotifierError> {
        self.post_text(&alert.text()).await
    }

    async fn send_message(
        &self,
        text: &str,
        details: Option<&serde_json::Value>,
    ) -> Result<(), NotifierError> {
        self.post_text(&with_details(text, details)).await
    }
}

/// Notifier errors
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("Webhook error: {0}")]
    Webhook(String),

    #[error("Webhook returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Notifier that records what it was asked to send
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    pub alerts: parking_lot::Mutex<Vec<ExpiryAlert>>,
    pub messages: parking_lot::Mutex<Vec<String>>,
    pub fail: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.lock().len()
    }

    fn check(&self) -> Result<(), NotifierError> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            Err(NotifierError::Status {
                status: 500,
                body: "unavailable".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_alert(&self, alert: &ExpiryAlert) -> Result<(), NotifierError> {
        self.check()?;
        self.alerts.lock().push(alert.clone());
        Ok(())
    }

    async fn send_message(
        &self,
        text: &str,
        details: Option<&serde_json::Value>,
    ) -> Result<(), NotifierError> {
        self.check()?;
        self.messages.lock().push(with_details(text, details));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use chrono::{TimeZone, Utc};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tokio::net::TcpListener;

    type Received = Arc<Mutex<Vec<serde_json::Value>>>;

    /// Start a local webhook receiver answering with `status`
    async fn spawn_receiver(status: StatusCode) -> (String, Received) {
        let received: Received = Arc::new(Mutex::new(Vec::new()));

        let app = Router::new()
            .route(
                "/hook",
                post(
                    move |State(received): State<Received>, Json(body): Json<serde_json::Value>| async move {
                        received.lock().push(body);
                        status
                    },
                ),
            )
            .with_state(Arc::clone(&received));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/hook", addr), received)
    }

    fn sample_alert() -> ExpiryAlert {
        ExpiryAlert {
            domain: "example.com".to_string(),
            days_remaining: 5,
            not_after: Utc.with_ymd_and_hms(2026, 10, 24, 12, 0, 0).unwrap(),
            threshold: 7,
            expired: false,
        }
    }

    #[tokio::test]
    async fn test_send_alert_posts_text_payload() {
        let (url, received) = spawn_receiver(StatusCode::OK).await;
        let notifier = WebhookNotifier::new(url, Duration::from_secs(5)).unwrap();

        notifier.send_alert(&sample_alert()).await.unwrap();

        let bodies = received.lock();
        assert_eq!(bodies.len(), 1);
        let text = bodies[0]["text"].as_str().unwrap();
        assert!(text.contains("*example.com*"));
        assert_eq!(bodies[0].as_object().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_non_200_status_is_failure() {
        let (url, received) = spawn_receiver(StatusCode::ACCEPTED).await;
        let notifier = WebhookNotifier::new(url, Duration::from_secs(5)).unwrap();

        let err = notifier.send_alert(&sample_alert()).await.unwrap_err();
        assert!(matches!(err, NotifierError::Status { status: 202, .. }));
        assert_eq!(received.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_send_message_with_details() {
        let (url, received) = spawn_receiver(StatusCode::OK).await;
        let notifier = WebhookNotifier::new(url, Duration::from_secs(5)).unwrap();

        let details = serde_json::json!({ "thresholds": [7, 14] });
        notifier
            .send_message("heartbeat", Some(&details))
            .await
            .unwrap();

        let bodies = received.lock();
        let text = bodies[0]["text"].as_str().unwrap();
        assert!(text.starts_with("heartbeat\n```"));
    }

    #[tokio::test]
    async fn test_unreachable_webhook_is_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let notifier =
            WebhookNotifier::new(format!("http://{}/hook", addr), Duration::from_secs(2)).unwrap();
        let err = notifier.send_message("ping", None).await.unwrap_err();
        assert!(matches!(err, NotifierError::Webhook(_)));
    }
}
