use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde_json::json;

use crate::config::Config;

/// Outbound notifications: chat webhook pushes and SMTP email. Delivery is
/// best-effort; failures are logged and never surfaced to the caller, so a
/// flaky webhook cannot fail a lot creation.
pub struct Notifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
    mailer: Option<AsyncSmtpTransport<Tokio1Executor>>,
    smtp_from: String,
}

impl Notifier {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        let mailer = config.smtp_host.as_deref().map(|host| {
            let mut builder =
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                    .port(config.smtp_port);
            if let (Some(user), Some(password)) =
                (config.smtp_user.clone(), config.smtp_password.clone())
            {
                builder = builder.credentials(Credentials::new(user, password));
            }
            builder.build()
        });

        Self {
            client,
            webhook_url: config.chat_webhook_url.clone(),
            mailer,
            smtp_from: config.smtp_from.clone(),
        }
    }

    /// Post a plain-text message to the configured chat webhook, if any.
    pub async fn push_chat(&self, text: &str) {
        let Some(url) = &self.webhook_url else {
            tracing::debug!("no chat webhook configured, skipping push");
            return;
        };

        match self.client.post(url).json(&json!({ "text": text })).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!("chat notification delivered");
            }
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "chat webhook rejected notification");
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to reach chat webhook");
            }
        }
    }

    /// Send a plain-text email through the configured SMTP relay, if any.
    pub async fn send_email(&self, to: &str, subject: &str, body: &str) {
        let Some(mailer) = &self.mailer else {
            tracing::debug!("no SMTP relay configured, skipping email");
            return;
        };

        let message = Message::builder()
            .from(match self.smtp_from.parse() {
                Ok(from) => from,
                Err(e) => {
                    tracing::warn!(error = %e, "invalid SMTP from address");
                    return;
                }
            })
            .to(match to.parse() {
                Ok(to) => to,
                Err(e) => {
                    tracing::warn!(error = %e, to, "invalid recipient address");
                    return;
                }
            })
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string());

        let message = match message {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "failed to build email");
                return;
            }
        };

        match mailer.send(message).await {
            Ok(_) => tracing::debug!(to, subject, "email sent"),
            Err(e) => tracing::warn!(error = %e, to, "failed to send email"),
        }
    }

    /// Announce a freshly created lot to one registered user.
    pub async fn notify_lot_created(&self, user_name: &str, email: &str, city: &str) {
        let text = format!("Hi {user_name}, a new parking lot just opened in {city}. Book a spot before it fills up!");
        self.push_chat(&text).await;
        self.send_email(email, &format!("New parking lot in {city}"), &text)
            .await;
    }
}
