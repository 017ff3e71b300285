use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};
use std::time::Duration;

use crate::error::AppError;

/// Outbound messaging collaborator. Delivery is fire-and-forget relative to
/// the store: a failed send never rolls back an issued credential.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver an issued secret to the guest.
    async fn send_credential(&self, to_email: &str, secret: &str) -> Result<(), AppError>;

    /// Ask the administrator to act on a privileged-tier request.
    async fn send_approval_request(
        &self,
        requester_email: &str,
        approval_link: &str,
    ) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: SmtpTransport,
    sender: String,
    admin: String,
    ssid: String,
    valid_for_days: i64,
}

impl SmtpNotifier {
    pub fn new(
        smtp: &crate::config::SmtpConfig,
        mail: &crate::config::MailConfig,
        ssid: &str,
        valid_for_days: i64,
    ) -> Result<Self, AppError> {
        let creds = Credentials::new(smtp.user.clone(), smtp.password.clone());

        let mailer = SmtpTransport::relay(&smtp.host)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!(e.to_string())))?
            .credentials(creds)
            .port(587)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %smtp.host, "SMTP notifier initialized");

        Ok(Self {
            mailer,
            sender: mail.sender.clone(),
            admin: mail.admin.clone(),
            ssid: ssid.to_string(),
            valid_for_days,
        })
    }

    async fn send_email(&self, to_email: &str, subject: &str, body: &str) -> Result<(), AppError> {
        let email = Message::builder()
            .from(self.sender.parse().map_err(
                |e: lettre::address::AddressError| AppError::InternalError(e.into()),
            )?)
            .to(to_email.parse().map_err(
                |e: lettre::address::AddressError| AppError::InternalError(e.into()),
            )?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::InternalError(e.into()))?;

        // Send on the blocking pool; SmtpTransport is synchronous.
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::InternalError(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %to_email, subject = %subject, "Email sent successfully");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e.to_string(), to = %to_email, "Failed to send email");
                Err(AppError::EmailError(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_credential(&self, to_email: &str, secret: &str) -> Result<(), AppError> {
        let body = format!(
            "Hello,\n\n\
             Thank you for registering. You may access the guest Wi-Fi using the\n\
             information below.\n\n\
             SSID: {}\n\
             Username: {}\n\
             Password: {}\n\n\
             Access is valid for {} days. After that it expires and you will need\n\
             to register again from the portal.\n\n\
             We hope you enjoy your stay.",
            self.ssid, to_email, secret, self.valid_for_days
        );

        self.send_email(to_email, "Guest Wi-Fi access", &body).await
    }

    async fn send_approval_request(
        &self,
        requester_email: &str,
        approval_link: &str,
    ) -> Result<(), AppError> {
        let body = format!(
            "Hello,\n\n\
             The following user is requesting access to the corporate Wi-Fi.\n\n\
             Email: {}\n\n\
             Click this link to approve the request: {}\n\n\
             Thank you.",
            requester_email, approval_link
        );

        self.send_email(&self.admin, "[Request] Corporate Wi-Fi access", &body)
            .await
    }
}

/// Recording notifier for tests. Set `fail` to exercise the degraded-success
/// path without an SMTP server.
#[derive(Default)]
pub struct MockNotifier {
    pub deliveries: std::sync::Mutex<Vec<Delivery>>,
    pub fail: std::sync::atomic::AtomicBool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Credential { to: String, secret: String },
    ApprovalRequest { requester: String, link: String },
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Delivery> {
        self.deliveries
            .lock()
            .expect("mock notifier mutex poisoned")
            .clone()
    }

    pub fn credential_deliveries(&self) -> Vec<(String, String)> {
        self.sent()
            .into_iter()
            .filter_map(|d| match d {
                Delivery::Credential { to, secret } => Some((to, secret)),
                _ => None,
            })
            .collect()
    }

    pub fn approval_links(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|d| match d {
                Delivery::ApprovalRequest { link, .. } => Some(link),
                _ => None,
            })
            .collect()
    }

    fn should_fail(&self) -> bool {
        self.fail.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send_credential(&self, to_email: &str, secret: &str) -> Result<(), AppError> {
        if self.should_fail() {
            return Err(AppError::EmailError("smtp unavailable".to_string()));
        }
        self.deliveries
            .lock()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("mutex poisoned: {}", e)))?
            .push(Delivery::Credential {
                to: to_email.to_string(),
                secret: secret.to_string(),
            });
        Ok(())
    }

    async fn send_approval_request(
        &self,
        requester_email: &str,
        approval_link: &str,
    ) -> Result<(), AppError> {
        if self.should_fail() {
            return Err(AppError::EmailError("smtp unavailable".to_string()));
        }
        self.deliveries
            .lock()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("mutex poisoned: {}", e)))?
            .push(Delivery::ApprovalRequest {
                requester: requester_email.to_string(),
                link: approval_link.to_string(),
            });
        Ok(())
    }
}
