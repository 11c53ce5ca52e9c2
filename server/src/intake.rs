use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::Local;
use minijinja::{context, Environment};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tokio::{fs::OpenOptions, io::AsyncWriteExt};
use tracing::{info, warn};

const INTAKE_EMAIL_TEMPLATE: &str = include_str!("templates/intake_email.txt");
const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Lead-intake form as posted by the intake page. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeForm {
    pub company_name: Option<String>,
    pub business_type: Option<String>,
    pub website: Option<String>,
    pub company_size: Option<String>,
    pub monthly_visitors: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub use_cases: Option<Vec<String>>,
    pub languages: Option<String>,
    pub integrations: Option<Vec<String>>,
    pub specific_features: Option<String>,
    pub current_solution: Option<String>,
    pub pain_points: Option<String>,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub additional_info: Option<String>,
    pub hear_about: Option<String>,
}

impl IntakeForm {
    pub fn subject(&self) -> String {
        let company = self
            .company_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("Unknown Company");
        format!("New Chatbot Inquiry - {company}")
    }
}

pub fn render_intake_email(form: &IntakeForm) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("intake_email.txt", INTAKE_EMAIL_TEMPLATE)?;
    let template = env.get_template("intake_email.txt")?;
    template.render(context! { form => form })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("email API key is not configured")]
    MissingApiKey,
    #[error("email request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("email service returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait MailDelivery: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), DeliveryError>;
}

pub struct SendGridMailer {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl SendGridMailer {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_endpoint(api_key, SENDGRID_SEND_URL)
    }

    pub fn with_endpoint(api_key: Option<String>, endpoint: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl MailDelivery for SendGridMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), DeliveryError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(DeliveryError::MissingApiKey);
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&sendgrid_payload(email))
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected { status, body });
        }
        Ok(())
    }
}

fn sendgrid_payload(email: &OutboundEmail) -> serde_json::Value {
    json!({
        "personalizations": [{ "to": [{ "email": email.to }] }],
        "from": { "email": email.from },
        "subject": email.subject,
        "content": [{ "type": "text/plain", "value": email.body }],
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeReceipt {
    Delivered,
    SavedToFile(PathBuf),
}

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("could not render intake email: {0}")]
    Render(#[from] minijinja::Error),
    #[error("could not write intake fallback file `{path}`: {source}")]
    Fallback { path: PathBuf, source: io::Error },
}

/// Forwards intake submissions by email; a failed delivery is kept on disk
/// and still counts as accepted.
pub struct IntakeRelay {
    mailer: Arc<dyn MailDelivery>,
    from: String,
    to: String,
    fallback_dir: PathBuf,
}

impl IntakeRelay {
    pub fn new(mailer: Arc<dyn MailDelivery>, from: &str, to: &str, fallback_dir: &Path) -> Self {
        Self {
            mailer,
            from: from.to_string(),
            to: to.to_string(),
            fallback_dir: fallback_dir.to_path_buf(),
        }
    }

    pub async fn submit(&self, form: &IntakeForm) -> Result<IntakeReceipt, IntakeError> {
        let email = OutboundEmail {
            from: self.from.clone(),
            to: self.to.clone(),
            subject: form.subject(),
            body: render_intake_email(form)?,
        };

        match self.mailer.send(&email).await {
            Ok(()) => {
                info!(
                    event_name = "intake.email.delivered",
                    subject = %email.subject,
                    "intake email delivered"
                );
                Ok(IntakeReceipt::Delivered)
            }
            Err(err) => {
                let path = self.write_fallback(&email.body).await?;
                warn!(
                    event_name = "intake.email.fallback",
                    error = %err,
                    path = %path.display(),
                    "intake email delivery failed, saved submission to file"
                );
                Ok(IntakeReceipt::SavedToFile(path))
            }
        }
    }

    /// Writes `body` to a new timestamped file. Submissions landing in the
    /// same second get a numeric suffix; existing files are never replaced.
    async fn write_fallback(&self, body: &str) -> Result<PathBuf, IntakeError> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let mut attempt = 0u32;
        loop {
            let path = self.fallback_path(&timestamp, attempt);
            match create_and_write(&path, body).await {
                Ok(()) => return Ok(path),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
                Err(source) => return Err(IntakeError::Fallback { path, source }),
            }
        }
    }

    fn fallback_path(&self, timestamp: &str, attempt: u32) -> PathBuf {
        let name = match attempt {
            0 => format!("intake_submission_{timestamp}.txt"),
            n => format!("intake_submission_{timestamp}_{n}.txt"),
        };
        self.fallback_dir.join(name)
    }
}

async fn create_and_write(path: &Path, body: &str) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(body.as_bytes()).await?;
    file.flush().await
}
