use serde::{Deserialize, Serialize};
use serde_json::json;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::info;

use crate::error::{Result, StoreError};

const EMAILJS_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// What a visitor submits through the contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactMessage {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty()
            || self.email.trim().is_empty()
            || self.message.trim().is_empty()
        {
            return Err(StoreError::Validation(
                "name, email and message are all required".to_string(),
            ));
        }
        if !self.email.contains('@') {
            return Err(StoreError::Validation(
                "Please enter a valid email address".to_string(),
            ));
        }
        Ok(())
    }
}

pub trait ContactRelay {
    fn send(&self, message: &ContactMessage) -> impl Future<Output = Result<()>>;
}

/// EmailJS credentials, all optional in the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSettings {
    pub service_id: Option<String>,
    pub template_id: Option<String>,
    pub public_key: Option<String>,
    /// Recipient name shown in the template.
    #[serde(default)]
    pub to_name: String,
}

impl ContactSettings {
    pub fn missing(&self) -> Vec<&'static str> {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());
        let mut missing = Vec::new();
        if !present(&self.service_id) {
            missing.push("service_id");
        }
        if !present(&self.template_id) {
            missing.push("template_id");
        }
        if !present(&self.public_key) {
            missing.push("public_key");
        }
        missing
    }
}

#[derive(Debug, Clone)]
pub struct EmailJsRelay {
    client: reqwest::Client,
    service_id: String,
    template_id: String,
    public_key: String,
    to_name: String,
}

impl EmailJsRelay {
    pub fn new(settings: &ContactSettings) -> Result<Self> {
        let missing = settings.missing();
        if !missing.is_empty() {
            return Err(StoreError::Validation(format!(
                "contact relay is not configured, missing [contact] {}",
                missing.join(", ")
            )));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            service_id: settings.service_id.clone().unwrap_or_default(),
            template_id: settings.template_id.clone().unwrap_or_default(),
            public_key: settings.public_key.clone().unwrap_or_default(),
            to_name: settings.to_name.clone(),
        })
    }

    fn payload(&self, message: &ContactMessage, timestamp: &str) -> serde_json::Value {
        json!({
            "service_id": self.service_id,
            "template_id": self.template_id,
            "user_id": self.public_key,
            "template_params": {
                "from_name": message.name,
                "from_email": message.email,
                "reply_to": message.email,
                "to_name": self.to_name,
                "message": message.message,
                "timestamp": timestamp,
            },
        })
    }
}

impl ContactRelay for EmailJsRelay {
    async fn send(&self, message: &ContactMessage) -> Result<()> {
        message.validate()?;
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| StoreError::Unknown(e.to_string()))?;
        let response = self
            .client
            .post(EMAILJS_ENDPOINT)
            .json(&self.payload(message, &timestamp))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Unknown(format!(
                "contact relay returned {status}: {body}"
            )));
        }
        info!(from = %message.email, "contact message sent");
        Ok(())
    }
}
