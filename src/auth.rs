//! Email/password gate in front of every mutating store call.
//!
//! The store only asks whether an [`Identity`] is present; how it was
//! obtained is up to the [`AuthGate`] implementation.

use std::sync::{Mutex, PoisonError};

use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::{Result, StoreError};

const FIREBASE_SIGN_IN_ENDPOINT: &str =
    "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword";

/// Opaque reference to the signed-in administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    /// Bearer token forwarded to the remote document store, when it has one.
    pub id_token: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            id_token: None,
        }
    }
}

pub trait AuthGate {
    fn current_identity(&self) -> Option<Identity>;
    fn sign_in(&self, email: &str, password: &str) -> impl Future<Output = Result<Identity>>;
    fn sign_out(&self) -> impl Future<Output = Result<()>>;

    fn is_authenticated(&self) -> bool {
        self.current_identity().is_some()
    }
}

/// Format checks applied before any credential leaves the process.
pub fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if email.is_empty() || password.is_empty() {
        return Err(StoreError::Validation(
            "Email and password are required".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(StoreError::Validation(
            "Please enter a valid email address".to_string(),
        ));
    }
    if password.chars().count() < 6 {
        return Err(StoreError::Validation(
            "Password must be at least 6 characters long".to_string(),
        ));
    }
    Ok(())
}

pub fn sha256_hex(input: &str) -> String {
    format!("{:x}", Sha256::digest(input.as_bytes()))
}

#[derive(Debug, Default)]
struct Session(Mutex<Option<Identity>>);

impl Session {
    fn get(&self) -> Option<Identity> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set(&self, identity: Option<Identity>) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = identity;
    }
}

/// Single configured administrator, password kept as a SHA-256 digest.
#[derive(Debug)]
pub struct PasswordAuthGate {
    admin_email: String,
    password_sha256: String,
    session: Session,
}

impl PasswordAuthGate {
    pub fn new(admin_email: impl Into<String>, password_sha256: impl Into<String>) -> Self {
        Self {
            admin_email: admin_email.into(),
            password_sha256: password_sha256.into().to_ascii_lowercase(),
            session: Session::default(),
        }
    }

    fn uid(&self) -> String {
        format!("local-{}", &sha256_hex(&self.admin_email.to_lowercase())[..16])
    }
}

impl AuthGate for PasswordAuthGate {
    fn current_identity(&self) -> Option<Identity> {
        self.session.get()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        validate_credentials(email, password)?;
        if !email.eq_ignore_ascii_case(&self.admin_email) {
            return Err(StoreError::Auth(
                "No account found with this email address".to_string(),
            ));
        }
        if sha256_hex(password) != self.password_sha256 {
            return Err(StoreError::Auth("Incorrect password".to_string()));
        }
        let identity = Identity::new(self.uid(), self.admin_email.clone());
        info!(uid = %identity.uid, "signed in");
        self.session.set(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<()> {
        self.session.set(None);
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: String,
    id_token: String,
    #[serde(default)]
    registered: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Firebase Identity Toolkit password sign-in.
#[derive(Debug)]
pub struct FirebaseAuthGate {
    client: reqwest::Client,
    api_key: String,
    session: Session,
}

impl FirebaseAuthGate {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            session: Session::default(),
        }
    }
}

/// Turn Identity Toolkit error codes into messages fit for a login form.
fn sign_in_error(code: &str) -> StoreError {
    // Codes may carry a suffix, e.g. "TOO_MANY_ATTEMPTS_TRY_LATER : Access ..."
    let code = code.split(':').next().unwrap_or(code).trim();
    match code {
        "EMAIL_NOT_FOUND" => {
            StoreError::Auth("No account found with this email address".to_string())
        }
        "INVALID_PASSWORD" => StoreError::Auth("Incorrect password".to_string()),
        "INVALID_LOGIN_CREDENTIALS" => {
            StoreError::Auth("Incorrect email or password".to_string())
        }
        "INVALID_EMAIL" => StoreError::Validation("Invalid email address".to_string()),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => StoreError::Permission(
            "Too many failed attempts. Please try again later".to_string(),
        ),
        "USER_DISABLED" => StoreError::Permission("This account has been disabled".to_string()),
        other => StoreError::Unknown(format!("sign-in failed: {other}")),
    }
}

impl AuthGate for FirebaseAuthGate {
    fn current_identity(&self) -> Option<Identity> {
        self.session.get()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        validate_credentials(email, password)?;
        let response = self
            .client
            .post(FIREBASE_SIGN_IN_ENDPOINT)
            .query(&[("key", self.api_key.as_str())])
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) => sign_in_error(&envelope.error.message),
                Err(_) => StoreError::Unknown(format!("sign-in failed with HTTP {status}")),
            });
        }

        let body: SignInResponse = response.json().await?;
        if !body.registered {
            warn!(email = %body.email, "account is not marked as registered");
        }
        let identity = Identity {
            uid: body.local_id,
            email: body.email,
            id_token: Some(body.id_token),
        };
        info!(uid = %identity.uid, "signed in");
        self.session.set(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<()> {
        self.session.set(None);
        Ok(())
    }
}

/// The gate chosen by configuration at startup.
#[derive(Debug)]
pub enum AnyAuthGate {
    Password(PasswordAuthGate),
    Firebase(FirebaseAuthGate),
}

impl AuthGate for AnyAuthGate {
    fn current_identity(&self) -> Option<Identity> {
        match self {
            Self::Password(gate) => gate.current_identity(),
            Self::Firebase(gate) => gate.current_identity(),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        match self {
            Self::Password(gate) => gate.sign_in(email, password).await,
            Self::Firebase(gate) => gate.sign_in(email, password).await,
        }
    }

    async fn sign_out(&self) -> Result<()> {
        match self {
            Self::Password(gate) => gate.sign_out().await,
            Self::Firebase(gate) => gate.sign_out().await,
        }
    }
}
