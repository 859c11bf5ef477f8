use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{
    auth::{AnyAuthGate, FirebaseAuthGate, PasswordAuthGate},
    contact::ContactSettings,
    core::{
        AnyBackend, ProjectStore,
        db::{LocalBackend, LocalDevice, TombstoneStore},
        remote::{FirestoreCollection, RemoteBackend},
    },
};

/// Which storage holds user-created projects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Local,
    Remote,
}

impl std::str::FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            other => Err(anyhow::anyhow!("Unknown backend kind: {}", other)),
        }
    }
}

/// Hosted document store connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSettings {
    pub project_id: String,
    pub api_key: Option<String>,
    #[serde(default = "default_database")]
    pub database: String,
    /// Override for emulators.
    pub base_url: Option<String>,
}

fn default_database() -> String {
    "(default)".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSettings {
    #[serde(default)]
    pub kind: BackendKind,
    pub remote: Option<RemoteSettings>,
}

/// Administrator account for the local password gate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSettings {
    pub admin_email: Option<String>,
    /// Lowercase hex SHA-256 of the password.
    pub admin_password_sha256: Option<String>,
}

/// Main configuration for folio
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolioConfig {
    /// Directory holding the on-device database; defaults to ~/.folio
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub contact: ContactSettings,
}

fn home_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Could not determine home directory"))?;
    Ok(PathBuf::from(home))
}

impl FolioConfig {
    /// Load config from the default location (~/.folio/config.toml)
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load config from a specific path; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config: FolioConfig =
            toml::from_str(&content).with_context(|| format!("Invalid config {:?}", path))?;
        Ok(config)
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(home_dir()?.join(".folio").join("config.toml"))
    }

    /// Apply `FOLIO_BACKEND` and `FOLIO_DATA_DIR` overrides.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(kind) = std::env::var("FOLIO_BACKEND") {
            self.backend.kind = kind.parse()?;
        }
        if let Ok(dir) = std::env::var("FOLIO_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
        Ok(self)
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => match dir.strip_prefix("~") {
                Ok(rest) => Ok(home_dir()?.join(rest)),
                Err(_) => Ok(dir.clone()),
            },
            None => Ok(home_dir()?.join(".folio")),
        }
    }

    fn remote(&self) -> Result<&RemoteSettings> {
        self.backend
            .remote
            .as_ref()
            .filter(|remote| !remote.project_id.is_empty())
            .context("backend.kind = \"remote\" requires a [backend.remote] project_id")
    }

    /// Open local storage and build the store over the configured backend.
    pub async fn open_store(&self) -> Result<ProjectStore<AnyBackend>> {
        let device = LocalDevice::open(self.data_dir()?).await?;
        let tombstones = TombstoneStore::new(device.clone());
        let backend = match self.backend.kind {
            BackendKind::Local => AnyBackend::Local(LocalBackend::new(device).await?),
            BackendKind::Remote => {
                let remote = self.remote()?;
                let mut collection =
                    FirestoreCollection::new(&remote.project_id).with_database(&remote.database);
                if let Some(key) = &remote.api_key {
                    collection = collection.with_api_key(key);
                }
                if let Some(base_url) = &remote.base_url {
                    collection = collection.with_base_url(base_url);
                }
                AnyBackend::Remote(RemoteBackend::new(collection))
            }
        };
        Ok(ProjectStore::new(backend, tombstones))
    }

    /// The remote backend signs in against Firebase; the local one uses the configured admin.
    pub fn auth_gate(&self) -> Result<AnyAuthGate> {
        match self.backend.kind {
            BackendKind::Remote => {
                let api_key = self
                    .remote()?
                    .api_key
                    .clone()
                    .context("Firebase sign-in requires [backend.remote] api_key")?;
                Ok(AnyAuthGate::Firebase(FirebaseAuthGate::new(api_key)))
            }
            BackendKind::Local => {
                let email = self
                    .auth
                    .admin_email
                    .clone()
                    .context("[auth] admin_email is not set")?;
                let digest = self
                    .auth
                    .admin_password_sha256
                    .clone()
                    .context("[auth] admin_password_sha256 is not set")?;
                Ok(AnyAuthGate::Password(PasswordAuthGate::new(email, digest)))
            }
        }
    }
}
