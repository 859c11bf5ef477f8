pub mod auth;
pub mod config;
pub mod contact;
pub mod core;
pub mod error;
pub mod models;

pub use auth::{AuthGate, Identity};
pub use crate::core::{AnyBackend, ProjectBackend, ProjectStore, SubscriptionId};
pub use error::{Result, StoreError};
pub use models::{NewProject, Project, ProjectUpdate, ProjectsSnapshot};
