//! Hosted document-store backend.
//!
//! [`RemoteBackend`] turns projects into documents and stamps audit
//! fields; a [`DocumentCollection`] does the actual I/O.

mod firestore;

use serde_json::{Map, Value};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, info, warn};

use crate::{
    auth::Identity,
    core::backend::ProjectBackend,
    error::{Result, StoreError},
    models::{NewProject, Project, ProjectUpdate},
};

pub use firestore::FirestoreCollection;

pub const PROJECTS_COLLECTION: &str = "projects";
pub const ORDER_FIELD: &str = "title";

/// Document fields in their JSON form. Keys use the camelCase wire names.
pub type Fields = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

/// A keyed collection of JSON documents in a hosted store.
pub trait DocumentCollection {
    fn list_ordered(&self, order_by: &str) -> impl Future<Output = Result<Vec<Document>>>;
    /// Store a new document and return the key the store issued for it.
    fn add(&self, fields: Fields, actor: &Identity) -> impl Future<Output = Result<String>>;
    /// Merge `fields` into an existing document. Fails with `NotFound` if it is gone.
    fn patch(&self, id: &str, fields: Fields, actor: &Identity) -> impl Future<Output = Result<()>>;
    fn remove(&self, id: &str, actor: &Identity) -> impl Future<Output = Result<()>>;
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| StoreError::Unknown(e.to_string()))
}

fn to_fields<T: serde::Serialize>(value: &T) -> Result<Fields> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => Ok(fields),
        other => Err(StoreError::Unknown(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

fn project_from_document(document: Document) -> Result<Project> {
    let mut fields = document.fields;
    fields.insert("id".to_string(), Value::String(document.id));
    Ok(serde_json::from_value(Value::Object(fields))?)
}

/// Projects stored in the `"projects"` collection of a hosted document store.
///
/// Reads come back ordered by title. Every write carries the acting uid
/// and a timestamp as audit fields alongside the project data.
#[derive(Debug, Clone)]
pub struct RemoteBackend<C> {
    collection: C,
}

impl<C: DocumentCollection> RemoteBackend<C> {
    pub fn new(collection: C) -> Self {
        Self { collection }
    }

    pub fn collection(&self) -> &C {
        &self.collection
    }
}

impl<C: DocumentCollection> ProjectBackend for RemoteBackend<C> {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn list_all(&self) -> Result<Vec<Project>> {
        let documents = self.collection.list_ordered(ORDER_FIELD).await?;
        let mut projects = Vec::with_capacity(documents.len());
        for document in documents {
            let id = document.id.clone();
            match project_from_document(document) {
                Ok(project) => projects.push(project),
                Err(err) => warn!(id = %id, error = %err, "skipping malformed project document"),
            }
        }
        // Stable, so equal titles keep the store's order.
        projects.sort_by(|a, b| a.title.cmp(&b.title));
        debug!(count = projects.len(), "fetched remote projects");
        Ok(projects)
    }

    async fn create(&self, draft: &NewProject, actor: &Identity) -> Result<Project> {
        let now = now_rfc3339()?;
        let mut fields = to_fields(draft)?;
        fields.insert("createdBy".to_string(), Value::String(actor.uid.clone()));
        fields.insert("createdAt".to_string(), Value::String(now.clone()));
        fields.insert("updatedBy".to_string(), Value::String(actor.uid.clone()));
        fields.insert("updatedAt".to_string(), Value::String(now));

        let id = self.collection.add(fields, actor).await?;
        if id.is_empty() {
            return Err(StoreError::Unknown(
                "document store returned an empty id".to_string(),
            ));
        }
        info!(id = %id, backend = "remote", "project created");
        Ok(draft.clone().into_project(id))
    }

    async fn update(&self, id: &str, update: &ProjectUpdate, actor: &Identity) -> Result<()> {
        let mut fields = to_fields(update)?;
        fields.insert("updatedBy".to_string(), Value::String(actor.uid.clone()));
        fields.insert("updatedAt".to_string(), Value::String(now_rfc3339()?));
        self.collection.patch(id, fields, actor).await?;
        info!(id = %id, backend = "remote", fields = ?update.field_paths(), "project updated");
        Ok(())
    }

    async fn delete(&self, id: &str, actor: &Identity) -> Result<()> {
        self.collection.remove(id, actor).await?;
        info!(id = %id, backend = "remote", "project deleted");
        Ok(())
    }
}
