use crate::{
    auth::Identity,
    core::{
        db::LocalBackend,
        remote::{FirestoreCollection, RemoteBackend},
    },
    error::Result,
    models::{NewProject, Project, ProjectUpdate},
};

/// Durable storage for user-created projects.
///
/// Implementations do not check authorization; the store does that before
/// any write reaches a backend. The acting identity is passed along so
/// backends can stamp or forward it.
pub trait ProjectBackend {
    fn name(&self) -> &'static str;
    fn list_all(&self) -> impl Future<Output = Result<Vec<Project>>>;
    fn create(
        &self,
        draft: &NewProject,
        actor: &Identity,
    ) -> impl Future<Output = Result<Project>>;
    fn update(
        &self,
        id: &str,
        update: &ProjectUpdate,
        actor: &Identity,
    ) -> impl Future<Output = Result<()>>;
    fn delete(&self, id: &str, actor: &Identity) -> impl Future<Output = Result<()>>;
}

/// Backend selected by configuration at startup.
#[derive(Debug)]
pub enum AnyBackend {
    Local(LocalBackend),
    Remote(RemoteBackend<FirestoreCollection>),
}

impl ProjectBackend for AnyBackend {
    fn name(&self) -> &'static str {
        match self {
            Self::Local(backend) => backend.name(),
            Self::Remote(backend) => backend.name(),
        }
    }

    async fn list_all(&self) -> Result<Vec<Project>> {
        match self {
            Self::Local(backend) => backend.list_all().await,
            Self::Remote(backend) => backend.list_all().await,
        }
    }

    async fn create(&self, draft: &NewProject, actor: &Identity) -> Result<Project> {
        match self {
            Self::Local(backend) => backend.create(draft, actor).await,
            Self::Remote(backend) => backend.create(draft, actor).await,
        }
    }

    async fn update(&self, id: &str, update: &ProjectUpdate, actor: &Identity) -> Result<()> {
        match self {
            Self::Local(backend) => backend.update(id, update, actor).await,
            Self::Remote(backend) => backend.update(id, update, actor).await,
        }
    }

    async fn delete(&self, id: &str, actor: &Identity) -> Result<()> {
        match self {
            Self::Local(backend) => backend.delete(id, actor).await,
            Self::Remote(backend) => backend.delete(id, actor).await,
        }
    }
}
