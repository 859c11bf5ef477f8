use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use folio::core::db::{LocalBackend, LocalDevice, TombstoneStore};
use folio::core::remote::{Document, DocumentCollection, Fields, RemoteBackend};
use folio::{Identity, NewProject, ProjectStore, ProjectsSnapshot, StoreError};

/// Identity used for every authenticated call in tests.
pub fn admin() -> Identity {
    Identity::new("admin-uid", "admin@example.com")
}

/// Creates a NewProject with the given title and fixed test data.
pub fn make_draft(title: &str) -> NewProject {
    NewProject {
        title: title.to_string(),
        description: format!("{title} description"),
        image: "https://images.example.com/cover.png".to_string(),
        tech_stack: vec!["Rust".to_string(), "SQLite".to_string()],
        live_url: "https://example.com".to_string(),
        github_url: "https://github.com/example/project".to_string(),
    }
}

/// Opens the on-device database inside `dir`.
pub async fn open_device(dir: &Path) -> LocalDevice {
    LocalDevice::open(dir)
        .await
        .expect("Failed to open local device")
}

/// Opens a local-backend store over the database in `dir`, as a fresh process would.
pub async fn open_local_store(dir: &Path) -> ProjectStore<LocalBackend> {
    let device = open_device(dir).await;
    let backend = LocalBackend::new(device.clone())
        .await
        .expect("Failed to create local backend");
    ProjectStore::new(backend, TombstoneStore::new(device))
}

/// Creates a local-backend store in a temporary directory.
/// Returns both the store and the temp directory (which must be kept alive).
pub async fn create_local_store() -> (ProjectStore<LocalBackend>, tempfile::TempDir) {
    let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let store = open_local_store(dir.path()).await;
    (store, dir)
}

pub type RemoteStore = ProjectStore<RemoteBackend<MemoryCollection>>;

/// Opens a remote-backend store over `collection`, keeping tombstones in `dir`.
pub async fn open_remote_store(dir: &Path, collection: MemoryCollection) -> RemoteStore {
    let device = open_device(dir).await;
    ProjectStore::new(RemoteBackend::new(collection), TombstoneStore::new(device))
}

/// Creates a remote-backend store over an empty in-memory collection.
/// The returned collection shares state with the one inside the store.
pub async fn create_remote_store() -> (RemoteStore, MemoryCollection, tempfile::TempDir) {
    let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let collection = MemoryCollection::default();
    let store = open_remote_store(dir.path(), collection.clone()).await;
    (store, collection, dir)
}

/// Subscribes to `store` and collects every snapshot it delivers.
pub fn record_snapshots<B: folio::ProjectBackend>(
    store: &ProjectStore<B>,
) -> Arc<Mutex<Vec<ProjectsSnapshot>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    store.subscribe(move |snapshot| sink.lock().unwrap().push(snapshot));
    seen
}

pub fn ids(snapshot: &ProjectsSnapshot) -> Vec<String> {
    snapshot.projects.iter().map(|p| p.id.clone()).collect()
}

/// Failure a [`MemoryCollection`] can be told to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Permission,
    Network,
}

impl Fault {
    fn error(self) -> StoreError {
        match self {
            Fault::Permission => StoreError::Permission("Missing or insufficient permissions.".into()),
            Fault::Network => StoreError::Network("connection refused".into()),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    documents: Vec<Document>,
    read_fault: Option<Fault>,
    write_fault: Option<Fault>,
}

/// In-memory document collection with switchable failures.
#[derive(Debug, Clone, Default)]
pub struct MemoryCollection {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryCollection {
    pub fn fail_reads(&self, fault: Option<Fault>) {
        self.state.lock().unwrap().read_fault = fault;
    }

    pub fn fail_writes(&self, fault: Option<Fault>) {
        self.state.lock().unwrap().write_fault = fault;
    }

    pub fn document(&self, id: &str) -> Option<Document> {
        self.state
            .lock()
            .unwrap()
            .documents
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().documents.len()
    }

    /// Put a document straight into the collection, bypassing the backend.
    pub fn insert(&self, id: &str, project: &NewProject) {
        let serde_json::Value::Object(fields) = serde_json::to_value(project).unwrap() else {
            unreachable!()
        };
        self.insert_fields(id, fields);
    }

    /// Put raw fields under `id`, whether or not they form a valid project.
    pub fn insert_fields(&self, id: &str, fields: Fields) {
        self.state.lock().unwrap().documents.push(Document {
            id: id.to_string(),
            fields,
        });
    }

    /// Drop a document behind the backend's back.
    pub fn remove_directly(&self, id: &str) {
        self.state.lock().unwrap().documents.retain(|d| d.id != id);
    }

    fn check_write(&self) -> folio::Result<()> {
        match self.state.lock().unwrap().write_fault {
            Some(fault) => Err(fault.error()),
            None => Ok(()),
        }
    }
}

impl DocumentCollection for MemoryCollection {
    async fn list_ordered(&self, order_by: &str) -> folio::Result<Vec<Document>> {
        let state = self.state.lock().unwrap();
        if let Some(fault) = state.read_fault {
            return Err(fault.error());
        }
        let mut documents = state.documents.clone();
        documents.sort_by(|a, b| {
            let key = |d: &Document| d.fields.get(order_by).and_then(|v| v.as_str()).map(str::to_owned);
            key(a).cmp(&key(b))
        });
        Ok(documents)
    }

    async fn add(&self, fields: Fields, _actor: &Identity) -> folio::Result<String> {
        self.check_write()?;
        let id = uuid::Uuid::new_v4().simple().to_string()[..20].to_string();
        self.state.lock().unwrap().documents.push(Document {
            id: id.clone(),
            fields,
        });
        Ok(id)
    }

    async fn patch(&self, id: &str, fields: Fields, _actor: &Identity) -> folio::Result<()> {
        self.check_write()?;
        let mut state = self.state.lock().unwrap();
        let document = state
            .documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        document.fields.extend(fields);
        Ok(())
    }

    async fn remove(&self, id: &str, _actor: &Identity) -> folio::Result<()> {
        self.check_write()?;
        let mut state = self.state.lock().unwrap();
        let before = state.documents.len();
        state.documents.retain(|d| d.id != id);
        if state.documents.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
