mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from folio for tests
pub use folio::core::db::{LocalBackend, LocalDevice, TombstoneStore};
pub use folio::core::remote::{DocumentCollection, RemoteBackend};
pub use folio::core::seed::{seed_projects, visible_seeds};
pub use folio::{
    Identity, NewProject, Project, ProjectStore, ProjectUpdate, ProjectsSnapshot, StoreError,
};
