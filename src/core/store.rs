use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard, PoisonError},
};

use tracing::{debug, warn};

use crate::{
    auth::Identity,
    core::{
        backend::ProjectBackend,
        db::TombstoneStore,
        observer::{ObserverRegistry, SubscriptionId},
        seed::{is_seed_id, seed_projects, visible_seeds},
    },
    error::{Result, StoreError},
    models::{NewProject, Project, ProjectUpdate, ProjectsSnapshot},
};

#[derive(Debug)]
struct Cache {
    projects: Vec<Project>,
    loading: bool,
    /// Seed ids deleted on this client, persisted or learned from storage.
    suppressed: HashSet<String>,
}

impl Cache {
    fn snapshot(&self) -> ProjectsSnapshot {
        ProjectsSnapshot {
            projects: self.projects.clone(),
            loading: self.loading,
        }
    }

    fn contains(&self, id: &str) -> bool {
        self.projects.iter().any(|p| p.id == id)
    }
}

/// Single source of truth for the project list.
///
/// The visible list is always the non-tombstoned seeds followed by the
/// backend's records. Reads never wait on I/O. Writes require an
/// [`Identity`], reach the backend first, and only then touch the cache;
/// a failed write leaves the cache exactly as it was.
///
/// Share one instance behind an `Arc` between every view that needs it.
#[derive(Debug)]
pub struct ProjectStore<B> {
    backend: B,
    tombstones: TombstoneStore,
    observers: ObserverRegistry,
    cache: Mutex<Cache>,
}

fn require_identity<'a>(identity: Option<&'a Identity>, action: &str) -> Result<&'a Identity> {
    identity.ok_or_else(|| StoreError::Auth(format!("you must be logged in to {action}")))
}

impl<B: ProjectBackend> ProjectStore<B> {
    /// Starts empty and loading; call [`refresh`](Self::refresh) to populate.
    pub fn new(backend: B, tombstones: TombstoneStore) -> Self {
        Self {
            backend,
            tombstones,
            observers: ObserverRegistry::default(),
            cache: Mutex::new(Cache {
                projects: Vec::new(),
                loading: true,
                suppressed: HashSet::new(),
            }),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn cache(&self) -> MutexGuard<'_, Cache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `change` to the cache, then notify observers outside the lock.
    /// Nothing is notified when `change` fails.
    fn transition<T>(&self, change: impl FnOnce(&mut Cache) -> Result<T>) -> Result<T> {
        let (value, snapshot) = {
            let mut cache = self.cache();
            let value = change(&mut cache)?;
            (value, cache.snapshot())
        };
        debug!(
            count = snapshot.projects.len(),
            loading = snapshot.loading,
            "project list changed"
        );
        self.observers.notify(&snapshot);
        Ok(value)
    }

    pub fn list(&self) -> ProjectsSnapshot {
        self.cache().snapshot()
    }

    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(ProjectsSnapshot) + Send + Sync + 'static,
    {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Rebuild the list from tombstones and the backend.
    ///
    /// Backend failures are logged and leave only the visible seeds. Backend
    /// records that reuse a seed id or repeat an earlier id are dropped.
    pub async fn refresh(&self) {
        let _ = self.transition(|cache| {
            cache.loading = true;
            Ok(())
        });

        let stored = match self.tombstones.load().await {
            Ok(stored) => Some(stored),
            Err(err) => {
                warn!(error = %err, "could not read seed tombstones, keeping only seeds already shown");
                None
            }
        };

        let records = match self.backend.list_all().await {
            Ok(records) => records,
            Err(err) => {
                warn!(
                    backend = self.backend.name(),
                    kind = err.kind(),
                    error = %err,
                    "failed to fetch projects, showing defaults only"
                );
                Vec::new()
            }
        };

        let _ = self.transition(|cache| {
            // Seeds deleted while the fetch was in flight stay deleted.
            let hidden = match stored {
                Some(stored) => {
                    cache.suppressed.extend(stored);
                    cache.suppressed.clone()
                }
                None => {
                    // Unknown tombstones: a seed not on screen may have been deleted.
                    let mut hidden = cache.suppressed.clone();
                    hidden.extend(
                        seed_projects()
                            .into_iter()
                            .map(|seed| seed.id)
                            .filter(|id| !cache.contains(id)),
                    );
                    hidden
                }
            };

            let mut projects = visible_seeds(&hidden);
            let mut seen: HashSet<String> = projects.iter().map(|p| p.id.clone()).collect();
            for record in records {
                if is_seed_id(&record.id) || !seen.insert(record.id.clone()) {
                    warn!(
                        backend = self.backend.name(),
                        id = %record.id,
                        "dropping backend project with a clashing id"
                    );
                    continue;
                }
                projects.push(record);
            }
            cache.projects = projects;
            cache.loading = false;
            Ok(())
        });
    }

    pub async fn add(&self, identity: Option<&Identity>, draft: NewProject) -> Result<Project> {
        let actor = require_identity(identity, "add projects")?;
        let project = self.backend.create(&draft, actor).await?;
        self.transition(|cache| {
            cache.projects.push(project.clone());
            Ok(())
        })?;
        Ok(project)
    }

    /// Merge `update` into the project with `id`.
    ///
    /// Seed projects are only edited in the cache; the edit is gone after
    /// the next refresh.
    pub async fn update(
        &self,
        identity: Option<&Identity>,
        id: &str,
        update: ProjectUpdate,
    ) -> Result<()> {
        let actor = require_identity(identity, "update projects")?;
        if is_seed_id(id) {
            return self.transition(|cache| {
                let project = cache
                    .projects
                    .iter_mut()
                    .find(|p| p.id == id)
                    .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
                project.apply(&update);
                Ok(())
            });
        }

        if !self.cache().contains(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.backend.update(id, &update, actor).await?;
        self.transition(|cache| {
            if let Some(project) = cache.projects.iter_mut().find(|p| p.id == id) {
                project.apply(&update);
            }
            Ok(())
        })
    }

    /// Remove a project. Deleting a seed records a tombstone so it never comes back.
    pub async fn delete(&self, identity: Option<&Identity>, id: &str) -> Result<()> {
        let actor = require_identity(identity, "delete projects")?;
        if is_seed_id(id) {
            if self.cache().suppressed.contains(id) {
                return Err(StoreError::NotFound(id.to_string()));
            }
            self.tombstones.record(id).await?;
            return self.transition(|cache| {
                cache.suppressed.insert(id.to_string());
                cache.projects.retain(|p| p.id != id);
                Ok(())
            });
        }

        if !self.cache().contains(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.backend.delete(id, actor).await?;
        self.transition(|cache| {
            cache.projects.retain(|p| p.id != id);
            Ok(())
        })
    }
}
