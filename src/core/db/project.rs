use std::sync::{Arc, Mutex, PoisonError};

use time::OffsetDateTime;
use tracing::info;

use crate::{
    auth::Identity,
    core::{backend::ProjectBackend, db::LocalDevice},
    error::{Result, StoreError},
    models::{NewProject, Project, ProjectUpdate},
};

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: String,
    title: String,
    description: String,
    image: String,
    tech_stack: String,
    live_url: String,
    github_url: String,
}

impl TryFrom<ProjectRow> for Project {
    type Error = StoreError;

    fn try_from(row: ProjectRow) -> Result<Self> {
        Ok(Project {
            id: row.id,
            title: row.title,
            description: row.description,
            image: row.image,
            tech_stack: serde_json::from_str(&row.tech_stack)?,
            live_url: row.live_url,
            github_url: row.github_url,
        })
    }
}

/// Projects kept in the on-device database, in insertion order.
///
/// Ids are millisecond timestamps, bumped when two creates land in the
/// same millisecond so they stay unique.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    device: LocalDevice,
    last_id: Arc<Mutex<i64>>,
}

impl LocalBackend {
    pub async fn new(device: LocalDevice) -> Result<Self> {
        let max_id: Option<i64> =
            sqlx::query_scalar("SELECT MAX(CAST(id AS INTEGER)) FROM project")
                .fetch_one(device.pool())
                .await?;
        Ok(Self {
            device,
            last_id: Arc::new(Mutex::new(max_id.unwrap_or(0))),
        })
    }

    pub fn device(&self) -> &LocalDevice {
        &self.device
    }

    fn next_id(&self) -> String {
        let now_ms = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
        let mut last = self.last_id.lock().unwrap_or_else(PoisonError::into_inner);
        *last = now_ms.max(*last + 1);
        last.to_string()
    }
}

impl ProjectBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn list_all(&self) -> Result<Vec<Project>> {
        sqlx::query_as::<_, ProjectRow>(
            r#"SELECT id, title, description, image, tech_stack, live_url, github_url
            FROM project
            ORDER BY seq ASC"#,
        )
        .fetch_all(self.device.pool())
        .await?
        .into_iter()
        .map(Project::try_from)
        .collect()
    }

    async fn create(&self, draft: &NewProject, _actor: &Identity) -> Result<Project> {
        let id = self.next_id();
        let tech_stack = serde_json::to_string(&draft.tech_stack)?;
        sqlx::query(
            r#"INSERT INTO project (id, title, description, image, tech_stack, live_url, github_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(&id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.image)
        .bind(&tech_stack)
        .bind(&draft.live_url)
        .bind(&draft.github_url)
        .execute(self.device.pool())
        .await?;
        info!(id = %id, backend = "local", "project created");
        Ok(draft.clone().into_project(id))
    }

    async fn update(&self, id: &str, update: &ProjectUpdate, _actor: &Identity) -> Result<()> {
        let mut tx = self.device.pool().begin().await?;
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"SELECT id, title, description, image, tech_stack, live_url, github_url
            FROM project
            WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut project = Project::try_from(row)?;
        project.apply(update);
        let tech_stack = serde_json::to_string(&project.tech_stack)?;
        sqlx::query(
            r#"UPDATE project
            SET title = $1, description = $2, image = $3, tech_stack = $4, live_url = $5, github_url = $6
            WHERE id = $7"#,
        )
        .bind(&project.title)
        .bind(&project.description)
        .bind(&project.image)
        .bind(&tech_stack)
        .bind(&project.live_url)
        .bind(&project.github_url)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        info!(id = %id, backend = "local", fields = ?update.field_paths(), "project updated");
        Ok(())
    }

    async fn delete(&self, id: &str, _actor: &Identity) -> Result<()> {
        let result = sqlx::query("DELETE FROM project WHERE id = $1")
            .bind(id)
            .execute(self.device.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        info!(id = %id, backend = "local", "project deleted");
        Ok(())
    }
}
