use super::ProjectStore;
use crate::domain::error::{AppError, Result};
use crate::domain::project::ValidationProject;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;

/// One row per project; `record_json` holds the whole project verbatim.
pub struct ProjectRepository {
    pool: SqlitePool,
}

impl ProjectRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn in_memory() -> Result<Self> {
        let pool = super::connection::init_memory_db().await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl ProjectStore for ProjectRepository {
    async fn save_project(&self, project: &ValidationProject) -> Result<()> {
        let record_json = serde_json::to_string(project).map_err(|e| {
            AppError::Internal(format!("Failed to serialize project {}: {e}", project.id))
        })?;
        let updated_at = chrono::Utc::now().timestamp_millis();

        sqlx::query(
            "INSERT INTO projects (id, name, status, created_at, updated_at, record_json)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                status = excluded.status,
                updated_at = excluded.updated_at,
                record_json = excluded.record_json",
        )
        .bind(&project.id)
        .bind(&project.name)
        .bind(project.status.as_str())
        .bind(project.created_at)
        .bind(updated_at)
        .bind(&record_json)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to save project: {e}")))?;

        Ok(())
    }

    async fn get_project(&self, project_id: &str) -> Result<ValidationProject> {
        let row = sqlx::query_as::<_, ProjectEntity>(
            "SELECT id, record_json FROM projects WHERE id = ?",
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch project: {e}")))?;

        match row {
            Some(row) => row.into_project(),
            None => Err(AppError::NotFound(format!(
                "Project not found: {}",
                project_id
            ))),
        }
    }

    async fn list_projects(&self) -> Result<Vec<ValidationProject>> {
        let rows = sqlx::query_as::<_, ProjectEntity>(
            "SELECT id, record_json FROM projects ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list projects: {e}")))?;

        rows.into_iter().map(ProjectEntity::into_project).collect()
    }
}

#[derive(sqlx::FromRow)]
struct ProjectEntity {
    id: String,
    record_json: String,
}

impl ProjectEntity {
    fn into_project(self) -> Result<ValidationProject> {
        serde_json::from_str(&self.record_json).map_err(|e| {
            AppError::DatabaseError(format!("Corrupt project record {}: {e}", self.id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::project::ProjectStatus;
    use crate::domain::requirement::{Priority, Requirement, RequirementCategory};
    use crate::domain::test_case::{TestCase, TestStep};

    fn project(name: &str, created_at: i64) -> ValidationProject {
        let mut project = ValidationProject::new_draft(
            name,
            "1.0.0",
            vec![Requirement::new(0, RequirementCategory::Functional, "Login works", Priority::High)],
            vec![TestCase::new(
                "TC-001",
                "REQ-001",
                "Valid login",
                vec![TestStep::new(1, "Submit form", "Dashboard shown")],
            )],
            Vec::new(),
        );
        project.created_at = created_at;
        project
    }

    #[tokio::test]
    async fn test_save_and_get_round_trips_full_record() {
        let repo = ProjectRepository::in_memory().await.unwrap();
        let original = project("Login", 1);

        repo.save_project(&original).await.unwrap();
        let loaded = repo.get_project(&original.id).await.unwrap();

        assert_eq!(loaded, original);
    }

    #[tokio::test]
    async fn test_save_replaces_existing_record() {
        let repo = ProjectRepository::in_memory().await.unwrap();
        let mut record = project("Login", 1);
        repo.save_project(&record).await.unwrap();

        record.status = ProjectStatus::InProgress;
        record.test_cases.clear();
        repo.save_project(&record).await.unwrap();

        let all = repo.list_projects().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, ProjectStatus::InProgress);
        assert!(all[0].test_cases.is_empty());
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let repo = ProjectRepository::in_memory().await.unwrap();
        repo.save_project(&project("Old", 10)).await.unwrap();
        repo.save_project(&project("New", 20)).await.unwrap();

        let names: Vec<String> = repo
            .list_projects()
            .await
            .unwrap()
            .into_iter()
            .map(|project| project.name)
            .collect();
        assert_eq!(names, vec!["New".to_string(), "Old".to_string()]);
    }

    #[tokio::test]
    async fn test_get_missing_project_is_not_found() {
        let repo = ProjectRepository::in_memory().await.unwrap();
        let err = repo.get_project("missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
