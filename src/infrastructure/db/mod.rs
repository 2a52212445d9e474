pub mod connection;
pub mod projects;

use crate::domain::error::Result;
use crate::domain::project::ValidationProject;
use async_trait::async_trait;

pub use projects::ProjectRepository;

/// Key-value persistence of validation projects, keyed by project id.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Creates or fully replaces the stored record (last writer wins).
    async fn save_project(&self, project: &ValidationProject) -> Result<()>;
    async fn get_project(&self, project_id: &str) -> Result<ValidationProject>;
    async fn list_projects(&self) -> Result<Vec<ValidationProject>>;
}
