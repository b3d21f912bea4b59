use std::sync::Arc;

use orchestrator::Orchestrator;
use resolver::{PathResolver, ProjectStore};
use tischiron_core::{FileRecord, Resolution};

use crate::config::ServiceConfig;
use crate::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub resolver: Arc<PathResolver>,
    pub store: ProjectStore,
    pub orchestrator: Orchestrator,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Self {
        let resolver = Arc::new(PathResolver::new(config.resolver_config()));
        let store = ProjectStore::new(&config.paths.projects_dir);
        let orchestrator = Orchestrator::new(config.cli_config());

        tracing::info!(
            projects_dir = %config.paths.projects_dir.display(),
            project_root = %config.paths.project_root.display(),
            cli = %orchestrator.cli().program.display(),
            "Service state ready"
        );

        Self {
            config: Arc::new(config),
            resolver,
            store,
            orchestrator,
        }
    }

    /// Look a file up in project metadata and map its recorded path locally.
    ///
    /// The resolver walks the filesystem, so it runs on the blocking pool.
    pub async fn resolve_file(
        &self,
        project: &str,
        filename: &str,
    ) -> Result<(FileRecord, Resolution), AppError> {
        let record = self.store.find_file(project, filename).await?;
        let request = self.resolver.request(record.path.clone(), record.name.clone())?;

        let resolver = Arc::clone(&self.resolver);
        let resolution = tokio::task::spawn_blocking(move || resolver.resolve(&request))
            .await
            .map_err(|e| AppError::Internal(format!("Resolver task failed: {}", e)))?;

        Ok((record, resolution))
    }
}
