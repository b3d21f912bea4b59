pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tischiron Studio API",
        version = "0.1.0",
        description = "Control service for the tischiron driver generation CLI"
    ),
    paths(
        routes::health_check,
        routes::projects::list_projects,
        routes::projects::list_project_files,
        routes::projects::init_project,
        routes::files::resolve_file,
        routes::files::list_file_functions,
        routes::cli::cli_list,
        routes::generate::generate,
    ),
    components(schemas(
        routes::HealthResponse,
        routes::projects::ProjectSummary,
        routes::projects::ProjectsResponse,
        routes::projects::InitProjectRequest,
        routes::files::ResolveResponse,
        routes::files::FunctionsResponse,
        routes::cli::CliOutputResponse,
        routes::generate::GenerateRequest,
        resolver::FunctionInfo,
        tischiron_core::FileRecord,
        tischiron_core::ResolutionStrategy,
        tischiron_core::GenerationRequest,
        events::ProgressEvent,
    )),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "projects", description = "Project metadata and initialization"),
        (name = "files", description = "Local resolution of indexed source files"),
        (name = "cli", description = "One-shot CLI commands"),
        (name = "generate", description = "Driver generation with SSE progress"),
    )
)]
pub struct ApiDoc;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", ApiDoc::openapi()))
        .route("/health", get(routes::health_check))
        .route("/api/projects", get(routes::projects::list_projects))
        .route("/api/projects/init", post(routes::projects::init_project))
        .route(
            "/api/projects/{project}/files",
            get(routes::projects::list_project_files),
        )
        .route(
            "/api/projects/{project}/files/{filename}/resolve",
            get(routes::files::resolve_file),
        )
        .route(
            "/api/projects/{project}/files/{filename}/functions",
            get(routes::files::list_file_functions),
        )
        .route("/api/cli/list", get(routes::cli::cli_list))
        .route("/api/generate", post(routes::generate::generate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
