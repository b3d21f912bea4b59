//! Run with: cargo run --package server --bin generate-types --features typescript [-- <out_dir>]

use std::fs;
use std::path::PathBuf;

fn main() {
    println!("Generating TypeScript types...");

    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("bindings"));

    if let Err(e) = fs::create_dir_all(&out_dir) {
        eprintln!("Failed to create output directory: {}", e);
        std::process::exit(1);
    }

    #[cfg(feature = "typescript")]
    {
        use ts_rs::TS;

        tischiron_core::GenerationRequest::export_all_to(&out_dir)
            .expect("Failed to export GenerationRequest");
        tischiron_core::ProjectMetadata::export_all_to(&out_dir)
            .expect("Failed to export ProjectMetadata");
        tischiron_core::FileRecord::export_all_to(&out_dir).expect("Failed to export FileRecord");
        tischiron_core::ResolutionStrategy::export_all_to(&out_dir)
            .expect("Failed to export ResolutionStrategy");

        events::ProgressEvent::export_all_to(&out_dir).expect("Failed to export ProgressEvent");

        resolver::FunctionInfo::export_all_to(&out_dir).expect("Failed to export FunctionInfo");

        server::routes::HealthResponse::export_all_to(&out_dir)
            .expect("Failed to export HealthResponse");
        server::routes::projects::ProjectSummary::export_all_to(&out_dir)
            .expect("Failed to export ProjectSummary");
        server::routes::projects::ProjectsResponse::export_all_to(&out_dir)
            .expect("Failed to export ProjectsResponse");
        server::routes::projects::InitProjectRequest::export_all_to(&out_dir)
            .expect("Failed to export InitProjectRequest");
        server::routes::files::ResolveResponse::export_all_to(&out_dir)
            .expect("Failed to export ResolveResponse");
        server::routes::files::FunctionsResponse::export_all_to(&out_dir)
            .expect("Failed to export FunctionsResponse");
        server::routes::cli::CliOutputResponse::export_all_to(&out_dir)
            .expect("Failed to export CliOutputResponse");
        server::routes::generate::GenerateRequest::export_all_to(&out_dir)
            .expect("Failed to export GenerateRequest");
    }

    use std::io::Write;

    let index_path = out_dir.join("index.ts");
    let mut file = fs::File::create(&index_path).expect("Failed to create index.ts");

    let exports = r#"// Auto-generated by generate-types. Do not edit.

export * from './GenerationRequest';
export * from './ProjectMetadata';
export * from './FileRecord';
export * from './ResolutionStrategy';

export * from './ProgressEvent';

export * from './FunctionInfo';

export * from './HealthResponse';
export * from './ProjectSummary';
export * from './ProjectsResponse';
export * from './InitProjectRequest';
export * from './ResolveResponse';
export * from './FunctionsResponse';
export * from './CliOutputResponse';
export * from './GenerateRequest';
"#;

    file.write_all(exports.as_bytes())
        .expect("Failed to write index.ts");

    println!("Generated {}", index_path.display());
}
