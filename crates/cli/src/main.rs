use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use resolver::{PathResolver, ProjectStore};
use server::config::{ServiceConfig, CONFIG_FILE, STUDIO_DIR};
use server::{create_router, state::AppState};
use tischiron_core::Resolution;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tischiron-studio")]
#[command(about = "Control service for tischiron driver generation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory holding `.tischiron-studio/` and the relative paths it names
    #[arg(short = 'C', long, global = true)]
    dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// CLI program or path
        #[arg(long)]
        program: Option<String>,

        /// Local checkout root for remote build paths
        #[arg(long)]
        local_root: Option<PathBuf>,
    },
    /// Run the HTTP service
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(long)]
        host: Option<String>,
    },
    /// Show configuration and initialized projects
    Status,
    /// Resolve a project file to a local path
    Resolve { project: String, file: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let base = match cli.dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Some(Commands::Init {
            program,
            local_root,
        }) => init_config(&base, program, local_root).await,
        Some(Commands::Serve { port, host }) => serve(&base, port, host).await,
        Some(Commands::Status) => status(&base).await,
        Some(Commands::Resolve { project, file }) => resolve(&base, &project, &file).await,
        None => serve(&base, None, None).await,
    }
}

async fn init_config(base: &Path, program: Option<String>, local_root: Option<PathBuf>) -> Result<()> {
    let config_path = ServiceConfig::path(base);

    if config_path.exists() {
        println!("Already initialized at {}", config_path.display());
        return Ok(());
    }

    let mut config = ServiceConfig::default();
    if let Some(program) = program {
        config.cli.program = program;
    }
    config.paths.local_root_override = local_root;

    config
        .write(base)
        .await
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!();
    println!("Initialized tischiron-studio in {}", base.display());
    println!();
    println!("Created:");
    println!("  {}/", STUDIO_DIR);
    println!("  └── {}", CONFIG_FILE);
    println!();
    println!("Next steps:");
    println!("  1. Run 'tischiron init <compile_commands.json>' to index a project");
    println!("  2. Run 'tischiron-studio serve' to start the service");

    Ok(())
}

async fn serve(base: &Path, port: Option<u16>, host: Option<String>) -> Result<()> {
    init_tracing();

    let mut config = ServiceConfig::load(base).await;
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(host) = host {
        config.server.host = host;
    }

    let address = config.bind_address();
    let port = config.server.port;

    let state = AppState::new(config);
    let orchestrator = state.orchestrator.clone();
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    println!();
    println!("tischiron-studio");
    println!("════════════════════════════════════════");
    println!();
    println!("  API Server:  http://localhost:{}", port);
    println!("  Swagger UI:  http://localhost:{}/swagger-ui", port);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
            orchestrator.shutdown();
        })
        .await?;

    Ok(())
}

async fn status(base: &Path) -> Result<()> {
    let config_path = ServiceConfig::path(base);
    let config = ServiceConfig::load(base).await;
    let program = config.cli_config().program;
    let store = ProjectStore::new(&config.paths.projects_dir);

    println!();
    println!(
        "Config:       {}{}",
        config_path.display(),
        if config_path.exists() { "" } else { " (defaults)" }
    );
    println!(
        "CLI:          {}{}",
        program.display(),
        if program.is_file() { "" } else { " (not found)" }
    );
    println!("Projects dir: {}", config.paths.projects_dir.display());
    match &config.paths.local_root_override {
        Some(root) => println!("Local root:   {}", root.display()),
        None => println!("Local root:   (not set)"),
    }
    println!();

    let projects = store.list_projects().await?;
    if projects.is_empty() {
        println!("No projects yet.");
    } else {
        println!("Projects ({}):", projects.len());
        for name in &projects {
            let files = store.list_files(name).await.map(|f| f.len()).unwrap_or(0);
            println!("  {} ({} files)", name, files);
        }
    }

    println!();

    Ok(())
}

async fn resolve(base: &Path, project: &str, file: &str) -> Result<()> {
    let config = ServiceConfig::load(base).await;
    let store = ProjectStore::new(&config.paths.projects_dir);
    let resolver = PathResolver::new(config.resolver_config());

    let record = store.find_file(project, file).await?;
    let request = resolver.request(record.path.clone(), record.name.clone())?;

    match resolver.resolve(&request) {
        Resolution::Found { path, strategy } => {
            println!("{}", path.display());
            eprintln!("({} via {})", record.path, strategy.as_str());
            Ok(())
        }
        Resolution::Unresolved => bail!(
            "{} is not available locally; set {} to the checkout of the remote work directory",
            record.path,
            server::config::LOCAL_ROOT_ENV
        ),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tischiron_studio=info,server=info,orchestrator=info,resolver=info,tower_http=info"
                    .into()
            }),
        )
        .init();
}
