use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use orchestrator::CliConfig;
use resolver::ResolverConfig;
use serde::{Deserialize, Serialize};
use tischiron_core::default_artifact_name;
use tokio::fs;
use tracing::{debug, warn};

pub const STUDIO_DIR: &str = ".tischiron-studio";
pub const CONFIG_FILE: &str = "config.toml";

/// Local checkout root used for remapping remote build paths
pub const LOCAL_ROOT_ENV: &str = "TISCHIRON_LOCAL_ROOT";

pub const DEFAULT_PORT: u16 = 3001;

/// Service configuration stored in `.tischiron-studio/config.toml`.
///
/// Every section and field is optional in the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerSection,
    pub cli: CliSection,
    pub paths: PathsSection,
    pub generation: GenerationSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub port: u16,
    pub host: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: "0.0.0.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliSection {
    /// Program name (looked up on PATH) or path to the CLI
    pub program: String,
    /// Arguments placed before the subcommand
    pub prefix_args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

impl Default for CliSection {
    fn default() -> Self {
        Self {
            program: orchestrator::DEFAULT_PROGRAM.to_string(),
            prefix_args: Vec::new(),
            working_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    /// Where `tischiron init` keeps project metadata
    pub projects_dir: PathBuf,
    /// Local tree searched for sibling and recursive matches
    pub project_root: PathBuf,
    /// Default directory for generated drivers
    pub output_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_root_override: Option<PathBuf>,
    pub remote_anchors: Vec<String>,
    pub max_search_depth: usize,
}

impl Default for PathsSection {
    fn default() -> Self {
        let defaults = ResolverConfig::default();
        Self {
            projects_dir: PathBuf::from(".tisaidga/projects"),
            project_root: PathBuf::from("."),
            output_dir: PathBuf::from("drivers"),
            local_root_override: None,
            remote_anchors: defaults.remote_anchors,
            max_search_depth: defaults.max_search_depth,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSection {
    pub default_model: String,
    pub default_max_iterations: u32,
}

impl Default for GenerationSection {
    fn default() -> Self {
        Self {
            default_model: "gpt-4o-mini".to_string(),
            default_max_iterations: 5,
        }
    }
}

impl ServiceConfig {
    pub fn path(base: &Path) -> PathBuf {
        base.join(STUDIO_DIR).join(CONFIG_FILE)
    }

    /// Read, apply the environment and anchor relative paths at `base`.
    pub async fn load(base: &Path) -> Self {
        Self::read(base)
            .await
            .with_local_root_env(std::env::var_os(LOCAL_ROOT_ENV))
            .rooted_at(base)
    }

    /// Read the config file under `base`, falling back to defaults
    pub async fn read(base: &Path) -> Self {
        let config_path = Self::path(base);

        if !config_path.exists() {
            debug!(path = %config_path.display(), "Config file does not exist, using defaults");
            return Self::default();
        }

        match fs::read_to_string(&config_path).await {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    debug!(path = %config_path.display(), "Config loaded successfully");
                    config
                }
                Err(e) => {
                    warn!(path = %config_path.display(), error = %e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %config_path.display(), error = %e, "Failed to read config file, using defaults");
                Self::default()
            }
        }
    }

    pub async fn write(&self, base: &Path) -> std::io::Result<()> {
        let config_path = Self::path(base);
        if let Some(dir) = config_path.parent() {
            fs::create_dir_all(dir).await?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        fs::write(&config_path, content).await?;
        debug!(path = %config_path.display(), "Config saved successfully");

        Ok(())
    }

    /// A non-empty environment value replaces the configured override root.
    pub fn with_local_root_env(mut self, value: Option<OsString>) -> Self {
        if let Some(root) = value.filter(|v| !v.is_empty()) {
            self.paths.local_root_override = Some(PathBuf::from(root));
        }
        self
    }

    /// Expand `~` and resolve relative paths against `base`.
    pub fn rooted_at(mut self, base: &Path) -> Self {
        let paths = &mut self.paths;
        paths.projects_dir = anchor(&paths.projects_dir, base);
        paths.project_root = anchor(&paths.project_root, base);
        paths.output_dir = anchor(&paths.output_dir, base);
        paths.local_root_override = paths.local_root_override.as_deref().map(|p| anchor(p, base));
        self.cli.working_dir = self.cli.working_dir.as_deref().map(|p| anchor(p, base));
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        let config = ResolverConfig::new(&self.paths.project_root)
            .with_remote_anchors(self.paths.remote_anchors.clone())
            .with_max_search_depth(self.paths.max_search_depth);

        match &self.paths.local_root_override {
            Some(root) => config.with_local_root_override(root),
            None => config,
        }
    }

    pub fn cli_config(&self) -> CliConfig {
        let cli = CliConfig::discover(&self.cli.program).with_prefix_args(self.cli.prefix_args.clone());
        match &self.cli.working_dir {
            Some(dir) => cli.with_working_dir(dir),
            None => cli,
        }
    }

    /// `<output_dir>/Driver_for_<function>.c`
    pub fn default_output_path(&self, function: &str) -> PathBuf {
        self.paths.output_dir.join(default_artifact_name(function))
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => match dirs::home_dir() {
            Some(home) => home.join(components.as_path()),
            None => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}

fn anchor(path: &Path, base: &Path) -> PathBuf {
    let expanded = expand_tilde(path);
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}
