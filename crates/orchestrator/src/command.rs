//! Command lines for the `tischiron` CLI
//!
//! Argument order and flag names are the contract with the external tool.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tischiron_core::GenerationRequest;
use tokio::process::Command;
use tracing::debug;

pub const DEFAULT_PROGRAM: &str = "tischiron";

/// One invocation of the CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// `init <dbPath> [--name <n>] -v`
    Init {
        compilation_db: PathBuf,
        name: Option<String>,
    },
    /// `list [<project>] [-v]`
    List {
        project: Option<String>,
        verbose: bool,
    },
    /// `gen <project> <file> <function> --model <m> --max-iterations <n> --output <path> --with-logs --context function -v`
    Gen(GenerationRequest),
}

impl CliCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::List { .. } => "list",
            Self::Gen(_) => "gen",
        }
    }

    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![self.name().into()];

        match self {
            Self::Init {
                compilation_db,
                name,
            } => {
                args.push(compilation_db.into());
                if let Some(name) = name {
                    args.push("--name".into());
                    args.push(name.into());
                }
                args.push("-v".into());
            }
            Self::List { project, verbose } => {
                if let Some(project) = project {
                    args.push(project.into());
                }
                if *verbose {
                    args.push("-v".into());
                }
            }
            Self::Gen(request) => {
                args.push((&request.project_id).into());
                args.push((&request.source_file).into());
                args.push((&request.target_function).into());
                args.push("--model".into());
                args.push((&request.model_name).into());
                args.push("--max-iterations".into());
                args.push(request.max_iterations.to_string().into());
                args.push("--output".into());
                args.push(request.artifact_path().into());
                args.push("--with-logs".into());
                args.push("--context".into());
                args.push("function".into());
                args.push("-v".into());
            }
        }

        args
    }
}

/// How to launch the CLI on this host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub program: PathBuf,
    /// Arguments placed before the subcommand, e.g. `["-m", "tischiron"]`
    /// when the program is a Python interpreter
    pub prefix_args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl CliConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            prefix_args: Vec::new(),
            working_dir: None,
        }
    }

    /// Look a bare program name up on `PATH`.
    ///
    /// Paths and names that cannot be found are kept as given, so the
    /// failure surfaces when the process is spawned.
    pub fn discover(program: &str) -> Self {
        if program.contains(std::path::MAIN_SEPARATOR) {
            return Self::new(program);
        }

        match which::which(program) {
            Ok(path) => {
                debug!("Found {} at {}", program, path.display());
                Self::new(path)
            }
            Err(_) => Self::new(program),
        }
    }

    pub fn with_prefix_args(mut self, args: Vec<String>) -> Self {
        self.prefix_args = args;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Full argument vector, prefix included
    pub fn argv(&self, command: &CliCommand) -> Vec<OsString> {
        self.prefix_args
            .iter()
            .map(OsString::from)
            .chain(command.args())
            .collect()
    }

    /// A ready to spawn process with no stdin and piped output.
    pub fn command(&self, command: &CliCommand) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.argv(command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        cmd
    }

    /// Where a path handed to the CLI ends up, given its working directory
    pub fn locate(&self, path: &Path) -> PathBuf {
        match &self.working_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.into_string().unwrap())
            .collect()
    }

    fn gen_request() -> GenerationRequest {
        GenerationRequest {
            project_id: "json-c".into(),
            source_file: "json_object.c".into(),
            target_function: "json_object_get".into(),
            model_name: "gpt-4o-mini".into(),
            max_iterations: 5,
            output_artifact_path: PathBuf::from("drivers/Driver_for_json_object_get.c"),
        }
    }

    #[test]
    fn test_gen_args() {
        assert_eq!(
            strings(CliCommand::Gen(gen_request()).args()),
            vec![
                "gen",
                "json-c",
                "json_object.c",
                "json_object_get",
                "--model",
                "gpt-4o-mini",
                "--max-iterations",
                "5",
                "--output",
                "drivers/Driver_for_json_object_get.c",
                "--with-logs",
                "--context",
                "function",
                "-v",
            ]
        );
    }

    #[test]
    fn test_init_args() {
        let with_name = CliCommand::Init {
            compilation_db: PathBuf::from("/tmp/compile_commands.json"),
            name: Some("json-c".into()),
        };
        assert_eq!(
            strings(with_name.args()),
            vec!["init", "/tmp/compile_commands.json", "--name", "json-c", "-v"]
        );

        let without_name = CliCommand::Init {
            compilation_db: PathBuf::from("cc.json"),
            name: None,
        };
        assert_eq!(strings(without_name.args()), vec!["init", "cc.json", "-v"]);
    }

    #[test]
    fn test_list_args() {
        let all = CliCommand::List {
            project: None,
            verbose: false,
        };
        assert_eq!(strings(all.args()), vec!["list"]);

        let one = CliCommand::List {
            project: Some("json-c".into()),
            verbose: true,
        };
        assert_eq!(strings(one.args()), vec!["list", "json-c", "-v"]);
    }

    #[test]
    fn test_prefix_args_come_first() {
        let cli = CliConfig::new("python3").with_prefix_args(vec!["-m".into(), "tischiron".into()]);
        let list = CliCommand::List {
            project: None,
            verbose: true,
        };
        assert_eq!(
            strings(cli.argv(&list)),
            vec!["-m", "tischiron", "list", "-v"]
        );
    }

    #[test]
    fn test_locate_relative_to_working_dir() {
        let cli = CliConfig::new("tischiron").with_working_dir("/srv/tis");
        assert_eq!(
            cli.locate(Path::new("drivers/a.c")),
            PathBuf::from("/srv/tis/drivers/a.c")
        );
        assert_eq!(cli.locate(Path::new("/abs/a.c")), PathBuf::from("/abs/a.c"));
        assert_eq!(
            CliConfig::default().locate(Path::new("a.c")),
            PathBuf::from("a.c")
        );
    }

    #[test]
    fn test_discover_keeps_paths_and_unknown_names() {
        assert_eq!(
            CliConfig::discover("/opt/tis/bin/tischiron").program,
            PathBuf::from("/opt/tis/bin/tischiron")
        );
        assert_eq!(
            CliConfig::discover("definitely-not-a-real-binary-xyz").program,
            PathBuf::from("definitely-not-a-real-binary-xyz")
        );
    }
}
