//! Read-only access to the project metadata written by `tischiron init`
//!
//! Layout under the projects directory:
//!
//! ```text
//! <projects_dir>/<project>/project.json
//! <projects_dir>/<project>/files/<safe_name>.json
//! ```

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tischiron_core::{FileRecord, ProjectMetadata};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{MetadataError, Result};

const PROJECT_FILE: &str = "project.json";
const FILES_DIR: &str = "files";

#[derive(Debug, Clone)]
pub struct ProjectStore {
    projects_dir: PathBuf,
}

impl ProjectStore {
    pub fn new(projects_dir: impl Into<PathBuf>) -> Self {
        Self {
            projects_dir: projects_dir.into(),
        }
    }

    pub fn projects_dir(&self) -> &Path {
        &self.projects_dir
    }

    /// Names of all initialized projects, sorted.
    ///
    /// A missing projects directory means no projects.
    pub async fn list_projects(&self) -> Result<Vec<String>> {
        let mut entries = match fs::read_dir(&self.projects_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.projects_dir.display(), "Projects directory does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut projects = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.is_dir() && path.join(PROJECT_FILE).is_file() {
                projects.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        projects.sort();
        Ok(projects)
    }

    pub async fn project_exists(&self, project: &str) -> bool {
        match self.project_dir(project) {
            Ok(dir) => fs::metadata(dir.join(PROJECT_FILE))
                .await
                .map(|meta| meta.is_file())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    pub async fn get_project(&self, project: &str) -> Result<ProjectMetadata> {
        let path = self.project_dir(project)?.join(PROJECT_FILE);
        match fs::read_to_string(&path).await {
            Ok(content) => parse(&path, &content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(MetadataError::ProjectNotFound(project.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All file records of a project, sorted by name.
    ///
    /// Records that cannot be parsed are skipped with a warning.
    pub async fn list_files(&self, project: &str) -> Result<Vec<FileRecord>> {
        if !self.project_exists(project).await {
            return Err(MetadataError::ProjectNotFound(project.to_string()));
        }

        let files_dir = self.project_dir(project)?.join(FILES_DIR);
        let mut entries = match fs::read_dir(&files_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let record = match fs::read_to_string(&path).await {
                Ok(content) => parse::<FileRecord>(&path, &content),
                Err(e) => Err(e.into()),
            };

            match record {
                Ok(record) => files.push(record),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping file record"),
            }
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    /// Look a file up by exact base name, then by path suffix.
    pub async fn find_file(&self, project: &str, filename: &str) -> Result<FileRecord> {
        let files = self.list_files(project).await?;

        if let Some(record) = files.iter().find(|f| f.name == filename) {
            return Ok(record.clone());
        }

        files
            .into_iter()
            .find(|f| f.path.ends_with(filename))
            .ok_or_else(|| MetadataError::FileNotFound {
                project: project.to_string(),
                file: filename.to_string(),
            })
    }

    fn project_dir(&self, project: &str) -> Result<PathBuf> {
        validate_project_name(project)?;
        Ok(self.projects_dir.join(project))
    }
}

fn validate_project_name(project: &str) -> Result<()> {
    let invalid = project.is_empty()
        || project == "."
        || project == ".."
        || project.contains(['/', '\\']);

    if invalid {
        return Err(MetadataError::InvalidProjectName(project.to_string()));
    }
    Ok(())
}

fn parse<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T> {
    serde_json::from_str(content).map_err(|source| MetadataError::Json {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_project(root: &Path, name: &str, files: &[(&str, &str)]) {
        let project_dir = root.join(name);
        std::fs::create_dir_all(project_dir.join(FILES_DIR)).unwrap();
        std::fs::write(
            project_dir.join(PROJECT_FILE),
            format!(
                r#"{{"name":"{name}","remote_work_dir":"/home/ci/work/{name}","compilation_db_path":"/tmp/cc.json"}}"#
            ),
        )
        .unwrap();

        for (file, remote_path) in files {
            std::fs::write(
                project_dir.join(FILES_DIR).join(format!("{file}.json")),
                format!(r#"{{"name":"{file}","path":"{remote_path}","directory":"/home/ci/work"}}"#),
            )
            .unwrap();
        }
    }

    #[tokio::test]
    async fn test_list_projects_missing_dir() {
        let temp = TempDir::new().unwrap();
        let store = ProjectStore::new(temp.path().join("nope"));
        assert!(store.list_projects().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_projects_sorted_and_filtered() {
        let temp = TempDir::new().unwrap();
        write_project(temp.path(), "zlib", &[]);
        write_project(temp.path(), "json-c", &[]);
        std::fs::create_dir_all(temp.path().join("half-initialized")).unwrap();

        let store = ProjectStore::new(temp.path());
        assert_eq!(store.list_projects().await.unwrap(), vec!["json-c", "zlib"]);
    }

    #[tokio::test]
    async fn test_get_project() {
        let temp = TempDir::new().unwrap();
        write_project(temp.path(), "json-c", &[]);

        let store = ProjectStore::new(temp.path());
        let meta = store.get_project("json-c").await.unwrap();
        assert_eq!(meta.remote_work_dir, "/home/ci/work/json-c");

        let err = store.get_project("missing").await.unwrap_err();
        assert!(matches!(err, MetadataError::ProjectNotFound(_)));
    }

    #[tokio::test]
    async fn test_project_name_traversal_rejected() {
        let temp = TempDir::new().unwrap();
        let store = ProjectStore::new(temp.path());

        let err = store.get_project("../etc").await.unwrap_err();
        assert!(matches!(err, MetadataError::InvalidProjectName(_)));
        assert!(!store.project_exists("..").await);
    }

    #[tokio::test]
    async fn test_list_files_sorted_skipping_bad_records() {
        let temp = TempDir::new().unwrap();
        write_project(
            temp.path(),
            "json-c",
            &[
                ("json_util.c", "/home/ci/work/json-c/json_util.c"),
                ("arraylist.c", "/home/ci/work/json-c/arraylist.c"),
            ],
        );
        std::fs::write(temp.path().join("json-c/files/broken.json"), "{not json").unwrap();

        let store = ProjectStore::new(temp.path());
        let files = store.list_files("json-c").await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["arraylist.c", "json_util.c"]);
    }

    #[tokio::test]
    async fn test_find_file_by_name_then_suffix() {
        let temp = TempDir::new().unwrap();
        write_project(
            temp.path(),
            "json-c",
            &[("json_object.c", "/home/ci/work/json-c/json_object.c")],
        );

        let store = ProjectStore::new(temp.path());
        let by_name = store.find_file("json-c", "json_object.c").await.unwrap();
        assert_eq!(by_name.path, "/home/ci/work/json-c/json_object.c");

        let by_suffix = store
            .find_file("json-c", "json-c/json_object.c")
            .await
            .unwrap();
        assert_eq!(by_suffix.name, "json_object.c");

        let err = store.find_file("json-c", "nope.c").await.unwrap_err();
        assert!(matches!(err, MetadataError::FileNotFound { .. }));
    }
}
