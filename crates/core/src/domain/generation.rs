use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use utoipa::ToSchema;

use crate::error::CoreError;

/// Everything the external CLI needs for one `gen` run.
///
/// Built by the gateway and consumed once by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct GenerationRequest {
    pub project_id: String,
    pub source_file: String,
    pub target_function: String,
    pub model_name: String,
    pub max_iterations: u32,
    #[schema(value_type = String)]
    #[cfg_attr(feature = "typescript", ts(type = "string"))]
    pub output_artifact_path: PathBuf,
}

impl GenerationRequest {
    pub fn validate(&self) -> Result<(), CoreError> {
        for (field, value) in [
            ("project_id", &self.project_id),
            ("source_file", &self.source_file),
            ("model_name", &self.model_name),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::invalid(field, "must not be empty"));
            }
        }

        if !is_c_identifier(&self.target_function) {
            return Err(CoreError::invalid(
                "target_function",
                format!("'{}' is not a C identifier", self.target_function),
            ));
        }

        if self.max_iterations == 0 {
            return Err(CoreError::invalid("max_iterations", "must be at least 1"));
        }

        if self.output_artifact_path.as_os_str().is_empty() {
            return Err(CoreError::invalid("output_artifact_path", "must not be empty"));
        }

        Ok(())
    }

    pub fn artifact_path(&self) -> &Path {
        &self.output_artifact_path
    }
}

/// File name the CLI writes a successful driver to when `--output` is not given.
pub fn default_artifact_name(function: &str) -> String {
    format!("Driver_for_{}.c", function)
}

pub fn is_c_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A single path component that stays inside whatever directory it is joined to.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            project_id: "json-c".to_string(),
            source_file: "json_object.c".to_string(),
            target_function: "json_object_get_int".to_string(),
            model_name: "gpt-4o-mini".to_string(),
            max_iterations: 5,
            output_artifact_path: PathBuf::from("drivers/Driver_for_json_object_get_int.c"),
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let mut req = request();
        req.max_iterations = 0;
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("max_iterations"));
    }

    #[test]
    fn test_function_must_be_identifier() {
        let mut req = request();
        req.target_function = "../etc/passwd".to_string();
        assert!(req.validate().is_err());

        req.target_function = "foo; rm -rf /".to_string();
        assert!(req.validate().is_err());

        req.target_function = "_private_fn2".to_string();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_blank_model_rejected() {
        let mut req = request();
        req.model_name = " ".to_string();
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("model_name"));
    }

    #[test]
    fn test_default_artifact_name() {
        assert_eq!(
            default_artifact_name("json_tokener_parse"),
            "Driver_for_json_tokener_parse.c"
        );
    }

    #[test]
    fn test_is_c_identifier() {
        assert!(is_c_identifier("main"));
        assert!(!is_c_identifier(""));
        assert!(!is_c_identifier("1abc"));
        assert!(!is_c_identifier("a-b"));
    }

    #[test]
    fn test_is_plain_file_name() {
        assert!(is_plain_file_name("Driver_for_main.c"));
        assert!(is_plain_file_name("custom.driver.c"));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("../secret.c"));
        assert!(!is_plain_file_name("/etc/passwd"));
        assert!(!is_plain_file_name("out/custom.c"));
        assert!(!is_plain_file_name("..\\boot.ini"));
    }
}
