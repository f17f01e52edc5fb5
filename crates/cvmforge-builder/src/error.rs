use cvmforge_auth::AuthError;
use cvmforge_cloud::CloudError;
use std::path::PathBuf;
use thiserror::Error;

/// A step's primary failure, tagged with the stage it happened in
#[derive(Error, Debug)]
#[error("{stage}: {source}")]
pub struct StepError {
    pub stage: String,
    pub source: CloudError,
}

impl StepError {
    pub fn new(stage: impl Into<String>, source: CloudError) -> Self {
        Self {
            stage: stage.into(),
            source,
        }
    }
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("invalid build configuration:\n{}", format_problems(.0))]
    Config(Vec<String>),

    #[error("unsupported build file extension: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("build file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("{0}")]
    ImageLookup(String),

    #[error("build halted at {0}")]
    Halted(#[from] StepError),

    #[error("build cancelled")]
    Cancelled,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_problems(problems: &[String]) -> String {
    problems
        .iter()
        .map(|p| format!("  - {}", p))
        .collect::<Vec<_>>()
        .join("\n")
}

pub type Result<T> = std::result::Result<T, BuildError>;
