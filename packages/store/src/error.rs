use std::path::PathBuf;

use orkest_model::QName;
use orkest_parser::CompileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to compile {}: {source}", file.display())]
    Compile {
        file: PathBuf,
        #[source]
        source: CompileError,
    },

    #[error("not a deployment unit directory: {}", .0.display())]
    InvalidDeploymentUnit(PathBuf),

    #[error("deployment unit {0} contains no process definitions")]
    EmptyDeploymentUnit(String),

    #[error("deployment unit {0} is already deployed")]
    AlreadyDeployed(String),

    #[error("process {0} is defined more than once in the deployment unit")]
    DuplicateProcess(QName),

    #[error("invalid package pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("{0} lock poisoned")]
    LockPoisoned(&'static str),

    #[error("listener error: {0}")]
    Listener(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
