use std::time::Duration;

use thiserror::Error;

use crate::domain::utils::id::{FunctionId, ScopeId};

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to read or write JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Name '{name}' is already used by {existing} in scenario '{scenario}'")]
    DuplicateName { scenario: String, name: String, existing: &'static str },

    #[error("Duplicated id {0}")]
    DuplicateId(u32),

    #[error("Unresolved reference in scenario '{scenario}' (scope {scope}): {target}")]
    UnresolvedReference { scenario: String, scope: ScopeId, target: String },

    #[error("Function {id} depends on {dependency}, which is not declared before it")]
    ForwardReference { id: u32, dependency: u32 },

    #[error("Function {id} in scenario '{scenario}' waits on a cycle through {through:?}")]
    Cycle { scenario: String, id: FunctionId, through: Vec<FunctionId> },

    #[error("Argument '{argument}' of scenario '{scenario}' has no bound value")]
    MissingArgument { scenario: String, argument: String },

    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("Function {id} in scenario '{scenario}' is not a {expected}")]
    TargetKindMismatch { scenario: String, id: FunctionId, expected: &'static str },

    #[error("Job '{0}' is not declared in the job registry")]
    UnknownJob(String),

    #[error("Invalid arguments for job '{job}': {reason}")]
    InvalidJobArguments { job: String, reason: String },

    #[error("Controller rejected the request: {0}")]
    Submission(String),

    #[error("Scenario instance {instance} did not finish within {timeout:?}")]
    Timeout { instance: u64, timeout: Duration },
}

pub type Result<T> = std::result::Result<T, Error>;
