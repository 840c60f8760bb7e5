//! Core error types

use std::path::PathBuf;

use thiserror::Error;

use crate::mirror::MirrorStep;

#[derive(Error, Debug)]
pub enum Error {
    // ============ Environment Errors ============
    #[error("command '{tool}' not found. Make sure it is installed and on your PATH")]
    ToolNotFound { tool: String },

    #[error("Failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Output of '{command}' is not valid UTF-8")]
    NonUtf8Output { command: String },

    // ============ Tool Invocation Errors ============
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Failed to {step} image '{image}'")]
    MirrorFailed {
        step: MirrorStep,
        image: String,
        output: String,
    },

    // ============ Data Errors ============
    #[error("Failed to parse chart values: {0}")]
    ValuesParse(#[source] serde_yaml::Error),

    #[error("Failed to serialize offline values: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("Value of 'repository' at '{path}' is not a string")]
    InvalidRepository { path: String },

    #[error("Cannot place an image block under '{path}': the entry is already a plain value")]
    ValuesConflict { path: String },

    #[error("Unsupported YAML tag '{tag}' at '{path}'")]
    UnsupportedTag { tag: String, path: String },

    #[error("No downloaded chart archive found in directory {}", dir.display())]
    ArchiveNotFound { dir: PathBuf },

    #[error("Invalid archive pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Captured error output of the failed external call, if any
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            Error::CommandFailed { stderr, .. } => Some(stderr.as_str()),
            Error::MirrorFailed { output, .. } => Some(output.as_str()),
            _ => None,
        }
        .map(str::trim)
        .filter(|s| !s.is_empty())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
