//! CLI error types with exit code handling
//!
//! Every core error is mapped to a `CliError`, which knows its exit code and
//! keeps the captured output of the external command that failed.

use chartlift_core::Error as CoreError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// A required external binary is missing
    #[error("{message}")]
    #[diagnostic(code(chartlift::cli::tool_not_found))]
    ToolNotFound {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// An external command failed
    #[error("{message}")]
    #[diagnostic(code(chartlift::cli::command))]
    Command {
        message: String,
        output: Option<String>,
        #[help]
        help: Option<String>,
    },

    /// Chart data could not be used
    #[error("{message}")]
    #[diagnostic(code(chartlift::cli::data))]
    Data {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(chartlift::cli::io))]
    Io { message: String },

    /// Internal error (runtime, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(chartlift::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::ToolNotFound { .. } => exit_codes::TOOL_NOT_FOUND,
            CliError::Command { .. } => exit_codes::COMMAND_ERROR,
            CliError::Data { .. } => exit_codes::DATA_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Captured output of the failed external command
    pub fn output(&self) -> Option<&str> {
        match self {
            CliError::Command { output, .. } => output.as_deref(),
            _ => None,
        }
    }

    /// Help text, if any
    pub fn hint(&self) -> Option<&str> {
        match self {
            CliError::ToolNotFound { help, .. }
            | CliError::Command { help, .. }
            | CliError::Data { help, .. } => help.as_deref(),
            _ => None,
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        let output = err.captured_output().map(str::to_string);

        match err {
            CoreError::ToolNotFound { tool } => CliError::ToolNotFound {
                message,
                help: Some(format!(
                    "Install '{tool}' or point chartlift at it with --{}",
                    if tool.contains("docker") { "docker" } else { "helm" }
                )),
            },
            CoreError::CommandFailed { .. } => CliError::Command {
                message,
                output,
                help: Some("Check that the chart name and version exist (try 'helm search repo')".to_string()),
            },
            CoreError::MirrorFailed { .. } => CliError::Command {
                message,
                output,
                help: Some("Make sure you are logged in to both registries ('docker login')".to_string()),
            },
            CoreError::Spawn { .. } => CliError::Command {
                message,
                output: None,
                help: None,
            },
            CoreError::ArchiveNotFound { .. } => CliError::Data {
                message,
                help: Some("The fetch command reported success but produced no '<chart>-<version>.tgz' file".to_string()),
            },
            CoreError::ValuesParse(_)
            | CoreError::InvalidRepository { .. }
            | CoreError::ValuesConflict { .. }
            | CoreError::UnsupportedTag { .. }
            | CoreError::NonUtf8Output { .. }
            | CoreError::InvalidPattern { .. } => CliError::Data {
                message,
                help: None,
            },
            CoreError::Io(source) => CliError::Io {
                message: source.to_string(),
            },
            CoreError::Serialize(_) => CliError::Internal { message },
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chartlift_core::MirrorStep;
    use std::path::PathBuf;

    #[test]
    fn test_tool_not_found_mapping() {
        let err = CliError::from(CoreError::ToolNotFound {
            tool: "docker".to_string(),
        });
        assert_eq!(err.exit_code(), exit_codes::TOOL_NOT_FOUND);
        assert!(err.to_string().contains("'docker' not found"));
        assert!(err.hint().unwrap().contains("--docker"));
    }

    #[test]
    fn test_command_failure_keeps_output() {
        let err = CliError::from(CoreError::CommandFailed {
            command: "helm template x y".to_string(),
            exit_code: Some(1),
            stderr: "Error: repo y not found\n".to_string(),
        });
        assert_eq!(err.exit_code(), exit_codes::COMMAND_ERROR);
        assert_eq!(err.output(), Some("Error: repo y not found"));
    }

    #[test]
    fn test_mirror_failure_mapping() {
        let err = CliError::from(CoreError::MirrorFailed {
            step: MirrorStep::Push,
            image: "reg/app:1".to_string(),
            output: "denied".to_string(),
        });
        assert_eq!(err.exit_code(), exit_codes::COMMAND_ERROR);
        assert_eq!(err.to_string(), "Failed to push image 'reg/app:1'");
        assert_eq!(err.output(), Some("denied"));
    }

    #[test]
    fn test_archive_not_found_is_data_error() {
        let err = CliError::from(CoreError::ArchiveNotFound {
            dir: PathBuf::from("build/bar-offline"),
        });
        assert_eq!(err.exit_code(), exit_codes::DATA_ERROR);
        assert!(err.to_string().contains("build/bar-offline"));
    }

    #[test]
    fn test_io_mapping() {
        let err = CliError::from(CoreError::Io(std::io::Error::other("disk full")));
        assert_eq!(err.exit_code(), exit_codes::IO_ERROR);
        assert_eq!(err.to_string(), "IO error: disk full");
    }

    #[test]
    fn test_undecodable_output_is_data_error() {
        let err = CliError::from(CoreError::NonUtf8Output {
            command: "helm show values foo/bar".to_string(),
        });
        assert_eq!(err.exit_code(), exit_codes::DATA_ERROR);
        assert!(err.to_string().contains("helm show values foo/bar"));
    }

    #[test]
    fn test_unsupported_tag_is_data_error() {
        let err = CliError::from(CoreError::UnsupportedTag {
            tag: "!custom".to_string(),
            path: "image".to_string(),
        });
        assert_eq!(err.exit_code(), exit_codes::DATA_ERROR);
    }
}
