//! External command execution
//!
//! Every interaction with `helm` and `docker` goes through a [`CommandRunner`].
//! A non-zero exit status is a normal [`CommandResult`]; only conditions that
//! make the result meaningless (missing binary, undecodable output) are errors.
//!
//! Implementations:
//! - `ProcessRunner`: Spawns real processes and blocks until they exit
//! - `MockRunner`: Scripted in-memory responses for testing

use std::io::ErrorKind;
use std::process::Command;
use std::sync::Mutex;

use tracing::debug;

use crate::error::{Error, Result};

/// Outcome of a single external process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
}

impl CommandResult {
    /// A successful result with the given standard output
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    /// A failed result with the given exit code and standard error
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: Some(exit_code),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Standard output followed by standard error
    pub fn combined_output(&self) -> String {
        let mut combined = String::with_capacity(self.stdout.len() + self.stderr.len() + 1);
        combined.push_str(&self.stdout);
        if !self.stdout.is_empty() && !self.stdout.ends_with('\n') && !self.stderr.is_empty() {
            combined.push('\n');
        }
        combined.push_str(&self.stderr);
        combined
    }

    /// Turn a failed result into [`Error::CommandFailed`]
    pub fn ensure_success(self, command: &str) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(Error::CommandFailed {
                command: command.to_string(),
                exit_code: self.exit_code,
                stderr: self.stderr,
            })
        }
    }
}

/// Render a program and its arguments as a single command line
pub fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Trait for external command execution
pub trait CommandRunner {
    /// Run `program` with `args`, blocking until it exits
    fn run(&self, program: &str, args: &[String]) -> Result<CommandResult>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandResult> {
        (**self).run(program, args)
    }
}

/// Runs commands as child processes of the current one
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandResult> {
        let line = command_line(program, args);
        debug!(command = %line, "Running external command");

        let output = Command::new(program).args(args).output().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                Error::ToolNotFound {
                    tool: program.to_string(),
                }
            } else {
                Error::Spawn {
                    command: line.clone(),
                    source: e,
                }
            }
        })?;

        let stdout = String::from_utf8(output.stdout)
            .map_err(|_| Error::NonUtf8Output { command: line.clone() })?;
        let stderr = String::from_utf8(output.stderr)
            .map_err(|_| Error::NonUtf8Output { command: line.clone() })?;

        let result = CommandResult {
            stdout,
            stderr,
            exit_code: output.status.code(),
        };
        debug!(
            command = %line,
            exit_code = ?result.exit_code,
            stderr = %result.stderr,
            "External command finished"
        );

        Ok(result)
    }
}

/// A scripted response of the mock runner
#[derive(Debug, Clone)]
enum MockResponse {
    Result(CommandResult),
    NotFound,
}

#[derive(Debug, Clone)]
struct MockRule {
    program: String,
    prefix: Vec<String>,
    response: MockResponse,
}

/// Mock command runner for testing
///
/// Responses are matched on the program name and the leading arguments of
/// the invocation. When several rules match, the most recently added wins.
/// Invocations that match no rule behave like a missing binary.
#[derive(Debug, Default)]
pub struct MockRunner {
    rules: Mutex<Vec<MockRule>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl MockRunner {
    /// Create a runner that knows no commands
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer invocations of `program` starting with `prefix` with `result`
    pub fn on(self, program: &str, prefix: &[&str], result: CommandResult) -> Self {
        self.push_rule(program, prefix, MockResponse::Result(result));
        self
    }

    /// Make every invocation of `program` fail as if the binary did not exist
    pub fn missing(self, program: &str) -> Self {
        self.push_rule(program, &[], MockResponse::NotFound);
        self
    }

    /// All invocations so far, each as `[program, args...]`
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// Invocations so far rendered as command lines
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(|call| call.join(" ")).collect()
    }

    fn push_rule(&self, program: &str, prefix: &[&str], response: MockResponse) {
        self.rules.lock().unwrap().push(MockRule {
            program: program.to_string(),
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            response,
        });
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandResult> {
        self.calls.lock().unwrap().push(
            std::iter::once(program.to_string())
                .chain(args.iter().cloned())
                .collect(),
        );

        let rules = self.rules.lock().unwrap();
        let matched = rules
            .iter()
            .rev()
            .find(|rule| rule.program == program && args.starts_with(&rule.prefix));

        match matched.map(|rule| &rule.response) {
            Some(MockResponse::Result(result)) => Ok(result.clone()),
            Some(MockResponse::NotFound) | None => Err(Error::ToolNotFound {
                tool: program.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_command_line() {
        assert_eq!(
            command_line("helm", &args(&["show", "values", "bitnami/redis"])),
            "helm show values bitnami/redis"
        );
        assert_eq!(command_line("helm", &[]), "helm");
    }

    #[test]
    fn test_non_zero_exit_is_a_result() {
        let result = CommandResult::failed(1, "boom");
        assert!(!result.success());
        assert_eq!(result.exit_code, Some(1));
    }

    #[test]
    fn test_ensure_success_keeps_stderr() {
        let err = CommandResult::failed(2, "chart not found")
            .ensure_success("helm template x y")
            .unwrap_err();

        match err {
            Error::CommandFailed {
                command,
                exit_code,
                stderr,
            } => {
                assert_eq!(command, "helm template x y");
                assert_eq!(exit_code, Some(2));
                assert_eq!(stderr, "chart not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_combined_output() {
        let result = CommandResult {
            stdout: "pushing".to_string(),
            stderr: "denied".to_string(),
            exit_code: Some(1),
        };
        assert_eq!(result.combined_output(), "pushing\ndenied");
        assert_eq!(CommandResult::ok("only\n").combined_output(), "only\n");
    }

    #[test]
    fn test_process_runner_missing_binary() {
        let err = ProcessRunner::new()
            .run("chartlift-definitely-not-installed", &[])
            .unwrap_err();
        assert!(
            matches!(err, Error::ToolNotFound { ref tool } if tool == "chartlift-definitely-not-installed")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_process_runner_captures_output() {
        let result = ProcessRunner::new()
            .run("sh", &args(&["-c", "echo out; echo err >&2; exit 3"]))
            .unwrap();

        assert_eq!(result.stdout, "out\n");
        assert_eq!(result.stderr, "err\n");
        assert_eq!(result.exit_code, Some(3));
        assert!(!result.success());
    }

    #[cfg(unix)]
    #[test]
    fn test_process_runner_rejects_non_utf8_output() {
        let err = ProcessRunner::new()
            .run("sh", &args(&["-c", "printf '\\377'"]))
            .unwrap_err();
        assert!(matches!(err, Error::NonUtf8Output { .. }));
    }

    #[test]
    fn test_mock_runner_prefix_matching() {
        let runner = MockRunner::new()
            .on("helm", &["show", "values"], CommandResult::ok("a: 1"))
            .on("helm", &[], CommandResult::failed(1, "nope"));

        let values = runner
            .run("helm", &args(&["show", "values", "chart"]))
            .unwrap();
        // The catch-all rule was added last, so it wins
        assert!(!values.success());

        let runner = MockRunner::new()
            .on("helm", &[], CommandResult::failed(1, "nope"))
            .on("helm", &["show", "values"], CommandResult::ok("a: 1"));
        let values = runner
            .run("helm", &args(&["show", "values", "chart"]))
            .unwrap();
        assert_eq!(values.stdout, "a: 1");

        assert_eq!(runner.command_lines(), vec!["helm show values chart"]);
    }

    #[test]
    fn test_mock_runner_unknown_program() {
        let runner = MockRunner::new().missing("docker");
        assert!(matches!(
            runner.run("docker", &args(&["pull", "nginx"])),
            Err(Error::ToolNotFound { .. })
        ));
        assert!(matches!(
            runner.run("podman", &[]),
            Err(Error::ToolNotFound { .. })
        ));
        assert_eq!(runner.calls().len(), 2);
    }
}
