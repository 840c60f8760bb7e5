//! Standard exit codes for CLI operations
//!
//! A chart without images is not a failure and exits with `SUCCESS`.

/// Success - bundle created, or nothing to do
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Tool error - `helm` or `docker` is not installed or not on PATH
pub const TOOL_NOT_FOUND: i32 = 2;

/// Command error - an external command exited with a failure
pub const COMMAND_ERROR: i32 = 3;

/// Data error - unusable chart values or missing chart archive
pub const DATA_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;
