//! Error types and exit codes for cfacts tools

use std::process::ExitCode;
use thiserror::Error;

/// Main error type for cfacts operations
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Could not open output file: {path}")]
    OutputFile { path: String },

    #[error("Compiler front end unavailable: {message}")]
    FrontendUnavailable { message: String },

    #[error("Failed to parse translation unit: {message}")]
    ParseFailure { message: String },

    #[error("No valid compile commands found in {path}")]
    EmptyCompileDb { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Convert error to the tool exit code. Every fatal condition maps to 1:
    /// usage errors, unopenable input/output files, and an unusable front
    /// end all abort the same way. Per-declaration failures never surface
    /// here; they are skipped during traversal.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(1)
    }
}

/// Result type alias for cfacts operations
pub type Result<T> = std::result::Result<T, ExtractError>;
