//! Fatal error taxonomy for the export pipeline
//!
//! Every variant here aborts the run before a manifest is written. Malformed kernel
//! metadata is deliberately absent: it is recovered inside [`crate::metadata`].

use crate::runner::ExternalToolError;
use std::path::PathBuf;

/// Errors that abort a Metal export run
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// A required external executable could not be resolved
    #[error("{tool} not found. {hint}")]
    ToolNotFound {
        /// Name or path of the missing tool as it was requested
        tool: String,
        /// Remediation hint shown to the operator
        hint: String,
    },
    /// Compilation was requested but the Metal toolchain failed its probe
    #[error("Cannot compile .metallib: {0}")]
    ToolchainNotReady(String),
    /// The AOT input directory does not exist
    #[error("AOT directory not found: {}", .0.display())]
    AotDirNotFound(PathBuf),
    /// The AOT input directory holds no compiled-task files
    #[error("No .spv files found in: {}", .0.display())]
    NoArtifacts(PathBuf),
    /// A translation or compilation command exited unsuccessfully
    #[error(transparent)]
    ExternalTool(#[from] ExternalToolError),
    /// Filesystem access failed
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// The manifest could not be serialized
    #[error("Failed to serialize manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl ExportError {
    /// Wraps an I/O error together with the path that caused it
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
