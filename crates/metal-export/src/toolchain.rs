//! External toolchain discovery
//!
//! Resolves the SPIR-V translator and probes the Xcode Metal toolchain:
//! - `xcrun metal` : .metal → .air
//! - `xcrun metallib` : .air → .metallib

use crate::error::ExportError;
use crate::runner::{ExternalToolError, ToolRunner};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Substring printed by `xcrun metal` when the downloadable toolchain component is absent
const MISSING_TOOLCHAIN_MARKER: &str = "missing Metal Toolchain";

/// Hint shown when the translator cannot be found
const SPIRV_CROSS_HINT: &str = "Install it first, e.g. `brew install spirv-cross`.";

/// Whether the Metal toolchain can compile shaders, with a diagnostic when it cannot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainReadiness {
    /// True when a no-op compiler invocation succeeded
    pub ready: bool,
    /// Operator-facing explanation; empty when ready
    pub reason: String,
}

impl ToolchainReadiness {
    /// A ready verdict
    pub fn ready() -> Self {
        Self { ready: true, reason: String::new() }
    }

    /// A not-ready verdict with the given reason
    pub fn not_ready(reason: impl Into<String>) -> Self {
        Self { ready: false, reason: reason.into() }
    }
}

/// Handle to the `xcrun` driver used for Metal compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetalToolchain {
    /// Program name or path of the `xcrun` driver
    pub xcrun: PathBuf,
}

impl Default for MetalToolchain {
    fn default() -> Self {
        Self::new("xcrun")
    }
}

impl MetalToolchain {
    /// Creates a toolchain handle driving the given `xcrun` program
    pub fn new(xcrun: impl Into<PathBuf>) -> Self {
        Self { xcrun: xcrun.into() }
    }

    /// Checks that `xcrun metal` is installed and operable.
    ///
    /// Never fails: every problem is folded into a not-ready verdict.
    pub fn probe(&self) -> ToolchainReadiness {
        let Ok(xcrun) = which::which(&self.xcrun) else {
            return ToolchainReadiness::not_ready("xcrun not found.");
        };

        let output = match Command::new(&xcrun).args(["metal", "-v"]).output() {
            Ok(output) => output,
            Err(e) => return ToolchainReadiness::not_ready(format!("failed to run {}: {e}", xcrun.display())),
        };

        if output.status.success() {
            return ToolchainReadiness::ready();
        }

        let mut message = String::from_utf8_lossy(&output.stdout).into_owned();
        message.push_str(&String::from_utf8_lossy(&output.stderr));
        classify_probe_output(&message)
    }

    /// Compiles Metal source to AIR (Apple Intermediate Representation)
    pub fn compile_to_air(&self, runner: &mut impl ToolRunner, metal_path: &Path, air_path: &Path) -> Result<(), ExternalToolError> {
        runner.run(&[
            self.xcrun.clone().into_os_string(),
            "metal".into(),
            "-c".into(),
            metal_path.into(),
            "-o".into(),
            air_path.into(),
        ])
    }

    /// Links an AIR object into a loadable .metallib
    pub fn link_metallib(&self, runner: &mut impl ToolRunner, air_path: &Path, metallib_path: &Path) -> Result<(), ExternalToolError> {
        runner.run(&[
            self.xcrun.clone().into_os_string(),
            "metallib".into(),
            air_path.into(),
            "-o".into(),
            metallib_path.into(),
        ])
    }
}

/// Turns the combined output of a failed `xcrun metal -v` into a readiness verdict
fn classify_probe_output(message: &str) -> ToolchainReadiness {
    if message.contains(MISSING_TOOLCHAIN_MARKER) {
        return ToolchainReadiness::not_ready("Metal Toolchain missing. Run `xcodebuild -downloadComponent MetalToolchain`.");
    }
    match message.trim() {
        "" => ToolchainReadiness::not_ready("xcrun metal is not available."),
        trimmed => ToolchainReadiness::not_ready(trimmed),
    }
}

/// Resolves the `spirv-cross` translator.
///
/// A value containing a path separator is taken as a path and must exist; anything else
/// is looked up on `PATH`.
///
/// # Arguments
/// * `spirv_cross` - Path or command name of the translator
///
/// # Returns
/// The path to execute, or [`ExportError::ToolNotFound`]
pub fn resolve_translator(spirv_cross: &str) -> Result<PathBuf, ExportError> {
    let not_found = || ExportError::ToolNotFound {
        tool: "spirv-cross".to_string(),
        hint: SPIRV_CROSS_HINT.to_string(),
    };

    if spirv_cross.contains('/') || spirv_cross.contains(std::path::MAIN_SEPARATOR) {
        let path = PathBuf::from(spirv_cross);
        return if path.exists() { Ok(path) } else { Err(not_found()) };
    }

    which::which(spirv_cross).map_err(|_| not_found())
}
