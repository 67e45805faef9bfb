//! AOT SPIR-V to Metal export
//!
//! This crate converts the `.spv` compute tasks written by an ahead-of-time kernel compiler
//! into Metal shading language sources, optionally compiles them into `.air` objects and
//! `.metallib` libraries, and writes a JSON manifest describing every produced file.
//!
//! ```text
//! metadata.json ──► TaskKernelMap ─┐
//!                                  ▼
//! *.spv ──► spirv-cross ──► .metal ──► xcrun metal ──► .air ──► xcrun metallib ──► .metallib
//!                                  │
//!                                  ▼
//!                            manifest.json
//! ```

pub mod config;
pub mod convert;
pub mod error;
pub mod manifest;
pub mod metadata;
pub mod runner;
pub mod toolchain;

pub use config::ExportConfig;
pub use convert::{ArtifactConverter, CompiledTaskFile, ConvertOptions, NamingScheme, convert, discover_artifacts};
pub use error::ExportError;
pub use manifest::{ConversionRecord, Manifest};
pub use metadata::{TaskKernelMap, build_task_kernel_map};
pub use runner::{ExternalToolError, SystemRunner, ToolRunner};
pub use toolchain::{MetalToolchain, ToolchainReadiness};

use std::path::PathBuf;

/// Outcome of a successful export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Number of converted `.spv` files
    pub converted: usize,
    /// Resolved AOT input directory
    pub aot_dir: PathBuf,
    /// Resolved output directory
    pub output_dir: PathBuf,
    /// Written manifest
    pub manifest_path: PathBuf,
}

/// Runs a complete export with system processes
///
/// See [`export_metal_shaders_with`].
pub fn export_metal_shaders(config: &ExportConfig) -> Result<ExportSummary, ExportError> {
    export_metal_shaders_with(config, SystemRunner)
}

/// Runs a complete export, executing external commands through `runner`
///
/// Steps, each of which aborts the run on failure:
/// 1. create the output directory and check that the AOT directory exists,
/// 2. resolve `spirv-cross` and discover the `.spv` files,
/// 3. load the task → kernel table (never fails),
/// 4. probe the Metal toolchain when compilation is requested,
/// 5. convert every file and write the manifest.
///
/// No manifest is written unless every step succeeds.
///
/// # Arguments
/// * `config` - Export settings
/// * `runner` - Executes translator and compiler commands
pub fn export_metal_shaders_with<R: ToolRunner>(config: &ExportConfig, runner: R) -> Result<ExportSummary, ExportError> {
    let aot_dir = config.resolved_aot_dir();
    let output_dir = config.resolved_output_dir();

    std::fs::create_dir_all(&output_dir).map_err(|e| ExportError::io(&output_dir, e))?;

    if !aot_dir.exists() {
        return Err(ExportError::AotDirNotFound(aot_dir));
    }

    let spirv_cross = toolchain::resolve_translator(&config.spirv_cross)?;
    let artifacts = discover_artifacts(&aot_dir)?;
    tracing::info!("found {} .spv files in {}", artifacts.len(), aot_dir.display());

    let task_kernel_map = build_task_kernel_map(&config.metadata_path());
    tracing::info!("resolved {} kernel names from metadata", task_kernel_map.len());

    let toolchain = if config.compile_metallib {
        let toolchain = MetalToolchain::new(&config.xcrun);
        let readiness = toolchain.probe();
        if !readiness.ready {
            tracing::warn!("Metal toolchain is not ready: {}", readiness.reason);
            return Err(ExportError::ToolchainNotReady(readiness.reason));
        }
        Some(toolchain)
    } else {
        None
    };

    let options = ConvertOptions {
        spirv_cross,
        toolchain,
        naming: config.naming(),
    };
    let manifest = ArtifactConverter::new(&output_dir, options, runner).convert(&artifacts, &task_kernel_map)?;

    let converted = manifest.len();
    let manifest_path = config.manifest_path();
    manifest.write(&manifest_path)?;

    Ok(ExportSummary {
        converted,
        aot_dir,
        output_dir,
        manifest_path,
    })
}
