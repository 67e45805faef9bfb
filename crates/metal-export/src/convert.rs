//! SPIR-V → Metal artifact conversion
//!
//! Walks the `.spv` task files of an AOT directory in file name order and, for each one:
//! 1. resolves its logical kernel name,
//! 2. translates it to `.metal` with `spirv-cross`,
//! 3. optionally compiles the source to `.air` and links it into a `.metallib`,
//! 4. records every produced path in the [`Manifest`].
//!
//! Conversion is strictly sequential and stops at the first failing command. Files already
//! produced for the failing task are left on disk.

use crate::error::ExportError;
use crate::manifest::{ConversionRecord, Manifest};
use crate::metadata::TaskKernelMap;
use crate::runner::{SystemRunner, ToolRunner};
use crate::toolchain::MetalToolchain;
use std::path::{Path, PathBuf};

/// Extension of compiled-task files produced by the AOT compiler
pub const SPV_EXTENSION: &str = "spv";

/// A compiled-task file found in the AOT directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTaskFile {
    /// Path to the `.spv` file
    pub path: PathBuf,
    /// File stem, which is the task identifier
    pub stem: String,
}

impl CompiledTaskFile {
    /// Creates a task file from its path, or `None` if the path has no UTF-8 stem
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?.to_string();
        Some(Self { path, stem })
    }
}

/// How output files are named
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum NamingScheme {
    /// One output per logical kernel; tasks sharing a kernel name overwrite each other
    #[default]
    ByKernel,
    /// One output per task, named after the raw task identifier
    ByTask,
}

impl NamingScheme {
    /// Selects [`NamingScheme::ByTask`] when task names should be preserved
    pub fn from_preserve_task_names(preserve: bool) -> Self {
        if preserve { Self::ByTask } else { Self::ByKernel }
    }
}

/// Settings for a conversion run
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Resolved path of the `spirv-cross` executable
    pub spirv_cross: PathBuf,
    /// Metal toolchain used for `.air`/`.metallib` output; `None` skips compilation
    pub toolchain: Option<MetalToolchain>,
    /// Output naming scheme
    pub naming: NamingScheme,
}

/// Lists the `.spv` files directly inside `dir`, sorted by file name
///
/// # Returns
/// The discovered task files, or [`ExportError::NoArtifacts`] if there are none
pub fn discover_artifacts(dir: &Path) -> Result<Vec<CompiledTaskFile>, ExportError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ExportError::io(dir, e))?;

    let mut artifacts = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| ExportError::io(dir, e))?.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != SPV_EXTENSION) {
            continue;
        }
        match CompiledTaskFile::from_path(path) {
            Some(artifact) => artifacts.push(artifact),
            None => tracing::warn!("skipping .spv file with a non UTF-8 name in {}", dir.display()),
        }
    }

    if artifacts.is_empty() {
        return Err(ExportError::NoArtifacts(dir.to_path_buf()));
    }

    artifacts.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(artifacts)
}

/// Drives the translator and Metal toolchain over a set of task files
pub struct ArtifactConverter<R: ToolRunner> {
    output_dir: PathBuf,
    options: ConvertOptions,
    runner: R,
}

impl<R: ToolRunner> ArtifactConverter<R> {
    /// Creates a converter writing into `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>, options: ConvertOptions, runner: R) -> Self {
        Self {
            output_dir: output_dir.into(),
            options,
            runner,
        }
    }

    /// Discovers the task files in `input_dir` and converts all of them
    pub fn convert_dir(&mut self, input_dir: &Path, task_kernel_map: &TaskKernelMap) -> Result<Manifest, ExportError> {
        let artifacts = discover_artifacts(input_dir)?;
        self.convert(&artifacts, task_kernel_map)
    }

    /// Converts `artifacts` in order, stopping at the first failure
    ///
    /// # Arguments
    /// * `artifacts` - Task files, already in the desired order
    /// * `task_kernel_map` - Task → kernel name table
    ///
    /// # Returns
    /// A manifest holding one record per artifact
    pub fn convert(&mut self, artifacts: &[CompiledTaskFile], task_kernel_map: &TaskKernelMap) -> Result<Manifest, ExportError> {
        let mut manifest = Manifest::new();
        for artifact in artifacts {
            let record = self.convert_one(artifact, task_kernel_map)?;
            tracing::info!("converted {} -> {}", record.task, record.metal.display());
            manifest.push(record);
        }
        Ok(manifest)
    }

    /// Consumes the converter and returns its runner
    pub fn into_runner(self) -> R {
        self.runner
    }

    fn convert_one(&mut self, artifact: &CompiledTaskFile, task_kernel_map: &TaskKernelMap) -> Result<ConversionRecord, ExportError> {
        let kernel = task_kernel_map.kernel_name(&artifact.stem);
        let logical_name = match self.options.naming {
            NamingScheme::ByKernel => kernel,
            NamingScheme::ByTask => artifact.stem.as_str(),
        };

        let metal = self.output_dir.join(format!("{logical_name}.metal"));
        self.runner.run(&[
            self.options.spirv_cross.clone().into_os_string(),
            artifact.path.clone().into_os_string(),
            "--msl".into(),
            "--stage".into(),
            "comp".into(),
            "--output".into(),
            metal.clone().into_os_string(),
        ])?;

        let mut record = ConversionRecord {
            kernel: kernel.to_string(),
            task: artifact.stem.clone(),
            spv: artifact.path.clone(),
            metal,
            air: None,
            metallib: None,
        };

        if let Some(toolchain) = &self.options.toolchain {
            let air = self.output_dir.join(format!("{logical_name}.air"));
            let metallib = self.output_dir.join(format!("{logical_name}.metallib"));
            toolchain.compile_to_air(&mut self.runner, &record.metal, &air)?;
            toolchain.link_metallib(&mut self.runner, &air, &metallib)?;
            record.air = Some(air);
            record.metallib = Some(metallib);
        }

        Ok(record)
    }
}

/// Converts every `.spv` file in `input_dir` with the system `spirv-cross` and `xcrun`.
///
/// Toolchain readiness is not checked here; callers that enable compilation are expected
/// to have probed it already.
///
/// # Arguments
/// * `input_dir` - AOT directory containing `.spv` files
/// * `output_dir` - Destination of generated files
/// * `task_kernel_map` - Task → kernel name table
/// * `spirv_cross` - Resolved translator executable
/// * `compile_enabled` - Whether to produce `.air` and `.metallib` files
/// * `naming` - Output naming scheme
pub fn convert(input_dir: &Path, output_dir: &Path, task_kernel_map: &TaskKernelMap, spirv_cross: &Path, compile_enabled: bool, naming: NamingScheme) -> Result<Manifest, ExportError> {
    let options = ConvertOptions {
        spirv_cross: spirv_cross.to_path_buf(),
        toolchain: compile_enabled.then(MetalToolchain::default),
        naming,
    };
    ArtifactConverter::new(output_dir, options, SystemRunner).convert_dir(input_dir, task_kernel_map)
}
