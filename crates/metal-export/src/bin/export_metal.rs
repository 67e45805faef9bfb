//! AOT SPIR-V → Metal export tool
//!
//! Converts AOT `.spv` kernels to Metal source (`.metal`) and, optionally, `.air` and
//! `.metallib`, then writes `manifest.json` into the output directory.
//!
//! # Usage
//! ```bash
//! export_metal --aot-dir build/mnist_aot --output-dir build/metal_shaders --compile-metallib
//! ```

use aot_metal_export::{ExportConfig, export_metal_shaders};
use clap::Parser;
use std::path::PathBuf;
use std::process;

/// Command-line arguments
///
/// Flags override values loaded from `--config`.
#[derive(Parser)]
#[command(version, about = "Convert AOT .spv kernels to Metal source (.metal) and optional .metallib")]
struct Args {
    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base directory for relative input and output directories
    #[arg(long)]
    project_root: Option<PathBuf>,

    /// Input AOT directory containing .spv files
    #[arg(long)]
    aot_dir: Option<PathBuf>,

    /// Output directory for .metal/.air/.metallib
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Path or command name for the SPIRV-Cross CLI
    #[arg(long)]
    spirv_cross: Option<String>,

    /// Path or command name for xcrun
    #[arg(long)]
    xcrun: Option<PathBuf>,

    /// Also compile .metal into .air and .metallib with xcrun
    #[arg(long)]
    compile_metallib: bool,

    /// Keep output file names as task names (*.spv stem) instead of merging by kernel name
    #[arg(long)]
    preserve_task_names: bool,

    /// Log every external command
    #[arg(long, short)]
    verbose: bool,
}

impl Args {
    /// Loads the configuration file, if any, and applies the command-line overrides
    fn into_config(self) -> Result<ExportConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => ExportConfig::from_file(path).map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?,
            None => ExportConfig::default(),
        };

        if let Some(project_root) = self.project_root {
            config.project_root = project_root;
        }
        if let Some(aot_dir) = self.aot_dir {
            config.aot_dir = aot_dir;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(spirv_cross) = self.spirv_cross {
            config.spirv_cross = spirv_cross;
        }
        if let Some(xcrun) = self.xcrun {
            config.xcrun = xcrun;
        }
        config.compile_metallib |= self.compile_metallib;
        config.preserve_task_names |= self.preserve_task_names;

        Ok(config)
    }
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let subscriber = tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to install logger: {e}");
    }

    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    match export_metal_shaders(&config) {
        Ok(summary) => {
            println!("converted {} shaders", summary.converted);
            println!("input: {}", summary.aot_dir.display());
            println!("output: {}", summary.output_dir.display());
            println!("manifest: {}", summary.manifest_path.display());
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
