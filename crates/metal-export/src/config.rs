//! Export configuration
//!
//! Settings can come from a YAML file and are then overridden by command-line flags.
//! Every field has a default, so an empty document is a valid configuration.

use crate::convert::NamingScheme;
use crate::manifest::MANIFEST_FILE_NAME;
use crate::metadata::METADATA_FILE_NAME;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration of a Metal export run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Base directory for relative `aot_dir` and `output_dir`
    pub project_root: PathBuf,
    /// Directory holding the AOT `.spv` files and metadata
    pub aot_dir: PathBuf,
    /// Directory receiving `.metal`, `.air`, `.metallib` and the manifest
    pub output_dir: PathBuf,
    /// Path or command name of the SPIR-V translator
    pub spirv_cross: String,
    /// Path or command name of the `xcrun` driver
    pub xcrun: PathBuf,
    /// Also compile `.metal` into `.air` and `.metallib`
    pub compile_metallib: bool,
    /// Name outputs after task identifiers instead of kernel names
    pub preserve_task_names: bool,
    /// Metadata file name, relative to the AOT directory
    pub metadata_file: PathBuf,
    /// Manifest file name, relative to the output directory
    pub manifest_file: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            aot_dir: PathBuf::from("build/metal_aot_autodiff"),
            output_dir: PathBuf::from("build/metal_shaders"),
            spirv_cross: "spirv-cross".to_string(),
            xcrun: PathBuf::from("xcrun"),
            compile_metallib: false,
            preserve_task_names: false,
            metadata_file: PathBuf::from(METADATA_FILE_NAME),
            manifest_file: PathBuf::from(MANIFEST_FILE_NAME),
        }
    }
}

impl ExportConfig {
    /// Parses a configuration from YAML content
    pub fn from_yaml(yaml_content: &str) -> Result<Self, serde_norway::Error> {
        serde_norway::from_str(yaml_content)
    }

    /// Parses a configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_yaml(&content)?)
    }

    /// AOT directory, resolved against the project root
    pub fn resolved_aot_dir(&self) -> PathBuf {
        self.project_root.join(&self.aot_dir)
    }

    /// Output directory, resolved against the project root
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.project_root.join(&self.output_dir)
    }

    /// Location of the metadata descriptor
    pub fn metadata_path(&self) -> PathBuf {
        self.resolved_aot_dir().join(&self.metadata_file)
    }

    /// Location of the manifest
    pub fn manifest_path(&self) -> PathBuf {
        self.resolved_output_dir().join(&self.manifest_file)
    }

    /// Output naming scheme selected by `preserve_task_names`
    pub fn naming(&self) -> NamingScheme {
        NamingScheme::from_preserve_task_names(self.preserve_task_names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ExportConfig::from_yaml("{}").unwrap();
        assert_eq!(config, ExportConfig::default());
        assert_eq!(config.naming(), NamingScheme::ByKernel);
        assert_eq!(config.metadata_path(), Path::new("./build/metal_aot_autodiff/metadata.json"));
        assert_eq!(config.manifest_path(), Path::new("./build/metal_shaders/manifest.json"));
    }

    #[test]
    fn test_yaml_overrides() {
        let yaml = r#"
project_root: /work/demo
aot_dir: build/mnist_aot
output_dir: /tmp/shaders
spirv_cross: /opt/bin/spirv-cross
compile_metallib: true
preserve_task_names: true
"#;

        let config = ExportConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.resolved_aot_dir(), Path::new("/work/demo/build/mnist_aot"));
        // Absolute paths are not rebased
        assert_eq!(config.resolved_output_dir(), Path::new("/tmp/shaders"));
        assert_eq!(config.spirv_cross, "/opt/bin/spirv-cross");
        assert!(config.compile_metallib);
        assert_eq!(config.naming(), NamingScheme::ByTask);
        assert_eq!(config.xcrun, Path::new("xcrun"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(ExportConfig::from_yaml("compile_metalib: true").is_err());
    }
}
