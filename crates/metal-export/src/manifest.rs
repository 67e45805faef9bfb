//! Export manifest
//!
//! One [`ConversionRecord`] per converted `.spv` task, kept in conversion order and written
//! once as a JSON list when the whole export has succeeded.

use crate::error::ExportError;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default file name of the manifest inside the output directory
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Provenance of a single converted task
///
/// Field order is the serialized order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionRecord {
    /// Resolved logical kernel name
    pub kernel: String,
    /// Original task identifier
    pub task: String,
    /// Source SPIR-V artifact
    pub spv: PathBuf,
    /// Generated Metal shading language source
    pub metal: PathBuf,
    /// Intermediate AIR object, when compilation ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub air: Option<PathBuf>,
    /// Linked Metal library, when compilation ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metallib: Option<PathBuf>,
}

/// Ordered list of conversion records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Manifest {
    records: Vec<ConversionRecord>,
}

impl Manifest {
    /// Creates an empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record
    pub fn push(&mut self, record: ConversionRecord) {
        self.records.push(record);
    }

    /// Records in conversion order
    pub fn records(&self) -> &[ConversionRecord] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing has been converted
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serializes the manifest as a pretty-printed JSON list
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Writes the manifest to `path`, consuming it.
    ///
    /// The JSON is written to a temporary file in the same directory and then moved over
    /// `path`, so readers never observe a half-written manifest.
    ///
    /// # Arguments
    /// * `path` - Destination of the manifest file
    pub fn write(self, path: &Path) -> Result<(), ExportError> {
        let json = self.to_json()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| ExportError::io(dir, e))?;
        file.write_all(json.as_bytes()).map_err(|e| ExportError::io(file.path(), e))?;
        file.write_all(b"\n").map_err(|e| ExportError::io(file.path(), e))?;
        file.as_file().sync_all().map_err(|e| ExportError::io(file.path(), e))?;
        file.persist(path).map_err(|e| ExportError::io(path, e.error))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kernel: &str, task: &str, compiled: bool) -> ConversionRecord {
        ConversionRecord {
            kernel: kernel.to_string(),
            task: task.to_string(),
            spv: PathBuf::from(format!("aot/{task}.spv")),
            metal: PathBuf::from(format!("out/{kernel}.metal")),
            air: compiled.then(|| PathBuf::from(format!("out/{kernel}.air"))),
            metallib: compiled.then(|| PathBuf::from(format!("out/{kernel}.metallib"))),
        }
    }

    #[test]
    fn test_field_order_and_optional_paths() {
        let mut manifest = Manifest::new();
        manifest.push(record("init", "k0", false));
        manifest.push(record("k1", "k1", true));

        let json = manifest.to_json().unwrap();
        let expected = r#"[
  {
    "kernel": "init",
    "task": "k0",
    "spv": "aot/k0.spv",
    "metal": "out/init.metal"
  },
  {
    "kernel": "k1",
    "task": "k1",
    "spv": "aot/k1.spv",
    "metal": "out/k1.metal",
    "air": "out/k1.air",
    "metallib": "out/k1.metallib"
  }
]"#;
        assert_eq!(json, expected);
    }

    #[test]
    fn test_write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE_NAME);
        std::fs::write(&path, "stale").unwrap();

        let mut manifest = Manifest::new();
        manifest.push(record("forward", "t0", false));
        manifest.write(&path).unwrap();

        let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written[0]["kernel"], "forward");
        assert_eq!(written.as_array().unwrap().len(), 1);

        // Only the manifest remains; the temporary file was moved into place
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join(MANIFEST_FILE_NAME);

        let err = Manifest::new().write(&path).unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
        assert!(!path.exists());
    }
}
