//! AOT metadata correlation
//!
//! The kernel compiler writes a `metadata.json` next to its `.spv` task files. It lists
//! every logical kernel together with the compiled tasks it lowered to. This module turns
//! that document into a task → kernel name lookup table.
//!
//! Metadata is an enrichment only. A missing or malformed file yields an empty table and
//! the export carries on with raw task identifiers.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Default file name of the metadata descriptor inside an AOT directory
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// A single compiled task belonging to a kernel
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskRecord {
    /// Task identifier, equal to the stem of its `.spv` file
    #[serde(default)]
    pub name: Option<String>,
}

/// A logical kernel and the tasks it was lowered to
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KernelRecord {
    /// Logical kernel name
    #[serde(default)]
    pub name: Option<String>,
    /// Compiled tasks in lowering order
    #[serde(default)]
    pub tasks_attribs: Vec<TaskRecord>,
}

/// Parsed AOT metadata descriptor
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KernelMetadata {
    /// Kernel records
    #[serde(default)]
    pub kernels: Vec<KernelRecord>,
}

/// Reasons a metadata descriptor could not be loaded
///
/// Never fatal to an export; see [`build_task_kernel_map`].
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// The file could not be read
    #[error("failed to read metadata: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid JSON or does not have the expected shape
    #[error("failed to parse metadata: {0}")]
    Parse(#[from] serde_json::Error),
}

impl KernelMetadata {
    /// Parses a metadata descriptor from JSON content
    pub fn from_json(json: &str) -> Result<Self, MetadataError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parses a metadata descriptor from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MetadataError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

/// Immutable lookup from task identifier to logical kernel name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskKernelMap {
    entries: HashMap<String, String>,
}

impl TaskKernelMap {
    /// Builds the table from parsed metadata.
    ///
    /// Only the first task of each kernel is mapped. Further tasks of a multi-task kernel
    /// keep their own identifiers as names.
    pub fn from_metadata(metadata: &KernelMetadata) -> Self {
        let mut entries = HashMap::new();
        for kernel in &metadata.kernels {
            let Some(kernel_name) = kernel.name.as_deref().filter(|name| !name.is_empty()) else {
                continue;
            };
            let Some(first_task) = kernel.tasks_attribs.first() else {
                continue;
            };
            if let Some(task_name) = first_task.name.as_deref().filter(|name| !name.is_empty()) {
                entries.insert(task_name.to_string(), kernel_name.to_string());
            }
        }
        Self { entries }
    }

    /// Returns the kernel name mapped to `task`, if any
    pub fn get(&self, task: &str) -> Option<&str> {
        self.entries.get(task).map(String::as_str)
    }

    /// Returns the kernel name for `task`, or `task` itself when it is not mapped
    pub fn kernel_name<'a>(&'a self, task: &'a str) -> &'a str {
        match self.get(task) {
            Some(kernel) => kernel,
            None => task,
        }
    }

    /// Number of mapped tasks
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no task is mapped
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Loads the metadata descriptor at `metadata_path` and builds the task → kernel table.
///
/// Returns an empty table when the file does not exist or cannot be parsed.
pub fn build_task_kernel_map(metadata_path: &Path) -> TaskKernelMap {
    if !metadata_path.exists() {
        tracing::debug!("no kernel metadata at {}", metadata_path.display());
        return TaskKernelMap::default();
    }

    match KernelMetadata::from_file(metadata_path) {
        Ok(metadata) => TaskKernelMap::from_metadata(&metadata),
        Err(e) => {
            tracing::debug!("ignoring kernel metadata at {}: {e}", metadata_path.display());
            TaskKernelMap::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_task_anchors_kernel_name() {
        let json = r#"{
            "kernels": [
                { "name": "forward", "tasks_attribs": [ { "name": "t0" }, { "name": "t1" } ] },
                { "name": "backward", "tasks_attribs": [ { "name": "t2", "buffer_binds": [] } ] }
            ],
            "fields": []
        }"#;

        let map = TaskKernelMap::from_metadata(&KernelMetadata::from_json(json).unwrap());
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("t0"), Some("forward"));
        assert_eq!(map.get("t1"), None);
        assert_eq!(map.kernel_name("t1"), "t1");
        assert_eq!(map.kernel_name("t2"), "backward");
    }

    #[test]
    fn test_incomplete_kernels_are_skipped() {
        let json = r#"{
            "kernels": [
                { "name": "empty", "tasks_attribs": [] },
                { "tasks_attribs": [ { "name": "orphan" } ] },
                { "name": "", "tasks_attribs": [ { "name": "blank" } ] },
                { "name": "unnamed_task", "tasks_attribs": [ {} ] }
            ]
        }"#;

        let map = TaskKernelMap::from_metadata(&KernelMetadata::from_json(json).unwrap());
        assert!(map.is_empty());
    }

    #[test]
    fn test_missing_kernels_list_is_empty() {
        let metadata = KernelMetadata::from_json("{}").unwrap();
        assert!(metadata.kernels.is_empty());
        assert!(KernelMetadata::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_build_map_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(METADATA_FILE_NAME);

        // Absent
        assert!(build_task_kernel_map(&path).is_empty());

        // Not JSON
        std::fs::write(&path, "{ kernels: oops").unwrap();
        assert!(build_task_kernel_map(&path).is_empty());

        // Wrong shape
        std::fs::write(&path, r#"{ "kernels": "forward" }"#).unwrap();
        assert!(build_task_kernel_map(&path).is_empty());

        std::fs::write(&path, r#"{ "kernels": [ { "name": "init", "tasks_attribs": [ { "name": "k0" } ] } ] }"#).unwrap();
        assert_eq!(build_task_kernel_map(&path).kernel_name("k0"), "init");
    }
}
