//! Directory discovery.
//!
//! Every `*.rs` file below a registered directory names one class: the file
//! stem in CamelCase is the type name and the subdirectories, also in
//! CamelCase, form the class path. `admin/user_list.rs` is `Admin::UserList`.
//! Module files (`mod.rs`, `lib.rs`, `main.rs`) name no class.

use crate::catalog::to_camel_case;
use domwire_core::{ClassName, SetupError};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

const MODULE_FILES: &[&str] = &["mod", "lib", "main"];

/// A class found by scanning a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredClass {
    /// The class name, prefixed with the namespace if any.
    pub name: ClassName,
    /// The file path relative to the scanned root.
    pub relative: PathBuf,
}

impl DiscoveredClass {
    /// The type name the file is expected to define.
    pub fn type_name(&self) -> &str {
        self.name.short_name()
    }
}

/// The file that defines `class` under a namespace rooted at `root`.
pub fn class_file(namespace: &ClassName, class: &ClassName) -> PathBuf {
    let mut path = PathBuf::new();
    for segment in &class.segments()[namespace.segments().len()..] {
        path.push(crate::catalog::to_snake_case(segment));
    }
    path.set_extension("rs");
    path
}

/// Scan `root` recursively.
pub fn scan_directory(
    root: &Path,
    namespace: Option<&ClassName>,
) -> Result<Vec<DiscoveredClass>, SetupError> {
    let mut found = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| SetupError::Discovery {
            path: root.to_path_buf(),
            reason: e.to_string(),
        })?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "rs") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if MODULE_FILES.contains(&stem) {
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };

        let mut segments: Vec<String> = namespace
            .map(|ns| ns.segments().to_vec())
            .unwrap_or_default();
        if let Some(parent) = relative.parent() {
            for component in parent.components() {
                segments.push(to_camel_case(&component.as_os_str().to_string_lossy()));
            }
        }
        segments.push(to_camel_case(stem));

        match ClassName::from_segments(segments) {
            Ok(name) => found.push(DiscoveredClass {
                name,
                relative: relative.to_path_buf(),
            }),
            Err(err) => warn!(path = %path.display(), error = %err, "skipping file"),
        }
    }
    Ok(found)
}
