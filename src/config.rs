use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Name of the shared library built from this crate.
pub const DEFAULT_LIBRARY: &str = "scalarbridge";

/// Environment variable holding extra search directories for the caller.
pub const SEARCH_PATH_VAR: &str = "SCALARBRIDGE_LIBRARY_PATH";

/// Environment variable pointing at a JSON config file or its directory.
pub const CONFIG_VAR: &str = "SCALARBRIDGE_CONFIG";

pub const CONFIG_FILE_NAME: &str = "scalarbridge.json";

/// Where and what the loader looks for.
///
/// Configured directories are searched first, in order, then the platform
/// system directories when `system_paths` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    #[serde(default = "default_library")]
    library: String,
    #[serde(default)]
    search_paths: Vec<PathBuf>,
    #[serde(default = "default_system_paths")]
    system_paths: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LIBRARY)
    }
}

impl LoaderConfig {
    pub fn new<T>(library: T) -> Self
    where
        T: Into<String>,
    {
        Self {
            library: library.into(),
            search_paths: Vec::new(),
            system_paths: default_system_paths(),
        }
    }

    /// Reads a JSON config. A directory is taken to contain `scalarbridge.json`.
    pub fn from_file<T>(path: T) -> Result<Self, ConfigError>
    where
        T: Into<PathBuf>,
    {
        let path = path.into();
        let path = if path.is_dir() {
            path.join(CONFIG_FILE_NAME)
        } else {
            path
        };

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    pub fn add_search_path<T>(mut self, path: T) -> Self
    where
        T: Into<PathBuf>,
    {
        self.search_paths.push(path.into());
        self
    }

    /// Appends every directory of a platform path list (`a:b` on Unix,
    /// `a;b` on Windows). Empty entries are skipped.
    pub fn with_search_path_list<T>(mut self, list: Option<T>) -> Self
    where
        T: AsRef<OsStr>,
    {
        if let Some(list) = list {
            self.search_paths.extend(
                std::env::split_paths(list.as_ref()).filter(|p| !p.as_os_str().is_empty()),
            );
        }
        self
    }

    pub fn set_system_paths(mut self, enabled: bool) -> Self {
        self.system_paths = enabled;
        self
    }

    pub fn library(&self) -> &str {
        &self.library
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub fn system_paths(&self) -> bool {
        self.system_paths
    }

    pub(crate) fn is_explicit_path(&self) -> bool {
        Path::new(&self.library).components().count() > 1
    }
}

fn default_library() -> String {
    DEFAULT_LIBRARY.to_string()
}

fn default_system_paths() -> bool {
    true
}

/// Per-process temporary directory, removed again on drop.
#[cfg(test)]
pub(crate) struct ScratchDir(PathBuf);

#[cfg(test)]
impl ScratchDir {
    pub(crate) fn new(name: &str) -> Self {
        let dir =
            std::env::temp_dir().join(format!("scalarbridge-{}-{}", std::process::id(), name));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }

    pub(crate) fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
impl std::ops::Deref for ScratchDir {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}
