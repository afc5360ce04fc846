//! Locating and mapping the shared library.
//!
//! Resolution is a pure function of [`LoaderConfig`] and the filesystem; the
//! process environment is never consulted here.

use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::path::{Path, PathBuf};

use libloading::Library;
use log::{debug, info};

use crate::config::LoaderConfig;
use crate::error::LoaderError;

#[derive(Debug, Clone)]
pub struct Loader {
    config: LoaderConfig,
}

impl Loader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Platform file name of the configured library.
    pub fn file_name(&self) -> String {
        library_filename(self.config.library())
    }

    /// Directories in the order they are searched.
    pub fn search_order(&self) -> Vec<PathBuf> {
        let mut dirs = self.config.search_paths().to_vec();
        if self.config.system_paths() {
            dirs.extend(system_search_paths());
        }
        dirs
    }

    /// Finds the library file without loading it.
    pub fn resolve(&self) -> Result<PathBuf, LoaderError> {
        if self.config.is_explicit_path() {
            let path = PathBuf::from(self.config.library());
            if path.is_file() {
                return Ok(path);
            }
            return Err(LoaderError::NotFound {
                library: self.config.library().to_string(),
                searched: Vec::new(),
            });
        }

        let file_name = self.file_name();
        let searched = self.search_order();
        for dir in &searched {
            let candidate = dir.join(&file_name);
            debug!("looking for {} in {}", file_name, dir.display());
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        Err(LoaderError::NotFound {
            library: file_name,
            searched,
        })
    }

    pub fn load(&self) -> Result<LoadedLibrary, LoaderError> {
        let path = self.resolve()?;
        LoadedLibrary::open(path)
    }
}

/// A mapped library. Symbols borrowed from it must not outlive it.
#[derive(Debug)]
pub struct LoadedLibrary {
    path: PathBuf,
    library: Library,
}

impl LoadedLibrary {
    pub fn open<T>(path: T) -> Result<Self, LoaderError>
    where
        T: Into<PathBuf>,
    {
        let path = path.into();

        // SAFETY: running the library's initializers is the point of loading
        // it; the caller chose which file that is.
        let library = unsafe { Library::new(&path) }.map_err(|source| LoaderError::Load {
            path: path.clone(),
            source,
        })?;
        info!("loaded {}", path.display());

        Ok(Self { path, library })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Looks up a symbol and copies it out as `T`.
    ///
    /// # Safety
    ///
    /// `T` must match the symbol's real type and calling convention. A
    /// function pointer obtained here is only valid while `self` is alive.
    pub unsafe fn symbol<T: Copy>(&self, name: &str) -> Result<T, LoaderError> {
        // SAFETY: forwarded to the caller.
        let symbol = unsafe { self.library.get::<T>(name.as_bytes()) }.map_err(|source| {
            LoaderError::MissingSymbol {
                symbol: name.to_string(),
                path: self.path.clone(),
                source,
            }
        })?;
        Ok(*symbol)
    }
}

/// `lib<name>.so`, `lib<name>.dylib` or `<name>.dll`. Names that already
/// carry the platform prefix and suffix (`libc.so.6`) are used unchanged.
pub fn library_filename(name: &str) -> String {
    if name.starts_with(DLL_PREFIX) && name.contains(DLL_SUFFIX) {
        name.to_string()
    } else {
        format!("{}{}{}", DLL_PREFIX, name, DLL_SUFFIX)
    }
}

/// Default directories of the platform's dynamic loader.
pub fn system_search_paths() -> Vec<PathBuf> {
    let mut paths: Vec<&str> = Vec::new();

    #[cfg(target_os = "linux")]
    {
        #[cfg(target_arch = "x86_64")]
        paths.extend(["/lib/x86_64-linux-gnu", "/usr/lib/x86_64-linux-gnu"]);
        #[cfg(target_arch = "aarch64")]
        paths.extend(["/lib/aarch64-linux-gnu", "/usr/lib/aarch64-linux-gnu"]);
        paths.extend(["/lib64", "/usr/lib64", "/lib", "/usr/lib", "/usr/local/lib"]);
    }

    #[cfg(target_os = "macos")]
    paths.extend(["/usr/lib", "/usr/local/lib", "/opt/homebrew/lib"]);

    #[cfg(target_os = "windows")]
    paths.push("C:\\Windows\\System32");

    paths.into_iter().map(PathBuf::from).collect()
}
