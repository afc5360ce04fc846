use std::path::{MAIN_SEPARATOR, PathBuf};
use std::process::{Command, Output};

use log::info;

use crate::config::{CONFIG_VAR, SEARCH_PATH_VAR};
use crate::error::LaunchError;

type LaunchResult = Result<Output, LaunchError>;

/// Starts a caller process with its library search path composed from
/// explicit configuration instead of whatever the parent inherited.
pub struct Launch {
    program: String,
    args: Vec<String>,
    search_paths: Vec<PathBuf>,
    config: Option<PathBuf>,
}

impl Launch {
    pub fn new<T>(program: T) -> Self
    where
        T: Into<String>,
    {
        Self {
            program: program.into(),
            args: Vec::new(),
            search_paths: Vec::new(),
            config: None,
        }
    }

    pub fn add_arg<T>(mut self, arg: T) -> Self
    where
        T: Into<String>,
    {
        self.args.push(arg.into());
        self
    }

    pub fn add_search_path<T>(mut self, path: T) -> Self
    where
        T: Into<PathBuf>,
    {
        self.search_paths.push(path.into());
        self
    }

    pub fn set_config<T>(mut self, path: T) -> Self
    where
        T: Into<PathBuf>,
    {
        self.config = Some(path.into());
        self
    }

    /// Bare names are looked up on `PATH`; anything with a separator is
    /// used as given.
    pub fn resolve_program(&self) -> Result<PathBuf, LaunchError> {
        if self.program.contains(MAIN_SEPARATOR) || self.program.contains('/') {
            return Ok(PathBuf::from(&self.program));
        }
        which::which(&self.program).map_err(|source| LaunchError::ProgramNotFound {
            program: self.program.clone(),
            source,
        })
    }

    /// Runs the caller to completion. A non-zero exit is an error carrying
    /// the child's stderr.
    pub fn run(&self) -> LaunchResult {
        let program = self.resolve_program()?;

        let mut command = Command::new(&program);
        command.args(&self.args);

        // never leak the parent's settings into the child
        command.env_remove(SEARCH_PATH_VAR).env_remove(CONFIG_VAR);
        if !self.search_paths.is_empty() {
            command.env(SEARCH_PATH_VAR, std::env::join_paths(&self.search_paths)?);
        }
        if let Some(config) = &self.config {
            command.env(CONFIG_VAR, config);
        }

        info!(
            "launching {} with {}={:?}",
            program.display(),
            SEARCH_PATH_VAR,
            self.search_paths
        );
        let output = command.output().map_err(|source| LaunchError::Spawn {
            program: program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(LaunchError::Exited {
                program,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_like_program_is_used_verbatim() {
        let launch = Launch::new("./bin/caller");
        assert_eq!(launch.resolve_program().unwrap(), PathBuf::from("./bin/caller"));
    }

    #[cfg(unix)]
    #[test]
    fn bare_program_is_found_on_path() {
        let resolved = Launch::new("sh").resolve_program().unwrap();
        assert!(resolved.is_absolute());
    }

    #[test]
    fn unknown_program_is_reported() {
        let err = Launch::new("scalarbridge-no-such-program")
            .run()
            .unwrap_err();
        assert!(matches!(err, LaunchError::ProgramNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn child_sees_only_configured_search_path() {
        let output = Launch::new("sh")
            .add_arg("-c")
            .add_arg(format!("printf %s \"${}\"", SEARCH_PATH_VAR))
            .add_search_path("/one")
            .add_search_path("/two")
            .run()
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout), "/one:/two");
    }

    #[cfg(unix)]
    #[test]
    fn failing_child_is_an_error() {
        let err = Launch::new("sh")
            .add_arg("-c")
            .add_arg("echo broken >&2; exit 3")
            .run()
            .unwrap_err();
        match err {
            LaunchError::Exited { status, stderr, .. } => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr.trim(), "broken");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
