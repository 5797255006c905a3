//! Process environment used to resolve paths.

use std::path::{Component, Path, PathBuf};

use crate::ConfigError;

/// Home and working directories, injected instead of read from ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    /// The user's home directory, if one is known.
    pub home: Option<PathBuf>,
    /// The working directory relative paths from the command line resolve against.
    pub cwd: PathBuf,
}

impl Environment {
    /// Create an environment from explicit directories.
    pub fn new(home: Option<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            home,
            cwd: cwd.into(),
        }
    }

    /// Capture the home and working directories of the running process.
    pub fn from_process() -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(|e| ConfigError::io(".", e))?;
        Ok(Self::new(dirs::home_dir(), cwd))
    }

    /// Expand a leading `~` to the home directory.
    pub fn expand_home(&self, path: &Path) -> Result<PathBuf, ConfigError> {
        let Ok(rest) = path.strip_prefix("~") else {
            return Ok(path.to_path_buf());
        };

        match &self.home {
            Some(home) => Ok(home.join(rest)),
            None => Err(ConfigError::invalid(format!(
                "cannot expand {}: no home directory",
                path.display()
            ))),
        }
    }

    /// Expand `~`, then anchor relative paths under `base`.
    ///
    /// `base` must be absolute.
    pub fn resolve(&self, path: &Path, base: &Path) -> Result<PathBuf, ConfigError> {
        if !base.is_absolute() {
            return Err(ConfigError::invalid(format!(
                "base directory {} is not absolute",
                base.display()
            )));
        }

        let expanded = self.expand_home(path)?;
        let joined = if expanded.is_absolute() {
            expanded
        } else {
            base.join(expanded)
        };

        Ok(normalize(&joined))
    }

    /// Make a path absolute against the working directory.
    pub fn absolutize(&self, path: &Path) -> Result<PathBuf, ConfigError> {
        self.resolve(path, &self.cwd)
    }
}

/// Remove `.` and `..` components without touching the filesystem.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                if matches!(components.last(), Some(Component::Normal(_))) {
                    components.pop();
                }
            }
            Component::CurDir => {}
            other => components.push(other),
        }
    }

    components.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> Environment {
        Environment::new(Some(PathBuf::from("/home/ada")), "/work")
    }

    #[test]
    fn test_expand_home() {
        let env = env();
        assert_eq!(
            env.expand_home(Path::new("~/dotfiles")).unwrap(),
            PathBuf::from("/home/ada/dotfiles")
        );
        assert_eq!(
            env.expand_home(Path::new("~")).unwrap(),
            PathBuf::from("/home/ada")
        );
        // Only a whole leading component is a home marker.
        assert_eq!(
            env.expand_home(Path::new("~ada/x")).unwrap(),
            PathBuf::from("~ada/x")
        );
    }

    #[test]
    fn test_expand_home_without_home() {
        let env = Environment::new(None, "/work");
        assert!(matches!(
            env.expand_home(Path::new("~/x")),
            Err(ConfigError::InvalidConfig { .. })
        ));
        assert!(env.expand_home(Path::new("x")).is_ok());
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let env = env();
        let base = Path::new("/repo/src");
        assert_eq!(
            env.resolve(Path::new("../dest"), base).unwrap(),
            PathBuf::from("/repo/dest")
        );
        assert_eq!(
            env.resolve(Path::new("/etc/x"), base).unwrap(),
            PathBuf::from("/etc/x")
        );
        assert_eq!(
            env.resolve(Path::new("./a/./b"), base).unwrap(),
            PathBuf::from("/repo/src/a/b")
        );
    }

    #[test]
    fn test_resolve_rejects_relative_base() {
        let env = env();
        let result = env.resolve(Path::new("x"), Path::new("relative"));
        assert!(matches!(result, Err(ConfigError::InvalidConfig { .. })));
    }

    #[test]
    fn test_normalize_stops_at_root() {
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("/a/b/../../c")), PathBuf::from("/c"));
    }
}
