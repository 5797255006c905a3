//! Serial jwalk-based pair planner.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use jwalk::{DirEntryIter, Parallelism, WalkDir};

use emanate_core::{FilePair, IgnoreMatcher, Policy};

use crate::PlanError;

/// Plans the file pairs for a policy's source and destination.
#[derive(Debug, Clone)]
pub struct PairPlanner {
    source: PathBuf,
    destination: PathBuf,
    matcher: Arc<IgnoreMatcher>,
}

impl PairPlanner {
    /// Create a planner for a resolved policy.
    pub fn new(policy: &Policy) -> Result<Self, PlanError> {
        if !policy.source.is_dir() {
            return Err(PlanError::NotADirectory {
                path: policy.source.clone(),
            });
        }

        Ok(Self {
            source: policy.source.clone(),
            destination: policy.destination.clone(),
            matcher: Arc::new(policy.matcher()),
        })
    }

    /// Root of the mirrored tree.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Root under which links are placed.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Start a walk of the source tree.
    ///
    /// The destination root is created if missing. Each call walks the
    /// tree afresh.
    pub fn pairs(&self) -> Result<Pairs, PlanError> {
        ensure_dir(&self.destination)?;

        let matcher = Arc::clone(&self.matcher);
        let walker = WalkDir::new(&self.source)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(false)
            .follow_links(false)
            .min_depth(1)
            .process_read_dir(move |_depth, _path, _state, children| {
                // Don't descend into ignored directories.
                for entry in children.iter_mut().flatten() {
                    if entry.file_type.is_dir() && matcher.is_ignored(&entry.path()) {
                        entry.read_children_path = None;
                    }
                }
            });

        Ok(Pairs {
            walker: walker.into_iter(),
            source: self.source.clone(),
            destination: self.destination.clone(),
            matcher: Arc::clone(&self.matcher),
        })
    }
}

/// Lazy sequence of file pairs produced by a walk.
///
/// Mirrored directories are created as the walk reaches them. Entries
/// that cannot be read are logged and skipped.
pub struct Pairs {
    walker: DirEntryIter<((), ())>,
    source: PathBuf,
    destination: PathBuf,
    matcher: Arc<IgnoreMatcher>,
}

impl Iterator for Pairs {
    type Item = Result<FilePair, PlanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    tracing::warn!(path = %path.display(), %err, "skipping unreadable entry");
                    continue;
                }
            };

            let path = entry.path();
            if self.matcher.is_ignored(&path) {
                tracing::trace!(path = %path.display(), "ignored");
                continue;
            }

            let Ok(relative) = path.strip_prefix(&self.source) else {
                continue;
            };
            let dest = self.destination.join(relative);

            if entry.file_type().is_dir() {
                if let Err(err) = ensure_dir(&dest) {
                    return Some(Err(err));
                }
                continue;
            }

            tracing::debug!(src = %path.display(), dest = %dest.display(), "planned");
            return Some(Ok(FilePair::new(path, dest)));
        }
    }
}

/// Create `path` as a directory unless one is already there.
fn ensure_dir(path: &Path) -> Result<(), PlanError> {
    match fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists || path.exists() => {
            if path.is_dir() {
                Ok(())
            } else {
                Err(PlanError::Obstructed {
                    path: path.to_path_buf(),
                })
            }
        }
        Err(err) => Err(PlanError::create_dir(path, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");

        fs::create_dir_all(src.join("sub/deeper")).unwrap();
        fs::create_dir_all(src.join(".git/objects")).unwrap();
        fs::create_dir_all(src.join("private")).unwrap();
        fs::create_dir(temp.path().join("dest")).unwrap();

        fs::write(src.join("foo"), "").unwrap();
        fs::write(src.join(".bashrc"), "").unwrap();
        fs::write(src.join("emanate.json"), "{}").unwrap();
        fs::write(src.join("sub/bar"), "").unwrap();
        fs::write(src.join("sub/deeper/baz"), "").unwrap();
        fs::write(src.join(".git/HEAD"), "").unwrap();
        fs::write(src.join(".git/objects/ab"), "").unwrap();
        fs::write(src.join("private/key"), "").unwrap();
        fs::write(src.join("foo~"), "").unwrap();

        temp
    }

    fn policy(temp: &TempDir, extra_ignore: &[&str]) -> Policy {
        let src = temp.path().join("src");
        let mut ignore: BTreeSet<PathBuf> = [
            "emanate.json",
            "*/emanate.json",
            "*~",
            ".git",
            "*/.git",
            ".git/*",
            "*/.git/*",
        ]
        .iter()
        .map(|p| src.join(p))
        .collect();
        ignore.extend(extra_ignore.iter().map(|p| src.join(p)));

        Policy {
            source: src,
            destination: temp.path().join("dest"),
            ignore,
            confirm: false,
        }
    }

    fn relative_sources(temp: &TempDir, pairs: &[FilePair]) -> Vec<String> {
        let src = temp.path().join("src");
        pairs
            .iter()
            .map(|p| p.src.strip_prefix(&src).unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_plans_files_in_sorted_order() {
        let temp = create_test_tree();
        let planner = PairPlanner::new(&policy(&temp, &[])).unwrap();
        let pairs: Vec<FilePair> = planner.pairs().unwrap().map(Result::unwrap).collect();

        assert_eq!(
            relative_sources(&temp, &pairs),
            vec![".bashrc", "foo", "private/key", "sub/bar", "sub/deeper/baz"]
        );

        let foo = &pairs[1];
        assert_eq!(foo.src, temp.path().join("src/foo"));
        assert_eq!(foo.dest, temp.path().join("dest/foo"));
    }

    #[test]
    fn test_ignored_directory_hides_contents() {
        let temp = create_test_tree();
        let planner = PairPlanner::new(&policy(&temp, &["private"])).unwrap();
        let pairs: Vec<FilePair> = planner.pairs().unwrap().map(Result::unwrap).collect();

        let names = relative_sources(&temp, &pairs);
        assert!(!names.iter().any(|n| n.starts_with("private")));
        assert!(!names.iter().any(|n| n.starts_with(".git")));
        assert!(!temp.path().join("dest/private").exists());
        assert!(!temp.path().join("dest/.git").exists());
    }

    #[test]
    fn test_scaffolds_directories() {
        let temp = create_test_tree();
        let planner = PairPlanner::new(&policy(&temp, &[])).unwrap();

        // Directories appear as the walk reaches them.
        let count = planner.pairs().unwrap().count();
        assert_eq!(count, 5);
        assert!(temp.path().join("dest/sub/deeper").is_dir());
        assert!(temp.path().join("dest/private").is_dir());

        // Walking again is harmless.
        assert_eq!(planner.pairs().unwrap().count(), 5);
    }

    #[test]
    fn test_creates_missing_destination_root() {
        let temp = create_test_tree();
        let mut policy = policy(&temp, &[]);
        policy.destination = temp.path().join("fresh/dest");

        let planner = PairPlanner::new(&policy).unwrap();
        planner.pairs().unwrap().for_each(drop);
        assert!(temp.path().join("fresh/dest/sub").is_dir());
    }

    #[test]
    fn test_obstructed_directory() {
        let temp = create_test_tree();
        fs::write(temp.path().join("dest/sub"), "not a dir").unwrap();

        let planner = PairPlanner::new(&policy(&temp, &[])).unwrap();
        let errors: Vec<PlanError> = planner.pairs().unwrap().filter_map(Result::err).collect();

        assert!(matches!(errors[0], PlanError::Obstructed { .. }));
        assert!(errors.iter().all(|e| !e.is_fatal()));
    }

    #[test]
    fn test_missing_source() {
        let temp = TempDir::new().unwrap();
        let policy = Policy {
            source: temp.path().join("nope"),
            destination: temp.path().join("dest"),
            ignore: BTreeSet::new(),
            confirm: true,
        };

        let result = PairPlanner::new(&policy);
        assert!(matches!(result, Err(PlanError::NotADirectory { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_files() {
        let temp = create_test_tree();
        let src = temp.path().join("src");
        std::os::unix::fs::symlink(src.join("sub"), src.join("sublink")).unwrap();
        std::os::unix::fs::symlink(src.join("missing"), src.join("dangling")).unwrap();

        let planner = PairPlanner::new(&policy(&temp, &[])).unwrap();
        let pairs: Vec<FilePair> = planner.pairs().unwrap().map(Result::unwrap).collect();
        let names = relative_sources(&temp, &pairs);

        assert!(names.contains(&"sublink".to_string()));
        assert!(names.contains(&"dangling".to_string()));
        assert!(!names.iter().any(|n| n.starts_with("sublink/")));
    }
}
