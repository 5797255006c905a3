//! Layered configuration and the resolved policy it produces.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Deserializer};

use crate::{BACKUP_SUFFIX, ConfigError, Environment, IgnoreMatcher};

/// Name of the per-tree configuration file.
pub const CONFIG_FILE_NAME: &str = "emanate.json";

/// Base-relative names that are never linked. Each is anchored both at the
/// top of the source tree and below any subdirectory of it.
const DEFAULT_IGNORE: &[&str] = &[
    "*~",
    ".*~",
    ".*.sw?",
    CONFIG_FILE_NAME,
    ".git",
    ".git/*",
    ".gitignore",
    ".gitmodules",
    "__pycache__",
    "__pycache__/*",
];

/// One layer of configuration.
///
/// Every field is optional so that layers can be stacked: absent values
/// leave the lower layer untouched, and `ignore` sets accumulate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Builder, Deserialize)]
#[builder(default)]
#[serde(default)]
pub struct Config {
    /// Root of the tree to mirror.
    #[builder(setter(into, strip_option))]
    pub source: Option<PathBuf>,

    /// Root under which links are created.
    #[builder(setter(into, strip_option))]
    pub destination: Option<PathBuf>,

    /// Glob patterns excluded from synchronization.
    #[builder(setter(each(name = "ignore_pattern", into)))]
    #[serde(deserialize_with = "null_as_empty")]
    pub ignore: BTreeSet<PathBuf>,

    /// Ask before replacing an existing destination file.
    #[builder(setter(into, strip_option))]
    pub confirm: Option<bool>,
}

/// An explicit `null` for `ignore` contributes nothing, like an absent key.
fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeSet<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeSet<PathBuf>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Config {
    /// Create a new config builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Built-in defaults, with ignore patterns anchored under `source_hint`.
    pub fn defaults(source_hint: &Path, env: &Environment) -> Result<Self, ConfigError> {
        let source = env.resolve(source_hint, &env.cwd)?;

        let mut names: Vec<String> = DEFAULT_IGNORE.iter().map(|n| n.to_string()).collect();
        names.push(format!("*{BACKUP_SUFFIX}"));

        let ignore = names
            .iter()
            .flat_map(|name| [source.join(name), source.join("*").join(name)])
            .collect();

        Ok(Self {
            destination: env.home.clone(),
            source: Some(source),
            ignore,
            confirm: Some(true),
        })
    }

    /// Load a JSON configuration file and resolve it against the file's directory.
    pub fn from_file(path: &Path, env: &Environment) -> Result<Self, ConfigError> {
        let path = env.absolutize(path)?;
        let data = std::fs::read_to_string(&path).map_err(|e| ConfigError::io(&path, e))?;
        let raw: Config = serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;

        let base = path.parent().unwrap_or(Path::new("/"));
        tracing::debug!(path = %path.display(), "loaded configuration file");
        raw.resolve(base, env)
    }

    /// Return a copy with every path-typed field expanded and anchored under `base`.
    pub fn resolve(&self, base: &Path, env: &Environment) -> Result<Self, ConfigError> {
        let resolve_opt = |path: &Option<PathBuf>| -> Result<Option<PathBuf>, ConfigError> {
            path.as_deref().map(|p| env.resolve(p, base)).transpose()
        };

        Ok(Self {
            source: resolve_opt(&self.source)?,
            destination: resolve_opt(&self.destination)?,
            ignore: self
                .ignore
                .iter()
                .map(|pattern| env.resolve(pattern, base))
                .collect::<Result<_, _>>()?,
            confirm: self.confirm,
        })
    }

    /// The first path-typed field that is not absolute, if any.
    pub fn unresolved_field(&self) -> Option<(&'static str, &Path)> {
        let fields = [("source", self.source.as_deref()), ("destination", self.destination.as_deref())];

        fields
            .into_iter()
            .filter_map(|(name, path)| path.map(|p| (name, p)))
            .chain(self.ignore.iter().map(|p| ("ignore", p.as_path())))
            .find(|(_, path)| !path.is_absolute())
    }

    /// Check whether every path-typed field is absolute.
    pub fn is_resolved(&self) -> bool {
        self.unresolved_field().is_none()
    }

    /// Layer `other` on top of `self`.
    ///
    /// Values present in `other` win, absent ones are skipped, and the
    /// `ignore` sets are unioned.
    pub fn merge(&self, other: &Config) -> Config {
        Config {
            source: other.source.clone().or_else(|| self.source.clone()),
            destination: other.destination.clone().or_else(|| self.destination.clone()),
            ignore: self.ignore.union(&other.ignore).cloned().collect(),
            confirm: other.confirm.or(self.confirm),
        }
    }

    /// Fold a sequence of layers from lowest to highest priority.
    ///
    /// With `strict`, every layer must already be resolved.
    pub fn merge_all<'a, I>(configs: I, strict: bool) -> Result<Config, ConfigError>
    where
        I: IntoIterator<Item = &'a Config>,
    {
        configs.into_iter().try_fold(Config::default(), |acc, config| {
            if strict {
                if let Some((field, path)) = config.unresolved_field() {
                    return Err(ConfigError::UnresolvedConfig {
                        field,
                        path: path.to_path_buf(),
                    });
                }
            }
            Ok(acc.merge(config))
        })
    }
}

/// The fully merged, resolved configuration a run acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    /// Absolute root of the tree to mirror.
    pub source: PathBuf,
    /// Absolute root under which links are created.
    pub destination: PathBuf,
    /// Absolute ignore patterns.
    pub ignore: BTreeSet<PathBuf>,
    /// Ask before replacing an existing destination file.
    pub confirm: bool,
}

impl Policy {
    /// Build a policy from explicit layers, lowest priority first.
    ///
    /// The layers must be resolved. Built-in defaults sit beneath all of
    /// them, with their ignore patterns anchored at the effective source.
    pub fn from_layers<I>(env: &Environment, layers: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = Config>,
    {
        let layers: Vec<Config> = layers.into_iter().collect();
        let explicit = Config::merge_all(&layers, true)?;

        let hint = explicit.source.clone().unwrap_or_else(|| env.cwd.clone());
        let merged = Config::defaults(&hint, env)?.merge(&explicit);

        let policy = Self::try_from(merged)?;
        tracing::debug!(
            source = %policy.source.display(),
            destination = %policy.destination.display(),
            patterns = policy.ignore.len(),
            confirm = policy.confirm,
            "resolved policy"
        );
        Ok(policy)
    }

    /// Matcher for this policy's ignore patterns.
    pub fn matcher(&self) -> IgnoreMatcher {
        IgnoreMatcher::new(self.ignore.iter().map(PathBuf::as_path))
    }
}

impl TryFrom<Config> for Policy {
    type Error = ConfigError;

    fn try_from(config: Config) -> Result<Self, Self::Error> {
        if let Some((field, path)) = config.unresolved_field() {
            return Err(ConfigError::UnresolvedConfig {
                field,
                path: path.to_path_buf(),
            });
        }

        let source = config
            .source
            .ok_or_else(|| ConfigError::invalid("no source directory"))?;
        let destination = config
            .destination
            .ok_or_else(|| ConfigError::invalid("no destination directory"))?;

        Ok(Self {
            source,
            destination,
            ignore: config.ignore,
            confirm: config.confirm.unwrap_or(true),
        })
    }
}
