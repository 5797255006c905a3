//! Shell-glob ignore matching against absolute paths.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

/// Decides whether a path is excluded from synchronization.
///
/// Patterns follow shell `fnmatch` rules: `*` matches any run of
/// characters including `/`, `?` matches one character, and `[...]`
/// matches a character class. There is no recursive `**` and no
/// case folding.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    set: GlobSet,
    patterns: Vec<PathBuf>,
}

impl IgnoreMatcher {
    /// Build a matcher from absolute patterns.
    ///
    /// A pattern naming an existing directory also ignores `<dir>/*`.
    pub fn new<'a, I>(patterns: I) -> Self
    where
        I: IntoIterator<Item = &'a Path>,
    {
        let mut expanded = Vec::new();
        for pattern in patterns {
            expanded.push(pattern.to_path_buf());
            if pattern.is_dir() {
                expanded.push(pattern.join("*"));
            }
        }

        let mut builder = GlobSetBuilder::new();
        for glob in expanded.iter().filter_map(|p| compile(p)) {
            builder.add(glob);
        }

        let set = builder.build().unwrap_or_else(|err| {
            tracing::warn!(%err, "failed to build ignore set, nothing will be ignored");
            GlobSet::empty()
        });

        Self {
            set,
            patterns: expanded,
        }
    }

    /// Check whether an absolute path matches any pattern.
    pub fn is_ignored(&self, path: &Path) -> bool {
        self.set.is_match(path)
    }

    /// The patterns in effect, including directory expansions.
    pub fn patterns(&self) -> &[PathBuf] {
        &self.patterns
    }
}

/// Compile one pattern, treating it literally if it is not a valid glob.
fn compile(pattern: &Path) -> Option<Glob> {
    let text = pattern.to_string_lossy();
    let translated = translate(&text);

    GlobBuilder::new(&translated)
        .literal_separator(false)
        .backslash_escape(false)
        .build()
        .or_else(|err| {
            tracing::warn!(pattern = %text, %err, "invalid ignore pattern, matching literally");
            Glob::new(&globset::escape(&text))
        })
        .ok()
}

/// Rewrite `fnmatch` syntax into the `globset` dialect.
///
/// Runs of `*` collapse to one and braces are quoted, so neither `**` nor
/// `{a,b}` gain a meaning `fnmatch` does not give them.
fn translate(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    let mut in_class = false;

    while let Some(c) = chars.next() {
        if in_class {
            out.push(c);
            if c == ']' {
                in_class = false;
            }
            continue;
        }

        match c {
            '*' => {
                while chars.peek() == Some(&'*') {
                    chars.next();
                }
                out.push('*');
            }
            '{' | '}' => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            '[' => {
                in_class = true;
                out.push('[');
                // A leading `!` or `]` belongs to the class body.
                if chars.peek() == Some(&'!') {
                    out.extend(chars.next());
                }
                if chars.peek() == Some(&']') {
                    out.extend(chars.next());
                }
            }
            other => out.push(other),
        }
    }

    out
}
