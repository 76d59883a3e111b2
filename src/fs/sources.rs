// src/fs/sources.rs

//! Source glob sets with gulp-style semantics.
//!
//! - Patterns are relative to the project root and use `/` separators.
//! - A leading `!` negates a pattern; negations apply to every positive one.
//! - `*` does not cross directory boundaries; `**/` matches zero or more
//!   directories; `{a,b}` alternation is supported.
//! - Each positive pattern has a *glob base*: its leading non-glob
//!   directory (or the parent directory of a literal file). Outputs mirror
//!   the path relative to that base.
//! - A file matched by several patterns is reported once, for the first
//!   pattern that matched it.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};

use super::FileSystem;

/// A file resolved from a [`SourceSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// `root.join(rel_path)`.
    pub path: PathBuf,
    /// Path relative to the project root, `/`-separated.
    pub rel_path: String,
    /// Path relative to the glob base of the pattern that matched.
    pub relative: PathBuf,
}

#[derive(Clone)]
struct IncludePattern {
    pattern: String,
    base: PathBuf,
    matcher: GlobMatcher,
}

/// Compiled, ordered list of include/exclude globs.
#[derive(Clone)]
pub struct SourceSet {
    patterns: Vec<String>,
    includes: Vec<IncludePattern>,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for SourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSet")
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl SourceSet {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .collect();

        let mut includes = Vec::new();
        let mut exclude_builder = GlobSetBuilder::new();
        let mut has_exclude = false;

        for raw in &patterns {
            if let Some(negated) = raw.strip_prefix('!') {
                let pat = normalize_pattern(negated);
                exclude_builder.add(
                    GlobBuilder::new(&pat)
                        .literal_separator(true)
                        .build()
                        .with_context(|| format!("invalid glob pattern: {raw}"))?,
                );
                has_exclude = true;
            } else {
                let pat = normalize_pattern(raw);
                let matcher = GlobBuilder::new(&pat)
                    .literal_separator(true)
                    .build()
                    .with_context(|| format!("invalid glob pattern: {raw}"))?
                    .compile_matcher();
                includes.push(IncludePattern {
                    base: glob_base(&pat),
                    pattern: pat,
                    matcher,
                });
            }
        }

        if includes.is_empty() {
            return Err(anyhow!(
                "glob list {:?} has no positive pattern",
                patterns
            ));
        }

        let exclude = if has_exclude {
            Some(exclude_builder.build()?)
        } else {
            None
        };

        Ok(Self {
            patterns,
            includes,
            exclude,
        })
    }

    /// Patterns exactly as configured (including `!` negations).
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Glob bases of the positive patterns, in pattern order.
    pub fn bases(&self) -> impl Iterator<Item = &Path> {
        self.includes.iter().map(|i| i.base.as_path())
    }

    /// Returns true if `rel_path` (relative to the project root) is matched
    /// by at least one positive pattern and by no negation.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.matching_include(rel_path).is_some()
    }

    fn matching_include(&self, rel_path: &str) -> Option<&IncludePattern> {
        let rel_path = rel_path.trim_start_matches("./");
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return None;
            }
        }
        self.includes.iter().find(|i| i.matcher.is_match(rel_path))
    }

    /// Resolve every file under `root` matched by this set.
    ///
    /// Missing base directories are not an error: they just contribute no
    /// files.
    pub fn resolve(&self, fs: &dyn FileSystem, root: &Path) -> Result<Vec<SourceFile>> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::new();

        for include in &self.includes {
            let start = root.join(&include.base);
            let mut candidates = Vec::new();

            if fs.is_dir(&start) {
                collect_files(fs, &start, &mut candidates)?;
            } else {
                let literal = root.join(&include.pattern);
                if fs.is_file(&literal) {
                    candidates.push(literal);
                }
            }

            candidates.sort();

            for path in candidates {
                let Some(rel_path) = root_relative(root, &path) else {
                    continue;
                };
                if !include.matcher.is_match(&rel_path) {
                    continue;
                }
                if let Some(exclude) = &self.exclude {
                    if exclude.is_match(&rel_path) {
                        continue;
                    }
                }
                if !seen.insert(rel_path.clone()) {
                    continue;
                }

                let relative = Path::new(&rel_path)
                    .strip_prefix(&include.base)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| PathBuf::from(&rel_path));

                out.push(SourceFile {
                    path,
                    rel_path,
                    relative,
                });
            }
        }

        Ok(out)
    }
}

/// Recursively collect regular files below `dir`.
fn collect_files(fs: &dyn FileSystem, dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut stack = vec![dir.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                files.push(path);
            }
        }
    }

    Ok(())
}

fn root_relative(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
}

fn normalize_pattern(pattern: &str) -> String {
    let pattern = pattern.trim().replace('\\', "/");
    let pattern = pattern.trim_start_matches("./");
    pattern.to_string()
}

fn is_glob_component(component: &str) -> bool {
    component.contains(['*', '?', '[', '{'])
}

/// Leading literal directory of a pattern.
///
/// - `src/**/*.html` -> `src`
/// - `src/assets/css/*.css` -> `src/assets/css`
/// - `src/assets/css/style.css` -> `src/assets/css`
/// - `*.css` -> `` (the root itself)
pub fn glob_base(pattern: &str) -> PathBuf {
    let components: Vec<&str> = pattern.split('/').filter(|c| !c.is_empty()).collect();
    let literal_len = components
        .iter()
        .position(|c| is_glob_component(c))
        .unwrap_or_else(|| components.len().saturating_sub(1));

    components[..literal_len].iter().collect()
}
