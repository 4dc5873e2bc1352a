//! Directory traversal filtered by a [`PatternPolicy`].
//!
//! Both the tree pass and the collection pass walk through [`walk`], so the
//! two always agree on which paths are visible. Entries come out depth-first
//! with siblings in byte-wise lexicographic order, and directories excluded
//! by the policy are never entered.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use ignore::WalkBuilder;
use log::trace;
use thiserror::Error;

use crate::policy::PatternPolicy;

/// Errors that can occur during directory walking.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Traverse(#[from] ignore::Error),
}

/// Options for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Maximum depth to recurse (None = unlimited).
    pub max_depth: Option<usize>,
    /// Follow symbolic links.
    pub follow_symlinks: bool,
    /// Include dotfiles and dot-directories. `.git` stays excluded by the policy.
    pub include_hidden: bool,
    /// File base name to leave out, typically the output document.
    pub skip_file_name: Option<OsString>,
}

impl WalkOptions {
    /// Set maximum depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Leave out files with this base name.
    pub fn skip_file(mut self, name: impl Into<OsString>) -> Self {
        self.skip_file_name = Some(name.into());
        self
    }
}

/// Entry from directory walk.
#[derive(Debug, Clone)]
pub struct WalkEntry {
    /// Path to the entry (root joined with `relative`).
    pub path: PathBuf,
    /// Path relative to the walk root.
    pub relative: PathBuf,
    /// Depth from root (root's children = 1).
    pub depth: usize,
    /// Whether this is a directory. Symlinks count as files unless followed.
    pub is_dir: bool,
}

/// Fail unless `root` exists and is a directory.
pub fn check_root(root: &Path) -> Result<(), WalkError> {
    match root.metadata() {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(WalkError::NotADirectory {
            path: root.to_path_buf(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(WalkError::NotFound {
            path: root.to_path_buf(),
        }),
        Err(e) => Err(WalkError::Io {
            path: root.to_path_buf(),
            source: e,
        }),
    }
}

/// Walk `root`, yielding every entry the policy leaves visible.
///
/// The root itself is not yielded. Errors for unlistable directories are
/// yielded in place and the walk continues with their siblings.
///
/// # Examples
///
/// ```no_run
/// use mergetree::policy::PatternPolicy;
/// use mergetree::walker::{walk, WalkOptions};
/// use std::path::Path;
/// use std::sync::Arc;
///
/// let root = Path::new(".");
/// let policy = Arc::new(PatternPolicy::build(root));
/// for entry in walk(root, &policy, &WalkOptions::default()).flatten() {
///     println!("{}", entry.relative.display());
/// }
/// ```
pub fn walk(
    root: &Path,
    policy: &Arc<PatternPolicy>,
    options: &WalkOptions,
) -> impl Iterator<Item = Result<WalkEntry, WalkError>> {
    let root = root.to_path_buf();

    let mut builder = WalkBuilder::new(&root);
    builder
        .standard_filters(false)
        .hidden(!options.include_hidden)
        .follow_links(options.follow_symlinks)
        .max_depth(options.max_depth)
        .sort_by_file_name(|a, b| a.cmp(b));

    let filter_root = root.clone();
    let filter_policy = Arc::clone(policy);
    let skip_file_name = options.skip_file_name.clone();
    builder.filter_entry(move |entry| {
        let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
        if !is_dir && skip_file_name.as_deref() == Some(entry.file_name()) {
            trace!("skipping output file {}", entry.path().display());
            return false;
        }

        let relative = entry.path().strip_prefix(&filter_root).unwrap_or(entry.path());
        if filter_policy.matches(relative, is_dir) {
            trace!("pruned {}", relative.display());
            return false;
        }
        true
    });

    builder.build().filter_map(move |result| match result {
        Ok(entry) if entry.depth() == 0 => None,
        Ok(entry) => {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            let depth = entry.depth();
            let path = entry.into_path();
            let relative = path
                .strip_prefix(&root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| path.clone());

            Some(Ok(WalkEntry {
                path,
                relative,
                depth,
                is_dir,
            }))
        }
        Err(e) => Some(Err(WalkError::Traverse(e))),
    })
}

/// Render a relative path with `/` separators.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
