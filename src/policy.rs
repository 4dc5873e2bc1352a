//! Ignore policy merged from every ignore-file in a tree.
//!
//! A [`PatternPolicy`] is built once, before any traversal, and then shared
//! read-only by the tree and collection passes. It holds:
//!
//! - a built-in rule excluding `.git/` directories, always first
//! - the rules of every ignore-file found under the root, in directory
//!   order (a directory's file precedes the files of its subdirectories)
//!
//! Matching follows gitignore semantics: `*`, `**`, `?` and character
//! classes, `!` re-includes, a trailing `/` matches directories only, and
//! the last matching rule decides.
//!
//! Rules from an ignore-file below the root are scoped to its directory, so
//! `*.log` in `sub/.gitignore` is evaluated as `sub/**/*.log`.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::{Match, WalkBuilder};
use log::{debug, trace, warn};

/// Ignore-file name looked for in every directory.
pub const DEFAULT_IGNORE_FILE: &str = ".gitignore";

/// Version-control metadata directory, excluded by the built-in rule.
pub const VCS_DIR: &str = ".git";

const VCS_RULE: &str = ".git/";

/// A single pattern line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRule {
    /// Ignore-file the rule was read from. `None` for built-in and inline rules.
    pub source: Option<PathBuf>,
    /// 1-based line number in `source` (0 for the built-in rule).
    pub line: usize,
    /// The line as written.
    pub original: String,
    /// Pattern handed to the matcher, scoped to the ignore-file's directory.
    pub pattern: String,
    /// `!pattern`: re-include a previously ignored path.
    pub negated: bool,
    /// Pattern contains a `/` before its end and is matched from its base directory.
    pub anchored: bool,
    /// Trailing `/`: matches directories only.
    pub dir_only: bool,
}

impl IgnoreRule {
    fn builtin() -> Self {
        Self {
            source: None,
            line: 0,
            original: VCS_RULE.to_string(),
            pattern: VCS_RULE.to_string(),
            negated: false,
            anchored: false,
            dir_only: true,
        }
    }

    /// Parse one ignore-file line. Blank lines and comments yield `None`.
    ///
    /// `scope` is the slash-separated directory of the ignore-file relative
    /// to the root, empty for the root itself.
    pub fn parse(text: &str, scope: &str, source: Option<PathBuf>, line: usize) -> Option<Self> {
        let trimmed = text.trim_end();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        let (negated, body) = match text.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let body_trimmed = body.trim_end();
        let dir_only = body_trimmed.ends_with('/');
        let core = body_trimmed.trim_end_matches('/');
        if core.is_empty() {
            return None;
        }
        let anchored = core.contains('/');

        let pattern = if scope.is_empty() {
            text.to_string()
        } else {
            let relative = body.strip_prefix('/').unwrap_or(body);
            let scoped = if anchored {
                format!("{scope}/{relative}")
            } else {
                format!("{scope}/**/{relative}")
            };
            if negated {
                format!("!{scoped}")
            } else {
                scoped
            }
        };

        Some(Self {
            source,
            line,
            original: text.to_string(),
            pattern,
            negated,
            anchored,
            dir_only,
        })
    }

    /// `file:line` for diagnostics.
    pub fn location(&self) -> String {
        match (&self.source, self.line) {
            (None, 0) => "built-in".to_string(),
            (None, line) => format!("<inline>:{line}"),
            (Some(path), line) => format!("{}:{}", path.display(), line),
        }
    }
}

/// The rule that decided a path's visibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    /// `true` if the path is excluded, `false` if a `!` rule re-included it.
    pub ignored: bool,
    /// The pattern as evaluated.
    pub pattern: String,
    /// Ignore-file the pattern came from.
    pub source: Option<PathBuf>,
}

/// Compiled, immutable ignore policy for one root.
#[derive(Debug, Clone)]
pub struct PatternPolicy {
    root: PathBuf,
    rules: Vec<IgnoreRule>,
    matcher: Gitignore,
}

impl PatternPolicy {
    /// Build the policy for `root` from every `.gitignore` below it.
    pub fn build(root: &Path) -> Self {
        Self::build_with(root, DEFAULT_IGNORE_FILE, false)
    }

    /// Build the policy, looking for ignore-files named `ignore_file_name`.
    ///
    /// Unreadable ignore-files are logged and contribute no rules.
    pub fn build_with(root: &Path, ignore_file_name: &str, follow_links: bool) -> Self {
        let mut rules = vec![IgnoreRule::builtin()];

        for file in discover_ignore_files(root, ignore_file_name, follow_links) {
            match read_rules(root, &file) {
                Ok(found) => {
                    debug!("loaded {} rules from {}", found.len(), file.display());
                    rules.extend(found);
                }
                Err(err) => warn!("skipping ignore file {}: {}", file.display(), err),
            }
        }

        Self::compile(root, rules)
    }

    /// Build a policy from inline root-level lines, after the built-in rule.
    ///
    /// # Examples
    ///
    /// ```
    /// use mergetree::policy::PatternPolicy;
    /// use std::path::Path;
    ///
    /// let policy = PatternPolicy::from_lines(Path::new("."), ["*.log", "!keep.log"]);
    /// assert!(policy.matches(Path::new("other.log"), false));
    /// assert!(!policy.matches(Path::new("keep.log"), false));
    /// ```
    pub fn from_lines<I, S>(root: &Path, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = vec![IgnoreRule::builtin()];
        rules.extend(
            lines
                .into_iter()
                .enumerate()
                .filter_map(|(i, line)| IgnoreRule::parse(line.as_ref(), "", None, i + 1)),
        );
        Self::compile(root, rules)
    }

    fn compile(root: &Path, rules: Vec<IgnoreRule>) -> Self {
        let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        let mut builder = GitignoreBuilder::new(&root);
        let mut kept = Vec::with_capacity(rules.len());

        for rule in rules {
            match builder.add_line(rule.source.clone(), &rule.pattern) {
                Ok(_) => {
                    trace!("rule {}: {}", rule.location(), rule.pattern);
                    kept.push(rule);
                }
                Err(err) => warn!(
                    "ignoring invalid pattern {:?} at {}: {}",
                    rule.original,
                    rule.location(),
                    err
                ),
            }
        }

        let matcher = match builder.build() {
            Ok(matcher) => matcher,
            Err(err) => {
                warn!("failed to compile ignore rules, keeping only {VCS_RULE}: {err}");
                kept.truncate(1);
                vcs_only(&root)
            }
        };

        Self {
            root,
            rules: kept,
            matcher,
        }
    }

    /// Whether `path` is excluded.
    ///
    /// `path` is relative to the root (absolute paths under the root are
    /// accepted too). A path inside an excluded directory is always
    /// excluded; a `!` rule cannot re-include it, as in git.
    pub fn matches(&self, path: &Path, is_dir: bool) -> bool {
        self.decide(path, is_dir).is_ignore()
    }

    /// The rule deciding `path`, if any rule matches.
    pub fn explain(&self, path: &Path, is_dir: bool) -> Option<RuleMatch> {
        match self.decide(path, is_dir) {
            Match::None => None,
            Match::Ignore(glob) | Match::Whitelist(glob) => Some(RuleMatch {
                ignored: !glob.is_whitelist(),
                pattern: glob.original().to_string(),
                source: glob.from().map(Path::to_path_buf),
            }),
        }
    }

    fn decide(&self, path: &Path, is_dir: bool) -> Match<&ignore::gitignore::Glob> {
        let relative = if path.has_root() {
            match path.strip_prefix(&self.root) {
                Ok(relative) => relative,
                Err(_) => return Match::None,
            }
        } else {
            path
        };
        let relative: PathBuf = relative
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect();
        let Some(parent) = relative.parent() else {
            return Match::None;
        };

        // An excluded ancestor hides everything below it, whatever later
        // rules say about the path itself.
        let mut ancestor = PathBuf::new();
        for component in parent.components() {
            ancestor.push(component);
            let decided = self.matcher.matched(&ancestor, true);
            if decided.is_ignore() {
                return decided;
            }
        }
        self.matcher.matched(&relative, is_dir)
    }

    /// Rules in evaluation order, built-in rule first.
    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    /// True when no ignore-file contributed rules.
    pub fn is_builtin_only(&self) -> bool {
        self.rules.len() == 1
    }
}

fn vcs_only(root: &Path) -> Gitignore {
    let mut builder = GitignoreBuilder::new(root);
    if builder.add_line(None, VCS_RULE).is_err() {
        return Gitignore::empty();
    }
    builder.build().unwrap_or_else(|_| Gitignore::empty())
}

/// Find every ignore-file under `root`, ordered so that a directory's file
/// precedes those of its subdirectories. `.git` directories are not entered.
fn discover_ignore_files(root: &Path, name: &str, follow_links: bool) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .follow_links(follow_links)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            !(is_dir && entry.file_name() == VCS_DIR)
        });

    let mut found = Vec::new();
    for result in builder.build() {
        match result {
            Ok(entry) => {
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                if entry.depth() > 0 && !is_dir && entry.file_name() == name {
                    found.push(entry.into_path());
                }
            }
            Err(err) => warn!("while looking for ignore files: {}", err),
        }
    }

    // Path ordering is per component, so a parent sorts before its children.
    found.sort_by(|a, b| a.parent().cmp(&b.parent()));
    found
}

fn read_rules(root: &Path, file: &Path) -> io::Result<Vec<IgnoreRule>> {
    let bytes = fs::read(file)?;
    let text = String::from_utf8_lossy(&bytes);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&*text);

    let scope = file
        .parent()
        .and_then(|dir| dir.strip_prefix(root).ok())
        .map(glob_scope)
        .unwrap_or_default();

    Ok(text
        .lines()
        .enumerate()
        .filter_map(|(i, line)| IgnoreRule::parse(line, &scope, Some(file.to_path_buf()), i + 1))
        .collect())
}

/// Slash-joined directory path with glob metacharacters escaped.
fn glob_scope(dir: &Path) -> String {
    dir.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(escape_glob(&part.to_string_lossy())),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn escape_glob(part: &str) -> String {
    let mut escaped = String::with_capacity(part.len());
    for c in part.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '{' | '}' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
