//! Fluent builder API for mergetree.
//!
//! Builds the ignore policy once, then runs the tree pass and the
//! collection pass against it (concurrently by default) and assembles the
//! document.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};
use serde::Serialize;

use crate::collect::{collect, CollectOptions, Collection, FileRecord, SkippedFile};
use crate::errors::MergeError;
use crate::language::{Classifier, UnknownMode};
use crate::output::{assemble, write_document};
use crate::policy::{PatternPolicy, DEFAULT_IGNORE_FILE};
use crate::tokens::{count_tokens_with_encoding, Encoding};
use crate::tree::render;
use crate::walker::{check_root, to_slash, WalkOptions};

/// Default output document path.
pub const DEFAULT_OUTPUT: &str = "merged_output.md";

/// Builder for flattening a directory into one document.
///
/// # Examples
///
/// ```no_run
/// use mergetree::builder::MergeTree;
/// use mergetree::language::UnknownMode;
///
/// let summary = MergeTree::new("./project")
///     .output("context.md")
///     .unknown_mode(UnknownMode::PlainText)
///     .run()
///     .unwrap();
/// println!("{} files merged into {}", summary.files, summary.output);
/// ```
#[derive(Debug, Clone)]
pub struct MergeTree {
    root: PathBuf,
    output: PathBuf,
    unknown_mode: UnknownMode,
    ignore_file_name: String,
    walk_options: WalkOptions,
    parallel: bool,
    encoding: Encoding,
}

impl MergeTree {
    /// Create a new builder for the given root path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            unknown_mode: UnknownMode::default(),
            ignore_file_name: DEFAULT_IGNORE_FILE.to_string(),
            walk_options: WalkOptions::default(),
            parallel: true,
            encoding: Encoding::default(),
        }
    }

    /// Where [`run`](Self::run) writes the document. Any file with the same
    /// base name is left out of both passes.
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = path.into();
        self
    }

    /// How to treat files with unrecognized names.
    pub fn unknown_mode(mut self, mode: UnknownMode) -> Self {
        self.unknown_mode = mode;
        self
    }

    /// Name of the per-directory ignore-file (default `.gitignore`).
    pub fn ignore_file_name(mut self, name: impl Into<String>) -> Self {
        self.ignore_file_name = name.into();
        self
    }

    /// Include dotfiles and dot-directories.
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.walk_options.include_hidden = include;
        self
    }

    /// Follow symbolic links.
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.walk_options.follow_symlinks = follow;
        self
    }

    /// Set maximum directory depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.walk_options = self.walk_options.max_depth(depth);
        self
    }

    /// Run passes concurrently (default: true).
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Tokenizer for the summary's token count.
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Validate the root and build its ignore policy.
    pub fn policy(&self) -> Result<PatternPolicy, MergeError> {
        check_root(&self.root)?;
        Ok(PatternPolicy::build_with(
            &self.root,
            &self.ignore_file_name,
            self.walk_options.follow_symlinks,
        ))
    }

    fn pass_options(&self) -> WalkOptions {
        let options = self.walk_options.clone();
        match self.output.file_name() {
            Some(name) => options.skip_file(name),
            None => options,
        }
    }

    /// Run both passes without writing anything.
    pub fn build(self) -> Result<MergeResult, MergeError> {
        let policy = Arc::new(self.policy()?);
        if policy.is_builtin_only() {
            debug!("no {} files under {}", self.ignore_file_name, self.root.display());
        } else {
            debug!("policy has {} rules", policy.rules().len());
        }

        let walk_options = self.pass_options();
        let collect_options = CollectOptions {
            walk: walk_options.clone(),
            classifier: Classifier::new(self.unknown_mode),
            parallel: self.parallel,
        };

        let root = self.root.as_path();
        let (tree, collection) = if self.parallel {
            rayon::join(
                || render(root, &policy, &walk_options),
                || collect(root, &policy, &collect_options),
            )
        } else {
            (
                render(root, &policy, &walk_options),
                collect(root, &policy, &collect_options),
            )
        };

        info!(
            "collected {} files ({} unrecognized, {} skipped)",
            collection.records.len(),
            collection.unrecognized.len(),
            collection.skipped.len()
        );

        Ok(MergeResult {
            tree,
            collection,
            rule_count: policy.rules().len(),
            output: self.output,
            encoding: self.encoding,
        })
    }

    /// Render the tree only.
    pub fn tree(self) -> Result<String, MergeError> {
        let policy = Arc::new(self.policy()?);
        Ok(render(&self.root, &policy, &self.pass_options()))
    }

    /// Run both passes and write the document.
    pub fn run(self) -> Result<Summary, MergeError> {
        self.build()?.write()
    }
}

/// Result of both passes.
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// Rendered tree text.
    pub tree: String,
    pub collection: Collection,
    /// Number of rules in the policy, the built-in one included.
    pub rule_count: usize,
    output: PathBuf,
    encoding: Encoding,
}

impl MergeResult {
    pub fn records(&self) -> &[FileRecord] {
        &self.collection.records
    }

    pub fn unrecognized(&self) -> &[PathBuf] {
        &self.collection.unrecognized
    }

    pub fn skipped(&self) -> &[SkippedFile] {
        &self.collection.skipped
    }

    /// The full document text.
    pub fn document(&self) -> String {
        assemble(
            &self.tree,
            &self.collection.records,
            &self.collection.unrecognized,
        )
    }

    /// Write the document to the configured output path.
    pub fn write(&self) -> Result<Summary, MergeError> {
        self.write_to(&self.output)
    }

    /// Write the document to `path`.
    pub fn write_to(&self, path: &Path) -> Result<Summary, MergeError> {
        let document = self.document();
        write_document(path, &document)?;
        info!("wrote {} bytes to {}", document.len(), path.display());

        Ok(Summary {
            output: path.display().to_string(),
            files: self.collection.records.len(),
            unrecognized: self.collection.unrecognized.iter().map(|p| to_slash(p)).collect(),
            skipped: self.collection.skipped.iter().map(|s| to_slash(&s.path)).collect(),
            bytes: document.len(),
            tokens: count_tokens_with_encoding(&document, self.encoding),
            encoding: self.encoding.to_string(),
        })
    }
}

/// What a completed run wrote.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub output: String,
    pub files: usize,
    pub unrecognized: Vec<String>,
    pub skipped: Vec<String>,
    pub bytes: usize,
    pub tokens: usize,
    pub encoding: String,
}
