//! Content collection pass.
//!
//! Walks the tree with the same policy as the renderer, classifies each
//! visible file and reads the recognized ones. Unrecognized files are listed
//! by path and never opened.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};
use rayon::prelude::*;

use crate::language::{Classifier, Language};
use crate::policy::PatternPolicy;
use crate::walker::{to_slash, walk, WalkEntry, WalkOptions};

/// A recognized file and its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Path relative to the root.
    pub path: PathBuf,
    pub language: Language,
    /// File content, invalid UTF-8 replaced with U+FFFD.
    pub content: String,
}

impl FileRecord {
    /// Code fence label.
    pub fn label(&self) -> &'static str {
        self.language.label()
    }
}

/// A recognized file that could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Everything the collection pass produced, in traversal order.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub records: Vec<FileRecord>,
    pub unrecognized: Vec<PathBuf>,
    pub skipped: Vec<SkippedFile>,
}

/// Options for the collection pass.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Traversal options; `skip_file_name` should name the output document.
    pub walk: WalkOptions,
    pub classifier: Classifier,
    /// Read file contents on the rayon pool.
    pub parallel: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            walk: WalkOptions::default(),
            classifier: Classifier::default(),
            parallel: true,
        }
    }
}

/// Collect records for every visible file under `root`.
///
/// Read failures are logged and reported in [`Collection::skipped`]; they
/// never abort the pass. Record order is traversal order whether or not
/// reads run in parallel.
pub fn collect(root: &Path, policy: &Arc<PatternPolicy>, options: &CollectOptions) -> Collection {
    let mut collection = Collection::default();
    let mut to_read: Vec<(WalkEntry, Language)> = Vec::new();

    for result in walk(root, policy, &options.walk) {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                warn!("collect: {}", e);
                continue;
            }
        };
        if entry.is_dir {
            continue;
        }

        match options.classifier.classify(&entry.path) {
            Some(language) => to_read.push((entry, language)),
            None => {
                debug!("unrecognized: {}", to_slash(&entry.relative));
                collection.unrecognized.push(entry.relative);
            }
        }
    }

    let results: Vec<Result<FileRecord, SkippedFile>> = if options.parallel {
        to_read
            .into_par_iter()
            .map(|(entry, language)| read_record(entry, language))
            .collect()
    } else {
        to_read
            .into_iter()
            .map(|(entry, language)| read_record(entry, language))
            .collect()
    };

    for result in results {
        match result {
            Ok(record) => collection.records.push(record),
            Err(skipped) => collection.skipped.push(skipped),
        }
    }

    collection
}

fn read_record(entry: WalkEntry, language: Language) -> Result<FileRecord, SkippedFile> {
    match fs::read(&entry.path) {
        Ok(bytes) => Ok(FileRecord {
            path: entry.relative,
            language,
            content: decode_lossy(bytes),
        }),
        Err(e) => {
            warn!("skipping {}: {}", to_slash(&entry.relative), e);
            Err(SkippedFile {
                path: entry.relative,
                reason: e.to_string(),
            })
        }
    }
}

fn decode_lossy(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::UnknownMode;
    use tempfile::TempDir;

    fn write(dir: &TempDir, relative: &str, contents: &[u8]) {
        let path = dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn collect_default(dir: &TempDir) -> Collection {
        let policy = Arc::new(PatternPolicy::build(dir.path()));
        collect(dir.path(), &policy, &CollectOptions::default())
    }

    fn record_paths(collection: &Collection) -> Vec<String> {
        collection.records.iter().map(|r| to_slash(&r.path)).collect()
    }

    #[test]
    fn test_collect_scenario() {
        let dir = TempDir::new().unwrap();
        write(&dir, "src/a.py", b"print(1)");
        write(&dir, "src/.git/HEAD", b"ref: refs/heads/main");
        write(&dir, "README.md", b"# Hi");
        write(&dir, ".gitignore", b".git/\n");

        let collection = collect_default(&dir);

        assert_eq!(record_paths(&collection), vec!["README.md", "src/a.py"]);
        assert_eq!(collection.records[0].label(), "markdown");
        assert_eq!(collection.records[0].content, "# Hi");
        assert_eq!(collection.records[1].label(), "python");
        assert_eq!(collection.records[1].content, "print(1)");
        assert!(collection.unrecognized.is_empty());
        assert!(collection.skipped.is_empty());
    }

    #[test]
    fn test_negation_restores_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, ".gitignore", b"*.txt\n!keep.txt\n");
        write(&dir, "keep.txt", b"kept");
        write(&dir, "other.txt", b"dropped");

        let collection = collect_default(&dir);
        assert_eq!(record_paths(&collection), vec!["keep.txt"]);
    }

    #[test]
    fn test_ignored_file_is_not_classified() {
        let dir = TempDir::new().unwrap();
        write(&dir, ".gitignore", b"*.bin\n");
        write(&dir, "dump.bin", &[0, 1, 2]);
        write(&dir, "main.go", b"package main");

        let collection = collect_default(&dir);
        assert_eq!(record_paths(&collection), vec!["main.go"]);
        assert!(collection.unrecognized.is_empty());
    }

    #[test]
    fn test_unrecognized_listed_once_without_content() {
        let dir = TempDir::new().unwrap();
        write(&dir, "data.bin", b"SECRET-BYTES");
        write(&dir, "main.rs", b"fn main() {}");

        let collection = collect_default(&dir);

        assert_eq!(collection.unrecognized, vec![PathBuf::from("data.bin")]);
        assert!(!collection.records.iter().any(|r| r.content.contains("SECRET-BYTES")));
    }

    #[test]
    fn test_plaintext_mode_embeds_unknown() {
        let dir = TempDir::new().unwrap();
        write(&dir, "LICENSE", b"MIT");

        let policy = Arc::new(PatternPolicy::build(dir.path()));
        let options = CollectOptions {
            classifier: Classifier::new(UnknownMode::PlainText),
            ..Default::default()
        };
        let collection = collect(dir.path(), &policy, &options);

        assert!(collection.unrecognized.is_empty());
        assert_eq!(collection.records.len(), 1);
        assert_eq!(collection.records[0].label(), "plaintext");
        assert_eq!(collection.records[0].content, "MIT");
    }

    #[test]
    fn test_skips_output_file_by_name() {
        let dir = TempDir::new().unwrap();
        write(&dir, "merged_output.md", b"# Folder Structure");
        write(&dir, "docs/merged_output.md", b"# Folder Structure");
        write(&dir, "notes.md", b"notes");

        let policy = Arc::new(PatternPolicy::build(dir.path()));
        let options = CollectOptions {
            walk: WalkOptions::default().skip_file("merged_output.md"),
            ..Default::default()
        };
        let collection = collect(dir.path(), &policy, &options);

        assert_eq!(record_paths(&collection), vec!["notes.md"]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let dir = TempDir::new().unwrap();
        write(&dir, "bad.txt", b"ok \xff\xfe end");

        let collection = collect_default(&dir);
        assert_eq!(collection.records[0].content, "ok \u{fffd}\u{fffd} end");
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let dir = TempDir::new().unwrap();
        for i in 0..20 {
            write(&dir, &format!("d{}/f{}.rs", i % 3, i), format!("// {i}").as_bytes());
        }

        let policy = Arc::new(PatternPolicy::build(dir.path()));
        let parallel = collect(dir.path(), &policy, &CollectOptions::default());
        let sequential = collect(
            dir.path(),
            &policy,
            &CollectOptions {
                parallel: false,
                ..Default::default()
            },
        );

        assert_eq!(parallel.records, sequential.records);
        let paths = record_paths(&parallel);
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.rs", b"fn a() {}");
        std::os::unix::fs::symlink(dir.path().join("missing.rs"), dir.path().join("ghost.rs"))
            .unwrap();

        let collection = collect_default(&dir);

        assert_eq!(record_paths(&collection), vec!["a.rs"]);
        assert_eq!(collection.skipped.len(), 1);
        assert_eq!(collection.skipped[0].path, PathBuf::from("ghost.rs"));
    }

    #[cfg(unix)]
    #[test]
    fn test_ignored_directory_is_never_read() {
        let dir = TempDir::new().unwrap();
        write(&dir, ".gitignore", b"vendor/\n");
        write(&dir, "main.rs", b"fn main() {}");
        fs::create_dir(dir.path().join("vendor")).unwrap();
        // Opening this would fail and show up in `skipped`.
        std::os::unix::fs::symlink(
            dir.path().join("missing.rs"),
            dir.path().join("vendor/poison.rs"),
        )
        .unwrap();

        let collection = collect_default(&dir);

        assert_eq!(record_paths(&collection), vec!["main.rs"]);
        assert!(collection.skipped.is_empty());
        assert!(collection.unrecognized.is_empty());
    }
}
