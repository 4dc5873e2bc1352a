//! Markdown document assembly.
//!
//! Layout:
//!
//! ````text
//! # Folder Structure
//!
//! ```
//! <tree>
//! ```
//!
//! ## File: `<path>`
//! *(Relative Path: `<path>`)*
//!
//! ```<label>
//! <content>
//! ```
//!
//! ---
//!
//! # Unrecognized Files
//!
//! - `<path>`
//! ````

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::collect::FileRecord;
use crate::walker::to_slash;

/// Errors that can occur while writing the document.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Assemble the document. Records and unrecognized paths keep their order.
pub fn assemble(tree_text: &str, records: &[FileRecord], unrecognized: &[PathBuf]) -> String {
    let capacity = tree_text.len() + records.iter().map(|r| r.content.len() + 128).sum::<usize>();
    let mut output = String::with_capacity(capacity);

    let fence = fence_for(tree_text);
    output.push_str("# Folder Structure\n\n");
    output.push_str(&fence);
    output.push('\n');
    output.push_str(tree_text);
    output.push('\n');
    output.push_str(&fence);
    output.push_str("\n\n");

    for record in records {
        push_file_section(&mut output, record);
    }

    if !unrecognized.is_empty() {
        if !output.ends_with("\n\n") {
            output.push('\n');
        }
        output.push_str("# Unrecognized Files\n\n");
        for path in unrecognized {
            output.push_str("- `");
            output.push_str(&to_slash(path));
            output.push_str("`\n");
        }
    }

    output
}

fn push_file_section(output: &mut String, record: &FileRecord) {
    let path = to_slash(&record.path);
    let fence = fence_for(&record.content);

    output.push_str(&format!("## File: `{path}`\n*(Relative Path: `{path}`)*\n\n"));
    output.push_str(&fence);
    output.push_str(record.label());
    output.push('\n');
    output.push_str(&record.content);
    if !record.content.ends_with('\n') {
        output.push('\n');
    }
    output.push_str(&fence);
    output.push_str("\n\n---\n");
}

/// Shortest backtick fence (at least three) longer than any backtick run in
/// `content`.
pub fn fence_for(content: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in content.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

/// Write the document to `path`.
pub fn write_document(path: &Path, document: &str) -> Result<(), OutputError> {
    fs::write(path, document).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;

    fn record(path: &str, language: Language, content: &str) -> FileRecord {
        FileRecord {
            path: PathBuf::from(path),
            language,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_assemble_layout() {
        let records = vec![
            record("README.md", Language::Markdown, "# Hi"),
            record("src/a.py", Language::Python, "print(1)\n"),
        ];

        let doc = assemble("proj\n├── README.md\n└── src", &records, &[]);

        let expected = "\
# Folder Structure

```
proj
├── README.md
└── src
```

## File: `README.md`
*(Relative Path: `README.md`)*

```markdown
# Hi
```

---
## File: `src/a.py`
*(Relative Path: `src/a.py`)*

```python
print(1)
```

---
";
        assert_eq!(doc, expected);
        assert!(!doc.contains("Unrecognized"));
    }

    #[test]
    fn test_unrecognized_section() {
        let records = vec![record("a.rs", Language::Rust, "fn a() {}")];
        let unrecognized = vec![PathBuf::from("data.bin"), PathBuf::from("img/logo.png")];

        let doc = assemble("proj", &records, &unrecognized);

        assert!(doc.ends_with("---\n\n# Unrecognized Files\n\n- `data.bin`\n- `img/logo.png`\n"));
        assert_eq!(doc.matches("`data.bin`").count(), 1);
    }

    #[test]
    fn test_unrecognized_without_records() {
        let doc = assemble("proj", &[], &[PathBuf::from("x.bin")]);
        assert_eq!(doc, "# Folder Structure\n\n```\nproj\n```\n\n# Unrecognized Files\n\n- `x.bin`\n");
    }

    #[test]
    fn test_record_order_preserved() {
        let records = vec![
            record("z.rs", Language::Rust, "z"),
            record("a.rs", Language::Rust, "a"),
        ];
        let doc = assemble("proj", &records, &[]);

        let z = doc.find("## File: `z.rs`").unwrap();
        let a = doc.find("## File: `a.rs`").unwrap();
        assert!(z < a);
    }

    #[test]
    fn test_fence_for() {
        assert_eq!(fence_for("plain"), "```");
        assert_eq!(fence_for("inline `code` here"), "```");
        assert_eq!(fence_for("```rust\nfn x() {}\n```"), "````");
        assert_eq!(fence_for("`````"), "``````");
    }

    #[test]
    fn test_nested_fence_in_content() {
        let records = vec![record("doc.md", Language::Markdown, "```sh\nls\n```\n")];
        let doc = assemble("proj", &records, &[]);

        assert!(doc.contains("````markdown\n```sh\nls\n```\n````\n"));
    }

    #[test]
    fn test_write_document_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("missing/out.md");

        let err = write_document(&target, "x").unwrap_err();
        assert!(matches!(err, OutputError::Write { .. }));
    }
}
