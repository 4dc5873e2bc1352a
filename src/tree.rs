//! File tree representation and rendering.
//!
//! Builds the visible directory structure with [`walk`] and renders it
//! with box-drawing characters.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};

use crate::policy::PatternPolicy;
use crate::walker::{walk, WalkOptions};

/// The type of a filesystem node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File,
}

/// A node in the file tree.
#[derive(Debug, Clone)]
pub struct FileNode {
    /// File or directory name (not full path).
    pub name: String,
    /// Path relative to the tree root.
    pub path: PathBuf,
    pub kind: NodeKind,
    children: Vec<FileNode>,
}

impl FileNode {
    /// Create a new directory node.
    pub fn directory(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::Directory,
            children: Vec::new(),
        }
    }

    /// Create a new file node.
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::File,
            children: Vec::new(),
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Add a child node. Children render in insertion order.
    pub fn add_child(&mut self, child: FileNode) {
        self.children.push(child);
    }

    /// Count total files in this tree.
    pub fn file_count(&self) -> usize {
        match self.kind {
            NodeKind::File => 1,
            NodeKind::Directory => self.children.iter().map(|c| c.file_count()).sum(),
        }
    }

    /// Count total directories in this tree, the root included.
    pub fn directory_count(&self) -> usize {
        match self.kind {
            NodeKind::File => 0,
            NodeKind::Directory => {
                1 + self.children.iter().map(|c| c.directory_count()).sum::<usize>()
            }
        }
    }
}

/// Display name of the root: its base name, or the path as given when it
/// has none (e.g. `/`).
pub fn root_name(root: &Path) -> String {
    std::path::absolute(root)
        .ok()
        .map(|absolute| normalize(&absolute))
        .as_deref()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}

/// Fold `.` and `..` lexically. Symlinks are not resolved.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Build the visible tree under `root`.
///
/// Unlistable directories are logged and rendered without children.
pub fn build_tree(root: &Path, policy: &Arc<PatternPolicy>, options: &WalkOptions) -> FileNode {
    // Entries arrive depth-first, so the stack always holds the path from
    // the root to the current entry's parent.
    let mut stack = vec![FileNode::directory(root_name(root), PathBuf::new())];

    for result in walk(root, policy, options) {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                warn!("tree: {}", e);
                continue;
            }
        };

        while stack.len() > entry.depth {
            fold_last(&mut stack);
        }

        let name = entry
            .relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let node = if entry.is_dir {
            FileNode::directory(name, entry.relative)
        } else {
            FileNode::file(name, entry.relative)
        };
        stack.push(node);
    }

    while stack.len() > 1 {
        fold_last(&mut stack);
    }
    stack
        .pop()
        .unwrap_or_else(|| FileNode::directory(root_name(root), PathBuf::new()))
}

fn fold_last(stack: &mut Vec<FileNode>) {
    if let Some(child) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            parent.add_child(child);
        }
    }
}

/// Box-drawing characters for tree rendering.
const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const VERTICAL: &str = "│   ";
const SPACE: &str = "    ";

/// Render a file tree, one line per node, without a trailing newline.
///
/// # Examples
///
/// ```
/// use mergetree::tree::{render_tree, FileNode};
///
/// let mut root = FileNode::directory("project", "");
/// let mut src = FileNode::directory("src", "src");
/// src.add_child(FileNode::file("main.rs", "src/main.rs"));
/// root.add_child(src);
/// root.add_child(FileNode::file("README.md", "README.md"));
///
/// assert_eq!(
///     render_tree(&root),
///     "project\n├── src\n│   └── main.rs\n└── README.md"
/// );
/// ```
pub fn render_tree(root: &FileNode) -> String {
    let mut output = root.name.clone();
    render_children(&mut output, root, "");
    output
}

fn render_children(output: &mut String, node: &FileNode, prefix: &str) {
    let child_count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        let is_last = i + 1 == child_count;

        output.push('\n');
        output.push_str(prefix);
        output.push_str(if is_last { LAST_BRANCH } else { BRANCH });
        output.push_str(&child.name);

        if child.is_directory() {
            let continuation = if is_last { SPACE } else { VERTICAL };
            render_children(output, child, &format!("{prefix}{continuation}"));
        }
    }
}

/// Walk `root` and render its visible tree.
pub fn render(root: &Path, policy: &Arc<PatternPolicy>, options: &WalkOptions) -> String {
    let tree = build_tree(root, policy, options);
    debug!(
        "tree: {} directories, {} files",
        tree.directory_count(),
        tree.file_count()
    );
    render_tree(&tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_file_count() {
        let mut root = FileNode::directory("root", "");
        root.add_child(FileNode::file("a.rs", "a.rs"));

        let mut sub = FileNode::directory("sub", "sub");
        sub.add_child(FileNode::file("b.rs", "sub/b.rs"));
        sub.add_child(FileNode::file("c.rs", "sub/c.rs"));
        root.add_child(sub);

        assert_eq!(root.file_count(), 3);
        assert_eq!(root.directory_count(), 2);
    }

    #[test]
    fn test_render_connectors_and_prefixes() {
        let mut root = FileNode::directory("project", "");

        let mut a = FileNode::directory("a", "a");
        let mut inner = FileNode::directory("inner", "a/inner");
        inner.add_child(FileNode::file("x.rs", "a/inner/x.rs"));
        a.add_child(inner);
        a.add_child(FileNode::file("y.rs", "a/y.rs"));
        root.add_child(a);

        let mut b = FileNode::directory("b", "b");
        b.add_child(FileNode::file("z.rs", "b/z.rs"));
        root.add_child(b);

        let expected = "\
project
├── a
│   ├── inner
│   │   └── x.rs
│   └── y.rs
└── b
    └── z.rs";
        assert_eq!(render_tree(&root), expected);
    }

    #[test]
    fn test_render_empty_root() {
        let root = FileNode::directory("empty", "");
        assert_eq!(render_tree(&root), "empty");
    }

    #[test]
    fn test_root_name() {
        assert_eq!(root_name(Path::new("/tmp/project")), "project");
        assert_eq!(root_name(Path::new("/")), "/");
        assert_eq!(root_name(Path::new("/tmp/project/.")), "project");
    }

    #[test]
    fn test_root_name_folds_parent_components() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("proj/inner")).unwrap();

        let root = dir.path().join("proj/inner/..");
        assert_eq!(root_name(&root), "proj");
        assert_eq!(root_name(&dir.path().join("proj/inner/../inner")), "inner");

        let policy = Arc::new(PatternPolicy::build(&root));
        let rendered = render(&root, &policy, &WalkOptions::default());
        assert_eq!(rendered, "proj\n└── inner");
    }

    #[test]
    fn test_build_tree_from_disk() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/.git")).unwrap();
        fs::write(dir.path().join("src/.git/HEAD"), "ref").unwrap();
        fs::write(dir.path().join("src/a.py"), "print(1)").unwrap();
        fs::write(dir.path().join("README.md"), "# Hi").unwrap();
        fs::write(dir.path().join(".gitignore"), ".git/\n").unwrap();

        let policy = Arc::new(PatternPolicy::build(dir.path()));
        let tree = build_tree(dir.path(), &policy, &WalkOptions::default());
        let rendered = render_tree(&tree);

        let name = root_name(dir.path());
        assert_eq!(rendered, format!("{name}\n├── README.md\n└── src\n    └── a.py"));
        assert_eq!(tree.file_count(), 2);
    }

    #[test]
    fn test_build_tree_prunes_ignored() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("build")).unwrap();
        fs::write(dir.path().join("build/out.o"), "").unwrap();
        fs::write(dir.path().join("dump.bin"), "").unwrap();
        fs::write(dir.path().join("main.c"), "").unwrap();
        fs::write(dir.path().join(".gitignore"), "build/\n*.bin\n").unwrap();

        let policy = Arc::new(PatternPolicy::build(dir.path()));
        let rendered = render(dir.path(), &policy, &WalkOptions::default());

        assert!(rendered.ends_with("└── main.c"));
        assert!(!rendered.contains("build"));
        assert!(!rendered.contains("dump.bin"));
        assert!(!rendered.contains(".gitignore"));
    }
}
