//! File classification for fenced content blocks.
//!
//! Maps a file name to a [`Language`] whose [`label`](Language::label) tags
//! the code fence. Exact file names (`Dockerfile`, `Makefile`) are checked
//! before extensions; extension lookup is case-insensitive.

use std::fmt;
use std::path::Path;

/// Known content kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    Rust,
    JavaScript,
    TypeScript,
    Go,
    C,
    Cpp,
    CSharp,
    Java,
    Kotlin,
    Swift,
    Ruby,
    Php,
    Lua,
    Shell,
    PowerShell,
    Sql,
    Html,
    Css,
    Markdown,
    Json,
    Yaml,
    Toml,
    Xml,
    Ini,
    Dockerfile,
    Makefile,
    CMake,
    PlainText,
}

impl Language {
    /// Every language, in table order.
    pub fn all() -> &'static [Language] {
        &[
            Language::Python,
            Language::Rust,
            Language::JavaScript,
            Language::TypeScript,
            Language::Go,
            Language::C,
            Language::Cpp,
            Language::CSharp,
            Language::Java,
            Language::Kotlin,
            Language::Swift,
            Language::Ruby,
            Language::Php,
            Language::Lua,
            Language::Shell,
            Language::PowerShell,
            Language::Sql,
            Language::Html,
            Language::Css,
            Language::Markdown,
            Language::Json,
            Language::Yaml,
            Language::Toml,
            Language::Xml,
            Language::Ini,
            Language::Dockerfile,
            Language::Makefile,
            Language::CMake,
            Language::PlainText,
        ]
    }

    /// Info string used on the opening code fence.
    pub fn label(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Rust => "rust",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Go => "go",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Java => "java",
            Language::Kotlin => "kotlin",
            Language::Swift => "swift",
            Language::Ruby => "ruby",
            Language::Php => "php",
            Language::Lua => "lua",
            Language::Shell => "bash",
            Language::PowerShell => "powershell",
            Language::Sql => "sql",
            Language::Html => "html",
            Language::Css => "css",
            Language::Markdown => "markdown",
            Language::Json => "json",
            Language::Yaml => "yaml",
            Language::Toml => "toml",
            Language::Xml => "xml",
            Language::Ini => "ini",
            Language::Dockerfile => "dockerfile",
            Language::Makefile => "makefile",
            Language::CMake => "cmake",
            Language::PlainText => "plaintext",
        }
    }

    /// Lowercase extensions, without the dot.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py", "pyi", "pyw"],
            Language::Rust => &["rs"],
            Language::JavaScript => &["js", "mjs", "cjs", "jsx"],
            Language::TypeScript => &["ts", "mts", "cts", "tsx"],
            Language::Go => &["go"],
            Language::C => &["c"],
            Language::Cpp => &["cpp", "cc", "cxx", "h", "hpp", "hh", "hxx"],
            Language::CSharp => &["cs"],
            Language::Java => &["java"],
            Language::Kotlin => &["kt", "kts"],
            Language::Swift => &["swift"],
            Language::Ruby => &["rb"],
            Language::Php => &["php"],
            Language::Lua => &["lua"],
            Language::Shell => &["sh", "bash", "zsh"],
            Language::PowerShell => &["ps1", "psm1"],
            Language::Sql => &["sql"],
            Language::Html => &["html", "htm"],
            Language::Css => &["css"],
            Language::Markdown => &["md", "markdown"],
            Language::Json => &["json"],
            Language::Yaml => &["yml", "yaml"],
            Language::Toml => &["toml"],
            Language::Xml => &["xml"],
            Language::Ini => &["ini", "cfg"],
            Language::Dockerfile => &["dockerfile"],
            Language::Makefile => &["mk"],
            Language::CMake => &["cmake"],
            Language::PlainText => &["txt"],
        }
    }

    /// Exact file names recognized regardless of extension.
    pub fn file_names(&self) -> &'static [&'static str] {
        match self {
            Language::Ruby => &["Gemfile", "Rakefile"],
            Language::Toml => &["Cargo.lock"],
            Language::Dockerfile => &["Dockerfile", "Containerfile"],
            Language::Makefile => &["Makefile", "GNUmakefile"],
            Language::CMake => &["CMakeLists.txt"],
            _ => &[],
        }
    }

    fn from_file_name(name: &str) -> Option<Language> {
        Language::all()
            .iter()
            .copied()
            .find(|lang| lang.file_names().contains(&name))
    }

    fn from_extension(ext: &str) -> Option<Language> {
        let ext = ext.to_ascii_lowercase();
        Language::all()
            .iter()
            .copied()
            .find(|lang| lang.extensions().contains(&ext.as_str()))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::Python => "Python",
            Language::Rust => "Rust",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::Go => "Go",
            Language::C => "C",
            Language::Cpp => "C++",
            Language::CSharp => "C#",
            Language::Java => "Java",
            Language::Kotlin => "Kotlin",
            Language::Swift => "Swift",
            Language::Ruby => "Ruby",
            Language::Php => "PHP",
            Language::Lua => "Lua",
            Language::Shell => "Shell",
            Language::PowerShell => "PowerShell",
            Language::Sql => "SQL",
            Language::Html => "HTML",
            Language::Css => "CSS",
            Language::Markdown => "Markdown",
            Language::Json => "JSON",
            Language::Yaml => "YAML",
            Language::Toml => "TOML",
            Language::Xml => "XML",
            Language::Ini => "INI",
            Language::Dockerfile => "Dockerfile",
            Language::Makefile => "Makefile",
            Language::CMake => "CMake",
            Language::PlainText => "Plain text",
        };
        f.write_str(name)
    }
}

/// Detect the language of a file from its name alone.
///
/// # Examples
///
/// ```
/// use mergetree::language::{detect_language, Language};
/// use std::path::Path;
///
/// assert_eq!(detect_language(Path::new("src/app.PY")), Some(Language::Python));
/// assert_eq!(detect_language(Path::new("Dockerfile")), Some(Language::Dockerfile));
/// assert_eq!(detect_language(Path::new("dump.bin")), None);
/// ```
pub fn detect_language(path: &Path) -> Option<Language> {
    let name = path.file_name()?.to_str()?;
    Language::from_file_name(name)
        .or_else(|| path.extension()?.to_str().and_then(Language::from_extension))
}

/// What to do with files whose name is not in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownMode {
    /// Omit the content and list the path under "Unrecognized Files".
    #[default]
    List,
    /// Embed the content with the `plaintext` label.
    PlainText,
}

/// Classifier applying an [`UnknownMode`] on top of [`detect_language`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    mode: UnknownMode,
}

impl Classifier {
    pub fn new(mode: UnknownMode) -> Self {
        Self { mode }
    }

    /// Classify a file. `None` means the file is unrecognized and its
    /// content should not be read.
    pub fn classify(&self, path: &Path) -> Option<Language> {
        detect_language(path).or(match self.mode {
            UnknownMode::List => None,
            UnknownMode::PlainText => Some(Language::PlainText),
        })
    }
}
