//! Mergetree CLI - flatten a directory tree into one Markdown document.

use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::LevelFilter;
use mergetree::builder::{MergeTree, Summary, DEFAULT_OUTPUT};
use mergetree::errors::{exit_code, MergeError};
use mergetree::language::{Language, UnknownMode};
use mergetree::policy::{PatternPolicy, DEFAULT_IGNORE_FILE};
use mergetree::tokens::Encoding;
use mergetree::walker::check_root;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "mergetree")]
#[command(about = "Flatten a directory tree into a single Markdown document")]
#[command(version)]
struct Cli {
    /// Increase diagnostic output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence diagnostics on stderr
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct WalkArgs {
    /// Include hidden files and directories (.git stays excluded)
    #[arg(long)]
    include_hidden: bool,

    /// Follow symbolic links
    #[arg(long)]
    follow_links: bool,

    /// Maximum directory depth
    #[arg(long)]
    max_depth: Option<usize>,

    /// Name of the per-directory ignore file
    #[arg(long, default_value = DEFAULT_IGNORE_FILE)]
    ignore_file: String,
}

impl WalkArgs {
    fn apply(self, mut builder: MergeTree) -> MergeTree {
        builder = builder
            .include_hidden(self.include_hidden)
            .follow_links(self.follow_links)
            .ignore_file_name(self.ignore_file);
        if let Some(depth) = self.max_depth {
            builder = builder.max_depth(depth);
        }
        builder
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write the tree and file contents to one document
    Merge {
        /// Root directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output document path
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// What to do with files of unrecognized type
        #[arg(long, value_enum, default_value = "list")]
        unknown: UnknownArg,

        #[command(flatten)]
        walk: WalkArgs,

        /// Run both passes on the current thread
        #[arg(long)]
        sequential: bool,

        /// Token encoding for the summary
        #[arg(long, default_value = "cl100k")]
        encoding: EncodingArg,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the filtered directory tree
    Tree {
        /// Root directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        #[command(flatten)]
        walk: WalkArgs,
    },

    /// Show which ignore rule decides each path
    CheckIgnore {
        /// Paths relative to the root
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Root directory the rules are collected from
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Name of the per-directory ignore file
        #[arg(long, default_value = DEFAULT_IGNORE_FILE)]
        ignore_file: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show recognized file types
    Languages {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Clone, ValueEnum)]
enum UnknownArg {
    /// List the path under "Unrecognized Files" without content
    List,
    /// Embed the content labelled as plaintext
    Plaintext,
}

impl From<UnknownArg> for UnknownMode {
    fn from(arg: UnknownArg) -> Self {
        match arg {
            UnknownArg::List => UnknownMode::List,
            UnknownArg::Plaintext => UnknownMode::PlainText,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum EncodingArg {
    Cl100k,
    O200k,
}

impl From<EncodingArg> for Encoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Cl100k => Encoding::Cl100kBase,
            EncodingArg::O200k => Encoding::O200kBase,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.quiet, cli.verbose);
    let json_output = json_flag(&cli.command);

    let result = match cli.command {
        Commands::Merge {
            path,
            output,
            unknown,
            walk,
            sequential,
            encoding,
            json,
        } => {
            let builder = MergeTree::new(path)
                .output(output)
                .unknown_mode(unknown.into())
                .parallel(!sequential)
                .encoding(encoding.into());
            run_merge(walk.apply(builder), json)
        }
        Commands::Tree { path, walk } => run_tree(walk.apply(MergeTree::new(path))),
        Commands::CheckIgnore {
            paths,
            root,
            ignore_file,
            json,
        } => run_check_ignore(&root, &ignore_file, &paths, json),
        Commands::Languages { json } => run_languages(json),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "mergetree", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        if json_output {
            #[derive(Serialize)]
            struct ErrorOutput {
                error: String,
            }

            let payload = ErrorOutput {
                error: e.to_string(),
            };

            let json = serde_json::to_string(&payload)
                .unwrap_or_else(|_| "{\"error\":\"serialization failed\"}".to_string());
            eprintln!("{json}");
        } else {
            eprintln!("error: {}", e);
        }
        std::process::exit(exit_code(&e));
    }
}

fn setup_logging(quiet: bool, verbose: u8) {
    let level = if quiet {
        LevelFilter::Off
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).format_timestamp(None);
    if !quiet {
        builder.parse_default_env();
    }
    builder.init();
}

fn json_flag(cmd: &Commands) -> bool {
    match cmd {
        Commands::Merge { json, .. } => *json,
        Commands::CheckIgnore { json, .. } => *json,
        Commands::Languages { json } => *json,
        Commands::Tree { .. } | Commands::Completions { .. } => false,
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, MergeError> {
    serde_json::to_string_pretty(value).map_err(|e| MergeError::Io(std::io::Error::other(e)))
}

// --- Merge command ---

fn run_merge(builder: MergeTree, json: bool) -> Result<(), MergeError> {
    let summary = builder.run()?;

    if json {
        println!("{}", to_json(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(())
}

fn print_summary(summary: &Summary) {
    println!("All files have been merged into {}", summary.output);
    println!(
        "{} files, {} bytes, ~{} tokens ({})",
        summary.files, summary.bytes, summary.tokens, summary.encoding
    );
    if !summary.skipped.is_empty() {
        println!("{} unreadable files were skipped.", summary.skipped.len());
    }
    if !summary.unrecognized.is_empty() {
        println!(
            "Note: {} files have unrecognized types; they are listed under \"Unrecognized Files\" at the end of the document.",
            summary.unrecognized.len()
        );
    }
}

// --- Tree command ---

fn run_tree(builder: MergeTree) -> Result<(), MergeError> {
    println!("{}", builder.tree()?);
    Ok(())
}

// --- Check-ignore command ---

#[derive(Serialize)]
struct CheckResult {
    path: String,
    ignored: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

fn run_check_ignore(
    root: &Path,
    ignore_file: &str,
    paths: &[PathBuf],
    json: bool,
) -> Result<(), MergeError> {
    check_root(root)?;
    let policy = PatternPolicy::build_with(root, ignore_file, false);

    let results: Vec<CheckResult> = paths
        .iter()
        .map(|path| {
            let is_dir = root.join(path).is_dir();
            let decided = policy.explain(path, is_dir);
            CheckResult {
                path: path.display().to_string(),
                ignored: decided.as_ref().is_some_and(|m| m.ignored),
                pattern: decided.as_ref().map(|m| m.pattern.clone()),
                source: decided.and_then(|m| m.source).map(|s| s.display().to_string()),
            }
        })
        .collect();

    if json {
        println!("{}", to_json(&results)?);
        return Ok(());
    }

    for result in &results {
        let origin = result.source.as_deref().unwrap_or("built-in");
        match (&result.pattern, result.ignored) {
            (Some(pattern), true) => {
                println!("{}: ignored by {} ({})", result.path, pattern, origin)
            }
            (Some(pattern), false) => {
                println!("{}: included by {} ({})", result.path, pattern, origin)
            }
            (None, _) => println!("{}: not ignored", result.path),
        }
    }

    Ok(())
}

// --- Languages command ---

#[derive(Serialize)]
struct LanguageInfo {
    name: String,
    label: String,
    extensions: Vec<String>,
    file_names: Vec<String>,
}

fn run_languages(json: bool) -> Result<(), MergeError> {
    let languages: Vec<LanguageInfo> = Language::all()
        .iter()
        .map(|lang| LanguageInfo {
            name: lang.to_string(),
            label: lang.label().to_string(),
            extensions: lang.extensions().iter().map(|e| format!(".{}", e)).collect(),
            file_names: lang.file_names().iter().map(|n| n.to_string()).collect(),
        })
        .collect();

    if json {
        #[derive(Serialize)]
        struct Output {
            languages: Vec<LanguageInfo>,
        }
        println!("{}", to_json(&Output { languages })?);
    } else {
        println!("Recognized file types:");
        for lang in &languages {
            let mut matches = lang.extensions.clone();
            matches.extend(lang.file_names.iter().cloned());
            println!("  {:12} {:12} {}", lang.name, lang.label, matches.join(", "));
        }
    }

    Ok(())
}
