//! Approximate token counts for the assembled document.
//!
//! Uses tiktoken-rs when its tables load, else about four bytes per token.

use std::fmt;
use std::sync::OnceLock;

use tiktoken_rs::CoreBPE;

/// Tokenizer used for the estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// cl100k_base: GPT-4, GPT-3.5-turbo
    #[default]
    Cl100kBase,
    /// o200k_base: GPT-4o
    O200kBase,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Cl100kBase => f.write_str("cl100k_base"),
            Encoding::O200kBase => f.write_str("o200k_base"),
        }
    }
}

static CL100K: OnceLock<Option<CoreBPE>> = OnceLock::new();
static O200K: OnceLock<Option<CoreBPE>> = OnceLock::new();

fn tokenizer(encoding: Encoding) -> Option<&'static CoreBPE> {
    let cell = match encoding {
        Encoding::Cl100kBase => &CL100K,
        Encoding::O200kBase => &O200K,
    };
    cell.get_or_init(|| match encoding {
        Encoding::Cl100kBase => tiktoken_rs::cl100k_base().ok(),
        Encoding::O200kBase => tiktoken_rs::o200k_base().ok(),
    })
    .as_ref()
}

/// Count tokens with `encoding`. Never fails.
pub fn count_tokens_with_encoding(text: &str, encoding: Encoding) -> usize {
    if text.is_empty() {
        return 0;
    }
    match tokenizer(encoding) {
        Some(bpe) => bpe.encode_ordinary(text).len(),
        None => estimate(text),
    }
}

fn estimate(text: &str) -> usize {
    text.len().div_ceil(4)
}
