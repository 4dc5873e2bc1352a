//! Error types for mergetree.
//!
//! Only failures that stop the whole run surface here. Per-file problems
//! are logged and absorbed by the pass that hit them.

use crate::output::OutputError;
use crate::walker::WalkError;

/// Top-level error type for mergetree operations.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error("output error: {0}")]
    Output(#[from] OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Map an error to its exit code.
pub fn exit_code(error: &MergeError) -> i32 {
    match error {
        MergeError::Walk(WalkError::NotFound { .. }) => 3,
        MergeError::Walk(WalkError::NotADirectory { .. }) => 3,
        MergeError::Walk(_) => 2,
        MergeError::Output(_) => 1,
        MergeError::Io(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_exit_codes() {
        let missing = MergeError::from(WalkError::NotFound {
            path: PathBuf::from("nope"),
        });
        assert_eq!(exit_code(&missing), 3);
        assert_eq!(missing.to_string(), "path not found: nope");

        let io = MergeError::from(std::io::Error::other("boom"));
        assert_eq!(exit_code(&io), 1);
    }
}
