//! Error types for IR lowering.

use thiserror::Error;

/// Error produced while lowering a typed translation unit to IR.
#[derive(Debug, Error)]
pub enum CodeGenError {
    /// The IR builder rejected an operation.
    #[error("LLVM operation failed: {0}")]
    Llvm(String),

    /// An internal invariant of the lowering pass was broken. Indicates a
    /// compiler bug, not a user error.
    #[error("internal error: {0}")]
    Internal(String),

    /// The module verifier rejected the finished module.
    #[error("module verification failed: {0}")]
    Verify(String),
}

/// Result type alias for lowering operations.
pub type Result<T> = std::result::Result<T, CodeGenError>;
