//! cinderc-drv - Pipeline driver.
//!
//! Runs one translation unit through the whole pipeline:
//!
//! ```text
//! source text
//!      |
//!  [lex]        token stream (with whitespace)
//!      |
//!  [preprocess] normalized token stream
//!      |
//!  [parse+sema] typed translation unit
//!      |
//!  [generate]   verified LLVM module
//!      |
//!      v
//!  textual IR dump
//! ```
//!
//! The core performs no I/O and never exits; every failure bubbles up as a
//! [`CompileError`] which the binary renders as
//! `error at <file>(<line>): <message>` (or `<file>: <message>` when no line
//! is known) and converts to exit status 1.

use cinderc_gen::CodeGenError;
use cinderc_par::ParseError;
use inkwell::context::Context;
use thiserror::Error;

/// Any failure of the compilation pipeline.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Lexical, syntactic or semantic failure.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Lowering or verifier failure.
    #[error(transparent)]
    Gen(#[from] CodeGenError),
}

impl CompileError {
    /// The source line of the failure, when one is known. Generator and
    /// verifier failures have no single line.
    pub fn line(&self) -> Option<u32> {
        match self {
            CompileError::Parse(e) => Some(e.line()),
            CompileError::Gen(_) => None,
        }
    }

    /// Renders the diagnostic for a given file name.
    pub fn diagnostic(&self, filename: &str) -> String {
        match self.line() {
            Some(line) => format!("error at {}({}): {}", filename, line, self),
            None => format!("{}: {}", filename, self),
        }
    }
}

/// Compiles one source string and returns the textual IR of the verified
/// module.
pub fn compile(filename: &str, source: &str) -> Result<String, CompileError> {
    let unit = cinderc_par::parse(filename, source)?;

    let context = Context::create();
    let module = cinderc_gen::generate(&unit, &context)?;

    Ok(module.print_to_string().to_string())
}
