//! cinderc-gen - IR lowering over the external builder (LLVM via inkwell).
//!
//! The generator consumes a typed [`TranslationUnit`] and produces an LLVM
//! module: external symbols for prototypes and globals, entry-block storage
//! slots for parameters and locals, lowered expressions and statements, and
//! a final run of the module verifier. Any verifier complaint is surfaced as
//! a compile failure.
//!
//! [`TranslationUnit`]: cinderc_par::TranslationUnit

mod error;
mod llvm;
mod types;


pub use error::{CodeGenError, Result};
pub use llvm::{generate, Generator};
pub use types::TypeMapper;
