//! Compile-time error taxonomy for the regex-chess compiler.
//!
//! Every failure described in spec §7 is fatal: there is no partial rule
//! list, only a complete one or an error. Each variant carries enough
//! context (opcode name, node shape, tag) to point at the offending part of
//! the call tree or opcode stream.

use thiserror::Error;

/// A fatal compile-time error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The linearizer or assembler encountered an opcode name it does not
    /// recognize.
    #[error("unknown opcode `{0}`")]
    UnknownOpcode(String),

    /// An expression operator was applied to an operand of the wrong kind
    /// (e.g. string concatenation on an `Int`-kinded operand).
    #[error("kind mismatch lowering `{op}`: expected {expected}, found {found}")]
    KindMismatch {
        op: String,
        expected: String,
        found: String,
    },

    /// The tracer exhausted its iteration budget without the call tree
    /// reaching a state where every branch has two non-`None` children.
    #[error("tracing did not converge after {iterations} iterations (K={max})")]
    TraceDidNotConverge { iterations: usize, max: usize },

    /// A branch node still has an unexplored (`None`) child at linearization
    /// or assembly time.
    #[error("branch node at `{context}` has an incomplete child")]
    IncompleteBranch { context: String },

    /// A literal of a kind the expression lowerer does not support appeared
    /// in the call tree (only `Int`, `Str`, `Bool` are supported).
    #[error("unsupported literal kind `{0}`")]
    UnsupportedLiteral(String),

    /// An opcode's rule-building routine produced a pattern that the
    /// backing `regex` engine rejects.
    #[error("bad regex for opcode `{opcode}`: {source}")]
    BadRegex { opcode: String, source: String },
}

/// Result type used throughout the compiler pipeline.
pub type CompileResult<T> = Result<T, CompileError>;
