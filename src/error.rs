//! Failure types shared by every stage of the pipeline.
//!
//! The scanner, parser, resolver and evaluator all report problems as a
//! [`LoxError`], so the driver deals with a single type and `?` carries
//! failures across stage boundaries (and out through `anyhow` in the
//! binary).  Nothing in this module writes to the terminal; rendering is
//! the caller's call.
//!
//! Resolver and runtime variants additionally carry an [`ErrorKind`] code
//! so tests can assert on the failure class without parsing messages.

use std::io;
use thiserror::Error;

use log::info;

/// Classifies static and runtime failures.
///
/// Lexical and syntactic errors carry the `NO_ERROR` sentinel: they are
/// reported through their own variants and have no runtime classification.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NO_ERROR,
    UNEXPECTED_TYPE,
    UNEXPECTED_OPERATOR,
    UNDEFINED_VARIABLE,
    CANNOT_CALL,
    INVALID_ARGUMENTS,
    DIVIDE_BY_ZERO,
    UNEXPECTED_RETURN,
    VAR_ALREADY_DEFINED,
    NOT_AN_OBJECT,
    UNDEFINED_OBJECT_PROPERTY,
    INVALID_CLASS,
}

/// The one error type every stage of the interpreter produces.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// The scanner hit a byte sequence it cannot tokenize.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// What went wrong, in user-facing words.
        message: String,

        /// 1‑based source line of the offending character.
        line: usize,
    },

    /// The parser rejected the token stream.  `location` is either empty,
    /// ` at end`, or ` at '<lexeme>'`.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        location: String,
        line: usize,
    },

    /// The resolver found a static rule violation (bad `return`, duplicate
    /// local, misplaced `this`/`super`, ...).
    #[error("[line {line}] Error{lexeme}: {message}")]
    Resolve {
        kind: ErrorKind,
        message: String,
        lexeme: String,
        line: usize,
    },

    /// Evaluation failed at runtime.
    #[error("[line {line}] Error{lexeme}: {message}")]
    Runtime {
        kind: ErrorKind,
        message: String,
        lexeme: String,
        line: usize,
    },

    /// Host I/O failure, forwarded as-is so `?` works on file and stream
    /// operations.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Source text that failed UTF‑8 decoding on ingest.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl LoxError {
    /// Builds a scanner error.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("lex error at line {}: {}", line, message);

        LoxError::Lex { message, line }
    }

    /// Builds a parser error.
    pub fn parse<S: Into<String>, L: Into<String>>(line: usize, location: L, msg: S) -> Self {
        let message: String = msg.into();

        info!("parse error at line {}: {}", line, message);

        LoxError::Parse {
            message,
            location: location.into(),
            line,
        }
    }

    /// Builds a resolver error.
    pub fn resolve<S: Into<String>, L: Into<String>>(
        kind: ErrorKind,
        line: usize,
        lexeme: L,
        msg: S,
    ) -> Self {
        let message: String = msg.into();

        info!("resolve error {:?} at line {}: {}", kind, line, message);

        LoxError::Resolve {
            kind,
            message,
            lexeme: lexeme.into(),
            line,
        }
    }

    /// Builds an evaluator error.
    pub fn runtime<S: Into<String>, L: Into<String>>(
        kind: ErrorKind,
        line: usize,
        lexeme: L,
        msg: S,
    ) -> Self {
        let message: String = msg.into();

        info!("runtime error {:?} at line {}: {}", kind, line, message);

        LoxError::Runtime {
            kind,
            message,
            lexeme: lexeme.into(),
            line,
        }
    }

    /// The classification code, or `NO_ERROR` for lexical/syntactic/host
    /// failures.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoxError::Resolve { kind, .. } | LoxError::Runtime { kind, .. } => *kind,

            _ => ErrorKind::NO_ERROR,
        }
    }
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, LoxError>;
