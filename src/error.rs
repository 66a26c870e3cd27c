//! Centralised error hierarchy for the Lox interpreter.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here. This enables
//! a uniform `Result<T>` alias throughout the crate and ergonomic
//! inter-operation with `anyhow`, while still preserving rich diagnostic
//! detail.
//!
//! The module does not print diagnostics itself; the driver drains the
//! [`ErrorReporter`] after each phase and decides what to do with them.

use std::io;

use log::info;
use thiserror::Error;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source position.
    #[error("[line {line} pos {col}] Error: {message}")]
    Lex {
        message: String,
        line: usize,
        col: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line} pos {col}] Error: {message}")]
    Parse {
        message: String,
        line: usize,
        col: usize,
    },

    /// Static-analysis failure from the resolution pass.
    #[error("[line {line} pos {col}] Error: {message}")]
    Resolve {
        message: String,
        line: usize,
        col: usize,
    },

    /// Runtime evaluation error.
    #[error("[line {line}] Error: {message}")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error`. Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF-8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl LoxError {
    /// Helper constructor for the scanner.
    pub fn lex<S: Into<String>>(line: usize, col: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, col={}, msg={}", line, col, message);

        LoxError::Lex { message, line, col }
    }

    /// Helper constructor for the parser.
    pub fn parse<S: Into<String>>(line: usize, col: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Parse error: line={}, col={}, msg={}",
            line, col, message
        );

        LoxError::Parse { message, line, col }
    }

    /// Helper constructor for the resolver.
    pub fn resolve<S: Into<String>>(line: usize, col: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Resolve error: line={}, col={}, msg={}",
            line, col, message
        );

        LoxError::Resolve { message, line, col }
    }

    /// Helper constructor for the interpreter.
    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", line, message);

        LoxError::Runtime { message, line }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Accumulates diagnostics across a run.
///
/// Phases record errors and keep going; the driver checks `has_errors` after
/// scanning, parsing and resolution, and skips evaluation when any phase
/// left something behind.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    errors: Vec<LoxError>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, error: LoxError) {
        info!("Recording diagnostic: {}", error);

        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Hands back every accumulated diagnostic, leaving the reporter empty.
    pub fn drain(&mut self) -> Vec<LoxError> {
        std::mem::take(&mut self.errors)
    }
}
