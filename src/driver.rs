use std::fs;
use std::io::{self, Write};
use std::path::Path;

use log::info;

use crate::error::{ErrorReporter, Result};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner;

/// How a single run ended; the binary maps this onto exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    HadError,
    HadRuntimeError,
}

/// Runs source strings through the full pipeline: scan, parse, resolve,
/// interpret, with an error-reporter checkpoint between phases.
///
/// The interpreter (globals and the resolution table) is retained for the
/// lifetime of the `Lox` value, so REPL declarations persist across lines.
/// Everything else is rebuilt per run.
pub struct Lox<W: Write = io::Stdout> {
    interpreter: Interpreter<W>,
}

impl Lox<io::Stdout> {
    pub fn new() -> Self {
        Lox {
            interpreter: Interpreter::new(),
        }
    }
}

impl Default for Lox<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Lox<W> {
    pub fn with_writer(writer: W) -> Self {
        Lox {
            interpreter: Interpreter::with_writer(writer),
        }
    }

    /// Reclaims the interpreter's writer, e.g. to inspect captured output.
    pub fn into_writer(self) -> W {
        self.interpreter.into_writer()
    }

    /// Reads a script as UTF-8 and runs it.
    pub fn run_file(&mut self, path: &Path) -> Result<Status> {
        let bytes: Vec<u8> = fs::read(path)?;
        let source: String = String::from_utf8(bytes)?;

        Ok(self.run(&source))
    }

    pub fn run(&mut self, source: &str) -> Status {
        info!("Running {} bytes of source", source.len());

        let mut reporter = ErrorReporter::new();

        let tokens = scanner::scan_tokens(source, &mut reporter);

        if reporter.has_errors() {
            flush_diagnostics(&mut reporter);

            return Status::HadError;
        }

        let statements = Parser::new(tokens, &mut reporter).parse();

        if reporter.has_errors() {
            flush_diagnostics(&mut reporter);

            return Status::HadError;
        }

        Resolver::new(&mut self.interpreter, &mut reporter).resolve(&statements);

        if reporter.has_errors() {
            flush_diagnostics(&mut reporter);

            return Status::HadError;
        }

        match self.interpreter.interpret(&statements) {
            Ok(()) => Status::Success,

            Err(e) => {
                eprintln!("{}", e);

                Status::HadRuntimeError
            }
        }
    }
}

fn flush_diagnostics(reporter: &mut ErrorReporter) {
    eprintln!("Errors found - runtime would not attempt to execute this code.");

    for error in reporter.drain() {
        eprintln!("{}", error);
    }
}
