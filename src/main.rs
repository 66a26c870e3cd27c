use std::path::PathBuf;
use std::process;

use rox as lox;

use clap::Parser as ClapParser;
use log::LevelFilter;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use simple_logger::SimpleLogger;

use lox::driver::{Lox, Status};

#[derive(ClapParser, Debug)]
#[command(version, about = "Tree-walking interpreter for the Lox language")]
#[command(override_usage = "lox [path/to/script.lx]")]
pub struct Cli {
    /// Script to run; drops into an interactive shell when omitted.
    script: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    SimpleLogger::new()
        .with_level(LevelFilter::Warn)
        .env()
        .init()
        .ok();

    let args: Cli = Cli::parse();

    match args.script {
        Some(path) => {
            let mut lox = Lox::new();

            match lox.run_file(&path) {
                Ok(Status::Success) => {}

                Ok(Status::HadError) => process::exit(65),

                Ok(Status::HadRuntimeError) => process::exit(70),

                Err(e) => {
                    eprintln!("Invalid file path: {}", path.display());
                    eprintln!("{}", e);
                    process::exit(1);
                }
            }
        }

        None => run_prompt()?,
    }

    Ok(())
}

fn run_prompt() -> anyhow::Result<()> {
    println!("Lox Shell v0.0");
    println!("Type 'exit' to quit.");
    println!();

    let mut editor = DefaultEditor::new()?;
    let mut lox = Lox::new();

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                if line == "exit" {
                    break;
                }

                if line.is_empty() {
                    continue;
                }

                editor.add_history_entry(&line).ok();

                lox.run(&line);
            }

            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,

            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
