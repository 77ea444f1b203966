// SPDX-FileCopyrightText: 2022 DCsunset
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Batch/interactive driver: thin shell over [`chordsim::interpreter::Interpreter`].

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;

use chordsim::core::DhtError;
use chordsim::interpreter::{Interpreter, Outcome};

/// `prog m [-i FILE]` — simulate a Chord ring over an m-bit identifier space.
#[derive(Parser)]
#[command(name = "chordsim")]
struct Cli {
    /// Key size: the identifier space is 0..2^m.
    m: i64,

    /// Batch-mode command script; omit for an interactive REPL on stdin.
    #[arg(short = 'i', long = "input")]
    input: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut interp = Interpreter::new(cli.m)?;

    match cli.input {
        Some(path) => run_batch(&mut interp, &path),
        None => run_interactive(&mut interp),
    }
}

fn run_batch(interp: &mut Interpreter, path: &PathBuf) -> anyhow::Result<()> {
    let contents = std::fs::read_to_string(path)
        .map_err(|_| DhtError::InputFileMissing(path.display().to_string()))?;

    for line in contents.lines() {
        match interp.execute_line(line) {
            Outcome::Output(text) => println!("{}", text),
            Outcome::Silent => {}
            Outcome::Exit => break,
        }
    }
    Ok(())
}

fn run_interactive(interp: &mut Interpreter) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        let bytes_read = stdin.lock().read_line(&mut line)?;
        if bytes_read == 0 {
            break; // EOF
        }

        match interp.execute_line(&line) {
            Outcome::Output(text) => println!("{}", text),
            Outcome::Silent => {}
            Outcome::Exit => break,
        }
    }
    Ok(())
}
