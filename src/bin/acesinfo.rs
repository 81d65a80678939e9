
//! Print the header of a file.
//! Usage: `acesinfo [-v] <filename>`

use std::process::ExitCode;
use aces::prelude::*;


enum Command {
    Help,
    Print { path: String, verbose: bool },
}

fn parse(arguments: &[String]) -> Option<Command> {
    match arguments {
        [flag] if flag == "-h" || flag == "-?" || flag == "--help" => Some(Command::Help),
        [flag] if flag.starts_with('-') => None,
        [path] => Some(Command::Print { path: path.clone(), verbose: false }),
        [flag, path] if flag == "-v" => Some(Command::Print { path: path.clone(), verbose: true }),
        _ => None,
    }
}

fn usage(program: &str) {
    eprintln!("Usage: {} [-v] <filename>", program);
    eprintln!();
}

fn main() -> ExitCode {
    let mut arguments = std::env::args();
    let program = arguments.next().unwrap_or_else(|| String::from("acesinfo"));
    let arguments: Vec<String> = arguments.collect();

    match parse(&arguments) {
        None => {
            usage(&program);
            ExitCode::FAILURE
        },

        Some(Command::Help) => {
            usage(&program);
            ExitCode::SUCCESS
        },

        Some(Command::Print { path, verbose }) => {
            // problems were already reported to standard error while opening
            if let Ok(mut file) = ImageFile::open(&path, ReadOptions::default()) {
                let stdout = std::io::stdout();

                if let Err(error) = file.print_header(&mut stdout.lock(), verbose) {
                    eprintln!("ERROR: {}", error);
                }

                file.close();
            }

            ExitCode::SUCCESS
        },
    }
}
