use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use barescript::{execute, lint, parse_script, ExecOptions};

/// BareScript/CalcScript command-line front end: parse, lint, or run a
/// `.bs` script file.
#[derive(Parser, Debug)]
#[command(name = "barescript")]
#[command(version)]
#[command(about = "Parse, lint, or run a BareScript/CalcScript file")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a script and print its statement count
    Parse {
        #[arg(value_name = "FILE")]
        script: PathBuf,
    },
    /// Parse a script and print lint warnings
    Lint {
        #[arg(value_name = "FILE")]
        script: PathBuf,
    },
    /// Parse and execute a script, printing its return value
    Run {
        #[arg(value_name = "FILE")]
        script: PathBuf,

        /// Maximum statement dispatches before aborting (0 disables)
        #[arg(long = "max-statements", default_value = "10000000")]
        max_statements: u64,
    },
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> Result<(), String> {
    match args.command {
        Command::Parse { script } => {
            let text = read_script(&script)?;
            let parsed = parse_script(&text, 1).map_err(|e| e.render())?;
            println!("{} statements", parsed.statements.len());
            Ok(())
        }
        Command::Lint { script } => {
            let text = read_script(&script)?;
            let parsed = parse_script(&text, 1).map_err(|e| e.render())?;
            let warnings = lint(&parsed);
            if warnings.is_empty() {
                println!("No warnings");
            } else {
                for w in &warnings {
                    println!("{}", w);
                }
            }
            Ok(())
        }
        Command::Run {
            script,
            max_statements,
        } => {
            let text = read_script(&script)?;
            let parsed = parse_script(&text, 1).map_err(|e| e.render())?;
            let globals = barescript::new_globals();
            let mut options = ExecOptions::new();
            options.max_statements = max_statements;
            let value = execute(&parsed, globals, &options).map_err(|e| e.to_string())?;
            println!("{}", value);
            Ok(())
        }
    }
}

fn read_script(path: &PathBuf) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))
}
