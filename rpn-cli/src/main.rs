//! RPN command line
//!
//! With terms on the command line the expression is evaluated once and the
//! final stack printed. Without terms each line of stdin is an expression;
//! variables and history carry over from line to line.
//!
//! Flags:
//! - `--json`: print results and errors as JSON objects
//! - `--no-units`: skip loading the unit system
//!
//! Environment:
//! - `RPN_DATA_PATH`: directory for `units.json` and `factors.json`
//! - `RPN_PRECISION`, `RPN_INPUT_RADIX`, `RPN_NO_UNITS`
//! - `RUST_LOG`: log filter, logs go to stderr

use rpn::{Calculator, CalculatorConfig};
use rpn_core::{TermError, Value};
use serde_json::json;
use std::env;
use std::io::{self, BufRead, IsTerminal, Write};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Default)]
struct Options {
    json: bool,
    no_units: bool,
    terms: Vec<String>,
}

fn parse_args(args: impl Iterator<Item = String>) -> Options {
    let mut options = Options::default();
    for arg in args {
        match arg.as_str() {
            "--json" => options.json = true,
            "--no-units" => options.no_units = true,
            // a lone "--" would otherwise be taken as a term
            "--" => {}
            _ => options.terms.push(arg),
        }
    }
    options
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let options = parse_args(env::args().skip(1));
    let mut config = CalculatorConfig::from_env();
    if options.no_units {
        config = config.with_units(false);
    }
    let mut calculator = Calculator::new(config);
    info!(version = VERSION, "rpn started");

    let status = if options.terms.is_empty() {
        repl(&mut calculator, options.json)
    } else {
        match run_line(&mut calculator, &options.terms, options.json) {
            Ok(()) => ExitCode::SUCCESS,
            Err(()) => ExitCode::FAILURE,
        }
    };

    if let Err(e) = calculator.flush_caches() {
        warn!(error = %e, "could not persist the factorization cache");
    }
    status
}

fn repl(calculator: &mut Calculator, json: bool) -> ExitCode {
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    if interactive {
        eprintln!("rpn v{}, one expression per line, 'quit' to leave", VERSION);
    }

    let mut reader = stdin.lock();
    loop {
        if interactive {
            eprint!("> ");
            let _ = io::stderr().flush();
        }
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                let terms: Vec<String> = line.split_whitespace().map(str::to_string).collect();
                match terms.first().map(String::as_str) {
                    None => continue,
                    Some("quit") | Some("exit") if terms.len() == 1 => break,
                    _ => {}
                }
                // errors are reported and the session continues
                let _ = run_line(calculator, &terms, json);
            }
            Err(e) => {
                eprintln!("error reading input: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}

fn run_line(calculator: &mut Calculator, terms: &[String], json: bool) -> Result<(), ()> {
    match calculator.evaluate(terms) {
        Ok(stack) => {
            let rendered: Vec<String> = stack.iter().map(|v| calculator.render(v)).collect();
            if json {
                println!("{}", json!({ "stack": rendered }));
            } else {
                print_stack(&stack, &rendered);
            }
            Ok(())
        }
        Err(e) => {
            report(&e, json);
            Err(())
        }
    }
}

fn print_stack(stack: &[Value], rendered: &[String]) {
    if stack.is_empty() {
        println!("(empty)");
        return;
    }
    for line in rendered {
        println!("{}", line);
    }
}

fn report(error: &TermError, json: bool) {
    if json {
        println!(
            "{}",
            json!({
                "error": {
                    "code": error.code(),
                    "index": error.index,
                    "term": error.term,
                    "message": error.source.to_string(),
                }
            })
        );
    } else {
        eprintln!("{}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> impl Iterator<Item = String> + '_ {
        line.split_whitespace().map(str::to_string)
    }

    #[test]
    fn test_parse_args() {
        let options = parse_args(args("--json 2 3 +"));
        assert!(options.json);
        assert!(!options.no_units);
        assert_eq!(options.terms, vec!["2", "3", "+"]);

        let options = parse_args(args("--no-units -- -5 abs"));
        assert!(options.no_units);
        assert_eq!(options.terms, vec!["-5", "abs"]);
    }

    #[test]
    fn test_run_line() {
        let mut calculator = Calculator::new(CalculatorConfig::default());
        let terms: Vec<String> = args("2 3 +").collect();
        assert!(run_line(&mut calculator, &terms, false).is_ok());
        let terms: Vec<String> = args("2 +").collect();
        assert!(run_line(&mut calculator, &terms, true).is_err());
        assert_eq!(calculator.history(), &[Value::from(5)]);
    }
}
