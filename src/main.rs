use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rlox::error::LoxError;
use rlox::interpreter::Interpreter;
use rlox::parser::Parser;
use rlox::resolver::Resolver;
use rlox::scanner::Scanner;
use rlox::token::Token;

/// Exit status for lexical, syntactic, and resolution errors.
const EXIT_STATIC_ERROR: u8 = 65;

/// Exit status for runtime errors.
const EXIT_RUNTIME_ERROR: u8 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize { filename: PathBuf },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: PathBuf },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },
}

/// Reads the contents of a file into a Vec<u8>
fn read_file(filename: &PathBuf) -> Result<Vec<u8>> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger(enabled: bool) -> Result<()> {
    if !enabled {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
        return Ok(());
    }

    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rlox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Scan the whole input, printing lexical errors to stderr.  Returns the
/// token list and whether any error occurred.
fn scan(buf: &[u8]) -> (Vec<Token>, bool) {
    let scanner = Scanner::new(buf);
    let mut tokens: Vec<Token> = Vec::new();
    let mut had_error: bool = false;

    for result in scanner {
        match result {
            Ok(token) => tokens.push(token),

            Err(e) => {
                had_error = true;
                eprintln!("{}", e);
            }
        }
    }

    (tokens, had_error)
}

fn tokenize(filename: &PathBuf) -> Result<ExitCode> {
    let buf = read_file(filename)?;
    let scanner = Scanner::new(&buf);
    let mut had_error: bool = false;

    for result in scanner {
        match result {
            Ok(token) => println!("{}", token),

            Err(e) => {
                had_error = true;
                eprintln!("{}", e);
            }
        }
    }

    if had_error {
        debug!("Tokenization failed, exiting with code {}", EXIT_STATIC_ERROR);
        return Ok(ExitCode::from(EXIT_STATIC_ERROR));
    }

    Ok(ExitCode::SUCCESS)
}

fn parse(filename: &PathBuf) -> Result<ExitCode> {
    let buf = read_file(filename)?;
    let (tokens, had_error) = scan(&buf);
    if had_error {
        return Ok(ExitCode::from(EXIT_STATIC_ERROR));
    }

    match Parser::new(tokens).parse_expression() {
        Ok(expr) => {
            println!("{}", rlox::ast_printer::AstPrinter.print(&expr));
            Ok(ExitCode::SUCCESS)
        }

        Err(e) => {
            eprintln!("{}", e);
            Ok(ExitCode::from(EXIT_STATIC_ERROR))
        }
    }
}

fn evaluate(filename: &PathBuf) -> Result<ExitCode> {
    let buf = read_file(filename)?;
    let (tokens, had_error) = scan(&buf);
    if had_error {
        return Ok(ExitCode::from(EXIT_STATIC_ERROR));
    }

    let expr = match Parser::new(tokens).parse_expression() {
        Ok(expr) => expr,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(ExitCode::from(EXIT_STATIC_ERROR));
        }
    };

    let mut interpreter = Interpreter::new();
    match interpreter.evaluate(&expr) {
        Ok(value) => {
            println!("{}", value);
            Ok(ExitCode::SUCCESS)
        }

        Err(e) => {
            eprintln!("{}", e);
            Ok(ExitCode::from(EXIT_RUNTIME_ERROR))
        }
    }
}

/// The full pipeline: scan → parse → resolve → interpret.  Static errors of
/// any stage are all reported and suppress execution entirely.
fn run(filename: &PathBuf) -> Result<ExitCode> {
    let buf = read_file(filename)?;

    let (tokens, had_lex_error) = scan(&buf);
    if had_lex_error {
        return Ok(ExitCode::from(EXIT_STATIC_ERROR));
    }

    let statements = match Parser::new(tokens).parse() {
        Ok(statements) => statements,

        Err(errors) => {
            for e in &errors {
                eprintln!("{}", e);
            }
            return Ok(ExitCode::from(EXIT_STATIC_ERROR));
        }
    };

    let mut interpreter = Interpreter::new();

    let resolve_errors: Vec<LoxError> = Resolver::new(&mut interpreter).resolve(&statements);
    if !resolve_errors.is_empty() {
        for e in &resolve_errors {
            eprintln!("{}", e);
        }
        return Ok(ExitCode::from(EXIT_STATIC_ERROR));
    }

    match interpreter.interpret(&statements) {
        Ok(()) => {
            info!("Program executed successfully");
            Ok(ExitCode::SUCCESS)
        }

        Err(e) => {
            debug!("Runtime error: {}", e);
            eprintln!("{}", e);
            Ok(ExitCode::from(EXIT_RUNTIME_ERROR))
        }
    }
}

fn main() -> Result<ExitCode> {
    let args: Cli = Cli::parse();

    init_logger(args.log)?;
    info!("CLI arguments: {:?}", args);

    match &args.commands {
        Commands::Tokenize { filename } => tokenize(filename),
        Commands::Parse { filename } => parse(filename),
        Commands::Evaluate { filename } => evaluate(filename),
        Commands::Run { filename } => run(filename),
    }
}
