use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::io::Write;
use std::path::PathBuf;

use treelox as lox;

use clap::Parser as ClapParser;

use lox::error::LoxError;
use lox::interpreter::{Interpreter, InterpreterConfig};
use lox::parser::Parser;
use lox::resolver::Resolver;
use lox::scanner::Scanner;
use lox::token::{Token, TokenType};

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Script to execute; with no script, starts an interactive prompt
    script: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Cli = Cli::parse();

    if args.script.len() > 1 {
        println!("Usage: treelox [script]");
        std::process::exit(1);
    }

    let mut interpreter = Interpreter::new(InterpreterConfig::default());

    match args.script.first() {
        Some(path) => {
            let file: File = match File::open(path) {
                Ok(file) => file,

                Err(_) => {
                    println!("treelox: could not read file: '{}'", path.display());
                    std::process::exit(1);
                }
            };

            let mut buf: Vec<u8> = Vec::new();
            let mut reader: BufReader<File> = BufReader::new(file);
            reader.read_to_end(&mut buf)?;

            if let Err(e) = run(&mut interpreter, &buf, false) {
                println!("{}", e);
                std::process::exit(1);
            }
        }

        None => run_prompt(&mut interpreter)?,
    }

    Ok(())
}

fn run_prompt(interpreter: &mut Interpreter) -> anyhow::Result<()> {
    let stdin = std::io::stdin();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();

        // EOF ends the session cleanly
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }

        if let Err(e) = run(interpreter, line.as_bytes(), true) {
            println!("{}", e);
        }
    }
}

fn is_statement_terminator(token: &Token) -> bool {
    token.token_type == TokenType::RIGHT_BRACE || token.token_type == TokenType::SEMICOLON
}

fn run(interpreter: &mut Interpreter, source: &[u8], interactive: bool) -> Result<(), LoxError> {
    let (tokens, mut errors) = Scanner::new(source).scan_tokens();

    if !errors.is_empty() {
        return Err(errors.remove(0));
    }

    // An interactive line whose last significant token is neither ';' nor
    // '}' is treated as an expression and its value echoed.
    if interactive && tokens.len() > 1 && !is_statement_terminator(&tokens[tokens.len() - 2]) {
        let mut parser = Parser::new(tokens);
        let expr = parser.parse_expr();

        if parser.has_error() {
            return Err(parser.into_errors().remove(0));
        }

        let Some(expr) = expr else {
            return Ok(());
        };

        let mut resolver = Resolver::new(interpreter);
        resolver.resolve_expr(&expr);

        if resolver.has_error() {
            return Err(resolver.into_errors().remove(0));
        }

        let value = interpreter.interpret_expr(&expr)?;
        println!("{}", value);

        return Ok(());
    }

    let mut parser = Parser::new(tokens);
    let program = parser.parse();

    if parser.has_error() {
        return Err(parser.into_errors().remove(0));
    }

    let mut resolver = Resolver::new(interpreter);
    resolver.resolve(&program);

    if resolver.has_error() {
        return Err(resolver.into_errors().remove(0));
    }

    interpreter.interpret(&program)
}
