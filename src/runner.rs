//! One-shot pipeline over a fresh interpreter: scan → parse → resolve →
//! interpret.  Returns every error the failing stage accumulated; an empty
//! vector means the program ran to completion.

use crate::error::LoxError;
use crate::interpreter::{Interpreter, InterpreterConfig};
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;

pub fn run_program(config: InterpreterConfig, source: &str) -> Vec<LoxError> {
    let (tokens, errors) = Scanner::new(source.as_bytes()).scan_tokens();

    if !errors.is_empty() {
        return errors;
    }

    let mut parser = Parser::new(tokens);
    let program = parser.parse();

    if parser.has_error() {
        return parser.into_errors();
    }

    let mut interpreter = Interpreter::new(config);

    let mut resolver = Resolver::new(&mut interpreter);
    resolver.resolve(&program);

    if resolver.has_error() {
        return resolver.into_errors();
    }

    match interpreter.interpret(&program) {
        Ok(()) => Vec::new(),

        Err(e) => vec![e],
    }
}
