//! The lib crate for the Monkey language: a scanner generator that turns token
//! regexes into a minimized DFA, a Pratt parser, a bytecode compiler and a stack VM.
#![warn(missing_debug_implementations, missing_docs, rust_2018_idioms)]

use thiserror::Error;

/// Token kinds and tokens.
pub mod token;

/// Regex to NFA to DFA, and DFA minimization.
pub mod automata;

/// scanner scans! Both the handwritten one and the table-driven one.
pub mod scanner;

/// The syntax tree.
pub mod ast;

/// Takes tokens from a scanner and builds the syntax tree
pub mod parser;

/// Takes the syntax tree and emits bytecode
pub mod compiler;

/// vm is the bits about running code.
pub mod vm;

/// Line-at-a-time evaluation with state kept between lines.
pub mod repl;

use automata::RegexError;
use compiler::{CompileError, Compiler};
use parser::ParseError;
use vm::{Value, Vm, VmError};

/// Any failure between source text and a value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A token classification didn't compile
    #[error("bad token regex: {0}")]
    Regex(#[from] RegexError),
    /// SyntaxError is for errors during scanning/parsing
    #[error("syntax error: {0}")]
    Parse(#[from] ParseError),
    #[allow(missing_docs)]
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),
    /// RuntimeError happens with runtime problems, like mismatched types
    #[error("runtime error: {0}")]
    Runtime(#[from] VmError),
}

/// Scan, parse, compile and run `source` on a fresh VM, returning the value of
/// the last expression statement.
pub fn run(source: &str) -> Result<Value, Error> {
    let program = parser::parse(scanner::Scanner::new(source))?;
    let mut compiler = Compiler::new();
    compiler.compile(&program)?;
    let mut vm = Vm::new(compiler.bytecode());
    vm.run()?;
    Ok(vm.last_popped())
}
