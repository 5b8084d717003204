use std::io::{BufRead, Write};

use crate::compiler::{Compiler, SymbolTable};
use crate::parser::parse;
use crate::scanner::ScannerTable;
use crate::token::TokenKind;
use crate::vm::{new_globals, Builtins, Globals, Value, Vm};
use crate::Error;

/// Printed before reading each line.
pub const PROMPT: &str = ">> ";

/// Everything that outlives a single line: the scanner table, global names and
/// slots, and the constant pool their bytecode refers to.
#[derive(Debug)]
pub struct Session {
    table: ScannerTable<TokenKind>,
    symbols: SymbolTable,
    constants: Vec<Value>,
    globals: Globals,
    builtins: Builtins,
}

impl Session {
    /// Builds the standard scanner table, which can fail only if its regexes are bad.
    pub fn new() -> Result<Self, Error> {
        Ok(Session {
            table: ScannerTable::standard()?,
            symbols: SymbolTable::new(),
            constants: Vec::new(),
            globals: new_globals(),
            builtins: Builtins::standard(),
        })
    }

    /// Run one line and return the value it popped last.
    ///
    /// A line that fails to parse or compile leaves the session untouched. A
    /// runtime failure keeps whatever globals were set before it.
    pub fn eval(&mut self, line: &str) -> Result<Value, Error> {
        let program = parse(self.table.scanner(line))?;
        let mut compiler = Compiler::new_with_state(self.symbols.clone(), self.constants.clone());
        compiler.compile(&program)?;
        let (bytecode, symbols) = compiler.into_parts();
        self.symbols = symbols;
        self.constants = bytecode.constants.clone();

        let globals = std::mem::take(&mut self.globals);
        let mut vm = Vm::new_with_state(bytecode, globals, self.builtins.clone());
        let result = vm.run();
        let value = vm.last_popped();
        self.globals = vm.into_globals();
        result?;
        Ok(value)
    }

    /// Read lines from `input` until EOF, writing each result (or error) to
    /// `output`.
    pub fn run_prompt<R: BufRead, W: Write>(
        &mut self,
        input: R,
        mut output: W,
    ) -> std::io::Result<()> {
        let mut lines = input.lines();
        loop {
            write!(output, "{}", PROMPT)?;
            output.flush()?;
            let line = match lines.next() {
                Some(line) => line?,
                None => break,
            };
            if line.trim().is_empty() {
                continue;
            }
            match self.eval(&line) {
                Ok(value) => writeln!(output, "{}", value)?,
                Err(e) => writeln!(output, "{}", e)?,
            }
        }
        writeln!(output)?;
        output.flush()
    }
}
