use std::collections::HashMap;

use thiserror::Error;

use crate::ast::{BlockStatement, Expression, InfixOperator, PrefixOperator, Program, Statement};
use crate::vm::{make, Bytecode, Instructions, Opcode, Value, GLOBALS_SIZE};

/// Errors that stop compilation. The first one aborts the whole program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The operator has no bytecode translation.
    #[error("unknown operator {0}")]
    UnknownOperator(String),
    /// The name was read before any `let` defined it.
    #[error("undefined variable {0}")]
    UndefinedVariable(String),
    /// Functions, calls and returns have no opcodes.
    #[error("{0} is not supported by the compiler")]
    Unsupported(&'static str),
    /// An operand doesn't fit its encoded width.
    #[error("operand {operand} too large for {opcode}")]
    OperandTooLarge {
        #[allow(missing_docs)]
        opcode: Opcode,
        #[allow(missing_docs)]
        operand: usize,
    },
    #[allow(missing_docs)]
    #[error("too many global bindings")]
    TooManyGlobals,
}

/// Global names to slot numbers. Slots are handed out in definition order and a
/// redefinition reuses the existing slot.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    store: HashMap<String, usize>,
}

impl SymbolTable {
    /// An empty table.
    pub fn new() -> Self {
        SymbolTable {
            store: HashMap::new(),
        }
    }

    /// Bind `name`, returning its slot.
    pub fn define(&mut self, name: &str) -> usize {
        let next = self.store.len();
        *self.store.entry(name.to_string()).or_insert(next)
    }

    /// The slot bound to `name`, if any.
    pub fn resolve(&self, name: &str) -> Option<usize> {
        self.store.get(name).copied()
    }

    /// Number of bound names.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether nothing is bound yet.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EmittedInstruction {
    opcode: Opcode,
    position: usize,
}

/// Walks a [`Program`] and emits bytecode for the VM.
#[derive(Debug, Default)]
pub struct Compiler {
    instructions: Instructions,
    constants: Vec<Value>,
    symbols: SymbolTable,
    // The two most recent emits, for stripping a trailing Pop out of `if` arms.
    last_instruction: Option<EmittedInstruction>,
    previous_instruction: Option<EmittedInstruction>,
}

impl Compiler {
    /// A compiler with no globals and an empty constant pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue from the globals and constants of an earlier compilation, so
    /// slots and constant indices stay valid across REPL lines.
    pub fn new_with_state(symbols: SymbolTable, constants: Vec<Value>) -> Self {
        Compiler {
            constants,
            symbols,
            ..Self::default()
        }
    }

    /// Compile every statement of `program`, appending to the instruction buffer.
    pub fn compile(&mut self, program: &Program) -> Result<(), CompileError> {
        for statement in &program.statements {
            self.compile_statement(statement)?;
        }
        Ok(())
    }

    /// The bytecode emitted so far.
    pub fn bytecode(&self) -> Bytecode {
        Bytecode {
            instructions: self.instructions.clone(),
            constants: self.constants.clone(),
        }
    }

    /// Split into the finished bytecode and the symbol table, which a REPL hands
    /// to the next compiler.
    pub fn into_parts(self) -> (Bytecode, SymbolTable) {
        let bytecode = Bytecode {
            instructions: self.instructions,
            constants: self.constants,
        };
        (bytecode, self.symbols)
    }

    fn compile_statement(&mut self, statement: &Statement) -> Result<(), CompileError> {
        match statement {
            Statement::Expression(expression) => {
                self.compile_expression(expression)?;
                self.emit(Opcode::Pop, &[])?;
            }
            Statement::Let { name, value } => {
                self.compile_expression(value)?;
                if self.symbols.resolve(name).is_none() && self.symbols.len() >= GLOBALS_SIZE {
                    return Err(CompileError::TooManyGlobals);
                }
                let slot = self.symbols.define(name);
                self.emit(Opcode::SetGlobal, &[slot])?;
            }
            Statement::Block(block) => self.compile_block(block)?,
            Statement::Return(_) => return Err(CompileError::Unsupported("return")),
        }
        Ok(())
    }

    fn compile_block(&mut self, block: &BlockStatement) -> Result<(), CompileError> {
        for statement in &block.statements {
            self.compile_statement(statement)?;
        }
        Ok(())
    }

    fn compile_expression(&mut self, expression: &Expression) -> Result<(), CompileError> {
        match expression {
            Expression::IntegerLiteral(value) => {
                let idx = self.add_constant(Value::Integer(*value));
                self.emit(Opcode::Constant, &[idx])?;
            }
            Expression::StringLiteral(value) => {
                let idx = self.add_constant(Value::string(value.as_str()));
                self.emit(Opcode::Constant, &[idx])?;
            }
            Expression::BooleanLiteral(true) => {
                self.emit(Opcode::True, &[])?;
            }
            Expression::BooleanLiteral(false) => {
                self.emit(Opcode::False, &[])?;
            }
            Expression::Identifier(name) => {
                let slot = self
                    .symbols
                    .resolve(name)
                    .ok_or_else(|| CompileError::UndefinedVariable(name.clone()))?;
                self.emit(Opcode::GetGlobal, &[slot])?;
            }
            Expression::Prefix { operator, right } => {
                self.compile_expression(right)?;
                let opcode = match operator {
                    PrefixOperator::Bang => Opcode::Bang,
                    PrefixOperator::Minus => Opcode::Minus,
                };
                self.emit(opcode, &[])?;
            }
            Expression::Infix {
                left,
                operator,
                right,
            } => self.compile_infix(left, *operator, right)?,
            Expression::If {
                condition,
                consequence,
                alternative,
            } => self.compile_if(condition, consequence, alternative.as_ref())?,
            Expression::ArrayLiteral(elements) => {
                for element in elements {
                    self.compile_expression(element)?;
                }
                self.emit(Opcode::Array, &[elements.len()])?;
            }
            Expression::MapLiteral(pairs) => {
                for (key, value) in pairs {
                    self.compile_expression(key)?;
                    self.compile_expression(value)?;
                }
                self.emit(Opcode::Map, &[pairs.len()])?;
            }
            Expression::Index { left, index } => {
                self.compile_expression(left)?;
                self.compile_expression(index)?;
                self.emit(Opcode::Index, &[])?;
            }
            Expression::FunctionLiteral { .. } => {
                return Err(CompileError::Unsupported("function literal"))
            }
            Expression::Call { .. } => return Err(CompileError::Unsupported("call")),
        }
        Ok(())
    }

    fn compile_infix(
        &mut self,
        left: &Expression,
        operator: InfixOperator,
        right: &Expression,
    ) -> Result<(), CompileError> {
        // a < b is compiled as b > a.
        if let InfixOperator::Less | InfixOperator::LessEqual = operator {
            self.compile_expression(right)?;
            self.compile_expression(left)?;
        } else {
            self.compile_expression(left)?;
            self.compile_expression(right)?;
        }
        let opcode = match operator {
            InfixOperator::Plus => Opcode::Add,
            InfixOperator::Minus => Opcode::Sub,
            InfixOperator::Multiply => Opcode::Mul,
            InfixOperator::Divide => Opcode::Div,
            InfixOperator::Equal => Opcode::Equal,
            InfixOperator::NotEqual => Opcode::NotEqual,
            InfixOperator::Greater | InfixOperator::Less => Opcode::Greater,
            InfixOperator::GreaterEqual | InfixOperator::LessEqual => Opcode::GreaterEqual,
            InfixOperator::And | InfixOperator::Or => {
                return Err(CompileError::UnknownOperator(operator.to_string()))
            }
        };
        self.emit(opcode, &[])?;
        Ok(())
    }

    fn compile_if(
        &mut self,
        condition: &Expression,
        consequence: &BlockStatement,
        alternative: Option<&BlockStatement>,
    ) -> Result<(), CompileError> {
        self.compile_expression(condition)?;
        // Both targets are patched once the arms are laid out.
        let jump_not_true = self.emit(Opcode::JumpNotTrue, &[0])?;
        self.compile_arm(consequence)?;
        let jump = self.emit(Opcode::Jump, &[0])?;

        let after_consequence = self.instructions.len();
        self.change_operand(jump_not_true, after_consequence)?;

        match alternative {
            Some(alternative) => self.compile_arm(alternative)?,
            None => {
                self.emit(Opcode::Null, &[])?;
            }
        }
        let after_alternative = self.instructions.len();
        self.change_operand(jump, after_alternative)
    }

    // An arm leaves exactly one value: its last expression statement keeps its
    // value instead of popping it, and any other arm yields null.
    fn compile_arm(&mut self, block: &BlockStatement) -> Result<(), CompileError> {
        self.compile_block(block)?;
        if self.last_instruction_is(Opcode::Pop) {
            self.remove_last_instruction();
        } else {
            self.emit(Opcode::Null, &[])?;
        }
        Ok(())
    }

    /// Append an instruction, returning its position.
    fn emit(&mut self, opcode: Opcode, operands: &[usize]) -> Result<usize, CompileError> {
        check_operands(opcode, operands)?;
        let position = self.instructions.push(&make(opcode, operands));
        self.previous_instruction = self.last_instruction;
        self.last_instruction = Some(EmittedInstruction { opcode, position });
        Ok(position)
    }

    /// Add a constant to the pool, returning its index.
    fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    fn last_instruction_is(&self, opcode: Opcode) -> bool {
        matches!(self.last_instruction, Some(last) if last.opcode == opcode)
    }

    fn remove_last_instruction(&mut self) {
        if let Some(last) = self.last_instruction {
            self.instructions.truncate(last.position);
            self.last_instruction = self.previous_instruction;
        }
    }

    fn replace_instruction(&mut self, position: usize, instruction: &[u8]) {
        self.instructions.replace(position, instruction);
    }

    fn change_operand(&mut self, position: usize, operand: usize) -> Result<(), CompileError> {
        // Positions handed to this always come from emit.
        let opcode = match Opcode::from_byte(self.instructions[position]) {
            Some(opcode) => opcode,
            None => return Ok(()),
        };
        check_operands(opcode, &[operand])?;
        self.replace_instruction(position, &make(opcode, &[operand]));
        Ok(())
    }
}

fn check_operands(opcode: Opcode, operands: &[usize]) -> Result<(), CompileError> {
    for (operand, width) in operands.iter().zip(opcode.operand_widths()) {
        let max = (1usize << (8 * width)) - 1;
        if *operand > max {
            return Err(CompileError::OperandTooLarge {
                opcode,
                operand: *operand,
            });
        }
    }
    Ok(())
}
