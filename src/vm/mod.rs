use std::rc::Rc;

use thiserror::Error;

mod builtins;
mod code;
mod frame;
mod value;

pub use builtins::Builtins;
pub use code::{make, read_operands, read_u16, Instructions, Opcode};
pub use value::{Builtin, BuiltinFn, CompiledFunction, HashKey, MapEntry, Object, Value};

use frame::Frame;

macro_rules! integer_comparison {
    ($self:ident, $op:tt, $symbol:literal) => {{
        let right = $self.pop()?;
        let left = $self.pop()?;
        match (&left, &right) {
            (Value::Integer(a), Value::Integer(b)) => $self.push(Value::Boolean(a $op b)),
            _ => Err(VmError::TypeMismatch {
                operator: $symbol,
                left: left.type_name(),
                right: right.type_name(),
            }),
        }
    }};
}

/// Number of value slots on the stack.
pub const STACK_SIZE: usize = 2048;
/// Number of global slots.
pub const GLOBALS_SIZE: usize = 6048;
/// Capacity of the frame stack. Only the main frame is pushed; the rest is
/// reserved for calls.
pub const MAX_FRAMES: usize = 1024;

/// Global slots, indexed by the operand of `SetGlobal`/`GetGlobal`. A REPL keeps
/// this alive between runs.
pub type Globals = Vec<Option<Value>>;

/// A fresh, all-unset global array.
pub fn new_globals() -> Globals {
    vec![None; GLOBALS_SIZE]
}

/// Output of the compiler: the main instruction stream and its constant pool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bytecode {
    #[allow(missing_docs)]
    pub instructions: Instructions,
    #[allow(missing_docs)]
    pub constants: Vec<Value>,
}

/// Errors that can be returned by running bytecode.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VmError {
    /// A binary operator got operand types it has no meaning for.
    #[error("unsupported types for {operator}: {left} and {right}")]
    TypeMismatch {
        #[allow(missing_docs)]
        operator: &'static str,
        #[allow(missing_docs)]
        left: &'static str,
        #[allow(missing_docs)]
        right: &'static str,
    },
    /// A unary operator got an operand type it has no meaning for.
    #[error("unsupported type for {operator}: {operand}")]
    UnsupportedOperand {
        #[allow(missing_docs)]
        operator: &'static str,
        #[allow(missing_docs)]
        operand: &'static str,
    },
    #[allow(missing_docs)]
    #[error("division by zero")]
    DivisionByZero,
    /// Conditions are never coerced to booleans.
    #[error("condition must be BOOLEAN, got {0}")]
    NonBooleanCondition(&'static str),
    #[allow(missing_docs)]
    #[error("index {index} out of range for array of length {length}")]
    IndexOutOfRange { index: i64, length: usize },
    #[allow(missing_docs)]
    #[error("index operator not supported: {container}[{index}]")]
    IndexNotSupported {
        container: &'static str,
        index: &'static str,
    },
    /// Only integers, booleans and strings can be map keys.
    #[error("unusable as map key: {0}")]
    UnhashableKey(&'static str),
    #[allow(missing_docs)]
    #[error("global slot {0} read before it was set")]
    UnsetGlobal(usize),
    #[allow(missing_docs)]
    #[error("global slot {0} out of range")]
    GlobalOutOfRange(usize),
    /// We have a hardcoded max stack size
    #[error("stack overflow")]
    StackOverflow,
    #[allow(missing_docs)]
    #[error("unknown builtin function: {0}")]
    UnknownBuiltin(String),
    /// A builtin rejected its arguments.
    #[error("{name}: {message}")]
    Builtin {
        #[allow(missing_docs)]
        name: &'static str,
        #[allow(missing_docs)]
        message: String,
    },
    /// Internal Errors should not occur for code that compiled successfully, but just in case.
    #[error("internal error: {0}")]
    InternalError(#[from] InternalError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// VM error that should never come up in code that compiled correctly
pub enum InternalError {
    /// Tried to get the top value from an empty stack
    #[error("popped from an empty stack")]
    EmptyStack,
    #[allow(missing_docs)]
    #[error("no frame to execute")]
    NoFrame,
    #[allow(missing_docs)]
    #[error("undefined opcode {byte} at {position:04}")]
    UnknownOpcode { byte: u8, position: usize },
    /// The instruction stream ends inside an operand.
    #[error("truncated {opcode} at {position:04}")]
    TruncatedInstruction {
        #[allow(missing_docs)]
        opcode: Opcode,
        #[allow(missing_docs)]
        position: usize,
    },
    #[allow(missing_docs)]
    #[error("constant {0} is not in the pool")]
    MissingConstant(usize),
}

/// A Vm is a stateful executor of bytecode.
#[derive(Debug)]
pub struct Vm {
    constants: Vec<Value>,
    // Fixed-size and never cleared: popping only moves `sp`, so the slot at `sp`
    // still holds the value popped last.
    stack: Vec<Value>,
    sp: usize,
    globals: Globals,
    frames: Vec<Frame>,
    builtins: Builtins,
}

impl Vm {
    /// A VM with fresh globals and the standard builtins.
    pub fn new(bytecode: Bytecode) -> Self {
        Self::new_with_state(bytecode, new_globals(), Builtins::standard())
    }

    /// New Vm from pre-existing globals, e.g. those left by a previous run.
    pub fn new_with_state(bytecode: Bytecode, mut globals: Globals, builtins: Builtins) -> Self {
        if globals.len() < GLOBALS_SIZE {
            globals.resize(GLOBALS_SIZE, None);
        }
        let main = CompiledFunction {
            instructions: bytecode.instructions,
        };
        let mut frames = Vec::with_capacity(MAX_FRAMES);
        frames.push(Frame::new(Rc::new(main)));
        Vm {
            constants: bytecode.constants,
            stack: vec![Value::Null; STACK_SIZE],
            sp: 0,
            globals,
            frames,
            builtins,
        }
    }

    /// Run until the main frame's instructions are exhausted or an error occurs.
    pub fn run(&mut self) -> Result<(), VmError> {
        while let Some((opcode, operand)) = self.fetch()? {
            self.execute(opcode, operand)?;
        }
        Ok(())
    }

    /// The value most recently popped off the stack, or null if nothing was.
    pub fn last_popped(&self) -> Value {
        self.stack.get(self.sp).cloned().unwrap_or(Value::Null)
    }

    /// The value currently on top of the stack.
    pub fn stack_top(&self) -> Option<&Value> {
        self.sp.checked_sub(1).map(|top| &self.stack[top])
    }

    /// Global slots as they stand.
    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    /// Give the globals back, to seed the next VM.
    pub fn into_globals(self) -> Globals {
        self.globals
    }

    /// Call a registered builtin directly from host code.
    pub fn call_builtin(&self, name: &str, args: &[Value]) -> Result<Value, VmError> {
        let builtin = self
            .builtins
            .get(name)
            .ok_or_else(|| VmError::UnknownBuiltin(name.to_string()))?;
        (builtin.func)(args).map_err(|message| VmError::Builtin {
            name: builtin.name,
            message,
        })
    }

    // Decode the instruction at ip and move ip past it. None once the main frame
    // is done.
    fn fetch(&mut self) -> Result<Option<(Opcode, usize)>, VmError> {
        let frame = self.frames.last().ok_or(InternalError::NoFrame)?;
        let instructions = frame.instructions();
        let position = frame.ip;
        let byte = match instructions.get(position) {
            Some(byte) => *byte,
            None => return Ok(None),
        };
        let opcode =
            Opcode::from_byte(byte).ok_or(InternalError::UnknownOpcode { byte, position })?;
        let (operands, read) = read_operands(opcode, &instructions[position + 1..])
            .ok_or(InternalError::TruncatedInstruction { opcode, position })?;
        #[cfg(feature = "trace")]
        {
            eprint!("[ ");
            for value in &self.stack[..self.sp] {
                eprint!("{} ", value)
            }
            eprintln!("]");
            eprintln!("{}", instructions.disassemble_instruction(position));
        }
        self.frame_mut()?.ip = position + 1 + read;
        Ok(Some((opcode, operands.first().copied().unwrap_or(0))))
    }

    fn execute(&mut self, opcode: Opcode, operand: usize) -> Result<(), VmError> {
        match opcode {
            Opcode::Constant => {
                let constant = self
                    .constants
                    .get(operand)
                    .cloned()
                    .ok_or(InternalError::MissingConstant(operand))?;
                self.push(constant)
            }
            Opcode::True => self.push(Value::Boolean(true)),
            Opcode::False => self.push(Value::Boolean(false)),
            Opcode::Null => self.push(Value::Null),
            Opcode::Pop => self.pop().map(drop),
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div => {
                self.execute_arithmetic(opcode)
            }
            Opcode::Equal | Opcode::NotEqual => {
                let right = self.pop()?;
                let left = self.pop()?;
                let equal = left.same(&right);
                self.push(Value::Boolean(equal == (opcode == Opcode::Equal)))
            }
            Opcode::Greater => integer_comparison!(self, >, ">"),
            Opcode::GreaterEqual => integer_comparison!(self, >=, ">="),
            Opcode::Minus => match self.pop()? {
                Value::Integer(i) => self.push(Value::Integer(i.wrapping_neg())),
                other => Err(VmError::UnsupportedOperand {
                    operator: "-",
                    operand: other.type_name(),
                }),
            },
            Opcode::Bang => match self.pop()? {
                Value::Boolean(b) => self.push(Value::Boolean(!b)),
                other => Err(VmError::UnsupportedOperand {
                    operator: "!",
                    operand: other.type_name(),
                }),
            },
            Opcode::Jump => {
                self.frame_mut()?.ip = operand;
                Ok(())
            }
            Opcode::JumpNotTrue => match self.pop()? {
                Value::Boolean(true) => Ok(()),
                Value::Boolean(false) => {
                    self.frame_mut()?.ip = operand;
                    Ok(())
                }
                other => Err(VmError::NonBooleanCondition(other.type_name())),
            },
            Opcode::SetGlobal => {
                let value = self.pop()?;
                let slot = self
                    .globals
                    .get_mut(operand)
                    .ok_or(VmError::GlobalOutOfRange(operand))?;
                *slot = Some(value);
                Ok(())
            }
            Opcode::GetGlobal => {
                let value = self
                    .globals
                    .get(operand)
                    .ok_or(VmError::GlobalOutOfRange(operand))?
                    .clone()
                    .ok_or(VmError::UnsetGlobal(operand))?;
                self.push(value)
            }
            Opcode::Array => {
                let elements = self.pop_many(operand)?;
                self.push(Value::array(elements))
            }
            Opcode::Map => {
                let mut items = self.pop_many(operand * 2)?.into_iter();
                let mut pairs = Vec::with_capacity(operand);
                while let (Some(key), Some(value)) = (items.next(), items.next()) {
                    pairs.push((key, value));
                }
                let map = Value::map(pairs).map_err(|key| VmError::UnhashableKey(key.type_name()))?;
                self.push(map)
            }
            Opcode::Index => {
                let index = self.pop()?;
                let container = self.pop()?;
                let element = index_value(&container, &index)?;
                self.push(element)
            }
        }
    }

    fn execute_arithmetic(&mut self, opcode: Opcode) -> Result<(), VmError> {
        let right = self.pop()?;
        let left = self.pop()?;
        let result = match (&left, &right, opcode) {
            (Value::Integer(a), Value::Integer(b), Opcode::Add) => {
                Value::Integer(a.wrapping_add(*b))
            }
            (Value::Integer(a), Value::Integer(b), Opcode::Sub) => {
                Value::Integer(a.wrapping_sub(*b))
            }
            (Value::Integer(a), Value::Integer(b), Opcode::Mul) => {
                Value::Integer(a.wrapping_mul(*b))
            }
            (Value::Integer(_), Value::Integer(0), Opcode::Div) => {
                return Err(VmError::DivisionByZero)
            }
            (Value::Integer(a), Value::Integer(b), Opcode::Div) => {
                Value::Integer(a.wrapping_div(*b))
            }
            _ => match (left.as_str(), right.as_str(), opcode) {
                (Some(a), Some(b), Opcode::Add) => Value::string([a, b].concat()),
                _ => {
                    return Err(VmError::TypeMismatch {
                        operator: arithmetic_symbol(opcode),
                        left: left.type_name(),
                        right: right.type_name(),
                    })
                }
            },
        };
        self.push(result)
    }

    fn frame_mut(&mut self) -> Result<&mut Frame, InternalError> {
        self.frames.last_mut().ok_or(InternalError::NoFrame)
    }

    fn push(&mut self, value: Value) -> Result<(), VmError> {
        if self.sp >= STACK_SIZE {
            Err(VmError::StackOverflow)
        } else {
            self.stack[self.sp] = value;
            self.sp += 1;
            Ok(())
        }
    }

    fn pop(&mut self) -> Result<Value, VmError> {
        if self.sp == 0 {
            return Err(InternalError::EmptyStack.into());
        }
        self.sp -= 1;
        Ok(self.stack[self.sp].clone())
    }

    // The top `n` values in push order.
    fn pop_many(&mut self, n: usize) -> Result<Vec<Value>, VmError> {
        let start = self.sp.checked_sub(n).ok_or(InternalError::EmptyStack)?;
        let values = self.stack[start..self.sp].to_vec();
        self.sp = start;
        Ok(values)
    }
}

fn arithmetic_symbol(opcode: Opcode) -> &'static str {
    match opcode {
        Opcode::Add => "+",
        Opcode::Sub => "-",
        Opcode::Mul => "*",
        Opcode::Div => "/",
        _ => opcode.name(),
    }
}

fn index_value(container: &Value, index: &Value) -> Result<Value, VmError> {
    let not_supported = || VmError::IndexNotSupported {
        container: container.type_name(),
        index: index.type_name(),
    };
    let object = match container {
        Value::Object(object) => object,
        _ => return Err(not_supported()),
    };
    match (&**object, index) {
        (Object::Array(elements), Value::Integer(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| elements.get(i))
            .cloned()
            .ok_or(VmError::IndexOutOfRange {
                index: *i,
                length: elements.len(),
            }),
        (Object::Map(entries), _) => {
            let key = index
                .hash_key()
                .ok_or_else(|| VmError::UnhashableKey(index.type_name()))?;
            Ok(entries
                .get(&key)
                .map_or(Value::Null, |entry| entry.value.clone()))
        }
        _ => Err(not_supported()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn run(instructions: Vec<Vec<u8>>, constants: Vec<Value>) -> (Vm, Result<(), VmError>) {
        let bytecode = Bytecode {
            instructions: instructions.into_iter().collect(),
            constants,
        };
        let mut vm = Vm::new(bytecode);
        let result = vm.run();
        (vm, result)
    }

    #[test]
    fn test_arithmetic_and_last_popped() {
        let (vm, result) = run(
            vec![
                make(Opcode::Constant, &[0]),
                make(Opcode::Constant, &[1]),
                make(Opcode::Sub, &[]),
                make(Opcode::Pop, &[]),
            ],
            vec![10.into(), 4.into()],
        );
        assert_eq!(result, Ok(()));
        assert_eq!(vm.last_popped(), Value::Integer(6));
        assert_eq!(vm.stack_top(), None);
    }

    #[test]
    fn test_integer_overflow_wraps() {
        let (vm, result) = run(
            vec![
                make(Opcode::Constant, &[0]),
                make(Opcode::Constant, &[1]),
                make(Opcode::Add, &[]),
            ],
            vec![i64::MAX.into(), 1.into()],
        );
        assert_eq!(result, Ok(()));
        assert_eq!(vm.stack_top(), Some(&Value::Integer(i64::MIN)));
    }

    #[test]
    fn test_arithmetic_errors() {
        let (_, result) = run(
            vec![
                make(Opcode::Constant, &[0]),
                make(Opcode::Constant, &[1]),
                make(Opcode::Div, &[]),
            ],
            vec![1.into(), 0.into()],
        );
        assert_eq!(result, Err(VmError::DivisionByZero));

        let (_, result) = run(
            vec![
                make(Opcode::Constant, &[0]),
                make(Opcode::Constant, &[1]),
                make(Opcode::Add, &[]),
            ],
            vec![1.into(), "a".into()],
        );
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "unsupported types for +: INTEGER and STRING");

        let (_, result) = run(
            vec![
                make(Opcode::Constant, &[0]),
                make(Opcode::Constant, &[0]),
                make(Opcode::Mul, &[]),
            ],
            vec!["a".into()],
        );
        assert!(matches!(result, Err(VmError::TypeMismatch { operator: "*", .. })));
    }

    #[test]
    fn test_equality() {
        let cases = [
            (vec![make(Opcode::True, &[]), make(Opcode::True, &[])], true),
            (vec![make(Opcode::True, &[]), make(Opcode::False, &[])], false),
            (vec![make(Opcode::Null, &[]), make(Opcode::Null, &[])], true),
            (vec![make(Opcode::Null, &[]), make(Opcode::False, &[])], false),
            (vec![make(Opcode::Constant, &[0]), make(Opcode::Constant, &[1])], true),
            (vec![make(Opcode::Constant, &[0]), make(Opcode::Constant, &[2])], false),
        ];
        for (operands, expected) in cases {
            for (opcode, expected) in [(Opcode::Equal, expected), (Opcode::NotEqual, !expected)] {
                let mut instructions = operands.clone();
                instructions.push(make(opcode, &[]));
                let (vm, result) = run(instructions, vec!["x".into(), "x".into(), 1.into()]);
                assert_eq!(result, Ok(()));
                assert_eq!(
                    vm.stack_top(),
                    Some(&Value::Boolean(expected)),
                    "{} on {:?}",
                    opcode,
                    operands
                );
            }
        }
    }

    #[test]
    fn test_unary_operators() {
        let (vm, result) = run(
            vec![make(Opcode::Constant, &[0]), make(Opcode::Minus, &[])],
            vec![5.into()],
        );
        assert_eq!(result, Ok(()));
        assert_eq!(vm.stack_top(), Some(&Value::Integer(-5)));

        let (_, result) = run(vec![make(Opcode::Null, &[]), make(Opcode::Bang, &[])], vec![]);
        assert_eq!(
            result,
            Err(VmError::UnsupportedOperand {
                operator: "!",
                operand: "NULL"
            })
        );
    }

    #[test]
    fn test_jumps() {
        // false ? 1 : 2, laid out as the compiler does.
        let (vm, result) = run(
            vec![
                make(Opcode::False, &[]),         // 0000
                make(Opcode::JumpNotTrue, &[10]), // 0001
                make(Opcode::Constant, &[0]),     // 0004
                make(Opcode::Jump, &[13]),        // 0007
                make(Opcode::Constant, &[1]),     // 0010
                make(Opcode::Pop, &[]),           // 0013
            ],
            vec![1.into(), 2.into()],
        );
        assert_eq!(result, Ok(()));
        assert_eq!(vm.last_popped(), Value::Integer(2));

        let (_, result) = run(
            vec![make(Opcode::Null, &[]), make(Opcode::JumpNotTrue, &[0])],
            vec![],
        );
        assert_eq!(result, Err(VmError::NonBooleanCondition("NULL")));
    }

    #[test]
    fn test_globals() {
        let (vm, result) = run(
            vec![
                make(Opcode::Constant, &[0]),
                make(Opcode::SetGlobal, &[3]),
                make(Opcode::GetGlobal, &[3]),
                make(Opcode::Pop, &[]),
            ],
            vec![7.into()],
        );
        assert_eq!(result, Ok(()));
        assert_eq!(vm.last_popped(), Value::Integer(7));
        let globals = vm.into_globals();
        assert_eq!(globals[3], Some(Value::Integer(7)));

        let bytecode = Bytecode {
            instructions: make(Opcode::GetGlobal, &[3]).into(),
            constants: vec![],
        };
        let mut vm = Vm::new_with_state(bytecode, globals, Builtins::standard());
        assert_eq!(vm.run(), Ok(()));
        assert_eq!(vm.stack_top(), Some(&Value::Integer(7)));

        let (_, result) = run(vec![make(Opcode::GetGlobal, &[0])], vec![]);
        assert_eq!(result, Err(VmError::UnsetGlobal(0)));
    }

    #[test]
    fn test_global_slot_out_of_range() {
        let (vm, result) = run(
            vec![
                make(Opcode::True, &[]),
                make(Opcode::SetGlobal, &[GLOBALS_SIZE]),
            ],
            vec![],
        );
        assert_eq!(result, Err(VmError::GlobalOutOfRange(6048)));
        assert_eq!(vm.globals().len(), GLOBALS_SIZE);

        let (_, result) = run(vec![make(Opcode::GetGlobal, &[GLOBALS_SIZE])], vec![]);
        assert_eq!(result, Err(VmError::GlobalOutOfRange(6048)));
        assert_eq!(
            result.unwrap_err().to_string(),
            "global slot 6048 out of range"
        );
    }

    #[test]
    fn test_only_main_frame() {
        let vm = Vm::new(Bytecode::default());
        assert_eq!(vm.frames.len(), 1);
        assert!(vm.frames.capacity() >= MAX_FRAMES);
    }

    #[test]
    fn test_aggregates_and_index() {
        let (vm, result) = run(
            vec![
                make(Opcode::Constant, &[0]),
                make(Opcode::Constant, &[1]),
                make(Opcode::Constant, &[2]),
                make(Opcode::Map, &[1]),
                make(Opcode::Array, &[2]),
                make(Opcode::Constant, &[0]),
                make(Opcode::Index, &[]),
            ],
            vec![1.into(), "k".into(), true.into()],
        );
        assert_eq!(result, Ok(()));
        let expected = Value::map(vec![("k".into(), true.into())]).expect("hashable");
        assert_eq!(vm.stack_top(), Some(&expected));

        let (_, result) = run(
            vec![
                make(Opcode::Constant, &[0]),
                make(Opcode::Array, &[1]),
                make(Opcode::Constant, &[1]),
                make(Opcode::Index, &[]),
            ],
            vec![1.into(), (-1).into()],
        );
        assert_eq!(
            result,
            Err(VmError::IndexOutOfRange {
                index: -1,
                length: 1
            })
        );

        let (_, result) = run(
            vec![
                make(Opcode::Array, &[0]),
                make(Opcode::True, &[]),
                make(Opcode::Map, &[1]),
            ],
            vec![],
        );
        assert_eq!(result, Err(VmError::UnhashableKey("ARRAY")));

        let (_, result) = run(
            vec![make(Opcode::Constant, &[0]), make(Opcode::True, &[]), make(Opcode::Index, &[])],
            vec![1.into()],
        );
        assert_eq!(
            result,
            Err(VmError::IndexNotSupported {
                container: "INTEGER",
                index: "BOOLEAN"
            })
        );
    }

    #[test]
    fn test_map_miss_is_null() {
        let (vm, result) = run(
            vec![
                make(Opcode::Map, &[0]),
                make(Opcode::Constant, &[0]),
                make(Opcode::Index, &[]),
            ],
            vec![1.into()],
        );
        assert_eq!(result, Ok(()));
        assert_eq!(vm.stack_top(), Some(&Value::Null));
    }

    #[test]
    fn test_stack_limits() {
        let instructions = (0..=STACK_SIZE).map(|_| make(Opcode::Null, &[])).collect();
        let (_, result) = run(instructions, vec![]);
        assert_eq!(result, Err(VmError::StackOverflow));

        let (_, result) = run(vec![make(Opcode::Pop, &[])], vec![]);
        assert_eq!(result, Err(InternalError::EmptyStack.into()));
    }

    #[test]
    fn test_malformed_bytecode() {
        let (_, result) = run(vec![vec![250]], vec![]);
        assert_eq!(
            result,
            Err(InternalError::UnknownOpcode {
                byte: 250,
                position: 0
            }
            .into())
        );
        let (_, result) = run(vec![vec![Opcode::Constant as u8, 0]], vec![]);
        assert!(matches!(
            result,
            Err(VmError::InternalError(InternalError::TruncatedInstruction { .. }))
        ));
        let (_, result) = run(vec![make(Opcode::Constant, &[9])], vec![]);
        assert_eq!(result, Err(InternalError::MissingConstant(9).into()));
    }

    #[test]
    fn test_call_builtin() {
        let vm = Vm::new(Bytecode::default());
        let array = Value::array(vec![1.into(), 2.into()]);
        assert_eq!(vm.call_builtin("len", &[array]), Ok(2.into()));
        assert_eq!(
            vm.call_builtin("nope", &[]),
            Err(VmError::UnknownBuiltin(String::from("nope")))
        );
        let err = vm.call_builtin("len", &[]).unwrap_err();
        assert_eq!(err.to_string(), "len: wrong number of arguments. got=0, want=1");
    }
}
