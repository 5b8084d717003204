use std::fmt::{Display, Write};
use std::ops::Deref;

/// Opcodes the VM understands. Each is a single byte followed by operands whose
/// widths are fixed per opcode (see [`Opcode::operand_widths`]); operands are
/// big-endian.
///
/// `<` and `<=` have no opcode of their own: the compiler swaps the operands and
/// emits `Greater`/`GreaterEqual`.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Opcode {
    /// Push `constants[idx]`. Operand: u16 constant index.
    Constant,
    /// Push true.
    True,
    /// Push false.
    False,
    /// Push null.
    Null,
    /// Discard the top value (it stays readable as the last popped value).
    Pop,
    /// If stack is TOP: b, a ..., pop two and push (a+b)
    Add,
    /// If stack is TOP: b, a ..., pop two and push (a-b)
    Sub,
    /// If stack is TOP: b, a ..., pop two and push (a*b)
    Mul,
    /// If stack is TOP: b, a ..., pop two and push (a/b)
    Div,
    /// Pop two and push whether they are equal
    Equal,
    /// Pop two and push whether they differ
    NotEqual,
    /// If stack is TOP: b, a, ..., push the bool a>b
    Greater,
    /// If stack is TOP: b, a, ..., push the bool a>=b
    GreaterEqual,
    /// Arithmetic negation of the top value
    Minus,
    /// Logical negation of the top value
    Bang,
    /// Continue at an absolute byte offset. Operand: u16 target.
    Jump,
    /// Pop a boolean; continue at the target if it is false. Operand: u16 target.
    JumpNotTrue,
    /// Pop into a global slot. Operand: u16 slot.
    SetGlobal,
    /// Push a global slot. Operand: u16 slot.
    GetGlobal,
    /// Pop n values and push them as an array. Operand: u16 n.
    Array,
    /// Pop n key/value pairs and push them as a map. Operand: u16 n.
    Map,
    /// If stack is TOP: index, container ..., pop two and push container[index]
    Index,
}

impl Opcode {
    const ALL: [Opcode; 22] = [
        Opcode::Constant,
        Opcode::True,
        Opcode::False,
        Opcode::Null,
        Opcode::Pop,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Equal,
        Opcode::NotEqual,
        Opcode::Greater,
        Opcode::GreaterEqual,
        Opcode::Minus,
        Opcode::Bang,
        Opcode::Jump,
        Opcode::JumpNotTrue,
        Opcode::SetGlobal,
        Opcode::GetGlobal,
        Opcode::Array,
        Opcode::Map,
        Opcode::Index,
    ];

    /// Decode an opcode byte.
    pub fn from_byte(byte: u8) -> Option<Opcode> {
        Self::ALL.get(usize::from(byte)).copied()
    }

    /// Name used in disassembly, e.g. `OpConstant`.
    pub fn name(&self) -> &'static str {
        match self {
            Opcode::Constant => "OpConstant",
            Opcode::True => "OpTrue",
            Opcode::False => "OpFalse",
            Opcode::Null => "OpNull",
            Opcode::Pop => "OpPop",
            Opcode::Add => "OpAdd",
            Opcode::Sub => "OpSub",
            Opcode::Mul => "OpMul",
            Opcode::Div => "OpDiv",
            Opcode::Equal => "OpEqual",
            Opcode::NotEqual => "OpNotEqual",
            Opcode::Greater => "OpGreater",
            Opcode::GreaterEqual => "OpGreaterEqual",
            Opcode::Minus => "OpMinus",
            Opcode::Bang => "OpBang",
            Opcode::Jump => "OpJump",
            Opcode::JumpNotTrue => "OpJumpNotTrue",
            Opcode::SetGlobal => "OpSetGlobal",
            Opcode::GetGlobal => "OpGetGlobal",
            Opcode::Array => "OpArray",
            Opcode::Map => "OpMap",
            Opcode::Index => "OpIndex",
        }
    }

    /// Byte width of each operand.
    pub fn operand_widths(&self) -> &'static [usize] {
        match self {
            Opcode::Constant
            | Opcode::Jump
            | Opcode::JumpNotTrue
            | Opcode::SetGlobal
            | Opcode::GetGlobal
            | Opcode::Array
            | Opcode::Map => &[2],
            _ => &[],
        }
    }

    /// Number of bytes in the encoded instruction, opcode included.
    pub fn num_bytes(&self) -> usize {
        1 + self.operand_widths().iter().sum::<usize>()
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Encode one instruction. Each operand is written big-endian over its declared
/// width; missing operands encode as zero and extra ones are ignored.
pub fn make(opcode: Opcode, operands: &[usize]) -> Vec<u8> {
    let mut instruction = Vec::with_capacity(opcode.num_bytes());
    instruction.push(opcode as u8);
    for (i, width) in opcode.operand_widths().iter().enumerate() {
        let operand = operands.get(i).copied().unwrap_or(0);
        let bytes = operand.to_be_bytes();
        instruction.extend_from_slice(&bytes[bytes.len() - width..]);
    }
    instruction
}

/// Read an unsigned big-endian u16 from the start of `bytes`.
pub fn read_u16(bytes: &[u8]) -> Option<u16> {
    match bytes {
        [hi, lo, ..] => Some(u16::from_be_bytes([*hi, *lo])),
        _ => None,
    }
}

/// Decode the operands following an opcode, returning them with the number of
/// bytes they occupied, or `None` if `bytes` is too short.
pub fn read_operands(opcode: Opcode, bytes: &[u8]) -> Option<(Vec<usize>, usize)> {
    let mut operands = Vec::with_capacity(opcode.operand_widths().len());
    let mut offset = 0;
    for width in opcode.operand_widths() {
        let operand = match width {
            2 => usize::from(read_u16(bytes.get(offset..)?)?),
            _ => usize::from(*bytes.get(offset)?),
        };
        operands.push(operand);
        offset += width;
    }
    Some((operands, offset))
}

/// A flat buffer of encoded instructions. Positions are byte offsets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instructions(Vec<u8>);

impl Instructions {
    /// An empty buffer.
    pub fn new() -> Self {
        Instructions(Vec::new())
    }

    /// Append an encoded instruction, returning the position it starts at.
    pub fn push(&mut self, instruction: &[u8]) -> usize {
        let position = self.0.len();
        self.0.extend_from_slice(instruction);
        position
    }

    /// Drop everything from `position` on.
    pub fn truncate(&mut self, position: usize) {
        self.0.truncate(position);
    }

    /// Overwrite bytes in place starting at `position`.
    pub fn replace(&mut self, position: usize, instruction: &[u8]) {
        self.0[position..position + instruction.len()].copy_from_slice(instruction);
    }

    /// Disassemble the single instruction at `position`.
    pub fn disassemble_instruction(&self, position: usize) -> String {
        let opcode = match self.0.get(position).and_then(|b| Opcode::from_byte(*b)) {
            Some(opcode) => opcode,
            None => return format!("{:04} unknown instruction", position),
        };
        match read_operands(opcode, &self.0[position + 1..]) {
            Some((operands, _)) => {
                let mut ret = format!("{:04} {}", position, opcode);
                for operand in operands {
                    write!(&mut ret, " {}", operand).expect("writing to string");
                }
                ret
            }
            None => format!("{:04} {} <truncated>", position, opcode),
        }
    }

    /// Return a human-readable listing, one instruction per line.
    pub fn disassemble(&self, title: &str) -> String {
        format!("== {} ==\n{}", title, self)
    }
}

impl Deref for Instructions {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Instructions {
    fn from(bytes: Vec<u8>) -> Self {
        Instructions(bytes)
    }
}

impl FromIterator<Vec<u8>> for Instructions {
    fn from_iter<I: IntoIterator<Item = Vec<u8>>>(iter: I) -> Self {
        Instructions(iter.into_iter().flatten().collect())
    }
}

impl Display for Instructions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut position = 0;
        while position < self.0.len() {
            writeln!(f, "{}", self.disassemble_instruction(position))?;
            position += self
                .0
                .get(position)
                .and_then(|b| Opcode::from_byte(*b))
                .map_or(1, |op| op.num_bytes());
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_make() {
        assert_eq!(make(Opcode::Constant, &[65534]), vec![Opcode::Constant as u8, 255, 254]);
        assert_eq!(make(Opcode::Add, &[]), vec![Opcode::Add as u8]);
        assert_eq!(make(Opcode::Jump, &[258]), vec![Opcode::Jump as u8, 1, 2]);
    }

    #[test]
    fn test_opcode_bytes_round_trip() {
        for (i, opcode) in Opcode::ALL.iter().enumerate() {
            assert_eq!(*opcode as usize, i);
            assert_eq!(Opcode::from_byte(i as u8), Some(*opcode));
        }
        assert_eq!(Opcode::from_byte(200), None);
    }

    #[test]
    fn test_read_operands() {
        let instruction = make(Opcode::GetGlobal, &[65535]);
        let (operands, read) =
            read_operands(Opcode::GetGlobal, &instruction[1..]).expect("complete");
        assert_eq!(operands, vec![65535]);
        assert_eq!(read, 2);
        assert_eq!(read_u16(&[0x01]), None);
        assert_eq!(read_operands(Opcode::Constant, &[0x01]), None);
    }

    #[test]
    fn test_disassemble() {
        let instructions: Instructions = vec![
            make(Opcode::Add, &[]),
            make(Opcode::GetGlobal, &[2]),
            make(Opcode::Constant, &[65535]),
            make(Opcode::JumpNotTrue, &[1]),
        ]
        .into_iter()
        .collect();
        let expected = "0000 OpAdd\n\
                        0001 OpGetGlobal 2\n\
                        0004 OpConstant 65535\n\
                        0007 OpJumpNotTrue 1\n";
        assert_eq!(instructions.to_string(), expected);
        assert!(instructions.disassemble("main").starts_with("== main ==\n0000 OpAdd"));
    }

    #[test]
    fn test_replace_and_truncate() {
        let mut instructions = Instructions::new();
        instructions.push(&make(Opcode::True, &[]));
        let jump = instructions.push(&make(Opcode::Jump, &[0]));
        instructions.push(&make(Opcode::Pop, &[]));
        instructions.replace(jump, &make(Opcode::Jump, &[4]));
        assert_eq!(&instructions[jump..jump + 3], &[Opcode::Jump as u8, 0, 4]);
        instructions.truncate(jump + 3);
        assert_eq!(instructions.len(), 4);
    }
}
