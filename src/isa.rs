//! Types for representing ZAX instructions: opcodes, addressing modes and
//! their two-digit numeric coding.

use std::fmt;

/// Machine word. Data memory, the accumulator and every bus carry these.
pub type Word = i32;

/// Instructions of the ZAX architecture.
///
/// The mnemonic strings returned by [`Opcode::mnemonic`] are the canonical
/// vocabulary used in assembly sources and in the program document.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Adds one to the accumulator.
    Inc,

    /// Subtracts one from the accumulator.
    Dec,

    /// Clears the accumulator to zero (and therefore sets the zero flag).
    Cls,

    /// Negates the accumulator.
    Neg,

    /// Adds the operand to the accumulator.
    Add,

    /// Subtracts the operand from the accumulator.
    Sub,

    /// Reads one value from the primary input stream into the accumulator.
    Input,

    /// Appends the accumulator to the primary output stream.
    Output,

    /// Copies the operand into the accumulator.
    Load,

    /// Stores the accumulator at the operand's address.
    Store,

    /// Unconditional jump.
    Jmp,

    /// Jump taken only when the zero flag is set.
    Jmpz,

    /// Stops the machine.
    Hlt,

    /// Appends the accumulator to port 1's outgoing queue.
    Port1Out,

    /// Appends the accumulator to port 2's outgoing queue.
    Port2Out,

    /// Reads one value from port 1's incoming queue into the accumulator.
    Port1In,

    /// Reads one value from port 2's incoming queue into the accumulator.
    Port2In,
}

/// Addressing modes of the ZAX architecture.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AddressMode {
    /// The instruction has no operand.
    NoOperand,

    /// The argument itself is the operand.
    Direct,

    /// The argument is the address of a label; the address itself is the
    /// operand.
    LabelAddr,

    /// The argument is the address of a label; the value stored there is the
    /// operand.
    LabelVal,

    /// The argument is the address of a cell holding the operand's address.
    Indirect,
}

/// Opcodes in encoding order. An instruction's numeric code is
/// `opcode_index * 10 + mode_index` over this table and [`MODE_ORDER`].
pub const OPCODE_ORDER: [Opcode; 17] = [
    Opcode::Inc,
    Opcode::Dec,
    Opcode::Cls,
    Opcode::Neg,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Input,
    Opcode::Output,
    Opcode::Load,
    Opcode::Store,
    Opcode::Jmp,
    Opcode::Jmpz,
    Opcode::Hlt,
    Opcode::Port1Out,
    Opcode::Port2Out,
    Opcode::Port1In,
    Opcode::Port2In,
];

/// Addressing modes in encoding order.
pub const MODE_ORDER: [AddressMode; 5] = [
    AddressMode::NoOperand,
    AddressMode::Direct,
    AddressMode::LabelAddr,
    AddressMode::LabelVal,
    AddressMode::Indirect,
];

/// The legal addressing modes for every opcode.
///
/// Also fixes the order in which the microcode generator lays out the
/// per-instruction blocks.
pub const LEGAL_MODES: [(Opcode, &[AddressMode]); 17] = [
    (Opcode::Inc, &[AddressMode::NoOperand]),
    (Opcode::Dec, &[AddressMode::NoOperand]),
    (Opcode::Cls, &[AddressMode::NoOperand]),
    (Opcode::Neg, &[AddressMode::NoOperand]),
    (Opcode::Hlt, &[AddressMode::NoOperand]),
    (Opcode::Input, &[AddressMode::NoOperand]),
    (Opcode::Port1In, &[AddressMode::NoOperand]),
    (Opcode::Port2In, &[AddressMode::NoOperand]),
    (Opcode::Output, &[AddressMode::NoOperand]),
    (Opcode::Port1Out, &[AddressMode::NoOperand]),
    (Opcode::Port2Out, &[AddressMode::NoOperand]),
    (
        Opcode::Load,
        &[
            AddressMode::Direct,
            AddressMode::LabelVal,
            AddressMode::LabelAddr,
            AddressMode::Indirect,
        ],
    ),
    (Opcode::Store, &[AddressMode::LabelVal, AddressMode::Indirect]),
    (Opcode::Add, &[AddressMode::LabelVal, AddressMode::Direct]),
    (Opcode::Sub, &[AddressMode::LabelVal, AddressMode::Direct]),
    (Opcode::Jmp, &[AddressMode::LabelVal]),
    (Opcode::Jmpz, &[AddressMode::LabelVal]),
];

impl Opcode {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Inc => "inc",
            Opcode::Dec => "dec",
            Opcode::Cls => "cls",
            Opcode::Neg => "neg",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Input => "input",
            Opcode::Output => "output",
            Opcode::Load => "load",
            Opcode::Store => "store",
            Opcode::Jmp => "jmp",
            Opcode::Jmpz => "jmpz",
            Opcode::Hlt => "hlt",
            Opcode::Port1Out => "port1_out",
            Opcode::Port2Out => "port2_out",
            Opcode::Port1In => "port1_in",
            Opcode::Port2In => "port2_in",
        }
    }

    pub fn from_mnemonic(name: &str) -> Option<Opcode> {
        OPCODE_ORDER.iter().copied().find(|op| op.mnemonic() == name)
    }

    fn index(&self) -> usize {
        OPCODE_ORDER
            .iter()
            .position(|op| op == self)
            .expect("opcode missing from encoding order")
    }

    /// The legal addressing modes of this opcode.
    pub fn legal_modes(&self) -> &'static [AddressMode] {
        LEGAL_MODES
            .iter()
            .find(|(op, _)| op == self)
            .map(|(_, modes)| *modes)
            .expect("opcode missing from the legality table")
    }
}

impl AddressMode {
    pub fn name(&self) -> &'static str {
        match self {
            AddressMode::NoOperand => "no_op",
            AddressMode::Direct => "direct_addr",
            AddressMode::LabelAddr => "label_addr",
            AddressMode::LabelVal => "label_val",
            AddressMode::Indirect => "indirect_addr",
        }
    }

    pub fn from_name(name: &str) -> Option<AddressMode> {
        MODE_ORDER.iter().copied().find(|mode| mode.name() == name)
    }

    fn index(&self) -> usize {
        MODE_ORDER
            .iter()
            .position(|mode| mode == self)
            .expect("addressing mode missing from encoding order")
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

impl fmt::Display for AddressMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Returns `true` if `mode` is a legal addressing mode for `opcode`.
pub fn is_legal(opcode: Opcode, mode: AddressMode) -> bool {
    opcode.legal_modes().contains(&mode)
}

/// Encodes an (opcode, addressing mode) pair into its numeric code.
///
/// # Panics
/// Panics if the pair is not present in the legality table. Encoding an
/// illegal pair is a programming error, not an input error.
pub fn encode(opcode: Opcode, mode: AddressMode) -> u8 {
    if !is_legal(opcode, mode) {
        panic!("illegal instruction {} {}", opcode, mode);
    }

    (opcode.index() * 10 + mode.index()) as u8
}

/// Decodes a numeric instruction code back into its (opcode, addressing
/// mode) pair. Exact inverse of [`encode`].
///
/// # Panics
/// Panics if the code does not correspond to a legal pair; such a code can
/// only come from a corrupted instruction register or decode table.
pub fn decode(code: u8) -> (Opcode, AddressMode) {
    let opcode = match OPCODE_ORDER.get(code as usize / 10) {
        Some(op) => *op,
        None => panic!("invalid instruction code {}", code),
    };
    let mode = match MODE_ORDER.get(code as usize % 10) {
        Some(mode) => *mode,
        None => panic!("invalid instruction code {}", code),
    };

    if !is_legal(opcode, mode) {
        panic!("invalid instruction code {} ({} {})", code, opcode, mode);
    }

    (opcode, mode)
}

/// A single decoded instruction as stored in code memory.
#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub mode: AddressMode,
    pub arg: Word,
}

impl Instruction {
    pub fn new(opcode: Opcode, mode: AddressMode, arg: Word) -> Instruction {
        Instruction { opcode, mode, arg }
    }

    /// The instruction's numeric code, as latched into the instruction
    /// register.
    pub fn code(&self) -> u8 {
        encode(self.opcode, self.mode)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.opcode, self.mode, self.arg)
    }
}
