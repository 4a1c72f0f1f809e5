//! The symbolic micro-program templates.
//!
//! Each template is a sequence of micro-instructions, each micro-instruction
//! a set of simultaneously driven control lines. An instruction's complete
//! micro-program is its addressing-mode template followed by its operation
//! template; the addressing part leaves the operand on the ALU mux and the
//! operand's address in the address register.

use crate::isa::{AddressMode, Opcode};

use super::Ctl::{self, *};

/// Executed whenever the micro-PC returns to offset zero: latches the
/// instruction pointer (which fetches and stages the next instruction word)
/// and the instruction register, then jumps the micro-PC to the fetched
/// instruction's block.
pub(super) const BOOTSTRAP: &[&[Ctl]] = &[&[LatchIp, LatchIr, MpcDecode, LatchMpc]];

const ALU_OPERATION: &[&[Ctl]] = &[&[
    SelIp,
    HoldSelAddr,
    HoldSelAlu,
    HoldSelAluInput,
    DoAlu,
    LatchAcc,
    LatchMpc,
]];

const STORE: &[&[Ctl]] = &[&[
    SelIp,
    HoldSelAddr,
    HoldSelAlu,
    HoldSelAluInput,
    MemWrite,
    LatchMpc,
]];

// jmp drives neither sel-IP nor sel-jmp-type, so the IP mux falls through to
// the staged jump target. jmpz routes the select through the zero flag.
const JMP: &[&[Ctl]] = &[&[HoldSelAddr, HoldSelAlu, HoldSelAluInput, LatchMpc]];

const JMPZ: &[&[Ctl]] = &[&[
    SelJmpType,
    HoldSelAddr,
    HoldSelAlu,
    HoldSelAluInput,
    LatchMpc,
]];

const INPUT: &[&[Ctl]] = &[&[
    SelIp,
    HoldSelAddr,
    HoldSelAlu,
    SelAluInput,
    DoAlu,
    LatchAcc,
    LatchMpc,
]];

const PORT1_IN: &[&[Ctl]] = &[&[
    SelIp,
    HoldSelAddr,
    HoldSelAlu,
    Port1In,
    DoAlu,
    LatchAcc,
    LatchMpc,
]];

const PORT2_IN: &[&[Ctl]] = &[&[
    SelIp,
    HoldSelAddr,
    HoldSelAlu,
    Port2In,
    DoAlu,
    LatchAcc,
    LatchMpc,
]];

const OUTPUT: &[&[Ctl]] = &[&[
    SelIp,
    HoldSelAddr,
    HoldSelAlu,
    HoldSelAluInput,
    Output,
    LatchMpc,
]];

const PORT1_OUT: &[&[Ctl]] = &[&[
    SelIp,
    HoldSelAddr,
    HoldSelAlu,
    HoldSelAluInput,
    Port1Out,
    LatchMpc,
]];

const PORT2_OUT: &[&[Ctl]] = &[&[
    SelIp,
    HoldSelAddr,
    HoldSelAlu,
    HoldSelAluInput,
    Port2Out,
    LatchMpc,
]];

/// hlt has no micro-program at all: latching it into the instruction
/// register is itself the halt signal.
const HLT: &[&[Ctl]] = &[];

/// Stages the cell addressed by the argument onto the ALU mux.
const LABEL_VAL: &[&[Ctl]] = &[&[SelAddr, LatchAddr, MemRead, SelAlu, MpcNext, LatchMpc]];

/// First word reads the pointer cell; the second word's sel-ADDR is driven
/// low so the address register latches the value just read, then the final
/// read stages the operand.
const INDIRECT: &[&[Ctl]] = &[
    &[SelAddr, LatchAddr, MemRead, MpcNext, LatchMpc],
    &[LatchAddr, MemRead, SelAlu, MpcNext, LatchMpc],
];

/// No-operand and direct modes need no addressing work: the fetch already
/// staged the argument on every mux that could want it.
const NO_WORK: &[&[Ctl]] = &[];

pub(super) fn operation(opcode: Opcode) -> &'static [&'static [Ctl]] {
    match opcode {
        Opcode::Inc
        | Opcode::Dec
        | Opcode::Cls
        | Opcode::Neg
        | Opcode::Add
        | Opcode::Sub
        | Opcode::Load => ALU_OPERATION,
        Opcode::Store => STORE,
        Opcode::Jmp => JMP,
        Opcode::Jmpz => JMPZ,
        Opcode::Input => INPUT,
        Opcode::Port1In => PORT1_IN,
        Opcode::Port2In => PORT2_IN,
        Opcode::Output => OUTPUT,
        Opcode::Port1Out => PORT1_OUT,
        Opcode::Port2Out => PORT2_OUT,
        Opcode::Hlt => HLT,
    }
}

pub(super) fn addressing(mode: AddressMode) -> &'static [&'static [Ctl]] {
    match mode {
        AddressMode::NoOperand | AddressMode::Direct | AddressMode::LabelAddr => NO_WORK,
        AddressMode::LabelVal => LABEL_VAL,
        AddressMode::Indirect => INDIRECT,
    }
}
