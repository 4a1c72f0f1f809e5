//! The microcode generator: compiles the symbolic control templates into a
//! table of fixed-width binary control words, plus the decode index mapping
//! every legal instruction code to the offset of its first micro-instruction.
//!
//! The table is built once per process (the `MICROCODE` static) and is
//! immutable afterwards. Any inconsistency found while building it is a
//! fatal configuration error and panics before anything executes.

mod templates;

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::isa;

/// Number of control columns in a compiled micro-instruction.
pub const WORD_WIDTH: usize = 17;

/// The physical control columns of a micro-instruction, in the canonical
/// order the control unit applies them within one tick.
///
/// The order matters: the instruction-pointer latch must run (and thereby
/// re-fetch the instruction word) before the instruction-register latch
/// consumes it, mux selects must be driven before the latches they feed,
/// and the micro-PC mode must be staged before the micro-PC latches.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Column {
    LatchIp = 0,
    SelIp,
    SelJmpType,
    LatchIr,
    SelAddr,
    LatchAddr,
    SelAlu,
    SelAluInput,
    DoAlu,
    LatchAcc,
    Output,
    MemWrite,
    MemRead,
    SelMpc,
    LatchMpc,
    Port1Out,
    Port2Out,
}

pub const COLUMN_ORDER: [Column; WORD_WIDTH] = [
    Column::LatchIp,
    Column::SelIp,
    Column::SelJmpType,
    Column::LatchIr,
    Column::SelAddr,
    Column::LatchAddr,
    Column::SelAlu,
    Column::SelAluInput,
    Column::DoAlu,
    Column::LatchAcc,
    Column::Output,
    Column::MemWrite,
    Column::MemRead,
    Column::SelMpc,
    Column::LatchMpc,
    Column::Port1Out,
    Column::Port2Out,
];

/// The symbolic control-line vocabulary the templates are written in.
///
/// Several lines alias the same physical column and differ only in the value
/// they drive: `Port1In`/`Port2In` select the port inputs of the ALU-input
/// mux, and `MpcNext`/`MpcDecode` select the micro-PC advance modes. The
/// `Hold*` variants reproduce a physical latch: the column keeps whatever
/// value the previous micro-instruction carried.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Ctl {
    LatchIp,
    SelIp,
    SelJmpType,
    LatchIr,
    SelAddr,
    HoldSelAddr,
    LatchAddr,
    SelAlu,
    HoldSelAlu,
    SelAluInput,
    HoldSelAluInput,
    Port1In,
    Port2In,
    DoAlu,
    LatchAcc,
    Output,
    MemWrite,
    MemRead,
    MpcNext,
    MpcDecode,
    LatchMpc,
    Port1Out,
    Port2Out,
}

enum Effect {
    Drive(u8),
    Hold,
}

impl Ctl {
    fn effect(self) -> (Column, Effect) {
        use Effect::*;

        match self {
            Ctl::LatchIp => (Column::LatchIp, Drive(1)),
            Ctl::SelIp => (Column::SelIp, Drive(1)),
            Ctl::SelJmpType => (Column::SelJmpType, Drive(1)),
            Ctl::LatchIr => (Column::LatchIr, Drive(1)),
            Ctl::SelAddr => (Column::SelAddr, Drive(1)),
            Ctl::HoldSelAddr => (Column::SelAddr, Hold),
            Ctl::LatchAddr => (Column::LatchAddr, Drive(1)),
            Ctl::SelAlu => (Column::SelAlu, Drive(1)),
            Ctl::HoldSelAlu => (Column::SelAlu, Hold),
            Ctl::SelAluInput => (Column::SelAluInput, Drive(1)),
            Ctl::HoldSelAluInput => (Column::SelAluInput, Hold),
            Ctl::Port1In => (Column::SelAluInput, Drive(2)),
            Ctl::Port2In => (Column::SelAluInput, Drive(3)),
            Ctl::DoAlu => (Column::DoAlu, Drive(1)),
            Ctl::LatchAcc => (Column::LatchAcc, Drive(1)),
            Ctl::Output => (Column::Output, Drive(1)),
            Ctl::MemWrite => (Column::MemWrite, Drive(1)),
            Ctl::MemRead => (Column::MemRead, Drive(1)),
            Ctl::MpcNext => (Column::SelMpc, Drive(1)),
            Ctl::MpcDecode => (Column::SelMpc, Drive(2)),
            Ctl::LatchMpc => (Column::LatchMpc, Drive(1)),
            Ctl::Port1Out => (Column::Port1Out, Drive(1)),
            Ctl::Port2Out => (Column::Port2Out, Drive(1)),
        }
    }
}

/// One compiled micro-instruction: a level per control column. Mostly 0/1,
/// but the sel-MPC and sel-ALU-input columns carry values up to 2 and 3.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MicroWord([u8; WORD_WIDTH]);

impl MicroWord {
    pub fn level(&self, column: Column) -> u8 {
        self.0[column as usize]
    }
}

/// The micro-PC advance modes carried by the sel-MPC column.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MpcSelect {
    /// Return to the bootstrap word; this is the instruction boundary.
    Fetch,

    /// Next micro-instruction of the current block.
    Next,

    /// Decode-index lookup for the freshly latched instruction register.
    Decode,
}

impl MpcSelect {
    pub fn from_level(level: u8) -> MpcSelect {
        match level {
            0 => MpcSelect::Fetch,
            1 => MpcSelect::Next,
            2 => MpcSelect::Decode,
            _ => panic!("invalid micro-PC select level {}", level),
        }
    }
}

/// The compiled micro-instruction table and its decode index.
#[derive(Debug)]
pub struct Microcode {
    words: Vec<MicroWord>,
    entries: HashMap<u8, usize>,
}

/// Compiles one block of symbolic micro-instructions. Hold columns copy the
/// previous word of the same block; the first word of a block drives 0 for a
/// hold with no predecessor.
fn compile_block(lines: &[&[Ctl]]) -> Vec<MicroWord> {
    let mut words: Vec<MicroWord> = Vec::with_capacity(lines.len());

    for line in lines {
        let mut levels = [0u8; WORD_WIDTH];

        for ctl in line.iter() {
            if let (column, Effect::Hold) = ctl.effect() {
                levels[column as usize] = words
                    .last()
                    .map(|prev: &MicroWord| prev.level(column))
                    .unwrap_or(0);
            }
        }

        for ctl in line.iter() {
            if let (column, Effect::Drive(level)) = ctl.effect() {
                levels[column as usize] = level;
            }
        }

        words.push(MicroWord(levels));
    }

    words
}

impl Microcode {
    /// Builds the complete table: the bootstrap block at offset zero, then
    /// for every legal (opcode, addressing mode) pair the addressing block
    /// followed by the operation block, recording each pair's starting
    /// offset under its instruction code.
    pub fn generate() -> Microcode {
        let mut words = compile_block(templates::BOOTSTRAP);
        let mut entries = HashMap::new();

        for (opcode, modes) in isa::LEGAL_MODES.iter() {
            for mode in modes.iter() {
                entries.insert(isa::encode(*opcode, *mode), words.len());

                let mut block: Vec<&[Ctl]> = Vec::new();
                block.extend_from_slice(templates::addressing(*mode));
                block.extend_from_slice(templates::operation(*opcode));

                let compiled = compile_block(&block);
                if let Some(last) = compiled.last() {
                    assert!(
                        last.level(Column::SelMpc) == 0 && last.level(Column::LatchMpc) == 1,
                        "micro-program for {} {} does not return to fetch",
                        opcode,
                        mode,
                    );
                }

                words.extend(compiled);
            }
        }

        Microcode { words, entries }
    }

    /// The micro-instruction at `offset`.
    ///
    /// # Panics
    /// Panics if `offset` is outside the table; the offset can only come
    /// from a corrupted micro-PC.
    pub fn word(&self, offset: usize) -> MicroWord {
        match self.words.get(offset) {
            Some(word) => *word,
            None => panic!("micro-PC {} outside the microcode table", offset),
        }
    }

    /// The table offset of the micro-program for instruction code `code`.
    ///
    /// # Panics
    /// Panics if `code` has no entry, i.e. the instruction register holds a
    /// code that no legal instruction encodes to.
    pub fn entry(&self, code: u8) -> usize {
        match self.entries.get(&code) {
            Some(offset) => *offset,
            None => panic!("no microcode entry for instruction code {}", code),
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

lazy_static! {
    /// The process-wide microcode table, compiled on first use.
    pub static ref MICROCODE: Microcode = Microcode::generate();
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;
    use crate::datapath::AluInput;
    use crate::isa::{AddressMode, Opcode};

    const HOLD_COLUMNS: [Column; 3] = [Column::SelAddr, Column::SelAlu, Column::SelAluInput];

    #[test]
    fn every_legal_code_has_an_entry() {
        let mc = Microcode::generate();

        for (opcode, modes) in isa::LEGAL_MODES.iter() {
            for mode in modes.iter() {
                let offset = mc.entry(isa::encode(*opcode, *mode));
                assert!(offset <= mc.len());
            }
        }
    }

    #[test]
    #[should_panic(expected = "no microcode entry")]
    fn unknown_code_has_no_entry() {
        MICROCODE.entry(255);
    }

    #[test]
    fn bootstrap_decodes_into_the_fetched_instruction() {
        let word = MICROCODE.word(0);

        assert_eq!(word.level(Column::LatchIp), 1);
        assert_eq!(word.level(Column::LatchIr), 1);
        assert_eq!(MpcSelect::from_level(word.level(Column::SelMpc)), MpcSelect::Decode);
        assert_eq!(word.level(Column::LatchMpc), 1);
    }

    #[test]
    fn first_word_drives_zero_on_every_hold_column() {
        let word = MICROCODE.word(0);

        for column in HOLD_COLUMNS.iter() {
            assert_eq!(word.level(*column), 0);
        }
    }

    /// No micro-program may fall off the end of its block: the last word
    /// returns the micro-PC to fetch, every earlier word advances it.
    #[test]
    fn every_block_returns_to_fetch() {
        let mc = Microcode::generate();

        for (opcode, modes) in isa::LEGAL_MODES.iter() {
            for mode in modes.iter() {
                let start = mc.entry(isa::encode(*opcode, *mode));
                let len = block_len(*opcode, *mode);

                if len == 0 {
                    continue;
                }

                for offset in start..start + len - 1 {
                    let word = mc.word(offset);
                    assert_eq!(MpcSelect::from_level(word.level(Column::SelMpc)), MpcSelect::Next);
                    assert_eq!(word.level(Column::LatchMpc), 1);
                }

                let last = mc.word(start + len - 1);
                assert_eq!(MpcSelect::from_level(last.level(Column::SelMpc)), MpcSelect::Fetch);
                assert_eq!(last.level(Column::LatchMpc), 1);
            }
        }
    }

    #[test]
    fn hlt_contributes_no_words() {
        assert_eq!(block_len(Opcode::Hlt, AddressMode::NoOperand), 0);
    }

    #[test]
    fn hold_columns_persist_inside_a_block() {
        let mc = Microcode::generate();

        // load indirect_addr is the longest block: two addressing words
        // plus the ALU word. The ALU word holds all three selects.
        let start = mc.entry(isa::encode(Opcode::Load, AddressMode::Indirect));
        let block: Vec<_> = (start..start + 3).map(|i| mc.word(i)).collect();

        for (prev, next) in block.iter().tuple_windows() {
            // sel-ALU-input is held (never redriven) through the block.
            assert_eq!(next.level(Column::SelAluInput), prev.level(Column::SelAluInput));
        }

        // The ALU word keeps the sel-ALU the second addressing word drove.
        assert_eq!(block[1].level(Column::SelAlu), 1);
        assert_eq!(block[2].level(Column::SelAlu), 1);
    }

    #[test]
    fn indirect_second_word_drives_sel_addr_low() {
        let mc = Microcode::generate();

        let start = mc.entry(isa::encode(Opcode::Store, AddressMode::Indirect));
        assert_eq!(mc.word(start).level(Column::SelAddr), 1);
        assert_eq!(mc.word(start + 1).level(Column::SelAddr), 0);
        assert_eq!(mc.word(start + 1).level(Column::LatchAddr), 1);
    }

    #[test]
    fn port_reads_select_their_port() {
        let mc = Microcode::generate();

        let p1 = mc.entry(isa::encode(Opcode::Port1In, AddressMode::NoOperand));
        let p2 = mc.entry(isa::encode(Opcode::Port2In, AddressMode::NoOperand));
        let stream = mc.entry(isa::encode(Opcode::Input, AddressMode::NoOperand));

        assert_eq!(AluInput::from_level(mc.word(p1).level(Column::SelAluInput)), AluInput::Port1);
        assert_eq!(AluInput::from_level(mc.word(p2).level(Column::SelAluInput)), AluInput::Port2);
        assert_eq!(
            AluInput::from_level(mc.word(stream).level(Column::SelAluInput)),
            AluInput::Stream,
        );
    }

    #[test]
    fn jumps_share_a_shape_and_differ_in_wiring() {
        let mc = Microcode::generate();

        let jmp = mc.entry(isa::encode(Opcode::Jmp, AddressMode::LabelVal));
        let jmpz = mc.entry(isa::encode(Opcode::Jmpz, AddressMode::LabelVal));

        // Both are an addressing word followed by one operation word; only
        // the jump-type select differs.
        assert_eq!(mc.word(jmp), mc.word(jmpz));
        assert_eq!(mc.word(jmp + 1).level(Column::SelJmpType), 0);
        assert_eq!(mc.word(jmpz + 1).level(Column::SelJmpType), 1);
        assert_eq!(mc.word(jmp + 1).level(Column::SelIp), 0);
        assert_eq!(mc.word(jmpz + 1).level(Column::SelIp), 0);
    }

    fn block_len(opcode: Opcode, mode: AddressMode) -> usize {
        templates::addressing(mode).len() + templates::operation(opcode).len()
    }
}
