//! The data path: all hardware state of the machine and one primitive per
//! control signal.
//!
//! Every register, bus and queue lives here and is mutated exclusively
//! through the signal primitives, each of which touches only the state the
//! real signal would touch. Multiplexer inputs are modelled as explicit
//! staged values ([`Staged`]); a mux-select primitive chooses among them and
//! a latch primitive commits the chosen value.
//!
//! Latch and pulse primitives are no-ops when driven with level 0. The
//! mux-select primitives have no "inactive" concept and apply their level
//! unconditionally.

use std::collections::VecDeque;

use slog::{debug, o, warn, Discard, Logger};

use crate::document;
use crate::isa::{self, AddressMode, Instruction, Opcode, Word};

/// The ALU input sources selectable by the sel-ALU-input control line.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AluInput {
    /// The ordinary operand mux.
    Operand,

    /// The primary input stream.
    Stream,

    /// Port 1's incoming queue.
    Port1,

    /// Port 2's incoming queue.
    Port2,
}

impl AluInput {
    /// Decodes a sel-ALU-input level.
    ///
    /// # Panics
    /// Panics on a level no mux input exists for; such a level can only
    /// come from a corrupted control word.
    pub fn from_level(level: u8) -> AluInput {
        match level {
            0 => AluInput::Operand,
            1 => AluInput::Stream,
            2 => AluInput::Port1,
            3 => AluInput::Port2,
            _ => panic!("invalid ALU input select level {}", level),
        }
    }
}

/// A termination condition raised by a signal primitive and consumed by the
/// control unit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stop {
    /// A `hlt` instruction was latched into the instruction register.
    Halt,

    /// The ALU needed a value from an input queue that was already empty.
    Underrun,
}

/// One bidirectional I/O port: an incoming queue drained in arrival order
/// and an outgoing sequence.
#[derive(Debug, Clone, Default)]
pub struct Port {
    pub incoming: VecDeque<Word>,
    pub outgoing: Vec<Word>,
}

/// The staged multiplexer inputs and not-yet-committed results.
///
/// This is the bus wiring of the machine made explicit: values placed here
/// are visible to whatever latch selects them later in the same cycle, but
/// nothing is committed until the corresponding latch fires.
#[derive(Debug, Clone, Default)]
struct Staged {
    /// Address mux: [0] = value just read from data memory, [1] = the
    /// fetched instruction's argument.
    mux_addr: [Word; 2],

    /// ALU operand mux: [0] = the fetched instruction's argument, [1] =
    /// memory read data, republished as the accumulator once it latches.
    mux_alu: [Word; 2],

    /// IP mux: [0] = the staged jump target, [1] = ip + 1.
    mux_ip: [Word; 2],

    /// Jump-type mux: [0] = the constant driven by the sel-IP line, [1] =
    /// "advance unless the zero flag", rewritten whenever the flag latches.
    jmp_type: [u8; 2],

    /// Instruction code staged by the fetch, committed by latch-IR.
    ir: u8,

    /// ALU result and its zero-ness, committed by latch-ACC.
    alu_out: Word,
    alu_zero: bool,

    /// The memory-write-data line, republished by latch-ACC.
    mem_in: Word,
}

/// Owns instruction and data memory, the registers, the ALU, the primary
/// I/O streams and the two ports.
#[derive(Clone)]
pub struct DataPath {
    pub data_mem: Vec<Word>,
    pub code_mem: Vec<Instruction>,

    /// Instruction pointer.
    pub ip: Word,

    /// Instruction register: the current instruction's numeric code.
    pub ir: u8,

    /// Address register indexing data memory.
    pub addr: Word,

    /// The accumulator.
    pub acc: Word,

    /// Zero flag, latched together with the accumulator.
    pub flag_z: bool,

    // Mux select latches. These persist across cycles unless redriven;
    // the compiled hold columns rely on that.
    sel_addr: u8,
    sel_alu: u8,
    sel_alu_input: u8,
    sel_ip: u8,

    staged: Staged,

    /// The primary input stream, drained strictly in order.
    pub input: VecDeque<Word>,

    /// The primary output sequence.
    pub output: Vec<Word>,

    /// Ports 1 and 2.
    pub ports: [Port; 2],

    log: Logger,
}

fn halt_padding() -> Instruction {
    Instruction::new(Opcode::Hlt, AddressMode::NoOperand, 0)
}

impl DataPath {
    /// Creates a data path with the given memory capacities and primary
    /// input queue. Code memory is padded with `hlt`, data memory with
    /// zeros.
    pub fn new(data_size: usize, code_size: usize, input: Vec<Word>) -> DataPath {
        DataPath::with_logger(data_size, code_size, input, None)
    }

    pub fn with_logger<L>(data_size: usize, code_size: usize, input: Vec<Word>, logger: L) -> DataPath
    where
        L: Into<Option<Logger>>,
    {
        let log = logger
            .into()
            .unwrap_or_else(|| Logger::root(Discard, o!()))
            .new(o!("unit" => "datapath"));

        DataPath {
            data_mem: vec![0; data_size],
            code_mem: vec![halt_padding(); code_size],
            ip: 0,
            ir: 0,
            addr: 0,
            acc: 0,
            flag_z: false,
            sel_addr: 0,
            sel_alu: 0,
            sel_alu_input: 0,
            sel_ip: 0,
            staged: Staged::default(),
            input: input.into(),
            output: Vec::new(),
            ports: [Port::default(), Port::default()],
            log,
        }
    }

    /// Loads a translated program document: the data segment's memory image
    /// and the code segment, both zero-padded to the configured capacities.
    ///
    /// # Panics
    /// Panics if either segment exceeds its memory's capacity.
    pub fn load_program(&mut self, program: &document::Program) {
        self.load_data(&program.memory_image());
        self.load_code(&program.code);
    }

    pub fn load_data(&mut self, image: &[Word]) {
        assert!(
            image.len() <= self.data_mem.len(),
            "data image ({} words) exceeds data memory ({} words)",
            image.len(),
            self.data_mem.len(),
        );

        for cell in self.data_mem.iter_mut() {
            *cell = 0;
        }
        self.data_mem[..image.len()].copy_from_slice(image);
    }

    pub fn load_code(&mut self, code: &[Instruction]) {
        let capacity = self.code_mem.len();

        assert!(
            code.len() <= capacity,
            "program ({} instructions) exceeds code memory ({} cells)",
            code.len(),
            capacity,
        );

        self.code_mem.clear();
        self.code_mem.extend_from_slice(code);
        self.code_mem.resize(capacity, halt_padding());
    }

    /// latch-IP: commits the IP mux's selected value into the instruction
    /// pointer, restages ip + 1 on the advance input, and immediately
    /// fetches the instruction word at the new pointer — instruction memory
    /// is combinational-read, so the fetched code and argument are staged on
    /// every mux that could want them within the same cycle.
    pub fn latch_ip(&mut self, level: u8) {
        if level == 0 {
            return;
        }

        self.ip = self.staged.mux_ip[self.sel_ip as usize];
        self.staged.mux_ip[1] = self.ip.wrapping_add(1);

        let instr = &self.code_mem[self.ip as usize];
        let (code, arg) = (instr.code(), instr.arg);

        self.staged.ir = code;
        self.staged.mux_addr[1] = arg;
        self.staged.mux_ip[0] = arg;
        self.staged.mux_alu[0] = arg;
    }

    /// sel-IP: drives the constant input of the jump-type mux. Ordinary
    /// instructions drive 1 ("advance"); leaving it at 0 makes an
    /// unconditional jump.
    pub fn drive_sel_ip(&mut self, level: u8) {
        self.staged.jmp_type[0] = level;
    }

    /// sel-jmp-type: routes the jump-type mux onto the IP mux select —
    /// input 0 is the driven constant, input 1 jumps only when the zero
    /// flag was just set.
    pub fn select_jmp_type(&mut self, level: u8) {
        self.sel_ip = self.staged.jmp_type[level as usize];
    }

    /// latch-IR: commits the staged instruction code. Latching `hlt` is
    /// itself the halt signal.
    pub fn latch_ir(&mut self, level: u8) -> Result<(), Stop> {
        if level == 0 {
            return Ok(());
        }

        self.ir = self.staged.ir;

        if isa::decode(self.ir).0 == Opcode::Hlt {
            return Err(Stop::Halt);
        }

        Ok(())
    }

    /// sel-ADDR: 0 selects the value just read from data memory, 1 the
    /// fetched instruction's argument.
    pub fn select_addr(&mut self, level: u8) {
        self.sel_addr = level;
    }

    /// latch-ADDR: commits the address mux's selected value.
    pub fn latch_addr(&mut self, level: u8) {
        if level == 0 {
            return;
        }

        self.addr = self.staged.mux_addr[self.sel_addr as usize];
    }

    /// sel-ALU: 0 selects the fetched argument, 1 the memory/accumulator
    /// input of the operand mux.
    pub fn select_alu(&mut self, level: u8) {
        self.sel_alu = level;
    }

    /// sel-ALU-input: selects among the operand mux, the primary input
    /// stream and the two port queues (see [`AluInput`]).
    pub fn select_alu_input(&mut self, level: u8) {
        self.sel_alu_input = level;
    }

    /// do-ALU: computes the current instruction's operation over the
    /// accumulator and the selected input, staging the result and its
    /// zero-ness. Reading an exhausted input queue raises
    /// [`Stop::Underrun`].
    pub fn alu(&mut self, level: u8) -> Result<(), Stop> {
        if level == 0 {
            return Ok(());
        }

        let (opcode, _) = isa::decode(self.staged.ir);

        let operand = match AluInput::from_level(self.sel_alu_input) {
            AluInput::Operand => self.staged.mux_alu[self.sel_alu as usize],
            AluInput::Stream => match self.input.pop_front() {
                Some(value) => {
                    debug!(self.log, "input"; "value" => value);
                    value
                }
                None => {
                    warn!(self.log, "input stream is empty");
                    return Err(Stop::Underrun);
                }
            },
            AluInput::Port1 => self.port_read(0)?,
            AluInput::Port2 => self.port_read(1)?,
        };

        let result = match opcode {
            Opcode::Inc => self.acc.wrapping_add(1),
            Opcode::Dec => self.acc.wrapping_sub(1),
            Opcode::Cls => 0,
            Opcode::Neg => self.acc.wrapping_neg(),
            Opcode::Add => self.acc.wrapping_add(operand),
            Opcode::Sub => self.acc.wrapping_sub(operand),
            Opcode::Load | Opcode::Input | Opcode::Port1In | Opcode::Port2In => operand,
            other => panic!("{} is not an ALU operation", other),
        };

        self.staged.alu_out = result;
        self.staged.alu_zero = result == 0;

        Ok(())
    }

    fn port_read(&mut self, index: usize) -> Result<Word, Stop> {
        match self.ports[index].incoming.pop_front() {
            Some(value) => {
                debug!(self.log, "input from port"; "port" => index + 1, "value" => value);
                Ok(value)
            }
            None => {
                debug!(self.log, "port buffer is empty"; "port" => index + 1);
                Err(Stop::Underrun)
            }
        }
    }

    /// latch-ACC: commits the staged ALU result and zero flag, then
    /// republishes the fresh accumulator onto the operand mux and the
    /// memory-write-data line.
    pub fn latch_acc(&mut self, level: u8) {
        if level == 0 {
            return;
        }

        self.flag_z = self.staged.alu_zero;
        self.staged.jmp_type[1] = if self.flag_z { 0 } else { 1 };

        self.acc = self.staged.alu_out;
        self.staged.mux_alu[1] = self.acc;
        self.staged.mem_in = self.acc;
    }

    /// output: appends the accumulator to the primary output sequence.
    pub fn output(&mut self, level: u8) {
        if level == 0 {
            return;
        }

        debug!(self.log, "output"; "value" => self.acc);
        self.output.push(self.acc);
    }

    /// mem-write (data-in): commits the staged write value at the address
    /// register's location.
    pub fn mem_write(&mut self, level: u8) {
        if level == 0 {
            return;
        }

        let addr = self.addr as usize;
        self.data_mem[addr] = self.staged.mem_in;
    }

    /// mem-read (data-out): reads the cell at the address register and
    /// stages the value onto the address and operand muxes.
    pub fn mem_read(&mut self, level: u8) {
        if level == 0 {
            return;
        }

        let value = self.data_mem[self.addr as usize];
        self.staged.mux_addr[0] = value;
        self.staged.mux_alu[1] = value;
    }

    /// port1-out / port2-out: appends the accumulator to the port's
    /// outgoing queue.
    pub fn port_out(&mut self, index: usize, level: u8) {
        if level == 0 {
            return;
        }

        self.ports[index].outgoing.push(self.acc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::{AddressMode::*, Opcode::*};

    fn datapath() -> DataPath {
        DataPath::new(16, 16, Vec::new())
    }

    #[test]
    fn first_latch_fetches_instruction_zero() {
        let mut dp = datapath();
        dp.load_code(&[Instruction::new(Load, LabelVal, 7)]);

        dp.latch_ip(1);

        assert_eq!(dp.ip, 0);
        assert_eq!(dp.staged.ir, isa::encode(Load, LabelVal));
        // The argument is pre-staged on every mux that could want it.
        assert_eq!(dp.staged.mux_addr[1], 7);
        assert_eq!(dp.staged.mux_ip[0], 7);
        assert_eq!(dp.staged.mux_alu[0], 7);
        // And the advance input already holds ip + 1.
        assert_eq!(dp.staged.mux_ip[1], 1);
    }

    #[test]
    fn latching_hlt_raises_the_halt_condition() {
        let mut dp = datapath();
        dp.load_code(&[Instruction::new(Hlt, NoOperand, 0)]);

        dp.latch_ip(1);
        assert_eq!(dp.latch_ir(1), Err(Stop::Halt));
    }

    #[test]
    fn latch_primitives_ignore_level_zero() {
        let mut dp = datapath();
        dp.load_code(&[Instruction::new(Inc, NoOperand, 0)]);

        dp.latch_ip(0);
        assert_eq!(dp.latch_ir(0), Ok(()));
        dp.latch_addr(0);
        dp.latch_acc(0);
        dp.output(0);
        dp.mem_write(0);
        dp.mem_read(0);
        dp.port_out(0, 0);
        assert!(dp.alu(0).is_ok());

        assert_eq!(dp.output, Vec::<Word>::new());
        assert_eq!(dp.acc, 0);
    }

    #[test]
    fn alu_operations() {
        let cases = [
            (Inc, 5, 0, 6),
            (Dec, 5, 0, 4),
            (Cls, 5, 0, 0),
            (Neg, 5, 0, -5),
            (Add, 5, 10, 15),
            (Sub, 5, 10, -5),
            (Load, 5, 10, 10),
        ];

        for (opcode, acc, operand, expected) in cases.iter() {
            let mut dp = datapath();
            dp.acc = *acc;
            dp.staged.ir = isa::encode(*opcode, opcode.legal_modes()[0]);
            dp.staged.mux_alu[0] = *operand;

            dp.alu(1).unwrap();
            dp.latch_acc(1);

            assert_eq!(dp.acc, *expected, "{}", opcode);
            assert_eq!(dp.flag_z, *expected == 0, "{}", opcode);
        }
    }

    #[test]
    fn alu_result_is_staged_until_the_accumulator_latches() {
        let mut dp = datapath();
        dp.acc = 41;
        dp.staged.ir = isa::encode(Inc, NoOperand);

        dp.alu(1).unwrap();
        assert_eq!(dp.acc, 41);

        dp.latch_acc(1);
        assert_eq!(dp.acc, 42);
        // The fresh value is republished for stores and chained operations.
        assert_eq!(dp.staged.mux_alu[1], 42);
        assert_eq!(dp.staged.mem_in, 42);
    }

    #[test]
    fn empty_input_stream_raises_underrun() {
        let mut dp = datapath();
        dp.staged.ir = isa::encode(Input, NoOperand);
        dp.select_alu_input(1);

        assert_eq!(dp.alu(1), Err(Stop::Underrun));
    }

    #[test]
    fn port_reads_drain_their_own_queue() {
        let mut dp = datapath();
        dp.ports[1].incoming.push_back(99);
        dp.staged.ir = isa::encode(Port2In, NoOperand);
        dp.select_alu_input(3);

        dp.alu(1).unwrap();
        dp.latch_acc(1);

        assert_eq!(dp.acc, 99);
        assert!(dp.ports[1].incoming.is_empty());
        // Port 1 was never touched.
        assert_eq!(dp.ports[0].incoming.len(), 0);

        assert_eq!(dp.alu(1), Err(Stop::Underrun));
    }

    #[test]
    fn memory_read_stages_onto_both_muxes() {
        let mut dp = datapath();
        dp.load_data(&[0, 0, 0, 31]);
        dp.staged.mux_addr[1] = 3;

        dp.select_addr(1);
        dp.latch_addr(1);
        dp.mem_read(1);

        assert_eq!(dp.addr, 3);
        assert_eq!(dp.staged.mux_alu[1], 31);
        assert_eq!(dp.staged.mux_addr[0], 31);
    }

    #[test]
    fn memory_write_uses_the_republished_accumulator() {
        let mut dp = datapath();
        dp.staged.ir = isa::encode(Load, Direct);
        dp.staged.mux_alu[0] = 7;
        dp.alu(1).unwrap();
        dp.latch_acc(1);

        dp.staged.mux_addr[1] = 2;
        dp.select_addr(1);
        dp.latch_addr(1);
        dp.mem_write(1);

        assert_eq!(dp.data_mem[2], 7);
    }

    #[test]
    fn zero_flag_rewires_the_jump_type_mux() {
        let mut dp = datapath();
        dp.staged.ir = isa::encode(Cls, NoOperand);

        dp.alu(1).unwrap();
        dp.latch_acc(1);
        assert!(dp.flag_z);

        // With the flag set, the conditional input selects "jump".
        dp.select_jmp_type(1);
        assert_eq!(dp.sel_ip, 0);

        // Without it, "advance".
        dp.staged.ir = isa::encode(Inc, NoOperand);
        dp.alu(1).unwrap();
        dp.latch_acc(1);
        dp.select_jmp_type(1);
        assert_eq!(dp.sel_ip, 1);
    }

    #[test]
    #[should_panic(expected = "exceeds code memory")]
    fn oversized_program_is_rejected() {
        let mut dp = DataPath::new(4, 2, Vec::new());
        dp.load_code(&[
            Instruction::new(Inc, NoOperand, 0),
            Instruction::new(Inc, NoOperand, 0),
            Instruction::new(Hlt, NoOperand, 0),
        ]);
    }
}
