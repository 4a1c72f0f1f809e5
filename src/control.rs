//! The control unit: drives the machine one tick at a time.
//!
//! Each tick applies every column of the current micro-instruction to its
//! signal primitive in the canonical column order, then the micro-PC latch
//! (itself one of those signals) picks the next micro-instruction: the next
//! word of the block, the decode-index entry of the freshly latched
//! instruction register, or the bootstrap word at offset zero — the latter
//! being the instruction boundary that advances the committed-instruction
//! counter.

use slog::{debug, error, o, Discard, Logger};

use crate::datapath::{DataPath, Stop};
use crate::isa;
use crate::microcode::{Column, MicroWord, Microcode, MpcSelect, COLUMN_ORDER, MICROCODE};

/// Upper bound on ticks per run. Purely a guard against runaway programs;
/// exceeding it is fatal for the run.
pub const TICK_LIMIT: u64 = 50_000;

/// Sentinel tick count reported when [`TICK_LIMIT`] is exceeded.
pub const TICKS_EXCEEDED: u64 = u64::MAX;

/// Why a run stopped.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StopCause {
    /// A `hlt` instruction was decoded. The expected way out.
    Halted,

    /// An input queue ran dry. Stops the machine exactly like a halt, but
    /// callers may want to know the program never said `hlt`.
    InputExhausted,

    /// The tick ceiling was hit; the reported tick count is
    /// [`TICKS_EXCEEDED`] rather than a true count.
    TickLimitExceeded,
}

/// The result of a completed run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RunResult {
    pub ticks: u64,

    /// Committed instructions: incremented once per micro-PC reset to the
    /// bootstrap word, including the power-on reset.
    pub instructions: u64,

    pub cause: StopCause,
}

/// Owns the data path and the compiled microcode, and advances time.
#[derive(Clone)]
pub struct ControlUnit {
    pub dp: DataPath,
    mc: &'static Microcode,

    /// Micro-program counter.
    mpc: usize,

    /// The micro-instruction being executed this tick.
    current: MicroWord,

    /// Staged micro-PC mode, applied by the micro-PC latch.
    mpc_select: u8,

    pub ticks: u64,
    pub instructions: u64,

    log: Logger,
}

impl ControlUnit {
    /// Creates a control unit over `dp` and feeds the power-on reset pulse:
    /// the micro-PC points at the bootstrap word and the first instruction
    /// boundary has been counted.
    pub fn new(dp: DataPath) -> ControlUnit {
        ControlUnit::with_logger(dp, None)
    }

    pub fn with_logger<L>(dp: DataPath, logger: L) -> ControlUnit
    where
        L: Into<Option<Logger>>,
    {
        let log = logger
            .into()
            .unwrap_or_else(|| Logger::root(Discard, o!()))
            .new(o!("unit" => "control"));

        let mut cu = ControlUnit {
            dp,
            mc: &MICROCODE,
            mpc: 0,
            current: MICROCODE.word(0),
            mpc_select: 0,
            ticks: 0,
            instructions: 0,
            log,
        };

        cu.select_mpc(0);
        cu.latch_mpc(1);

        cu
    }

    /// micro-mux-select-IP: stages the mode for the next micro-PC latch.
    /// Mode 0 marks an instruction boundary, which is also where the
    /// machine state is traced.
    fn select_mpc(&mut self, level: u8) {
        self.mpc_select = level;

        if level == 0 {
            self.log_state();
        }
    }

    /// micro-IP-advance: latches the micro-PC according to the staged mode
    /// and refills the current micro-instruction.
    fn latch_mpc(&mut self, level: u8) {
        if level != 1 {
            return;
        }

        match MpcSelect::from_level(self.mpc_select) {
            MpcSelect::Fetch => {
                self.mpc = 0;
                self.instructions += 1;
            }
            MpcSelect::Next => self.mpc += 1,
            MpcSelect::Decode => self.mpc = self.mc.entry(self.dp.ir),
        }

        self.current = self.mc.word(self.mpc);
    }

    fn log_state(&self) {
        let (opcode, mode) = isa::decode(self.dp.ir);

        debug!(self.log, "state";
            "acc" => self.dp.acc,
            "z" => self.dp.flag_z,
            "addr" => self.dp.addr,
            "mode" => %mode,
            "op" => %opcode,
            "ip" => self.dp.ip
        );
    }

    fn apply(&mut self, column: Column, level: u8) -> Result<(), Stop> {
        match column {
            Column::LatchIp => self.dp.latch_ip(level),
            Column::SelIp => self.dp.drive_sel_ip(level),
            Column::SelJmpType => self.dp.select_jmp_type(level),
            Column::LatchIr => return self.dp.latch_ir(level),
            Column::SelAddr => self.dp.select_addr(level),
            Column::LatchAddr => self.dp.latch_addr(level),
            Column::SelAlu => self.dp.select_alu(level),
            Column::SelAluInput => self.dp.select_alu_input(level),
            Column::DoAlu => return self.dp.alu(level),
            Column::LatchAcc => self.dp.latch_acc(level),
            Column::Output => self.dp.output(level),
            Column::MemWrite => self.dp.mem_write(level),
            Column::MemRead => self.dp.mem_read(level),
            Column::SelMpc => self.select_mpc(level),
            Column::LatchMpc => self.latch_mpc(level),
            Column::Port1Out => self.dp.port_out(0, level),
            Column::Port2Out => self.dp.port_out(1, level),
        }

        Ok(())
    }

    /// Executes one tick: applies the whole current micro-instruction.
    ///
    /// On a termination condition the tick is not counted; whatever the
    /// earlier signals of the word already did (output included) stands.
    pub fn step(&mut self) -> Result<(), Stop> {
        let word = self.current;

        for column in COLUMN_ORDER.iter() {
            self.apply(*column, word.level(*column))?;
        }

        self.ticks += 1;

        Ok(())
    }

    /// Runs until the machine halts, starves or hits the tick ceiling.
    pub fn run(&mut self) -> RunResult {
        loop {
            if self.ticks >= TICK_LIMIT {
                error!(self.log, "tick limit exceeded"; "limit" => TICK_LIMIT);

                return RunResult {
                    ticks: TICKS_EXCEEDED,
                    instructions: self.instructions,
                    cause: StopCause::TickLimitExceeded,
                };
            }

            let cause = match self.step() {
                Ok(()) => continue,
                Err(Stop::Halt) => StopCause::Halted,
                Err(Stop::Underrun) => StopCause::InputExhausted,
            };

            return RunResult {
                ticks: self.ticks,
                instructions: self.instructions,
                cause,
            };
        }
    }
}
