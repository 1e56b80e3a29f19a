use std::{collections::VecDeque, io::Write};

use anyhow::{Context, Result};
use rustc_hash::FxHashSet;

use crate::plat::Instruction;

use super::{
    debugger::Debugger,
    dispatch::{Flow, Handler},
    ram::Ram,
    registers::Registers,
};

/// How many executed instructions are kept for the debugger's backtrace.
pub const HISTORY_LEN: usize = 64;

/// The emulator's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmuState {
    /// The emulator is allowed to run.
    Running,
    /// Stops execution and hands control to the [`Debugger`], but doesn't put the emulator in a hard,
    /// unrecoverable [`Halted`][EmuState::Halted] state.
    Paused,
    /// Halt execution. Nothing runs after this.
    Halted,
}

/// Options for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmuConfig {
    /// Print a trace line to stderr before each instruction.
    pub trace: bool,
    /// Start in the [`Paused`][EmuState::Paused] state.
    pub break_on_start: bool,
}

/// The main emulation context for the LS-8.
///
/// `PRN` output is written to `out`.
pub struct Emulator<W: Write> {
    pub registers: Registers,
    pub ram: Ram,
    pub state: EmuState,
    pub instr_history: VecDeque<Instruction>,
    pub breakpoints: FxHashSet<usize>,
    /// Number of instructions executed so far.
    pub instr_count: u64,
    /// Address whose breakpoint is skipped once, so execution can resume from it.
    resume_pc: Option<usize>,
    config: EmuConfig,
    out: W,
}

impl<W: Write> Emulator<W> {
    pub fn new(out: W, config: EmuConfig) -> Self {
        let state = if config.break_on_start {
            EmuState::Paused
        } else {
            EmuState::Running
        };
        Self {
            registers: Registers::default(),
            ram: Ram::new(),
            state,
            instr_history: VecDeque::with_capacity(HISTORY_LEN),
            breakpoints: FxHashSet::default(),
            instr_count: 0,
            resume_pc: None,
            config,
            out,
        }
    }

    /// Loads a binary program into memory, starting at address 0.
    ///
    /// # Errors
    ///
    /// This function will return an error if the program doesn't fit in memory.
    pub fn load(&mut self, program: &[u8]) -> Result<()> {
        self.ram
            .load(program)
            .with_context(|| format!("loading a {} byte program", program.len()))
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Decodes the instruction at PC.
    ///
    /// The fetch window is always the opcode plus the two bytes after it, whatever the
    /// instruction's width. All three bytes must lie in memory.
    ///
    /// # Errors
    ///
    /// This function will return an error if any byte of the window is out of memory, or if the opcode is unknown.
    pub fn fetch(&self) -> Result<Instruction> {
        let pc = self.registers.pc;
        let mut window = [0u8; 3];
        for (i, byte) in window.iter_mut().enumerate() {
            *byte = self
                .ram
                .read(pc + i)
                .with_context(|| format!("fetching instruction at {:#04X}", pc))?;
        }
        let instr = Instruction::from_bytes(window)
            .with_context(|| format!("decoding instruction at {:#04X}", pc))?;
        Ok(instr)
    }

    /// Leaves the [`Paused`][EmuState::Paused] state. A breakpoint at the current PC doesn't fire again
    /// until execution has moved on.
    pub fn resume(&mut self) {
        self.resume_pc = Some(self.registers.pc);
        self.state = EmuState::Running;
    }

    /// Fetches, decodes and executes a single instruction.
    ///
    /// Does nothing once the emulator has halted. While running, a breakpoint at PC pauses the
    /// emulator before the instruction executes.
    pub fn step_instr(&mut self) -> Result<EmuState> {
        if self.state == EmuState::Halted {
            return Ok(self.state);
        }
        let pc = self.registers.pc;
        let resumed = self.resume_pc.take() == Some(pc);
        if self.state == EmuState::Running && !resumed && self.breakpoints.contains(&pc) {
            log::info!("breakpoint at {:#04X}", pc);
            self.state = EmuState::Paused;
            return Ok(self.state);
        }
        if self.config.trace {
            eprintln!("{}", self.trace_line());
        }

        let instr = self.fetch()?;
        log::debug!(">>> {}", instr);
        if self.instr_history.len() == HISTORY_LEN {
            self.instr_history.pop_front();
        }
        self.instr_history.push_back(instr);

        let flow = Handler::for_opcode(instr.op)?
            .run(instr, &mut self.registers, &mut self.out)
            .with_context(|| format!("executing `{}` at {:#04X}", instr, pc))?;
        self.instr_count += 1;

        if flow == Flow::Halt {
            log::info!("halted after {} instructions", self.instr_count);
            self.state = EmuState::Halted;
        }
        Ok(self.state)
    }

    /// Runs the emulator, stepping through instructions until it reaches a halt state.
    ///
    /// Hands control to the debugger whenever the emulator is paused.
    pub fn run_until_halt(&mut self) -> Result<()> {
        loop {
            match self.state {
                EmuState::Running => {
                    self.step_instr()?;
                }
                EmuState::Paused => self.debug()?,
                EmuState::Halted => break,
            }
        }
        self.out.flush()?;
        Ok(())
    }

    /// Formats the CPU state as `PC | opcode operandA operandB | r0 ... r7`, in hex.
    ///
    /// Registers are printed at their full 8-digit width so columns line up whatever they hold.
    /// Window bytes outside memory show as `--`.
    pub fn trace_line(&self) -> String {
        let pc = self.registers.pc;
        let window = (pc..pc + 3)
            .map(|addr| match self.ram.get(addr) {
                Some(byte) => format!("{:02X}", byte),
                None => "--".to_owned(),
            })
            .collect::<Vec<_>>()
            .join(" ");
        let regs = self
            .registers
            .gp()
            .iter()
            .map(|reg| format!("{:08X}", reg))
            .collect::<Vec<_>>()
            .join(" ");
        format!("{:02X} | {} | {}", pc, window, regs)
    }

    pub fn debug(&mut self) -> Result<()> {
        Debugger::new(self).repl()
    }
}
