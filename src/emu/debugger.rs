use std::{cell::RefCell, io::Write};

use anyhow::{anyhow, Error, Result};
use easy_repl::{command, repl::LoopStatus, CommandStatus, Repl};

use super::emulator::{EmuState, Emulator};

/// Parses an address given as decimal, or as hex with a `0x` prefix.
pub fn parse_addr(addr: &str) -> Result<usize> {
    let parsed = match addr.strip_prefix("0x").or_else(|| addr.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => addr.parse::<usize>(),
    };
    parsed.map_err(|_| anyhow!("invalid address: {}", addr))
}

pub struct Debugger<'b, W: Write> {
    pub emu: RefCell<&'b mut Emulator<W>>,
    fault: RefCell<Option<Error>>,
}

impl<'b, W: Write> Debugger<'b, W> {
    pub fn new(emu: &'b mut Emulator<W>) -> Self {
        Self {
            emu: RefCell::new(emu),
            fault: RefCell::new(None),
        }
    }

    /// Runs the debug REPL until execution is resumed or halted.
    ///
    /// # Errors
    ///
    /// This function will return an error if the REPL fails, or if a stepped instruction fails.
    /// The emulator is halted in the latter case.
    pub fn repl(&self) -> Result<()> {
        let mut repl = Repl::builder()
            .description("LS-8 Debug REPL")
            .add(
                "c",
                command! {
                    "Continue execution",
                    () => || {
                        self.emu.borrow_mut().resume();
                        Ok(CommandStatus::Quit)
                    }
                },
            )
            .add(
                "s",
                command! {
                    "Step one instruction",
                    () => || {
                        let mut emu = self.emu.borrow_mut();
                        eprintln!("{}", emu.trace_line());
                        match emu.step_instr() {
                            Ok(EmuState::Halted) => Ok(CommandStatus::Quit),
                            Ok(_) => Ok(CommandStatus::Done),
                            Err(e) => {
                                emu.state = EmuState::Halted;
                                *self.fault.borrow_mut() = Some(e);
                                Ok(CommandStatus::Quit)
                            }
                        }
                    }
                },
            )
            .add(
                "bt",
                command! {
                    "Print last X instructions executed",
                    (x:usize) => |x| {
                        let emu = self.emu.borrow();
                        for instr in emu.instr_history.iter().rev().take(x).rev() {
                            eprintln!("{}", instr);
                        }
                        Ok(CommandStatus::Done)
                    }
                },
            )
            .add(
                "pr",
                command! {
                    "Print the value of all registers",
                    () => || {
                        let emu = self.emu.borrow();
                        eprintln!("pc={:02X}", emu.registers.pc);
                        eprintln!("fl={:08b}", emu.registers.fl.bits());
                        for (i, val) in emu.registers.gp().iter().enumerate() {
                            eprintln!("r{}={:02X} ({})", i, val, val);
                        }
                        Ok(CommandStatus::Done)
                    }
                },
            )
            .add(
                "peek",
                command! {
                    "Peek a value from memory",
                    (addr:String) => |addr: String| {
                        let addr = parse_addr(&addr)?;
                        let emu = self.emu.borrow();
                        let val = emu.ram.read(addr)?;
                        eprintln!("{:02X}={:02X} ({:08b})", addr, val, val);
                        Ok(CommandStatus::Done)
                    }
                },
            )
            .add(
                "b",
                command! {
                    "Toggle a breakpoint at an address",
                    (addr:String) => |addr: String| {
                        let addr = parse_addr(&addr)?;
                        let mut emu = self.emu.borrow_mut();
                        if emu.breakpoints.remove(&addr) {
                            eprintln!("removed breakpoint at {:02X}", addr);
                        } else {
                            emu.breakpoints.insert(addr);
                            eprintln!("breakpoint at {:02X}", addr);
                        }
                        Ok(CommandStatus::Done)
                    }
                },
            )
            .add(
                "halt",
                command! {
                    "Halt execution",
                    () => || {
                        self.emu.borrow_mut().state = EmuState::Halted;
                        Ok(CommandStatus::Quit)
                    }
                },
            )
            .build()?;
        eprintln!("LS-8 Debug REPL");
        'repl: loop {
            eprintln!();
            {
                let emu = self.emu.borrow();
                match emu.fetch() {
                    Ok(instr) => eprintln!(
                        "Next instruction:\n[pc={:02X}] --> {}",
                        emu.registers.pc, instr
                    ),
                    Err(e) => eprintln!("[pc={:02X}] --> {:#}", emu.registers.pc, e),
                }
            }

            let status = repl.next()?;
            if let LoopStatus::Break = status {
                break 'repl;
            }
            {
                let emu = self.emu.borrow();
                if emu.state != EmuState::Paused {
                    break 'repl;
                }
            }
        }
        {
            // input ended without resuming
            let mut emu = self.emu.borrow_mut();
            if emu.state == EmuState::Paused {
                emu.state = EmuState::Halted;
            }
        }
        match self.fault.borrow_mut().take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
