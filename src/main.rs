use std::{io, path::PathBuf};

use anyhow::Result;
use clap::Parser;
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};

use ls8::{
    emu::emulator::{EmuConfig, Emulator},
    loader,
    plat::disassemble,
};

/// Runs an LS-8 program.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Program file: one binary byte literal per line, `#` starts a comment.
    program: PathBuf,
    /// Print the CPU state to stderr before every instruction.
    #[arg(short, long)]
    trace: bool,
    /// Start paused in the debug REPL.
    #[arg(short, long)]
    debug: bool,
    /// Print a listing of the program instead of running it.
    #[arg(long)]
    disassemble: bool,
    /// Log more (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    TermLogger::init(
        match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        },
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    let program = loader::load_file(&args.program)?;

    if args.disassemble {
        for (addr, instr) in disassemble(&program) {
            match instr {
                Ok(instr) => println!("{:02X}: {}", addr, instr),
                Err(_) => println!("{:02X}: .byte {:08b}", addr, program[addr]),
            }
        }
        return Ok(());
    }

    let config = EmuConfig {
        trace: args.trace,
        break_on_start: args.debug,
    };
    let mut emu = Emulator::new(io::stdout().lock(), config);
    emu.load(&program)?;
    emu.run_until_halt()
}
