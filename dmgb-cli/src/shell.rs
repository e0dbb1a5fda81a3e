use dmgb_core::{Emulator, Frontend, M_CYCLES_PER_FRAME};
use std::io::{self, BufRead, Write};
use std::num::ParseIntError;
use thiserror::Error;

// One minute of emulated time
const RUN_UNTIL_MAX_M_CYCLES: u64 = M_CYCLES_PER_FRAME as u64 * 60 * 60;

const HELP: &str = "Available commands:
  m            run one M-cycle
  n <count>    run <count> M-cycles
  f            free run until the frontend quits
  dr           dump registers and the instruction at PC
  df           dump flags
  ra <hex>     run until PC reaches address
  rd <hex>     read address
  help         show this message
  q            quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    MCycle,
    Cycles(u64),
    FreeRun,
    DumpRegisters,
    DumpFlags,
    RunUntil(u16),
    ReadAddress(u16),
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq, Eq)]
enum CommandError {
    #[error("unknown command '{command}', type 'help' for a list of commands")]
    Unknown { command: String },
    #[error("command '{command}' requires an argument")]
    MissingArgument { command: String },
    #[error("invalid number '{value}': {source}")]
    InvalidNumber {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

fn parse_hex(value: &str) -> Result<u16, CommandError> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix('$'))
        .unwrap_or(value);
    u16::from_str_radix(digits, 16).map_err(|source| CommandError::InvalidNumber {
        value: value.into(),
        source,
    })
}

fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };

    let mut argument = || {
        words.next().ok_or_else(|| CommandError::MissingArgument {
            command: command.into(),
        })
    };

    let command = match command {
        "m" => Command::MCycle,
        "n" => {
            let count = argument()?;
            let count = count.parse().map_err(|source| CommandError::InvalidNumber {
                value: count.into(),
                source,
            })?;
            Command::Cycles(count)
        }
        "f" => Command::FreeRun,
        "dr" => Command::DumpRegisters,
        "df" => Command::DumpFlags,
        "ra" => Command::RunUntil(parse_hex(argument()?)?),
        "rd" => Command::ReadAddress(parse_hex(argument()?)?),
        "help" => Command::Help,
        "q" => Command::Quit,
        _ => {
            return Err(CommandError::Unknown {
                command: command.into(),
            })
        }
    };

    Ok(Some(command))
}

/// Interactive debugger over the given input/output streams. Returns when the user quits or the
/// input ends.
///
/// Emulation errors are reported and leave the machine available for inspection.
pub fn run<F, R, W>(
    emulator: &mut Emulator,
    frontend: &mut F,
    input: R,
    output: &mut W,
) -> io::Result<()>
where
    F: Frontend,
    R: BufRead,
    W: Write,
{
    let mut lines = input.lines();

    loop {
        write!(output, "> ")?;
        output.flush()?;

        let Some(line) = lines.next() else {
            writeln!(output)?;
            return Ok(());
        };

        let command = match parse_command(&line?) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                writeln!(output, "{err}")?;
                continue;
            }
        };

        log::debug!("Shell command: {command:?}");

        let result = match command {
            Command::MCycle => emulator.run_m_cycle(),
            Command::Cycles(count) => emulator.run_cycles(count),
            Command::FreeRun => emulator.free_run(frontend),
            Command::DumpRegisters => {
                writeln!(output, "{}", emulator.registers())?;
                let pc = emulator.registers().pc;
                match emulator.disassemble(pc) {
                    Ok((instruction, _)) => writeln!(output, "{pc:04X}: {instruction}")?,
                    Err(err) => writeln!(output, "{pc:04X}: {err}")?,
                }
                Ok(())
            }
            Command::DumpFlags => {
                writeln!(output, "{}", emulator.flags())?;
                Ok(())
            }
            Command::RunUntil(address) => emulator
                .run_until_pc(address, RUN_UNTIL_MAX_M_CYCLES)
                .map(|reached| {
                    if !reached {
                        log::warn!(
                            "PC did not reach {address:04X} in {RUN_UNTIL_MAX_M_CYCLES} M-cycles"
                        );
                    }
                }),
            Command::ReadAddress(address) => {
                writeln!(
                    output,
                    "Value at address {address:04X}: {:02X}",
                    emulator.peek(address)
                )?;
                Ok(())
            }
            Command::Help => {
                writeln!(output, "{HELP}")?;
                Ok(())
            }
            Command::Quit => return Ok(()),
        };

        if let Err(err) = result {
            writeln!(output, "error: {err}")?;
        }
    }
}
