//! CLI entry point for the Graystation runner binary.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use graystation_core::{disassemble, Bios, ExeImage, Machine, Opcode, TraceEvent, TraceSink};

const USAGE_TEXT: &str = "\
Usage: graystation <command> [options]

Commands:
  run <bios.bin> [options]  Boot the given BIOS image

Options:
  --exe <file>     Sideload a PS-X EXE once the BIOS shell is reached
  --ticks <count>  Stop after this many instructions (default: run forever)
  --trace          Print each executed instruction to stderr
  -h, --help       Show this help message

Examples:
  graystation run scph1001.bin
  graystation run scph1001.bin --exe hello.exe --ticks 50000000
";

/// How often the captured TTY bytes are flushed to stdout, in ticks.
const TTY_FLUSH_INTERVAL: u64 = 4096;

#[derive(Debug, PartialEq, Eq)]
struct RunArgs {
    bios: PathBuf,
    exe: Option<PathBuf>,
    ticks: u64,
    trace: bool,
}

#[derive(Debug)]
enum ParseResult {
    Command(RunArgs),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    match first.to_string_lossy().as_ref() {
        "run" => parse_run_args(args).map(ParseResult::Command),
        other => Err(format!("unknown command: {other}")),
    }
}

#[allow(clippy::while_let_on_iterator)]
fn parse_run_args(mut args: impl Iterator<Item = OsString>) -> Result<RunArgs, String> {
    let mut bios: Option<PathBuf> = None;
    let mut exe: Option<PathBuf> = None;
    let mut ticks = u64::MAX;
    let mut trace = false;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--trace" {
            trace = true;
            continue;
        }

        if arg == "--exe" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for --exe".to_string())?;
            exe = Some(PathBuf::from(value));
            continue;
        }

        if arg == "--ticks" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for --ticks".to_string())?;
            ticks = value
                .to_string_lossy()
                .parse()
                .map_err(|_| format!("invalid tick count: {}", value.to_string_lossy()))?;
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if bios.is_some() {
            return Err("multiple BIOS paths provided".to_string());
        }
        bios = Some(PathBuf::from(arg));
    }

    let bios = bios.ok_or_else(|| "missing BIOS path".to_string())?;
    Ok(RunArgs {
        bios,
        exe,
        ticks,
        trace,
    })
}

/// Prints each pipeline event to stderr as it retires.
struct StderrTrace;

impl TraceSink for StderrTrace {
    fn on_event(&mut self, event: TraceEvent) {
        match event {
            TraceEvent::Instruction { pc, word } => {
                eprintln!("{pc:08X}  {}", disassemble(Opcode(word)));
            }
            TraceEvent::Exception { exception, pc } => {
                eprintln!("{pc:08X}  -> exception {exception:?}");
            }
        }
    }
}

fn load_machine(args: &RunArgs) -> Result<Machine, String> {
    let image = fs::read(&args.bios)
        .map_err(|e| format!("failed to read {}: {e}", args.bios.display()))?;
    let bios = Bios::from_image(image).map_err(|e| e.to_string())?;
    let mut machine = Machine::new(bios);

    if let Some(path) = &args.exe {
        let image = fs::read(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        let exe = ExeImage::parse(&image).map_err(|e| e.to_string())?;
        machine.sideload_exe_at_shell(exe);
    }

    Ok(machine)
}

fn flush_tty(machine: &mut Machine, stdout: &mut impl Write) -> io::Result<()> {
    let bytes = machine.take_tty_output();
    if !bytes.is_empty() {
        stdout.write_all(&bytes)?;
        stdout.flush()?;
    }
    Ok(())
}

fn run(args: &RunArgs) -> Result<(), i32> {
    let mut machine = match load_machine(args) {
        Ok(machine) => machine,
        Err(error) => {
            eprintln!("error: {error}");
            return Err(1);
        }
    };

    let mut stdout = io::stdout().lock();
    let mut trace = StderrTrace;
    let mut executed = 0_u64;

    while executed < args.ticks {
        if args.trace {
            machine.tick_traced(&mut trace);
        } else {
            machine.tick();
        }
        executed += 1;
        if executed % TTY_FLUSH_INTERVAL == 0 {
            if let Err(error) = flush_tty(&mut machine, &mut stdout) {
                eprintln!("error: failed to write TTY output: {error}");
                return Err(1);
            }
        }
    }

    if let Err(error) = flush_tty(&mut machine, &mut stdout) {
        eprintln!("error: failed to write TTY output: {error}");
        return Err(1);
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(args)) => match run(&args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
            }
            1
        }
    };

    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::path::PathBuf;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn parses_a_full_run_command() {
        let result = parse_run_args(
            os(&["scph1001.bin", "--exe", "hello.exe", "--ticks", "500", "--trace"]).into_iter(),
        )
        .expect("valid run args should parse");

        assert_eq!(
            result,
            RunArgs {
                bios: PathBuf::from("scph1001.bin"),
                exe: Some(PathBuf::from("hello.exe")),
                ticks: 500,
                trace: true,
            }
        );
    }

    #[test]
    fn defaults_to_running_forever_without_tracing() {
        let result = parse_run_args(os(&["bios.bin"]).into_iter()).expect("minimal args parse");
        assert_eq!(result.ticks, u64::MAX);
        assert!(!result.trace);
        assert_eq!(result.exe, None);
    }

    #[test]
    fn rejects_unknown_options_and_extra_paths() {
        assert!(parse_run_args(os(&["bios.bin", "--fast"]).into_iter()).is_err());
        assert!(parse_run_args(os(&["a.bin", "b.bin"]).into_iter()).is_err());
        assert!(parse_run_args(os(&[]).into_iter()).is_err());
    }

    #[test]
    fn rejects_malformed_tick_counts() {
        assert!(parse_run_args(os(&["bios.bin", "--ticks", "soon"]).into_iter()).is_err());
        assert!(parse_run_args(os(&["bios.bin", "--ticks"]).into_iter()).is_err());
    }

    #[test]
    fn unknown_commands_are_reported() {
        assert!(parse_args(os(&["fly"]).into_iter()).is_err());
        assert!(matches!(
            parse_args(os(&["--help"]).into_iter()),
            Ok(ParseResult::Help)
        ));
    }
}
