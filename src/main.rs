#![warn(clippy::all, rust_2018_idioms)]

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use hc05_emulator::emulator::{Emulator, EmulatorConfig, IntoAddress, OpcodeTable};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "hc05",
    about = "Run or disassemble a raw 68HC05 program image."
)]
struct Args {
    /// Raw binary image to load.
    program: PathBuf,

    /// Load address of the image.
    #[arg(long, value_name = "ADDR", default_value = "0x0000", value_parser = parse_address)]
    origin: u16,

    /// Initial PC. Defaults to the load address.
    #[arg(long, value_name = "ADDR", value_parser = parse_address)]
    entry: Option<u16>,

    /// Number of instructions to execute (or list with --trace).
    #[arg(long, default_value_t = 1_000)]
    steps: usize,

    /// Decode instructions without executing them.
    #[arg(long, default_value_t = false)]
    trace: bool,

    /// RON file overriding the architectural constants.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Opcode map replacing the built in one.
    #[arg(long, value_name = "PATH")]
    opcodes: Option<PathBuf>,
}

fn parse_address(raw: &str) -> Result<u16, String> {
    raw.into_address().map_err(|e| e.to_string())
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => EmulatorConfig::load(path)?,
        None => EmulatorConfig::default(),
    };
    let mut emulator = Emulator::with_config(config)?;
    if let Some(path) = &args.opcodes {
        let table = OpcodeTable::parse(&fs::read_to_string(path)?)?;
        emulator = emulator.with_opcode_table(Arc::new(table));
    }

    let image = fs::read(&args.program)?;
    emulator.load_program(args.origin, &image)?;
    if let Some(entry) = args.entry {
        emulator.registers.set_pc(entry as u32)?;
    }

    if args.trace {
        let start = emulator.registers.pc();
        for line in emulator.disassemble(start, args.steps)? {
            let bytes: Vec<String> = line.bytes.iter().map(|b| format!("{b:02X}")).collect();
            println!("0x{:04X}: {:<9} {}", line.address, bytes.join(" "), line);
        }
        return Ok(());
    }

    let result = emulator.run(args.steps);
    println!("{}", emulator.snapshot());
    print!("{}", emulator.memory);
    result?;
    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    if let Err(err) = run(args) {
        tracing::error!("{err}");
        eprintln!("fatal: {err}");
        std::process::exit(1);
    }
}
