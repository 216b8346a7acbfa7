use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, info};
use mtx_machines::{BoardConfig, registry};

mod config;
mod emulator;
mod rom_path;

use config::FileConfig;
use emulator::SerialPump;

const DEFAULT_MACHINE: &str = "mtx512";
const DEFAULT_FRAMES: u64 = 50;
const DEFAULT_ROM_DIR: &str = "roms";

/// Headless Memotech MTX emulator.
#[derive(Parser, Debug)]
#[command(name = "mtx", version)]
struct Cli {
    /// Machine to run (see --list)
    machine: Option<String>,

    /// Directory (or ZIP) holding the ROM images [default: roms]
    #[arg(long)]
    rom_dir: Option<PathBuf>,

    /// Frames to run (50 per emulated second)
    #[arg(long)]
    frames: Option<u64>,

    /// Configuration file [default: <config dir>/mtx/config.toml]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Feed this file to the serial port
    #[arg(long)]
    serial_in: Option<PathBuf>,

    /// Write serial output here instead of stdout
    #[arg(long)]
    serial_out: Option<PathBuf>,

    /// Restore a saved state before running
    #[arg(long)]
    load_state: Option<PathBuf>,

    /// Save the state after running
    #[arg(long)]
    save_state: Option<PathBuf>,

    /// Log every interrupt acknowledge and RETI
    #[arg(long)]
    trace_interrupts: bool,

    /// List the available machines and exit
    #[arg(long)]
    list: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(cli: &Cli) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info });
    if cli.trace_interrupts {
        builder.filter_module("mtx_machines::mtx", LevelFilter::Trace);
    }
    // RUST_LOG still wins
    builder.parse_default_env();
    builder.init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    if cli.list {
        for entry in registry::all() {
            println!("{:<8} {} RAM pages, ROMs in {}/", entry.name, entry.ram_pages, entry.rom_name);
        }
        return Ok(());
    }

    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::load_default()?,
    };

    let machine_name = cli
        .machine
        .clone()
        .or(file.machine)
        .unwrap_or_else(|| DEFAULT_MACHINE.to_string());
    let Some(entry) = registry::find(&machine_name) else {
        let names: Vec<_> = registry::all().iter().map(|e| e.name).collect();
        bail!("unknown machine {machine_name} (available: {})", names.join(", "));
    };

    let rom_dir = cli
        .rom_dir
        .clone()
        .or(file.rom_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ROM_DIR));
    let frames = cli.frames.or(file.frames).unwrap_or(DEFAULT_FRAMES);

    let defaults = BoardConfig::default();
    let board = BoardConfig {
        daisy_order: file.board.daisy_order.unwrap_or(defaults.daisy_order),
        ram_pages: file.board.ram_pages.unwrap_or(entry.ram_pages),
    };

    let rom_set = rom_path::load_rom_set(entry.rom_name, &rom_dir)
        .with_context(|| format!("loading ROMs from {}", rom_dir.display()))?;
    let mut machine = (entry.create)(&rom_set, &board)
        .with_context(|| format!("initializing {machine_name}"))?;
    machine.reset();
    info!("{machine_name}: {} RAM pages, daisy chain {:?}", board.ram_pages, board.daisy_order);

    if let Some(path) = &cli.load_state {
        let data = std::fs::read(path)
            .with_context(|| format!("reading state {}", path.display()))?;
        machine.load_state(&data)?;
        info!("Restored state from {}", path.display());
    }

    let input = match &cli.serial_in {
        Some(path) => Some(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => None,
    };
    let output: Box<dyn Write> = match &cli.serial_out {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    let mut pump = SerialPump::new(input, output);

    emulator::run(machine.as_mut(), frames, &mut pump)?;

    if let Some(path) = &cli.save_state {
        let data = machine.save_state()?;
        std::fs::write(path, data)
            .with_context(|| format!("writing state {}", path.display()))?;
        info!("Saved state to {}", path.display());
    }

    Ok(())
}
