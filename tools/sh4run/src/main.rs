//! sh4run: run a raw SH4 binary under the translator.
//!
//! Loads a flat image into RAM, executes it until SLEEP (or until the
//! block budget runs out) and prints the final register file and block
//! cache statistics.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use sh4jit_backend::PortableCodeGen;
use sh4jit_exec::{cpu_exec_bounded, ExecEnv, ExitReason, JitConfig};
use sh4jit_frontend::sh4::cpu::{NUM_REGS, REG_NAMES};
use sh4jit_guest::{MachineConfig, Sh4Machine};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn parse_hex(s: &str) -> Result<u32, String> {
    let digits = s.trim_start_matches("0x");
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid hex value {s}: {e}"))
}

#[derive(Parser, Debug)]
#[command(name = "sh4run", about = "Run a raw SH4 binary until SLEEP")]
struct Args {
    /// Raw SH4 code image
    image: PathBuf,

    /// Guest address the image is loaded at
    #[arg(long, value_parser = parse_hex, default_value = "0x8c010000")]
    base: u32,

    /// Entry point (defaults to the load address)
    #[arg(long, value_parser = parse_hex)]
    entry: Option<u32>,

    /// Initial SR (defaults to the reset value)
    #[arg(long, value_parser = parse_hex)]
    sr: Option<u32>,

    /// RAM size in MiB
    #[arg(long, default_value_t = 16)]
    ram_mb: usize,

    /// Max guest instructions per block
    #[arg(long, default_value_t = 512)]
    max_insns: u32,

    /// Stop after this many executed blocks
    #[arg(long, default_value_t = 100_000_000)]
    max_blocks: u64,

    /// Disable direct block chaining
    #[arg(long)]
    no_chain: bool,

    /// Stop at the first guest exception instead of entering its handler
    #[arg(long)]
    stop_on_exception: bool,
}

fn print_regs(m: &Sh4Machine) {
    for i in 0..NUM_REGS {
        let val = m.cpu.read_reg(i as u32);
        print!("{:>8}={val:08x}", REG_NAMES[i]);
        if i % 4 == 3 || i + 1 == NUM_REGS {
            println!();
        } else {
            print!(" ");
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let image = fs::read(&args.image).unwrap_or_else(|e| {
        eprintln!("failed to read {}: {e}", args.image.display());
        process::exit(1);
    });

    let config = MachineConfig {
        ram_size: args.ram_mb << 20,
        entry_pc: args.entry.unwrap_or(args.base),
        sr: args.sr,
        ..MachineConfig::default()
    };
    let mut machine = Sh4Machine::new(&config);
    if !machine.load_image(args.base, &image) {
        eprintln!(
            "image of {} bytes does not fit in RAM at {:#010x}",
            image.len(),
            args.base
        );
        process::exit(1);
    }

    let jit_config = JitConfig {
        max_insns: args.max_insns,
        chain_blocks: !args.no_chain,
        ..JitConfig::default()
    };
    let mut env = ExecEnv::with_config(PortableCodeGen::new(), jit_config);

    let mut budget = args.max_blocks;
    let reason = loop {
        let before = env.stats.blocks_executed;
        let reason = match cpu_exec_bounded(&mut env, &mut machine, budget) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("execution failed at {:#010x}: {e}", machine.cpu.pc);
                process::exit(1);
            }
        };
        budget = budget.saturating_sub(env.stats.blocks_executed - before);
        match reason {
            ExitReason::Exception(expevt) if !args.stop_on_exception && budget > 0 => {
                info!(
                    expevt = format_args!("{expevt:#x}"),
                    spc = format_args!("{:#010x}", machine.cpu.spc),
                    "guest exception"
                );
            }
            other => break other,
        }
    };

    match reason {
        ExitReason::Sleep => println!("sleep at {:#010x}", machine.cpu.pc),
        ExitReason::Exception(expevt) => println!("exception {expevt:#x} at {:#010x}", machine.cpu.spc),
        ExitReason::Exit(code) => println!("exit {code:#x}"),
        ExitReason::BudgetExhausted => warn!(blocks = args.max_blocks, "block budget exhausted"),
    }
    print_regs(&machine);

    let s = &env.stats;
    println!(
        "blocks: {} executed, {} compiled, {} chained; lookups: {} ({} hits); \
         invalidated: {}; flushes: {}",
        s.blocks_executed, s.compiles, s.chained, s.lookups, s.hits, s.invalidated, s.flushes
    );
}
