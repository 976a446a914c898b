//! sh4jit-irdump: raw SH4 binary → IR dump tool.
//!
//! Loads a flat SH4 image, translates it block by block into IR and
//! prints the IR with the guest disassembly on each instruction header.
//! With `--host` each block is also lowered by the portable backend and
//! its host code hex-dumped.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use sh4jit_backend::{CodeBuffer, HostCodeGen, PortableCodeGen};
use sh4jit_core::dump::dump_ops_with;
use sh4jit_core::tb::TranslationBlock;
use sh4jit_core::{Context, MemOp};
use sh4jit_frontend::sh4::cpu::{REG_NAMES, TB_FLAG_MD};
use sh4jit_frontend::sh4::disas::disas;
use sh4jit_frontend::sh4::gen_block;
use sh4jit_guest::Bus;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn parse_hex(s: &str) -> Result<u32, String> {
    let digits = s.trim_start_matches("0x");
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid hex address {s}: {e}"))
}

#[derive(Parser, Debug)]
#[command(name = "sh4jit-irdump", about = "Dump the IR of a raw SH4 binary")]
struct Args {
    /// Raw SH4 code image
    image: PathBuf,

    /// Guest address the image is loaded at
    #[arg(long, value_parser = parse_hex, default_value = "0x8c010000")]
    base: u32,

    /// First block address (defaults to the load address)
    #[arg(long, value_parser = parse_hex)]
    start: Option<u32>,

    /// Max blocks to translate
    #[arg(long)]
    count: Option<usize>,

    /// Max guest instructions per block
    #[arg(long, default_value_t = 512)]
    max_insns: u32,

    /// Translate as user mode code (SR.MD = 0)
    #[arg(long)]
    user: bool,

    /// Also lower each block and dump the host code
    #[arg(long)]
    host: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn hex_dump(data: &[u8], w: &mut impl Write) -> io::Result<()> {
    for (i, chunk) in data.chunks(16).enumerate() {
        write!(w, "{:04x}: ", i * 16)?;
        for (j, byte) in chunk.iter().enumerate() {
            if j > 0 && j % 4 == 0 {
                write!(w, " ")?;
            }
            write!(w, " {byte:02x}")?;
        }
        writeln!(w)?;
    }
    Ok(())
}

fn reg_name(reg: u32) -> String {
    REG_NAMES
        .get(reg as usize)
        .map_or_else(|| format!("g{reg}"), |n| n.to_string())
}

fn run(args: &Args, image: &[u8], out: &mut impl Write) -> io::Result<()> {
    let mut bus = Bus::new(args.base, image.len());
    bus.load(args.base, image);
    let end = args.base.wrapping_add(image.len() as u32);

    let flags = if args.user { 0 } else { TB_FLAG_MD };
    let max_insns = TranslationBlock::max_insns(args.max_insns);
    let max_count = args.count.unwrap_or(usize::MAX);

    let mut ir = Context::new();
    let mut backend = PortableCodeGen::default();
    let mut code_buf = CodeBuffer::with_default_size();

    let mut pc = args.start.unwrap_or(args.base);
    let mut tb_count = 0usize;
    while pc >= args.base && pc < end && tb_count < max_count {
        let info = gen_block(&mut ir, &mut bus, pc, flags, max_insns);
        writeln!(
            out,
            "TB #{tb_count} @ 0x{pc:08x} ({} insns, {} bytes)",
            info.icount, info.size
        )?;
        let mem = &bus;
        dump_ops_with(&ir, out, reg_name, |pc, w| {
            let raw = mem.read(pc, MemOp::uw()) as u16;
            write!(w, "  {raw:04x}  {}", disas(pc, raw))
        })?;

        if args.host {
            match backend.compile(&mut ir, &mut code_buf) {
                Ok(code) => {
                    writeln!(out, "host code ({} bytes):", code.size)?;
                    hex_dump(&code_buf.as_slice()[code.offset..code.offset + code.size], out)?;
                }
                Err(e) => {
                    warn!(pc, error = %e, "backend lowering failed");
                    writeln!(out, "backend error: {e}")?;
                }
            }
        }
        writeln!(out)?;

        tb_count += 1;
        if info.size == 0 {
            break;
        }
        pc = pc.wrapping_add(info.size);
    }
    info!(blocks = tb_count, "dump complete");
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let image = fs::read(&args.image).unwrap_or_else(|e| {
        eprintln!("failed to read {}: {e}", args.image.display());
        process::exit(1);
    });

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => {
            let f = fs::File::create(path).unwrap_or_else(|e| {
                eprintln!("cannot create {}: {e}", path.display());
                process::exit(1);
            });
            Box::new(BufWriter::new(f))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    if let Err(e) = run(&args, &image, &mut out).and_then(|()| out.flush()) {
        eprintln!("write failed: {e}");
        process::exit(1);
    }
}
