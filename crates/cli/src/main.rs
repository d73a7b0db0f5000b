//! Multiprocessor cache simulator CLI.
//!
//! Runs one simulation over four per-core trace files and writes the report
//! to stdout and to the requested output file:
//!
//! ```text
//! l1sim -t app1 -s 5 -E 2 -b 5 -o app1.log
//! ```
//!
//! Core `i` reads `<prefix>_proc<i>.trace`. A missing trace file means that
//! core simply has nothing to execute.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::Parser;

use mesi_core::common::SimError;
use mesi_core::config::Config;
use mesi_core::sim::simulator::Simulator;
use mesi_core::sim::trace;

#[derive(Parser, Debug)]
#[command(
    name = "l1sim",
    about = "Cycle-driven simulator of MESI-coherent per-core L1 caches on a central snooping bus"
)]
struct Cli {
    /// Trace file prefix; core i reads <prefix>_proc<i>.trace.
    #[arg(short = 't', value_name = "PREFIX")]
    trace_prefix: String,

    /// Number of set index bits (number of sets = 2^s).
    #[arg(short = 's', value_name = "S")]
    set_bits: u32,

    /// Associativity (number of cache lines per set).
    #[arg(short = 'E', value_name = "E")]
    assoc: usize,

    /// Number of block bits (block size = 2^b bytes).
    #[arg(short = 'b', value_name = "B")]
    block_bits: u32,

    /// Output log file; the report also goes to stdout.
    #[arg(short = 'o', value_name = "FILE")]
    output: PathBuf,
}

fn main() {
    env_logger::init();

    // Help exits 0; every usage error (missing flag, unknown flag, stray
    // value) prints the message plus usage and exits 1.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if err.kind() == ErrorKind::DisplayHelp => {
            print!("{}", err);
            process::exit(0);
        }
        Err(err) => {
            eprint!("{}", err);
            process::exit(1);
        }
    };

    if let Err(err) = run(cli) {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), SimError> {
    let config = Config::new(cli.set_bits, cli.assoc, cli.block_bits);
    config.validate()?;

    let traces = trace::load_core_traces(&cli.trace_prefix, config.system.num_cores);
    let mut sim = Simulator::new(config, traces);
    sim.run();

    let report = sim.report(&cli.trace_prefix).render();
    print!("{}", report);
    fs::write(&cli.output, &report)?;
    Ok(())
}
