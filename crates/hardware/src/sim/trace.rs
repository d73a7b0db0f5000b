//! Memory-reference trace reading.
//!
//! A trace is an ordered sequence of `(op, address)` records, one per line:
//! `R 0x1a2b` or `W ff00`. Addresses are 32-bit hexadecimal with an optional
//! `0x` prefix. Core `i` reads `<prefix>_proc<i>.trace`; a file that cannot
//! be opened yields an empty trace (the core finishes immediately), and
//! malformed lines are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::warn;

/// Memory access type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// Load from the address.
    Read,
    /// Store to the address.
    Write,
}

/// One trace record: an access type and a 32-bit byte address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceEntry {
    /// Access type.
    pub op: Op,
    /// Byte address referenced.
    pub addr: u32,
}

impl TraceEntry {
    /// Creates a trace record.
    pub fn new(op: Op, addr: u32) -> Self {
        Self { op, addr }
    }
}

/// Trace file name for one core under the given prefix.
pub fn trace_path(prefix: &str, core: usize) -> String {
    format!("{}_proc{}.trace", prefix, core)
}

/// Parses one trace line; `None` for blank or malformed lines.
fn parse_line(line: &str) -> Option<TraceEntry> {
    let mut tokens = line.split_whitespace();
    let op = match tokens.next()? {
        "R" => Op::Read,
        "W" => Op::Write,
        _ => return None,
    };
    let addr = tokens.next()?;
    let digits = addr
        .strip_prefix("0x")
        .or_else(|| addr.strip_prefix("0X"))
        .unwrap_or(addr);
    let addr = u32::from_str_radix(digits, 16).ok()?;
    Some(TraceEntry::new(op, addr))
}

/// Reads one trace file, skipping malformed lines.
///
/// An unopenable file is logged and treated as an empty trace.
pub fn read_trace<P: AsRef<Path>>(path: P) -> Vec<TraceEntry> {
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            warn!("trace file {} unreadable ({}); treating as empty", path.display(), err);
            return Vec::new();
        }
    };
    BufReader::new(file)
        .lines()
        .filter_map(Result::ok)
        .filter_map(|line| parse_line(&line))
        .collect()
}

/// Loads the traces for all cores under `prefix`, in core order.
pub fn load_core_traces(prefix: &str, num_cores: usize) -> Vec<Vec<TraceEntry>> {
    (0..num_cores)
        .map(|core| read_trace(trace_path(prefix, core)))
        .collect()
}
