//! Trace reader unit tests.
//!
//! Exercises line parsing, malformed-line skipping, the missing-file
//! fallback, and per-core trace loading against real temporary files.

use std::fs;
use std::io::Write;

use tempfile::NamedTempFile;

use mesi_core::sim::trace::{self, Op, TraceEntry};

/// Well-formed lines parse with and without the 0x prefix.
#[test]
fn parses_reads_and_writes() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "R 0x10").unwrap();
    writeln!(file, "W ff0").unwrap();
    writeln!(file, "R 0XABCD").unwrap();

    let entries = trace::read_trace(file.path());
    assert_eq!(
        entries,
        vec![
            TraceEntry::new(Op::Read, 0x10),
            TraceEntry::new(Op::Write, 0xff0),
            TraceEntry::new(Op::Read, 0xABCD),
        ]
    );
}

/// Blank and malformed lines are skipped silently.
#[test]
fn skips_malformed_lines() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file).unwrap();
    writeln!(file, "R 0x10").unwrap();
    writeln!(file, "X 0x20").unwrap();
    writeln!(file, "W").unwrap();
    writeln!(file, "W zz").unwrap();
    writeln!(file, "   ").unwrap();
    writeln!(file, "W 0x30").unwrap();

    let entries = trace::read_trace(file.path());
    assert_eq!(
        entries,
        vec![
            TraceEntry::new(Op::Read, 0x10),
            TraceEntry::new(Op::Write, 0x30),
        ]
    );
}

/// Leading whitespace and trailing tokens are tolerated.
#[test]
fn tolerates_extra_whitespace() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "  R   0x40   trailing junk").unwrap();

    let entries = trace::read_trace(file.path());
    assert_eq!(entries, vec![TraceEntry::new(Op::Read, 0x40)]);
}

/// A file that cannot be opened behaves as an empty trace.
#[test]
fn missing_file_is_empty_trace() {
    let entries = trace::read_trace("/nonexistent/definitely_missing.trace");
    assert!(entries.is_empty());
}

/// Per-core file naming follows `<prefix>_proc<i>.trace`.
#[test]
fn trace_path_naming() {
    assert_eq!(trace::trace_path("app1", 0), "app1_proc0.trace");
    assert_eq!(trace::trace_path("runs/app1", 3), "runs/app1_proc3.trace");
}

/// Loading a prefix fills in empty traces for cores without a file.
#[test]
fn load_core_traces_with_partial_files() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("app").to_string_lossy().into_owned();

    fs::write(format!("{}_proc0.trace", prefix), "R 0x0\nW 0x10\n").unwrap();
    fs::write(format!("{}_proc2.trace", prefix), "W 0x40\n").unwrap();

    let traces = trace::load_core_traces(&prefix, 4);
    assert_eq!(traces.len(), 4);
    assert_eq!(traces[0].len(), 2);
    assert!(traces[1].is_empty());
    assert_eq!(traces[2], vec![TraceEntry::new(Op::Write, 0x40)]);
    assert!(traces[3].is_empty());
}
