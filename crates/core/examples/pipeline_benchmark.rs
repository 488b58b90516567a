//! Lightweight parse/encode benchmark harness for local baselines.
//!
//! Run from repository root:
//! `cargo run -p intelhex_core --example pipeline_benchmark --release`

use std::time::Instant;

use intelhex_core::{EmitConfig, Record, emit_records, encode, parse_str};

/// Build a synthetic document of `len` bytes in 16-byte lines, with a gap
/// every `run` bytes so the assembler has several runs to flush.
fn synthetic_document(len: usize, run: usize) -> Result<String, String> {
    let mut out = String::new();
    let mut address = 0usize;
    for (i, chunk) in (0..len).map(|i| i as u8).collect::<Vec<_>>().chunks(run).enumerate() {
        let base = u16::try_from(address).map_err(|_| format!("run {i} exceeds 64 KiB"))?;
        let record = Record::data(base, chunk);
        out.push_str(&encode(&record, 16).map_err(|e| e.to_string())?);
        address += chunk.len() + 0x10;
    }
    out.push_str(intelhex_core::END_OF_FILE_LINE);
    Ok(out)
}

fn run_benchmark(label: &str, input: &str, iterations: usize) -> Result<(), String> {
    let parse_start = Instant::now();
    for _ in 0..iterations {
        let _ = parse_str(input);
    }
    let parse_elapsed = parse_start.elapsed();

    let parsed = parse_str(input);
    let cfg = EmitConfig::with_width(32);

    let emit_start = Instant::now();
    for _ in 0..iterations {
        emit_records(&parsed.records, &cfg).map_err(|e| e.to_string())?;
    }
    let emit_elapsed = emit_start.elapsed();

    println!("Benchmark: {label}");
    println!("  input_bytes: {}", input.len());
    println!("  records:     {}", parsed.records.len());
    println!(
        "  parse:  total={:?}, per_iter={:.3} ms",
        parse_elapsed,
        parse_elapsed.as_secs_f64() * 1000.0 / iterations as f64
    );
    println!(
        "  encode: total={:?}, per_iter={:.3} ms",
        emit_elapsed,
        emit_elapsed.as_secs_f64() * 1000.0 / iterations as f64
    );
    Ok(())
}

fn main() -> Result<(), String> {
    let iterations = std::env::var("IHEX_BENCH_ITERS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(500);

    let cases = [
        ("contiguous_16k", 16 * 1024, 16 * 1024),
        ("fragmented_16k", 16 * 1024, 256),
        ("contiguous_48k", 48 * 1024, 48 * 1024),
    ];

    for (label, len, run) in cases {
        let input = synthetic_document(len, run)?;
        run_benchmark(label, &input, iterations)?;
    }

    Ok(())
}
