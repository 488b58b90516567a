//! `ihex`: command-line front end for the Intel HEX core library.

mod render;

use std::fs;
use std::io::{self, Write};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use intelhex_core::{
    AddressOverflow, DEFAULT_BYTES_PER_LINE, EmitConfig, ParseResult, Record, RecordKind,
    emit_record, emit_records, parse, parse_str, to_pretty_json,
};
use intelhex_diagnostics::{self as diag, Diagnostic, Span, codes};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::render::{Format, print_summary, render_diagnostics, render_diagnostics_pretty};

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "ihex",
    version,
    about = "Intel HEX toolchain: read, write, check, and re-chunk Intel HEX files"
)]
struct Cli {
    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// Log filter written to stderr (e.g. "debug" or "intelhex_core=trace").
    /// Overrides `RUST_LOG`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Parse an Intel HEX file and print its merged records.
    Parse { file: String },

    /// Check an Intel HEX file for grammar and checksum errors.
    Check { file: String },

    /// Print the payload of every data record, one hex line per record.
    Read {
        file: String,
        /// Write the decoded bytes to stdout instead of hex text.
        #[arg(long)]
        binary: bool,
    },

    /// Encode a binary file as Intel HEX.
    Write {
        /// Path of the binary file, or the literal text with `--immediate`.
        input: String,
        /// Encode the argument itself rather than a file's contents.
        #[arg(long)]
        immediate: bool,
        /// Maximum data bytes per line.
        #[arg(long, default_value_t = DEFAULT_BYTES_PER_LINE, value_parser = clap::value_parser!(u8).range(1..))]
        width: u8,
        /// Load address of the first byte (decimal, or hex with `0x`).
        #[arg(long, default_value = "0", value_parser = parse_address)]
        address: u16,
        /// Wrap line addresses past 0xFFFF instead of failing.
        #[arg(long)]
        wrap: bool,
    },

    /// Re-chunk an Intel HEX file to a uniform line width.
    Format {
        file: String,
        /// Maximum data bytes per line.
        #[arg(long, default_value_t = DEFAULT_BYTES_PER_LINE, value_parser = clap::value_parser!(u8).range(1..))]
        width: u8,
        /// Write formatted output back to the file (in-place).
        #[arg(long, short, conflicts_with = "check")]
        write: bool,
        /// Check if the file is already formatted (exit 1 if not). For CI.
        #[arg(long, conflicts_with = "write")]
        check: bool,
    },

    /// Explain a diagnostic ID (e.g. IHEX1201).
    Explain { id: String },
}

fn parse_address(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    };
    parsed.map_err(|e| format!("invalid address '{s}': {e} (expected 0..=65535 or 0x0000..=0xFFFF)"))
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());
    let format = Format::resolve_or_detect(cli.output.as_deref());

    match cli.cmd {
        Cmd::Parse { file } => cmd_parse(&file, format)?,
        Cmd::Check { file } => cmd_check(&file, format)?,
        Cmd::Read { file, binary } => cmd_read(&file, binary, format)?,
        Cmd::Write {
            input,
            immediate,
            width,
            address,
            wrap,
        } => {
            let config = EmitConfig {
                max_bytes_per_line: width,
                address_overflow: if wrap {
                    AddressOverflow::Wrap
                } else {
                    AddressOverflow::Reject
                },
            };
            cmd_write(&input, immediate, address, &config)?;
        }
        Cmd::Format {
            file,
            width,
            write,
            check,
        } => cmd_format(&file, width, write, check, format)?,
        Cmd::Explain { id } => cmd_explain(&id, format)?,
    }

    Ok(())
}

/// Install the stderr subscriber. `--log-level` wins over `RUST_LOG`;
/// with neither, only warnings are shown.
fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

// ── Commands ────────────────────────────────────────────────────────────

fn read_input(file: &str) -> Result<String> {
    let input = fs::read_to_string(file).with_context(|| format!("failed to read '{file}'"))?;
    debug!(file, bytes = input.len(), "read input");
    Ok(input)
}

fn cmd_parse(file: &str, format: Format) -> Result<()> {
    let input = read_input(file)?;
    let res = parse_str(&input);
    info!(records = res.records.len(), errors = res.diagnostics.len(), "parsed");

    match format {
        Format::Json => {
            // Single valid JSON object to stdout.
            println!("{}", serde_json::to_string_pretty(&res)?);
        }
        Format::Pretty => {
            // Records to stdout, diagnostics to stderr.
            println!("{}", to_pretty_json(&res.records));
            render_diagnostics_pretty(&input, file, &res.diagnostics);
            print_summary(&res.diagnostics);
        }
    }

    exit_on_errors(&res.diagnostics);
    Ok(())
}

#[derive(Serialize)]
struct CheckReport {
    ok: bool,
    records: usize,
    data_bytes: usize,
    diagnostics: Vec<Diagnostic>,
}

fn cmd_check(file: &str, format: Format) -> Result<()> {
    let input = read_input(file)?;
    let res = parse_str(&input);
    let report = check_report(&res, input.len());

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Pretty => {
            render_diagnostics_pretty(&input, file, &report.diagnostics);
            print_summary(&report.diagnostics);
            if report.ok {
                eprintln!(
                    "{file}: ok ({} records, {} data bytes)",
                    report.records, report.data_bytes
                );
            }
        }
    }

    exit_on_errors(&res.diagnostics);
    Ok(())
}

/// Summarize a parse. A clean document without an end-of-file record gets
/// a warning pointing at the end of the input.
fn check_report(res: &ParseResult, input_len: usize) -> CheckReport {
    let mut diagnostics = res.diagnostics.clone();
    let has_eof = res.records.iter().any(|r| r.kind == RecordKind::EndOfFile);
    if !res.has_errors() && !has_eof {
        diagnostics.push(Diagnostic::warn(
            codes::MISSING_END_OF_FILE,
            "document has no end-of-file record",
            Some(Span::empty(input_len)),
        ));
    }
    CheckReport {
        ok: !res.has_errors(),
        records: res.records.iter().filter(|r| !r.is_error()).count(),
        data_bytes: res.data_records().map(|r| r.byte_count).sum(),
        diagnostics,
    }
}

fn cmd_read(file: &str, binary: bool, format: Format) -> Result<()> {
    let input = read_input(file)?;
    let mut records = parse(&input);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    // Records are written as they are assembled; a later error does not
    // hold back output that precedes it.
    for record in records.by_ref() {
        if !record.is_data() {
            continue;
        }
        if binary {
            let bytes = record
                .to_bytes()
                .with_context(|| format!("record at {:#06X} has invalid data", record.address))?;
            out.write_all(&bytes)?;
        } else {
            writeln!(out, "{}", record.data)?;
        }
    }
    out.flush()?;
    drop(out);

    let diagnostics = records.into_diagnostics();
    if !diagnostics.is_empty() {
        // stdout carries the payload, so diagnostics always go to stderr.
        match format {
            Format::Json => eprintln!("{}", serde_json::to_string_pretty(&diagnostics)?),
            Format::Pretty => {
                render_diagnostics_pretty(&input, file, &diagnostics);
                print_summary(&diagnostics);
            }
        }
    }

    exit_on_errors(&diagnostics);
    Ok(())
}

fn cmd_write(input: &str, immediate: bool, address: u16, config: &EmitConfig) -> Result<()> {
    let bytes = if immediate {
        input.as_bytes().to_vec()
    } else {
        fs::read(input).with_context(|| format!("failed to read '{input}'"))?
    };
    debug!(bytes = bytes.len(), address, "encoding");

    let record = Record::data(address, &bytes);
    let mut text = emit_record(&record, config)
        .with_context(|| format!("cannot encode {} bytes at {address:#06X}", bytes.len()))?;
    text.push_str(&emit_record(&Record::end_of_file(), config)?);

    print!("{text}");
    Ok(())
}

fn cmd_format(file: &str, width: u8, write: bool, check: bool, format: Format) -> Result<()> {
    let input = read_input(file)?;
    let res = parse_str(&input);

    // An invalid document cannot be re-chunked faithfully.
    if res.has_errors() {
        render_diagnostics(&input, file, &res.diagnostics, format)?;
        print_summary(&res.diagnostics);
        process::exit(1);
    }

    let formatted = emit_records(&res.records, &EmitConfig::with_width(width))
        .with_context(|| format!("cannot re-encode '{file}'"))?;
    let already_formatted = formatted == input;

    if check {
        status_message(
            format,
            "check",
            already_formatted,
            "already formatted",
            "not formatted",
            file,
        )?;
        if !already_formatted {
            process::exit(1);
        }
    } else if write {
        if !already_formatted {
            fs::write(file, &formatted).with_context(|| format!("failed to write '{file}'"))?;
        }
        status_message(
            format,
            "write",
            !already_formatted,
            "formatted",
            "already formatted",
            file,
        )?;
    } else {
        print!("{formatted}");
    }

    Ok(())
}

#[derive(Serialize)]
struct Status<'a> {
    mode: &'a str,
    status: &'a str,
    file: &'a str,
}

/// Emit a status message for --check / --write in the appropriate format.
fn status_message(
    format: Format,
    mode: &str,
    condition: bool,
    if_true: &str,
    if_false: &str,
    file: &str,
) -> Result<()> {
    let status = if condition { if_true } else { if_false };
    match format {
        Format::Json => {
            let out = Status { mode, status, file };
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => eprintln!("{status}: {file}"),
    }
    Ok(())
}

fn cmd_explain(id: &str, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            let out = serde_json::json!({
                "id": id,
                "explanation": diag::explain(id),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            if let Some(text) = diag::explain(id) {
                use ariadne::Fmt;
                println!("{}: {}", id.fg(ariadne::Color::Cyan), text);
            } else {
                println!("{id}: (no explanation available)");
            }
        }
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Exit with code 1 if any diagnostic is an error.
fn exit_on_errors(diagnostics: &[Diagnostic]) {
    if diagnostics.iter().any(Diagnostic::is_error) {
        process::exit(1);
    }
}
