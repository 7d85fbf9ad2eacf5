// Command-line front end for vbprox.
//
// Subcommands cover the posting list lifecycle: compress raw u64 files,
// decompress them again, profile both codecs on one file, inspect a
// compressed list, and run batch proximity intersections.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::intersect::{BatchOptions, BatchReport, Window, parse_pairs, run_batch};
use crate::io::{
    CompressMode, DirectorySource, compress_file, decompress_file, read_bytes, with_suffix,
};
use crate::vbyte::{self, MAX_VBYTE_LEN};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const DEFAULT_PREFIX: &str = "F";
const DECODED_SUFFIX: &str = ".dec";

const BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Variable-byte posting list codec and proximity intersection.
#[derive(Parser, Debug)]
#[command(
    name = "vbprox",
    version,
    about = "Variable-byte posting list codec and proximity intersection",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Compress a raw file of native-endian u64 records.
    Compress(CompressArgs),
    /// Decompress a vbyte file back to raw u64 records.
    Decompress(DecompressArgs),
    /// Compress, sort-compress and decompress one file, timing each stage.
    Profile(ProfileArgs),
    /// Proximity-intersect pairs of compressed lists.
    Intersect(IntersectArgs),
    /// Print value count, range and ordering of a compressed list.
    Inspect(InspectArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Args, Debug)]
struct CompressArgs {
    /// Sort the list and encode successive differences.
    #[arg(long)]
    sorted: bool,

    /// Raw input file.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Output file (default: input name + `.vb` or `.sorted.vb`).
    #[arg(value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DecompressArgs {
    /// Input was written with `compress --sorted`.
    #[arg(long)]
    delta: bool,

    /// Compressed input file.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Output file (default: input name + `.dec`).
    #[arg(value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ProfileArgs {
    /// Raw input file.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
}

#[derive(Args, Debug)]
struct IntersectArgs {
    /// Distance allowed below each element of the first list.
    lower: u64,

    /// Distance allowed above each element of the first list.
    upper: u64,

    /// Pairs file: two list identifiers per line.
    #[arg(value_hint = ValueHint::FilePath)]
    pairs: PathBuf,

    /// Directory holding the compressed lists.
    #[arg(long, short = 'd', default_value = ".", value_hint = ValueHint::DirPath)]
    dir: PathBuf,

    /// File name prefix before the list identifier.
    #[arg(long, default_value = DEFAULT_PREFIX)]
    prefix: String,

    /// File name suffix after the list identifier
    /// (default: `.vb`, or `.sorted.vb` with --delta).
    #[arg(long)]
    suffix: Option<String>,

    /// Lists were written with `compress --sorted`.
    #[arg(long)]
    delta: bool,

    /// Print the matched values of every pair.
    #[arg(long)]
    list: bool,

    /// Report failing pairs and continue with the rest.
    #[arg(short = 'k', long = "keep-going")]
    keep_going: bool,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Input was written with `compress --sorted`.
    #[arg(long)]
    delta: bool,

    /// Compressed input file.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
}

// ---------------------------------------------------------------------------
// Resolved options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Compress,
    Decompress,
    Profile,
    Intersect,
    Inspect,
    Config,
}

#[derive(Debug)]
struct Options {
    command: Command,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    input_file: PathBuf,
    output_file: Option<PathBuf>,
    mode: CompressMode,
    window: Window,
    source: DirectorySource,
    list_matches: bool,
    keep_going: bool,
}

impl Options {
    fn new(command: Command, cli: &Cli) -> Self {
        Self {
            command,
            force: cli.force,
            quiet: cli.quiet,
            verbose: cli.verbose.min(2),
            json_output: cli.json_output,
            input_file: PathBuf::new(),
            output_file: None,
            mode: CompressMode::Plain,
            window: Window::default(),
            source: DirectorySource::default(),
            list_matches: false,
            keep_going: false,
        }
    }

    fn delta(&self) -> bool {
        self.mode.is_delta()
    }
}

fn mode_for(sorted: bool) -> CompressMode {
    if sorted {
        CompressMode::Sorted
    } else {
        CompressMode::Plain
    }
}

fn resolve_options(cli: Cli) -> Options {
    match &cli.command {
        Cmd::Compress(args) => Options {
            input_file: args.input.clone(),
            output_file: args.output.clone(),
            mode: mode_for(args.sorted),
            ..Options::new(Command::Compress, &cli)
        },
        Cmd::Decompress(args) => Options {
            input_file: args.input.clone(),
            output_file: args.output.clone(),
            mode: mode_for(args.delta),
            ..Options::new(Command::Decompress, &cli)
        },
        Cmd::Profile(args) => Options {
            input_file: args.input.clone(),
            ..Options::new(Command::Profile, &cli)
        },
        Cmd::Intersect(args) => {
            let mode = mode_for(args.delta);
            Options {
                input_file: args.pairs.clone(),
                mode,
                window: Window::new(args.lower, args.upper),
                source: DirectorySource {
                    dir: args.dir.clone(),
                    prefix: args.prefix.clone(),
                    suffix: args
                        .suffix
                        .clone()
                        .unwrap_or_else(|| mode.suffix().to_string()),
                    delta: args.delta,
                },
                list_matches: args.list,
                keep_going: args.keep_going,
                ..Options::new(Command::Intersect, &cli)
            }
        }
        Cmd::Inspect(args) => Options {
            input_file: args.input.clone(),
            mode: mode_for(args.delta),
            ..Options::new(Command::Inspect, &cli)
        },
        Cmd::Config => Options::new(Command::Config, &cli),
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("vbprox".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Refuse to clobber an existing file unless `--force` was given.
fn check_output(path: &Path, force: bool) -> Result<(), String> {
    if path.exists() && !force {
        return Err(format!(
            "output file exists, use -f to overwrite: {}",
            path.display()
        ));
    }
    Ok(())
}

fn emit_json(json: &serde_json::Value) {
    eprintln!("{json:#}");
}

fn mode_name(mode: CompressMode) -> &'static str {
    match mode {
        CompressMode::Plain => "plain",
        CompressMode::Sorted => "sorted",
    }
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("vbprox version {version} (Rust)");

    let parallel = cfg!(feature = "parallel") as u8;
    let little_endian = cfg!(target_endian = "little") as u8;
    let ptr_size = std::mem::size_of::<*const ()>();

    eprintln!("PARALLEL={parallel}");
    eprintln!("NATIVE_LITTLE_ENDIAN={little_endian}");
    eprintln!("MAX_VBYTE_LEN={MAX_VBYTE_LEN}");
    eprintln!("DEFAULT_PREFIX={DEFAULT_PREFIX}");
    eprintln!("PLAIN_SUFFIX={}", CompressMode::Plain.suffix());
    eprintln!("SORTED_SUFFIX={}", CompressMode::Sorted.suffix());
    eprintln!("DECODED_SUFFIX={DECODED_SUFFIX}");
    eprintln!("sizeof(usize)={ptr_size}");

    0
}

// ---------------------------------------------------------------------------
// Compress / decompress commands
// ---------------------------------------------------------------------------

fn cmd_compress(opts: &Options) -> i32 {
    let output = opts
        .output_file
        .clone()
        .unwrap_or_else(|| with_suffix(&opts.input_file, opts.mode.suffix()));
    if let Err(msg) = check_output(&output, opts.force) {
        eprintln!("vbprox: {msg}");
        return 1;
    }

    let started = Instant::now();
    let stats = match compress_file(&opts.input_file, &output, opts.mode) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("vbprox: compress error: {e}");
            return 1;
        }
    };
    let secs = started.elapsed().as_secs_f64();

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "vbprox: compress ({}): {} values, {} -> {} bytes, ratio {:.4}, {secs:.6}s",
            mode_name(opts.mode),
            stats.values,
            stats.input_size,
            stats.output_size,
            stats.ratio()
        );
    }

    if opts.json_output {
        emit_json(&serde_json::json!({
            "command": "compress",
            "mode": mode_name(opts.mode),
            "output": output.display().to_string(),
            "values": stats.values,
            "input_size": stats.input_size,
            "output_size": stats.output_size,
            "ratio": stats.ratio(),
            "seconds": secs,
        }));
    }

    0
}

fn cmd_decompress(opts: &Options) -> i32 {
    let output = opts
        .output_file
        .clone()
        .unwrap_or_else(|| with_suffix(&opts.input_file, DECODED_SUFFIX));
    if let Err(msg) = check_output(&output, opts.force) {
        eprintln!("vbprox: {msg}");
        return 1;
    }

    let started = Instant::now();
    let stats = match decompress_file(&opts.input_file, &output, opts.delta()) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("vbprox: decompress error: {e}");
            return 1;
        }
    };
    let secs = started.elapsed().as_secs_f64();

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "vbprox: decompress: {} values, {} -> {} bytes, {secs:.6}s",
            stats.values, stats.input_size, stats.output_size
        );
    }

    if opts.json_output {
        emit_json(&serde_json::json!({
            "command": "decompress",
            "delta": opts.delta(),
            "output": output.display().to_string(),
            "values": stats.values,
            "input_size": stats.input_size,
            "output_size": stats.output_size,
            "seconds": secs,
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Profile command
// ---------------------------------------------------------------------------

fn cmd_profile(opts: &Options) -> i32 {
    let plain = with_suffix(&opts.input_file, CompressMode::Plain.suffix());
    let sorted = with_suffix(&opts.input_file, CompressMode::Sorted.suffix());
    let decoded = with_suffix(&plain, DECODED_SUFFIX);
    for path in [&plain, &sorted, &decoded] {
        if let Err(msg) = check_output(path, opts.force) {
            eprintln!("vbprox: {msg}");
            return 1;
        }
    }

    let started = Instant::now();
    let plain_stats = match compress_file(&opts.input_file, &plain, CompressMode::Plain) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("vbprox: compress error: {e}");
            return 1;
        }
    };
    let compress_secs = started.elapsed().as_secs_f64();

    let started = Instant::now();
    let sorted_stats = match compress_file(&opts.input_file, &sorted, CompressMode::Sorted) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("vbprox: sort compress error: {e}");
            return 1;
        }
    };
    let sort_compress_secs = started.elapsed().as_secs_f64();

    let started = Instant::now();
    if let Err(e) = decompress_file(&plain, &decoded, false) {
        eprintln!("vbprox: decompress error: {e}");
        return 1;
    }
    let decompress_secs = started.elapsed().as_secs_f64();

    if !opts.quiet {
        println!(
            "compression took: {compress_secs:.6}s (ratio {:.4})",
            plain_stats.ratio()
        );
        println!(
            "sort compression took: {sort_compress_secs:.6}s (ratio {:.4})",
            sorted_stats.ratio()
        );
        println!("decompression took: {decompress_secs:.6}s");
    }

    if opts.json_output {
        emit_json(&serde_json::json!({
            "command": "profile",
            "values": plain_stats.values,
            "input_size": plain_stats.input_size,
            "plain_size": plain_stats.output_size,
            "sorted_size": sorted_stats.output_size,
            "compress_seconds": compress_secs,
            "sort_compress_seconds": sort_compress_secs,
            "decompress_seconds": decompress_secs,
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Intersect command
// ---------------------------------------------------------------------------

fn cmd_intersect(opts: &Options) -> i32 {
    let text = match std::fs::read_to_string(&opts.input_file) {
        Ok(t) => t,
        Err(e) => {
            eprintln!(
                "vbprox: pairs file: {}: {e}",
                opts.input_file.display()
            );
            return 1;
        }
    };
    let pairs = match parse_pairs(&text) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("vbprox: {}: {e}", opts.input_file.display());
            return 1;
        }
    };

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "vbprox: {} pair(s) from {}, window [-{}, +{}], lists {}/{}<id>{}",
            pairs.len(),
            opts.input_file.display(),
            opts.window.lower,
            opts.window.upper,
            opts.source.dir.display(),
            opts.source.prefix,
            opts.source.suffix
        );
    }

    let batch_opts = BatchOptions {
        window: opts.window,
        collect_matches: opts.list_matches,
        keep_going: opts.keep_going,
    };
    let report = run_batch(&opts.source, &pairs, &batch_opts);

    if let Err(e) = print_report(&report) {
        eprintln!("vbprox: write error: {e}");
        return 1;
    }

    for outcome in &report.outcomes {
        if let Err(e) = &outcome.result {
            eprintln!("vbprox: pair {} {}: {e}", outcome.pair.a, outcome.pair.b);
        }
    }

    let secs = report.elapsed.as_secs_f64();
    let cpu_secs = report.cpu.as_secs_f64();
    if !opts.quiet {
        eprintln!(
            "vbprox: {} pair(s), {} match(es), cpu time taken: {cpu_secs:.6}s, wall clock time taken: {secs:.6}s",
            report.outcomes.len(),
            report.total_matches()
        );
    }

    if opts.json_output {
        let sizes: Vec<Option<usize>> = report
            .outcomes
            .iter()
            .map(|o| o.result.as_ref().ok().map(|m| m.count))
            .collect();
        emit_json(&serde_json::json!({
            "command": "intersect",
            "lower": opts.window.lower,
            "upper": opts.window.upper,
            "pairs": report.outcomes.len(),
            "failures": report.failures(),
            "total_matches": report.total_matches(),
            "sizes": sizes,
            "seconds": secs,
            "cpu_seconds": cpu_secs,
        }));
    }

    if report.is_success() { 0 } else { 1 }
}

/// One line per successful pair: `A B COUNT[: v1 v2 ...]`.
fn print_report(report: &BatchReport) -> io::Result<()> {
    let mut out = BufWriter::with_capacity(BUF_SIZE, io::stdout().lock());
    for outcome in &report.outcomes {
        let Ok(m) = &outcome.result else {
            continue;
        };
        write!(out, "{} {} {}", outcome.pair.a, outcome.pair.b, m.count)?;
        if let Some(values) = &m.matches {
            write!(out, ":")?;
            for v in values {
                write!(out, " {v}")?;
            }
        }
        writeln!(out)?;
    }
    out.flush()
}

// ---------------------------------------------------------------------------
// Inspect command
// ---------------------------------------------------------------------------

fn cmd_inspect(opts: &Options) -> i32 {
    let data = match read_bytes(&opts.input_file) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("vbprox: {e}");
            return 1;
        }
    };
    let summary = match vbyte::summarize(&data, opts.delta()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("vbprox: {}: {e}", opts.input_file.display());
            return 1;
        }
    };

    if !opts.quiet {
        let fmt = |v: Option<u64>| v.map_or_else(|| "-".to_string(), |v| v.to_string());
        println!("values: {}", summary.values);
        println!("bytes: {}", summary.bytes);
        if summary.values > 0 {
            println!(
                "bytes/value: {:.3}",
                summary.bytes as f64 / summary.values as f64
            );
        }
        println!("min: {}", fmt(summary.min));
        println!("max: {}", fmt(summary.max));
        println!("ascending: {}", summary.ascending);
    }

    if opts.json_output {
        emit_json(&serde_json::json!({
            "command": "inspect",
            "delta": opts.delta(),
            "values": summary.values,
            "bytes": summary.bytes,
            "min": summary.min,
            "max": summary.max,
            "ascending": summary.ascending,
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let opts = resolve_options(cli);

    let default_filter = match opts.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let exit_code = match opts.command {
        Command::Compress => cmd_compress(&opts),
        Command::Decompress => cmd_decompress(&opts),
        Command::Profile => cmd_profile(&opts),
        Command::Intersect => cmd_intersect(&opts),
        Command::Inspect => cmd_inspect(&opts),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
