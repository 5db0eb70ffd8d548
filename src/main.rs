use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{Level, LevelFilter, Log, Metadata, Record};

use zone_borders::ascii;
use zone_borders::border::{trace_borders, PassParams};
use zone_borders::config::LayoutConfig;
use zone_borders::export;
use zone_borders::layout::{layout_passes, LayoutOptions};
use zone_borders::seeds::LayoutSeeds;
use zone_borders::zones::parse_zone_map;

#[derive(Parser, Debug)]
#[command(name = "zone_borders")]
#[command(about = "Trace zone borders on an ASCII map and lay out walls and passes")]
struct Args {
    /// ASCII zone map, one character per cell
    #[arg(short, long)]
    map: PathBuf,

    /// JSON layout configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Random seed (overrides the config; random if neither is given)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Narrowest pass for pairs without an explicit connection
    #[arg(long)]
    min_pass_width: Option<usize>,

    /// Widest pass for pairs without an explicit connection
    #[arg(long)]
    max_pass_width: Option<usize>,

    /// Shortest inner wall for pairs without an explicit connection
    #[arg(long)]
    min_wall: Option<usize>,

    /// Longest wall for pairs without an explicit connection
    #[arg(long)]
    max_wall: Option<usize>,

    /// Process borders one after another instead of on the thread pool
    #[arg(long)]
    sequential: bool,

    /// Export the layout as text (e.g., "layout.txt")
    #[arg(long)]
    ascii: Option<PathBuf>,

    /// Export borders and runs as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Export a PNG rendering
    #[arg(long)]
    png: Option<PathBuf>,

    /// Pixels per cell in the PNG export
    #[arg(long, default_value = "8")]
    scale: u32,

    /// More diagnostics on stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Minimal stderr logger for library diagnostics.
struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level() && metadata.target().starts_with("zone_borders")
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let tag = match record.level() {
                Level::Error => "error",
                Level::Warn => "warn",
                Level::Info => "info",
                Level::Debug => "debug",
                Level::Trace => "trace",
            };
            eprintln!("[{}] {}", tag, record.args());
        }
    }

    fn flush(&self) {}
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn override_params(base: PassParams, args: &Args) -> PassParams {
    PassParams {
        min_pass_width: args.min_pass_width.unwrap_or(base.min_pass_width),
        max_pass_width: args.max_pass_width.unwrap_or(base.max_pass_width),
        min_wall_length: args.min_wall.unwrap_or(base.min_wall_length),
        max_wall_length: args.max_wall.unwrap_or(base.max_wall_length),
    }
}

fn run(args: Args) -> Result<(), String> {
    let text = std::fs::read_to_string(&args.map)
        .map_err(|e| format!("Failed to read map {}: {}", args.map.display(), e))?;
    let (grid, legend) = parse_zone_map(&text).map_err(|e| format!("Invalid map: {}", e))?;
    println!("Loaded {}x{} map with {} zones", grid.width, grid.height, legend.len());

    let mut config = match &args.config {
        Some(path) => LayoutConfig::load(path).map_err(|e| format!("Invalid config {}: {}", path.display(), e))?,
        None => LayoutConfig::default(),
    };
    let overridden = args.min_pass_width.is_some()
        || args.max_pass_width.is_some()
        || args.min_wall.is_some()
        || args.max_wall.is_some();
    if overridden {
        config.default_pass = Some(override_params(config.default_pass.unwrap_or_default(), &args));
    }
    if args.sequential {
        config.parallel = false;
    }
    config.validate().map_err(|e| format!("Invalid parameters: {}", e))?;

    let seed = args.seed.or(config.seed).unwrap_or_else(|| rand::random());
    println!("Laying out passes with seed: {}", seed);

    println!("Tracing borders...");
    let borders = trace_borders(&grid).map_err(|e| format!("Tracing failed: {}", e))?;
    println!(
        "Traced {} borders ({} segments) between {} zone pairs",
        borders.border_count(),
        borders.segment_count(),
        borders.pair_count()
    );

    let graph = config.zone_graph(&legend).map_err(|e| format!("Invalid config: {}", e))?;
    let options = LayoutOptions {
        seeds: LayoutSeeds::from_master(seed),
        parallel: config.parallel,
    };

    println!("Sampling pass layouts...");
    let report = layout_passes(&borders, &graph, &options);
    println!(
        "Laid out {} borders with {} passes ({} failed, {} pairs skipped)",
        report.successes().count(),
        report.pass_count(),
        report.failures().count(),
        report.skipped.len()
    );
    for (b, err) in report.failures() {
        eprintln!(
            "  {}-{} #{}: {}",
            ascii::zone_char(b.pair.low(), &legend),
            ascii::zone_char(b.pair.high(), &legend),
            b.index,
            err
        );
    }

    if let Some(path) = &args.ascii {
        ascii::export_layout_file(&grid, &legend, &borders, Some(&report), seed, path)
            .map_err(|e| format!("Failed to export ASCII layout: {}", e))?;
        println!("Exported ASCII layout to: {}", path.display());
    }

    if let Some(path) = &args.json {
        let snapshot = export::LayoutExport::build(&grid, &legend, &borders, Some(&report), seed);
        export::export_layout_json(&snapshot, path).map_err(|e| format!("Failed to export JSON: {}", e))?;
        println!("Exported JSON layout to: {}", path.display());
    }

    if let Some(path) = &args.png {
        export::export_layout_png(&grid, &borders, Some(&report), args.scale, path)
            .map_err(|e| format!("Failed to export PNG: {}", e))?;
        println!("Exported PNG layout to: {}", path.display());
    }

    if args.ascii.is_none() && args.json.is_none() && args.png.is_none() {
        print!(
            "{}",
            ascii::render_ascii_map(&grid, &legend, &borders, Some(&report), ascii::AsciiMode::Layout)
        );
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
