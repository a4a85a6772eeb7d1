//! live2d-extract - rebuild Live2D model packages from an object dump.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use live2d_extractor::asset::dump;
use live2d_extractor::export::{export_all, ExportConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Parsed command line.
#[derive(Debug, Default)]
struct Args {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    motion_mode: Option<String>,
    group_by: Option<String>,
    force_bezier: bool,
    search_by_filename: bool,
    no_mmap: bool,
    level: &'static str,
    help: bool,
    version: bool,
}

fn parse_args(raw: &[String]) -> Result<Args, String> {
    let mut args = Args { level: "info", ..Default::default() };
    let mut iter = raw.iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| iter.next().cloned().ok_or_else(|| format!("{} needs a value", flag));
        match arg.as_str() {
            "-v" | "--verbose" => args.level = "debug",
            "-vv" | "--trace" => args.level = "trace",
            "-q" | "--quiet" => args.level = "error",
            "-h" | "--help" => args.help = true,
            "-V" | "--version" => args.version = true,
            "-o" | "--output" => args.output = Some(value(arg)?.into()),
            "-c" | "--config" => args.config = Some(value(arg)?.into()),
            "-m" | "--motion-mode" => args.motion_mode = Some(value(arg)?),
            "-g" | "--group-by" => args.group_by = Some(value(arg)?),
            "--force-bezier" => args.force_bezier = true,
            "--search-by-filename" => args.search_by_filename = true,
            "--no-mmap" => args.no_mmap = true,
            other if other.starts_with('-') => return Err(format!("unknown option: {}", other)),
            other => {
                if args.input.is_some() {
                    return Err(format!("unexpected argument: {}", other));
                }
                args.input = Some(other.into());
            }
        }
    }
    Ok(args)
}

/// Defaults, then the config file, then command-line flags.
fn build_config(args: &Args) -> Result<ExportConfig, String> {
    let mut config = ExportConfig::load(args.config.as_deref()).map_err(|e| e.to_string())?;
    if let Some(mode) = &args.motion_mode {
        config.motion_mode = mode.parse().map_err(|e: live2d_extractor::Error| e.to_string())?;
    }
    if let Some(group) = &args.group_by {
        config.group_output_by = group.parse().map_err(|e: live2d_extractor::Error| e.to_string())?;
    }
    config.force_bezier |= args.force_bezier;
    config.search_by_filename |= args.search_by_filename;
    Ok(config)
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let raw: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_help();
            return ExitCode::FAILURE;
        }
    };
    if args.version {
        println!(
            "live2d-extract {} (built {} {})",
            env!("CARGO_PKG_VERSION"),
            option_env!("LIVE2D_BUILD_DATE").unwrap_or("unknown"),
            option_env!("LIVE2D_BUILD_TIME").unwrap_or("unknown")
        );
        return ExitCode::SUCCESS;
    }
    let Some(input) = args.input.clone().filter(|_| !args.help) else {
        print_help();
        return if args.help { ExitCode::SUCCESS } else { ExitCode::FAILURE };
    };

    init_tracing(args.level);

    let config = match build_config(&args) {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let output = args.output.clone().unwrap_or_else(|| PathBuf::from("live2d_output"));
    info!("input: {}, output: {}", input.display(), output.display());

    let provider = match dump::load_opts(&input, !args.no_mmap) {
        Ok(p) => p,
        Err(e) => {
            error!("cannot load {}: {}", input.display(), e);
            return ExitCode::FAILURE;
        }
    };
    match export_all(&provider, &output, &config) {
        Ok(summary) if summary.failed == 0 => ExitCode::SUCCESS,
        Ok(summary) => {
            error!("{} model(s) failed", summary.failed);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_help() {
    println!("live2d-extract - rebuild Live2D Cubism model packages");
    println!();
    println!("USAGE:");
    println!("    live2d-extract [OPTIONS] <dump-dir>");
    println!();
    println!("OPTIONS:");
    println!("    -o, --output <dir>         Output directory (default: live2d_output)");
    println!("    -c, --config <file>        Config file (JSON)");
    println!("    -m, --motion-mode <mode>   fade-list-based | clip-based-v1 | clip-based-v2");
    println!("    -g, --group-by <how>       container-path | source-filename | model-name");
    println!("        --force-bezier         Encode every curve segment as Bezier");
    println!("        --search-by-filename   Group models by source file and hierarchy");
    println!("        --no-mmap              Read the dump instead of mapping it");
    println!("    -v, --verbose              Show debug output");
    println!("    -vv, --trace               Show trace output (very verbose)");
    println!("    -q, --quiet                Errors only");
    println!("    -V, --version              Print version");
    println!("    -h, --help                 Show this help");
    println!();
    println!("NOTES:");
    println!("    - RUST_LOG overrides the verbosity flags");
    println!("    - Without --config, <config dir>/live2d-extractor/config.json is used if present");
}
