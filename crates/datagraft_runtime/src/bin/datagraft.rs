//! Datagraft CLI entry point.

use datagraft_runtime::{Loader, LoaderConfig};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

/// CLI configuration parsed from arguments.
#[derive(Default)]
struct CliConfig {
    schema: Option<PathBuf>,
    files: Vec<PathBuf>,
    show_help: bool,
    show_version: bool,
    skip_invalid: bool,
    compact: bool,
    max_depth: Option<usize>,
    entry: Option<String>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError: {}\x1b[0m", error_message(e.as_ref()));
            ExitCode::FAILURE
        }
    }
}

/// Load failures carry their file and entry path; argument errors are plain.
fn error_message(error: &(dyn std::error::Error + 'static)) -> String {
    match error.downcast_ref::<datagraft_foundation::Error>() {
        Some(error) => error.report(),
        None => error.to_string(),
    }
}

fn parse_args(args: Vec<String>) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let mut config = CliConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => config.show_help = true,
            "-V" | "--version" => config.show_version = true,
            "--skip-invalid" => config.skip_invalid = true,
            "--compact" => config.compact = true,
            "-s" | "--schema" => {
                i += 1;
                if i >= args.len() {
                    return Err("--schema requires a path".into());
                }
                config.schema = Some(PathBuf::from(&args[i]));
            }
            "--entry" => {
                i += 1;
                if i >= args.len() {
                    return Err("--entry requires a name".into());
                }
                config.entry = Some(args[i].clone());
            }
            "--max-depth" => {
                i += 1;
                if i >= args.len() {
                    return Err("--max-depth requires a value".into());
                }
                config.max_depth = Some(
                    args[i]
                        .parse()
                        .map_err(|_| format!("invalid --max-depth value: {}", args[i]))?,
                );
            }
            arg if arg.starts_with('-') => {
                return Err(format!("unknown option: {arg}").into());
            }
            path => config.files.push(PathBuf::from(path)),
        }
        i += 1;
    }

    Ok(config)
}

fn run(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = parse_args(args)?;

    if config.show_help {
        print_help();
        return Ok(());
    }

    if config.show_version {
        println!("datagraft {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let Some(schema) = &config.schema else {
        return Err("--schema is required (see --help)".into());
    };

    let mut loader_config = LoaderConfig::default()
        .with_skip_invalid(config.skip_invalid)
        .with_pretty_output(!config.compact);
    if let Some(depth) = config.max_depth {
        loader_config = loader_config.with_max_depth(depth);
    }

    let mut loader = Loader::from_schema_file(schema, loader_config)?;

    for file in &config.files {
        let report = loader.load_file(file)?;
        for skipped in &report.skipped {
            let name = skipped.name.as_deref().unwrap_or("<unnamed>");
            eprintln!("\x1b[33mskipped {name}: {}\x1b[0m", skipped.error.report());
        }
    }

    match loader.render(config.entry.as_deref())? {
        Some(text) => println!("{text}"),
        None => {
            let name = config.entry.unwrap_or_default();
            return Err(format!("no entry named `{name}` was loaded").into());
        }
    }
    Ok(())
}

fn print_help() {
    println!(
        "\x1b[1mDatagraft\x1b[0m - Descriptor-driven data loading

\x1b[1mUSAGE:\x1b[0m
    datagraft --schema SCHEMA [OPTIONS] [FILES...]

\x1b[1mARGUMENTS:\x1b[0m
    [FILES...]    Documents to load, in order

\x1b[1mOPTIONS:\x1b[0m
    -s, --schema PATH  Schema document declaring the types (required)
    -h, --help         Print help information
    -V, --version      Print version information
    --skip-invalid     Skip entries whose data does not fit instead of failing
    --max-depth N      Limit nesting depth
    --entry NAME       Print only the named entry
    --compact          Print JSON on one line

\x1b[1mEXAMPLES:\x1b[0m
    datagraft -s types.json base.json mods.json
    datagraft -s types.json --entry msg1 messages.json
    RUST_LOG=debug datagraft -s types.json --skip-invalid content.json"
    );
}
