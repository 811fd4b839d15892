//! # capgen
//!
//! Command-line entry point for the capability API generator.

use capgen::GeneratorConfig;
use std::env;
use std::path::PathBuf;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    let config = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        print_usage(&args[0]);
        process::exit(1);
    });

    if let Err(e) = capgen::run_generator(&config) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Result<GeneratorConfig, String> {
    let mut config = GeneratorConfig::default();
    let mut input: Option<PathBuf> = None;
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--unit" | "-u" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --unit".to_string());
                }
                config.unit = Some(args[i].clone());
            }
            "--out-api" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --out-api".to_string());
                }
                config.out_api = Some(PathBuf::from(&args[i]));
            }
            "--out-sys" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --out-sys".to_string());
                }
                config.out_sys = Some(PathBuf::from(&args[i]));
            }
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                return Err(format!("Unknown option: {}", other));
            }
            other => {
                if input.is_some() {
                    return Err(format!("Unexpected extra argument: {}", other));
                }
                input = Some(PathBuf::from(other));
            }
        }
        i += 1;
    }

    config.input = input.ok_or_else(|| "Missing topology file".to_string())?;
    Ok(config)
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <topology.json> [OPTIONS]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -u, --unit <NAME>        Unit to generate the API for");
    eprintln!("                           (omitted: validate the topology only)");
    eprintln!("  --out-api <FILE>         Write the typed interface module here");
    eprintln!("  --out-sys <FILE>         Write the low-level declarations here");
    eprintln!("  -h, --help               Show this help message");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} system.json", program);
    eprintln!(
        "  {} system.json --unit auth --out-api auth_api.rs --out-sys auth_sys.rs",
        program
    );
}
