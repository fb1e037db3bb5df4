//! gati-cal - calibration record inspection tool
//!
//! Loads a stored calibration record by device identity and prints its
//! flags and parsed calibration tables.

use gati_cal::calibration::CalibrationRecord;
use gati_cal::config::Config;
use gati_cal::error::Result;
use std::env;
use std::path::PathBuf;
use std::process;

/// Parse command line arguments.
///
/// Supports:
/// - `gati-cal <identity>` (positional)
/// - `gati-cal <identity> --data-dir <dir>`
/// - `gati-cal <identity> --config <path>`
fn parse_args() -> (Option<String>, Option<PathBuf>, Option<String>) {
    let args: Vec<String> = env::args().collect();

    let mut identity = None;
    let mut data_dir = None;
    let mut config_path = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--data-dir" | "-d" if i + 1 < args.len() => {
                data_dir = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--config" | "-c" if i + 1 < args.len() => {
                config_path = Some(args[i + 1].clone());
                i += 2;
            }
            arg if !arg.starts_with('-') => {
                identity = Some(arg.to_string());
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    (identity, data_dir, config_path)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (identity, data_dir, config_path) = parse_args();

    let identity = match identity {
        Some(identity) => identity,
        None => {
            eprintln!("Usage: gati-cal <identity> [--data-dir <dir>] [--config <path>]");
            process::exit(2);
        }
    };

    let mut config = match config_path {
        Some(path) => Config::from_file(&path)?,
        None => Config::default(),
    };
    if let Some(dir) = data_dir {
        config.storage.data_dir = dir;
    }

    let mut record = CalibrationRecord::for_identity(&identity, &config.storage.data_dir);
    if !record.load()? {
        eprintln!(
            "No calibration stored for {} under {}",
            identity,
            config.storage.data_dir.display()
        );
        process::exit(1);
    }

    print!("{}", record.summary());
    Ok(())
}
