//! Pool size sweep
//!
//! Relative steal time at a fixed load for each pool size in a range.

use std::process;

use steal_sim::cli::CommonArgs;
use steal_sim::logging::{logger_init, LoggerConfig};
use steal_sim::report::write_csv;
use steal_sim::{sweep_pool_size, DriverError};
use tracing::info;

const USAGE: &str = "Usage: pool-sweep [load] [min_capacity] [max_capacity] [--config <file.json>] [--out <file.csv>]
Example: pool-sweep 0.8 8 31";

fn run() -> Result<(), DriverError> {
    logger_init(&LoggerConfig::from_env()?)?;
    let args = CommonArgs::parse(std::env::args().skip(1))?;
    let config = args.load_config()?;

    let load: f64 = args.positional_or(0, "load", 0.8)?;
    let min_capacity: u32 = args.positional_or(1, "min_capacity", 8)?;
    let max_capacity: u32 = args.positional_or(2, "max_capacity", 31)?;
    if min_capacity == 0 || min_capacity > max_capacity {
        return Err(DriverError::Usage(format!(
            "need 0 < min_capacity <= max_capacity, got {min_capacity}..{max_capacity}"
        )));
    }

    info!(load, min_capacity, max_capacity, "pool size sweep");
    let points = sweep_pool_size(&config, load, min_capacity..=max_capacity)?;
    write_csv(&points, args.out.as_deref())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        if matches!(e, DriverError::Usage(_)) {
            eprintln!("{USAGE}");
        }
        process::exit(1);
    }
}
