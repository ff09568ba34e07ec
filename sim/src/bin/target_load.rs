//! Target steal time search
//!
//! For each pool size, bisects the highest load that keeps relative steal
//! time at the target.

use std::process;

use steal_sim::cli::CommonArgs;
use steal_sim::logging::{logger_init, LoggerConfig};
use steal_sim::report::write_csv;
use steal_sim::{bisect_load, DriverError};
use tracing::info;

const USAGE: &str = "Usage: target-load [target] [min_capacity] [max_capacity] [tolerance] [--config <file.json>] [--out <file.csv>]
Example: target-load 0.025 2 31 0.001";

fn run() -> Result<(), DriverError> {
    logger_init(&LoggerConfig::from_env()?)?;
    let args = CommonArgs::parse(std::env::args().skip(1))?;
    let config = args.load_config()?;

    let target: f64 = args.positional_or(0, "target", 0.025)?;
    let min_capacity: u32 = args.positional_or(1, "min_capacity", 2)?;
    let max_capacity: u32 = args.positional_or(2, "max_capacity", 31)?;
    let tolerance: f64 = args.positional_or(3, "tolerance", 0.001)?;
    if min_capacity == 0 || min_capacity > max_capacity {
        return Err(DriverError::Usage(format!(
            "need 0 < min_capacity <= max_capacity, got {min_capacity}..{max_capacity}"
        )));
    }

    info!(target, min_capacity, max_capacity, tolerance, "target steal search");
    let outcomes = (min_capacity..=max_capacity)
        .map(|capacity| bisect_load(&config, capacity, target, tolerance))
        .collect::<Result<Vec<_>, _>>()?;
    write_csv(&outcomes, args.out.as_deref())
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
