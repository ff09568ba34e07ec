//! Load sweep
//!
//! Relative steal time, sojourn inflation and mean peak concurrency for each
//! load level on a fixed pool.

use std::process;

use steal_sim::cli::CommonArgs;
use steal_sim::logging::{logger_init, LoggerConfig};
use steal_sim::report::write_csv;
use steal_sim::{load_range, sweep_load, DriverError};
use tracing::info;

const USAGE: &str = "Usage: load-sweep [start_pct] [end_pct] [step_pct] [--config <file.json>] [--out <file.csv>]
Example: load-sweep 1 99 1 --out load.csv";

fn run() -> Result<(), DriverError> {
    logger_init(&LoggerConfig::from_env()?)?;
    let args = CommonArgs::parse(std::env::args().skip(1))?;
    let config = args.load_config()?;

    let start_pct: u32 = args.positional_or(0, "start_pct", 1)?;
    let end_pct: u32 = args.positional_or(1, "end_pct", 99)?;
    let step_pct: u32 = args.positional_or(2, "step_pct", 1)?;

    info!(
        capacity = config.capacity,
        nominal_duration_ms = config.nominal_duration_ms,
        period_ms = config.period_ms,
        start_pct,
        end_pct,
        step_pct,
        "load sweep"
    );
    let points = sweep_load(&config, &load_range(start_pct, end_pct, step_pct))?;
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
