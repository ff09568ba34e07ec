//! Adjusted pool sizing
//!
//! Sizes the pool from the aggregate load with `PoolSizingRule`, then
//! measures the steal time the sized pool sees. Loads run 2% to 100% in 2%
//! steps.

use std::process;

use steal_sim::cli::CommonArgs;
use steal_sim::logging::{logger_init, LoggerConfig};
use steal_sim::report::write_csv;
use steal_sim::{adjusted_pool_sweep, load_range, DriverError, PoolSizingRule};
use tracing::info;

const USAGE: &str = "Usage: adjusted-pool [max_capacity] [scale] [headroom] [min_capacity] [--config <file.json>] [--out <file.csv>]
Example: adjusted-pool 32 1.15 4 8";

fn run() -> Result<(), DriverError> {
    logger_init(&LoggerConfig::from_env()?)?;
    let args = CommonArgs::parse(std::env::args().skip(1))?;
    let config = args.load_config()?;

    let defaults = PoolSizingRule::default();
    let rule = PoolSizingRule {
        max_capacity: args.positional_or(0, "max_capacity", defaults.max_capacity)?,
        scale: args.positional_or(1, "scale", defaults.scale)?,
        headroom: args.positional_or(2, "headroom", defaults.headroom)?,
        min_capacity: args.positional_or(3, "min_capacity", defaults.min_capacity)?,
    };
    if rule.min_capacity == 0 || rule.min_capacity > rule.max_capacity {
        return Err(DriverError::Usage(format!(
            "need 0 < min_capacity <= max_capacity, got {}..{}",
            rule.min_capacity, rule.max_capacity
        )));
    }

    info!(?rule, "adjusted pool sweep");
    let points = adjusted_pool_sweep(&config, &rule, &load_range(2, 100, 2))?;
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
