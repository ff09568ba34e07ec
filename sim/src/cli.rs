//! Argument handling shared by the driver binaries.

use std::path::PathBuf;
use std::str::FromStr;

use steal_model::SimConfig;

use crate::error::DriverError;

/// Flags every binary accepts, plus the positionals left after them.
#[derive(Debug, Default)]
pub struct CommonArgs {
    pub config: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub positional: Vec<String>,
}

impl CommonArgs {
    /// Parse `--config <file>` and `--out <file>`; everything else is positional.
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self, DriverError> {
        let mut parsed = CommonArgs::default();
        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--config" => parsed.config = Some(flag_value(&mut iter, "--config")?.into()),
                "--out" => parsed.out = Some(flag_value(&mut iter, "--out")?.into()),
                _ => parsed.positional.push(arg),
            }
        }
        Ok(parsed)
    }

    /// The config file if one was given, defaults otherwise.
    pub fn load_config(&self) -> Result<SimConfig, DriverError> {
        let config = match &self.config {
            Some(path) => SimConfig::from_json_file(path)?,
            None => SimConfig::default(),
        };
        Ok(config)
    }

    /// Positional `index` parsed as `T`, or `default` when absent.
    pub fn positional_or<T: FromStr>(&self, index: usize, name: &str, default: T) -> Result<T, DriverError> {
        match self.positional.get(index) {
            Some(raw) => raw
                .parse()
                .map_err(|_| DriverError::Usage(format!("{name} must be a number, got {raw:?}"))),
            None => Ok(default),
        }
    }
}

fn flag_value<I: Iterator<Item = String>>(iter: &mut I, flag: &str) -> Result<String, DriverError> {
    iter.next()
        .ok_or_else(|| DriverError::Usage(format!("{flag} needs a value")))
}
