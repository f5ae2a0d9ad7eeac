//! Calculator configuration
//!
//! Defaults suit interactive use; `from_env` reads the `RPN_*` variables.

use rpn_core::DEFAULT_PRECISION;
use std::env;
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculatorConfig {
    /// Working precision in decimal digits
    pub precision: u32,
    /// Radix for numeric terms without a prefix
    pub input_radix: u32,
    /// Where `units.json` and `factors.json` live; `None` keeps everything in memory
    pub data_dir: Option<PathBuf>,
    /// Load the unit system at all
    pub units: bool,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            input_radix: 10,
            data_dir: None,
            units: true,
        }
    }
}

impl CalculatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `RPN_DATA_PATH`, `RPN_PRECISION`, `RPN_INPUT_RADIX` and
    /// `RPN_NO_UNITS`. Invalid values are reported and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = env::var("RPN_DATA_PATH") {
            if !path.is_empty() {
                config.data_dir = Some(PathBuf::from(path));
            }
        }
        if let Some(precision) = parse_var("RPN_PRECISION", |p: &u32| *p > 0) {
            config.precision = precision;
        }
        if let Some(radix) = parse_var("RPN_INPUT_RADIX", |r: &u32| (2..=36).contains(r)) {
            config.input_radix = radix;
        }
        if env::var_os("RPN_NO_UNITS").is_some() {
            config.units = false;
        }
        config
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_input_radix(mut self, radix: u32) -> Self {
        self.input_radix = radix;
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn with_units(mut self, enabled: bool) -> Self {
        self.units = enabled;
        self
    }

    pub fn units_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("units.json"))
    }

    pub fn factors_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("factors.json"))
    }
}

fn parse_var<T>(name: &str, valid: impl Fn(&T) -> bool) -> Option<T>
where
    T: std::str::FromStr,
{
    let raw = env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) if valid(&value) => Some(value),
        _ => {
            warn!(variable = name, value = %raw, "ignoring invalid setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CalculatorConfig::default();
        assert_eq!(config.precision, 50);
        assert_eq!(config.input_radix, 10);
        assert!(config.units);
        assert_eq!(config.units_path(), None);
    }

    #[test]
    fn test_builder() {
        let config = CalculatorConfig::new()
            .with_precision(30)
            .with_input_radix(16)
            .with_data_dir("/tmp/rpn")
            .with_units(false);
        assert_eq!(config.precision, 30);
        assert_eq!(config.input_radix, 16);
        assert!(!config.units);
        assert_eq!(config.factors_path(), Some(PathBuf::from("/tmp/rpn/factors.json")));
    }
}
