use crate::{Error, Result};

/// Trailing window length of the rolling smoother.
pub const DEFAULT_WINDOW: usize = 30;
/// Size of the worker pool used by the parallel strategy.
pub const DEFAULT_WORKERS: usize = 4;
/// Half-width of the acceptance band, in standard deviations.
pub const DEFAULT_SIGMA: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub window: usize,
    pub workers: usize,
    pub sigma: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            workers: DEFAULT_WORKERS,
            sigma: DEFAULT_SIGMA,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(Error::InvalidConfig("window must be at least 1".into()));
        }
        if self.workers == 0 {
            return Err(Error::InvalidConfig("workers must be at least 1".into()));
        }
        if !self.sigma.is_finite() || self.sigma < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "sigma must be a finite non-negative number, got {}",
                self.sigma
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = Config::default();
        assert_eq!(config.window, 30);
        assert_eq!(config.workers, 4);
        assert_eq!(config.sigma, 2.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_window_and_workers() {
        let config = Config {
            window: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = Config {
            workers: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_bad_sigma() {
        for sigma in [-1.0, f64::NAN, f64::INFINITY] {
            let config = Config {
                sigma,
                ..Config::default()
            };
            assert!(config.validate().is_err(), "sigma {sigma} accepted");
        }
    }
}
