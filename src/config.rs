/// Simulation configuration.

use crate::error::{SimError, SimResult};

/// Default number of lines retained by each computer console.
pub const DEFAULT_CONSOLE_LINES: usize = 80;

/// Tunables fixed for the lifetime of a [`Simulation`](crate::Simulation).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationConfig {
    /// Lines kept in each computer's console before the oldest is evicted.
    pub console_lines: usize,
    /// Seed for the identity registry. `None` issues random identifiers.
    pub id_seed: Option<u64>,
}

impl SimulationConfig {
    /// Default configuration with a seeded identity registry, so that two
    /// simulations built the same way issue the same identifiers.
    pub fn seeded(seed: u64) -> Self {
        SimulationConfig {
            id_seed: Some(seed),
            ..Self::default()
        }
    }

    pub fn with_console_lines(mut self, lines: usize) -> Self {
        self.console_lines = lines;
        self
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> SimResult<()> {
        if self.console_lines == 0 {
            return Err(SimError::InvalidConfig(
                "console_lines must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            console_lines: DEFAULT_CONSOLE_LINES,
            id_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = SimulationConfig::default();
        assert_eq!(cfg.console_lines, 80);
        assert_eq!(cfg.id_seed, None);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_seeded_keeps_defaults() {
        let cfg = SimulationConfig::seeded(42);
        assert_eq!(cfg.id_seed, Some(42));
        assert_eq!(cfg.console_lines, DEFAULT_CONSOLE_LINES);
    }

    #[test]
    fn test_zero_console_lines_rejected() {
        let cfg = SimulationConfig::default().with_console_lines(0);
        assert!(matches!(cfg.validate(), Err(SimError::InvalidConfig(_))));
    }
}
