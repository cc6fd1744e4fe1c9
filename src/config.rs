//! Runtime configuration read from the environment.
//!
//! The only setting today is the default number of worker threads used for
//! parallel key computation in [`KeyCollision`](crate::cluster::KeyCollision).

use std::env;

/// Environment variable holding the default number of worker threads.
pub const ENV_THREADS: &str = "VCLUSTER_THREADS";

/// Crate configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Number of worker threads for key computation (always at least 1).
    pub threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { threads: 1 }
    }
}

impl Config {
    /// Read the configuration from the environment.
    ///
    /// `VCLUSTER_THREADS` must parse as an integer of at least 1; anything else
    /// (unset, non-numeric, fractional, zero or negative) falls back to 1.
    pub fn from_env() -> Self {
        let threads = env::var(ENV_THREADS)
            .ok()
            .map_or(1, |raw| parse_threads(&raw));
        Self { threads }
    }
}

fn parse_threads(raw: &str) -> usize {
    match raw.trim().parse::<usize>() {
        Ok(n) if n >= 1 => n,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_threads() {
        for (raw, expected) in [("a", 1), ("-34.5", 1), ("0", 1), ("1", 1), ("4", 4), (" 8 ", 8)] {
            assert_eq!(parse_threads(raw), expected, "input {raw:?}");
        }
    }

    #[test]
    fn test_default_is_single_threaded() {
        assert_eq!(Config::default().threads, 1);
    }
}
