use crate::ast::Transparency;
use std::sync::OnceLock;

const DEFAULT_WHNF_FUEL: usize = 10_000;

/// Reduction budget used when unfolding argument types. Read once from
/// `LRL_RECURSOR_WHNF_FUEL`; zero and unparsable values fall back to the default.
pub fn default_whnf_fuel() -> usize {
    static DEFAULT: OnceLock<usize> = OnceLock::new();
    *DEFAULT.get_or_init(|| {
        std::env::var("LRL_RECURSOR_WHNF_FUEL")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .filter(|val| *val > 0)
            .unwrap_or(DEFAULT_WHNF_FUEL)
    })
}

/// Settings for recursor validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecursorConfig {
    /// Maximum number of delta/beta/zeta steps per weak-head normalization.
    pub whnf_fuel: usize,
    /// Which definitions may be unfolded while looking for the major premise.
    pub transparency: Transparency,
}

impl Default for RecursorConfig {
    fn default() -> Self {
        RecursorConfig {
            whnf_fuel: default_whnf_fuel(),
            transparency: Transparency::Reducible,
        }
    }
}

impl RecursorConfig {
    pub fn with_fuel(mut self, fuel: usize) -> Self {
        self.whnf_fuel = fuel;
        self
    }

    pub fn with_transparency(mut self, transparency: Transparency) -> Self {
        self.transparency = transparency;
        self
    }
}
