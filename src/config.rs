//src/config.rs

use crate::error::{OrfanError, Result};

/// What to do with a reference row that does not match the fixed column layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedRowPolicy {
    /// Abort the build with `OrfanError::DataFormat`.
    #[default]
    Fail,
    /// Log a warning, count the row and keep going.
    SkipAndWarn,
}

/// Knobs for one classification run.
#[derive(Debug, Clone, Default)]
pub struct ClassifierConfig {
    /// Keep only hits with `percent_identity >= threshold`. `None` takes hits as already filtered.
    pub identity_threshold: Option<f64>,
    pub malformed_rows: MalformedRowPolicy,
    /// Also scan the species rank (divergence there yields GENUS_RESTRICTED).
    pub include_species_rank: bool,
    /// Classify genes on the rayon pool.
    pub parallel: bool,
}

impl ClassifierConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identity_threshold(mut self, threshold: f64) -> Self {
        self.identity_threshold = Some(threshold);
        self
    }

    pub fn malformed_rows(mut self, policy: MalformedRowPolicy) -> Self {
        self.malformed_rows = policy;
        self
    }

    pub fn include_species_rank(mut self, include: bool) -> Self {
        self.include_species_rank = include;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(t) = self.identity_threshold {
            if !(0.0..=100.0).contains(&t) {
                return Err(OrfanError::Config(format!(
                    "identity threshold {t} outside 0..=100"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_strict_and_sequential() {
        let cfg = ClassifierConfig::default();
        assert_eq!(cfg.malformed_rows, MalformedRowPolicy::Fail);
        assert!(cfg.identity_threshold.is_none());
        assert!(!cfg.include_species_rank);
        assert!(!cfg.parallel);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let cfg = ClassifierConfig::new().identity_threshold(120.0);
        assert!(matches!(cfg.validate(), Err(OrfanError::Config(_))));
    }
}
