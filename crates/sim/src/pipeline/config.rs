//! Run configuration.
//!
//! A `PipelineConfig` is the single description of one run. It is checked
//! with [`PipelineConfig::validate`] before any seed is drawn or any file is
//! touched, so a rejected run leaves no trace.

use crate::base::Seed;
use crate::errors::{PipelineError, Result};
use crate::evolution::RecapitationParams;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::warn;

/// Group name used when every individual forms one group.
pub const GLOBAL_GROUP: &str = "all";

/// Sampling plan for one population group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupPlan {
    pub name: String,
    /// Target number of genome copies (two per individual).
    #[serde(default)]
    pub sample_size: Option<usize>,
    /// Pinned subsample seed.
    #[serde(default)]
    pub seed: Option<Seed>,
}

impl GroupPlan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sample_size: None,
            seed: None,
        }
    }

    pub fn with_sample_size(mut self, sample_size: Option<usize>) -> Self {
        self.sample_size = sample_size;
        self
    }

    pub fn with_seed(mut self, seed: Option<Seed>) -> Self {
        self.seed = seed;
        self
    }
}

/// How individuals are grouped for subsampling and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PopulationMode {
    /// All individuals form a single group.
    Global { group: GroupPlan },
    /// Individuals are grouped by population name.
    Stratified { groups: Vec<GroupPlan> },
}

impl PopulationMode {
    pub fn groups(&self) -> &[GroupPlan] {
        match self {
            PopulationMode::Global { group } => std::slice::from_ref(group),
            PopulationMode::Stratified { groups } => groups,
        }
    }

    pub fn is_stratified(&self) -> bool {
        matches!(self, PopulationMode::Stratified { .. })
    }

    /// The pinned seed for group `index`. A group without its own pin falls
    /// back to a value derived from the first group's pin.
    pub fn group_seed(&self, index: usize) -> Option<Seed> {
        let groups = self.groups();
        let own = groups.get(index)?.seed;
        if own.is_some() || index == 0 {
            return own;
        }
        groups[0].seed.map(|s| s.derive(index as u64))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecapitationConfig {
    pub enabled: bool,
    pub params: RecapitationParams,
    #[serde(default)]
    pub seed: Option<Seed>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub dest_prefix: PathBuf,
    pub vcf: bool,
    pub trees: bool,
}

/// Everything one run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub source: PathBuf,
    pub mode: PopulationMode,
    /// Subsample each group instead of keeping every individual.
    pub random: bool,
    /// Mutation rate per base per generation.
    pub mutation_rate: f64,
    pub recapitation: RecapitationConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub mutation_seed: Option<Seed>,
    #[serde(default)]
    pub nucleotide_seed: Option<Seed>,
}

impl PipelineConfig {
    /// Reject missing or contradictory parameters.
    pub fn validate(&self) -> Result<()> {
        let config_err = |msg: String| Err(PipelineError::Configuration(msg));

        if self.output.dest_prefix.as_os_str().is_empty() {
            return config_err("destination prefix must not be empty".to_string());
        }
        if !(self.mutation_rate.is_finite() && self.mutation_rate > 0.0) {
            return config_err(format!(
                "mutation rate must be a positive number, got {}",
                self.mutation_rate
            ));
        }
        if self.recapitation.enabled {
            let p = &self.recapitation.params;
            RecapitationParams::new(p.recombination_rate, p.ancestral_ne)?;
        }

        let groups = self.mode.groups();
        if groups.is_empty() {
            return config_err("stratified mode needs at least one population group".to_string());
        }
        let mut seen = HashSet::new();
        for group in groups {
            if group.name.is_empty() {
                return config_err("population group names must not be empty".to_string());
            }
            if !seen.insert(group.name.as_str()) {
                return config_err(format!("population group '{}' is listed twice", group.name));
            }
            if self.random {
                match group.sample_size {
                    None => {
                        return config_err(format!(
                            "random subsampling needs a sample size for group '{}'",
                            group.name
                        ))
                    }
                    Some(0) => {
                        return config_err(format!(
                            "sample size for group '{}' must be at least 1",
                            group.name
                        ))
                    }
                    Some(_) => {}
                }
            }
        }

        if !self.output.vcf && !self.output.trees {
            warn!("Neither VCF nor .trees output requested; the run will write no files");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stratified() -> PipelineConfig {
        PipelineConfig {
            source: PathBuf::from("in.trees"),
            mode: PopulationMode::Stratified {
                groups: vec![
                    GroupPlan::new("p1").with_sample_size(Some(4)),
                    GroupPlan::new("p2").with_sample_size(Some(4)),
                ],
            },
            random: true,
            mutation_rate: 1e-7,
            recapitation: RecapitationConfig {
                enabled: true,
                params: RecapitationParams {
                    recombination_rate: 1e-8,
                    ancestral_ne: 1e4,
                },
                seed: None,
            },
            output: OutputConfig {
                dest_prefix: PathBuf::from("out"),
                vcf: true,
                trees: true,
            },
            mutation_seed: None,
            nucleotide_seed: None,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(stratified().validate().is_ok());
    }

    #[test]
    fn test_random_without_sample_size() {
        let mut config = stratified();
        if let PopulationMode::Stratified { groups } = &mut config.mode {
            groups[1].sample_size = None;
        }
        assert!(matches!(
            config.validate(),
            Err(PipelineError::Configuration(msg)) if msg.contains("p2")
        ));
        config.random = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_rates_rejected() {
        let mut config = stratified();
        config.mutation_rate = 0.0;
        assert!(config.validate().is_err());

        let mut config = stratified();
        config.recapitation.params.ancestral_ne = -1.0;
        assert!(config.validate().is_err());
        config.recapitation.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duplicate_groups_rejected() {
        let mut config = stratified();
        config.mode = PopulationMode::Stratified {
            groups: vec![GroupPlan::new("p1"), GroupPlan::new("p1")],
        };
        config.random = false;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_group_seed_derivation() {
        let pinned = Seed::new(42).unwrap();
        let mode = PopulationMode::Stratified {
            groups: vec![
                GroupPlan::new("p1").with_seed(Some(pinned)),
                GroupPlan::new("p2"),
                GroupPlan::new("p3").with_seed(Some(Seed::new(5).unwrap())),
            ],
        };
        assert_eq!(mode.group_seed(0), Some(pinned));
        assert_eq!(mode.group_seed(1), Some(pinned.derive(1)));
        assert_eq!(mode.group_seed(2), Seed::new(5).ok());

        let free = PopulationMode::Global {
            group: GroupPlan::new(GLOBAL_GROUP),
        };
        assert_eq!(free.group_seed(0), None);
    }

    #[test]
    fn test_serde_round_trip_keeps_mode_tag() {
        let json = serde_json::to_string(&stratified()).unwrap();
        assert!(json.contains("\"mode\":\"stratified\""));
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stratified());
    }
}
