use serde::{Deserialize, Serialize};
use sv_fit::RefineConfig;
use sv_hyper::HyperConfig;

use crate::VectorizeError;

/// Options for a whole vectorization run.
///
/// Missing fields take their defaults when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizeConfig {
    /// Gray level splitting ink from paper; only used by upstream tooling.
    pub binarization_threshold: u8,
    /// Radius handed to the skeletonizer.
    pub structuring_radius: usize,
    /// Largest accepted weighted RMS deviation of a chain from its curve.
    pub error_threshold: f32,
    /// Chains shorter than this are never split.
    pub min_chain_len: usize,
    /// Largest bend, in degrees, for continuing a stroke through a junction.
    pub continuity_angle_deg: f32,
    pub pass_through_overlap: bool,
}

impl Default for VectorizeConfig {
    fn default() -> Self {
        let refine = RefineConfig::default();
        let hyper = HyperConfig::default();
        Self {
            binarization_threshold: 128,
            structuring_radius: 1,
            error_threshold: refine.error_threshold,
            min_chain_len: refine.min_chain_len,
            continuity_angle_deg: hyper.continuity_angle_deg,
            pass_through_overlap: hyper.pass_through_overlap,
        }
    }
}

impl VectorizeConfig {
    pub fn validate(&self) -> Result<(), VectorizeError> {
        let invalid = |reason| Err(VectorizeError::InvalidConfig { reason });
        if !self.error_threshold.is_finite() || self.error_threshold <= 0.0 {
            return invalid("error_threshold must be finite and positive");
        }
        if self.min_chain_len == 0 {
            return invalid("min_chain_len must be at least 1");
        }
        if !(0.0..=180.0).contains(&self.continuity_angle_deg) {
            return invalid("continuity_angle_deg must lie in [0, 180]");
        }
        Ok(())
    }

    pub fn to_refine_config(&self) -> RefineConfig {
        RefineConfig {
            error_threshold: self.error_threshold,
            min_chain_len: self.min_chain_len,
        }
    }

    pub fn to_hyper_config(&self) -> HyperConfig {
        HyperConfig {
            continuity_angle_deg: self.continuity_angle_deg,
            pass_through_overlap: self.pass_through_overlap,
        }
    }
}
