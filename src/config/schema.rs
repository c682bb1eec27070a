//! Configuration schema types for `fscale.toml`
//!
//! Every field has a default, so an empty file (or no file) yields the
//! stock tuning.
//!
//! ```toml
//! parallel = true
//!
//! [denoise]
//! spatial_sigma = 1.25
//! range_sigma = 12.0
//! blend = 0.35
//!
//! [resample]
//! support = 3
//!
//! [enhance]
//! blur_radius = 2
//! detail_threshold = 2.0
//! ```

use serde::{Deserialize, Serialize};

use crate::denoise::DenoiseParams;
use crate::enhance::EnhanceParams;
use crate::resample::ResampleParams;

fn default_parallel() -> bool {
    true
}

/// Complete tuning of an upscale run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpscaleConfig {
    /// Spread row work over the rayon pool
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Bilateral denoise settings
    #[serde(default)]
    pub denoise: DenoiseParams,
    /// Lanczos resampling settings
    #[serde(default)]
    pub resample: ResampleParams,
    /// Edge enhancement and contrast settings
    #[serde(default)]
    pub enhance: EnhanceParams,
}

impl Default for UpscaleConfig {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
            denoise: DenoiseParams::default(),
            resample: ResampleParams::default(),
            enhance: EnhanceParams::default(),
        }
    }
}

impl UpscaleConfig {
    /// Validate every section.
    ///
    /// Returns a list of field errors (empty if valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = self.denoise.validate();
        errors.extend(self.resample.validate());
        errors.extend(self.enhance.validate());
        errors
    }

    /// Same configuration with row parallelism switched off.
    pub fn serial(mut self) -> Self {
        self.parallel = false;
        self
    }
}
