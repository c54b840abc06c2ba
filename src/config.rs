/*
    FluxFox
    https://github.com/dbalsom/fluxfox

    Copyright 2024 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    src/config.rs

    Drive configuration, built with the builder pattern and validated before use.
*/

use crate::{types::DataRateProfile, DriveError};
use std::time::Duration;

pub const DEFAULT_MAX_CYLINDERS: u16 = 80;
pub const DEFAULT_STEP_SETTLE: Duration = Duration::from_millis(3);
pub const DEFAULT_SPIN_UP: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX_CALIBRATION_STEPS: u32 = 250;
pub const DEFAULT_INDEX_TIMEOUT_REVOLUTIONS: u32 = 5;

/// Parameters controlling MFM clock recovery. All values are fractions of a bitcell.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PllConfig {
    #[doc = "The maximum deviation of the clock estimate from the nominal bitcell period."]
    pub max_adjust: f64,
    #[doc = "The distance from a whole number of cells within which an interval is accepted."]
    pub window: f64,
    #[doc = "The weight given to each observed cell when updating the clock estimate."]
    pub gain: f64,
    #[doc = "The deviation beyond which an observed cell is not used to update the estimate."]
    pub noise_limit: f64,
}

impl Default for PllConfig {
    fn default() -> Self {
        PllConfig {
            max_adjust: 0.15,
            window: 0.5,
            gain: 0.05,
            noise_limit: 0.20,
        }
    }
}

impl PllConfig {
    pub fn validate(&self) -> Result<(), DriveError> {
        let in_range = |name: &str, value: f64, max: f64| {
            if value > 0.0 && value <= max {
                Ok(())
            }
            else {
                Err(DriveError::InvalidArgument(format!(
                    "PLL {} of {} is outside (0, {}]",
                    name, value, max
                )))
            }
        };
        in_range("max_adjust", self.max_adjust, 0.5)?;
        in_range("window", self.window, 0.5)?;
        in_range("gain", self.gain, 1.0)?;
        in_range("noise_limit", self.noise_limit, 1.0)
    }
}

/// Implements the Builder pattern for drive configuration.
///
/// ```
/// use fluxfox_drive::{DataRateProfile, DriveConfig};
/// use std::time::Duration;
///
/// let config = DriveConfig::new()
///     .with_profile(DataRateProfile::HighDensity)
///     .with_step_settle(Duration::from_millis(4));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DriveConfig {
    #[doc = "The data rate and rotation rate of the disks to be read."]
    pub profile: DataRateProfile,
    #[doc = "The number of cylinders the drive can seek to."]
    pub max_cylinders: u16,
    #[doc = "The delay after each step pulse before the head is considered settled."]
    pub step_settle: Duration,
    #[doc = "The delay after asserting the motor line before the spindle is considered at speed."]
    pub spin_up: Duration,
    #[doc = "The maximum number of outward steps issued while searching for track 0."]
    pub max_calibration_steps: u32,
    #[doc = "The number of revolution periods to wait for an index pulse before reporting a fault."]
    pub index_timeout_revolutions: u32,
    #[doc = "Whether to wait for an index pulse after spinning up the motor."]
    pub verify_index_on_spin_up: bool,
    pub pll: PllConfig,
}

impl Default for DriveConfig {
    fn default() -> Self {
        DriveConfig {
            profile: DataRateProfile::default(),
            max_cylinders: DEFAULT_MAX_CYLINDERS,
            step_settle: DEFAULT_STEP_SETTLE,
            spin_up: DEFAULT_SPIN_UP,
            max_calibration_steps: DEFAULT_MAX_CALIBRATION_STEPS,
            index_timeout_revolutions: DEFAULT_INDEX_TIMEOUT_REVOLUTIONS,
            verify_index_on_spin_up: true,
            pll: PllConfig::default(),
        }
    }
}

impl DriveConfig {
    pub fn new() -> DriveConfig {
        Default::default()
    }

    pub fn with_profile(mut self, profile: DataRateProfile) -> DriveConfig {
        self.profile = profile;
        self
    }

    pub fn with_max_cylinders(mut self, max_cylinders: u16) -> DriveConfig {
        self.max_cylinders = max_cylinders;
        self
    }

    pub fn with_step_settle(mut self, step_settle: Duration) -> DriveConfig {
        self.step_settle = step_settle;
        self
    }

    pub fn with_spin_up(mut self, spin_up: Duration) -> DriveConfig {
        self.spin_up = spin_up;
        self
    }

    pub fn with_max_calibration_steps(mut self, steps: u32) -> DriveConfig {
        self.max_calibration_steps = steps;
        self
    }

    pub fn with_index_timeout_revolutions(mut self, revolutions: u32) -> DriveConfig {
        self.index_timeout_revolutions = revolutions;
        self
    }

    /// Set whether [crate::FloppyDrive::set_spin] waits for an index pulse after spin-up.
    pub fn with_verify_index(mut self, verify: bool) -> DriveConfig {
        self.verify_index_on_spin_up = verify;
        self
    }

    pub fn with_pll(mut self, pll: PllConfig) -> DriveConfig {
        self.pll = pll;
        self
    }

    /// The time to wait for an index pulse before reporting a spindle fault.
    pub fn index_timeout(&self) -> Duration {
        self.profile.revolution_period() * self.index_timeout_revolutions
    }

    /// Check the configuration for values the drive cannot operate with.
    pub fn validate(&self) -> Result<(), DriveError> {
        if self.max_cylinders == 0 {
            return Err(DriveError::InvalidArgument("max_cylinders must be non-zero".to_string()));
        }
        if self.max_calibration_steps == 0 {
            return Err(DriveError::InvalidArgument(
                "max_calibration_steps must be non-zero".to_string(),
            ));
        }
        if self.index_timeout_revolutions == 0 {
            return Err(DriveError::InvalidArgument(
                "index_timeout_revolutions must be non-zero".to_string(),
            ));
        }
        self.pll.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DriveConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.index_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn builder_sets_fields() {
        let config = DriveConfig::new()
            .with_profile(DataRateProfile::HighDensity360)
            .with_max_cylinders(40)
            .with_spin_up(Duration::from_millis(500))
            .with_verify_index(false);
        assert_eq!(config.profile, DataRateProfile::HighDensity360);
        assert_eq!(config.max_cylinders, 40);
        assert_eq!(config.spin_up, Duration::from_millis(500));
        assert!(!config.verify_index_on_spin_up);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let invalid = [
            DriveConfig::new().with_max_cylinders(0),
            DriveConfig::new().with_max_calibration_steps(0),
            DriveConfig::new().with_index_timeout_revolutions(0),
            DriveConfig::new().with_pll(PllConfig {
                gain: 0.0,
                ..Default::default()
            }),
            DriveConfig::new().with_pll(PllConfig {
                max_adjust: 0.9,
                ..Default::default()
            }),
            DriveConfig::new().with_pll(PllConfig {
                window: -0.5,
                ..Default::default()
            }),
        ];
        for config in invalid {
            assert!(matches!(config.validate(), Err(DriveError::InvalidArgument(_))));
        }
    }
}
