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

    enums.rs

    Defines common enum types
*/
use crate::types::DiskRpm;
use std::{
    fmt,
    fmt::{Display, Formatter},
    time::Duration,
};

/// The density of a disk, roughly corresponding to its data rate.
/// * `Standard` density: typically referring to FM encoding, typically used by 8" diskettes.
/// * `Double` density: typically referring to MFM encoding at 250/300Kbps. Appeared on 5.25" and 3.5" diskettes.
/// * `High` density: typically referring to MFM encoding at 500Kbps. Appeared on 5.25" and 3.5" diskettes.
/// * `Extended` density: typically referring to MFM encoding at 1Mbps. Appeared on 3.5" diskettes.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiskDensity {
    Standard,
    #[default]
    Double,
    High,
    Extended,
}

impl From<DiskDataRate> for DiskDensity {
    fn from(rate: DiskDataRate) -> Self {
        use DiskDataRate::*;
        match rate {
            Rate125Kbps(_) => DiskDensity::Standard,
            Rate250Kbps(_) => DiskDensity::Double,
            Rate300Kbps(_) => DiskDensity::Double,
            Rate500Kbps(_) => DiskDensity::High,
            Rate1000Kbps(_) => DiskDensity::Extended,
            _ => DiskDensity::Double,
        }
    }
}

impl Display for DiskDensity {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        use DiskDensity::*;
        match self {
            Standard => write!(f, "Standard"),
            Double => write!(f, "Double"),
            High => write!(f, "High"),
            Extended => write!(f, "Extended"),
        }
    }
}

impl DiskDensity {
    /// Attempt to determine the disk density from the MFM bitcell period, in seconds.
    pub fn from_base_clock(clock: f64) -> Option<DiskDensity> {
        match clock {
            0.375e-6..0.625e-6 => Some(DiskDensity::Extended),
            0.75e-6..1.25e-6 => Some(DiskDensity::High),
            1.5e-6..2.5e-6 => Some(DiskDensity::Double),
            _ => None,
        }
    }
}

/// DiskDataRate defines the data rate of a track - for MFM and FM encoding, this is the
/// bit rate / 2.
/// DiskDataRate defines standard data rate categories, while storing a clock adjustment factor to
/// make possible calculation of the exact data rate if required.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiskDataRate {
    RateNonstandard(u32),
    Rate125Kbps(f64),
    Rate250Kbps(f64),
    Rate300Kbps(f64),
    Rate500Kbps(f64),
    Rate1000Kbps(f64),
}

impl Default for DiskDataRate {
    fn default() -> Self {
        DiskDataRate::Rate250Kbps(1.0)
    }
}

impl From<DiskDataRate> for u32 {
    fn from(rate: DiskDataRate) -> Self {
        use DiskDataRate::*;
        match rate {
            Rate125Kbps(f) => (125_000.0 * f) as u32,
            Rate250Kbps(f) => (250_000.0 * f) as u32,
            Rate300Kbps(f) => (300_000.0 * f) as u32,
            Rate500Kbps(f) => (500_000.0 * f) as u32,
            Rate1000Kbps(f) => (1_000_000.0 * f) as u32,
            RateNonstandard(rate) => rate,
        }
    }
}

/// Implement a conversion from a u32 to a DiskDataRate.
/// An 8-15% rate deviance is allowed for standard rates, otherwise a RateNonstandard is returned.
impl From<u32> for DiskDataRate {
    fn from(rate: u32) -> Self {
        use DiskDataRate::*;
        match rate {
            93_750..143_750 => Rate125Kbps(rate as f64 / 125_000.0),
            212_000..271_000 => Rate250Kbps(rate as f64 / 250_000.0),
            271_000..345_000 => Rate300Kbps(rate as f64 / 300_000.0),
            425_000..575_000 => Rate500Kbps(rate as f64 / 500_000.0),
            850_000..1_150_000 => Rate1000Kbps(rate as f64 / 1_000_000.0),
            _ => RateNonstandard(rate),
        }
    }
}

impl Display for DiskDataRate {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        use DiskDataRate::*;
        match self {
            RateNonstandard(rate) => write!(fmt, "*{}Kbps", rate / 1000),
            Rate125Kbps(f) => write!(fmt, "125Kbps (x{:.2})", f),
            Rate250Kbps(f) => write!(fmt, "250Kbps (x{:.2})", f),
            Rate300Kbps(f) => write!(fmt, "300Kbps (x{:.2})", f),
            Rate500Kbps(f) => write!(fmt, "500Kbps (x{:.2})", f),
            Rate1000Kbps(f) => write!(fmt, "1000Kbps (x{:.2})", f),
        }
    }
}

impl DiskDataRate {
    /// Return the period of a single MFM bitcell at this data rate, in seconds.
    /// Each data bit occupies two bitcells (clock and data), so this is half the data bit period.
    pub fn bitcell_period(&self) -> f64 {
        1.0 / (u32::from(*self) as f64 * 2.0)
    }
}

/// A [DataRateProfile] pairs a data rate with the rotation rate a drive spins at while reading
/// it. Together these fix the nominal bitcell period and the expected time between index pulses.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataRateProfile {
    /// 250Kbps at 300RPM. 360K 5.25" and 720K 3.5" disks.
    #[default]
    DoubleDensity,
    /// 300Kbps at 360RPM. Double density disks read in a high density 5.25" drive.
    DoubleDensity360,
    /// 500Kbps at 300RPM. 1.44M 3.5" disks.
    HighDensity,
    /// 500Kbps at 360RPM. 1.2M 5.25" disks.
    HighDensity360,
    /// 1Mbps at 300RPM. 2.88M 3.5" disks.
    ExtendedDensity,
}

impl Display for DataRateProfile {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} @ {}", self.data_rate(), self.rpm())
    }
}

impl DataRateProfile {
    pub fn data_rate(&self) -> DiskDataRate {
        use DataRateProfile::*;
        match self {
            DoubleDensity => DiskDataRate::Rate250Kbps(1.0),
            DoubleDensity360 => DiskDataRate::Rate300Kbps(1.0),
            HighDensity | HighDensity360 => DiskDataRate::Rate500Kbps(1.0),
            ExtendedDensity => DiskDataRate::Rate1000Kbps(1.0),
        }
    }

    pub fn rpm(&self) -> DiskRpm {
        use DataRateProfile::*;
        match self {
            DoubleDensity360 | HighDensity360 => DiskRpm::Rpm360(1.0),
            _ => DiskRpm::Rpm300(1.0),
        }
    }

    pub fn density(&self) -> DiskDensity {
        DiskDensity::from(self.data_rate())
    }

    /// The nominal MFM bitcell period, in seconds.
    pub fn bitcell_period(&self) -> f64 {
        self.data_rate().bitcell_period()
    }

    /// The expected time between index pulses.
    pub fn revolution_period(&self) -> Duration {
        Duration::from_secs_f64(self.rpm().index_time())
    }

    /// The number of MFM bitcells in one revolution of a track.
    pub fn bitcells_per_revolution(&self) -> usize {
        (self.rpm().index_time() / self.bitcell_period()).round() as usize
    }
}

/// The direction of head movement requested by the direction line.
/// `Inward` moves toward the spindle, increasing the cylinder number.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StepDirection {
    Inward,
    Outward,
}

impl Display for StepDirection {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            StepDirection::Inward => write!(f, "in"),
            StepDirection::Outward => write!(f, "out"),
        }
    }
}

/// The field of a sector a CRC applies to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IntegrityField {
    Header,
    Data,
}

impl Display for IntegrityField {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            IntegrityField::Header => write!(f, "header"),
            IntegrityField::Data => write!(f, "data"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn profile_bitcells() {
        assert_eq!(DataRateProfile::DoubleDensity.bitcell_period(), 2e-6);
        assert_eq!(DataRateProfile::HighDensity.bitcell_period(), 1e-6);
        assert_eq!(DataRateProfile::DoubleDensity.bitcells_per_revolution(), 100_000);
        assert_eq!(DataRateProfile::HighDensity.bitcells_per_revolution(), 200_000);
        assert_eq!(DataRateProfile::HighDensity360.bitcells_per_revolution(), 166_667);
    }

    #[test]
    fn profile_revolution_periods() {
        for profile in DataRateProfile::iter() {
            let period = profile.revolution_period().as_secs_f64();
            assert!(period > 0.16 && period < 0.21, "{}: {}", profile, period);
        }
    }

    #[test]
    fn data_rate_from_u32_allows_deviation() {
        assert!(matches!(DiskDataRate::from(245_000), DiskDataRate::Rate250Kbps(_)));
        assert!(matches!(DiskDataRate::from(510_000), DiskDataRate::Rate500Kbps(_)));
        assert!(matches!(DiskDataRate::from(700_000), DiskDataRate::RateNonstandard(_)));
    }

    #[test]
    fn density_from_base_clock() {
        assert_eq!(DiskDensity::from_base_clock(2e-6), Some(DiskDensity::Double));
        assert_eq!(DiskDensity::from_base_clock(1e-6), Some(DiskDensity::High));
        assert_eq!(DiskDensity::from_base_clock(8e-6), None);
    }
}
