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
*/

//! RPM (Revolutions Per Minute) related types and functions.

use std::{
    fmt,
    fmt::{Display, Formatter},
};

/// A [DiskRpm] represents the physical rotation rate of a disk within a drive.
///
/// The most common rotation rate used for floppy disks is 300RPM. IBM PC 5.25" high density
/// drives spin at 360RPM, even when reading double density disks.
///
/// The enclosed factor records a measured deviation from the nominal rate.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiskRpm {
    /// A 300 RPM base rotation rate.
    Rpm300(f64),
    /// A 360 RPM base rotation rate.
    Rpm360(f64),
}

impl From<DiskRpm> for f64 {
    /// Convert a DiskRpm to a floating-point RPM value.
    fn from(rpm: DiskRpm) -> Self {
        use DiskRpm::*;
        match rpm {
            Rpm300(f) => 300.0 * f,
            Rpm360(f) => 360.0 * f,
        }
    }
}

impl Default for DiskRpm {
    fn default() -> Self {
        DiskRpm::Rpm300(1.0)
    }
}

impl Display for DiskRpm {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        let f = self.factor();
        let f_str = if f == 1.0 {
            "".to_string()
        }
        else if f > 1.0 {
            format!(" +{:.3}%", (f - 1.0) * 100.0)
        }
        else {
            format!(" -{:.3}%", (1.0 - f) * 100.0)
        };
        match self {
            DiskRpm::Rpm300(_) => write!(fmt, "300RPM{}", f_str),
            DiskRpm::Rpm360(_) => write!(fmt, "360RPM{}", f_str),
        }
    }
}

impl DiskRpm {
    /// Retrieve the adjustment factor for this [DiskRpm].
    pub fn factor(&self) -> f64 {
        match *self {
            DiskRpm::Rpm300(f) => f,
            DiskRpm::Rpm360(f) => f,
        }
    }

    /// Try to calculate a [DiskRpm] from the time between index pulses in seconds.
    /// Returns `None` if the time does not correspond to a plausible rotation rate, such as
    /// when the spindle is stalled or an index pulse was missed.
    pub fn try_from_index_time(time: f64) -> Option<DiskRpm> {
        if time <= 0.0 {
            return None;
        }
        let rpm = 60.0 / time;
        // We'd like to support a 15% deviation, but there is a small overlap between 300 +15%
        // and 360 -15%, so we split the difference at 327 RPM.
        match rpm {
            255.0..327.00 => Some(DiskRpm::Rpm300(rpm / 300.0)),
            327.0..414.00 => Some(DiskRpm::Rpm360(rpm / 360.0)),
            _ => None,
        }
    }

    /// Convert a [DiskRpm] to an index time in seconds.
    pub fn index_time(&self) -> f64 {
        60.0 / f64::from(*self)
    }
}
