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

    src/flux/mod.rs

    Flux transition classification, statistics and revolution capture buffers.
*/
use crate::types::DiskDensity;
use std::{
    fmt,
    fmt::{Display, Formatter},
};

pub mod flux_revolution;
pub mod pll;

#[doc(hidden)]
#[macro_export]
macro_rules! format_us {
    ($value:expr) => {
        format!("{:.4}μs", $value * 1_000_000.0)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! format_ms {
    ($value:expr) => {
        format!("{:.4}ms", $value * 1_000.0)
    };
}

/// The three legal MFM spacings between flux transitions, expressed in bitcells.
/// A `Short` transition spans two bitcells, a `Medium` three and a `Long` four.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FluxTransition {
    Short,
    Medium,
    Long,
}

impl Display for FluxTransition {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            FluxTransition::Short => write!(f, "S"),
            FluxTransition::Medium => write!(f, "M"),
            FluxTransition::Long => write!(f, "L"),
        }
    }
}

impl FluxTransition {
    /// Return the number of bitcells this transition spans.
    #[inline]
    pub fn cells(&self) -> u32 {
        match self {
            FluxTransition::Short => 2,
            FluxTransition::Medium => 3,
            FluxTransition::Long => 4,
        }
    }

    /// Return the transition spanning the given number of bitcells, if legal.
    pub fn from_cells(cells: u32) -> Option<FluxTransition> {
        match cells {
            2 => Some(FluxTransition::Short),
            3 => Some(FluxTransition::Medium),
            4 => Some(FluxTransition::Long),
            _ => None,
        }
    }

    /// Return the raw bitcells this transition produces: `cells - 1` zeros followed by a one.
    pub fn to_bits(&self) -> &[bool] {
        match self {
            FluxTransition::Short => &[false, true],
            FluxTransition::Medium => &[false, false, true],
            FluxTransition::Long => &[false, false, false, true],
        }
    }
}

/// Statistics gathered while decoding a stream of flux intervals.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FluxStats {
    pub total: u32,
    pub short: u32,
    pub short_time: f64,
    pub medium: u32,
    pub long: u32,
    /// Intervals that fell outside every timing window and were discarded.
    pub noise: u32,

    pub shortest_flux: f64,
    pub longest_flux:  f64,
}

impl Display for FluxStats {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "Total: {} S: {} M: {} L: {} Shortest: {} Longest: {} Noise: {}",
            self.total,
            self.short,
            self.medium,
            self.long,
            format_us!(self.shortest_flux),
            format_us!(self.longest_flux),
            self.noise
        )
    }
}

impl FluxStats {
    /// Record a single interval and its classification, or `None` if it was rejected as noise.
    pub fn record(&mut self, interval: f64, transition: Option<FluxTransition>) {
        if self.total == 0 {
            self.shortest_flux = interval;
            self.longest_flux = interval;
        }
        else {
            self.shortest_flux = self.shortest_flux.min(interval);
            self.longest_flux = self.longest_flux.max(interval);
        }
        self.total += 1;

        match transition {
            Some(FluxTransition::Short) => {
                self.short += 1;
                self.short_time += interval;
            }
            Some(FluxTransition::Medium) => self.medium += 1,
            Some(FluxTransition::Long) => self.long += 1,
            None => self.noise += 1,
        }
    }

    /// Infer the disk density from the average duration of short transitions.
    /// A short transition spans two bitcells, so 4µs is double density and 2µs high density.
    pub fn detect_density(&self) -> Option<DiskDensity> {
        let avg = self.short_avg();
        log::debug!("FluxStats::detect_density(): Transition average: {}", format_us!(avg));

        match avg {
            1.0e-6..3e-6 => Some(DiskDensity::High),
            3e-6..=5e-6 => Some(DiskDensity::Double),
            _ => None,
        }
    }

    fn short_avg(&self) -> f64 {
        if self.short == 0 {
            0.0
        }
        else {
            self.short_time / self.short as f64
        }
    }
}
