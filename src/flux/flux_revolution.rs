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

    src/flux/flux_revolution.rs

    A buffer holding the flux intervals captured over one revolution of a track.
*/
use crate::{
    flux::pll::{ClockRecovery, MfmDecoder},
    format_ms,
    types::{DiskCh, DiskRpm},
};
use std::{iter::Copied, slice::Iter};

/// A struct containing statistics about a flux revolution.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FluxRevolutionStats {
    /// The time between the index pulses bounding the revolution, in seconds.
    pub index_time: f64,
    /// The sum of all captured flux intervals, in seconds.
    pub flux_time: f64,
    /// The number of flux transitions in the revolution.
    pub ft_ct: usize,
    /// The duration of the first flux transition in the revolution.
    pub first_ft: f64,
    /// The duration of the last flux transition in the revolution.
    pub last_ft: f64,
}

/// A struct representing one revolution of a track, as a list of times between flux
/// transitions starting at an index pulse.
#[derive(Clone, Debug, Default)]
pub struct FluxRevolution {
    /// The physical cylinder and head the revolution was read from.
    pub ch: DiskCh,
    /// The time between the index pulses bounding the revolution, in seconds.
    pub index_time: f64,
    /// The list of times between flux transitions, in seconds.
    pub flux_deltas: Vec<f64>,
}

impl FluxRevolution {
    /// Create an empty `FluxRevolution` with room for `capacity` intervals.
    pub fn with_capacity(ch: DiskCh, capacity: usize) -> Self {
        FluxRevolution {
            ch,
            index_time: 0.0,
            flux_deltas: Vec::with_capacity(capacity),
        }
    }

    /// Create a new `FluxRevolution` from a list of durations between flux transitions in seconds.
    pub fn from_f64(ch: DiskCh, deltas: &[f64], index_time: f64) -> Self {
        FluxRevolution {
            ch,
            index_time,
            flux_deltas: deltas.to_vec(),
        }
    }

    #[inline]
    pub fn push(&mut self, delta: f64) {
        self.flux_deltas.push(delta);
    }

    pub fn delta_iter(&self) -> Iter<f64> {
        self.flux_deltas.iter()
    }

    /// Return the number of flux transitions captured.
    pub fn ft_ct(&self) -> usize {
        self.flux_deltas.len()
    }

    /// Return the sum of all captured intervals, in seconds.
    pub fn flux_time(&self) -> f64 {
        self.flux_deltas.iter().sum()
    }

    /// Derive the rotation rate from the measured index time, if plausible.
    pub fn rpm(&self) -> Option<DiskRpm> {
        DiskRpm::try_from_index_time(self.index_time)
    }

    /// Retrieve statistics about the revolution.
    pub fn stats(&self) -> FluxRevolutionStats {
        FluxRevolutionStats {
            index_time: self.index_time,
            flux_time: self.flux_time(),
            ft_ct: self.ft_ct(),
            first_ft: *self.flux_deltas.first().unwrap_or(&0.0),
            last_ft: *self.flux_deltas.last().unwrap_or(&0.0),
        }
    }

    /// Return an [MfmDecoder] over the intervals of this revolution.
    pub fn decoder(&self, clock: ClockRecovery) -> MfmDecoder<Copied<Iter<f64>>> {
        log::trace!(
            "FluxRevolution::decoder(): Decoding {} transitions over {}",
            self.ft_ct(),
            format_ms!(self.index_time)
        );
        MfmDecoder::new(self.flux_deltas.iter().copied(), clock)
    }
}
