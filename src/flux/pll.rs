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

    src/flux/pll.rs

    MFM clock recovery and flux interval decoding.
*/
use crate::{
    config::PllConfig,
    flux::{FluxStats, FluxTransition},
    format_us,
};
use bit_vec::BitVec;

/// The clock recovery state used to classify flux intervals.
///
/// A [ClockRecovery] holds a running estimate of the bitcell period. The estimate starts at the
/// nominal period for the selected data rate and is nudged toward the cell size observed in each
/// accepted interval, but never leaves the band `nominal * (1 ± max_adjust)`.
///
/// Updating is a pure function of the previous state and the interval, so a decoder can be
/// rewound or forked by copying the state.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ClockRecovery {
    nominal: f64,
    estimate: f64,
    max_adjust: f64,
    window: f64,
    gain: f64,
    noise_limit: f64,
}

impl ClockRecovery {
    /// Create a new [ClockRecovery] for the given nominal bitcell period in seconds, with the
    /// default tracking parameters.
    pub fn new(nominal: f64) -> Self {
        Self::from_config(nominal, &PllConfig::default())
    }

    pub fn from_config(nominal: f64, config: &PllConfig) -> Self {
        ClockRecovery {
            nominal,
            estimate: nominal,
            max_adjust: config.max_adjust,
            window: config.window,
            gain: config.gain,
            noise_limit: config.noise_limit,
        }
    }

    /// Re-seed the estimate from the nominal period.
    pub fn reset(&mut self) {
        log::debug!(
            "ClockRecovery::reset(): Resetting clock to nominal period: {}",
            format_us!(self.nominal)
        );
        self.estimate = self.nominal;
    }

    #[inline]
    pub fn nominal(&self) -> f64 {
        self.nominal
    }

    /// The current bitcell period estimate, in seconds.
    #[inline]
    pub fn estimate(&self) -> f64 {
        self.estimate
    }

    /// Return the lower and upper bounds the estimate is clamped to.
    pub fn band(&self) -> (f64, f64) {
        (
            self.nominal * (1.0 - self.max_adjust),
            self.nominal * (1.0 + self.max_adjust),
        )
    }

    /// Classify a flux interval against the current estimate.
    /// Returns `None` if the interval is not within `window` cells of two, three or four cells.
    pub fn classify(&self, interval: f64) -> Option<FluxTransition> {
        // Also rejects NaN.
        if !(interval > 0.0) {
            return None;
        }
        let cells = interval / self.estimate;
        let nearest = cells.round();
        if (cells - nearest).abs() > self.window || !(2.0..=4.0).contains(&nearest) {
            return None;
        }
        FluxTransition::from_cells(nearest as u32)
    }

    /// Return the clock state after observing `interval`, which was classified as `transition`.
    /// Samples whose implied cell size deviates from the estimate by more than `noise_limit` are
    /// ignored.
    #[must_use]
    pub fn update(self, interval: f64, transition: FluxTransition) -> ClockRecovery {
        let observed = interval / transition.cells() as f64;
        let deviation = (observed - self.estimate) / self.estimate;
        if deviation.abs() > self.noise_limit {
            log::trace!(
                "ClockRecovery::update(): Rejecting cell of {} ({:.1}% from estimate)",
                format_us!(observed),
                deviation * 100.0
            );
            return self;
        }

        let (min, max) = self.band();
        let estimate = (self.estimate + self.gain * (observed - self.estimate)).clamp(min, max);
        ClockRecovery { estimate, ..self }
    }
}

/// An iterator adapter converting flux intervals into a raw MFM bitcell stream.
///
/// Each interval classified as a short, medium or long transition produces `cells - 1` zero
/// cells followed by a one. Intervals that fit no class are counted as noise in [FluxStats]
/// and produce nothing.
pub struct MfmDecoder<I> {
    intervals: I,
    clock: ClockRecovery,
    stats: FluxStats,
    pending_zeros: u32,
    pending_one: bool,
}

impl<I> MfmDecoder<I>
where
    I: Iterator<Item = f64>,
{
    pub fn new(intervals: I, clock: ClockRecovery) -> Self {
        MfmDecoder {
            intervals,
            clock,
            stats: FluxStats::default(),
            pending_zeros: 0,
            pending_one: false,
        }
    }

    pub fn stats(&self) -> &FluxStats {
        &self.stats
    }

    pub fn clock(&self) -> &ClockRecovery {
        &self.clock
    }

    /// Decode all remaining intervals into a [BitVec].
    pub fn decode_all(mut self) -> (BitVec, FluxStats) {
        let mut bits = BitVec::new();
        for bit in self.by_ref() {
            bits.push(bit);
        }
        log::debug!("MfmDecoder::decode_all(): Decoded {} bitcells. {}", bits.len(), self.stats);
        (bits, self.stats)
    }
}

impl<I> Iterator for MfmDecoder<I>
where
    I: Iterator<Item = f64>,
{
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        loop {
            if self.pending_zeros > 0 {
                self.pending_zeros -= 1;
                return Some(false);
            }
            if self.pending_one {
                self.pending_one = false;
                return Some(true);
            }

            let interval = self.intervals.next()?;
            match self.clock.classify(interval) {
                Some(transition) => {
                    self.stats.record(interval, Some(transition));
                    self.clock = self.clock.update(interval, transition);
                    self.pending_zeros = transition.cells() - 1;
                    self.pending_one = true;
                }
                None => {
                    self.stats.record(interval, None);
                    log::trace!(
                        "MfmDecoder::next(): Discarding noise interval of {} (clock: {})",
                        format_us!(interval),
                        format_us!(self.clock.estimate())
                    );
                }
            }
        }
    }
}
