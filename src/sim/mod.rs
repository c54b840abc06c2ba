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

    src/sim/mod.rs

    An in-memory floppy drive running against a virtual clock.
*/

//! A [SimulatedDrive] implements [DriveLines], [FluxSource] and [Clock] over a shared
//! in-memory model of a drive mechanism and a disk.
//!
//! Time is virtual: it advances only when the driver delays or reads a flux interval. The
//! spindle turns at the rate of the drive's [DataRateProfile], so index pulses and flux
//! transitions stay consistent with each other however the driver interleaves its polling.
//!
//! ```
//! use fluxfox_drive::{DataRateProfile, DiskChsn, DriveConfig, SectorDescriptor, SimulatedDrive};
//!
//! let sim = SimulatedDrive::new(DataRateProfile::DoubleDensity, 80);
//! let sectors: Vec<_> = (1..=9)
//!     .map(|s| SectorDescriptor::new(DiskChsn::new(0, 0, s, 2), vec![s; 512]))
//!     .collect();
//! sim.insert_formatted_track((0, 0).into(), &sectors).unwrap();
//!
//! let mut drive = sim.drive(DriveConfig::default()).unwrap();
//! let sector = drive.read_sector(0, 0, 4).unwrap();
//! assert_eq!(sector.bytes()[0], 4);
//! ```

use crate::{
    config::DriveConfig,
    drive::FloppyDrive,
    hal::{Clock, DriveLines, FluxSource, InputLine, OutputLine},
    track_schema::system34::{System34Schema, IBM_GAP3_DEFAULT},
    types::{DataRateProfile, DiskCh, SectorDescriptor, StepDirection},
    DriveError,
};
use bit_vec::BitVec;
use std::{cell::RefCell, collections::HashMap, rc::Rc, time::Duration};

/// The width of the index pulse at the start of each revolution.
pub const INDEX_PULSE_WIDTH: Duration = Duration::from_millis(2);
/// The time the simulated spindle needs to reach speed after the motor line is asserted.
pub const DEFAULT_SIM_SPIN_UP: Duration = Duration::from_millis(500);

struct SimState {
    now: Duration,
    profile: DataRateProfile,
    period_ns: u64,
    cylinders: u16,
    spin_up_time: Duration,

    selected: bool,
    motor: bool,
    motor_since: Duration,
    inward: bool,
    step: bool,
    side: bool,

    cylinder: u16,
    stalled: bool,
    track0_broken: bool,
    write_protected: bool,

    /// Flux transition times within a revolution, in nanoseconds from the index, sorted.
    tracks: HashMap<DiskCh, Vec<u64>>,
    step_log: Vec<StepDirection>,
}

impl SimState {
    fn spinning(&self) -> bool {
        self.motor && !self.stalled && self.now - self.motor_since >= self.spin_up_time
    }

    fn angle_ns(&self) -> u64 {
        (self.now.as_nanos() % self.period_ns as u128) as u64
    }

    fn ch(&self) -> DiskCh {
        DiskCh::new(self.cylinder, self.side as u8)
    }

    fn step_pulse(&mut self) {
        let direction = if self.inward {
            StepDirection::Inward
        }
        else {
            StepDirection::Outward
        };
        self.step_log.push(direction);
        if !self.selected {
            log::trace!("SimulatedDrive: Step pulse ignored while deselected");
            return;
        }
        self.cylinder = match direction {
            StepDirection::Inward => (self.cylinder + 1).min(self.cylinders - 1),
            StepDirection::Outward => self.cylinder.saturating_sub(1),
        };
        log::trace!("SimulatedDrive: Stepped {} to cylinder {}", direction, self.cylinder);
    }

    fn next_transition(&self) -> Option<u64> {
        let track = self.tracks.get(&self.ch())?;
        let first = *track.first()?;
        let angle = self.angle_ns();
        let next = track.partition_point(|&t| t <= angle);
        Some(match track.get(next) {
            Some(&t) => t - angle,
            None => first + self.period_ns - angle,
        })
    }
}

/// A simulated drive and disk. Clone the handles returned by [SimulatedDrive::lines],
/// [SimulatedDrive::flux] and [SimulatedDrive::clock] into a [FloppyDrive], and keep the
/// [SimulatedDrive] to inspect or disturb the mechanism.
#[derive(Clone)]
pub struct SimulatedDrive {
    state: Rc<RefCell<SimState>>,
}

/// The [DriveLines] handle of a [SimulatedDrive].
pub struct SimLines(Rc<RefCell<SimState>>);
/// The [FluxSource] handle of a [SimulatedDrive].
pub struct SimFlux(Rc<RefCell<SimState>>);
/// The [Clock] handle of a [SimulatedDrive].
pub struct SimClock(Rc<RefCell<SimState>>);

impl SimulatedDrive {
    /// Create a drive with `cylinders` physical cylinders and no disk data. The head starts at
    /// cylinder 0.
    pub fn new(profile: DataRateProfile, cylinders: u16) -> Self {
        let period_ns = profile.revolution_period().as_nanos() as u64;
        SimulatedDrive {
            state: Rc::new(RefCell::new(SimState {
                now: Duration::ZERO,
                profile,
                period_ns,
                cylinders: cylinders.max(1),
                spin_up_time: DEFAULT_SIM_SPIN_UP,
                selected: false,
                motor: false,
                motor_since: Duration::ZERO,
                inward: false,
                step: false,
                side: false,
                cylinder: 0,
                stalled: false,
                track0_broken: false,
                write_protected: false,
                tracks: HashMap::new(),
                step_log: Vec::new(),
            })),
        }
    }

    pub fn with_spin_up_time(self, spin_up_time: Duration) -> Self {
        self.state.borrow_mut().spin_up_time = spin_up_time;
        self
    }

    pub fn lines(&self) -> SimLines {
        SimLines(self.state.clone())
    }

    pub fn flux(&self) -> SimFlux {
        SimFlux(self.state.clone())
    }

    pub fn clock(&self) -> SimClock {
        SimClock(self.state.clone())
    }

    /// Build a [FloppyDrive] over this simulator.
    pub fn drive(&self, config: DriveConfig) -> Result<FloppyDrive<SimLines, SimFlux, SimClock>, DriveError> {
        FloppyDrive::new(config, self.lines(), self.flux(), self.clock())
    }

    /// The current virtual time.
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    pub fn profile(&self) -> DataRateProfile {
        self.state.borrow().profile
    }

    /// The physical cylinder the head is over.
    pub fn cylinder(&self) -> u16 {
        self.state.borrow().cylinder
    }

    /// Move the head without issuing step pulses, as if moved by hand.
    pub fn set_head_position(&self, cylinder: u16) {
        let mut state = self.state.borrow_mut();
        state.cylinder = cylinder.min(state.cylinders - 1);
    }

    /// The direction of every step pulse received, in order.
    pub fn step_log(&self) -> Vec<StepDirection> {
        self.state.borrow().step_log.clone()
    }

    pub fn clear_step_log(&self) {
        self.state.borrow_mut().step_log.clear();
    }

    pub fn motor_on(&self) -> bool {
        self.state.borrow().motor
    }

    pub fn selected(&self) -> bool {
        self.state.borrow().selected
    }

    /// Stop the spindle from turning: no index pulses and no flux.
    pub fn set_stalled(&self, stalled: bool) {
        self.state.borrow_mut().stalled = stalled;
    }

    /// Disconnect the track 0 sensor.
    pub fn set_track0_broken(&self, broken: bool) {
        self.state.borrow_mut().track0_broken = broken;
    }

    pub fn set_write_protected(&self, protected: bool) {
        self.state.borrow_mut().write_protected = protected;
    }

    /// Place a track described by flux transition times, in seconds from the index pulse.
    /// Times outside the revolution are discarded.
    pub fn insert_track_flux(&self, ch: DiskCh, transitions: &[f64]) {
        let mut state = self.state.borrow_mut();
        let period_ns = state.period_ns;
        let mut times: Vec<u64> = transitions
            .iter()
            .filter(|&&t| t >= 0.0)
            .map(|&t| (t * 1e9).round() as u64)
            .filter(|&t| t < period_ns)
            .collect();
        times.sort_unstable();
        times.dedup();
        log::debug!(
            "SimulatedDrive::insert_track_flux(): Inserted {} transitions on track {}",
            times.len(),
            ch
        );
        state.tracks.insert(ch, times);
    }

    /// Place a track described by raw MFM bitcells, starting at the index pulse.
    pub fn insert_track_bits(&self, ch: DiskCh, bits: &BitVec) {
        let bitcell = self.profile().bitcell_period();
        let transitions: Vec<f64> = bits
            .iter()
            .enumerate()
            .filter(|(_, bit)| *bit)
            .map(|(i, _)| i as f64 * bitcell)
            .collect();
        self.insert_track_flux(ch, &transitions);
    }

    /// Format a track with `sectors` in the IBM System 34 layout and place it.
    pub fn insert_formatted_track(&self, ch: DiskCh, sectors: &[SectorDescriptor]) -> Result<(), DriveError> {
        let bitcells = self.profile().bitcells_per_revolution();
        let bits = System34Schema::format_track(bitcells, sectors, IBM_GAP3_DEFAULT)?;
        self.insert_track_bits(ch, &bits);
        Ok(())
    }

    pub fn remove_track(&self, ch: DiskCh) {
        self.state.borrow_mut().tracks.remove(&ch);
    }
}

impl DriveLines for SimLines {
    fn write(&mut self, line: OutputLine, asserted: bool) {
        let mut state = self.0.borrow_mut();
        match line {
            OutputLine::Select => state.selected = asserted,
            OutputLine::Motor => {
                if asserted && !state.motor {
                    state.motor_since = state.now;
                }
                state.motor = asserted;
            }
            OutputLine::Direction => state.inward = asserted,
            OutputLine::Step => {
                if asserted && !state.step {
                    state.step_pulse();
                }
                state.step = asserted;
            }
            OutputLine::Side => state.side = asserted,
        }
    }

    fn read(&mut self, line: InputLine) -> bool {
        let state = self.0.borrow();
        if !state.selected {
            return false;
        }
        match line {
            InputLine::Track0 => state.cylinder == 0 && !state.track0_broken,
            InputLine::Index => state.spinning() && state.angle_ns() < INDEX_PULSE_WIDTH.as_nanos() as u64,
            InputLine::WriteProtect => state.write_protected,
        }
    }
}

impl FluxSource for SimFlux {
    fn next_interval(&mut self, timeout: Duration) -> Option<f64> {
        let mut state = self.0.borrow_mut();
        let next = if state.selected && state.spinning() {
            state.next_transition()
        }
        else {
            None
        };

        match next {
            Some(delta_ns) if delta_ns <= timeout.as_nanos() as u64 => {
                state.now += Duration::from_nanos(delta_ns);
                Some(delta_ns as f64 * 1e-9)
            }
            _ => {
                state.now += timeout;
                None
            }
        }
    }
}

impl Clock for SimClock {
    fn now(&self) -> Duration {
        self.0.borrow().now
    }

    fn delay(&mut self, duration: Duration) {
        self.0.borrow_mut().now += duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_move_head_only_when_selected() {
        let sim = SimulatedDrive::new(DataRateProfile::DoubleDensity, 80);
        let mut lines = sim.lines();

        lines.write(OutputLine::Direction, true);
        lines.write(OutputLine::Step, true);
        lines.write(OutputLine::Step, false);
        assert_eq!(sim.cylinder(), 0);

        lines.write(OutputLine::Select, true);
        for _ in 0..100 {
            lines.write(OutputLine::Step, true);
            lines.write(OutputLine::Step, false);
        }
        assert_eq!(sim.cylinder(), 79);
        assert_eq!(sim.step_log().len(), 101);
        assert!(!lines.read(InputLine::Track0));
    }

    #[test]
    fn index_pulse_follows_rotation() {
        let sim = SimulatedDrive::new(DataRateProfile::DoubleDensity, 80);
        let (mut lines, mut clock) = (sim.lines(), sim.clock());
        lines.write(OutputLine::Select, true);
        lines.write(OutputLine::Motor, true);

        // Not yet up to speed.
        clock.delay(Duration::from_millis(400));
        assert!(!lines.read(InputLine::Index));
        clock.delay(Duration::from_millis(200));
        assert!(lines.read(InputLine::Index));
        clock.delay(Duration::from_millis(3));
        assert!(!lines.read(InputLine::Index));

        sim.set_stalled(true);
        clock.delay(Duration::from_millis(197));
        assert!(!lines.read(InputLine::Index));
    }

    #[test]
    fn flux_intervals_follow_track() {
        let sim = SimulatedDrive::new(DataRateProfile::DoubleDensity, 80);
        sim.insert_track_flux(DiskCh::new(0, 0), &[0.001, 0.001004, 0.00101]);
        let (mut lines, mut flux) = (sim.lines(), sim.flux());
        let timeout = Duration::from_secs(1);

        assert_eq!(flux.next_interval(timeout), None);

        lines.write(OutputLine::Select, true);
        lines.write(OutputLine::Motor, true);
        let mut clock = sim.clock();
        clock.delay(Duration::from_millis(600));

        let intervals: Vec<f64> = (0..4).map(|_| flux.next_interval(timeout).unwrap()).collect();
        assert!((intervals[0] - 0.001).abs() < 1e-9);
        assert!((intervals[1] - 4e-6).abs() < 1e-9);
        assert!((intervals[2] - 6e-6).abs() < 1e-9);
        // Wraps around to the first transition of the next revolution.
        assert!((intervals[3] - (0.2 - 0.00001)).abs() < 1e-9);
    }

    #[test]
    fn empty_track_times_out() {
        let sim = SimulatedDrive::new(DataRateProfile::DoubleDensity, 80);
        let (mut lines, mut flux) = (sim.lines(), sim.flux());
        lines.write(OutputLine::Select, true);
        lines.write(OutputLine::Motor, true);
        let start = sim.now();
        assert_eq!(flux.next_interval(Duration::from_millis(5)), None);
        assert_eq!(sim.now() - start, Duration::from_millis(5));
    }
}
