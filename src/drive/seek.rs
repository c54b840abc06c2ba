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

    src/drive/seek.rs

    The head positioning state machine: track 0 calibration and stepping.
*/

use crate::{
    config::DriveConfig,
    drive::DriveState,
    format_ms,
    hal::{Clock, DriveLines, InputLine, OutputLine},
    types::StepDirection,
    DriveError,
};
use std::{
    fmt::{self, Display, Formatter},
    time::Duration,
};

/// The time the step line is held asserted for each pulse.
pub const STEP_PULSE_WIDTH: Duration = Duration::from_micros(10);

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SeekState {
    #[default]
    Idle,
    Calibrating,
    Stepping,
    Settled,
}

impl Display for SeekState {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            SeekState::Idle => write!(f, "Idle"),
            SeekState::Calibrating => write!(f, "Calibrating"),
            SeekState::Stepping => write!(f, "Stepping"),
            SeekState::Settled => write!(f, "Settled"),
        }
    }
}

/// Moves the head to a requested cylinder by pulsing the step line.
///
/// The cylinder in [DriveState] is only trusted after the track 0 sensor has been seen asserted
/// during calibration. Whenever the sensor disagrees with the believed position, the position
/// is discarded and the head is recalibrated.
pub struct TrackSeekController {
    state: SeekState,
    max_cylinders: u16,
    step_settle: Duration,
    max_calibration_steps: u32,
    pulses: u64,
}

impl TrackSeekController {
    pub fn new(config: &DriveConfig) -> Self {
        TrackSeekController {
            state: SeekState::Idle,
            max_cylinders: config.max_cylinders,
            step_settle: config.step_settle,
            max_calibration_steps: config.max_calibration_steps,
            pulses: 0,
        }
    }

    pub fn state(&self) -> SeekState {
        self.state
    }

    /// Return the total number of step pulses issued.
    pub fn pulses(&self) -> u64 {
        self.pulses
    }

    /// Move the head to cylinder `target`, calibrating first if the current cylinder is unknown.
    /// Returns the cylinder the head settled on.
    pub fn seek<L, C>(
        &mut self,
        drive: &mut DriveState,
        lines: &mut L,
        clock: &mut C,
        target: i32,
    ) -> Result<u16, DriveError>
    where
        L: DriveLines + ?Sized,
        C: Clock + ?Sized,
    {
        if target < 0 || target >= self.max_cylinders as i32 {
            log::error!(
                "TrackSeekController::seek(): Cylinder {} out of range 0-{}",
                target,
                self.max_cylinders - 1
            );
            return Err(DriveError::InvalidArgument(format!(
                "Cylinder {} out of range 0-{}",
                target,
                self.max_cylinders - 1
            )));
        }
        let target = target as u16;

        if Self::sensor_contradicts(drive, lines) {
            log::warn!(
                "TrackSeekController::seek(): Track 0 sensor contradicts cylinder {:?}. Recalibrating.",
                drive.cylinder
            );
            drive.cylinder = None;
        }

        let start_pulses = self.pulses;
        for _attempt in 0..2 {
            let current = match drive.cylinder {
                Some(cylinder) => cylinder,
                None => self.calibrate(drive, lines, clock)?,
            };

            if current != target {
                self.step_to(drive, lines, clock, current, target);
            }

            if !Self::sensor_contradicts(drive, lines) {
                self.state = SeekState::Settled;
                log::debug!(
                    "TrackSeekController::seek(): Settled on cylinder {} after {} pulses",
                    target,
                    self.pulses - start_pulses
                );
                return Ok(target);
            }

            log::warn!(
                "TrackSeekController::seek(): Track 0 sensor contradicts cylinder {} after stepping",
                target
            );
            drive.cylinder = None;
        }

        self.state = SeekState::Idle;
        let issued = (self.pulses - start_pulses) as u32;
        log::error!(
            "TrackSeekController::seek(): Head position lost seeking cylinder {} after {} pulses",
            target,
            issued
        );
        Err(DriveError::CalibrationFault(issued))
    }

    /// Step outward until the track 0 sensor asserts, issuing at most `max_calibration_steps`
    /// pulses. On success the cylinder becomes 0.
    pub fn calibrate<L, C>(&mut self, drive: &mut DriveState, lines: &mut L, clock: &mut C) -> Result<u16, DriveError>
    where
        L: DriveLines + ?Sized,
        C: Clock + ?Sized,
    {
        self.state = SeekState::Calibrating;
        drive.cylinder = None;
        Self::set_direction(lines, StepDirection::Outward);

        let start = clock.now();
        for steps in 0..=self.max_calibration_steps {
            if lines.read(InputLine::Track0) {
                drive.cylinder = Some(0);
                log::debug!(
                    "TrackSeekController::calibrate(): Found track 0 after {} steps in {}",
                    steps,
                    format_ms!((clock.now() - start).as_secs_f64())
                );
                return Ok(0);
            }
            if steps < self.max_calibration_steps {
                self.pulse(lines, clock);
            }
        }

        self.state = SeekState::Idle;
        log::error!(
            "TrackSeekController::calibrate(): Track 0 not found after {} steps",
            self.max_calibration_steps
        );
        Err(DriveError::CalibrationFault(self.max_calibration_steps))
    }

    fn step_to<L, C>(&mut self, drive: &mut DriveState, lines: &mut L, clock: &mut C, from: u16, to: u16)
    where
        L: DriveLines + ?Sized,
        C: Clock + ?Sized,
    {
        self.state = SeekState::Stepping;
        let direction = if to > from {
            StepDirection::Inward
        }
        else {
            StepDirection::Outward
        };
        Self::set_direction(lines, direction);

        log::trace!(
            "TrackSeekController::step_to(): Stepping {} from cylinder {} to {}",
            direction,
            from,
            to
        );
        let mut cylinder = from;
        while cylinder != to {
            self.pulse(lines, clock);
            cylinder = match direction {
                StepDirection::Inward => cylinder + 1,
                StepDirection::Outward => cylinder - 1,
            };
            drive.cylinder = Some(cylinder);
        }
    }

    fn set_direction<L: DriveLines + ?Sized>(lines: &mut L, direction: StepDirection) {
        lines.write(OutputLine::Direction, direction == StepDirection::Inward);
    }

    fn pulse<L, C>(&mut self, lines: &mut L, clock: &mut C)
    where
        L: DriveLines + ?Sized,
        C: Clock + ?Sized,
    {
        lines.write(OutputLine::Step, true);
        clock.delay(STEP_PULSE_WIDTH);
        lines.write(OutputLine::Step, false);
        clock.delay(self.step_settle);
        self.pulses += 1;
    }

    fn sensor_contradicts<L: DriveLines + ?Sized>(drive: &DriveState, lines: &mut L) -> bool {
        match drive.cylinder {
            Some(0) => !lines.read(InputLine::Track0),
            Some(_) => lines.read(InputLine::Track0),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// A minimal head mechanism: one step per pulse, track 0 at cylinder 0.
    struct TestLines {
        cylinder: i32,
        inward: bool,
        step: bool,
        outputs: HashMap<OutputLine, bool>,
        pulses: Vec<StepDirection>,
    }

    impl TestLines {
        fn at(cylinder: i32) -> Self {
            TestLines {
                cylinder,
                inward: false,
                step: false,
                outputs: HashMap::new(),
                pulses: Vec::new(),
            }
        }
    }

    impl DriveLines for TestLines {
        fn write(&mut self, line: OutputLine, asserted: bool) {
            self.outputs.insert(line, asserted);
            match line {
                OutputLine::Direction => self.inward = asserted,
                OutputLine::Step => {
                    if asserted && !self.step {
                        if self.inward {
                            self.pulses.push(StepDirection::Inward);
                            self.cylinder = (self.cylinder + 1).min(83);
                        }
                        else {
                            self.pulses.push(StepDirection::Outward);
                            self.cylinder = (self.cylinder - 1).max(0);
                        }
                    }
                    self.step = asserted;
                }
                _ => {}
            }
        }

        fn read(&mut self, line: InputLine) -> bool {
            match line {
                InputLine::Track0 => self.cylinder == 0,
                _ => false,
            }
        }
    }

    #[derive(Default)]
    struct TestClock(Duration);

    impl Clock for TestClock {
        fn now(&self) -> Duration {
            self.0
        }
        fn delay(&mut self, duration: Duration) {
            self.0 += duration;
        }
    }

    #[test]
    fn seek_from_unknown_calibrates() {
        let mut seek = TrackSeekController::new(&DriveConfig::default());
        let mut drive = DriveState::default();
        let mut lines = TestLines::at(3);
        let mut clock = TestClock::default();

        assert_eq!(seek.seek(&mut drive, &mut lines, &mut clock, 5), Ok(5));
        assert_eq!(drive.cylinder, Some(5));
        assert_eq!(seek.state(), SeekState::Settled);
        assert_eq!(lines.cylinder, 5);

        let mut expected = vec![StepDirection::Outward; 3];
        expected.extend([StepDirection::Inward; 5]);
        assert_eq!(lines.pulses, expected);
        // Each pulse is followed by the pulse width and settle delay.
        assert_eq!(clock.0, (STEP_PULSE_WIDTH + Duration::from_millis(3)) * 8);
    }

    #[test]
    fn seek_is_idempotent() {
        let mut seek = TrackSeekController::new(&DriveConfig::default());
        let mut drive = DriveState::default();
        let mut lines = TestLines::at(0);
        let mut clock = TestClock::default();

        seek.seek(&mut drive, &mut lines, &mut clock, 7).unwrap();
        let pulses = seek.pulses();
        seek.seek(&mut drive, &mut lines, &mut clock, 7).unwrap();
        assert_eq!(seek.pulses(), pulses);
        assert_eq!(seek.state(), SeekState::Settled);
    }

    #[test]
    fn out_of_range_targets_issue_no_pulses() {
        let mut seek = TrackSeekController::new(&DriveConfig::default());
        let mut drive = DriveState::default();
        let mut lines = TestLines::at(2);
        let mut clock = TestClock::default();

        for target in [-1, 80, 1000] {
            assert!(matches!(
                seek.seek(&mut drive, &mut lines, &mut clock, target),
                Err(DriveError::InvalidArgument(_))
            ));
        }
        assert_eq!(seek.pulses(), 0);
        assert!(lines.pulses.is_empty());
        assert_eq!(drive.cylinder, None);
    }

    #[test]
    fn missing_track0_is_calibration_fault() {
        struct NoTrack0(TestLines);
        impl DriveLines for NoTrack0 {
            fn write(&mut self, line: OutputLine, asserted: bool) {
                self.0.write(line, asserted)
            }
            fn read(&mut self, _line: InputLine) -> bool {
                false
            }
        }

        let config = DriveConfig::default().with_max_calibration_steps(20);
        let mut seek = TrackSeekController::new(&config);
        let mut drive = DriveState::default();
        let mut lines = NoTrack0(TestLines::at(10));
        let mut clock = TestClock::default();

        assert_eq!(
            seek.seek(&mut drive, &mut lines, &mut clock, 4),
            Err(DriveError::CalibrationFault(20))
        );
        assert_eq!(seek.pulses(), 20);
        assert_eq!(drive.cylinder, None);
        assert_eq!(seek.state(), SeekState::Idle);
    }

    #[test]
    fn sensor_contradiction_forces_recalibration() {
        let mut seek = TrackSeekController::new(&DriveConfig::default());
        let mut drive = DriveState {
            cylinder: Some(0),
            ..Default::default()
        };
        // The head is really at cylinder 2, so track 0 is not asserted.
        let mut lines = TestLines::at(2);
        let mut clock = TestClock::default();

        assert_eq!(seek.seek(&mut drive, &mut lines, &mut clock, 1), Ok(1));
        assert_eq!(lines.cylinder, 1);
        assert_eq!(
            lines.pulses,
            vec![StepDirection::Outward, StepDirection::Outward, StepDirection::Inward]
        );
    }

    #[test]
    fn direction_line_asserted_for_inward() {
        let mut seek = TrackSeekController::new(&DriveConfig::default());
        let mut drive = DriveState::default();
        let mut lines = TestLines::at(0);
        let mut clock = TestClock::default();

        seek.seek(&mut drive, &mut lines, &mut clock, 2).unwrap();
        assert_eq!(lines.outputs.get(&OutputLine::Direction), Some(&true));
        seek.seek(&mut drive, &mut lines, &mut clock, 1).unwrap();
        assert_eq!(lines.outputs.get(&OutputLine::Direction), Some(&false));
        assert_eq!(lines.outputs.get(&OutputLine::Step), Some(&false));
    }
}
