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

    src/drive/spindle.rs

    Drive selection, spindle motor control and index pulse supervision.
*/

use crate::{
    config::DriveConfig,
    drive::DriveState,
    format_ms,
    hal::{Clock, DriveLines, InputLine, OutputLine},
    types::DiskRpm,
    DriveError,
};
use std::time::Duration;

/// The interval at which the index line is sampled while waiting for an index pulse.
pub const INDEX_POLL_INTERVAL: Duration = Duration::from_micros(50);

/// Edge detection state for the index line.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexMonitor {
    /// The number of rising edges observed.
    pub edges: u64,
    /// The time of the most recent rising edge.
    pub last_edge: Option<Duration>,
    level: bool,
}

pub struct SpindleController {
    spin_up: Duration,
    verify_index: bool,
    index_timeout: Duration,
    monitor: IndexMonitor,
}

impl SpindleController {
    pub fn new(config: &DriveConfig) -> Self {
        SpindleController {
            spin_up: config.spin_up,
            verify_index: config.verify_index_on_spin_up,
            index_timeout: config.index_timeout(),
            monitor: IndexMonitor::default(),
        }
    }

    pub fn monitor(&self) -> &IndexMonitor {
        &self.monitor
    }

    pub fn index_timeout(&self) -> Duration {
        self.index_timeout
    }

    /// Drive the select line. Deselecting releases the motor and forgets the head position,
    /// as the drive may be swapped or moved while not selected.
    pub fn set_selected<L>(&mut self, drive: &mut DriveState, lines: &mut L, selected: bool)
    where
        L: DriveLines + ?Sized,
    {
        if selected == drive.selected {
            return;
        }
        lines.write(OutputLine::Select, selected);
        if selected {
            drive.selected = true;
        }
        else {
            lines.write(OutputLine::Motor, false);
            *drive = DriveState::default();
            self.monitor.level = false;
        }
        log::debug!("SpindleController::set_selected(): Drive selected: {}", selected);
    }

    /// Start or stop the spindle motor. Starting blocks for the spin-up delay and, if configured,
    /// until the first index pulse.
    pub fn set_spin<L, C>(&mut self, drive: &mut DriveState, lines: &mut L, clock: &mut C, spin: bool) -> Result<(), DriveError>
    where
        L: DriveLines + ?Sized,
        C: Clock + ?Sized,
    {
        if spin == drive.motor_on {
            return Ok(());
        }

        if !spin {
            lines.write(OutputLine::Motor, false);
            drive.motor_on = false;
            log::debug!("SpindleController::set_spin(): Motor off");
            return Ok(());
        }

        lines.write(OutputLine::Motor, true);
        drive.motor_on = true;
        clock.delay(self.spin_up);
        log::debug!(
            "SpindleController::set_spin(): Motor on, waited {} for spin-up",
            format_ms!(self.spin_up.as_secs_f64())
        );

        if self.verify_index {
            if let Err(e) = self.wait_for_index(lines, clock) {
                lines.write(OutputLine::Motor, false);
                drive.motor_on = false;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Sample the index line, returning `true` on a rising edge.
    pub fn poll_index<L, C>(&mut self, lines: &mut L, clock: &C) -> bool
    where
        L: DriveLines + ?Sized,
        C: Clock + ?Sized,
    {
        let level = lines.read(InputLine::Index);
        let edge = level && !self.monitor.level;
        self.monitor.level = level;
        if edge {
            self.monitor.edges += 1;
            self.monitor.last_edge = Some(clock.now());
        }
        edge
    }

    /// Poll the index line until a rising edge is seen, returning the time of the edge.
    /// Fails with [DriveError::SpindleFault] if no edge arrives within the index timeout.
    pub fn wait_for_index<L, C>(&mut self, lines: &mut L, clock: &mut C) -> Result<Duration, DriveError>
    where
        L: DriveLines + ?Sized,
        C: Clock + ?Sized,
    {
        let start = clock.now();
        loop {
            if self.poll_index(lines, clock) {
                return Ok(clock.now());
            }
            if clock.now() - start >= self.index_timeout {
                log::error!(
                    "SpindleController::wait_for_index(): No index pulse within {}",
                    format_ms!(self.index_timeout.as_secs_f64())
                );
                return Err(DriveError::SpindleFault(format!(
                    "no index pulse within {}ms",
                    self.index_timeout.as_millis()
                )));
            }
            clock.delay(INDEX_POLL_INTERVAL);
        }
    }

    /// Measure the rotation rate from the time between two consecutive index pulses.
    pub fn measure_rpm<L, C>(&mut self, lines: &mut L, clock: &mut C) -> Result<DiskRpm, DriveError>
    where
        L: DriveLines + ?Sized,
        C: Clock + ?Sized,
    {
        let first = self.wait_for_index(lines, clock)?;
        let second = self.wait_for_index(lines, clock)?;
        let index_time = (second - first).as_secs_f64();
        log::debug!(
            "SpindleController::measure_rpm(): Index time: {}",
            format_ms!(index_time)
        );
        DiskRpm::try_from_index_time(index_time).ok_or_else(|| {
            DriveError::SpindleFault(format!("implausible index time of {}", format_ms!(index_time)))
        })
    }
}
