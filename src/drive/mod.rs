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

    src/drive/mod.rs

    The FloppyDrive facade composing the spindle and seek controllers with the decode path.
*/

//! A [FloppyDrive] owns the hardware capabilities and the [DriveState], lending the state to
//! the [SpindleController] and [TrackSeekController] as operations require.
//!
//! Reads are performed a revolution at a time: the flux intervals between two index pulses
//! are captured into a [FluxRevolution], decoded by an [MfmDecoder](crate::MfmDecoder) and
//! framed by a [SectorFramer].

pub mod seek;
pub mod spindle;

use crate::{
    config::DriveConfig,
    flux::{
        flux_revolution::{FluxRevolution, FluxRevolutionStats},
        pll::ClockRecovery,
        FluxStats,
    },
    format_ms,
    hal::{Clock, DriveLines, FluxSource, InputLine, OutputLine},
    track_schema::system34::{FramerStats, SectorFramer},
    types::{DiskCh, DiskChsnQuery, DiskRpm, Sector},
    DriveError,
};
use seek::{SeekState, TrackSeekController};
use spindle::{IndexMonitor, SpindleController};
use strum::IntoEnumIterator;

/// The believed state of the drive mechanism.
///
/// The cylinder is `None` until the track 0 sensor has been observed during calibration, and
/// becomes `None` again whenever the position is lost.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DriveState {
    pub selected: bool,
    pub motor_on: bool,
    pub cylinder: Option<u16>,
    pub head: u8,
}

/// Everything decoded from one revolution of a track.
#[derive(Clone, Debug, Default)]
pub struct TrackRead {
    pub ch: DiskCh,
    /// Every sector found, in the order encountered.
    pub sectors: Vec<Sector>,
    pub flux_stats: FluxStats,
    pub framer_stats: FramerStats,
    pub revolution: FluxRevolutionStats,
}

impl TrackRead {
    /// Return the first sector matching `query`.
    pub fn find(&self, query: impl Into<DiskChsnQuery>) -> Option<&Sector> {
        let query = query.into();
        self.sectors.iter().find(|sector| query.matches(&sector.chsn()))
    }

    /// Return the kinds of anomaly recovered from while decoding this track.
    /// [DriveError::DecodeNoise] is reported when any flux interval was discarded, and
    /// [DriveError::FramingFault] when any ID field lacked its data field.
    pub fn anomalies(&self) -> Vec<DriveError> {
        let mut anomalies = Vec::new();
        if self.flux_stats.noise > 0 {
            anomalies.push(DriveError::DecodeNoise);
        }
        if self.framer_stats.framing_faults > 0 {
            anomalies.push(DriveError::FramingFault);
        }
        anomalies
    }
}

/// A floppy drive reached through a [DriveLines] implementation, with flux intervals from a
/// [FluxSource] and timing from a [Clock].
pub struct FloppyDrive<L, F, C> {
    config: DriveConfig,
    lines: L,
    flux: F,
    clock: C,
    state: DriveState,
    seek: TrackSeekController,
    spindle: SpindleController,
}

impl<L, F, C> FloppyDrive<L, F, C>
where
    L: DriveLines,
    F: FluxSource,
    C: Clock,
{
    /// Create a new [FloppyDrive]. All output lines are deasserted. The head position is
    /// unknown until the first seek.
    pub fn new(config: DriveConfig, mut lines: L, flux: F, clock: C) -> Result<Self, DriveError> {
        config.validate()?;

        for line in OutputLine::iter() {
            lines.write(line, false);
        }

        log::debug!(
            "FloppyDrive::new(): Created drive with profile {}, {} cylinders",
            config.profile,
            config.max_cylinders
        );
        Ok(FloppyDrive {
            seek: TrackSeekController::new(&config),
            spindle: SpindleController::new(&config),
            config,
            lines,
            flux,
            clock,
            state: DriveState::default(),
        })
    }

    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    pub fn state(&self) -> DriveState {
        self.state
    }

    pub fn seek_state(&self) -> SeekState {
        self.seek.state()
    }

    /// Return the total number of step pulses issued.
    pub fn pulses(&self) -> u64 {
        self.seek.pulses()
    }

    pub fn index_monitor(&self) -> &IndexMonitor {
        self.spindle.monitor()
    }

    /// Release the drive, returning the hardware capabilities.
    pub fn into_inner(self) -> (L, F, C) {
        (self.lines, self.flux, self.clock)
    }

    pub fn selected(&self) -> bool {
        self.state.selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.spindle.set_selected(&mut self.state, &mut self.lines, selected);
    }

    pub fn spin(&self) -> bool {
        self.state.motor_on
    }

    pub fn set_spin(&mut self, spin: bool) -> Result<(), DriveError> {
        self.spindle
            .set_spin(&mut self.state, &mut self.lines, &mut self.clock, spin)
    }

    pub fn side(&self) -> u8 {
        self.state.head
    }

    /// Select the head to read from. Only heads 0 and 1 exist.
    pub fn set_side(&mut self, head: u8) -> Result<(), DriveError> {
        if head > 1 {
            log::error!("FloppyDrive::set_side(): Invalid head: {}", head);
            return Err(DriveError::InvalidArgument(format!("Invalid head: {}", head)));
        }
        self.lines.write(OutputLine::Side, head == 1);
        self.state.head = head;
        Ok(())
    }

    /// Return the cylinder the head last settled on, or `None` if the position is unknown.
    pub fn track(&self) -> Option<u16> {
        self.state.cylinder
    }

    /// Move the head to `cylinder`, selecting the drive first if needed.
    pub fn set_track(&mut self, cylinder: i32) -> Result<(), DriveError> {
        if !self.state.selected {
            self.set_selected(true);
        }
        self.seek
            .seek(&mut self.state, &mut self.lines, &mut self.clock, cylinder)
            .map(|_| ())
    }

    /// Step outward to track 0 regardless of the believed position.
    pub fn recalibrate(&mut self) -> Result<(), DriveError> {
        if !self.state.selected {
            self.set_selected(true);
        }
        self.seek
            .calibrate(&mut self.state, &mut self.lines, &mut self.clock)
            .map(|_| ())
    }

    pub fn write_protected(&mut self) -> bool {
        self.lines.read(InputLine::WriteProtect)
    }

    pub fn at_track0(&mut self) -> bool {
        self.lines.read(InputLine::Track0)
    }

    pub fn measure_rpm(&mut self) -> Result<DiskRpm, DriveError> {
        self.spindle.measure_rpm(&mut self.lines, &mut self.clock)
    }

    /// Capture the flux intervals of one full revolution of the current track, from one index
    /// pulse to the next.
    pub fn capture_revolution(&mut self) -> Result<FluxRevolution, DriveError> {
        let ch = DiskCh::new(self.state.cylinder.unwrap_or_default(), self.state.head);
        let timeout = self.spindle.index_timeout();
        let timeout_secs = timeout.as_secs_f64();

        let start = self.spindle.wait_for_index(&mut self.lines, &mut self.clock)?;
        let mut revolution = FluxRevolution::with_capacity(ch, self.config.profile.bitcells_per_revolution() / 2);
        let mut flux_time = 0.0;

        loop {
            let Some(delta) = self.flux.next_interval(timeout)
            else {
                log::error!(
                    "FloppyDrive::capture_revolution(): No flux transition within {}",
                    format_ms!(timeout_secs)
                );
                return Err(DriveError::SpindleFault(format!(
                    "no flux transition on track {} within {}ms",
                    ch,
                    timeout.as_millis()
                )));
            };
            revolution.push(delta);
            flux_time += delta;

            if self.spindle.poll_index(&mut self.lines, &self.clock) {
                break;
            }
            if flux_time > timeout_secs {
                log::error!(
                    "FloppyDrive::capture_revolution(): No index pulse after {} of flux",
                    format_ms!(flux_time)
                );
                return Err(DriveError::SpindleFault(format!(
                    "no index pulse after {} flux transitions",
                    revolution.ft_ct()
                )));
            }
        }

        let end = self.spindle.monitor().last_edge.unwrap_or(start);
        revolution.index_time = (end - start).as_secs_f64();
        log::debug!(
            "FloppyDrive::capture_revolution(): Captured {} transitions on track {} in {}",
            revolution.ft_ct(),
            ch,
            format_ms!(revolution.index_time)
        );
        Ok(revolution)
    }

    /// Read the sector with the given cylinder, head and sector id, as recorded in its ID
    /// field. The first matching sector in one revolution is returned, even if its data CRC
    /// failed; use [Sector::check] to reject those.
    pub fn read_sector(&mut self, cylinder: u16, head: u8, sector: u8) -> Result<Sector, DriveError> {
        let query = DiskChsnQuery::new(cylinder, head, sector, None::<u8>);
        let revolution = self.prepare_and_capture(cylinder, head)?;

        let mut framer = SectorFramer::new(revolution.decoder(self.clock_recovery()));
        let found = framer.by_ref().find(|s| query.matches(&s.chsn()));

        log::debug!(
            "FloppyDrive::read_sector(): {}. {}",
            framer.bits().stats(),
            framer.stats()
        );
        found.ok_or_else(|| {
            log::error!("FloppyDrive::read_sector(): Sector {} not found", query);
            DriveError::SectorNotFound(query)
        })
    }

    /// Read every sector from one revolution of the given track.
    pub fn read_track(&mut self, cylinder: u16, head: u8) -> Result<TrackRead, DriveError> {
        let revolution = self.prepare_and_capture(cylinder, head)?;

        let mut framer = SectorFramer::new(revolution.decoder(self.clock_recovery()));
        let sectors: Vec<Sector> = framer.by_ref().collect();
        let framer_stats = *framer.stats();
        let flux_stats = framer.into_inner().stats().clone();

        log::debug!(
            "FloppyDrive::read_track(): Read {} sectors from track {}. {}",
            sectors.len(),
            revolution.ch,
            framer_stats
        );
        let track = TrackRead {
            ch: revolution.ch,
            sectors,
            flux_stats,
            framer_stats,
            revolution: revolution.stats(),
        };
        for anomaly in track.anomalies() {
            log::debug!("FloppyDrive::read_track(): Track {}: {}", track.ch, anomaly);
        }
        Ok(track)
    }

    fn clock_recovery(&self) -> ClockRecovery {
        ClockRecovery::from_config(self.config.profile.bitcell_period(), &self.config.pll)
    }

    /// Select, position and spin the drive, then capture a revolution. The address is
    /// checked before any line is driven.
    fn prepare_and_capture(&mut self, cylinder: u16, head: u8) -> Result<FluxRevolution, DriveError> {
        if cylinder >= self.config.max_cylinders || head > 1 {
            log::error!(
                "FloppyDrive::prepare_and_capture(): Track {} out of range, {} cylinders",
                DiskCh::new(cylinder, head),
                self.config.max_cylinders
            );
            return Err(DriveError::InvalidArgument(format!(
                "Track {} out of range 0-{} cylinders, 0-1 heads",
                DiskCh::new(cylinder, head),
                self.config.max_cylinders - 1
            )));
        }
        self.set_selected(true);
        self.set_side(head)?;
        self.set_spin(true)?;
        self.set_track(cylinder as i32)?;
        self.capture_revolution()
    }
}
