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

//! # fluxfox_drive
//!
//! A driver core for reading IBM PC compatible floppy disks through a raw read-data line
//! and the usual Shugart-style drive control lines.
//!
//! The hardware is reached through three capability traits defined in [hal]:
//! * [FluxSource] produces the time between flux transitions on the read-data line.
//! * [DriveLines] drives the select, motor, direction, step and side lines and reads the
//!   track 0, index and write protect sensors.
//! * [Clock] provides a monotonic time base and blocking delays.
//!
//! On top of these, [FloppyDrive] composes a [SpindleController] and a [TrackSeekController]
//! for the mechanical side, and an [MfmDecoder] feeding a [SectorFramer] for the data path.
//!
//! The [sim] module provides a [SimulatedDrive] implementing all three traits against a
//! virtual clock, useful for exercising the driver without hardware.

pub mod bitstream_codec;
pub mod block_device;
pub mod config;
pub mod drive;
pub mod flux;
pub mod hal;
pub mod sim;
pub mod track_schema;
pub mod types;
mod util;

use thiserror::Error;

/// The largest sector size a System 34 size code may specify.
pub const MAXIMUM_SECTOR_SIZE: usize = 8192;
pub const DEFAULT_SECTOR_SIZE: usize = 512;

/// The error type returned by all fallible drive operations.
///
/// [DriveError::DecodeNoise] and [DriveError::FramingFault] describe anomalies that are
/// recovered from locally while decoding a revolution. They are counted in [FluxStats] and
/// [FramerStats] and are never returned from the read path itself; [TrackRead::anomalies]
/// reports them after the fact.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DriveError {
    #[error("A flux transition fell outside all MFM timing windows")]
    DecodeNoise,
    #[error("An address mark was not found within the expected gap")]
    FramingFault,
    #[error("A CRC error was detected in the {field} field of sector {chsn}")]
    ChecksumMismatch { chsn: DiskChsn, field: IntegrityField },
    #[error("The requested sector {0} was not found within one revolution")]
    SectorNotFound(DiskChsnQuery),
    #[error("Track 0 was not detected after {0} step pulses")]
    CalibrationFault(u32),
    #[error("Spindle fault: {0}")]
    SpindleFault(String),
    #[error("Invalid parameter: {0}")]
    InvalidArgument(String),
}

pub use crate::{
    block_device::FloppyBlockDevice,
    config::{DriveConfig, PllConfig},
    drive::{
        seek::{SeekState, TrackSeekController},
        spindle::{IndexMonitor, SpindleController},
        DriveState,
        FloppyDrive,
        TrackRead,
    },
    flux::{
        flux_revolution::FluxRevolution,
        pll::{ClockRecovery, MfmDecoder},
        FluxStats,
        FluxTransition,
    },
    hal::{Clock, DriveLines, FluxSource, InputLine, OutputLine, StdClock},
    sim::SimulatedDrive,
    track_schema::system34::{FramerStats, SectorFramer, System34Marker, System34Schema},
    types::{
        DataRateProfile,
        DiskCh,
        DiskChs,
        DiskChsn,
        DiskChsnQuery,
        DiskDataRate,
        DiskDensity,
        DiskRpm,
        IntegrityField,
        Sector,
        SectorAttributes,
        SectorData,
        SectorDescriptor,
        SectorFlags,
        SectorHeader,
        SectorLayout,
        StepDirection,
    },
};

pub mod prelude {
    pub use crate::{
        config::DriveConfig,
        drive::FloppyDrive,
        hal::{Clock, DriveLines, FluxSource, InputLine, OutputLine},
        types::{DataRateProfile, DiskCh, DiskChs, DiskChsn, DiskChsnQuery, Sector},
        DriveError,
    };
}
