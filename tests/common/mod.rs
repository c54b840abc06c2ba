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

    tests/common/mod.rs

    Common support routines for tests
*/
#![allow(dead_code)]

use fluxfox_drive::{
    prelude::*,
    sim::{SimClock, SimFlux, SimLines},
    SectorDescriptor,
    SimulatedDrive,
};
use std::time::Duration;

pub type SimFloppy = FloppyDrive<SimLines, SimFlux, SimClock>;

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The payload written to each test sector: the sector id repeated, xored with the byte offset.
pub fn sector_payload(chs: DiskChs, size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i as u8) ^ chs.s() ^ (chs.c() as u8).wrapping_mul(3) ^ (chs.h() << 7))
        .collect()
}

/// Describe a standard track with sectors 1 through `spt`.
pub fn standard_track(c: u16, h: u8, spt: u8) -> Vec<SectorDescriptor> {
    (1..=spt)
        .map(|s| {
            SectorDescriptor::new(
                DiskChsn::new(c, h, s, 2),
                sector_payload(DiskChs::new(c, h, s), 512),
            )
        })
        .collect()
}

/// A double density simulated drive with a three sector track at cylinder 1 head 0.
pub fn three_sector_drive() -> SimulatedDrive {
    let sim = SimulatedDrive::new(DataRateProfile::DoubleDensity, 80);
    sim.insert_formatted_track(DiskCh::new(1, 0), &standard_track(1, 0, 3))
        .unwrap();
    sim
}

/// A simulated drive holding a fully formatted disk of `cylinders` x 2 x `spt` sectors.
pub fn formatted_drive(profile: DataRateProfile, cylinders: u16, spt: u8) -> SimulatedDrive {
    let sim = SimulatedDrive::new(profile, 80);
    for c in 0..cylinders {
        for h in 0..2 {
            sim.insert_formatted_track(DiskCh::new(c, h), &standard_track(c, h, spt))
                .unwrap();
        }
    }
    sim
}

/// The default configuration with a shorter spin-up delay, to keep virtual timelines short.
pub fn test_config() -> DriveConfig {
    DriveConfig::default().with_spin_up(Duration::from_millis(600))
}
