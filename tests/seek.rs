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

    tests/seek.rs

    Head positioning against the simulated mechanism.
*/
mod common;

use common::*;
use fluxfox_drive::{prelude::*, SeekState, SimulatedDrive, StepDirection};
use std::time::Duration;

fn steps(inward: usize, outward: usize) -> Vec<StepDirection> {
    let mut log = vec![StepDirection::Outward; outward];
    log.extend(std::iter::repeat(StepDirection::Inward).take(inward));
    log
}

#[test]
fn test_seek_calibrates_from_unknown_position() {
    init();
    let sim = SimulatedDrive::new(DataRateProfile::DoubleDensity, 80);
    sim.set_head_position(3);
    let mut drive = sim.drive(DriveConfig::default()).unwrap();

    assert_eq!(drive.track(), None);
    drive.set_track(5).unwrap();

    assert!(drive.selected());
    assert_eq!(drive.track(), Some(5));
    assert_eq!(drive.seek_state(), SeekState::Settled);
    assert_eq!(sim.cylinder(), 5);
    assert_eq!(sim.step_log(), steps(5, 3));
    assert_eq!(drive.pulses(), 8);
    // Every pulse is followed by the settle delay.
    assert!(sim.now() >= Duration::from_millis(8 * 3));
}

#[test]
fn test_seek_is_idempotent() {
    init();
    let sim = SimulatedDrive::new(DataRateProfile::DoubleDensity, 80);
    let mut drive = sim.drive(DriveConfig::default()).unwrap();

    drive.set_track(12).unwrap();
    let pulses = drive.pulses();
    let now = sim.now();

    drive.set_track(12).unwrap();
    assert_eq!(drive.pulses(), pulses);
    assert_eq!(sim.now(), now);
    assert_eq!(sim.cylinder(), 12);

    drive.set_track(10).unwrap();
    assert_eq!(drive.pulses(), pulses + 2);
    assert_eq!(sim.cylinder(), 10);
}

#[test]
fn test_seek_out_of_range() {
    init();
    let sim = SimulatedDrive::new(DataRateProfile::DoubleDensity, 80);
    let mut drive = sim.drive(DriveConfig::default()).unwrap();

    assert!(matches!(drive.set_track(-1), Err(DriveError::InvalidArgument(_))));
    assert!(matches!(drive.set_track(80), Err(DriveError::InvalidArgument(_))));
    assert_eq!(drive.pulses(), 0);
    assert!(sim.step_log().is_empty());

    let mut drive = sim.drive(DriveConfig::default().with_max_cylinders(40)).unwrap();
    assert!(matches!(drive.set_track(40), Err(DriveError::InvalidArgument(_))));
    drive.set_track(39).unwrap();
    assert_eq!(sim.cylinder(), 39);
}

#[test]
fn test_seek_track0_sensor_failure() {
    init();
    let sim = SimulatedDrive::new(DataRateProfile::DoubleDensity, 80);
    sim.set_track0_broken(true);
    let mut drive = sim.drive(DriveConfig::default().with_max_calibration_steps(100)).unwrap();

    assert_eq!(drive.set_track(3), Err(DriveError::CalibrationFault(100)));
    assert_eq!(drive.track(), None);
    assert_eq!(drive.pulses(), 100);
    assert_eq!(sim.step_log(), steps(0, 100));
    assert_eq!(drive.seek_state(), SeekState::Idle);
}

#[test]
fn test_seek_recovers_from_lost_position() {
    init();
    let sim = SimulatedDrive::new(DataRateProfile::DoubleDensity, 80);
    let mut drive = sim.drive(DriveConfig::default()).unwrap();

    drive.set_track(5).unwrap();
    sim.clear_step_log();

    // The head is knocked back to track 0 behind the driver's back.
    sim.set_head_position(0);
    drive.set_track(7).unwrap();

    assert_eq!(drive.track(), Some(7));
    assert_eq!(sim.cylinder(), 7);
    assert_eq!(sim.step_log(), steps(7, 0));
}

#[test]
fn test_recalibrate() {
    init();
    let sim = SimulatedDrive::new(DataRateProfile::DoubleDensity, 80);
    let mut drive = sim.drive(DriveConfig::default()).unwrap();

    drive.set_track(20).unwrap();
    sim.clear_step_log();

    drive.recalibrate().unwrap();
    assert_eq!(drive.track(), Some(0));
    assert!(drive.at_track0());
    assert_eq!(sim.step_log(), steps(0, 20));
}

#[test]
fn test_deselect_forgets_position() {
    init();
    let sim = SimulatedDrive::new(DataRateProfile::DoubleDensity, 80);
    let mut drive = sim.drive(DriveConfig::default()).unwrap();

    drive.set_track(4).unwrap();
    drive.set_selected(false);
    assert!(!sim.selected());
    assert_eq!(drive.track(), None);

    sim.clear_step_log();
    drive.set_track(6).unwrap();
    // The position is re-established from track 0.
    assert_eq!(sim.step_log(), steps(6, 4));
}
