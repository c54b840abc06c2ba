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

    tests/block_device.rs

    Logical block access over the simulated drive.
*/
mod common;

use common::*;
use fluxfox_drive::{prelude::*, FloppyBlockDevice, IntegrityField, SectorAttributes, SectorLayout, SimulatedDrive};

/// A double density disk with cylinders 0 and 1 formatted, 9 sectors per track. Sector 9 is
/// missing from cylinder 0 head 1, and sector 2 of cylinder 1 head 0 has a bad data CRC.
fn test_disk() -> SimulatedDrive {
    let sim = SimulatedDrive::new(DataRateProfile::DoubleDensity, 80);
    sim.insert_formatted_track(DiskCh::new(0, 0), &standard_track(0, 0, 9))
        .unwrap();
    sim.insert_formatted_track(DiskCh::new(0, 1), &standard_track(0, 1, 8))
        .unwrap();

    let mut damaged = standard_track(1, 0, 9);
    damaged[1] = damaged[1].clone().with_attributes(SectorAttributes {
        data_crc_valid: false,
        ..Default::default()
    });
    sim.insert_formatted_track(DiskCh::new(1, 0), &damaged).unwrap();
    sim.insert_formatted_track(DiskCh::new(1, 1), &standard_track(1, 1, 9))
        .unwrap();
    sim
}

#[test]
fn test_block_device_autodetect() {
    init();
    let sim = test_disk();
    let device = FloppyBlockDevice::autodetect(sim.drive(test_config()).unwrap()).unwrap();

    assert_eq!(*device.layout(), SectorLayout::new(80, 2, 9, 1, 512));
    assert_eq!(device.count(), 1440);
    assert_eq!(device.block_size(), 512);
}

#[test]
fn test_block_device_autodetect_blank() {
    init();
    let sim = SimulatedDrive::new(DataRateProfile::DoubleDensity, 80);
    // A track of gap bytes with no sectors on it.
    sim.insert_formatted_track(DiskCh::new(0, 0), &[]).unwrap();

    let result = FloppyBlockDevice::autodetect(sim.drive(test_config()).unwrap());
    assert!(matches!(result, Err(DriveError::SectorNotFound(_))));
}

#[test]
fn test_block_device_read() {
    init();
    let sim = test_disk();
    let mut device = FloppyBlockDevice::autodetect(sim.drive(test_config()).unwrap()).unwrap();
    let mut buf = vec![0u8; 512];

    for (lba, chs) in [
        (0, DiskChs::new(0, 0, 1)),
        (8, DiskChs::new(0, 0, 9)),
        (9, DiskChs::new(0, 1, 1)),
        (27, DiskChs::new(1, 1, 1)),
        (20, DiskChs::new(1, 0, 3)),
    ] {
        device.read_block(lba, &mut buf).unwrap();
        assert_eq!(buf, sector_payload(chs, 512), "lba {}", lba);
    }
}

#[test]
fn test_block_device_track_cache() {
    init();
    let sim = test_disk();
    let mut device = FloppyBlockDevice::autodetect(sim.drive(test_config()).unwrap()).unwrap();
    let mut buf = vec![0u8; 512];

    // The track read during detection is served from the cache.
    let now = sim.now();
    device.read_block(4, &mut buf).unwrap();
    device.read_block(1, &mut buf).unwrap();
    assert_eq!(sim.now(), now);
    assert_eq!(buf, sector_payload(DiskChs::new(0, 0, 2), 512));

    device.invalidate();
    device.read_block(1, &mut buf).unwrap();
    assert!(sim.now() > now);
    assert_eq!(buf, sector_payload(DiskChs::new(0, 0, 2), 512));
}

#[test]
fn test_block_device_bad_crc() {
    init();
    let sim = test_disk();
    let mut device = FloppyBlockDevice::autodetect(sim.drive(test_config()).unwrap())
        .unwrap()
        .with_retries(2);
    let mut buf = vec![0u8; 512];

    assert_eq!(
        device.read_block(19, &mut buf),
        Err(DriveError::ChecksumMismatch {
            chsn:  DiskChsn::new(1, 0, 2, 2),
            field: IntegrityField::Data,
        })
    );
    // Neighbouring sectors on the same track are readable.
    device.read_block(20, &mut buf).unwrap();
    assert_eq!(buf, sector_payload(DiskChs::new(1, 0, 3), 512));
}

#[test]
fn test_block_device_missing_sector() {
    init();
    let sim = test_disk();
    let mut device = FloppyBlockDevice::autodetect(sim.drive(test_config()).unwrap())
        .unwrap()
        .with_retries(1);
    let mut buf = vec![0u8; 512];

    assert!(matches!(device.read_block(17, &mut buf), Err(DriveError::SectorNotFound(_))));
}

#[test]
fn test_block_device_invalid_requests() {
    init();
    let sim = test_disk();
    let mut device = FloppyBlockDevice::new(sim.drive(test_config()).unwrap(), SectorLayout::new(80, 2, 9, 1, 512));

    let mut small = vec![0u8; 256];
    assert!(matches!(device.read_block(0, &mut small), Err(DriveError::InvalidArgument(_))));

    let mut buf = vec![0u8; 512];
    assert!(matches!(device.read_block(1440, &mut buf), Err(DriveError::InvalidArgument(_))));
    // Nothing touched the drive.
    assert_eq!(device.drive().pulses(), 0);
    assert!(!device.drive().selected());
}
