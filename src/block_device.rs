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

    src/block_device.rs

    Logical block access to a floppy disk, one track read at a time.
*/

//! A [FloppyBlockDevice] presents a disk in a [FloppyDrive] as an array of fixed size blocks,
//! as a filesystem driver expects. Blocks are mapped to sectors through a [SectorLayout], and
//! each read brings in a whole track which is kept until a block on another track is requested.

use crate::{
    drive::FloppyDrive,
    hal::{Clock, DriveLines, FluxSource},
    types::{DiskCh, DiskChs, DiskChsnQuery, IntegrityField, Sector, SectorLayout},
    DriveError,
};

/// The number of times a track is re-read when a requested sector is missing or damaged.
pub const DEFAULT_RETRIES: u32 = 3;
/// Disks are assumed double sided when their geometry is detected.
pub const DEFAULT_HEADS: u8 = 2;

struct TrackCache {
    ch: DiskCh,
    sectors: Vec<Sector>,
}

impl TrackCache {
    /// Find the sector with the given id, preferring a copy with a valid data CRC.
    fn find(&self, query: &DiskChsnQuery) -> Option<&Sector> {
        let mut matches = self.sectors.iter().filter(|s| query.matches(&s.chsn()));
        let first = matches.clone().next();
        matches.find(|s| s.data.crc_valid()).or(first)
    }
}

pub struct FloppyBlockDevice<L, F, C> {
    drive: FloppyDrive<L, F, C>,
    layout: SectorLayout,
    retries: u32,
    cache: Option<TrackCache>,
}

impl<L, F, C> FloppyBlockDevice<L, F, C>
where
    L: DriveLines,
    F: FluxSource,
    C: Clock,
{
    /// Create a block device over `drive` with a known sector layout.
    pub fn new(drive: FloppyDrive<L, F, C>, layout: SectorLayout) -> Self {
        FloppyBlockDevice {
            drive,
            layout,
            retries: DEFAULT_RETRIES,
            cache: None,
        }
    }

    /// Create a block device, determining the sector layout by reading cylinder 0 head 0.
    /// The sectors per track and sector size are taken from the sector ids found there. The disk
    /// is assumed double sided, with the cylinder count of the drive configuration.
    pub fn autodetect(mut drive: FloppyDrive<L, F, C>) -> Result<Self, DriveError> {
        let track = drive.read_track(0, 0)?;

        let ids = track.sectors.iter().map(|s| s.chsn());
        let (Some(first), Some(last)) = (ids.clone().map(|c| c.s()).min(), ids.clone().map(|c| c.s()).max())
        else {
            log::error!("FloppyBlockDevice::autodetect(): No sectors found on track 0");
            return Err(DriveError::SectorNotFound(DiskChsnQuery::new(0, 0, 1, None::<u8>)));
        };
        let size = track
            .sectors
            .iter()
            .find(|s| s.chsn().s() == first)
            .map(|s| s.chsn().n_size())
            .unwrap_or(crate::DEFAULT_SECTOR_SIZE);

        let layout = SectorLayout::new(
            drive.config().max_cylinders,
            DEFAULT_HEADS,
            last - first + 1,
            first,
            size,
        );
        log::debug!("FloppyBlockDevice::autodetect(): Detected layout {}", layout);

        let mut device = FloppyBlockDevice::new(drive, layout);
        device.cache = Some(TrackCache {
            ch: track.ch,
            sectors: track.sectors,
        });
        Ok(device)
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn layout(&self) -> &SectorLayout {
        &self.layout
    }

    /// Return the number of blocks on the device.
    pub fn count(&self) -> usize {
        self.layout.total_sectors()
    }

    /// Return the size of a block in bytes.
    pub fn block_size(&self) -> usize {
        self.layout.size()
    }

    pub fn drive(&self) -> &FloppyDrive<L, F, C> {
        &self.drive
    }

    pub fn drive_mut(&mut self) -> &mut FloppyDrive<L, F, C> {
        &mut self.drive
    }

    pub fn into_inner(self) -> FloppyDrive<L, F, C> {
        self.drive
    }

    /// Discard the cached track, for example after the disk was changed.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Read block `lba` into `buf`, which must be exactly one block long.
    pub fn read_block(&mut self, lba: usize, buf: &mut [u8]) -> Result<(), DriveError> {
        if buf.len() != self.layout.size() {
            return Err(DriveError::InvalidArgument(format!(
                "Buffer of {} bytes does not match block size {}",
                buf.len(),
                self.layout.size()
            )));
        }
        let chs = DiskChs::from_lba(lba, &self.layout).ok_or_else(|| {
            DriveError::InvalidArgument(format!("Block {} beyond end of device ({} blocks)", lba, self.count()))
        })?;
        let query = DiskChsnQuery::from(chs);

        let mut result = Err(DriveError::SectorNotFound(query));
        for attempt in 0..=self.retries {
            let cached = matches!(&self.cache, Some(cache) if cache.ch == chs.ch());
            if !cached || attempt > 0 {
                if attempt > 0 {
                    log::warn!(
                        "FloppyBlockDevice::read_block(): Retrying track {} for sector {} ({}/{})",
                        chs.ch(),
                        chs,
                        attempt,
                        self.retries
                    );
                }
                let track = self.drive.read_track(chs.c(), chs.h())?;
                self.cache = Some(TrackCache {
                    ch: chs.ch(),
                    sectors: track.sectors,
                });
            }

            let Some(cache) = &self.cache
            else {
                continue;
            };
            result = match cache.find(&query) {
                Some(sector) if sector.data.crc_valid() => {
                    if sector.bytes().len() != buf.len() {
                        return Err(DriveError::InvalidArgument(format!(
                            "Sector {} holds {} bytes, expected {}",
                            sector.chsn(),
                            sector.bytes().len(),
                            buf.len()
                        )));
                    }
                    buf.copy_from_slice(sector.bytes());
                    return Ok(());
                }
                Some(sector) => Err(DriveError::ChecksumMismatch {
                    chsn:  sector.chsn(),
                    field: IntegrityField::Data,
                }),
                None => Err(DriveError::SectorNotFound(query)),
            };
        }

        if let Err(e) = &result {
            log::error!("FloppyBlockDevice::read_block(): Block {} failed: {}", lba, e);
        }
        result
    }
}
