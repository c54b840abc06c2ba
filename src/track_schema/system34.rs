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

//! An implementation of the IBM System 34 track schema, used by IBM PCs and compatibles.
//!
//! [SectorFramer] locates address marks in a raw MFM bitcell stream and yields each sector whose
//! ID field validates. [System34Schema] performs the inverse operation, laying out a track from
//! a list of sectors and encoding it to bitcells.

use std::fmt::{self, Display, Formatter};

use crate::{
    bitstream_codec::mfm::{decode_mfm_word, encode_marker_into, encode_mfm_into, MFM_BYTE_LEN},
    types::{DiskChsn, Sector, SectorData, SectorDescriptor, SectorFlags, SectorHeader},
    util::crc_ibm_3740,
    DriveError,
};
use bit_vec::BitVec;

pub const DEFAULT_TRACK_SIZE_BYTES: usize = 6250;

pub const GAP_BYTE: u8 = 0x4E;
pub const SYNC_BYTE: u8 = 0;

pub const IBM_GAP3_DEFAULT: usize = 84;
pub const IBM_GAP4A: usize = 80;
pub const IBM_GAP1: usize = 50;
pub const IBM_GAP2: usize = 22;
pub const SYNC_LEN: usize = 12;

/// The number of bytes following an ID field within which a data address mark must appear.
pub const DAM_SEARCH_LIMIT: usize = 64;

// Pre-encoded markers for IAM, IDAM, DAM and DDAM.
pub const IAM_MARKER: u64 = 0x5224_5224_5224_5552;
pub const IDAM_MARKER: u64 = 0x4489_4489_4489_5554;
pub const DAM_MARKER: u64 = 0x4489_4489_4489_5545;
pub const DDAM_MARKER: u64 = 0x4489_4489_4489_554A;

pub const IAM_MARKER_BYTES: [u8; 4] = [0xC2, 0xC2, 0xC2, 0xFC];
pub const IDAM_MARKER_BYTES: [u8; 4] = [0xA1, 0xA1, 0xA1, 0xFE];
pub const DAM_MARKER_BYTES: [u8; 4] = [0xA1, 0xA1, 0xA1, 0xFB];
pub const DDAM_MARKER_BYTES: [u8; 4] = [0xA1, 0xA1, 0xA1, 0xF8];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum System34Marker {
    Iam,
    Idam,
    Dam,
    Ddam,
}

impl From<System34Marker> for u64 {
    fn from(marker: System34Marker) -> u64 {
        match marker {
            System34Marker::Iam => IAM_MARKER,
            System34Marker::Idam => IDAM_MARKER,
            System34Marker::Dam => DAM_MARKER,
            System34Marker::Ddam => DDAM_MARKER,
        }
    }
}

impl Display for System34Marker {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            System34Marker::Iam => write!(f, "IAM"),
            System34Marker::Idam => write!(f, "IDAM"),
            System34Marker::Dam => write!(f, "DAM"),
            System34Marker::Ddam => write!(f, "DDAM"),
        }
    }
}

impl System34Marker {
    /// Identify a marker from the contents of a 64-bit shift register.
    #[inline]
    pub fn from_raw(shift_reg: u64) -> Option<System34Marker> {
        match shift_reg {
            IAM_MARKER => Some(System34Marker::Iam),
            IDAM_MARKER => Some(System34Marker::Idam),
            DAM_MARKER => Some(System34Marker::Dam),
            DDAM_MARKER => Some(System34Marker::Ddam),
            _ => None,
        }
    }

    /// The decoded bytes of the marker, over which CRCs are computed.
    pub fn bytes(&self) -> [u8; 4] {
        match self {
            System34Marker::Iam => IAM_MARKER_BYTES,
            System34Marker::Idam => IDAM_MARKER_BYTES,
            System34Marker::Dam => DAM_MARKER_BYTES,
            System34Marker::Ddam => DDAM_MARKER_BYTES,
        }
    }
}

/// The result of laying out a track. `markers` holds the byte offset of each address mark
/// within `track_bytes`.
#[derive(Clone, Debug, Default)]
pub struct System34FormatResult {
    pub track_bytes: Vec<u8>,
    pub markers: Vec<(System34Marker, usize)>,
}

pub struct System34Schema;

impl System34Schema {
    /// Lay out an IBM format track holding `sectors`, as decoded bytes.
    ///
    /// The track is filled with gap bytes up to the number of bytes `bitcell_ct` cells can hold,
    /// or truncated if the sectors do not fit.
    pub fn format_track_as_bytes(
        bitcell_ct: usize,
        sectors: &[SectorDescriptor],
        gap3: usize,
    ) -> Result<System34FormatResult, DriveError> {
        let track_byte_ct = bitcell_ct.div_ceil(MFM_BYTE_LEN);
        log::trace!(
            "System34Schema::format_track_as_bytes(): Formatting track with {} bitcells, {} bytes",
            bitcell_ct,
            track_byte_ct
        );
        let mut track_bytes: Vec<u8> = Vec::with_capacity(track_byte_ct);
        let mut markers = Vec::new();

        // Write out GAP4A, sync, IAM marker, and GAP1.
        track_bytes.extend_from_slice(&[GAP_BYTE; IBM_GAP4A]);
        track_bytes.extend_from_slice(&[SYNC_BYTE; SYNC_LEN]);
        markers.push((System34Marker::Iam, track_bytes.len()));
        track_bytes.extend_from_slice(&IAM_MARKER_BYTES);
        track_bytes.extend_from_slice(&[GAP_BYTE; IBM_GAP1]);

        for sector in sectors {
            let chsn = sector.id_chsn;
            let attributes = sector.attributes;
            if sector.data.len() > chsn.n_size() {
                log::error!(
                    "System34Schema::format_track_as_bytes(): Sector {} data of {} bytes exceeds sector size",
                    chsn,
                    sector.data.len()
                );
                return Err(DriveError::InvalidArgument(format!(
                    "Sector data of {} bytes does not fit sector {}",
                    sector.data.len(),
                    chsn
                )));
            }

            track_bytes.extend_from_slice(&[SYNC_BYTE; SYNC_LEN]);
            markers.push((System34Marker::Idam, track_bytes.len()));
            let idam_crc_offset = track_bytes.len();
            track_bytes.extend_from_slice(&IDAM_MARKER_BYTES);
            track_bytes.extend_from_slice(&chsn.to_id_bytes());

            let mut crc16 = crc_ibm_3740(&track_bytes[idam_crc_offset..], None);
            if !attributes.address_crc_valid {
                crc16 ^= 0xFFFF;
            }
            track_bytes.extend_from_slice(&crc16.to_be_bytes());

            track_bytes.extend_from_slice(&[GAP_BYTE; IBM_GAP2]);

            if !attributes.no_dam {
                track_bytes.extend_from_slice(&[SYNC_BYTE; SYNC_LEN]);

                let marker = if attributes.deleted_mark {
                    System34Marker::Ddam
                }
                else {
                    System34Marker::Dam
                };
                markers.push((marker, track_bytes.len()));
                let dam_crc_offset = track_bytes.len();
                track_bytes.extend_from_slice(&marker.bytes());

                track_bytes.extend_from_slice(&sector.data);
                track_bytes.resize(track_bytes.len() + chsn.n_size() - sector.data.len(), 0);

                let mut crc16 = crc_ibm_3740(&track_bytes[dam_crc_offset..], None);
                if !attributes.data_crc_valid {
                    crc16 ^= 0xFFFF;
                }
                track_bytes.extend_from_slice(&crc16.to_be_bytes());
            }

            track_bytes.extend_from_slice(&vec![GAP_BYTE; gap3]);
        }

        // Fill rest of track with GAP4B.
        if track_bytes.len() < track_byte_ct {
            track_bytes.resize(track_byte_ct, GAP_BYTE);
        }

        if track_bytes.len() > track_byte_ct {
            log::warn!(
                "System34Schema::format_track_as_bytes(): Format operation passed index. Truncating track to {} bytes",
                track_byte_ct
            );
            track_bytes.truncate(track_byte_ct);
            markers.retain(|(_, offset)| offset + 4 <= track_byte_ct);
        }

        log::trace!(
            "System34Schema::format_track_as_bytes(): Wrote {} markers to track of {} bytes",
            markers.len(),
            track_bytes.len()
        );

        Ok(System34FormatResult { track_bytes, markers })
    }

    /// Encode a laid out track as MFM bitcells, writing each address mark with its missing
    /// clock bits. The result is exactly `bitcell_ct` cells long.
    pub fn encode_track(bitcell_ct: usize, format: &System34FormatResult) -> BitVec {
        let mut bits = BitVec::with_capacity(format.track_bytes.len() * MFM_BYTE_LEN);
        let mut markers = format.markers.iter().peekable();
        let mut offset = 0;

        while offset < format.track_bytes.len() {
            match markers.peek() {
                Some((marker, marker_offset)) if *marker_offset == offset => {
                    encode_marker_into(&mut bits, u64::from(*marker));
                    offset += 4;
                    markers.next();
                }
                Some((_, marker_offset)) => {
                    let end = (*marker_offset).min(format.track_bytes.len());
                    encode_mfm_into(&mut bits, &format.track_bytes[offset..end], false);
                    offset = end;
                }
                None => {
                    encode_mfm_into(&mut bits, &format.track_bytes[offset..], false);
                    offset = format.track_bytes.len();
                }
            }
        }

        bits.truncate(bitcell_ct);
        bits
    }

    /// Lay out and encode a track holding `sectors` in one step.
    pub fn format_track(bitcell_ct: usize, sectors: &[SectorDescriptor], gap3: usize) -> Result<BitVec, DriveError> {
        let format = Self::format_track_as_bytes(bitcell_ct, sectors, gap3)?;
        Ok(Self::encode_track(bitcell_ct, &format))
    }
}

/// Counters describing the result of framing one stream of bitcells.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FramerStats {
    /// Sectors yielded, including those with bad data CRCs.
    pub sectors: u32,
    pub header_crc_errors: u32,
    pub data_crc_errors: u32,
    /// ID fields with no data mark following them, or fields cut short by the end of the stream.
    pub framing_faults: u32,
    pub index_marks: u32,
}

impl Display for FramerStats {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "Sectors: {} Header CRC errors: {} Data CRC errors: {} Framing faults: {} Index marks: {}",
            self.sectors, self.header_crc_errors, self.data_crc_errors, self.framing_faults, self.index_marks
        )
    }
}

enum DataMarkSearch {
    Found(System34Marker),
    FoundIdam,
    NotFound,
    Exhausted,
}

/// An iterator adapter converting a raw MFM bitcell stream into [Sector]s.
///
/// Every ID field with a valid CRC that is followed by a data field is reported, in the order
/// encountered. A sector whose data CRC fails is still yielded with
/// [SectorFlags::DATA_CRC_VALID] cleared.
pub struct SectorFramer<I> {
    bits: I,
    shift_reg: u64,
    idam_pending: bool,
    exhausted: bool,
    stats: FramerStats,
}

impl<I> SectorFramer<I>
where
    I: Iterator<Item = bool>,
{
    pub fn new(bits: I) -> Self {
        SectorFramer {
            bits,
            shift_reg: 0,
            idam_pending: false,
            exhausted: false,
            stats: FramerStats::default(),
        }
    }

    pub fn stats(&self) -> &FramerStats {
        &self.stats
    }

    /// Return a reference to the underlying bitcell source.
    pub fn bits(&self) -> &I {
        &self.bits
    }

    pub fn into_inner(self) -> I {
        self.bits
    }

    #[inline]
    fn shift(&mut self) -> Option<u64> {
        let bit = self.bits.next()?;
        self.shift_reg = (self.shift_reg << 1) | bit as u64;
        Some(self.shift_reg)
    }

    /// Consume bitcells until an IDAM has been shifted in. Index marks seen along the way are
    /// counted.
    fn seek_idam(&mut self) -> Option<()> {
        loop {
            match System34Marker::from_raw(self.shift()?) {
                Some(System34Marker::Idam) => return Some(()),
                Some(System34Marker::Iam) => {
                    log::trace!("SectorFramer::seek_idam(): Found IAM");
                    self.stats.index_marks += 1;
                }
                _ => {}
            }
        }
    }

    fn seek_data_mark(&mut self) -> DataMarkSearch {
        for _ in 0..DAM_SEARCH_LIMIT * MFM_BYTE_LEN {
            let Some(shift_reg) = self.shift()
            else {
                return DataMarkSearch::Exhausted;
            };
            match System34Marker::from_raw(shift_reg) {
                Some(marker @ (System34Marker::Dam | System34Marker::Ddam)) => return DataMarkSearch::Found(marker),
                Some(System34Marker::Idam) => return DataMarkSearch::FoundIdam,
                _ => {}
            }
        }
        DataMarkSearch::NotFound
    }

    /// Read `buf.len()` bytes following a marker. Returns `None` if the stream ends first.
    fn read_bytes(&mut self, buf: &mut [u8]) -> Option<()> {
        for byte in buf.iter_mut() {
            let mut word = 0u16;
            for _ in 0..MFM_BYTE_LEN {
                word = (word << 1) | self.bits.next()? as u16;
            }
            *byte = decode_mfm_word(word);
        }
        // Fields are read outside the shift register, so a following marker must be shifted
        // in from scratch.
        self.shift_reg = 0;
        Some(())
    }

    fn truncated(&mut self, field: &str) -> Option<Sector> {
        log::warn!("SectorFramer::next(): Stream ended within {} field", field);
        self.stats.framing_faults += 1;
        self.exhausted = true;
        None
    }
}

impl<I> Iterator for SectorFramer<I>
where
    I: Iterator<Item = bool>,
{
    type Item = Sector;

    fn next(&mut self) -> Option<Sector> {
        if self.exhausted {
            return None;
        }

        loop {
            if !self.idam_pending && self.seek_idam().is_none() {
                self.exhausted = true;
                log::trace!("SectorFramer::next(): End of stream. {}", self.stats);
                return None;
            }
            self.idam_pending = false;

            let mut id_field = [0u8; 6];
            if self.read_bytes(&mut id_field).is_none() {
                return self.truncated("ID");
            }

            let chsn = DiskChsn::from_id_bytes([id_field[0], id_field[1], id_field[2], id_field[3]]);
            let header_recorded_crc = u16::from_be_bytes([id_field[4], id_field[5]]);
            let header_crc = crc_ibm_3740(&id_field[0..4], Some(crc_ibm_3740(&IDAM_MARKER_BYTES, None)));

            if header_crc != header_recorded_crc {
                log::warn!(
                    "SectorFramer::next(): Header CRC error for sector {}: recorded {:04X} calculated {:04X}",
                    chsn,
                    header_recorded_crc,
                    header_crc
                );
                self.stats.header_crc_errors += 1;
                continue;
            }

            let marker = match self.seek_data_mark() {
                DataMarkSearch::Found(marker) => marker,
                DataMarkSearch::FoundIdam => {
                    log::warn!("SectorFramer::next(): IDAM found before data mark for sector {}", chsn);
                    self.stats.framing_faults += 1;
                    self.idam_pending = true;
                    continue;
                }
                DataMarkSearch::NotFound => {
                    log::warn!(
                        "SectorFramer::next(): No data mark within {} bytes of sector {}",
                        DAM_SEARCH_LIMIT,
                        chsn
                    );
                    self.stats.framing_faults += 1;
                    continue;
                }
                DataMarkSearch::Exhausted => return self.truncated("gap"),
            };

            let mut data_field = vec![0u8; chsn.n_size() + 2];
            if self.read_bytes(&mut data_field).is_none() {
                return self.truncated("data");
            }
            let crc_bytes = data_field.split_off(chsn.n_size());
            let recorded_crc = u16::from_be_bytes([crc_bytes[0], crc_bytes[1]]);
            let data_crc = crc_ibm_3740(&data_field, Some(crc_ibm_3740(&marker.bytes(), None)));

            let mut flags = SectorFlags::empty();
            if data_crc == recorded_crc {
                flags |= SectorFlags::DATA_CRC_VALID;
            }
            else {
                log::warn!(
                    "SectorFramer::next(): Data CRC error for sector {}: recorded {:04X} calculated {:04X}",
                    chsn,
                    recorded_crc,
                    data_crc
                );
                self.stats.data_crc_errors += 1;
            }
            if marker == System34Marker::Ddam {
                flags |= SectorFlags::DELETED;
            }

            log::trace!("SectorFramer::next(): Found sector {} ({})", chsn, marker);
            self.stats.sectors += 1;
            return Some(Sector {
                header: SectorHeader {
                    chsn,
                    crc: header_recorded_crc,
                },
                data:   SectorData {
                    bytes: data_field,
                    crc: recorded_crc,
                    flags,
                },
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bitstream_codec::mfm::MFM_MARKER_LEN, types::SectorAttributes, MAXIMUM_SECTOR_SIZE};

    fn three_sectors() -> Vec<SectorDescriptor> {
        (1..=3)
            .map(|s| SectorDescriptor::new(DiskChsn::new(1, 0, s, 2), vec![s * 0x11; 512]))
            .collect()
    }

    fn frame(bits: &BitVec) -> (Vec<Sector>, FramerStats) {
        let mut framer = SectorFramer::new(bits.iter());
        let sectors: Vec<Sector> = framer.by_ref().collect();
        (sectors, *framer.stats())
    }

    #[test]
    fn marker_encoding_matches_bytes() {
        for marker in [
            System34Marker::Iam,
            System34Marker::Idam,
            System34Marker::Dam,
            System34Marker::Ddam,
        ] {
            let raw = u64::from(marker);
            let bytes = marker.bytes();
            for (i, byte) in bytes.iter().enumerate() {
                assert_eq!(decode_mfm_word((raw >> (48 - i * 16)) as u16), *byte, "{}", marker);
            }
            assert_eq!(System34Marker::from_raw(raw), Some(marker));
        }
    }

    #[test]
    fn format_layout() {
        let format = System34Schema::format_track_as_bytes(100_000, &three_sectors(), IBM_GAP3_DEFAULT).unwrap();
        assert_eq!(format.track_bytes.len(), DEFAULT_TRACK_SIZE_BYTES);
        assert_eq!(format.markers.len(), 7);
        assert_eq!(format.markers[0], (System34Marker::Iam, IBM_GAP4A + SYNC_LEN));
        let (marker, idam) = format.markers[1];
        assert_eq!(marker, System34Marker::Idam);
        assert_eq!(&format.track_bytes[idam..idam + 8], &[0xA1, 0xA1, 0xA1, 0xFE, 1, 0, 1, 2]);
    }

    #[test]
    fn frame_formatted_track() {
        let bits = System34Schema::format_track(100_000, &three_sectors(), IBM_GAP3_DEFAULT).unwrap();
        assert_eq!(bits.len(), 100_000);

        let (sectors, stats) = frame(&bits);
        assert_eq!(sectors.len(), 3);
        for (i, sector) in sectors.iter().enumerate() {
            let s = i as u8 + 1;
            assert_eq!(sector.chsn(), DiskChsn::new(1, 0, s, 2));
            assert!(sector.data.crc_valid());
            assert!(!sector.data.deleted());
            assert_eq!(sector.bytes(), &vec![s * 0x11; 512][..]);
        }
        assert_eq!(stats.sectors, 3);
        assert_eq!(stats.index_marks, 1);
        assert_eq!(stats.header_crc_errors, 0);
        assert_eq!(stats.framing_faults, 0);
    }

    #[test]
    fn bad_crcs_and_deleted_data() {
        let mut sectors = three_sectors();
        sectors[0].attributes = SectorAttributes {
            address_crc_valid: false,
            ..Default::default()
        };
        sectors[1].attributes = SectorAttributes {
            data_crc_valid: false,
            ..Default::default()
        };
        sectors[2].attributes = SectorAttributes {
            deleted_mark: true,
            ..Default::default()
        };
        let bits = System34Schema::format_track(100_000, &sectors, IBM_GAP3_DEFAULT).unwrap();
        let (found, stats) = frame(&bits);

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].chsn().s(), 2);
        assert!(!found[0].data.crc_valid());
        assert!(found[0].clone().check().is_err());
        assert_eq!(found[1].chsn().s(), 3);
        assert!(found[1].data.deleted());
        assert!(found[1].data.crc_valid());
        assert_eq!(stats.header_crc_errors, 1);
        assert_eq!(stats.data_crc_errors, 1);
    }

    #[test]
    fn missing_data_mark_is_framing_fault() {
        let mut sectors = three_sectors();
        sectors[1].attributes = SectorAttributes {
            no_dam: true,
            ..Default::default()
        };
        let bits = System34Schema::format_track(100_000, &sectors, IBM_GAP3_DEFAULT).unwrap();
        let (found, stats) = frame(&bits);

        assert_eq!(found.iter().map(|s| s.chsn().s()).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(stats.framing_faults, 1);
    }

    #[test]
    fn intervening_idam_is_processed() {
        let mut sectors = three_sectors();
        sectors[0].attributes = SectorAttributes {
            no_dam: true,
            ..Default::default()
        };
        // With no gap 3 the next IDAM lands within the data mark search window.
        let bits = System34Schema::format_track(100_000, &sectors, 0).unwrap();
        let (found, stats) = frame(&bits);

        assert_eq!(found.iter().map(|s| s.chsn().s()).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(stats.framing_faults, 1);
    }

    #[test]
    fn truncated_stream_ends_iteration() {
        let sectors = vec![SectorDescriptor::new(DiskChsn::new(0, 0, 1, 2), vec![0xE5; 512])];
        let mut bits = System34Schema::format_track(100_000, &sectors, IBM_GAP3_DEFAULT).unwrap();
        let format = System34Schema::format_track_as_bytes(100_000, &sectors, IBM_GAP3_DEFAULT).unwrap();
        let (_, dam_offset) = format.markers[2];
        // Cut the stream halfway through the sector data.
        bits.truncate(dam_offset * MFM_BYTE_LEN + MFM_MARKER_LEN + 256 * MFM_BYTE_LEN);

        let (found, stats) = frame(&bits);
        assert!(found.is_empty());
        assert_eq!(stats.framing_faults, 1);
    }

    #[test]
    fn duplicate_ids_are_all_reported() {
        let mut sectors = three_sectors();
        sectors.push(SectorDescriptor::new(DiskChsn::new(1, 0, 2, 2), vec![0xAA; 512]));
        let bits = System34Schema::format_track(100_000, &sectors, IBM_GAP3_DEFAULT).unwrap();
        let (found, _) = frame(&bits);
        assert_eq!(found.iter().filter(|s| s.chsn().s() == 2).count(), 2);
    }

    #[test]
    fn large_size_codes_read_maximum_sector() {
        let sectors = vec![
            SectorDescriptor::new(DiskChsn::new(0, 0, 1, 0xFF), vec![0x5A; 100]),
            SectorDescriptor::new(DiskChsn::new(0, 0, 2, 0x40), vec![0xA5; 100]),
        ];
        let bits = System34Schema::format_track(400_000, &sectors, IBM_GAP3_DEFAULT).unwrap();
        let (found, stats) = frame(&bits);

        assert_eq!(found.len(), 2);
        for (sector, (n, fill)) in found.iter().zip([(0xFF, 0x5A), (0x40, 0xA5)]) {
            assert_eq!(sector.chsn().n(), n);
            assert_eq!(sector.bytes().len(), MAXIMUM_SECTOR_SIZE);
            assert!(sector.data.crc_valid());
            assert!(sector.bytes()[..100].iter().all(|&b| b == fill));
            assert!(sector.bytes()[100..].iter().all(|&b| b == 0));
        }
        assert_eq!(stats.data_crc_errors, 0);
        assert_eq!(stats.framing_faults, 0);
    }

    #[test]
    fn oversized_data_is_rejected() {
        let sectors = vec![SectorDescriptor::new(DiskChsn::new(0, 0, 1, 0), vec![0; 512])];
        assert!(matches!(
            System34Schema::format_track_as_bytes(100_000, &sectors, IBM_GAP3_DEFAULT),
            Err(DriveError::InvalidArgument(_))
        ));
    }
}
