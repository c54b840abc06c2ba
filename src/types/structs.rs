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

    structs.rs

    Defines the sector records produced by the sector framer.
*/

use crate::{
    types::{DiskChsn, IntegrityField, SectorFlags},
    DriveError,
};

/// A structure that defines several flags that can apply to a sector being formatted.
/// Clearing a CRC flag causes the corresponding CRC to be recorded incorrectly.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SectorAttributes {
    pub address_crc_valid: bool,
    pub data_crc_valid: bool,
    pub deleted_mark: bool,
    pub no_dam: bool,
}

impl Default for SectorAttributes {
    fn default() -> Self {
        SectorAttributes {
            address_crc_valid: true,
            data_crc_valid: true,
            deleted_mark: false,
            no_dam: false,
        }
    }
}

/// A structure used to describe the parameters of a sector to be created on a formatted track.
#[derive(Clone, Debug, Default)]
pub struct SectorDescriptor {
    pub id_chsn: DiskChsn,
    /// The sector payload. Padded with zeros to the size specified by `id_chsn`.
    pub data: Vec<u8>,
    pub attributes: SectorAttributes,
}

impl SectorDescriptor {
    pub fn new(id_chsn: DiskChsn, data: Vec<u8>) -> Self {
        SectorDescriptor {
            id_chsn,
            data,
            attributes: SectorAttributes::default(),
        }
    }

    pub fn with_attributes(mut self, attributes: SectorAttributes) -> Self {
        self.attributes = attributes;
        self
    }
}

/// The contents of a sector ID field. A [SectorHeader] is only reported when its recorded CRC
/// matched the CRC computed over the address mark and the ID bytes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SectorHeader {
    pub chsn: DiskChsn,
    /// The CRC recorded after the ID field.
    pub crc: u16,
}

/// The contents of a sector data field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SectorData {
    /// The payload, exactly `128 << n` bytes long.
    pub bytes: Vec<u8>,
    /// The CRC recorded after the data field.
    pub crc: u16,
    pub flags: SectorFlags,
}

impl SectorData {
    #[inline]
    pub fn crc_valid(&self) -> bool {
        self.flags.contains(SectorFlags::DATA_CRC_VALID)
    }
    #[inline]
    pub fn deleted(&self) -> bool {
        self.flags.contains(SectorFlags::DELETED)
    }
}

/// A sector decoded from a track: a validated ID field and the data field that followed it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sector {
    pub header: SectorHeader,
    pub data: SectorData,
}

impl Sector {
    #[inline]
    pub fn chsn(&self) -> DiskChsn {
        self.header.chsn
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.data.bytes
    }

    /// Return the sector unchanged if its data CRC was valid, or a
    /// [DriveError::ChecksumMismatch] otherwise.
    pub fn check(self) -> Result<Sector, DriveError> {
        if self.data.crc_valid() {
            Ok(self)
        }
        else {
            Err(DriveError::ChecksumMismatch {
                chsn:  self.header.chsn,
                field: IntegrityField::Data,
            })
        }
    }
}
