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

//! The `chs` module defines several structures for working with Cylinder-Head-Sector (CHS)
//! addressing and the sector IDs read from System 34 ID fields.

use crate::{types::SectorLayout, MAXIMUM_SECTOR_SIZE};
use std::fmt::Display;

/// The size code of the largest sector, 128 << 6 bytes.
const MAXIMUM_SECTOR_N: u8 = 6;

/// A structure representing a query against the four components of a sector ID:
///  - Cylinder ID (c)
///  - Head ID (h)
///  - Sector ID (s)
///  - Sector Size (n)
///
/// The only required field in a `DiskChsnQuery` is the Sector ID field.
/// Any other field may be set to None to indicate that it should be ignored when matching.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Default)]
pub struct DiskChsnQuery {
    c: Option<u16>,
    h: Option<u8>,
    s: u8,
    n: Option<u8>,
}

impl Display for DiskChsnQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c_str = self.c.as_ref().map_or("*".to_string(), |c| c.to_string());
        let h_str = self.h.as_ref().map_or("*".to_string(), |h| h.to_string());
        let n_str = self.n.as_ref().map_or("*".to_string(), |n| n.to_string());
        write!(f, "[c:{:2} h:{} s:{:3} n:{}]", c_str, h_str, self.s, n_str)
    }
}

impl DiskChsnQuery {
    /// Create a new DiskChsnQuery structure from the four sector ID components.
    pub fn new(c: impl Into<Option<u16>>, h: impl Into<Option<u8>>, s: u8, n: impl Into<Option<u8>>) -> Self {
        Self {
            c: c.into(),
            h: h.into(),
            s,
            n: n.into(),
        }
    }
    /// Return the cylinder (c) field.
    pub fn c(&self) -> Option<u16> {
        self.c
    }
    /// Return the head (h) field.
    pub fn h(&self) -> Option<u8> {
        self.h
    }
    /// Return the sector id (s) field.
    pub fn s(&self) -> u8 {
        self.s
    }
    /// Return the size (n) field.
    pub fn n(&self) -> Option<u8> {
        self.n
    }
    /// Return a boolean indicating whether the specified `DiskChsn` matches the query.
    pub fn matches(&self, id_chsn: &DiskChsn) -> bool {
        if self.s != id_chsn.s() {
            return false;
        }
        if let Some(c) = self.c {
            if c != id_chsn.c() {
                return false;
            }
        }
        if let Some(h) = self.h {
            if h != id_chsn.h() {
                return false;
            }
        }
        if let Some(n) = self.n {
            if n != id_chsn.n() {
                return false;
            }
        }
        true
    }
}

impl From<DiskChsn> for DiskChsnQuery {
    fn from(chsn: DiskChsn) -> Self {
        Self {
            c: Some(chsn.c()),
            h: Some(chsn.h()),
            s: chsn.s(),
            n: Some(chsn.n()),
        }
    }
}

impl From<DiskChs> for DiskChsnQuery {
    fn from(chs: DiskChs) -> Self {
        Self {
            c: Some(chs.c()),
            h: Some(chs.h()),
            s: chs.s(),
            n: None,
        }
    }
}

/// A structure representing the four components of a sector ID:
///  - Cylinder (c)
///  - Head (h)
///  - Sector ID (s)
///  - Sector Size (n)
///
/// These are the four bytes following an IDAM on a System 34 track.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiskChsn {
    chs: DiskChs,
    n:   u8,
}

impl Default for DiskChsn {
    fn default() -> Self {
        Self {
            chs: DiskChs::default(),
            n:   2,
        }
    }
}

impl From<(u16, u8, u8, u8)> for DiskChsn {
    fn from((c, h, s, n): (u16, u8, u8, u8)) -> Self {
        Self {
            chs: DiskChs::from((c, h, s)),
            n,
        }
    }
}

impl From<(DiskChs, u8)> for DiskChsn {
    fn from((chs, n): (DiskChs, u8)) -> Self {
        Self { chs, n }
    }
}

impl Display for DiskChsn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[c:{:2} h:{} s:{:3} n:{}]", self.c(), self.h(), self.s(), self.n)
    }
}

impl DiskChsn {
    /// Create a new DiskChsn structure from the four sector ID components.
    pub fn new(c: u16, h: u8, s: u8, n: u8) -> Self {
        Self {
            chs: DiskChs::from((c, h, s)),
            n,
        }
    }

    /// Build a `DiskChsn` from the four raw ID field bytes, in on-disk order.
    pub fn from_id_bytes(bytes: [u8; 4]) -> Self {
        Self::new(bytes[0] as u16, bytes[1], bytes[2], bytes[3])
    }

    /// Return the four raw ID field bytes, in on-disk order. The cylinder is truncated to a byte
    /// as the ID field only has room for eight bits.
    pub fn to_id_bytes(&self) -> [u8; 4] {
        [self.c() as u8, self.h(), self.s(), self.n]
    }

    /// Return the cylinder (c) field.
    #[inline]
    pub fn c(&self) -> u16 {
        self.chs.c()
    }
    /// Return the head (h) field.
    #[inline]
    pub fn h(&self) -> u8 {
        self.chs.h()
    }
    /// Return the sector id (s) field.
    #[inline]
    pub fn s(&self) -> u8 {
        self.chs.s()
    }
    /// Return a `DiskCh` structure representing the cylinder and head components of a DiskChsn.
    #[inline]
    pub fn ch(&self) -> DiskCh {
        self.chs.ch()
    }
    /// Return the size (n) field.
    #[inline]
    pub fn n(&self) -> u8 {
        self.n
    }
    /// Return the size of the 'n' parameter in bytes.
    /// The formula for calculating size from n is (128 * 2^n)
    /// We enforce a maximum size of 8192 bytes for a single sector.
    #[inline]
    pub fn n_size(&self) -> usize {
        Self::n_to_bytes(self.n)
    }

    /// Convert the value of the sector size field (n) into bytes.
    #[inline]
    pub fn n_to_bytes(n: u8) -> usize {
        if n >= MAXIMUM_SECTOR_N {
            MAXIMUM_SECTOR_SIZE
        }
        else {
            128 << n
        }
    }

    /// Convert a size in bytes into a valid sector size field value (n)
    #[inline]
    pub fn bytes_to_n(size: usize) -> u8 {
        let mut n = 0;
        let mut size = size;
        while size > 128 {
            size >>= 1;
            n += 1;
        }
        n
    }
}

/// A structure representing three of the four components of Sector ID:
///  - Cylinder (c)
///  - Head (h)
///  - Sector ID (s)
///
/// A DiskChs may represent a Sector ID, where size is ignored, or an overall disk geometry.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiskChs {
    pub(crate) c: u16,
    pub(crate) h: u8,
    pub(crate) s: u8,
}

impl Default for DiskChs {
    fn default() -> Self {
        Self { c: 0, h: 0, s: 1 }
    }
}

impl From<DiskChsn> for DiskChs {
    fn from(chsn: DiskChsn) -> Self {
        chsn.chs
    }
}

impl From<(u16, u8, u8)> for DiskChs {
    fn from((c, h, s): (u16, u8, u8)) -> Self {
        Self { c, h, s }
    }
}

impl From<(DiskCh, u8)> for DiskChs {
    fn from((ch, s): (DiskCh, u8)) -> Self {
        Self {
            c: ch.c(),
            h: ch.h(),
            s,
        }
    }
}

impl Display for DiskChs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[c:{:2} h:{} s:{:3}]", self.c, self.h, self.s)
    }
}

impl DiskChs {
    /// Create a new `DiskChs` structure from cylinder, head and sector id components.
    pub fn new(c: u16, h: u8, s: u8) -> Self {
        Self { c, h, s }
    }
    /// Return the cylinder (c) field.
    #[inline]
    pub fn c(&self) -> u16 {
        self.c
    }
    /// Return the head (h) field.
    #[inline]
    pub fn h(&self) -> u8 {
        self.h
    }
    /// Return the sector id (s) field.
    #[inline]
    pub fn s(&self) -> u8 {
        self.s
    }
    /// Return a `DiskCh` structure representing the cylinder and head components of a DiskChs.
    #[inline]
    pub fn ch(&self) -> DiskCh {
        DiskCh::new(self.c, self.h)
    }

    /// Convert an LBA sector address into a [DiskChs] struct.
    /// A reference drive geometry is required to calculate the address.
    /// Only valid for standard disk formats.
    /// # Arguments:
    /// * `lba` - The LBA sector address to convert.
    /// * `geom` - A [SectorLayout], representing the number of heads and cylinders on the disk.
    /// # Returns:
    /// * `Some(DiskChs)` representing the resulting CHS address.
    /// * `None` if the LBA address is invalid for the specified geometry.
    pub fn from_lba(lba: usize, geom: &SectorLayout) -> Option<DiskChs> {
        let hpc = geom.h() as usize;
        let spt = geom.s() as usize;
        if hpc == 0 || spt == 0 {
            return None;
        }
        let c = lba / (hpc * spt);
        let h = (lba / spt) % hpc;
        let s = (lba % spt) + geom.s_off() as usize;

        if c >= geom.c() as usize {
            return None;
        }
        Some(DiskChs::from((c as u16, h as u8, s as u8)))
    }
}

/// A structure representing two of the four components of Sector ID:
///  - Cylinder (c)
///  - Head (h)
///
/// A `DiskCh` is usually used as a physical track specifier.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiskCh {
    pub(crate) c: u16,
    pub(crate) h: u8,
}

impl From<(u16, u8)> for DiskCh {
    fn from((c, h): (u16, u8)) -> Self {
        Self { c, h }
    }
}

impl From<DiskChs> for DiskCh {
    fn from(chs: DiskChs) -> Self {
        Self { c: chs.c, h: chs.h }
    }
}

impl From<DiskChsn> for DiskCh {
    fn from(chsn: DiskChsn) -> Self {
        Self {
            c: chsn.c(),
            h: chsn.h(),
        }
    }
}

impl Display for DiskCh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[c:{} h:{}]", self.c, self.h)
    }
}

impl DiskCh {
    /// Create a new DiskCh structure from a Cylinder (c) and Head (h) specifier.
    pub fn new(c: u16, h: u8) -> Self {
        Self { c, h }
    }
    /// Return the cylinder (c) field.
    pub fn c(&self) -> u16 {
        self.c
    }
    /// Return the head (h) field.
    pub fn h(&self) -> u8 {
        self.h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diskchsn_new_creates_correct_instance() {
        let chsn = DiskChsn::new(1, 2, 3, 4);
        assert_eq!(chsn.c(), 1);
        assert_eq!(chsn.h(), 2);
        assert_eq!(chsn.s(), 3);
        assert_eq!(chsn.n(), 4);
    }

    #[test]
    fn diskchsn_n_size_calculates_correct_size() {
        let chsn = DiskChsn::new(0, 0, 0, 3);
        assert_eq!(chsn.n_size(), 1024);
    }

    #[test]
    fn diskchsn_n_size_enforces_maximum_size() {
        let chsn = DiskChsn::new(0, 0, 0, 7);
        assert_eq!(chsn.n_size(), 8192);
        let chsn = DiskChsn::new(0, 0, 0, 0xFF);
        assert_eq!(chsn.n_size(), 8192);
        for n in [6, 7, 57, 63, 64, 0x80, 0xFF] {
            assert_eq!(DiskChsn::n_to_bytes(n), 8192, "n = {}", n);
        }
    }

    #[test]
    fn diskchsn_size_to_n_calculates_correct_n() {
        assert_eq!(DiskChsn::bytes_to_n(1024), 3);
        assert_eq!(DiskChsn::bytes_to_n(512), 2);
    }

    #[test]
    fn diskchsn_id_bytes_are_in_disk_order() {
        let chsn = DiskChsn::from_id_bytes([39, 1, 9, 2]);
        assert_eq!(chsn, DiskChsn::new(39, 1, 9, 2));
        assert_eq!(chsn.to_id_bytes(), [39, 1, 9, 2]);
    }

    #[test]
    fn query_ignores_unset_fields() {
        let query = DiskChsnQuery::new(None::<u16>, 0, 3, None::<u8>);
        assert!(query.matches(&DiskChsn::new(17, 0, 3, 2)));
        assert!(!query.matches(&DiskChsn::new(17, 1, 3, 2)));
        assert!(!query.matches(&DiskChsn::new(17, 0, 4, 2)));
    }

    #[test]
    fn diskchs_from_lba_calculates_correct_chs() {
        let geom = SectorLayout::new(40, 2, 9, 1, 512);
        let lba = 49;
        let chs = DiskChs::from_lba(lba, &geom).unwrap();
        assert_eq!(chs, DiskChs::new(2, 1, 5));
    }

    #[test]
    fn diskchs_from_lba_returns_none_for_out_of_range() {
        let geom = SectorLayout::new(40, 2, 9, 1, 512);
        let lba = 720; // Out of range LBA for the given geometry
        let chs = DiskChs::from_lba(lba, &geom);
        assert!(chs.is_none());
    }
}
