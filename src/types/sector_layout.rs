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

    src/types/sector_layout.rs

    Defines the SectorLayout used to map logical block addresses onto a disk.
*/

use crate::types::{DiskCh, DiskChs, DiskChsn};
use std::fmt::Display;

/// A structure representing how sectors are laid out on a disk (assuming standard format)
///  - Cylinder count (c)
///  - Head count (h)
///  - Sector count per track (s)
///
/// Plus a sector ID offset (s_off) to represent whether a standard sector id starts at 0 or 1,
/// and the size of each sector in bytes.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SectorLayout {
    pub(crate) c: u16,
    pub(crate) h: u8,
    pub(crate) s: u8,
    pub(crate) s_off: u8,
    pub(crate) size: usize,
}

impl Display for SectorLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[c:{:2} h:{} s:{:2} s_off:{} size:{}]",
            self.c, self.h, self.s, self.s_off, self.size
        )
    }
}

impl SectorLayout {
    /// Create a new `SectorLayout` structure from cylinder, head and sector counts, sector id
    /// offset and sector size.
    pub fn new(c: u16, h: u8, s: u8, s_off: u8, size: usize) -> Self {
        Self { c, h, s, s_off, size }
    }
    /// Return the cylinder count (c) field.
    #[inline]
    pub fn c(&self) -> u16 {
        self.c
    }
    /// Return the head count (h) field.
    #[inline]
    pub fn h(&self) -> u8 {
        self.h
    }
    /// Return the sector count (s) field.
    #[inline]
    pub fn s(&self) -> u8 {
        self.s
    }
    /// Return the sector id offset (s_off) field.
    #[inline]
    pub fn s_off(&self) -> u8 {
        self.s_off
    }
    #[inline]
    /// Return the size of a sector in bytes.
    pub fn size(&self) -> usize {
        self.size
    }
    /// Return the equivalent 'n' size parameter for the sector size.
    pub fn n(&self) -> u8 {
        DiskChsn::bytes_to_n(self.size)
    }
    /// Return a [DiskCh] structure representing the cylinder and head count components of a [SectorLayout].
    #[inline]
    pub fn ch(&self) -> DiskCh {
        DiskCh::new(self.c, self.h)
    }
    /// Return the number of sectors represented by a [SectorLayout].
    pub fn total_sectors(&self) -> usize {
        (self.c as usize) * (self.h as usize) * (self.s as usize)
    }
    /// Return a boolean indicating whether this [SectorLayout] contains the specified [DiskChs]
    /// representing a sector id.
    pub fn contains(&self, chs: impl Into<DiskChs>) -> bool {
        let chs = chs.into();
        chs.s >= self.s_off && self.c > chs.c && self.h > chs.h && self.s > (chs.s - self.s_off)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_total_sectors() {
        let layout = SectorLayout::new(80, 2, 18, 1, 512);
        assert_eq!(layout.total_sectors(), 2880);
        assert_eq!(layout.n(), 2);
    }

    #[test]
    fn layout_contains_respects_sector_offset() {
        let layout = SectorLayout::new(80, 2, 9, 1, 512);
        assert!(layout.contains(DiskChs::new(0, 0, 1)));
        assert!(layout.contains(DiskChs::new(79, 1, 9)));
        assert!(!layout.contains(DiskChs::new(0, 0, 0)));
        assert!(!layout.contains(DiskChs::new(0, 0, 10)));
        assert!(!layout.contains(DiskChs::new(80, 0, 1)));
    }
}
