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

    src/bitstream_codec/mfm.rs

    MFM encoding of byte data into raw bitcells, and decoding of raw bitcells back into bytes.

*/

use bit_vec::BitVec;

/// The number of raw bitcells occupied by one encoded byte.
pub const MFM_BYTE_LEN: usize = 16;
/// The number of raw bitcells occupied by a System 34 address mark.
pub const MFM_MARKER_LEN: usize = 64;

/// Encode `data` as MFM and append the resulting bitcells to `bits`.
/// The clock cell of the first bit depends on the last cell already in `bits`, or on `prev_bit`
/// if `bits` is empty.
pub fn encode_mfm_into(bits: &mut BitVec, data: &[u8], prev_bit: bool) {
    let mut previous_bit = bits.get(bits.len().wrapping_sub(1)).unwrap_or(prev_bit);

    for &byte in data {
        for i in 0..8 {
            if (byte & (0x80 >> i)) != 0 {
                // 1 is encoded as 01
                bits.push(false);
                bits.push(true);
                previous_bit = true;
            }
            else {
                // 0 is encoded as 10 if previous bit was 0, otherwise 00
                bits.push(!previous_bit);
                bits.push(false);
                previous_bit = false;
            }
        }
    }
}

/// Append a pre-encoded 64-bit marker to `bits`, most significant cell first.
pub fn encode_marker_into(bits: &mut BitVec, marker: u64) {
    for i in (0..MFM_MARKER_LEN).rev() {
        bits.push(marker & (1 << i) != 0);
    }
}

/// Extract the data byte from 16 raw bitcells, the first cell being the most significant.
/// Each data bit is the second cell of its clock/data pair.
#[inline]
pub fn decode_mfm_word(word: u16) -> u8 {
    let mut byte = 0;
    for i in 0..8 {
        byte = (byte << 1) | ((word >> (14 - i * 2)) & 1) as u8;
    }
    byte
}
