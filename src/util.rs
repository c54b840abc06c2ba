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

    src/util.rs

    Shared helpers for CRC calculation.
*/

pub(crate) const CRC_IBM_3740_POLY: u16 = 0x1021;
pub(crate) const CRC_IBM_3740_INIT: u16 = 0xFFFF;

/// Calculate a CRC-16/IBM-3740 over `buf`, as recorded after System 34 ID and data fields.
/// Poly 0x1021, no reflection, no final xor.
/// A running CRC may be supplied as `start` to continue a calculation over several buffers,
/// otherwise the calculation starts from 0xFFFF.
pub(crate) fn crc_ibm_3740(buf: &[u8], start: Option<u16>) -> u16 {
    let mut crc = start.unwrap_or(CRC_IBM_3740_INIT);
    for byte in buf {
        crc ^= (*byte as u16) << 8;
        for _j in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ CRC_IBM_3740_POLY;
            }
            else {
                crc <<= 1;
            }
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc_check_value() {
        assert_eq!(crc_ibm_3740(b"123456789", None), 0x29B1);
    }

    #[test]
    fn crc_continues_from_start() {
        let whole = crc_ibm_3740(&[0xA1, 0xA1, 0xA1, 0xFE, 0x01, 0x00, 0x03, 0x02], None);
        let head = crc_ibm_3740(&[0xA1, 0xA1, 0xA1, 0xFE], None);
        assert_eq!(crc_ibm_3740(&[0x01, 0x00, 0x03, 0x02], Some(head)), whole);
    }

    #[test]
    fn crc_detects_every_single_bit_error() {
        let mut field = vec![0xA1, 0xA1, 0xA1, 0xFB];
        field.extend((0..512).map(|i| (i * 7 + 3) as u8));
        let good = crc_ibm_3740(&field, None);

        for bit in 0..field.len() * 8 {
            let mut corrupted = field.clone();
            corrupted[bit / 8] ^= 0x80 >> (bit % 8);
            assert_ne!(crc_ibm_3740(&corrupted, None), good, "bit {} not detected", bit);
        }
    }
}
