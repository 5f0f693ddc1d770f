//! CRC-32 checksum (ISO 3309 / ITU-T V.42, polynomial `0xEDB88320`).
//!
//! This is the same checksum used by zlib, gzip, and PNG, and the one ZIP
//! readers recompute when validating entries. The 256-entry lookup table is
//! built on first use and cached for the lifetime of the process.

use std::sync::OnceLock;

/// Reflected generator polynomial for CRC-32/ISO-HDLC.
const POLYNOMIAL: u32 = 0xEDB8_8320;

static TABLE: OnceLock<[u32; 256]> = OnceLock::new();

fn table() -> &'static [u32; 256] {
    TABLE.get_or_init(|| {
        let mut table = [0u32; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            let mut crc = i as u32;
            for _ in 0..8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ POLYNOMIAL;
                } else {
                    crc >>= 1;
                }
            }
            *slot = crc;
        }
        table
    })
}

/// Compute the CRC-32 of `data`.
///
/// Deterministic for any byte sequence; the empty input hashes to zero.
pub fn crc32(data: &[u8]) -> u32 {
    let table = table();
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc = (crc >> 8) ^ table[((crc ^ u32::from(byte)) & 0xFF) as usize];
    }
    crc ^ 0xFFFF_FFFF
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        // "123456789" has well-known CRC32 = 0xCBF4_3926
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn empty_input() {
        assert_eq!(crc32(b""), 0x0000_0000);
    }

    #[test]
    fn single_zero_byte() {
        assert_eq!(crc32(&[0x00]), 0xD202_EF8D);
    }

    #[test]
    fn matches_bitwise_reference() {
        // Bit-at-a-time form of the same polynomial, no table.
        fn reference(bytes: &[u8]) -> u32 {
            let mut crc: u32 = 0xFFFF_FFFF;
            for &b in bytes {
                crc ^= b as u32;
                for _ in 0..8 {
                    let mask = (crc & 1).wrapping_neg();
                    crc = (crc >> 1) ^ (POLYNOMIAL & mask);
                }
            }
            !crc
        }

        let samples: [&[u8]; 4] = [
            b"application/epub+zip",
            b"hello world",
            &[0xFF; 64],
            b"a",
        ];
        for sample in samples {
            assert_eq!(crc32(sample), reference(sample));
        }
    }

    #[test]
    fn matches_crc32fast() {
        let data = b"The quick brown fox jumps over the lazy dog";
        assert_eq!(crc32(data), crc32fast::hash(data));
    }
}
