//! # DSMR Telegram Checksum
//!
//! CRC-16 as used in the P1 telegram trailer (CRC-16/ARC): reflected
//! polynomial 0xA001, initial value 0x0000, no final XOR. It covers every
//! byte from the `/` start marker through the `!` end marker inclusive.

use crate::constants::DSMR_CRC_POLYNOMIAL;

/// Calculate the CRC16 of a byte range, bit by bit.
pub fn calculate_crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0x0000;
    for &byte in data {
        crc ^= byte as u16;
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ DSMR_CRC_POLYNOMIAL
            } else {
                crc >> 1
            };
        }
    }
    crc
}

/// Check a byte range against a received CRC value.
pub fn verify_crc16(data: &[u8], received: u16) -> bool {
    calculate_crc16(data) == received
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_crc16_check_value() {
        // Standard CRC-16/ARC check input
        assert_eq!(calculate_crc16(b"123456789"), 0xBB3D);
    }

    #[test]
    fn test_crc16_empty() {
        assert_eq!(calculate_crc16(&[]), 0x0000);
    }

    #[test]
    fn test_crc16_minimal_telegram() {
        let telegram = b"/ISk5\\2MT382-1000\r\n1-0:1.8.0(00001.234*kWh)\r\n!";
        assert_eq!(calculate_crc16(telegram), 0xBA6C);
        assert!(verify_crc16(telegram, 0xBA6C));
        assert!(!verify_crc16(telegram, 0x0000));
    }

    proptest! {
        #[test]
        fn prop_crc16_deterministic(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(calculate_crc16(&data), calculate_crc16(&data));
        }

        #[test]
        fn prop_crc16_detects_single_bit_flip(
            data in proptest::collection::vec(any::<u8>(), 1..512),
            index in any::<proptest::sample::Index>(),
            bit in 0u8..8,
        ) {
            let mut corrupted = data.clone();
            let i = index.index(corrupted.len());
            corrupted[i] ^= 1 << bit;
            prop_assert_ne!(calculate_crc16(&data), calculate_crc16(&corrupted));
        }
    }
}
