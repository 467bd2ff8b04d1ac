//! CRC-8 checksum used on the spa bus.
//!
//! The bus uses an 8-bit CRC with polynomial 0x07, initial register value
//! 0x02, and a final XOR of 0x02, MSB first, no reflection. The checksum
//! covers everything between the sentinels except the CRC byte itself:
//! length byte, destination, source, kind, and payload.
//!
//! Seeding the register with 0x02 and XOR-ing the result with 0x02 is
//! equivalent to running a plain poly-0x07 CRC from 0x02 and flipping the
//! same bit pattern at the end; both produce the same wire value.

use crc::{Algorithm, Crc};

/// CRC parameters observed on the wire.
const BUS_CRC: Algorithm<u8> = Algorithm {
    width: 8,
    poly: 0x07,
    init: 0x02,
    refin: false,
    refout: false,
    xorout: 0x02,
    check: 0x00,
    residue: 0x00,
};

const ENGINE: Crc<u8> = Crc::<u8>::new(&BUS_CRC);

/// Computes the bus CRC over `bytes` (length byte through end of payload).
pub fn checksum(bytes: &[u8]) -> u8 {
    ENGINE.checksum(bytes)
}
