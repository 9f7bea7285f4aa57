//! FIT CRC-16
//!
//! Nibble-table CRC used for both the file header and the message body
//! (CRC-16/ARC: poly 0x8005 reflected, init 0). Output is little-endian.

use std::io;

const CRC_TABLE: [u16; 16] = [
    0x0000, 0xCC01, 0xD801, 0x1400, 0xF001, 0x3C00, 0x2800, 0xE401, 0xA001, 0x6C00, 0x7800,
    0xB401, 0x5000, 0x9C01, 0x8801, 0x4400,
];

/// Streaming CRC-16 accumulator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc16 {
    crc: u16,
}

impl Crc16 {
    pub fn new() -> Self {
        Self::default()
    }

    fn step(crc: u16, nibble: u8) -> u16 {
        let tmp = CRC_TABLE[(crc & 0xF) as usize];
        let crc = (crc >> 4) & 0x0FFF;
        crc ^ tmp ^ CRC_TABLE[(nibble & 0xF) as usize]
    }

    /// Feed bytes into the checksum
    pub fn update(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            let crc = Self::step(self.crc, byte);
            self.crc = Self::step(crc, byte >> 4);
        }
    }

    /// Current checksum; the accumulator keeps going
    pub fn sum(&self) -> u16 {
        self.crc
    }

    /// Current checksum as written on the wire
    pub fn sum_bytes(&self) -> [u8; 2] {
        self.crc.to_le_bytes()
    }

    pub fn reset(&mut self) {
        self.crc = 0;
    }
}

impl io::Write for Crc16 {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// CRC-16 of `bytes` in one go
pub fn checksum(bytes: &[u8]) -> u16 {
    let mut crc = Crc16::new();
    crc.update(bytes);
    crc.sum()
}
