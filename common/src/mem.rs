
use std::io::{self, Read, Write};

pub fn lower_byte(val: u16) -> u8 {
    val as u8
}

pub fn upper_byte(val: u16) -> u8 {
    (val >> u8::BITS) as u8
}

pub fn word_from_bytes(lower: u8, upper: u8) -> u16 {
    (lower as u16) | ((upper as u16) << u8::BITS)
}

////////////////////////////////////////////////////////////////////////////////

pub trait ReadU16 {
    fn read_u16(&mut self) -> io::Result<u16>;
}

impl<T: Read> ReadU16 for T {
    fn read_u16(&mut self) -> io::Result<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(word_from_bytes(buf[0], buf[1]))
    }
}

////////////////////////////////////////////////////////////////////////////////

pub trait WriteU16 {
    fn write_u16(&mut self, val: u16) -> io::Result<()>;
}

impl<T: Write> WriteU16 for T {
    fn write_u16(&mut self, val: u16) -> io::Result<()> {
        self.write_all(&[lower_byte(val), upper_byte(val)])
    }
}
