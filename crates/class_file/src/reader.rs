use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt};

use crate::{ClassFileError, Result};

type Endian = BigEndian;

pub struct ClassReader<'a> {
    r: Cursor<&'a [u8]>,
}
impl<'a> ClassReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { r: Cursor::new(buf) }
    }

    pub fn position(&self) -> usize {
        self.r.position() as usize
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let offset = self.position();
        self.r
            .read_u8()
            .map_err(|_| ClassFileError::BufferExhausted(offset))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let offset = self.position();
        self.r
            .read_u16::<Endian>()
            .map_err(|_| ClassFileError::BufferExhausted(offset))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let offset = self.position();
        self.r
            .read_u32::<Endian>()
            .map_err(|_| ClassFileError::BufferExhausted(offset))
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        let offset = self.position();
        self.r
            .read_i8()
            .map_err(|_| ClassFileError::BufferExhausted(offset))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let offset = self.position();
        self.r
            .read_i16::<Endian>()
            .map_err(|_| ClassFileError::BufferExhausted(offset))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let offset = self.position();
        self.r
            .read_i32::<Endian>()
            .map_err(|_| ClassFileError::BufferExhausted(offset))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let offset = self.position();
        let mut bytes = vec![0u8; n];
        self.r
            .read_exact(&mut bytes)
            .map_err(|_| ClassFileError::BufferExhausted(offset))?;
        Ok(bytes)
    }

    pub fn peek_u16(&mut self) -> Result<u16> {
        let position = self.r.position();
        let value = self.read_u16();
        self.r.set_position(position);
        value
    }
}

#[cfg(test)]
mod reader_tests {
    use super::*;

    #[test]
    fn it_should_read_big_endian_primitives() {
        let mut r = ClassReader::new(&[0xca, 0xfe, 0xba, 0xbe, 0x00, 0x34]);
        assert_eq!(0xcafebabe, r.read_u32().unwrap());
        assert_eq!(0x0034, r.read_u16().unwrap());
        assert_eq!(6, r.position());
    }

    #[test]
    fn it_should_read_signed_values() {
        let mut r = ClassReader::new(&[0xff, 0xff, 0xfe]);
        assert_eq!(-1, r.read_i8().unwrap());
        assert_eq!(-2, r.read_i16().unwrap());
    }

    #[test]
    fn it_should_report_the_offset_of_a_failing_read() {
        let mut r = ClassReader::new(&[0x00, 0x01]);
        assert_eq!(1, r.read_u8().unwrap());
        assert!(matches!(
            r.read_u32(),
            Err(ClassFileError::BufferExhausted(1))
        ));
    }

    #[test]
    fn it_should_peek_without_advancing() {
        let mut r = ClassReader::new(&[0x00, 0x07, 0x00, 0x08]);
        assert_eq!(7, r.peek_u16().unwrap());
        assert_eq!(0, r.position());
        assert_eq!(7, r.read_u16().unwrap());
        assert_eq!(8, r.read_u16().unwrap());
    }
}
