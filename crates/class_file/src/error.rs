use thiserror::Error;

use crate::constant_pool;

#[derive(Error, Debug)]
pub enum ClassFileError {
    #[error("Read past end of input at offset {0}")]
    BufferExhausted(usize),
    #[error("Invalid magic identifier: 0x{0:X}")]
    InvalidMagicIdentifier(u32),
    #[error("Invalid cp info tag: {0}")]
    InvalidCpInfoTag(u8),
    #[error("Invalid constant pool index: {0}")]
    InvalidConstantPoolIndex(u16),
    #[error("Expected {0}, found {1:?}")]
    UnexpectedConstantPoolEntry(&'static str, constant_pool::CpInfo),
    #[error("Invalid opcode: 0x{0:02X} at offset {1}")]
    InvalidOpcode(u8, usize),
    #[error("Instruction stream overruns declared code length at offset {0}")]
    CodeOverrun(usize),
    #[error("Attribute {0} did not consume its declared length")]
    AttributeLengthMismatch(String),
}
