use classpeek_class_file::ClassFileError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecompileError {
    #[error(transparent)]
    ClassFile(#[from] ClassFileError),
    #[error("Unsupported instruction: {0}")]
    UnsupportedInstruction(&'static str),
    #[error("Operand stack underflow at {0}")]
    StackUnderflow(&'static str),
    #[error("No display name for local variable slot {0}")]
    UnknownLocal(usize),
    #[error("Malformed descriptor: {0}")]
    BadDescriptor(String),
    #[error("Method has no Code attribute")]
    MissingCode,
}
