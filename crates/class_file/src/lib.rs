// https://docs.oracle.com/javase/specs/jvms/se19/html/jvms-4.html

mod access_flags;
pub mod attributes;
mod class_file;
#[macro_use]
pub mod constant_pool;
mod error;
pub mod instruction;
mod node;
mod parser;
mod reader;

pub use self::class_file::{ClassFile, FieldInfo, MethodInfo};
pub use access_flags::AccessFlags;
pub use constant_pool::{ConstantPool, CpInfo};
pub use error::ClassFileError;
pub use node::{Node, NodeValue};
pub use parser::Parser;
pub use reader::ClassReader;

pub type Result<T, E = ClassFileError> = std::result::Result<T, E>;
