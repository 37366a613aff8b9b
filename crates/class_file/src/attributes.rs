use crate::instruction::Instruction;

/// A named, length-delimited auxiliary block attached to a class, field,
/// method or Code attribute. The name is resolved from the constant pool
/// during parsing, so lookups need no pool afterwards.
#[derive(Debug)]
pub struct Attribute {
    pub name: String,
    pub body: AttributeBody,
}

#[derive(Debug)]
pub enum AttributeBody {
    ConstantValue { constantvalue_index: u16 },
    Code(CodeAttribute),
    Exceptions { exception_index_table: Vec<u16> },
    SourceFile { sourcefile_index: u16 },
    LineNumberTable(Vec<LineNumberEntry>),
    LocalVariableTable(Vec<LocalVariableEntry>),
    /// Unrecognized kinds keep their raw bytes and never fail the parse.
    Opaque(Vec<u8>),
}

#[derive(Debug)]
pub struct Attributes(pub Vec<Attribute>);
impl Attributes {
    pub fn find_by_name(&self, name: &str) -> Option<&Attribute> {
        self.0.iter().find(|a| a.name == name)
    }

    pub fn code(&self) -> Option<&CodeAttribute> {
        match &self.find_by_name("Code")?.body {
            AttributeBody::Code(code) => Some(code),
            _ => None,
        }
    }

    pub fn exceptions(&self) -> Option<&[u16]> {
        match &self.find_by_name("Exceptions")?.body {
            AttributeBody::Exceptions {
                exception_index_table,
            } => Some(exception_index_table),
            _ => None,
        }
    }

    pub fn local_variable_table(&self) -> Option<&[LocalVariableEntry]> {
        match &self.find_by_name("LocalVariableTable")?.body {
            AttributeBody::LocalVariableTable(entries) => Some(entries),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub instructions: Vec<Instruction>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub attributes: Attributes,
}

#[derive(Debug)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: u16,
}

#[derive(Debug)]
pub struct LineNumberEntry {
    pub start_pc: u16,
    pub line_number: u16,
}

#[derive(Debug)]
pub struct LocalVariableEntry {
    pub start_pc: u16,
    pub length: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub index: u16,
}
