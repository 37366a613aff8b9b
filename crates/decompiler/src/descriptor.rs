//! The descriptor mini-grammar shared by head rendering and the
//! interpreter: primitive letter codes, array dimension prefix `[`,
//! object types `L...;`.

use std::fmt;

use crate::{DecompileError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct JavaType {
    pub base: BaseType,
    pub dims: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BaseType {
    Primitive(&'static str),
    /// Binary name in internal (slash-delimited) form.
    Object(String),
    Void,
}

impl JavaType {
    pub fn is_void(&self) -> bool {
        self.dims == 0 && self.base == BaseType::Void
    }

    /// Slots a value of this type takes in the local variable array.
    pub fn slot_width(&self) -> usize {
        match &self.base {
            BaseType::Primitive(p) if self.dims == 0 && (*p == "long" || *p == "double") => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.base {
            BaseType::Primitive(name) => f.write_str(name)?,
            BaseType::Void => f.write_str("void")?,
            BaseType::Object(binary_name) => f.write_str(simple_name(binary_name))?,
        }
        for _ in 0..self.dims {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

/// Last segment of a slash-delimited binary name.
pub fn simple_name(binary_name: &str) -> &str {
    binary_name.rsplit('/').next().unwrap_or(binary_name)
}

pub fn parse_method_descriptor(desc: &str) -> Result<(Vec<JavaType>, JavaType)> {
    let mut p = DescriptorParser { desc, pos: 0 };
    if p.bump()? != '(' {
        return Err(DecompileError::BadDescriptor(desc.into()));
    }
    let mut params = Vec::new();
    while p.peek()? != ')' {
        params.push(p.next_type()?);
    }
    p.bump()?;
    let return_type = p.next_type()?;
    Ok((params, return_type))
}

pub fn parse_field_descriptor(desc: &str) -> Result<JavaType> {
    let mut p = DescriptorParser { desc, pos: 0 };
    p.next_type()
}

struct DescriptorParser<'a> {
    desc: &'a str,
    pos: usize,
}

impl<'a> DescriptorParser<'a> {
    fn next_type(&mut self) -> Result<JavaType> {
        let mut dims = 0u8;
        loop {
            let base = match self.bump()? {
                '[' => {
                    dims = dims.saturating_add(1);
                    continue;
                }
                'B' => BaseType::Primitive("byte"),
                'C' => BaseType::Primitive("char"),
                'D' => BaseType::Primitive("double"),
                'F' => BaseType::Primitive("float"),
                'I' => BaseType::Primitive("int"),
                'J' => BaseType::Primitive("long"),
                'S' => BaseType::Primitive("short"),
                'Z' => BaseType::Primitive("boolean"),
                'V' => BaseType::Void,
                'L' => {
                    let start = self.pos;
                    let end = self.desc[self.pos..]
                        .find(';')
                        .ok_or_else(|| DecompileError::BadDescriptor(self.desc.into()))?
                        + self.pos;
                    let name = self.desc[start..end].to_owned();
                    self.pos = end + 1;
                    BaseType::Object(name)
                }
                _ => return Err(DecompileError::BadDescriptor(self.desc.into())),
            };
            return Ok(JavaType { base, dims });
        }
    }

    fn bump(&mut self) -> Result<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Ok(c)
    }

    fn peek(&self) -> Result<char> {
        self.desc[self.pos..]
            .chars()
            .next()
            .ok_or_else(|| DecompileError::BadDescriptor(self.desc.into()))
    }
}

#[cfg(test)]
mod descriptor_tests {
    use super::*;

    #[test]
    fn it_should_parse_primitive_parameters() {
        let (params, return_type) = parse_method_descriptor("(II)I").unwrap();
        assert_eq!(2, params.len());
        assert_eq!("int", params[0].to_string());
        assert_eq!("int", return_type.to_string());
        assert!(!return_type.is_void());
    }

    #[test]
    fn it_should_parse_object_and_array_parameters() {
        let (params, return_type) = parse_method_descriptor("([Ljava/lang/String;J)V").unwrap();
        assert_eq!("String[]", params[0].to_string());
        assert_eq!("long", params[1].to_string());
        assert_eq!(2, params[1].slot_width());
        assert!(return_type.is_void());
    }

    #[test]
    fn it_should_parse_a_field_descriptor() {
        assert_eq!("int[][]", parse_field_descriptor("[[I").unwrap().to_string());
    }

    #[test]
    fn it_should_fail_on_a_truncated_descriptor() {
        assert!(matches!(
            parse_method_descriptor("(I"),
            Err(DecompileError::BadDescriptor(_))
        ));
    }

    #[test]
    fn it_should_shorten_binary_names() {
        assert_eq!("String", simple_name("java/lang/String"));
        assert_eq!("Foo", simple_name("Foo"));
    }
}
