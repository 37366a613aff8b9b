use crate::{ClassFileError, Result};

#[macro_export]
macro_rules! expect_cp_info {
    ($cp:expr, $index:expr, $i:ident) => {
        match $cp.get($index)? {
            $crate::constant_pool::CpInfo::$i(ref n) => Ok(n),
            c => Err($crate::ClassFileError::UnexpectedConstantPoolEntry(
                stringify!($i),
                c.clone(),
            )),
        }
    };
}

/// The class file's shared table of literals and symbolic references,
/// indexed from 1. Raw entries are stored during the structural read;
/// textual resolution is deferred until the whole pool exists, since
/// entries reference each other in either direction.
#[derive(Debug, Default)]
pub struct ConstantPool {
    count: u16,
    cp_infos: Vec<CpInfo>,
}
impl ConstantPool {
    pub fn new(count: u16, cp_infos: Vec<CpInfo>) -> Self {
        Self { count, cp_infos }
    }

    /// The declared constant_pool_count (one more than the number of slots).
    pub fn count(&self) -> u16 {
        self.count
    }

    pub fn get(&self, index: u16) -> Result<&CpInfo> {
        if index == 0 || index >= self.count {
            return Err(ClassFileError::InvalidConstantPoolIndex(index));
        }
        match self.cp_infos.get(index as usize - 1) {
            None | Some(CpInfo::Unusable) => {
                Err(ClassFileError::InvalidConstantPoolIndex(index))
            }
            Some(cp_info) => Ok(cp_info),
        }
    }

    pub fn utf8(&self, index: u16) -> Result<&str> {
        expect_cp_info!(self, index, Utf8).map(|s| s.as_str())
    }

    pub fn class_name(&self, index: u16) -> Result<&str> {
        let ClassInfo { name_index } = expect_cp_info!(self, index, Class)?;
        self.utf8(*name_index)
    }

    pub fn name_and_type(&self, index: u16) -> Result<(&str, &str)> {
        let NameAndTypeInfo {
            name_index,
            descriptor_index,
        } = expect_cp_info!(self, index, NameAndType)?;
        Ok((self.utf8(*name_index)?, self.utf8(*descriptor_index)?))
    }

    /// Owner, name and descriptor of a Fieldref, Methodref or
    /// InterfaceMethodref entry.
    pub fn member_ref(&self, index: u16) -> Result<(&str, &str, &str)> {
        let ref_info = match self.get(index)? {
            CpInfo::FieldRef(r) | CpInfo::MethodRef(r) | CpInfo::InterfaceMethodRef(r) => r,
            c => {
                return Err(ClassFileError::UnexpectedConstantPoolEntry(
                    "MethodRef",
                    c.clone(),
                ))
            }
        };
        let owner = self.class_name(ref_info.class_index)?;
        let (name, descriptor) = self.name_and_type(ref_info.name_and_type_index)?;
        Ok((owner, name, descriptor))
    }

    /// Display string for an entry, composed once the whole pool has been
    /// materialized so forward references resolve.
    pub fn resolve(&self, index: u16) -> Result<String> {
        Ok(match self.get(index)? {
            CpInfo::Utf8(s) => s.clone(),
            CpInfo::Integer(n) => n.to_string(),
            CpInfo::Float(n) => n.to_string(),
            CpInfo::Long(n) => n.to_string(),
            CpInfo::Double(n) => n.to_string(),
            CpInfo::Class(ClassInfo { name_index }) => self.utf8(*name_index)?.to_owned(),
            CpInfo::String { string_index } => self.utf8(*string_index)?.to_owned(),
            CpInfo::NameAndType(NameAndTypeInfo {
                name_index,
                descriptor_index,
            }) => format!(
                "{}:{}",
                self.utf8(*name_index)?,
                self.utf8(*descriptor_index)?
            ),
            CpInfo::FieldRef(_) | CpInfo::MethodRef(_) | CpInfo::InterfaceMethodRef(_) => {
                let (owner, name, descriptor) = self.member_ref(index)?;
                format!("{owner}.{name}:{descriptor}")
            }
            CpInfo::MethodHandle(MethodHandleInfo {
                reference_kind,
                reference_index,
            }) => format!("kind {} {}", reference_kind, self.resolve(*reference_index)?),
            CpInfo::MethodType(MethodTypeInfo { descriptor_index }) => {
                self.utf8(*descriptor_index)?.to_owned()
            }
            CpInfo::Dynamic(d) | CpInfo::InvokeDynamic(d) => format!(
                "bootstrap #{} {}",
                d.bootstrap_method_attr_index,
                self.resolve(d.name_and_type_index)?
            ),
            CpInfo::Module { name_index } | CpInfo::Package { name_index } => {
                self.utf8(*name_index)?.to_owned()
            }
            // get never hands one out.
            CpInfo::Unusable => String::new(),
        })
    }
}
impl<'a> IntoIterator for &'a ConstantPool {
    type Item = &'a CpInfo;
    type IntoIter = std::slice::Iter<'a, CpInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.cp_infos.iter()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum CpInfo {
    MethodRef(RefInfo),
    FieldRef(RefInfo),
    Float(f32),
    InterfaceMethodRef(RefInfo),
    Class(ClassInfo),
    NameAndType(NameAndTypeInfo),
    Utf8(String),
    String { string_index: u16 },
    InvokeDynamic(DynamicInfo),
    Dynamic(DynamicInfo),
    Integer(i32),
    MethodHandle(MethodHandleInfo),
    MethodType(MethodTypeInfo),
    Long(i64),
    Double(f64),
    Module { name_index: u16 },
    Package { name_index: u16 },
    Unusable,
}
impl CpInfo {
    pub fn tag_name(&self) -> &'static str {
        match self {
            CpInfo::MethodRef(_) => "Methodref",
            CpInfo::FieldRef(_) => "Fieldref",
            CpInfo::Float(_) => "Float",
            CpInfo::InterfaceMethodRef(_) => "InterfaceMethodref",
            CpInfo::Class(_) => "Class",
            CpInfo::NameAndType(_) => "NameAndType",
            CpInfo::Utf8(_) => "Utf8",
            CpInfo::String { .. } => "String",
            CpInfo::InvokeDynamic(_) => "InvokeDynamic",
            CpInfo::Dynamic(_) => "Dynamic",
            CpInfo::Integer(_) => "Integer",
            CpInfo::MethodHandle(_) => "MethodHandle",
            CpInfo::MethodType(_) => "MethodType",
            CpInfo::Long(_) => "Long",
            CpInfo::Double(_) => "Double",
            CpInfo::Module { .. } => "Module",
            CpInfo::Package { .. } => "Package",
            CpInfo::Unusable => "Unusable",
        }
    }

    // All 8-byte constants take up two entries in the constant_pool table.
    pub fn slot_size(&self) -> usize {
        match self {
            CpInfo::Long(_) | CpInfo::Double(_) => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct RefInfo {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ClassInfo {
    // The value of the name_index item must be a valid index into the constant_pool table.
    // The constant_pool entry at that index must be a CONSTANT_Utf8_info structure (§4.4.7)
    // representing a valid binary class or interface name encoded in internal form (§4.2.1).
    pub name_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct NameAndTypeInfo {
    pub name_index: u16,
    pub descriptor_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct DynamicInfo {
    pub bootstrap_method_attr_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct MethodHandleInfo {
    pub reference_kind: u8,
    pub reference_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct MethodTypeInfo {
    pub descriptor_index: u16,
}
