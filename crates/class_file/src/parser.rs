use crate::{
    attributes::{
        Attribute, AttributeBody, Attributes, CodeAttribute, ExceptionTableEntry, LineNumberEntry,
        LocalVariableEntry,
    },
    class_file::{FieldInfo, MethodInfo},
    constant_pool::{
        ClassInfo, CpInfo, DynamicInfo, MethodHandleInfo, MethodTypeInfo, NameAndTypeInfo, RefInfo,
    },
    instruction::Instruction,
    node::{format_index, Node, NodeValue},
    reader::ClassReader,
    AccessFlags, ClassFile, ClassFileError, ConstantPool, Result,
};

pub struct Parser<'a> {
    r: ClassReader<'a>,
    pool: ConstantPool,
}
impl<'a> Parser<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            r: ClassReader::new(buf),
            pool: ConstantPool::default(),
        }
    }

    /// One structural pass building the node tree and the typed model,
    /// followed by the description resolution pass over the finished tree.
    pub fn parse(mut self) -> Result<ClassFile> {
        let mut root = Node::branch("class_file", 0);

        self.parse_magic_identifier(&mut root)?;
        let minor = self.u2(&mut root, "minor_version")?;
        let major = self.u2(&mut root, "major_version")?;
        self.parse_constant_pool(&mut root)?;
        let access_flags = self.flags(&mut root, "access_flags")?;
        let this_class = self.u2cp(&mut root, "this_class")?;
        let super_class = self.u2cp(&mut root, "super_class")?;
        let interfaces = self.parse_interfaces(&mut root)?;
        let fields = self.parse_fields(&mut root)?;
        let methods = self.parse_methods(&mut root)?;
        let attributes = self.parse_attributes(&mut root)?;
        root.finish(self.r.position());

        self.resolve_descriptions(&mut root)?;

        Ok(ClassFile {
            version: (major, minor),
            constant_pool: self.pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
            node: root,
        })
    }

    fn parse_magic_identifier(&mut self, parent: &mut Node) -> Result<()> {
        let start = self.r.position();
        match self.r.read_u32()? {
            0xCAFEBABE => {
                parent.push(Node::leaf(
                    "magic",
                    "0xCAFEBABE".to_owned(),
                    start,
                    4,
                    NodeValue::None,
                ));
                Ok(())
            }
            magic_identifier => Err(ClassFileError::InvalidMagicIdentifier(magic_identifier)),
        }
    }

    fn parse_constant_pool(&mut self, parent: &mut Node) -> Result<()> {
        let count = self.u2(parent, "constant_pool_count")?;
        let mut table = Node::branch("constant_pool", self.r.position());

        let slots = count.saturating_sub(1) as usize;
        let mut cp_infos: Vec<CpInfo> = Vec::with_capacity(slots);
        while cp_infos.len() < slots {
            let index = cp_infos.len() + 1;
            let mut node = Node::branch(format_index(count, index), self.r.position());
            let cp_info = self.parse_cp_info(&mut node)?;
            node.set_name(format!(
                "{} ({})",
                format_index(count, index),
                cp_info.tag_name()
            ));
            node.set_value(NodeValue::CpEntry(index as u16));
            node.finish(self.r.position());
            table.push(node);

            // The slot after a Long or Double is dead; keep indices aligned.
            let slot_size = cp_info.slot_size();
            cp_infos.push(cp_info);
            (1..slot_size).for_each(|_| cp_infos.push(CpInfo::Unusable));
        }
        table.finish(self.r.position());
        parent.push(table);

        self.pool = ConstantPool::new(count, cp_infos);
        Ok(())
    }

    fn parse_cp_info(&mut self, node: &mut Node) -> Result<CpInfo> {
        let tag = self.u1(node, "tag")?;
        match tag {
            1 => self.parse_utf8(node),
            3 => self.parse_integer(node),
            4 => self.parse_float(node),
            5 => self.parse_long(node),
            6 => self.parse_double(node),
            7 => Ok(CpInfo::Class(ClassInfo {
                name_index: self.u2cp(node, "name_index")?,
            })),
            8 => Ok(CpInfo::String {
                string_index: self.u2cp(node, "string_index")?,
            }),
            9 => Ok(CpInfo::FieldRef(self.parse_ref_info(node)?)),
            10 => Ok(CpInfo::MethodRef(self.parse_ref_info(node)?)),
            11 => Ok(CpInfo::InterfaceMethodRef(self.parse_ref_info(node)?)),
            12 => Ok(CpInfo::NameAndType(NameAndTypeInfo {
                name_index: self.u2cp(node, "name_index")?,
                descriptor_index: self.u2cp(node, "descriptor_index")?,
            })),
            15 => Ok(CpInfo::MethodHandle(MethodHandleInfo {
                reference_kind: self.u1(node, "reference_kind")?,
                reference_index: self.u2cp(node, "reference_index")?,
            })),
            16 => Ok(CpInfo::MethodType(MethodTypeInfo {
                descriptor_index: self.u2cp(node, "descriptor_index")?,
            })),
            17 => Ok(CpInfo::Dynamic(self.parse_dynamic_info(node)?)),
            18 => Ok(CpInfo::InvokeDynamic(self.parse_dynamic_info(node)?)),
            19 => Ok(CpInfo::Module {
                name_index: self.u2cp(node, "name_index")?,
            }),
            20 => Ok(CpInfo::Package {
                name_index: self.u2cp(node, "name_index")?,
            }),
            _ => Err(ClassFileError::InvalidCpInfoTag(tag)),
        }
    }

    fn parse_utf8(&mut self, node: &mut Node) -> Result<CpInfo> {
        let length = self.u2(node, "length")?;
        let start = self.r.position();
        let bytes = self.r.read_bytes(length as usize)?;
        let text: String = String::from_utf8_lossy(&bytes).into();
        node.push(Node::leaf(
            "bytes",
            text.clone(),
            start,
            length as usize,
            NodeValue::None,
        ));
        Ok(CpInfo::Utf8(text))
    }

    fn parse_integer(&mut self, node: &mut Node) -> Result<CpInfo> {
        let start = self.r.position();
        let value = self.r.read_i32()?;
        node.push(Node::leaf(
            "bytes",
            value.to_string(),
            start,
            4,
            NodeValue::None,
        ));
        Ok(CpInfo::Integer(value))
    }

    fn parse_float(&mut self, node: &mut Node) -> Result<CpInfo> {
        let start = self.r.position();
        let value = f32::from_bits(self.r.read_u32()?);
        node.push(Node::leaf(
            "bytes",
            value.to_string(),
            start,
            4,
            NodeValue::None,
        ));
        Ok(CpInfo::Float(value))
    }

    fn parse_long(&mut self, node: &mut Node) -> Result<CpInfo> {
        let start = self.r.position();
        let high_bytes = self.r.read_u32()?;
        let low_bytes = self.r.read_u32()?;
        let value = (((high_bytes as u64) << 32) | low_bytes as u64) as i64;
        node.push(Node::leaf(
            "bytes",
            value.to_string(),
            start,
            8,
            NodeValue::None,
        ));
        Ok(CpInfo::Long(value))
    }

    fn parse_double(&mut self, node: &mut Node) -> Result<CpInfo> {
        let start = self.r.position();
        let high_bytes = self.r.read_u32()?;
        let low_bytes = self.r.read_u32()?;
        let value = f64::from_bits(((high_bytes as u64) << 32) | low_bytes as u64);
        node.push(Node::leaf(
            "bytes",
            value.to_string(),
            start,
            8,
            NodeValue::None,
        ));
        Ok(CpInfo::Double(value))
    }

    fn parse_ref_info(&mut self, node: &mut Node) -> Result<RefInfo> {
        Ok(RefInfo {
            class_index: self.u2cp(node, "class_index")?,
            name_and_type_index: self.u2cp(node, "name_and_type_index")?,
        })
    }

    fn parse_dynamic_info(&mut self, node: &mut Node) -> Result<DynamicInfo> {
        Ok(DynamicInfo {
            bootstrap_method_attr_index: self.u2(node, "bootstrap_method_attr_index")?,
            name_and_type_index: self.u2cp(node, "name_and_type_index")?,
        })
    }

    fn parse_interfaces(&mut self, parent: &mut Node) -> Result<Vec<u16>> {
        let count = self.u2(parent, "interfaces_count")?;
        let mut table = Node::branch("interfaces", self.r.position());
        let interfaces = (0..count)
            .map(|i| self.u2cp(&mut table, &format_index(count, i as usize)))
            .collect::<Result<Vec<_>>>()?;
        table.finish(self.r.position());
        parent.push(table);
        Ok(interfaces)
    }

    fn parse_fields(&mut self, parent: &mut Node) -> Result<Vec<FieldInfo>> {
        let count = self.u2(parent, "fields_count")?;
        let mut table = Node::branch("fields", self.r.position());
        let fields = (0..count)
            .map(|i| {
                let (access_flags, name_index, descriptor_index, attributes) =
                    self.parse_member(&mut table, count, i)?;
                Ok(FieldInfo {
                    access_flags,
                    name_index,
                    descriptor_index,
                    attributes,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        table.finish(self.r.position());
        parent.push(table);
        Ok(fields)
    }

    fn parse_methods(&mut self, parent: &mut Node) -> Result<Vec<MethodInfo>> {
        let count = self.u2(parent, "methods_count")?;
        let mut table = Node::branch("methods", self.r.position());
        let methods = (0..count)
            .map(|i| {
                let (access_flags, name_index, descriptor_index, attributes) =
                    self.parse_member(&mut table, count, i)?;
                Ok(MethodInfo {
                    access_flags,
                    name_index,
                    descriptor_index,
                    attributes,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        table.finish(self.r.position());
        parent.push(table);
        Ok(methods)
    }

    fn parse_member(
        &mut self,
        table: &mut Node,
        count: u16,
        i: u16,
    ) -> Result<(AccessFlags, u16, u16, Attributes)> {
        let mut node = Node::branch(format_index(count, i as usize), self.r.position());
        let access_flags = self.flags(&mut node, "access_flags")?;
        let name_index = self.u2cp(&mut node, "name_index")?;
        let descriptor_index = self.u2cp(&mut node, "descriptor_index")?;
        let attributes = self.parse_attributes(&mut node)?;
        node.set_desc(self.pool.utf8(name_index)?.to_owned());
        node.finish(self.r.position());
        table.push(node);
        Ok((access_flags, name_index, descriptor_index, attributes))
    }

    fn parse_attributes(&mut self, parent: &mut Node) -> Result<Attributes> {
        let count = self.u2(parent, "attributes_count")?;
        let mut table = Node::branch("attributes", self.r.position());
        let attributes = (0..count)
            .map(|i| self.parse_attribute(&mut table, count, i))
            .collect::<Result<Vec<_>>>()
            .map(Attributes)?;
        table.finish(self.r.position());
        parent.push(table);
        Ok(attributes)
    }

    // The attribute kind is selected by a name resolved from the file
    // itself, so the name index is peeked and resolved before the body.
    fn parse_attribute(&mut self, table: &mut Node, count: u16, i: u16) -> Result<Attribute> {
        let name = {
            let name_index = self.r.peek_u16()?;
            self.pool.utf8(name_index)?.to_owned()
        };

        let mut node = Node::branch(
            format!("{} ({})", format_index(count, i as usize), name),
            self.r.position(),
        );
        self.u2cp(&mut node, "attribute_name_index")?;
        let attribute_length = self.u4(&mut node, "attribute_length")?;
        let body_start = self.r.position();

        let body = match name.as_str() {
            "ConstantValue" => AttributeBody::ConstantValue {
                constantvalue_index: self.u2cp(&mut node, "constantvalue_index")?,
            },
            "Code" => self.parse_code(&mut node)?,
            "Exceptions" => self.parse_exceptions(&mut node)?,
            "SourceFile" => AttributeBody::SourceFile {
                sourcefile_index: self.u2cp(&mut node, "sourcefile_index")?,
            },
            "LineNumberTable" => self.parse_line_number_table(&mut node)?,
            "LocalVariableTable" => self.parse_local_variable_table(&mut node)?,
            _ => AttributeBody::Opaque(self.info_bytes(&mut node, attribute_length as usize)?),
        };

        if self.r.position() - body_start != attribute_length as usize {
            return Err(ClassFileError::AttributeLengthMismatch(name));
        }

        node.finish(self.r.position());
        table.push(node);
        Ok(Attribute { name, body })
    }

    fn parse_code(&mut self, node: &mut Node) -> Result<AttributeBody> {
        let max_stack = self.u2(node, "max_stack")?;
        let max_locals = self.u2(node, "max_locals")?;
        let code_length = self.u4(node, "code_length")?;

        let code_start = self.r.position();
        let code_end = code_start + code_length as usize;
        let mut code = Node::branch("code", code_start);
        let mut instructions = Vec::new();
        while self.r.position() < code_end {
            let instruction = Instruction::decode(&mut self.r, &self.pool, code_start)?;
            let offset = code_start + instruction.pc as usize;
            code.push(Node::leaf(
                format!("{:04}", instruction.pc),
                instruction.describe(),
                offset,
                self.r.position() - offset,
                NodeValue::None,
            ));
            instructions.push(instruction);
        }
        // The attributes after the code bytes depend on exact accounting.
        if self.r.position() != code_end {
            return Err(ClassFileError::CodeOverrun(self.r.position()));
        }
        code.finish(self.r.position());
        node.push(code);

        let exception_table = self.parse_exception_table(node)?;
        let attributes = self.parse_attributes(node)?;

        Ok(AttributeBody::Code(CodeAttribute {
            max_stack,
            max_locals,
            instructions,
            exception_table,
            attributes,
        }))
    }

    fn parse_exception_table(&mut self, parent: &mut Node) -> Result<Vec<ExceptionTableEntry>> {
        let count = self.u2(parent, "exception_table_length")?;
        let mut table = Node::branch("exception_table", self.r.position());
        let entries = (0..count)
            .map(|i| {
                let mut node = Node::branch(format_index(count, i as usize), self.r.position());
                let start_pc = self.u2(&mut node, "start_pc")?;
                let end_pc = self.u2(&mut node, "end_pc")?;
                let handler_pc = self.u2(&mut node, "handler_pc")?;
                let catch_type = self.u2cp(&mut node, "catch_type")?;
                node.finish(self.r.position());
                table.push(node);
                Ok(ExceptionTableEntry {
                    start_pc,
                    end_pc,
                    handler_pc,
                    catch_type,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        table.finish(self.r.position());
        parent.push(table);
        Ok(entries)
    }

    fn parse_exceptions(&mut self, node: &mut Node) -> Result<AttributeBody> {
        let count = self.u2(node, "number_of_exceptions")?;
        let mut table = Node::branch("exception_index_table", self.r.position());
        let exception_index_table = (0..count)
            .map(|i| self.u2cp(&mut table, &format_index(count, i as usize)))
            .collect::<Result<Vec<_>>>()?;
        table.finish(self.r.position());
        node.push(table);
        Ok(AttributeBody::Exceptions {
            exception_index_table,
        })
    }

    fn parse_line_number_table(&mut self, node: &mut Node) -> Result<AttributeBody> {
        let count = self.u2(node, "line_number_table_length")?;
        let mut table = Node::branch("line_number_table", self.r.position());
        let entries = (0..count)
            .map(|i| {
                let mut entry = Node::branch(format_index(count, i as usize), self.r.position());
                let start_pc = self.u2(&mut entry, "start_pc")?;
                let line_number = self.u2(&mut entry, "line_number")?;
                entry.finish(self.r.position());
                table.push(entry);
                Ok(LineNumberEntry {
                    start_pc,
                    line_number,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        table.finish(self.r.position());
        node.push(table);
        Ok(AttributeBody::LineNumberTable(entries))
    }

    fn parse_local_variable_table(&mut self, node: &mut Node) -> Result<AttributeBody> {
        let count = self.u2(node, "local_variable_table_length")?;
        let mut table = Node::branch("local_variable_table", self.r.position());
        let entries = (0..count)
            .map(|i| {
                let mut entry = Node::branch(format_index(count, i as usize), self.r.position());
                let start_pc = self.u2(&mut entry, "start_pc")?;
                let length = self.u2(&mut entry, "length")?;
                let name_index = self.u2cp(&mut entry, "name_index")?;
                let descriptor_index = self.u2cp(&mut entry, "descriptor_index")?;
                let index = self.u2(&mut entry, "index")?;
                entry.finish(self.r.position());
                table.push(entry);
                Ok(LocalVariableEntry {
                    start_pc,
                    length,
                    name_index,
                    descriptor_index,
                    index,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        table.finish(self.r.position());
        node.push(table);
        Ok(AttributeBody::LocalVariableTable(entries))
    }

    // Post-read pass: rewrite the descriptions that need the whole pool.
    fn resolve_descriptions(&self, node: &mut Node) -> Result<()> {
        match node.value() {
            NodeValue::CpIndex(index) if index != 0 => {
                node.set_desc(format!("#{} -> {}", index, self.pool.resolve(index)?));
            }
            NodeValue::CpEntry(index) => {
                node.set_desc(self.pool.resolve(index)?);
            }
            _ => {}
        }
        for child in node.children_mut() {
            self.resolve_descriptions(child)?;
        }
        Ok(())
    }

    fn u1(&mut self, parent: &mut Node, name: &str) -> Result<u8> {
        let start = self.r.position();
        let value = self.r.read_u8()?;
        parent.push(Node::leaf(
            name,
            value.to_string(),
            start,
            1,
            NodeValue::UInt(value as u32),
        ));
        Ok(value)
    }

    fn u2(&mut self, parent: &mut Node, name: &str) -> Result<u16> {
        let start = self.r.position();
        let value = self.r.read_u16()?;
        parent.push(Node::leaf(
            name,
            value.to_string(),
            start,
            2,
            NodeValue::UInt(value as u32),
        ));
        Ok(value)
    }

    fn u4(&mut self, parent: &mut Node, name: &str) -> Result<u32> {
        let start = self.r.position();
        let value = self.r.read_u32()?;
        parent.push(Node::leaf(
            name,
            value.to_string(),
            start,
            4,
            NodeValue::UInt(value),
        ));
        Ok(value)
    }

    fn u2cp(&mut self, parent: &mut Node, name: &str) -> Result<u16> {
        let start = self.r.position();
        let value = self.r.read_u16()?;
        parent.push(Node::leaf(
            name,
            format!("#{value}"),
            start,
            2,
            NodeValue::CpIndex(value),
        ));
        Ok(value)
    }

    fn flags(&mut self, parent: &mut Node, name: &str) -> Result<AccessFlags> {
        let start = self.r.position();
        let bits = self.r.read_u16()?;
        let flags = AccessFlags::from_bits_truncate(bits);
        parent.push(Node::leaf(
            name,
            format!("{flags:?}"),
            start,
            2,
            NodeValue::Flags(bits),
        ));
        Ok(flags)
    }

    fn info_bytes(&mut self, parent: &mut Node, n: usize) -> Result<Vec<u8>> {
        let start = self.r.position();
        let bytes = self.r.read_bytes(n)?;
        parent.push(Node::leaf(
            "info",
            format!("({n} bytes)"),
            start,
            n,
            NodeValue::None,
        ));
        Ok(bytes)
    }
}
