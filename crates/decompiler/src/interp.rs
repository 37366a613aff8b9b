use classpeek_class_file::{
    attributes::CodeAttribute,
    instruction::{Instruction, Operand},
    AccessFlags, ClassFile, CpInfo, MethodInfo,
};

use crate::{
    descriptor::{parse_method_descriptor, simple_name, JavaType},
    DecompileError, Result,
};

/// Interpreter state for one method: an abstract operand stack of
/// expression fragments and the display names of local variable slots.
struct Frame {
    stack: Vec<String>,
    locals: Vec<String>,
}

impl Frame {
    fn pop(&mut self, mnemonic: &'static str) -> Result<String> {
        self.stack
            .pop()
            .ok_or(DecompileError::StackUnderflow(mnemonic))
    }

    fn local(&self, slot: usize) -> Result<&str> {
        match self.locals.get(slot) {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(DecompileError::UnknownLocal(slot)),
        }
    }

    fn set_local(&mut self, slot: usize, name: String) {
        if self.locals.len() <= slot {
            self.locals.resize(slot + 1, String::new());
        }
        self.locals[slot] = name;
    }
}

/// Reconstructs one method body as source statements via a single forward
/// pass over its decoded instructions. Anything outside the modeled
/// straight-line subset fails with `UnsupportedInstruction`; the caller
/// decides how to surface that.
pub fn decompile_method(class: &ClassFile, method: &MethodInfo) -> Result<Vec<String>> {
    let code = method.attributes.code().ok_or(DecompileError::MissingCode)?;
    let (_, return_type) = parse_method_descriptor(class.method_descriptor(method)?)?;
    let method_name = class.method_name(method)?;

    let mut frame = Frame {
        stack: Vec::new(),
        locals: seed_locals(class, method, code)?,
    };

    for instruction in &code.instructions {
        step(class, method_name, &return_type, &mut frame, instruction)?;
    }

    // Values never consumed by a later instruction are sequential
    // statements in straight-line code; emit them in push order.
    Ok(frame.stack.drain(..).map(|s| format!("{s};")).collect())
}

fn seed_locals(class: &ClassFile, method: &MethodInfo, code: &CodeAttribute) -> Result<Vec<String>> {
    let mut locals = vec![String::new(); code.max_locals as usize];

    if let Some(entries) = code.attributes.local_variable_table() {
        for entry in entries {
            let name = class.constant_pool.utf8(entry.name_index)?;
            if let Some(slot) = locals.get_mut(entry.index as usize) {
                *slot = name.to_owned();
            }
        }
        return Ok(locals);
    }

    // No debug info: degrade to synthesized parameter names.
    let mut slot = 0;
    if !method.access_flags.contains(AccessFlags::STATIC) {
        if let Some(name) = locals.get_mut(0) {
            *name = "this".to_owned();
        }
        slot = 1;
    }
    let (params, _) = parse_method_descriptor(class.method_descriptor(method)?)?;
    for (i, param) in params.iter().enumerate() {
        if let Some(name) = locals.get_mut(slot) {
            *name = format!("arg{i}");
        }
        slot += param.slot_width();
    }
    Ok(locals)
}

fn step(
    class: &ClassFile,
    method_name: &str,
    return_type: &JavaType,
    frame: &mut Frame,
    instruction: &Instruction,
) -> Result<()> {
    let mnemonic = instruction.mnemonic;
    match instruction.opcode {
        // iconst_m1 .. iconst_5
        0x02..=0x08 => frame.stack.push((instruction.opcode as i32 - 0x03).to_string()),
        // ldc
        0x12 => {
            let index = cp_operand(instruction)?;
            let resolved = match &instruction.cp_desc {
                Some(desc) => desc.clone(),
                None => return Err(DecompileError::UnsupportedInstruction(mnemonic)),
            };
            let literal = match class.constant_pool.get(index)? {
                CpInfo::String { .. } => format!("\"{resolved}\""),
                _ => resolved,
            };
            frame.stack.push(literal);
        }
        // iload / aload with an explicit slot operand
        0x15 | 0x19 => {
            let value = frame.local(local_operand(instruction)?)?.to_owned();
            frame.stack.push(value);
        }
        // iload_0 .. iload_3
        0x1a..=0x1d => {
            let value = frame.local((instruction.opcode - 0x1a) as usize)?.to_owned();
            frame.stack.push(value);
        }
        // aload_0 .. aload_3
        0x2a..=0x2d => {
            let value = frame.local((instruction.opcode - 0x2a) as usize)?.to_owned();
            frame.stack.push(value);
        }
        // astore
        0x3a => declare_local(frame, mnemonic, local_operand(instruction)?)?,
        // astore_0 .. astore_3
        0x4b..=0x4e => declare_local(frame, mnemonic, (instruction.opcode - 0x4b) as usize)?,
        // Stack duplication is intentionally not modeled; constructor-then-use
        // patterns may misrender.
        0x59 => {}
        // iadd, isub, imul, idiv, irem, iand
        0x60 | 0x64 | 0x68 | 0x6c | 0x70 | 0x7e => {
            let op = match instruction.opcode {
                0x60 => "+",
                0x64 => "-",
                0x68 => "*",
                0x6c => "/",
                0x70 => "%",
                _ => "&",
            };
            let right = frame.pop(mnemonic)?;
            let left = frame.pop(mnemonic)?;
            frame.stack.push(format!("{left}{op}{right}"));
        }
        // ireturn, areturn, return
        0xac | 0xb0 | 0xb1 => {
            if !return_type.is_void() {
                let value = frame.pop(mnemonic)?;
                frame.stack.push(format!("return {value}"));
            }
        }
        // getstatic: the member's simple name stands in for its value.
        0xb2 => {
            let (_owner, name, _descriptor) =
                class.constant_pool.member_ref(cp_operand(instruction)?)?;
            frame.stack.push(name.to_owned());
        }
        // invokevirtual
        0xb6 => {
            let (_owner, name, descriptor) =
                class.constant_pool.member_ref(cp_operand(instruction)?)?;
            let args = pop_args(frame, mnemonic, descriptor)?;
            let receiver = frame.pop(mnemonic)?;
            frame
                .stack
                .push(format!("{receiver}.{name}({})", args.join(",")));
        }
        // invokespecial: a super() chain inside <init>, a constructor call
        // everywhere else.
        0xb7 => {
            let (_owner, _name, descriptor) =
                class.constant_pool.member_ref(cp_operand(instruction)?)?;
            let args = pop_args(frame, mnemonic, descriptor)?;
            let receiver = frame.pop(mnemonic)?;
            let call = if method_name == "<init>" && receiver == "this" {
                format!("super({})", args.join(","))
            } else {
                format!("new {receiver}({})", args.join(","))
            };
            frame.stack.push(call);
        }
        // new: the resolved class stands on the stack by its simple name
        // until invokespecial turns it into a constructor call.
        0xbb => {
            let class_name = class.constant_pool.class_name(cp_operand(instruction)?)?;
            frame.stack.push(simple_name(class_name).to_owned());
        }
        _ => return Err(DecompileError::UnsupportedInstruction(mnemonic)),
    }
    Ok(())
}

fn cp_operand(instruction: &Instruction) -> Result<u16> {
    match instruction.operand {
        Operand::Cp(index) => Ok(index),
        _ => Err(DecompileError::UnsupportedInstruction(instruction.mnemonic)),
    }
}

fn local_operand(instruction: &Instruction) -> Result<usize> {
    match instruction.operand {
        Operand::Local(slot) => Ok(slot as usize),
        _ => Err(DecompileError::UnsupportedInstruction(instruction.mnemonic)),
    }
}

fn declare_local(frame: &mut Frame, mnemonic: &'static str, slot: usize) -> Result<()> {
    let value = frame.pop(mnemonic)?;
    let ty = frame.pop(mnemonic)?;
    let name = format!("localVar{slot}");
    frame.stack.push(format!("{ty} {name} = {value}"));
    frame.set_local(slot, name);
    Ok(())
}

fn pop_args(frame: &mut Frame, mnemonic: &'static str, descriptor: &str) -> Result<Vec<String>> {
    let (params, _) = parse_method_descriptor(descriptor)?;
    let mut args = vec![String::new(); params.len()];
    for arg in args.iter_mut().rev() {
        *arg = frame.pop(mnemonic)?;
    }
    Ok(args)
}
