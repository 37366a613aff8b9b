use classpeek_class_file::{AccessFlags, ClassFile, CpInfo, MethodInfo};

use crate::{
    descriptor::{parse_method_descriptor, simple_name, JavaType},
    interp::decompile_method,
    Result,
};

/// Renders the whole class as best-effort Java source. A method whose body
/// cannot be reconstructed keeps its head and carries a marker comment, so
/// one unsupported method never hides the rest of the class.
pub fn generate_java(class: &ClassFile) -> Result<String> {
    let mut out = String::new();
    if let Some(package) = generate_package(class)? {
        out.push_str(&package);
    }
    out.push_str(&generate_imports(class)?);
    out.push_str(&generate_class_head(class)?);
    out.push('\n');
    for method in &class.methods {
        out.push_str(&generate_method(class, method)?);
    }
    out.push_str("}\n");
    Ok(out)
}

fn generate_package(class: &ClassFile) -> Result<Option<String>> {
    let binary_name = class.class_name()?;
    Ok(binary_name
        .rsplit_once('/')
        .map(|(package, _)| format!("package {};\n", package.replace('/', "."))))
}

fn generate_imports(class: &ClassFile) -> Result<String> {
    let this_class = class.class_name()?.to_owned();
    let mut imports = String::new();
    for cp_info in &class.constant_pool {
        let CpInfo::Class(info) = cp_info else {
            continue;
        };
        let name = class.constant_pool.utf8(info.name_index)?;
        if name == this_class || name.starts_with("java/lang/") || name.starts_with('[') {
            continue;
        }
        imports.push_str(&format!("import {};\n", name.replace('/', ".")));
    }
    Ok(imports)
}

fn generate_class_head(class: &ClassFile) -> Result<String> {
    let mut head = String::new();
    let flags = class.access_flags;
    if flags.contains(AccessFlags::PUBLIC) {
        head.push_str("public ");
    }
    if flags.contains(AccessFlags::ABSTRACT) && !flags.contains(AccessFlags::INTERFACE) {
        head.push_str("abstract ");
    }
    if flags.contains(AccessFlags::FINAL) {
        head.push_str("final ");
    }
    head.push_str(if flags.contains(AccessFlags::INTERFACE) {
        "interface "
    } else {
        "class "
    });
    head.push_str(simple_name(class.class_name()?));

    if let Some(super_name) = class.super_class_name()? {
        if super_name != "java/lang/Object" {
            head.push_str(" extends ");
            head.push_str(simple_name(super_name));
        }
    }

    if !class.interfaces.is_empty() {
        head.push_str(" implements ");
        let names = class
            .interfaces
            .iter()
            .map(|&index| {
                Ok(simple_name(class.constant_pool.class_name(index)?).to_owned())
            })
            .collect::<Result<Vec<_>>>()?;
        head.push_str(&names.join(", "));
    }

    head.push_str(" {\n");
    Ok(head)
}

fn generate_method(class: &ClassFile, method: &MethodInfo) -> Result<String> {
    let name = class.method_name(method)?;
    // The constructor body is the class-initialization chain, which is not
    // reconstructed.
    if name == "<init>" {
        return Ok(String::new());
    }

    let mut out = String::new();
    out.push_str("    ");
    out.push_str(&generate_method_head(class, method)?);

    if method.access_flags.contains(AccessFlags::ABSTRACT) || method.attributes.code().is_none() {
        out.push_str(";\n\n");
        return Ok(out);
    }

    out.push_str(" {\n");
    match decompile_method(class, method) {
        Ok(statements) => {
            for statement in statements {
                out.push_str("        ");
                out.push_str(&statement);
                out.push('\n');
            }
        }
        Err(e) => {
            log::warn!("decompilation unavailable for {name}: {e}");
            out.push_str(&format!("        // decompilation unavailable: {e}\n"));
        }
    }
    out.push_str("    }\n\n");
    Ok(out)
}

fn generate_method_head(class: &ClassFile, method: &MethodInfo) -> Result<String> {
    let mut head = String::new();
    let flags = method.access_flags;
    if flags.contains(AccessFlags::PUBLIC) {
        head.push_str("public ");
    } else if flags.contains(AccessFlags::PRIVATE) {
        head.push_str("private ");
    } else if flags.contains(AccessFlags::PROTECTED) {
        head.push_str("protected ");
    }
    if flags.contains(AccessFlags::ABSTRACT) {
        head.push_str("abstract ");
    }
    if flags.contains(AccessFlags::STATIC) {
        head.push_str("static ");
    }
    if flags.contains(AccessFlags::FINAL) {
        head.push_str("final ");
    }

    let (params, return_type) = parse_method_descriptor(class.method_descriptor(method)?)?;
    head.push_str(&return_type.to_string());
    head.push(' ');
    head.push_str(class.method_name(method)?);
    head.push('(');
    let names = parameter_names(class, method, &params)?;
    let rendered = params
        .iter()
        .zip(&names)
        .map(|(ty, name)| format!("{ty} {name}"))
        .collect::<Vec<_>>();
    head.push_str(&rendered.join(", "));
    head.push(')');

    if let Some(table) = method.attributes.exceptions() {
        if !table.is_empty() {
            head.push_str(" throws ");
            let names = table
                .iter()
                .map(|&index| {
                    Ok(simple_name(class.constant_pool.class_name(index)?).to_owned())
                })
                .collect::<Result<Vec<_>>>()?;
            head.push_str(&names.join(", "));
        }
    }
    Ok(head)
}

// Parameters occupy the leading local variable slots; their debug names
// come from the LocalVariableTable when the class was compiled with one.
fn parameter_names(
    class: &ClassFile,
    method: &MethodInfo,
    params: &[JavaType],
) -> Result<Vec<String>> {
    let mut names: Vec<String> = Vec::with_capacity(params.len());

    if let Some(entries) = method
        .attributes
        .code()
        .and_then(|code| code.attributes.local_variable_table())
    {
        let mut by_slot = entries
            .iter()
            .map(|e| Ok((e.index, class.constant_pool.utf8(e.name_index)?)))
            .collect::<Result<Vec<(u16, &str)>>>()?;
        by_slot.sort_by_key(|&(slot, _)| slot);
        names.extend(
            by_slot
                .into_iter()
                .filter(|&(_, name)| name != "this")
                .take(params.len())
                .map(|(_, name)| name.to_owned()),
        );
    }

    for i in names.len()..params.len() {
        names.push(format!("arg{i}"));
    }
    Ok(names)
}
