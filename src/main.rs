use std::{env, fs, process};

use classpeek_class_file::{ClassFile, Node};
use classpeek_decompiler::generate_java;

fn main() {
    pretty_env_logger::init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: classpeek <file.class> [--java]");
        process::exit(2);
    };
    let java = args.next().as_deref() == Some("--java");

    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("{path}: {e}");
            process::exit(1);
        }
    };

    let class_file = match ClassFile::parse(&bytes) {
        Ok(class_file) => class_file,
        Err(e) => {
            eprintln!("{path}: {e}");
            process::exit(1);
        }
    };
    log::debug!(
        "{path}: {} constant pool slots, {} methods",
        class_file.constant_pool.count(),
        class_file.methods.len()
    );

    if java {
        match generate_java(&class_file) {
            Ok(source) => print!("{source}"),
            Err(e) => {
                eprintln!("{path}: {e}");
                process::exit(1);
            }
        }
    } else {
        print_node(class_file.node(), 0);
    }
}

fn print_node(node: &Node, depth: usize) {
    let end = node.offset() + node.length();
    let indent = "  ".repeat(depth);
    if node.desc().is_empty() {
        println!("[{:06}..{:06}] {}{}", node.offset(), end, indent, node.name());
    } else {
        println!(
            "[{:06}..{:06}] {}{}: {}",
            node.offset(),
            end,
            indent,
            node.name(),
            node.desc()
        );
    }
    for child in node.children() {
        print_node(child, depth + 1);
    }
}
