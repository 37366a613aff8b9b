//! Decompiler tests over a synthetic class file equivalent to:
//!
//! ```java
//! package my;
//! public class Greeter {
//!     Greeter() { super(); }
//!     public int add(int a, int b) { return a + b; }
//!     public static void greet() { System.out.println("hello"); }
//!     public void loop() { while (true) {} }
//! }
//! ```
//!
//! The last method exists to prove that an unsupported opcode fails that
//! method alone while the rest of the class keeps working.

use classpeek_class_file::ClassFile;
use classpeek_decompiler::{decompile_method, generate_java, DecompileError};

struct ClassBytes(Vec<u8>);

impl ClassBytes {
    fn u1(&mut self, v: u8) -> &mut Self {
        self.0.push(v);
        self
    }

    fn u2(&mut self, v: u16) -> &mut Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn u4(&mut self, v: u32) -> &mut Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn bytes(&mut self, v: &[u8]) -> &mut Self {
        self.0.extend_from_slice(v);
        self
    }

    fn utf8(&mut self, s: &str) -> &mut Self {
        self.u1(1).u2(s.len() as u16).bytes(s.as_bytes())
    }
}

fn greeter_bytes() -> Vec<u8> {
    let mut b = ClassBytes(Vec::new());
    b.u4(0xCAFEBABE).u2(0).u2(52);

    b.u2(33); // constant_pool_count
    b.utf8("my/Greeter"); // #1
    b.u1(7).u2(1); // #2 Class
    b.utf8("java/lang/Object"); // #3
    b.u1(7).u2(3); // #4 Class
    b.utf8("<init>"); // #5
    b.utf8("()V"); // #6
    b.u1(12).u2(5).u2(6); // #7 NameAndType <init>:()V
    b.u1(10).u2(4).u2(7); // #8 Methodref java/lang/Object.<init>:()V
    b.utf8("Code"); // #9
    b.utf8("add"); // #10
    b.utf8("(II)I"); // #11
    b.utf8("LocalVariableTable"); // #12
    b.utf8("this"); // #13
    b.utf8("Lmy/Greeter;"); // #14
    b.utf8("a"); // #15
    b.utf8("b"); // #16
    b.utf8("greet"); // #17
    b.utf8("java/lang/System"); // #18
    b.u1(7).u2(18); // #19 Class
    b.utf8("out"); // #20
    b.utf8("Ljava/io/PrintStream;"); // #21
    b.u1(12).u2(20).u2(21); // #22 NameAndType out:Ljava/io/PrintStream;
    b.u1(9).u2(19).u2(22); // #23 Fieldref java/lang/System.out
    b.utf8("java/io/PrintStream"); // #24
    b.u1(7).u2(24); // #25 Class
    b.utf8("println"); // #26
    b.utf8("(Ljava/lang/String;)V"); // #27
    b.u1(12).u2(26).u2(27); // #28 NameAndType println:(Ljava/lang/String;)V
    b.u1(10).u2(25).u2(28); // #29 Methodref java/io/PrintStream.println
    b.utf8("hello"); // #30
    b.u1(8).u2(30); // #31 String "hello"
    b.utf8("loop"); // #32

    b.u2(0x0021); // access_flags: PUBLIC | SUPER
    b.u2(2).u2(4); // this_class, super_class
    b.u2(0); // interfaces_count
    b.u2(0); // fields_count

    b.u2(4); // methods_count

    // Greeter() { super(); }
    b.u2(0x0000).u2(5).u2(6);
    b.u2(1);
    b.u2(9).u4(17); // Code
    b.u2(1).u2(1);
    b.u4(5);
    b.u1(0x2a); // aload_0
    b.u1(0xb7).u2(8); // invokespecial #8
    b.u1(0xb1); // return
    b.u2(0);
    b.u2(0);

    // public int add(int a, int b) { return a + b; }
    b.u2(0x0001).u2(10).u2(11);
    b.u2(1);
    b.u2(9).u4(54); // Code
    b.u2(2).u2(3);
    b.u4(4);
    b.u1(0x1b).u1(0x1c); // iload_1, iload_2
    b.u1(0x60).u1(0xac); // iadd, ireturn
    b.u2(0);
    b.u2(1);
    b.u2(12).u4(32); // LocalVariableTable
    b.u2(3);
    b.u2(0).u2(4).u2(13).u2(14).u2(0); // this
    b.u2(0).u2(4).u2(15).u2(11).u2(1); // a
    b.u2(0).u2(4).u2(16).u2(11).u2(2); // b

    // public static void greet() { System.out.println("hello"); }
    b.u2(0x0009).u2(17).u2(6);
    b.u2(1);
    b.u2(9).u4(21); // Code
    b.u2(2).u2(0);
    b.u4(9);
    b.u1(0xb2).u2(23); // getstatic #23
    b.u1(0x12).u1(31); // ldc #31
    b.u1(0xb6).u2(29); // invokevirtual #29
    b.u1(0xb1); // return
    b.u2(0);
    b.u2(0);

    // public void loop() -- a branch the decompiler refuses to model.
    b.u2(0x0001).u2(32).u2(6);
    b.u2(1);
    b.u2(9).u4(16); // Code
    b.u2(0).u2(1);
    b.u4(4);
    b.u1(0xa7).u2(0); // goto
    b.u1(0xb1); // return
    b.u2(0);
    b.u2(0);

    b.u2(0); // class attributes_count

    b.0
}

fn with_class_file(f: impl FnOnce(ClassFile)) {
    f(ClassFile::parse(&greeter_bytes()).unwrap());
}

#[test]
fn test_add_method_body() {
    with_class_file(|class_file| {
        assert_eq!(
            vec!["return a+b;"],
            decompile_method(&class_file, &class_file.methods[1]).unwrap()
        )
    });
}

#[test]
fn test_constructor_renders_a_super_call() {
    with_class_file(|class_file| {
        assert_eq!(
            vec!["super();"],
            decompile_method(&class_file, &class_file.methods[0]).unwrap()
        )
    });
}

#[test]
fn test_static_member_call_statement() {
    with_class_file(|class_file| {
        assert_eq!(
            vec!["out.println(\"hello\");"],
            decompile_method(&class_file, &class_file.methods[2]).unwrap()
        )
    });
}

#[test]
fn test_unsupported_instruction_names_the_opcode() {
    with_class_file(|class_file| {
        match decompile_method(&class_file, &class_file.methods[3]) {
            Err(DecompileError::UnsupportedInstruction(mnemonic)) => {
                assert_eq!("goto", mnemonic)
            }
            other => panic!("expected UnsupportedInstruction, got {other:?}"),
        }
    });
}

#[test]
fn test_one_failing_method_does_not_affect_the_others() {
    with_class_file(|class_file| {
        assert!(decompile_method(&class_file, &class_file.methods[3]).is_err());
        assert!(decompile_method(&class_file, &class_file.methods[1]).is_ok());
        assert!(decompile_method(&class_file, &class_file.methods[2]).is_ok());
    });
}

#[test]
fn test_generate_java() {
    with_class_file(|class_file| {
        let source = generate_java(&class_file).unwrap();
        assert!(source.starts_with("package my;\n"));
        assert!(source.contains("import java.io.PrintStream;\n"));
        assert!(source.contains("public class Greeter {\n"));
        assert!(source.contains("public int add(int a, int b) {"));
        assert!(source.contains("        return a+b;\n"));
        assert!(source.contains("public static void greet() {"));
        assert!(source.contains("        out.println(\"hello\");\n"));
        assert!(source.contains("// decompilation unavailable"));
        assert!(source.ends_with("}\n"));
    });
}
