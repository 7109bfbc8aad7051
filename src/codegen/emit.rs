//! C text emission
//!
//! A single pass over the Target IR with a tracked indentation level. Output
//! order is fixed: includes, file-scope declarations, prototypes, routine
//! bodies, then `main`.
//!
//! # Conventions
//!
//! - every binary operation is wrapped in parentheses, whatever its operator,
//!   so `if` and `while` conditions read `if ((a < b))`
//! - a by-reference argument is a pointer and each use of it is `*name`
//! - a function's result lives in a local, named during lowering, that is
//!   returned at the end
//! - identifiers that collide with C keywords or the C library names the
//!   output relies on get a trailing `_`

use crate::lowering::ir::{
    Arg, Argument, Block, CType, Declarations, Expr, Routine, Stmt, Subscript, TargetProgram, Var,
};
use std::borrow::Cow;
use std::fmt::Write as _;

const INDENT: &str = "    ";

/// C keywords plus the library functions the generated code calls.
const RESERVED: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while", "main", "printf", "scanf", "exit",
];

/// Render a lowered program as C99 source text.
pub fn generate(program: &TargetProgram) -> String {
    let mut emitter = Emitter::default();
    emitter.emit_program(program);
    log::debug!("generated {} bytes of C", emitter.out.len());
    emitter.out
}

/// `name`, renamed if it would clash with C.
pub fn c_identifier(name: &str) -> Cow<'_, str> {
    if RESERVED.contains(&name) {
        Cow::Owned(format!("{}_", name))
    } else {
        Cow::Borrowed(name)
    }
}

/// Quote `text` as a C string literal. Non-ASCII text becomes octal escapes
/// of its UTF-8 bytes.
pub fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_ascii_control() => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            c if !c.is_ascii() => {
                let mut bytes = [0; 4];
                for byte in c.encode_utf8(&mut bytes).bytes() {
                    let _ = write!(out, "\\{:03o}", byte);
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn char_literal(c: char) -> String {
    match c {
        '\'' => "'\\''".to_string(),
        '\\' => "'\\\\'".to_string(),
        '\n' => "'\\n'".to_string(),
        '\t' => "'\\t'".to_string(),
        c if c.is_ascii_control() => format!("'\\{:03o}'", c as u32),
        c => format!("'{}'", c),
    }
}

#[derive(Default)]
struct Emitter {
    out: String,
    indent: usize,
}

impl Emitter {
    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn emit_program(&mut self, program: &TargetProgram) {
        self.line("#include <stdio.h>");
        if program.uses_exit {
            self.line("#include <stdlib.h>");
        }
        self.blank();

        if !program.globals.is_empty() {
            self.emit_declarations(&program.globals);
            self.blank();
        }

        if !program.routines.is_empty() {
            for routine in &program.routines {
                let prototype = format!("{};", signature(routine));
                self.line(&prototype);
            }
            self.blank();
            for routine in &program.routines {
                self.emit_routine(routine);
                self.blank();
            }
        }

        self.line("int main() {");
        self.indent += 1;
        self.emit_block(&program.main);
        self.line("return 0;");
        self.indent -= 1;
        self.line("}");
    }

    fn emit_routine(&mut self, routine: &Routine) {
        self.line(&format!("{} {{", signature(routine)));
        self.indent += 1;
        match routine {
            Routine::Function {
                result,
                return_type,
                body,
                ..
            } => {
                self.line(&format!("{} {};", return_type.name(), result));
                self.emit_block(body);
                self.line(&format!("return {};", result));
            }
            Routine::Subprogram { body, .. } => self.emit_block(body),
        }
        self.indent -= 1;
        self.line("}");
    }

    fn emit_block(&mut self, block: &Block) {
        self.emit_declarations(&block.declarations);
        for statement in &block.statements {
            self.emit_statement(statement);
        }
    }

    fn emit_declarations(&mut self, declarations: &Declarations) {
        for constant in &declarations.constants {
            let name = c_identifier(&constant.name);
            let value = expr(&constant.value);
            let text = match constant.ty {
                CType::Str => format!("const char *{} = {};", name, value),
                ty => format!("const {} {} = {};", ty.name(), name, value),
            };
            self.line(&text);
        }
        for scalar in &declarations.scalars {
            self.line(&format!(
                "{} {};",
                scalar.ty.name(),
                c_identifier(&scalar.name)
            ));
        }
        for array in &declarations.arrays {
            let mut text = format!("{} {}", array.ty.name(), c_identifier(&array.name));
            for dim in &array.dims {
                let _ = write!(text, "[{}]", dim);
            }
            text.push(';');
            self.line(&text);
        }
    }

    fn emit_body(&mut self, statement: &Stmt) {
        self.indent += 1;
        self.emit_statement(statement);
        self.indent -= 1;
    }

    fn emit_statement(&mut self, statement: &Stmt) {
        match statement {
            Stmt::Assign { target, value } => {
                self.line(&format!("{} = {};", expr(target), expr(value)));
            }

            Stmt::Call { name, args } => {
                self.line(&format!("{}({});", c_identifier(name), arg_list(args)));
            }

            Stmt::Compound(statements) => {
                for statement in statements {
                    self.emit_statement(statement);
                }
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.line(&format!("if ({}) {{", expr(condition)));
                self.emit_body(then_branch);
                match else_branch {
                    Some(else_branch) => {
                        self.line("} else {");
                        self.emit_body(else_branch);
                        self.line("}");
                    }
                    None => self.line("}"),
                }
            }

            Stmt::For {
                var,
                start,
                end,
                downward,
                body,
            } => {
                let name = var_ref(var);
                let (compare, step) = if *downward { (">=", "--") } else { ("<=", "++") };
                let counter = if var.is_reference {
                    format!("({}){}", name, step)
                } else {
                    format!("{}{}", name, step)
                };
                self.line(&format!(
                    "for ({name} = {}; {name} {compare} {}; {counter}) {{",
                    expr(start),
                    expr(end),
                ));
                self.emit_body(body);
                self.line("}");
            }

            Stmt::While { condition, body } => {
                self.line(&format!("while ({}) {{", expr(condition)));
                self.emit_body(body);
                self.line("}");
            }

            Stmt::Write { format, args } => {
                let mut text = format!("printf({}", string_literal(format));
                for arg in args {
                    let _ = write!(text, ", {}", expr(arg));
                }
                text.push_str(");");
                self.line(&text);
            }

            Stmt::Read { format, args } => {
                let mut text = format!("scanf({}", string_literal(format));
                for arg in args {
                    let _ = write!(text, ", {}", address_of(arg));
                }
                text.push_str(");");
                self.line(&text);
            }

            Stmt::Return(Some(var)) => self.line(&format!("return {};", var_ref(var))),
            Stmt::Return(None) => self.line("return;"),
            Stmt::Exit => self.line("exit(0);"),
        }
    }
}

/// `int f(int n, double *x)`, or `void p(void)` without arguments.
fn signature(routine: &Routine) -> String {
    let return_type = match routine {
        Routine::Function { return_type, .. } => *return_type,
        Routine::Subprogram { .. } => CType::Void,
    };
    format!(
        "{} {}({})",
        return_type.name(),
        c_identifier(routine.name()),
        parameter_list(routine.arguments())
    )
}

fn parameter_list(arguments: &[Argument]) -> String {
    if arguments.is_empty() {
        return "void".to_string();
    }
    arguments
        .iter()
        .map(|argument| {
            let pointer = if argument.is_reference { "*" } else { "" };
            format!(
                "{} {}{}",
                argument.ty.name(),
                pointer,
                c_identifier(&argument.name)
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn arg_list(args: &[Arg]) -> String {
    args.iter()
        .map(|arg| {
            if arg.by_reference {
                address_of(&arg.expr)
            } else {
                expr(&arg.expr)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Use of a variable as a value.
fn var_ref(var: &Var) -> String {
    if var.is_return_slot {
        var.name.clone()
    } else if var.is_reference {
        format!("*{}", c_identifier(&var.name))
    } else {
        c_identifier(&var.name).into_owned()
    }
}

/// Pointer to an lvalue; a reference parameter already is one.
fn address_of(target: &Expr) -> String {
    match target {
        Expr::Var(var) if var.is_reference && !var.is_return_slot => {
            c_identifier(&var.name).into_owned()
        }
        Expr::Var(_) | Expr::Index { .. } => format!("&{}", expr(target)),
        other => expr(other),
    }
}

fn subscript(subscript: &Subscript) -> String {
    let index = expr(&subscript.index);
    match subscript.lower {
        0 => format!("[{}]", index),
        lower if lower > 0 => format!("[{} - {}]", index, lower),
        lower => format!("[{} + {}]", index, lower.unsigned_abs()),
    }
}

fn expr(e: &Expr) -> String {
    match e {
        Expr::Int(value) => value.to_string(),
        Expr::Real(value) => format!("{:?}", value),
        Expr::Char(c) => char_literal(*c),
        Expr::Str(text) => string_literal(text),
        Expr::Var(var) => var_ref(var),
        Expr::Index { var, subscripts } => {
            let mut text = var_ref(var);
            for s in subscripts {
                text.push_str(&subscript(s));
            }
            text
        }
        Expr::Call { name, args } => format!("{}({})", c_identifier(name), arg_list(args)),
        Expr::Binary { op, left, right } => format!("({} {} {})", expr(left), op, expr(right)),
        Expr::Unary { op, operand } => format!("({}{})", op, expr(operand)),
        Expr::Cast { ty, expr: inner } => format!("({}){}", ty.name(), expr(inner)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lowering::ir::Scalar;

    fn reference(name: &str) -> Var {
        Var {
            name: name.to_string(),
            is_reference: true,
            is_return_slot: false,
        }
    }

    #[test]
    fn test_binary_is_fully_parenthesized() {
        let e = Expr::Binary {
            op: "*",
            left: Box::new(Expr::Binary {
                op: "+",
                left: Box::new(Expr::Int(1)),
                right: Box::new(Expr::Int(2)),
            }),
            right: Box::new(Expr::Unary {
                op: "-",
                operand: Box::new(Expr::Var(Var::plain("x"))),
            }),
        };
        assert_eq!(expr(&e), "((1 + 2) * (-x))");
    }

    #[test]
    fn test_reference_uses_and_addresses() {
        assert_eq!(expr(&Expr::Var(reference("p"))), "*p");
        assert_eq!(address_of(&Expr::Var(reference("p"))), "p");
        assert_eq!(address_of(&Expr::Var(Var::plain("x"))), "&x");
    }

    #[test]
    fn test_subscripts_are_rebased() {
        let e = Expr::Index {
            var: Var::plain("a"),
            subscripts: vec![
                Subscript {
                    index: Expr::Var(Var::plain("i")),
                    lower: 1,
                },
                Subscript {
                    index: Expr::Var(Var::plain("j")),
                    lower: -2,
                },
                Subscript {
                    index: Expr::Int(4),
                    lower: 0,
                },
            ],
        };
        assert_eq!(expr(&e), "a[i - 1][j + 2][4]");
    }

    #[test]
    fn test_literals() {
        assert_eq!(expr(&Expr::Real(2.0)), "2.0");
        assert_eq!(expr(&Expr::Real(0.25)), "0.25");
        assert_eq!(expr(&Expr::Char('\'')), "'\\''");
        assert_eq!(string_literal("say \"hi\"\n"), "\"say \\\"hi\\\"\\n\"");
        assert_eq!(string_literal("café 1"), "\"caf\\303\\251 1\"");
        assert_eq!(expr(&Expr::Char('\x7f')), "'\\177'");
    }

    #[test]
    fn test_reserved_names_are_renamed() {
        assert_eq!(c_identifier("int"), "int_");
        assert_eq!(c_identifier("total"), "total");
    }

    #[test]
    fn test_reference_loop_counter() {
        let mut emitter = Emitter::default();
        emitter.emit_statement(&Stmt::For {
            var: reference("n"),
            start: Expr::Int(10),
            end: Expr::Int(1),
            downward: true,
            body: Box::new(Stmt::Compound(Vec::new())),
        });
        assert_eq!(emitter.out, "for (*n = 10; *n >= 1; (*n)--) {\n}\n");
    }

    #[test]
    fn test_function_layout() {
        let program = TargetProgram {
            name: "p".into(),
            globals: Declarations::default(),
            routines: vec![Routine::Function {
                name: "f".into(),
                result: "ret_f".into(),
                return_type: CType::Int,
                arguments: vec![Argument {
                    name: "n".into(),
                    ty: CType::Int,
                    is_reference: true,
                }],
                body: Block {
                    declarations: Declarations {
                        scalars: vec![Scalar {
                            name: "t".into(),
                            ty: CType::Double,
                        }],
                        ..Declarations::default()
                    },
                    statements: vec![Stmt::Assign {
                        target: Expr::Var(Var {
                            name: "ret_f".into(),
                            is_reference: false,
                            is_return_slot: true,
                        }),
                        value: Expr::Var(reference("n")),
                    }],
                },
            }],
            main: Block {
                declarations: Declarations::default(),
                statements: Vec::new(),
            },
            uses_exit: false,
        };

        let expected = "#include <stdio.h>\n\
                        \n\
                        int f(int *n);\n\
                        \n\
                        int f(int *n) {\n\
                        \x20   int ret_f;\n\
                        \x20   double t;\n\
                        \x20   ret_f = *n;\n\
                        \x20   return ret_f;\n\
                        }\n\
                        \n\
                        int main() {\n\
                        \x20   return 0;\n\
                        }\n";
        assert_eq!(generate(&program), expected);
    }
}
