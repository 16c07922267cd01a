//! Statement lowering
//!
//! # Control Flow
//!
//! `if` and `while` each draw from their own label counter:
//!
//! ```text
//!     <branch to elseN if test fails>         whileN:
//!     <then branch>                               <branch to endWhileN if test fails>
//!     j endIfN                                    <body>
//! elseN:                                          j whileN
//!     <else branch>                           endWhileN:
//! endIfN:
//! ```
//!
//! A test whose top operator is a comparison branches on the inverted
//! comparison directly. Any other test is evaluated to a value and compared
//! against 1.
//!
//! # I/O
//!
//! `read` and `write` use the SPIM syscalls for integers and single-precision
//! reals. Every `write` is followed by a newline.

use crate::codegen::constants::*;
use crate::codegen::engine::Generator;
use crate::codegen::expressions::branch_mnemonic;
use crate::parser::ast::*;

impl Generator<'_> {
    pub(crate) fn emit_compound(&mut self, compound: &CompoundStatement) {
        for statement in &compound.statements {
            self.emit_statement(statement);
        }
    }

    /// Lower one statement. The register cursor is unchanged afterwards.
    pub fn emit_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Assignment { target, value } => {
                self.emit_expression(value);
                let source = self.register(self.cursor);
                self.emit_convert(source, value.value_type(), target.value_type());
                self.emit_store(target, source);
            }
            Statement::Compound(compound) => self.emit_compound(compound),
            Statement::If {
                test,
                then_branch,
                else_branch,
            } => self.emit_if(test, then_branch, else_branch),
            Statement::While { test, body } => self.emit_while(test, body),
            Statement::ProcedureCall { name, args } => {
                self.emit_call(name, args);
            }
            Statement::Read { target } => self.emit_read(target),
            Statement::Write { data } => self.emit_write(data),
        }
    }

    fn emit_if(&mut self, test: &Expression, then_branch: &Statement, else_branch: &Statement) {
        let number = self.if_labels;
        self.if_labels += 1;
        let else_label = format!("else{}", number);
        let end_label = format!("endIf{}", number);

        self.emit_branch_unless(test, &else_label);
        self.emit_statement(then_branch);
        self.emit(format!("j {}", end_label));
        self.emit_label(&else_label);
        self.emit_statement(else_branch);
        self.emit_label(&end_label);
    }

    fn emit_while(&mut self, test: &Expression, body: &Statement) {
        let number = self.while_labels;
        self.while_labels += 1;
        let top_label = format!("while{}", number);
        let end_label = format!("endWhile{}", number);

        self.emit_label(&top_label);
        self.emit_branch_unless(test, &end_label);
        self.emit_statement(body);
        self.emit(format!("j {}", top_label));
        self.emit_label(&end_label);
    }

    /// Jump to `label` when `test` does not hold.
    fn emit_branch_unless(&mut self, test: &Expression, label: &str) {
        if let Expression::Operation { op, left, right, .. } = test {
            if let Some(inverse) = op.negated() {
                let base = self.cursor;
                self.cursor += 1;
                self.emit_expression(left);
                self.cursor += 1;
                self.emit_expression(right);
                self.cursor -= 2;

                let a = self.register(base + 1);
                let b = self.register(base + 2);
                let (left_type, right_type) = (left.value_type(), right.value_type());
                if left_type == ValueType::Real || right_type == ValueType::Real {
                    self.emit_float_operands(a, left_type, b, right_type);
                    let holds_when_set = self.emit_float_compare(*op);
                    let branch = if holds_when_set { "bc1f" } else { "bc1t" };
                    self.emit(format!("{} {}", branch, label));
                } else {
                    self.emit(format!("{} {}, {}, {}", branch_mnemonic(inverse), a, b, label));
                }
                return;
            }
        }

        self.emit_expression(test);
        let value = self.register(self.cursor);
        self.emit_convert(value, test.value_type(), ValueType::Integer);
        self.emit(format!("li {}, 1", SCRATCH_REGISTER));
        self.emit(format!("bne {}, {}, {}", value, SCRATCH_REGISTER, label));
    }

    /// Store the value in `source` into `target`.
    fn emit_store(&mut self, target: &Lvalue, source: &str) {
        match target {
            Lvalue::Variable(variable) => {
                if let Some((storage, _)) = self.locate(&variable.name) {
                    self.emit(format!("sw {}, {}", source, storage));
                }
            }
            Lvalue::Array(element) => {
                if self.emit_element_address(element) {
                    self.emit(format!("sw {}, 0({})", source, ADDRESS_REGISTER));
                }
            }
        }
    }

    fn emit_read(&mut self, target: &Lvalue) {
        let destination = self.register(self.cursor);
        match target.value_type() {
            ValueType::Integer => {
                self.emit(format!("li {}, {}", RESULT_REGISTER, SYSCALL_READ_INT));
                self.emit("syscall");
                self.emit(format!("move {}, {}", destination, RESULT_REGISTER));
            }
            ValueType::Real => {
                self.emit(format!("li {}, {}", RESULT_REGISTER, SYSCALL_READ_FLOAT));
                self.emit("syscall");
                self.emit(format!("mfc1 {}, {}", destination, FLOAT_LEFT));
            }
        }
        self.emit_store(target, destination);
    }

    fn emit_write(&mut self, data: &Expression) {
        self.emit_expression(data);
        let value = self.register(self.cursor);
        match data.value_type() {
            ValueType::Integer => {
                self.emit(format!("move {}, {}", ARGUMENT_REGISTERS[0], value));
                self.emit(format!("li {}, {}", RESULT_REGISTER, SYSCALL_PRINT_INT));
            }
            ValueType::Real => {
                self.emit(format!("mtc1 {}, {}", value, FLOAT_ARGUMENT));
                self.emit(format!("li {}, {}", RESULT_REGISTER, SYSCALL_PRINT_FLOAT));
            }
        }
        self.emit("syscall");

        self.emit(format!("li {}, {}", ARGUMENT_REGISTERS[0], u32::from(b'\n')));
        self.emit(format!("li {}, {}", RESULT_REGISTER, SYSCALL_PRINT_CHAR));
        self.emit("syscall");
    }
}

#[cfg(test)]
mod tests {
    use crate::codegen::Generator;
    use crate::parser::Parser;
    use crate::symbols::SymbolTable;

    /// Lower the first statement of the program body on its own.
    fn lower_first(source: &str) -> (Vec<String>, usize, usize) {
        let mut table = SymbolTable::new();
        let program = Parser::new(source, &mut table).unwrap().parse_program().unwrap();

        let mut generator = Generator::new(&mut table);
        generator.emit_data(&program.declarations);
        let before = generator.register_cursor();
        generator.emit_statement(&program.body.statements[0]);
        let after = generator.register_cursor();
        let code = generator
            .finish()
            .lines()
            .map(str::trim)
            .filter(|line| !line.contains(".word"))
            .map(str::to_string)
            .collect();
        (code, before, after)
    }

    fn count(code: &[String], line: &str) -> usize {
        code.iter().filter(|l| *l == line).count()
    }

    #[test]
    fn test_if_labels_and_cursor() {
        let (code, before, after) = lower_first(
            "program t; var a, x : integer;
             begin if (a < 5) then x := 1 else x := 2 end .",
        );
        assert_eq!(before, after);
        assert_eq!(count(&code, "else0:"), 1);
        assert_eq!(count(&code, "endIf0:"), 1);
        assert_eq!(
            code,
            vec![
                "lw $s1, _a",
                "li $s2, 5",
                "bge $s1, $s2, else0",
                "li $s0, 1",
                "sw $s0, _x",
                "j endIf0",
                "else0:",
                "li $s0, 2",
                "sw $s0, _x",
                "endIf0:",
            ]
        );
    }

    #[test]
    fn test_nested_ifs_get_distinct_labels() {
        let (code, before, after) = lower_first(
            "program t; var a : integer;
             begin if a = 1 then if a = 2 then a := 3 else a := 4 else a := 5 end .",
        );
        assert_eq!(before, after);
        for label in ["else0:", "endIf0:", "else1:", "endIf1:"] {
            assert_eq!(count(&code, label), 1, "{}", label);
        }
        assert!(code.contains(&"bne $s1, $s2, else0".to_string()));
        assert!(code.contains(&"bne $s1, $s2, else1".to_string()));
    }

    #[test]
    fn test_while_loop() {
        let (code, before, after) = lower_first(
            "program t; var i : integer;
             begin while i <= 10 do i := i + 1 end .",
        );
        assert_eq!(before, after);
        assert_eq!(code.first().unwrap(), "while0:");
        assert!(code.contains(&"bgt $s1, $s2, endWhile0".to_string()));
        assert_eq!(code[code.len() - 2], "j while0");
        assert_eq!(code.last().unwrap(), "endWhile0:");
    }

    #[test]
    fn test_non_relational_test_compares_with_one() {
        let (code, _, _) = lower_first(
            "program t; var a, b : integer;
             begin while a and b do a := 0 end .",
        );
        assert_eq!(
            code[..6],
            [
                "while0:",
                "lw $s1, _a",
                "lw $s2, _b",
                "and $s0, $s1, $s2",
                "li $t8, 1",
                "bne $s0, $t8, endWhile0",
            ]
            .map(String::from)
        );
    }

    #[test]
    fn test_real_test_uses_coprocessor_flag() {
        let (code, _, _) = lower_first(
            "program t; var r : real; x : integer;
             begin if r < 1 then x := 1 else x := 0 end .",
        );
        assert!(code.contains(&"cvt.s.w $f1, $f1".to_string()));
        assert!(code.contains(&"c.lt.s $f0, $f1".to_string()));
        assert!(code.contains(&"bc1f else0".to_string()));
    }

    #[test]
    fn test_assignment_converts_between_types() {
        let (code, _, _) = lower_first("program t; var r : real; begin r := 2 end .");
        assert_eq!(
            code,
            vec!["li $s0, 2", "mtc1 $s0, $f0", "cvt.s.w $f0, $f0", "mfc1 $s0, $f0", "sw $s0, _r"]
        );

        let (code, _, _) = lower_first("program t; var i : integer; begin i := 2.5 end .");
        assert!(code.contains(&"cvt.w.s $f0, $f0".to_string()));
    }

    #[test]
    fn test_array_store_keeps_value_register() {
        let (code, before, after) = lower_first(
            "program t; var a : array [0 : 9] of integer; i : integer;
             begin a[i + 1] := i end .",
        );
        assert_eq!(before, after);
        assert_eq!(
            code,
            vec![
                "lw $s0, _i",
                "lw $s2, _i",
                "li $s3, 1",
                "add $s1, $s2, $s3",
                "move $t9, $s1",
                "sll $t9, $t9, 2",
                "la $t8, _a",
                "add $t9, $t9, $t8",
                "sw $s0, 0($t9)",
            ]
        );
    }

    #[test]
    fn test_read_and_write() {
        let (code, _, _) = lower_first("program t; var x : integer; begin read(x) end .");
        assert_eq!(code, vec!["li $v0, 5", "syscall", "move $s0, $v0", "sw $s0, _x"]);

        let (code, _, _) = lower_first("program t; var r : real; begin write(r) end .");
        assert_eq!(
            code,
            vec![
                "lw $s0, _r",
                "mtc1 $s0, $f12",
                "li $v0, 2",
                "syscall",
                "li $a0, 10",
                "li $v0, 11",
                "syscall",
            ]
        );
    }

    #[test]
    fn test_local_array_addressed_from_stack() {
        let mut table = SymbolTable::new();
        let program = Parser::new(
            "program t;
             procedure p(n : integer);
             var a : array [1 : 4] of integer;
             begin a[n] := n end;
             begin p(1) end .",
            &mut table,
        )
        .unwrap()
        .parse_program()
        .unwrap();

        let mut generator = Generator::new(&mut table);
        generator.generate_program(&program);
        assert!(generator.diagnostics().is_empty());
        let code = generator.finish();
        let code: Vec<&str> = code.lines().map(str::trim).collect();

        // n at 0($sp), a[1..4] from 4($sp)
        let store = code.iter().position(|l| *l == "sw $s0, 0($t9)").unwrap();
        assert_eq!(
            code[store - 6..store],
            [
                "lw $s0, 0($sp)",
                "lw $s1, 0($sp)",
                "addi $t9, $s1, -1",
                "sll $t9, $t9, 2",
                "add $t9, $t9, $sp",
                "addi $t9, $t9, 4",
            ]
        );
    }
}
