//! Expression lowering
//!
//! Every expression is evaluated into the register under the cursor. Operands
//! of a binary operation go one and two registers above it:
//!
//! ```text
//! cursor += 1; left  -> reg(cursor)
//! cursor += 1; right -> reg(cursor)
//! cursor -= 2; reg(cursor) = reg(cursor + 1) op reg(cursor + 2)
//! ```
//!
//! # Reals
//!
//! Real values are single-precision bit patterns kept in the general
//! registers. Arithmetic moves them into `$f0`/`$f1` with `mtc1`, computes
//! there, and moves the result back with `mfc1`. An integer operand mixed
//! into real arithmetic is converted with `cvt.s.w` first.

use crate::codegen::constants::*;
use crate::codegen::engine::Generator;
use crate::codegen::storage::Storage;
use crate::parser::ast::*;

impl Generator<'_> {
    /// Evaluate `expression` into the register under the cursor.
    pub(crate) fn emit_expression(&mut self, expression: &Expression) {
        match expression {
            Expression::Value { literal, ty } => self.emit_literal(literal, *ty),
            Expression::Variable(variable) => {
                let destination = self.register(self.cursor);
                if let Some((storage, _)) = self.locate(&variable.name) {
                    self.emit(format!("lw {}, {}", destination, storage));
                }
            }
            Expression::Array(element) => {
                let destination = self.register(self.cursor);
                if self.emit_element_address(element) {
                    self.emit(format!("lw {}, 0({})", destination, ADDRESS_REGISTER));
                }
            }
            Expression::FunctionCall { name, args, .. } => {
                if self.emit_call(name, args) {
                    let destination = self.register(self.cursor);
                    self.emit(format!("move {}, {}", destination, RESULT_REGISTER));
                }
            }
            Expression::Operation { op, left, right, ty } => {
                self.emit_operation(*op, *ty, left, right);
            }
            Expression::UnaryOperation { op, operand, ty } => {
                self.emit_unary(*op, *ty, operand);
            }
        }
    }

    fn emit_literal(&mut self, literal: &str, ty: ValueType) {
        let destination = self.register(self.cursor);
        match ty {
            ValueType::Integer => match literal.parse::<i32>() {
                Ok(value) => self.emit(format!("li {}, {}", destination, value)),
                Err(_) => self.diagnose(format!("'{}' is not an integer", literal)),
            },
            ValueType::Real => match literal.parse::<f32>() {
                Ok(value) => self.emit(format!("li {}, 0x{:08x}", destination, value.to_bits())),
                Err(_) => self.diagnose(format!("'{}' is not a real", literal)),
            },
        }
    }

    fn emit_operation(&mut self, op: BinOp, ty: ValueType, left: &Expression, right: &Expression) {
        let base = self.cursor;
        self.cursor += 1;
        self.emit_expression(left);
        self.cursor += 1;
        self.emit_expression(right);
        self.cursor -= 2;

        let destination = self.register(base);
        let a = self.register(base + 1);
        let b = self.register(base + 2);
        let (left_type, right_type) = (left.value_type(), right.value_type());
        let real_operands = left_type == ValueType::Real || right_type == ValueType::Real;

        if op.is_relational() {
            if real_operands {
                self.emit_float_operands(a, left_type, b, right_type);
                let holds_when_set = self.emit_float_compare(op);
                self.emit(format!("li {}, 1", destination));
                let clear = if holds_when_set { "movf" } else { "movt" };
                self.emit(format!("{} {}, $zero", clear, destination));
            } else {
                self.emit(format!("{} {}, {}, {}", set_mnemonic(op), destination, a, b));
            }
            return;
        }

        match op {
            BinOp::And | BinOp::Or | BinOp::Div | BinOp::Mod => {
                self.emit_convert(a, left_type, ValueType::Integer);
                self.emit_convert(b, right_type, ValueType::Integer);
                match op {
                    BinOp::And => self.emit(format!("and {}, {}, {}", destination, a, b)),
                    BinOp::Or => self.emit(format!("or {}, {}, {}", destination, a, b)),
                    _ => {
                        self.emit(format!("div {}, {}", a, b));
                        let part = if op == BinOp::Mod { "mfhi" } else { "mflo" };
                        self.emit(format!("{} {}", part, destination));
                    }
                }
            }
            _ if ty == ValueType::Real => {
                self.emit_float_operands(a, left_type, b, right_type);
                let instruction = match op {
                    BinOp::Add => "add.s",
                    BinOp::Sub => "sub.s",
                    BinOp::Mul => "mul.s",
                    _ => "div.s",
                };
                self.emit(format!("{} {f0}, {f0}, {}", instruction, FLOAT_RIGHT, f0 = FLOAT_LEFT));
                self.emit(format!("mfc1 {}, {}", destination, FLOAT_LEFT));
            }
            BinOp::Add => self.emit(format!("add {}, {}, {}", destination, a, b)),
            BinOp::Sub => self.emit(format!("sub {}, {}, {}", destination, a, b)),
            _ => {
                // `*` and integer `/`
                let instruction = if op == BinOp::Mul { "mult" } else { "div" };
                self.emit(format!("{} {}, {}", instruction, a, b));
                self.emit(format!("mflo {}", destination));
            }
        }
    }

    fn emit_unary(&mut self, op: UnOp, ty: ValueType, operand: &Expression) {
        let base = self.cursor;
        self.cursor += 1;
        self.emit_expression(operand);
        self.cursor -= 1;

        let destination = self.register(base);
        let value = self.register(base + 1);
        match op {
            UnOp::Neg if ty == ValueType::Real => {
                self.emit(format!("mtc1 {}, {}", value, FLOAT_LEFT));
                self.emit(format!("neg.s {f0}, {f0}", f0 = FLOAT_LEFT));
                self.emit(format!("mfc1 {}, {}", destination, FLOAT_LEFT));
            }
            UnOp::Neg => self.emit(format!("sub {}, $zero, {}", destination, value)),
            UnOp::Not => {
                self.emit_convert(value, operand.value_type(), ValueType::Integer);
                self.emit(format!("seq {}, {}, $zero", destination, value));
            }
        }
    }

    /// Evaluate the arguments, pass them in `$a0..$a3` and jump to the
    /// subprogram. Returns `false` if no call was emitted.
    pub(crate) fn emit_call(&mut self, name: &str, args: &[Expression]) -> bool {
        let found = self.symbols.lookup_with_depth(name).map(|(depth, symbol)| {
            let params = symbol.arg_types().map(<[ValueType]>::to_vec).unwrap_or_default();
            (depth, params)
        });
        let Some((depth, params)) = found else {
            self.diagnose(format!("'{}' is not declared", name));
            return false;
        };
        if args.len() > ARGUMENT_REGISTERS.len() {
            self.diagnose(format!(
                "call to '{}' passes {} arguments, at most {} are supported",
                name,
                args.len(),
                ARGUMENT_REGISTERS.len()
            ));
            return false;
        }
        let label = self.subprogram_label(depth, name);

        let base = self.cursor;
        for (arg, param) in args.iter().zip(params.iter().copied()) {
            self.cursor += 1;
            self.emit_expression(arg);
            let register = self.register(self.cursor);
            self.emit_convert(register, arg.value_type(), param);
        }
        for (index, target) in ARGUMENT_REGISTERS.iter().take(args.len()).enumerate() {
            let register = self.register(base + 1 + index);
            self.emit(format!("move {}, {}", target, register));
        }
        self.cursor -= args.len();

        self.emit(format!("jal {}", label));
        true
    }

    /// Leave the address of `element` in the address register.
    ///
    /// The index is evaluated one register above the cursor, so the register
    /// under the cursor is left untouched. Returns `false` if the array could
    /// not be located.
    pub(crate) fn emit_element_address(&mut self, element: &ArrayElement) -> bool {
        self.cursor += 1;
        self.emit_expression(&element.index);
        let index = self.register(self.cursor);
        self.cursor -= 1;
        self.emit_convert(index, element.index.value_type(), ValueType::Integer);

        let Some((storage, bounds)) = self.locate(&element.name) else {
            return false;
        };
        let lo = bounds.map_or(0, |bounds| bounds.lo);

        if lo == 0 {
            self.emit(format!("move {}, {}", ADDRESS_REGISTER, index));
        } else if let Some(adjust) = lo.checked_neg() {
            self.emit(format!("addi {}, {}, {}", ADDRESS_REGISTER, index, adjust));
        } else {
            self.emit(format!("li {}, {}", ADDRESS_REGISTER, lo));
            self.emit(format!("sub {t}, {}, {t}", index, t = ADDRESS_REGISTER));
        }
        self.emit(format!("sll {t}, {t}, 2", t = ADDRESS_REGISTER));
        match storage {
            Storage::Global(label) => {
                self.emit(format!("la {}, {}", SCRATCH_REGISTER, label));
                self.emit(format!("add {t}, {t}, {}", SCRATCH_REGISTER, t = ADDRESS_REGISTER));
            }
            Storage::Stack(offset) => {
                self.emit(format!("add {t}, {t}, {}", STACK_POINTER, t = ADDRESS_REGISTER));
                if offset != 0 {
                    self.emit(format!("addi {t}, {t}, {}", offset, t = ADDRESS_REGISTER));
                }
            }
        }
        true
    }

    /// Convert the value in `register` between integer and real in place.
    pub(crate) fn emit_convert(&mut self, register: &str, from: ValueType, to: ValueType) {
        let conversion = match (from, to) {
            (ValueType::Integer, ValueType::Real) => "cvt.s.w",
            (ValueType::Real, ValueType::Integer) => "cvt.w.s",
            _ => return,
        };
        self.emit(format!("mtc1 {}, {}", register, FLOAT_LEFT));
        self.emit(format!("{} {f0}, {f0}", conversion, f0 = FLOAT_LEFT));
        self.emit(format!("mfc1 {}, {}", register, FLOAT_LEFT));
    }

    /// Move both operands into `$f0`/`$f1` as reals.
    pub(crate) fn emit_float_operands(&mut self, a: &str, a_type: ValueType, b: &str, b_type: ValueType) {
        for (register, ty, float) in [(a, a_type, FLOAT_LEFT), (b, b_type, FLOAT_RIGHT)] {
            self.emit(format!("mtc1 {}, {}", register, float));
            if ty == ValueType::Integer {
                self.emit(format!("cvt.s.w {f}, {f}", f = float));
            }
        }
    }

    /// Compare `$f0` with `$f1`, setting the coprocessor flag.
    ///
    /// Returns whether `op` holds when the flag is set; `<>`, `>` and `>=`
    /// are tested through their complements.
    pub(crate) fn emit_float_compare(&mut self, op: BinOp) -> bool {
        let (instruction, holds_when_set) = match op {
            BinOp::Eq => ("c.eq.s", true),
            BinOp::Ne => ("c.eq.s", false),
            BinOp::Lt => ("c.lt.s", true),
            BinOp::Le => ("c.le.s", true),
            BinOp::Gt => ("c.le.s", false),
            _ => ("c.lt.s", false),
        };
        self.emit(format!("{} {}, {}", instruction, FLOAT_LEFT, FLOAT_RIGHT));
        holds_when_set
    }
}

/// Instruction materialising an integer comparison as 0 or 1
fn set_mnemonic(op: BinOp) -> &'static str {
    match op {
        BinOp::Eq => "seq",
        BinOp::Ne => "sne",
        BinOp::Lt => "slt",
        BinOp::Le => "sle",
        BinOp::Gt => "sgt",
        _ => "sge",
    }
}

/// Conditional branch taken when the integer comparison `op` holds
pub(crate) fn branch_mnemonic(op: BinOp) -> &'static str {
    match op {
        BinOp::Eq => "beq",
        BinOp::Ne => "bne",
        BinOp::Lt => "blt",
        BinOp::Le => "ble",
        BinOp::Gt => "bgt",
        _ => "bge",
    }
}

#[cfg(test)]
mod tests {
    use crate::codegen::Generator;
    use crate::parser::ast::*;
    use crate::parser::Parser;
    use crate::symbols::SymbolTable;

    /// Lower the right-hand side of the program's first assignment.
    fn lower(declarations: &str, assignment: &str) -> (Vec<String>, usize, usize) {
        let source = format!("program t; {} begin {} end .", declarations, assignment);
        let mut table = SymbolTable::new();
        let program = Parser::new(&source, &mut table).unwrap().parse_program().unwrap();
        let value = match &program.body.statements[0] {
            Statement::Assignment { value, .. } => value.clone(),
            other => panic!("Expected assignment, got {:?}", other),
        };

        let mut generator = Generator::new(&mut table);
        generator.emit_data(&program.declarations);
        let before = generator.register_cursor();
        generator.emit_expression(&value);
        let after = generator.register_cursor();
        let code = generator
            .finish()
            .lines()
            .map(str::trim)
            .filter(|line| !line.starts_with('_'))
            .map(str::to_string)
            .collect();
        (code, before, after)
    }

    #[test]
    fn test_binary_operation_register_use() {
        let (code, before, after) = lower("var x, y : integer;", "x := x + y");
        assert_eq!(before, after);
        assert_eq!(code, vec!["lw $s1, _x", "lw $s2, _y", "add $s0, $s1, $s2"]);
    }

    #[test]
    fn test_nested_operations_climb_the_pool() {
        // (x * 2) - (y div 3)
        let (code, before, after) = lower("var x, y : integer;", "x := x * 2 - y div 3");
        assert_eq!(before, after);
        assert_eq!(
            code,
            vec![
                "lw $s2, _x",
                "li $s3, 2",
                "mult $s2, $s3",
                "mflo $s1",
                "lw $s3, _y",
                "li $s4, 3",
                "div $s3, $s4",
                "mflo $s2",
                "sub $s0, $s1, $s2",
            ]
        );
    }

    #[test]
    fn test_mod_uses_remainder() {
        let (code, _, _) = lower("var x : integer;", "x := x mod 4");
        assert_eq!(code[2..], ["div $s1, $s2".to_string(), "mfhi $s0".to_string()]);
    }

    #[test]
    fn test_comparison_materialised() {
        let (code, _, _) = lower("var x : integer;", "x := x >= 3");
        assert_eq!(code.last().unwrap(), "sge $s0, $s1, $s2");
    }

    #[test]
    fn test_real_literal_bits() {
        let (code, _, _) = lower("var r : real;", "r := 1.5");
        assert_eq!(code, vec!["li $s0, 0x3fc00000"]);
    }

    #[test]
    fn test_mixed_arithmetic_converts_integer_operand() {
        let (code, _, _) = lower("var r : real; i : integer;", "r := r * i");
        assert_eq!(
            code,
            vec![
                "lw $s1, _r",
                "lw $s2, _i",
                "mtc1 $s1, $f0",
                "mtc1 $s2, $f1",
                "cvt.s.w $f1, $f1",
                "mul.s $f0, $f0, $f1",
                "mfc1 $s0, $f0",
            ]
        );
    }

    #[test]
    fn test_real_comparison_materialised() {
        let (code, _, _) = lower("var r : real; i : integer;", "i := r > 2.0");
        assert_eq!(
            code[code.len() - 3..],
            [
                "c.le.s $f0, $f1".to_string(),
                "li $s0, 1".to_string(),
                "movt $s0, $zero".to_string(),
            ]
        );
    }

    #[test]
    fn test_unary_operators() {
        let (code, _, _) = lower("var x : integer;", "x := -x");
        assert_eq!(code, vec!["lw $s1, _x", "sub $s0, $zero, $s1"]);

        let (code, _, _) = lower("var x : integer;", "x := not x");
        assert_eq!(code, vec!["lw $s1, _x", "seq $s0, $s1, $zero"]);
    }

    #[test]
    fn test_global_array_element_address() {
        let (code, before, after) = lower("var a : array [1 : 10] of integer; x : integer;", "x := a[x]");
        assert_eq!(before, after);
        assert_eq!(
            code,
            vec![
                "lw $s1, _x",
                "addi $t9, $s1, -1",
                "sll $t9, $t9, 2",
                "la $t8, _a",
                "add $t9, $t9, $t8",
                "lw $s0, 0($t9)",
            ]
        );
    }

    #[test]
    fn test_minimum_lower_bound_address() {
        let (code, _, _) = lower(
            "var a : array [-2147483648 : -2147483647] of integer; x : integer;",
            "x := a[x]",
        );
        assert_eq!(
            code,
            vec![
                "lw $s1, _x",
                "li $t9, -2147483648",
                "sub $t9, $s1, $t9",
                "sll $t9, $t9, 2",
                "la $t8, _a",
                "add $t9, $t9, $t8",
                "lw $s0, 0($t9)",
            ]
        );
    }

    #[test]
    fn test_function_call_arguments() {
        let mut table = SymbolTable::new();
        let program = Parser::new(
            "program t;
             var x : integer;
             function f(a : integer; b : real) : integer;
             begin f := a end;
             begin x := f(x, 2) end .",
            &mut table,
        )
        .unwrap()
        .parse_program()
        .unwrap();
        let value = match &program.body.statements[0] {
            Statement::Assignment { value, .. } => value.clone(),
            other => panic!("Expected assignment, got {:?}", other),
        };

        let mut generator = Generator::new(&mut table);
        generator.emit_data(&program.declarations);
        generator.emit_expression(&value);
        assert_eq!(generator.register_cursor(), 0);

        let code = generator.finish();
        let code: Vec<&str> = code.lines().map(str::trim).filter(|l| !l.starts_with('_')).collect();
        assert_eq!(
            code,
            vec![
                "lw $s1, _x",
                "li $s2, 2",
                // integer literal passed to a real parameter
                "mtc1 $s2, $f0",
                "cvt.s.w $f0, $f0",
                "mfc1 $s2, $f0",
                "move $a0, $s1",
                "move $a1, $s2",
                "jal _f",
                "move $s0, $v0",
            ]
        );
    }

    #[test]
    fn test_register_pool_exhaustion_is_diagnosed() {
        let (code, before, after) = lower(
            "var x : integer;",
            "x := 1 + (1 + (1 + (1 + (1 + (1 + (1 + (1 + 1)))))))",
        );
        assert_eq!(before, after);
        assert!(code.iter().any(|line| line.starts_with("# ERROR: expression needs more than 8 registers")));
    }
}
