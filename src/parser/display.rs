//! Indented dump of the syntax tree.
//!
//! Each nesting level is prefixed with `|-- `, one node per line. The output is
//! deterministic so it can be compared directly in tests and printed by the
//! command-line driver with `--tree`.

use std::fmt::{self, Write};

use super::ast::*;

/// Format a whole program.
pub fn format_program(program: &Program) -> String {
    program.to_string()
}

/// Stateful formatter that renders tree nodes into a string buffer.
#[derive(Debug, Default)]
pub struct TreeFormatter {
    buffer: String,
}

impl TreeFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> String {
        self.buffer
    }

    pub fn write_program(&mut self, program: &Program) -> fmt::Result {
        self.line(0, &format!("Program: {}", program.name))?;
        self.write_declarations(&program.declarations, 1)?;
        self.write_subprograms(&program.subprograms, 1)?;
        self.write_compound(&program.body, 1)
    }

    fn write_declarations(&mut self, declarations: &Declarations, level: usize) -> fmt::Result {
        self.line(level, "Declarations")?;
        for variable in &declarations.variables {
            self.write_variable(variable, level + 1)?;
        }
        Ok(())
    }

    fn write_subprograms(&mut self, subprograms: &[SubProgram], level: usize) -> fmt::Result {
        self.line(level, "SubProgramDeclarations")?;
        for sub in subprograms {
            let header = match (sub.kind, sub.return_type) {
                (SubProgramKind::Function, Some(ty)) => format!("Function: {} returns {}", sub.name, ty),
                _ => format!("Procedure: {}", sub.name),
            };
            self.line(level + 1, &header)?;
            self.line(level + 2, "Arguments")?;
            for arg in &sub.args {
                self.write_variable(arg, level + 3)?;
            }
            self.write_declarations(&sub.declarations, level + 2)?;
            self.write_subprograms(&sub.subprograms, level + 2)?;
            self.write_compound(&sub.body, level + 2)?;
        }
        Ok(())
    }

    fn write_compound(&mut self, compound: &CompoundStatement, level: usize) -> fmt::Result {
        self.line(level, "Compound Statement")?;
        for statement in &compound.statements {
            self.write_statement(statement, level + 1)?;
        }
        Ok(())
    }

    fn write_statement(&mut self, statement: &Statement, level: usize) -> fmt::Result {
        match statement {
            Statement::Assignment { target, value } => {
                self.line(level, "Assignment")?;
                self.write_lvalue(target, level + 1)?;
                self.write_expression(value, level + 1)
            }
            Statement::Compound(compound) => self.write_compound(compound, level),
            Statement::If {
                test,
                then_branch,
                else_branch,
            } => {
                self.line(level, "If")?;
                self.write_expression(test, level + 1)?;
                self.line(level, "Then")?;
                self.write_statement(then_branch, level + 1)?;
                self.line(level, "Else")?;
                self.write_statement(else_branch, level + 1)
            }
            Statement::While { test, body } => {
                self.line(level, "While")?;
                self.write_expression(test, level + 1)?;
                self.line(level, "Do")?;
                self.write_statement(body, level + 1)
            }
            Statement::ProcedureCall { name, args } => {
                self.line(level, &format!("Procedure Call: {}", name))?;
                for arg in args {
                    self.write_expression(arg, level + 1)?;
                }
                Ok(())
            }
            Statement::Read { target } => {
                self.line(level, "Read")?;
                self.write_lvalue(target, level + 1)
            }
            Statement::Write { data } => {
                self.line(level, "Write")?;
                self.write_expression(data, level + 1)
            }
        }
    }

    fn write_lvalue(&mut self, target: &Lvalue, level: usize) -> fmt::Result {
        match target {
            Lvalue::Variable(v) => self.write_variable(v, level),
            Lvalue::Array(a) => self.write_array(a, level),
        }
    }

    fn write_variable(&mut self, variable: &Variable, level: usize) -> fmt::Result {
        self.line(level, &format!("Name: {} ({})", variable.name, variable.ty))
    }

    fn write_array(&mut self, element: &ArrayElement, level: usize) -> fmt::Result {
        self.line(level, &format!("Array: {} ({})", element.name, element.ty))?;
        self.write_expression(&element.index, level + 1)
    }

    fn write_expression(&mut self, expression: &Expression, level: usize) -> fmt::Result {
        match expression {
            Expression::Value { literal, ty } => {
                self.line(level, &format!("Value: {} ({})", literal, ty))
            }
            Expression::Variable(v) => self.write_variable(v, level),
            Expression::Array(a) => self.write_array(a, level),
            Expression::FunctionCall { name, ty, args } => {
                self.line(level, &format!("Function Call: {} ({})", name, ty))?;
                for arg in args {
                    self.write_expression(arg, level + 1)?;
                }
                Ok(())
            }
            Expression::Operation {
                op, left, right, ty, ..
            } => {
                self.line(level, &format!("Operation: {} ({})", op.symbol(), ty))?;
                self.write_expression(left, level + 1)?;
                self.write_expression(right, level + 1)
            }
            Expression::UnaryOperation { op, operand, ty } => {
                self.line(level, &format!("Unary Operation: {} ({})", op.symbol(), ty))?;
                self.write_expression(operand, level + 1)
            }
        }
    }

    fn line(&mut self, level: usize, text: &str) -> fmt::Result {
        for _ in 0..level {
            self.buffer.push_str("|-- ");
        }
        writeln!(self.buffer, "{}", text)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut formatter = TreeFormatter::new();
        formatter.write_program(self)?;
        f.write_str(&formatter.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_program_dump() {
        let program = Program::new("foo", SourceLocation::new(1, 1));
        assert_eq!(
            format_program(&program),
            "Program: foo\n\
             |-- Declarations\n\
             |-- SubProgramDeclarations\n\
             |-- Compound Statement\n"
        );
    }

    #[test]
    fn test_operation_dump_nests_operands() {
        let mut program = Program::new("p", SourceLocation::new(1, 1));
        program.body.statements.push(Statement::Write {
            data: Expression::operation(
                BinOp::Mul,
                Expression::value("4"),
                Expression::value("2.5"),
            ),
        });

        let dump = program.to_string();
        assert!(dump.contains("|-- |-- Write\n"));
        assert!(dump.contains("|-- |-- |-- Operation: * (real)\n"));
        assert!(dump.contains("|-- |-- |-- |-- Value: 4 (integer)\n"));
        assert!(dump.contains("|-- |-- |-- |-- Value: 2.5 (real)\n"));
    }
}
