//! Constant folding
//!
//! [`fold`] rebuilds a [`Program`] bottom-up, replacing every
//! [`Expression::Operation`] whose operands are both literals with the literal
//! it evaluates to. Nothing else is rewritten: unary operations, calls and
//! variable references stay as they are (their operands are still folded).
//!
//! # Evaluation rules
//!
//! - `+ - *` use ordinary arithmetic; a real operand makes the result real.
//!   Reals are computed in single precision, the width the target uses.
//! - `/` and `div` truncate on integers; `mod` is the remainder.
//! - Comparisons produce `1` or `0`.
//! - `and`/`or` only fold when both operands are the literals `0` or `1`.
//!
//! Division by zero, integer overflow, and `div`/`mod` on reals leave the
//! operation untouched, so folding twice gives the same tree as folding once.

use crate::parser::ast::*;

/// Fold every constant operation in the program.
pub fn fold(program: Program) -> Program {
    Program {
        name: program.name,
        declarations: program.declarations,
        subprograms: program.subprograms.into_iter().map(fold_subprogram).collect(),
        body: fold_compound(program.body),
        location: program.location,
    }
}

fn fold_subprogram(sub: SubProgram) -> SubProgram {
    SubProgram {
        subprograms: sub.subprograms.into_iter().map(fold_subprogram).collect(),
        body: fold_compound(sub.body),
        ..sub
    }
}

fn fold_compound(compound: CompoundStatement) -> CompoundStatement {
    CompoundStatement {
        statements: compound.statements.into_iter().map(fold_statement).collect(),
    }
}

fn fold_statement(statement: Statement) -> Statement {
    match statement {
        Statement::Assignment { target, value } => Statement::Assignment {
            target: fold_lvalue(target),
            value: fold_expression(value),
        },
        Statement::Compound(compound) => Statement::Compound(fold_compound(compound)),
        Statement::If {
            test,
            then_branch,
            else_branch,
        } => Statement::If {
            test: fold_expression(test),
            then_branch: Box::new(fold_statement(*then_branch)),
            else_branch: Box::new(fold_statement(*else_branch)),
        },
        Statement::While { test, body } => Statement::While {
            test: fold_expression(test),
            body: Box::new(fold_statement(*body)),
        },
        Statement::ProcedureCall { name, args } => Statement::ProcedureCall {
            name,
            args: args.into_iter().map(fold_expression).collect(),
        },
        Statement::Read { target } => Statement::Read {
            target: fold_lvalue(target),
        },
        Statement::Write { data } => Statement::Write {
            data: fold_expression(data),
        },
    }
}

fn fold_lvalue(target: Lvalue) -> Lvalue {
    match target {
        Lvalue::Array(element) => Lvalue::Array(fold_element(element)),
        scalar => scalar,
    }
}

fn fold_element(element: ArrayElement) -> ArrayElement {
    ArrayElement {
        index: Box::new(fold_expression(*element.index)),
        ..element
    }
}

/// Fold one expression tree.
pub fn fold_expression(expression: Expression) -> Expression {
    match expression {
        Expression::Operation {
            op, left, right, ty,
        } => {
            let left = fold_expression(*left);
            let right = fold_expression(*right);
            match evaluate(op, &left, &right) {
                Some(folded) => folded,
                None => Expression::Operation {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                    ty,
                },
            }
        }
        Expression::UnaryOperation { op, operand, ty } => Expression::UnaryOperation {
            op,
            operand: Box::new(fold_expression(*operand)),
            ty,
        },
        Expression::Array(element) => Expression::Array(fold_element(element)),
        Expression::FunctionCall { name, ty, args } => Expression::FunctionCall {
            name,
            ty,
            args: args.into_iter().map(fold_expression).collect(),
        },
        leaf => leaf,
    }
}

/// A literal's numeric value.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Constant {
    Integer(i32),
    Real(f32),
}

impl Constant {
    fn of(expression: &Expression) -> Option<Constant> {
        match expression {
            Expression::Value { literal, ty } => match ty {
                ValueType::Integer => literal.parse().ok().map(Constant::Integer),
                ValueType::Real => literal.parse().ok().map(Constant::Real),
            },
            _ => None,
        }
    }

    fn as_real(self) -> f32 {
        match self {
            Constant::Integer(i) => i as f32,
            Constant::Real(r) => r,
        }
    }

    fn as_boolean(self) -> Option<bool> {
        match self {
            Constant::Integer(0) => Some(false),
            Constant::Integer(1) => Some(true),
            _ => None,
        }
    }

    fn into_expression(self) -> Expression {
        match self {
            Constant::Integer(i) => Expression::value(i.to_string()),
            Constant::Real(r) => Expression::value(real_literal(r)),
        }
    }
}

fn truth(value: bool) -> Constant {
    Constant::Integer(i32::from(value))
}

/// Spell a real so that it still reads back as real (always has a `.`).
fn real_literal(value: f32) -> String {
    let text = format!("{:?}", value);
    if text.contains('.') {
        text
    } else if let Some(exponent) = text.find('e') {
        format!("{}.0{}", &text[..exponent], &text[exponent..])
    } else {
        format!("{}.0", text)
    }
}

fn evaluate(op: BinOp, left: &Expression, right: &Expression) -> Option<Expression> {
    let l = Constant::of(left)?;
    let r = Constant::of(right)?;

    let result = match (l, r) {
        _ if op.is_logical() => {
            let (a, b) = (l.as_boolean()?, r.as_boolean()?);
            truth(if op == BinOp::And { a && b } else { a || b })
        }
        _ if op.is_relational() => truth(compare(op, l, r)),
        (Constant::Integer(a), Constant::Integer(b)) => Constant::Integer(match op {
            BinOp::Add => a.checked_add(b)?,
            BinOp::Sub => a.checked_sub(b)?,
            BinOp::Mul => a.checked_mul(b)?,
            BinOp::Divide | BinOp::Div => a.checked_div(b)?,
            BinOp::Mod => a.checked_rem(b)?,
            _ => return None,
        }),
        _ => {
            let (a, b) = (l.as_real(), r.as_real());
            let value = match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Divide if b != 0.0 => a / b,
                _ => return None,
            };
            if !value.is_finite() {
                return None;
            }
            Constant::Real(value)
        }
    };

    Some(result.into_expression())
}

fn compare(op: BinOp, l: Constant, r: Constant) -> bool {
    if let (Constant::Integer(a), Constant::Integer(b)) = (l, r) {
        return match op {
            BinOp::Eq => a == b,
            BinOp::Ne => a != b,
            BinOp::Lt => a < b,
            BinOp::Le => a <= b,
            BinOp::Gt => a > b,
            _ => a >= b,
        };
    }

    let (a, b) = (l.as_real(), r.as_real());
    match op {
        BinOp::Eq => a == b,
        BinOp::Ne => a != b,
        BinOp::Lt => a < b,
        BinOp::Le => a <= b,
        BinOp::Gt => a > b,
        _ => a >= b,
    }
}
