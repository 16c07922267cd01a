// Syntax tree definitions for the mini-Pascal compiler
//
// Every node owns its children outright (`Box`/`Vec`), so the tree has no
// sharing and no cycles. Passes that rewrite the tree rebuild it.

use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Scalar types of the language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Integer,
    Real,
}

impl ValueType {
    /// Type of a numeric literal: a decimal point makes it real.
    pub fn of_literal(literal: &str) -> Self {
        if literal.contains('.') {
            ValueType::Real
        } else {
            ValueType::Integer
        }
    }

    /// Result type of mixing two operands in arithmetic.
    pub fn widen(self, other: ValueType) -> ValueType {
        if self == ValueType::Real || other == ValueType::Real {
            ValueType::Real
        } else {
            ValueType::Integer
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Integer => write!(f, "integer"),
            ValueType::Real => write!(f, "real"),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    // Addition level
    Add,
    Sub,
    Or,
    // Multiplication level
    Mul,
    Divide, // `/`
    Div,    // `div`
    Mod,
    And,
    // Relational
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }

    /// Relational operator that holds exactly when `self` does not.
    pub fn negated(self) -> Option<BinOp> {
        let op = match self {
            BinOp::Eq => BinOp::Ne,
            BinOp::Ne => BinOp::Eq,
            BinOp::Lt => BinOp::Ge,
            BinOp::Le => BinOp::Gt,
            BinOp::Gt => BinOp::Le,
            BinOp::Ge => BinOp::Lt,
            _ => return None,
        };
        Some(op)
    }

    /// Type produced by applying this operator to operands of the given types.
    pub fn result_type(self, left: ValueType, right: ValueType) -> ValueType {
        if self.is_relational() || self.is_logical() {
            return ValueType::Integer;
        }
        match self {
            BinOp::Div | BinOp::Mod => ValueType::Integer,
            _ => left.widen(right),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Or => "or",
            BinOp::Mul => "*",
            BinOp::Divide => "/",
            BinOp::Div => "div",
            BinOp::Mod => "mod",
            BinOp::And => "and",
            BinOp::Eq => "=",
            BinOp::Ne => "<>",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnOp {
    Neg, // -x
    Not, // not x
}

impl UnOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::Not => "not",
        }
    }
}

/// A named scalar variable, used both for declarations and for references.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub ty: ValueType,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Variable {
            name: name.into(),
            ty,
        }
    }
}

/// An indexed array element, `name[index]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayElement {
    pub name: String,
    pub ty: ValueType, // element type
    pub index: Box<Expression>,
}

/// Anything that can be stored into: a scalar or an array element.
#[derive(Debug, Clone, PartialEq)]
pub enum Lvalue {
    Variable(Variable),
    Array(ArrayElement),
}

impl Lvalue {
    pub fn name(&self) -> &str {
        match self {
            Lvalue::Variable(v) => &v.name,
            Lvalue::Array(a) => &a.name,
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Lvalue::Variable(v) => v.ty,
            Lvalue::Array(a) => a.ty,
        }
    }
}

/// Expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Value {
        literal: String,
        ty: ValueType,
    },
    Variable(Variable),
    Array(ArrayElement),
    FunctionCall {
        name: String,
        ty: ValueType,
        args: Vec<Expression>,
    },
    Operation {
        op: BinOp,
        left: Box<Expression>,
        right: Box<Expression>,
        ty: ValueType,
    },
    UnaryOperation {
        op: UnOp,
        operand: Box<Expression>,
        ty: ValueType,
    },
}

impl Expression {
    /// Literal value whose type is inferred from its spelling.
    pub fn value(literal: impl Into<String>) -> Self {
        let literal = literal.into();
        let ty = ValueType::of_literal(&literal);
        Expression::Value { literal, ty }
    }

    pub fn variable(name: impl Into<String>, ty: ValueType) -> Self {
        Expression::Variable(Variable::new(name, ty))
    }

    pub fn array(name: impl Into<String>, ty: ValueType, index: Expression) -> Self {
        Expression::Array(ArrayElement {
            name: name.into(),
            ty,
            index: Box::new(index),
        })
    }

    /// Binary operation with its result type derived from the operands.
    pub fn operation(op: BinOp, left: Expression, right: Expression) -> Self {
        let ty = op.result_type(left.value_type(), right.value_type());
        Expression::Operation {
            op,
            left: Box::new(left),
            right: Box::new(right),
            ty,
        }
    }

    pub fn unary(op: UnOp, operand: Expression) -> Self {
        let ty = match op {
            UnOp::Neg => operand.value_type(),
            UnOp::Not => ValueType::Integer,
        };
        Expression::UnaryOperation {
            op,
            operand: Box::new(operand),
            ty,
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Expression::Value { ty, .. } => *ty,
            Expression::Variable(v) => v.ty,
            Expression::Array(a) => a.ty,
            Expression::FunctionCall { ty, .. } => *ty,
            Expression::Operation { ty, .. } => *ty,
            Expression::UnaryOperation { ty, .. } => *ty,
        }
    }

    /// The literal text, if this is an already-evaluated value.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Expression::Value { literal, .. } => Some(literal),
            _ => None,
        }
    }
}

/// `begin ... end`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompoundStatement {
    pub statements: Vec<Statement>,
}

/// Statements
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Assignment {
        target: Lvalue,
        value: Expression,
    },
    Compound(CompoundStatement),
    If {
        test: Expression,
        then_branch: Box<Statement>,
        else_branch: Box<Statement>,
    },
    While {
        test: Expression,
        body: Box<Statement>,
    },
    ProcedureCall {
        name: String,
        args: Vec<Expression>,
    },
    Read {
        target: Lvalue,
    },
    Write {
        data: Expression,
    },
}

/// Variables declared in a `var` section, in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Declarations {
    pub variables: Vec<Variable>,
}

impl Declarations {
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// Whether a subprogram returns a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubProgramKind {
    Function,
    Procedure,
}

/// A function or procedure declaration, possibly with nested subprograms.
#[derive(Debug, Clone, PartialEq)]
pub struct SubProgram {
    pub kind: SubProgramKind,
    pub name: String,
    pub return_type: Option<ValueType>,
    pub args: Vec<Variable>,
    pub declarations: Declarations,
    pub subprograms: Vec<SubProgram>,
    pub body: CompoundStatement,
    pub location: SourceLocation,
}

/// Top-level program structure
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub name: String,
    pub declarations: Declarations,
    pub subprograms: Vec<SubProgram>,
    pub body: CompoundStatement,
    pub location: SourceLocation,
}

impl Program {
    pub fn new(name: impl Into<String>, location: SourceLocation) -> Self {
        Program {
            name: name.into(),
            declarations: Declarations::default(),
            subprograms: Vec::new(),
            body: CompoundStatement::default(),
            location,
        }
    }
}
