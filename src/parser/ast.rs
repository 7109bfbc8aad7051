// Source AST for the Pascal subset, as produced by the parser

use std::fmt;

/// Source location information for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Scalar types that can be written in a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicType {
    Integer,
    Real,
    Boolean,
    Char,
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BasicType::Integer => "integer",
            BasicType::Real => "real",
            BasicType::Boolean => "boolean",
            BasicType::Char => "char",
        };
        write!(f, "{}", name)
    }
}

/// One `lower..upper` array dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    pub lower: i64,
    pub upper: i64,
}

impl Period {
    pub fn new(lower: i64, upper: i64) -> Self {
        Self { lower, upper }
    }

    /// Number of elements along this dimension, `None` if it overflows.
    pub fn len(&self) -> Option<i64> {
        self.upper.checked_sub(self.lower)?.checked_add(1)
    }
}

/// Declared type of a variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpec {
    Basic(BasicType),
    Array {
        periods: Vec<Period>,
        element: BasicType,
    },
}

/// Binary operators, grouped by binding strength
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Comparisons
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Additive
    Add,
    Sub,
    Or,

    // Multiplicative
    Mul,
    RealDiv,
    IntDiv,
    Mod,
    And,
}

impl BinaryOp {
    /// Binding strength used by precedence climbing. Higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => 1,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Or => 2,
            BinaryOp::Mul
            | BinaryOp::RealDiv
            | BinaryOp::IntDiv
            | BinaryOp::Mod
            | BinaryOp::And => 3,
        }
    }

    pub fn is_comparison(self) -> bool {
        self.precedence() == 1
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Or => "or",
            BinaryOp::Mul => "*",
            BinaryOp::RealDiv => "/",
            BinaryOp::IntDiv => "div",
            BinaryOp::Mod => "mod",
            BinaryOp::And => "and",
        }
    }
}

/// Prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Neg,
    Not,
}

impl UnaryOp {
    /// Prefix operators bind tighter than any binary operator.
    pub const PRECEDENCE: u8 = 4;

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "not ",
        }
    }
}

/// Expression nodes
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLiteral {
        value: i64,
        location: SourceLocation,
    },
    RealLiteral {
        value: f64,
        location: SourceLocation,
    },
    CharLiteral {
        value: char,
        location: SourceLocation,
    },
    BoolLiteral {
        value: bool,
        location: SourceLocation,
    },
    StringLiteral {
        value: String,
        location: SourceLocation,
    },
    /// `name` or `name[i, j]` where the brackets were written explicitly
    Variable {
        name: String,
        indices: Vec<Expr>,
        location: SourceLocation,
    },
    /// A bare identifier. Variable, constant, parameterless call or return
    /// slot; only lowering decides which.
    UnresolvedName {
        name: String,
        location: SourceLocation,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        location: SourceLocation,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        location: SourceLocation,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        location: SourceLocation,
    },
}

impl Expr {
    pub fn location(&self) -> SourceLocation {
        match self {
            Expr::IntLiteral { location, .. }
            | Expr::RealLiteral { location, .. }
            | Expr::CharLiteral { location, .. }
            | Expr::BoolLiteral { location, .. }
            | Expr::StringLiteral { location, .. }
            | Expr::Variable { location, .. }
            | Expr::UnresolvedName { location, .. }
            | Expr::Call { location, .. }
            | Expr::Binary { location, .. }
            | Expr::Unary { location, .. } => *location,
        }
    }

    /// True for the scalar literals the constant folder treats as leaves.
    pub fn is_scalar_literal(&self) -> bool {
        matches!(
            self,
            Expr::IntLiteral { .. }
                | Expr::RealLiteral { .. }
                | Expr::CharLiteral { .. }
                | Expr::BoolLiteral { .. }
        )
    }

    /// Expressions that can denote a storage location.
    pub fn is_lvalue(&self) -> bool {
        matches!(self, Expr::Variable { .. } | Expr::UnresolvedName { .. })
    }
}

/// Pascal-flavoured rendering with every operation parenthesized.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::IntLiteral { value, .. } => write!(f, "{}", value),
            Expr::RealLiteral { value, .. } => write!(f, "{:?}", value),
            Expr::CharLiteral { value, .. } => write!(f, "'{}'", value),
            Expr::BoolLiteral { value, .. } => write!(f, "{}", value),
            Expr::StringLiteral { value, .. } => write!(f, "'{}'", value),
            Expr::Variable { name, indices, .. } => {
                write!(f, "{}", name)?;
                if !indices.is_empty() {
                    write!(f, "[")?;
                    write_list(f, indices)?;
                    write!(f, "]")?;
                }
                Ok(())
            }
            Expr::UnresolvedName { name, .. } => write!(f, "{}", name),
            Expr::Call { name, args, .. } => {
                write!(f, "{}(", name)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Expr::Binary {
                op, left, right, ..
            } => write!(f, "({} {} {})", left, op.symbol(), right),
            Expr::Unary { op, operand, .. } => {
                write!(f, "({}{})", op.symbol(), operand)
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Counting direction of a `for` loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForDirection {
    To,
    Downto,
}

/// Statement nodes
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Assign {
        name: String,
        indices: Vec<Expr>,
        value: Expr,
        location: SourceLocation,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        location: SourceLocation,
    },
    Compound {
        statements: Vec<Statement>,
        location: SourceLocation,
    },
    If {
        condition: Expr,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
        location: SourceLocation,
    },
    For {
        variable: String,
        start: Expr,
        end: Expr,
        direction: ForDirection,
        body: Box<Statement>,
        location: SourceLocation,
    },
    While {
        condition: Expr,
        body: Box<Statement>,
        location: SourceLocation,
    },
    Exit {
        location: SourceLocation,
    },
}

impl Statement {
    pub fn location(&self) -> SourceLocation {
        match self {
            Statement::Assign { location, .. }
            | Statement::Call { location, .. }
            | Statement::Compound { location, .. }
            | Statement::If { location, .. }
            | Statement::For { location, .. }
            | Statement::While { location, .. }
            | Statement::Exit { location } => *location,
        }
    }
}

/// `const name = value;`
#[derive(Debug, Clone, PartialEq)]
pub struct ConstDeclaration {
    pub name: String,
    pub value: Expr,
    pub location: SourceLocation,
}

/// `var a, b: type;`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclaration {
    pub names: Vec<String>,
    pub type_spec: TypeSpec,
    pub location: SourceLocation,
}

/// One parameter group: `[var] a, b: type`
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub is_reference: bool,
    pub names: Vec<String>,
    pub param_type: BasicType,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubprogramHead {
    pub name: String,
    pub parameters: Vec<Parameter>,
    /// `None` for procedures
    pub return_type: Option<BasicType>,
    pub location: SourceLocation,
}

impl SubprogramHead {
    pub fn is_function(&self) -> bool {
        self.return_type.is_some()
    }

    /// Parameters flattened to one entry per identifier, in order.
    pub fn flat_parameters(
        &self,
    ) -> impl Iterator<Item = (&str, BasicType, bool)> + '_ {
        self.parameters.iter().flat_map(|group| {
            group.names.iter().map(move |name| {
                (name.as_str(), group.param_type, group.is_reference)
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubprogramBody {
    pub consts: Vec<ConstDeclaration>,
    pub vars: Vec<VarDeclaration>,
    pub statements: Vec<Statement>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subprogram {
    pub head: SubprogramHead,
    pub body: SubprogramBody,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgramHead {
    pub name: String,
    /// `program p(input, output);` identifiers, accepted and ignored
    pub parameters: Vec<String>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgramBody {
    pub consts: Vec<ConstDeclaration>,
    pub vars: Vec<VarDeclaration>,
    pub subprograms: Vec<Subprogram>,
    pub statements: Vec<Statement>,
    pub location: SourceLocation,
}

/// Root of the Source AST
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub head: ProgramHead,
    pub body: ProgramBody,
}
