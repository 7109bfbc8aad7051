//! Target IR
//!
//! A C-shaped tree with every ambiguity of the Source AST resolved. Each
//! [`Var`] carries its reference and return-slot flags, each subscript
//! carries its lower bound and each argument its passing mode. The code
//! generator reads these flags and never consults the symbol table.

/// C storage type of a declaration or argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CType {
    Int,
    Double,
    Char,
    /// `const char *`, for string constants
    Str,
    Void,
}

impl CType {
    pub fn name(self) -> &'static str {
        match self {
            CType::Int => "int",
            CType::Double => "double",
            CType::Char => "char",
            CType::Str => "const char *",
            CType::Void => "void",
        }
    }

    /// `printf` conversion for a value of this type
    pub fn print_spec(self) -> &'static str {
        match self {
            CType::Int => "%d",
            CType::Double => "%f",
            CType::Char => "%c",
            CType::Str => "%s",
            CType::Void => "",
        }
    }

    /// `scanf` conversion for a variable of this type
    pub fn scan_spec(self) -> &'static str {
        match self {
            CType::Double => "%lf",
            other => other.print_spec(),
        }
    }
}

/// A resolved name use
#[derive(Debug, Clone, PartialEq)]
pub struct Var {
    pub name: String,
    /// A by-reference parameter, emitted as a pointer
    pub is_reference: bool,
    /// The enclosing function's result variable
    pub is_return_slot: bool,
}

impl Var {
    pub fn plain(name: &str) -> Self {
        Var {
            name: name.to_string(),
            is_reference: false,
            is_return_slot: false,
        }
    }
}

/// One array subscript with the declared lower bound of its dimension
#[derive(Debug, Clone, PartialEq)]
pub struct Subscript {
    pub index: Expr,
    pub lower: i64,
}

/// An actual argument and whether its address is passed
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub expr: Expr,
    pub by_reference: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    Real(f64),
    Char(char),
    Str(String),
    Var(Var),
    Index {
        var: Var,
        subscripts: Vec<Subscript>,
    },
    Call {
        name: String,
        args: Vec<Arg>,
    },
    /// Emitted fully parenthesized
    Binary {
        op: &'static str,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: &'static str,
        operand: Box<Expr>,
    },
    Cast {
        ty: CType,
        expr: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub name: String,
    pub ty: CType,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    pub name: String,
    pub ty: CType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    pub name: String,
    pub ty: CType,
    /// Element count of each dimension, `upper - lower + 1`
    pub dims: Vec<i64>,
}

/// Declarations of one block, in emission order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Declarations {
    pub constants: Vec<Constant>,
    pub scalars: Vec<Scalar>,
    pub arrays: Vec<Array>,
}

impl Declarations {
    pub fn is_empty(&self) -> bool {
        self.constants.is_empty() && self.scalars.is_empty() && self.arrays.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign {
        target: Expr,
        value: Expr,
    },
    Call {
        name: String,
        args: Vec<Arg>,
    },
    Compound(Vec<Stmt>),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    For {
        var: Var,
        start: Expr,
        end: Expr,
        downward: bool,
        body: Box<Stmt>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    /// `printf`; the format has literal `%` already doubled
    Write {
        format: String,
        args: Vec<Expr>,
    },
    /// `scanf`; every argument is an lvalue whose address is passed
    Read {
        format: String,
        args: Vec<Expr>,
    },
    /// Leave a routine, returning the result variable for functions
    Return(Option<Var>),
    /// Leave the program
    Exit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub declarations: Declarations,
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub ty: CType,
    pub is_reference: bool,
}

/// A C function lowered from a Pascal function or procedure
#[derive(Debug, Clone, PartialEq)]
pub enum Routine {
    Function {
        name: String,
        /// C name of the local holding the result
        result: String,
        return_type: CType,
        arguments: Vec<Argument>,
        body: Block,
    },
    Subprogram {
        name: String,
        arguments: Vec<Argument>,
        body: Block,
    },
}

impl Routine {
    pub fn name(&self) -> &str {
        match self {
            Routine::Function { name, .. } | Routine::Subprogram { name, .. } => name,
        }
    }

    pub fn arguments(&self) -> &[Argument] {
        match self {
            Routine::Function { arguments, .. } | Routine::Subprogram { arguments, .. } => {
                arguments
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetProgram {
    pub name: String,
    /// File-scope declarations; empty when everything lives in `main`
    pub globals: Declarations,
    pub routines: Vec<Routine>,
    pub main: Block,
    /// The program calls `exit`, which needs `<stdlib.h>`
    pub uses_exit: bool,
}
