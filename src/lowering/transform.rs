//! Source AST to Target IR
//!
//! Lowering runs only after analysis finished with no diagnostics, so every
//! lookup here is expected to succeed. A failed lookup means the two passes
//! disagree and is reported as an [`InternalError`] rather than a user
//! diagnostic.
//!
//! # Name resolution
//!
//! - an assignment to the current function's own name targets its return slot
//! - a bare name is a variable or constant first, then a parameterless call,
//!   then the enclosing function's return slot
//! - each variable use copies the reference flag of the item it resolves to
//!
//! # Routine names
//!
//! C has no overloading. A name declared by more than one subprogram gets a
//! `_<n>` suffix in declaration order; calls pick the suffix of the overload
//! the symbol table resolves them to. A function's result lives in a local
//! `ret_<name>`. Both kinds of generated name take extra trailing `_` until
//! they differ from every name the program declares.

use crate::driver::CompileOptions;
use crate::lowering::fold::fold;
use crate::lowering::ir::{
    self, Arg, Argument, Array, Block, CType, Constant, Declarations, Routine, Scalar, Stmt,
    Subscript, TargetProgram, Var,
};
use crate::parser::ast::{
    BinaryOp, ConstDeclaration, Expr, ForDirection, Program, SourceLocation, Statement,
    Subprogram, SubprogramHead, UnaryOp, VarDeclaration,
};
use crate::semantic::symbols::{ItemKind, SymbolItem};
use crate::semantic::{BaseType, Builtin, ScopeId, SymbolTable, Type, TypeQuery};
use log::{debug, info};
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

/// A Source AST shape lowering cannot handle; always a compiler bug
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalError {
    #[error("no scope was registered for '{name}' at {location}")]
    MissingScope {
        name: String,
        location: SourceLocation,
    },

    #[error("'{name}' at {location} could not be resolved during lowering")]
    Unresolved {
        name: String,
        location: SourceLocation,
    },

    #[error("{what} at {location} has no C representation")]
    Unsupported {
        what: String,
        location: SourceLocation,
    },
}

impl InternalError {
    pub fn location(&self) -> SourceLocation {
        match self {
            InternalError::MissingScope { location, .. }
            | InternalError::Unresolved { location, .. }
            | InternalError::Unsupported { location, .. } => *location,
        }
    }

    fn unresolved(name: &str, location: SourceLocation) -> Self {
        InternalError::Unresolved {
            name: name.to_string(),
            location,
        }
    }
}

/// Lower an analyzed program into the Target IR.
pub fn lower(
    program: &Program,
    table: &SymbolTable,
    options: &CompileOptions,
) -> Result<TargetProgram, InternalError> {
    let subprograms = &program.body.subprograms;
    let mut taken: FxHashSet<String> = table.names().map(str::to_string).collect();
    let routine_names = routine_names(subprograms, &mut taken);
    let result_names = subprograms
        .iter()
        .filter(|subprogram| subprogram.head.is_function())
        .map(|subprogram| {
            let head = &subprogram.head;
            (head.location, fresh_name(format!("ret_{}", head.name), &mut taken))
        })
        .collect();

    Lowerer {
        table,
        fold_constants: options.fold_constants(),
        routine_names,
        result_names,
        constant_values: FxHashMap::default(),
        uses_exit: false,
    }
    .lower_program(program)
}

/// C name of each subprogram, keyed by its head location
fn routine_names(
    subprograms: &[Subprogram],
    taken: &mut FxHashSet<String>,
) -> FxHashMap<SourceLocation, String> {
    let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
    for subprogram in subprograms {
        *counts.entry(subprogram.head.name.as_str()).or_default() += 1;
    }

    let mut seen: FxHashMap<&str, usize> = FxHashMap::default();
    let mut names = FxHashMap::default();
    for subprogram in subprograms {
        let name = subprogram.head.name.as_str();
        let c_name = if counts.get(name).copied().unwrap_or(0) > 1 {
            let n = seen.entry(name).or_default();
            *n += 1;
            fresh_name(format!("{}_{}", name, n), taken)
        } else {
            name.to_string()
        };
        names.insert(subprogram.head.location, c_name);
    }
    names
}

/// `base`, extended with `_` until nothing in `taken` uses it, then taken.
fn fresh_name(base: String, taken: &mut FxHashSet<String>) -> String {
    let mut name = base;
    while taken.contains(&name) {
        name.push('_');
    }
    taken.insert(name.clone());
    name
}

fn c_type(base: BaseType, location: SourceLocation) -> Result<CType, InternalError> {
    match base {
        BaseType::Int | BaseType::Bool => Ok(CType::Int),
        BaseType::Real => Ok(CType::Double),
        BaseType::Char => Ok(CType::Char),
        BaseType::Str => Ok(CType::Str),
        BaseType::Void => Ok(CType::Void),
        BaseType::Error => Err(InternalError::Unsupported {
            what: "an untyped value".to_string(),
            location,
        }),
    }
}

fn c_operator(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Or => "||",
        BinaryOp::Mul => "*",
        BinaryOp::RealDiv | BinaryOp::IntDiv => "/",
        BinaryOp::Mod => "%",
        BinaryOp::And => "&&",
    }
}

/// Use of a variable or constant item.
fn var_for(item: &SymbolItem) -> Var {
    Var {
        name: item.name.clone(),
        is_reference: item.is_reference,
        is_return_slot: false,
    }
}

#[derive(Debug, Clone, Copy)]
struct Context<'a> {
    scope: ScopeId,
    subprogram: Option<&'a SubprogramHead>,
}

impl Context<'_> {
    fn current_function(&self) -> Option<&SubprogramHead> {
        self.subprogram.filter(|head| head.is_function())
    }
}

struct Lowerer<'t> {
    table: &'t SymbolTable,
    fold_constants: bool,
    routine_names: FxHashMap<SourceLocation, String>,
    /// C name of each function's result variable, keyed by head location
    result_names: FxHashMap<SourceLocation, String>,
    /// Lowered initializer of each constant, keyed by declaration location
    constant_values: FxHashMap<SourceLocation, ir::Expr>,
    uses_exit: bool,
}

impl<'t> Lowerer<'t> {
    fn lower_program(mut self, program: &Program) -> Result<TargetProgram, InternalError> {
        let body = &program.body;
        let root = self.scope_for(&program.head.name, program.head.location)?;
        let ctx = Context {
            scope: root,
            subprogram: None,
        };
        info!("lowering {} subprogram(s)", body.subprograms.len());

        let declarations = self.lower_declarations(&body.consts, &body.vars, ctx)?;
        let routines = body
            .subprograms
            .iter()
            .map(|subprogram| self.lower_subprogram(subprogram))
            .collect::<Result<Vec<_>, _>>()?;
        let statements = self.lower_statements(&body.statements, ctx)?;

        // Without subprograms nothing else can see the globals
        let (globals, locals) = if routines.is_empty() {
            (Declarations::default(), declarations)
        } else {
            (declarations, Declarations::default())
        };

        Ok(TargetProgram {
            name: program.head.name.clone(),
            globals,
            routines,
            main: Block {
                declarations: locals,
                statements,
            },
            uses_exit: self.uses_exit,
        })
    }

    fn scope_for(&self, name: &str, location: SourceLocation) -> Result<ScopeId, InternalError> {
        self.table
            .scope_for(location)
            .ok_or_else(|| InternalError::MissingScope {
                name: name.to_string(),
                location,
            })
    }

    fn type_of(&self, expr: &Expr, scope: ScopeId) -> Type {
        TypeQuery::new(self.table).type_of(expr, scope, &mut Vec::new())
    }

    fn routine_name(&self, name: &str, location: SourceLocation) -> Result<String, InternalError> {
        self.routine_names
            .get(&location)
            .cloned()
            .ok_or_else(|| InternalError::unresolved(name, location))
    }

    fn return_slot(&self, head: &SubprogramHead) -> Result<Var, InternalError> {
        let name = self
            .result_names
            .get(&head.location)
            .cloned()
            .ok_or_else(|| InternalError::unresolved(&head.name, head.location))?;
        Ok(Var {
            name,
            is_reference: false,
            is_return_slot: true,
        })
    }

    fn builtin(&self, name: &str, ctx: Context<'_>) -> Option<Builtin> {
        Builtin::from_name(name).filter(|_| !self.table.contains(ctx.scope, name))
    }

    // ===== Declarations =====

    fn lower_subprogram(&mut self, subprogram: &Subprogram) -> Result<Routine, InternalError> {
        let head = &subprogram.head;
        debug!("lowering subprogram '{}'", head.name);

        let scope = self.scope_for(&head.name, head.location)?;
        let ctx = Context {
            scope,
            subprogram: Some(head),
        };
        let name = self.routine_name(&head.name, head.location)?;

        let arguments = head
            .flat_parameters()
            .map(|(param, basic, is_reference)| {
                Ok(Argument {
                    name: param.to_string(),
                    ty: c_type(Type::from_basic(basic).base, head.location)?,
                    is_reference,
                })
            })
            .collect::<Result<Vec<_>, InternalError>>()?;

        let body = Block {
            declarations: self.lower_declarations(
                &subprogram.body.consts,
                &subprogram.body.vars,
                ctx,
            )?,
            statements: self.lower_statements(&subprogram.body.statements, ctx)?,
        };

        Ok(match head.return_type {
            Some(return_type) => Routine::Function {
                name,
                result: self.return_slot(head)?.name,
                return_type: c_type(Type::from_basic(return_type).base, head.location)?,
                arguments,
                body,
            },
            None => Routine::Subprogram {
                name,
                arguments,
                body,
            },
        })
    }

    fn lower_declarations(
        &mut self,
        consts: &[ConstDeclaration],
        vars: &[VarDeclaration],
        ctx: Context<'_>,
    ) -> Result<Declarations, InternalError> {
        let mut declarations = Declarations::default();

        for decl in consts {
            let ty = self.type_of(&decl.value, ctx.scope);
            let value = self.constant_value(&decl.value, ctx)?;
            self.constant_values.insert(decl.location, value.clone());
            declarations.constants.push(Constant {
                name: decl.name.clone(),
                ty: c_type(ty.base, decl.location)?,
                value,
            });
        }

        for decl in vars {
            let ty = Type::from_spec(&decl.type_spec);
            let element = c_type(ty.base, decl.location)?;
            for name in &decl.names {
                if ty.is_scalar() {
                    declarations.scalars.push(Scalar {
                        name: name.clone(),
                        ty: element,
                    });
                } else {
                    let dims = ty
                        .dims
                        .iter()
                        .map(|period| {
                            period.len().ok_or_else(|| InternalError::Unsupported {
                                what: format!("bounds {}..{}", period.lower, period.upper),
                                location: decl.location,
                            })
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    declarations.arrays.push(Array {
                        name: name.clone(),
                        ty: element,
                        dims,
                    });
                }
            }
        }

        Ok(declarations)
    }

    /// A constant naming another constant takes that constant's value, so
    /// file-scope initializers stay constant expressions in C.
    fn constant_value(&mut self, value: &Expr, ctx: Context<'_>) -> Result<ir::Expr, InternalError> {
        if let Expr::UnresolvedName { name, location } = value {
            let table = self.table;
            if let Ok(item) = table.resolve_name(ctx.scope, name) {
                if item.kind == ItemKind::Constant {
                    return self
                        .constant_values
                        .get(&item.location)
                        .cloned()
                        .ok_or_else(|| InternalError::unresolved(name, *location));
                }
            }
        }
        self.lower_expr(value, ctx)
    }

    // ===== Statements =====

    fn lower_statements(
        &mut self,
        statements: &[Statement],
        ctx: Context<'_>,
    ) -> Result<Vec<Stmt>, InternalError> {
        statements
            .iter()
            .map(|statement| self.lower_statement(statement, ctx))
            .collect()
    }

    fn lower_statement(
        &mut self,
        statement: &Statement,
        ctx: Context<'_>,
    ) -> Result<Stmt, InternalError> {
        Ok(match statement {
            Statement::Assign {
                name,
                indices,
                value,
                location,
            } => Stmt::Assign {
                target: self.lower_target(name, indices, *location, ctx)?,
                value: self.lower_expr(value, ctx)?,
            },

            Statement::Call {
                name,
                args,
                location,
            } => {
                if let Some(builtin) = self.builtin(name, ctx) {
                    return self.lower_builtin(builtin, args, ctx);
                }
                let (name, args) = self.lower_call(name, args, *location, ctx)?;
                Stmt::Call { name, args }
            }

            Statement::Compound { statements, .. } => {
                Stmt::Compound(self.lower_statements(statements, ctx)?)
            }

            Statement::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => Stmt::If {
                condition: self.lower_expr(condition, ctx)?,
                then_branch: Box::new(self.lower_statement(then_branch, ctx)?),
                else_branch: else_branch
                    .as_deref()
                    .map(|branch| self.lower_statement(branch, ctx))
                    .transpose()?
                    .map(Box::new),
            },

            Statement::For {
                variable,
                start,
                end,
                direction,
                body,
                location,
            } => Stmt::For {
                var: self.lower_loop_variable(variable, *location, ctx)?,
                start: self.lower_expr(start, ctx)?,
                end: self.lower_expr(end, ctx)?,
                downward: *direction == ForDirection::Downto,
                body: Box::new(self.lower_statement(body, ctx)?),
            },

            Statement::While {
                condition, body, ..
            } => Stmt::While {
                condition: self.lower_expr(condition, ctx)?,
                body: Box::new(self.lower_statement(body, ctx)?),
            },

            Statement::Exit { .. } => match ctx.subprogram {
                Some(head) if head.is_function() => Stmt::Return(Some(self.return_slot(head)?)),
                Some(_) => Stmt::Return(None),
                None => {
                    self.uses_exit = true;
                    Stmt::Exit
                }
            },
        })
    }

    fn lower_target(
        &mut self,
        name: &str,
        indices: &[Expr],
        location: SourceLocation,
        ctx: Context<'_>,
    ) -> Result<ir::Expr, InternalError> {
        if let Some(function) = ctx.current_function() {
            if indices.is_empty() && function.name == name {
                return Ok(ir::Expr::Var(self.return_slot(function)?));
            }
        }
        self.lower_variable(name, indices, location, ctx)
    }

    fn lower_loop_variable(
        &self,
        name: &str,
        location: SourceLocation,
        ctx: Context<'_>,
    ) -> Result<Var, InternalError> {
        self.table
            .find_data(ctx.scope, name)
            .map(var_for)
            .ok_or_else(|| InternalError::unresolved(name, location))
    }

    /// `write`/`writeln` become `printf`, `read`/`readln` become `scanf`.
    /// String literal arguments to `write` are folded into the format.
    fn lower_builtin(
        &mut self,
        builtin: Builtin,
        args: &[Expr],
        ctx: Context<'_>,
    ) -> Result<Stmt, InternalError> {
        let mut format = String::new();
        let mut values = Vec::with_capacity(args.len());

        for arg in args {
            if builtin.is_output() {
                if let Expr::StringLiteral { value, .. } = arg {
                    format.push_str(&value.replace('%', "%%"));
                    continue;
                }
            }

            let ty = c_type(self.type_of(arg, ctx.scope).base, arg.location())?;
            format.push_str(if builtin.is_output() {
                ty.print_spec()
            } else {
                ty.scan_spec()
            });
            values.push(self.lower_expr(arg, ctx)?);
        }

        if builtin.appends_newline() {
            format.push('\n');
        }

        Ok(if builtin.is_output() {
            Stmt::Write {
                format,
                args: values,
            }
        } else {
            Stmt::Read {
                format,
                args: values,
            }
        })
    }

    // ===== Expressions =====

    /// Lower an expression, folding it first when optimization is on.
    fn lower_expr(&mut self, expr: &Expr, ctx: Context<'_>) -> Result<ir::Expr, InternalError> {
        if self.fold_constants {
            let (folded, _) = fold(expr);
            self.convert(&folded, ctx)
        } else {
            self.convert(expr, ctx)
        }
    }

    fn convert(&mut self, expr: &Expr, ctx: Context<'_>) -> Result<ir::Expr, InternalError> {
        Ok(match expr {
            Expr::IntLiteral { value, .. } => ir::Expr::Int(*value),
            Expr::RealLiteral { value, .. } => ir::Expr::Real(*value),
            Expr::CharLiteral { value, .. } => ir::Expr::Char(*value),
            Expr::BoolLiteral { value, .. } => ir::Expr::Int(i64::from(*value)),
            Expr::StringLiteral { value, .. } => ir::Expr::Str(value.clone()),

            Expr::Variable {
                name,
                indices,
                location,
            } => self.lower_variable(name, indices, *location, ctx)?,

            Expr::UnresolvedName { name, location } => {
                let table = self.table;
                let item = table
                    .resolve_name(ctx.scope, name)
                    .map_err(|_| InternalError::unresolved(name, *location))?;
                if item.kind == ItemKind::Callable {
                    ir::Expr::Call {
                        name: self.routine_name(name, item.location)?,
                        args: Vec::new(),
                    }
                } else {
                    self.lower_variable(name, &[], *location, ctx)?
                }
            }

            Expr::Call {
                name,
                args,
                location,
            } => {
                if self.builtin(name, ctx).is_some() {
                    return Err(InternalError::Unsupported {
                        what: format!("'{}' used as a value", name),
                        location: *location,
                    });
                }
                let (name, args) = self.lower_call(name, args, *location, ctx)?;
                ir::Expr::Call { name, args }
            }

            Expr::Binary {
                op, left, right, ..
            } => {
                // `/` on two integers must not truncate in C
                let widen = *op == BinaryOp::RealDiv
                    && self.type_of(left, ctx.scope).is(BaseType::Int)
                    && self.type_of(right, ctx.scope).is(BaseType::Int);

                let mut lowered_left = self.convert(left, ctx)?;
                if widen {
                    lowered_left = ir::Expr::Cast {
                        ty: CType::Double,
                        expr: Box::new(lowered_left),
                    };
                }
                ir::Expr::Binary {
                    op: c_operator(*op),
                    left: Box::new(lowered_left),
                    right: Box::new(self.convert(right, ctx)?),
                }
            }

            Expr::Unary { op, operand, .. } => {
                let operand = self.convert(operand, ctx)?;
                match op {
                    UnaryOp::Plus => operand,
                    UnaryOp::Neg => ir::Expr::Unary {
                        op: "-",
                        operand: Box::new(operand),
                    },
                    UnaryOp::Not => ir::Expr::Unary {
                        op: "!",
                        operand: Box::new(operand),
                    },
                }
            }
        })
    }

    fn lower_variable(
        &mut self,
        name: &str,
        indices: &[Expr],
        location: SourceLocation,
        ctx: Context<'_>,
    ) -> Result<ir::Expr, InternalError> {
        let table = self.table;
        let item = table
            .find_data(ctx.scope, name)
            .or_else(|| table.find_return_slot(ctx.scope, name))
            .ok_or_else(|| InternalError::unresolved(name, location))?;

        let var = if item.kind == ItemKind::ReturnSlot {
            let function = ctx
                .current_function()
                .ok_or_else(|| InternalError::unresolved(name, location))?;
            self.return_slot(function)?
        } else {
            var_for(item)
        };
        if indices.is_empty() {
            return Ok(ir::Expr::Var(var));
        }
        if indices.len() > item.ty.dims.len() {
            return Err(InternalError::Unsupported {
                what: format!("'{}' with {} subscript(s)", name, indices.len()),
                location,
            });
        }

        let subscripts = indices
            .iter()
            .zip(&item.ty.dims)
            .map(|(index, period)| {
                let index = self.lower_expr(index, ctx)?;
                let rebased = match &index {
                    ir::Expr::Int(value) if self.fold_constants => value.checked_sub(period.lower),
                    _ => None,
                };
                Ok(match rebased {
                    Some(value) => Subscript {
                        index: ir::Expr::Int(value),
                        lower: 0,
                    },
                    None => Subscript {
                        index,
                        lower: period.lower,
                    },
                })
            })
            .collect::<Result<Vec<_>, InternalError>>()?;

        Ok(ir::Expr::Index { var, subscripts })
    }

    /// Resolve a call to one overload and pair each argument with the
    /// passing mode of its parameter.
    fn lower_call(
        &mut self,
        name: &str,
        args: &[Expr],
        location: SourceLocation,
        ctx: Context<'_>,
    ) -> Result<(String, Vec<Arg>), InternalError> {
        let table = self.table;
        let infos = TypeQuery::new(table).arg_infos(args, ctx.scope, &mut Vec::new());
        let item = table
            .find_callable(ctx.scope, name, &infos)
            .map_err(|_| InternalError::unresolved(name, location))?;

        let lowered = args
            .iter()
            .zip(&item.params)
            .map(|(arg, param)| {
                Ok(Arg {
                    expr: self.lower_expr(arg, ctx)?,
                    by_reference: param.is_reference,
                })
            })
            .collect::<Result<Vec<_>, InternalError>>()?;

        Ok((self.routine_name(name, item.location)?, lowered))
    }
}
