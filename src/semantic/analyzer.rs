//! Semantic analysis pass
//!
//! Walks the Source AST once, building the [`SymbolTable`] and checking
//! every statement. Subprogram heads are declared before any body is
//! checked, so subprograms may call each other regardless of textual order.
//! Every problem is recorded and the walk continues.

use crate::parser::ast::*;
use crate::semantic::builtins::Builtin;
use crate::semantic::errors::SemanticError;
use crate::semantic::infer::{lookup_error, TypeQuery};
use crate::semantic::symbols::{ItemKind, Param, ScopeId, SymbolItem, SymbolTable};
use crate::semantic::types::{assignable, BaseType, Type};
use log::{debug, info};

/// Result of [`analyze`]: the finished table and every diagnostic
#[derive(Debug, Clone)]
pub struct Analysis {
    pub table: SymbolTable,
    pub errors: Vec<SemanticError>,
}

impl Analysis {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Build the symbol table for `program` and type-check it.
pub fn analyze(program: &Program) -> Analysis {
    Analyzer::new().run(program)
}

/// Where analysis currently is: the active block and, inside a subprogram
/// body, that subprogram's head.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Context<'a> {
    pub scope: ScopeId,
    pub subprogram: Option<&'a SubprogramHead>,
}

impl Context<'_> {
    fn current_function(&self) -> Option<&SubprogramHead> {
        self.subprogram.filter(|head| head.is_function())
    }
}

pub(crate) struct Analyzer {
    pub(crate) table: SymbolTable,
    pub(crate) errors: Vec<SemanticError>,
}

impl Analyzer {
    fn new() -> Self {
        Self {
            table: SymbolTable::new(),
            errors: Vec::new(),
        }
    }

    fn run(mut self, program: &Program) -> Analysis {
        let body = &program.body;
        let root =
            self.table
                .create_block(&program.head.name, None, program.head.location);
        let ctx = Context {
            scope: root,
            subprogram: None,
        };

        self.declare_consts(&body.consts, ctx);
        self.declare_vars(&body.vars, ctx);
        for subprogram in &body.subprograms {
            self.declare_subprogram(&subprogram.head, root);
        }
        for subprogram in &body.subprograms {
            self.analyze_subprogram(subprogram, root);
        }
        self.check_statements(&body.statements, ctx);

        info!(
            "semantic analysis finished: {} scope(s), {} error(s)",
            self.table.block_count(),
            self.errors.len()
        );

        Analysis {
            table: self.table,
            errors: self.errors,
        }
    }

    pub(crate) fn type_of(&mut self, expr: &Expr, scope: ScopeId) -> Type {
        TypeQuery::new(&self.table).type_of(expr, scope, &mut self.errors)
    }

    fn insert(&mut self, scope: ScopeId, item: SymbolItem) {
        let name = item.name.clone();
        let location = item.location;
        if let Err(err) = self.table.insert(scope, item) {
            self.errors.push(lookup_error(err, &name, &[], location));
        }
    }

    // ===== Declarations =====

    fn declare_consts(&mut self, consts: &[ConstDeclaration], ctx: Context<'_>) {
        for decl in consts {
            let ty = if TypeQuery::new(&self.table)
                .is_constant_value(&decl.value, ctx.scope)
            {
                self.type_of(&decl.value, ctx.scope)
            } else {
                self.errors.push(SemanticError::type_mismatch(
                    format!("constant '{}' must be a literal value", decl.name),
                    decl.value.location(),
                ));
                Type::ERROR
            };
            self.insert(
                ctx.scope,
                SymbolItem::constant(&decl.name, ty, decl.location),
            );
        }
    }

    fn declare_vars(&mut self, vars: &[VarDeclaration], ctx: Context<'_>) {
        for decl in vars {
            let ty = Type::from_spec(&decl.type_spec);
            for name in &decl.names {
                self.insert(
                    ctx.scope,
                    SymbolItem::variable(name, ty.clone(), decl.location),
                );
            }
        }
    }

    fn declare_subprogram(&mut self, head: &SubprogramHead, root: ScopeId) {
        let params = head
            .flat_parameters()
            .map(|(_, basic, is_reference)| Param {
                ty: Type::from_basic(basic),
                is_reference,
            })
            .collect();
        let return_type = head.return_type.map(Type::from_basic).unwrap_or(Type::VOID);
        self.insert(
            root,
            SymbolItem::callable(&head.name, return_type, params, head.location),
        );
    }

    fn analyze_subprogram(&mut self, subprogram: &Subprogram, root: ScopeId) {
        let head = &subprogram.head;
        debug!("analyzing subprogram '{}'", head.name);

        let scope = self.table.create_block(&head.name, Some(root), head.location);
        let ctx = Context {
            scope,
            subprogram: Some(head),
        };

        for group in &head.parameters {
            for name in &group.names {
                self.insert(
                    scope,
                    SymbolItem::parameter(
                        name,
                        Type::from_basic(group.param_type),
                        group.is_reference,
                        group.location,
                    ),
                );
            }
        }
        if let Some(return_type) = head.return_type {
            self.insert(
                scope,
                SymbolItem::return_slot(
                    &head.name,
                    Type::from_basic(return_type),
                    head.location,
                ),
            );
        }

        self.declare_consts(&subprogram.body.consts, ctx);
        self.declare_vars(&subprogram.body.vars, ctx);
        self.check_statements(&subprogram.body.statements, ctx);
    }

    // ===== Statements =====

    fn check_statements(&mut self, statements: &[Statement], ctx: Context<'_>) {
        for statement in statements {
            self.check_statement(statement, ctx);
        }
    }

    fn check_statement(&mut self, statement: &Statement, ctx: Context<'_>) {
        match statement {
            Statement::Assign {
                name,
                indices,
                value,
                location,
            } => self.check_assignment(name, indices, value, *location, ctx),

            Statement::Call {
                name,
                args,
                location,
            } => self.check_call(name, args, *location, ctx),

            Statement::Compound { statements, .. } => {
                self.check_statements(statements, ctx)
            }

            Statement::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.check_condition(condition, "if", ctx);
                self.check_statement(then_branch, ctx);
                if let Some(else_branch) = else_branch {
                    self.check_statement(else_branch, ctx);
                }
            }

            Statement::For {
                variable,
                start,
                end,
                body,
                location,
                ..
            } => {
                self.check_loop_variable(variable, *location, ctx);
                for bound in [start, end] {
                    let ty = self.type_of(bound, ctx.scope);
                    if !ty.is_error() && !ty.is(BaseType::Int) {
                        self.errors.push(SemanticError::type_mismatch(
                            format!("'for' bound must be integer, found {}", ty),
                            bound.location(),
                        ));
                    }
                }
                self.check_statement(body, ctx);
            }

            Statement::While {
                condition, body, ..
            } => {
                self.check_condition(condition, "while", ctx);
                self.check_statement(body, ctx);
            }

            Statement::Exit { .. } => {}
        }
    }

    fn check_assignment(
        &mut self,
        name: &str,
        indices: &[Expr],
        value: &Expr,
        location: SourceLocation,
        ctx: Context<'_>,
    ) {
        let target = self.target_type(name, indices, location, ctx);
        let value_ty = self.type_of(value, ctx.scope);
        if target.is_error() || value_ty.is_error() {
            return;
        }

        if !target.is_scalar() {
            self.errors.push(SemanticError::type_mismatch(
                format!("cannot assign to whole array '{}'", name),
                location,
            ));
        } else if !assignable(&target, &value_ty) {
            self.errors.push(SemanticError::type_mismatch(
                format!(
                    "cannot assign {} to '{}' of type {}",
                    value_ty, name, target
                ),
                location,
            ));
        }
    }

    /// Type of the storage an assignment writes to.
    fn target_type(
        &mut self,
        name: &str,
        indices: &[Expr],
        location: SourceLocation,
        ctx: Context<'_>,
    ) -> Type {
        if let Some(function) = ctx.current_function() {
            if indices.is_empty() && function.name == name {
                return function.return_type.map(Type::from_basic).unwrap_or(Type::ERROR);
            }
        }

        match self.table.find_data(ctx.scope, name).cloned() {
            Some(item) if item.kind == ItemKind::Constant => {
                self.errors.push(SemanticError::type_mismatch(
                    format!("cannot assign to constant '{}'", name),
                    location,
                ));
                Type::ERROR
            }
            Some(item) => TypeQuery::new(&self.table).index_type(
                &item.ty,
                name,
                indices,
                location,
                ctx.scope,
                &mut self.errors,
            ),
            None if self.table.contains(ctx.scope, name) => {
                self.errors.push(SemanticError::type_mismatch(
                    format!("'{}' is not a variable", name),
                    location,
                ));
                Type::ERROR
            }
            None => {
                self.errors.push(SemanticError::NotFound {
                    name: name.to_string(),
                    location,
                });
                Type::ERROR
            }
        }
    }

    fn check_call(
        &mut self,
        name: &str,
        args: &[Expr],
        location: SourceLocation,
        ctx: Context<'_>,
    ) {
        if let Some(builtin) = Builtin::from_name(name) {
            if !self.table.contains(ctx.scope, name) {
                self.check_builtin_call(builtin, args, location, ctx);
                return;
            }
        }

        let infos =
            TypeQuery::new(&self.table).arg_infos(args, ctx.scope, &mut self.errors);
        if infos.iter().any(|info| info.ty.is_error()) {
            return;
        }
        if let Err(err) = self.table.find_callable(ctx.scope, name, &infos) {
            self.errors.push(lookup_error(err, name, &infos, location));
        }
    }

    fn check_condition(&mut self, condition: &Expr, keyword: &str, ctx: Context<'_>) {
        let ty = self.type_of(condition, ctx.scope);
        if !ty.is_error() && !ty.is(BaseType::Bool) {
            self.errors.push(SemanticError::type_mismatch(
                format!("condition of '{}' must be boolean, found {}", keyword, ty),
                condition.location(),
            ));
        }
    }

    fn check_loop_variable(
        &mut self,
        name: &str,
        location: SourceLocation,
        ctx: Context<'_>,
    ) {
        match self.table.find_data(ctx.scope, name) {
            Some(item) if item.kind == ItemKind::Variable && item.ty.is(BaseType::Int) => {}
            Some(item) => {
                let message = format!(
                    "loop variable '{}' must be an integer variable, found {}",
                    name, item.ty
                );
                self.errors.push(SemanticError::type_mismatch(message, location));
            }
            None => self.errors.push(SemanticError::NotFound {
                name: name.to_string(),
                location,
            }),
        }
    }
}
