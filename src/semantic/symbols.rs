//! Scoped symbol table
//!
//! Blocks live in an arena owned by [`SymbolTable`] and are addressed by
//! [`ScopeId`]. Each block records its parent's id, so lookups walk from the
//! current block to the root without any shared pointers. A registry keyed
//! by the location of the program or subprogram head maps each body back to
//! its block; lowering uses it to re-enter the scopes analysis built.
//!
//! Items are keyed by `(name, parameter signature)`: a variable and a
//! parameterless procedure of the same name collide, while two procedures
//! with different parameter lists can coexist.

use crate::parser::ast::SourceLocation;
use crate::semantic::types::{assignable, Type};
use rustc_hash::FxHashMap;
use std::fmt;

/// Stable handle of a scope block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// One formal parameter slot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    pub ty: Type,
    pub is_reference: bool,
}

/// What an item denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Variable,
    Constant,
    /// Procedure (`VOID` type) or function
    Callable,
    /// A function's own name inside its body
    ReturnSlot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolItem {
    pub name: String,
    pub ty: Type,
    pub kind: ItemKind,
    pub params: Vec<Param>,
    /// Set on variables that are by-reference parameters
    pub is_reference: bool,
    pub location: SourceLocation,
}

impl SymbolItem {
    pub fn variable(name: &str, ty: Type, location: SourceLocation) -> Self {
        Self::build(name, ty, ItemKind::Variable, Vec::new(), location)
    }

    pub fn parameter(
        name: &str,
        ty: Type,
        is_reference: bool,
        location: SourceLocation,
    ) -> Self {
        let mut item = Self::variable(name, ty, location);
        item.is_reference = is_reference;
        item
    }

    pub fn constant(name: &str, ty: Type, location: SourceLocation) -> Self {
        Self::build(name, ty, ItemKind::Constant, Vec::new(), location)
    }

    pub fn callable(
        name: &str,
        return_type: Type,
        params: Vec<Param>,
        location: SourceLocation,
    ) -> Self {
        Self::build(name, return_type, ItemKind::Callable, params, location)
    }

    pub fn return_slot(name: &str, ty: Type, location: SourceLocation) -> Self {
        Self::build(name, ty, ItemKind::ReturnSlot, Vec::new(), location)
    }

    fn build(
        name: &str,
        ty: Type,
        kind: ItemKind,
        params: Vec<Param>,
        location: SourceLocation,
    ) -> Self {
        Self {
            name: name.to_string(),
            ty,
            kind,
            params,
            is_reference: false,
            location,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.kind, ItemKind::Variable | ItemKind::ReturnSlot)
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, ItemKind::Callable | ItemKind::ReturnSlot)
    }

    /// Whether the actual arguments can bind to this item's parameters.
    /// A by-reference slot needs a variable of exactly its type; a value
    /// slot takes anything assignable to it.
    pub fn accepts(&self, args: &[ArgInfo]) -> bool {
        self.params.len() == args.len()
            && self.params.iter().zip(args).all(|(param, arg)| {
                if param.is_reference {
                    arg.is_variable && arg.ty == param.ty
                } else {
                    assignable(&param.ty, &arg.ty)
                }
            })
    }
}

/// Shape of one actual argument, as seen by overload resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgInfo {
    pub ty: Type,
    pub is_variable: bool,
}

impl fmt::Display for ArgInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_variable {
            write!(f, "var {}", self.ty)
        } else {
            write!(f, "{}", self.ty)
        }
    }
}

/// Why a lookup or insert failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupError {
    NotFound,
    ParameterMismatch,
    NotAFunction,
    Duplicate,
}

/// One lexical level: the program body or a subprogram body
#[derive(Debug, Clone)]
pub struct ScopeBlock {
    pub name: String,
    pub parent: Option<ScopeId>,
    items: FxHashMap<String, Vec<SymbolItem>>,
}

impl ScopeBlock {
    pub fn items_named(&self, name: &str) -> &[SymbolItem] {
        self.items.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.items.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Arena of scope blocks plus the head-location registry
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    blocks: Vec<ScopeBlock>,
    registry: FxHashMap<SourceLocation, ScopeId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a block and register it under `key`.
    pub fn create_block(
        &mut self,
        name: &str,
        parent: Option<ScopeId>,
        key: SourceLocation,
    ) -> ScopeId {
        let id = ScopeId(self.blocks.len());
        self.blocks.push(ScopeBlock {
            name: name.to_string(),
            parent,
            items: FxHashMap::default(),
        });
        self.registry.insert(key, id);
        id
    }

    /// Block registered for the program or subprogram head at `key`.
    pub fn scope_for(&self, key: SourceLocation) -> Option<ScopeId> {
        self.registry.get(&key).copied()
    }

    pub fn block(&self, id: ScopeId) -> &ScopeBlock {
        &self.blocks[id.0]
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Add an item to `scope`, rejecting a second `(name, signature)`.
    pub fn insert(
        &mut self,
        scope: ScopeId,
        item: SymbolItem,
    ) -> Result<(), LookupError> {
        let slot = self.blocks[scope.0]
            .items
            .entry(item.name.clone())
            .or_default();
        if slot.iter().any(|existing| existing.params == item.params) {
            return Err(LookupError::Duplicate);
        }
        slot.push(item);
        Ok(())
    }

    /// Every name declared in any block.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.blocks
            .iter()
            .flat_map(|block| block.items.keys().map(String::as_str))
    }

    /// Block ids from `scope` up to the root.
    pub fn ancestors(&self, scope: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(scope), move |id| self.blocks[id.0].parent)
    }

    /// First item named `name` that satisfies `filter`, innermost first.
    pub fn lookup(
        &self,
        scope: ScopeId,
        name: &str,
        filter: impl Fn(&SymbolItem) -> bool,
    ) -> Option<&SymbolItem> {
        self.ancestors(scope).find_map(|id| {
            self.block(id).items_named(name).iter().find(|item| filter(*item))
        })
    }

    pub fn contains(&self, scope: ScopeId, name: &str) -> bool {
        self.lookup(scope, name, |_| true).is_some()
    }

    /// A variable or constant, never a callable or return slot.
    pub fn find_data(&self, scope: ScopeId, name: &str) -> Option<&SymbolItem> {
        self.lookup(scope, name, |item| {
            matches!(item.kind, ItemKind::Variable | ItemKind::Constant)
        })
    }

    pub fn find_return_slot(
        &self,
        scope: ScopeId,
        name: &str,
    ) -> Option<&SymbolItem> {
        self.lookup(scope, name, |item| item.kind == ItemKind::ReturnSlot)
    }

    /// Resolve a call against the visible overloads of `name`.
    pub fn find_callable(
        &self,
        scope: ScopeId,
        name: &str,
        args: &[ArgInfo],
    ) -> Result<&SymbolItem, LookupError> {
        if let Some(item) = self.lookup(scope, name, |item| {
            item.kind == ItemKind::Callable && item.accepts(args)
        }) {
            return Ok(item);
        }

        if self
            .lookup(scope, name, |item| item.kind == ItemKind::Callable)
            .is_some()
        {
            Err(LookupError::ParameterMismatch)
        } else if self.contains(scope, name) {
            Err(LookupError::NotAFunction)
        } else {
            Err(LookupError::NotFound)
        }
    }

    /// Meaning of a bare identifier: a variable or constant first, then a
    /// parameterless call, then the enclosing function's return slot.
    pub fn resolve_name(
        &self,
        scope: ScopeId,
        name: &str,
    ) -> Result<&SymbolItem, LookupError> {
        if let Some(item) = self.find_data(scope, name) {
            return Ok(item);
        }
        match self.find_callable(scope, name, &[]) {
            Ok(item) => Ok(item),
            Err(err) => self.find_return_slot(scope, name).ok_or(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(line: usize) -> SourceLocation {
        SourceLocation::new(line, 1)
    }

    fn int_param(is_reference: bool) -> Param {
        Param {
            ty: Type::INT,
            is_reference,
        }
    }

    #[test]
    fn test_lookup_walks_to_root() {
        let mut table = SymbolTable::new();
        let root = table.create_block("main", None, loc(1));
        let inner = table.create_block("f", Some(root), loc(2));

        table
            .insert(root, SymbolItem::variable("g", Type::REAL, loc(3)))
            .unwrap();
        table
            .insert(inner, SymbolItem::variable("x", Type::INT, loc(4)))
            .unwrap();

        assert_eq!(table.find_data(inner, "g").unwrap().ty, Type::REAL);
        assert!(table.find_data(root, "x").is_none());
        assert_eq!(table.scope_for(loc(2)), Some(inner));
    }

    #[test]
    fn test_inner_declaration_shadows_outer() {
        let mut table = SymbolTable::new();
        let root = table.create_block("main", None, loc(1));
        let inner = table.create_block("f", Some(root), loc(2));

        table
            .insert(root, SymbolItem::variable("x", Type::REAL, loc(3)))
            .unwrap();
        table
            .insert(inner, SymbolItem::variable("x", Type::CHAR, loc(4)))
            .unwrap();

        assert_eq!(table.find_data(inner, "x").unwrap().ty, Type::CHAR);
    }

    #[test]
    fn test_duplicate_is_keyed_on_signature() {
        let mut table = SymbolTable::new();
        let root = table.create_block("main", None, loc(1));

        table
            .insert(root, SymbolItem::variable("p", Type::INT, loc(2)))
            .unwrap();
        assert_eq!(
            table.insert(
                root,
                SymbolItem::callable("p", Type::VOID, Vec::new(), loc(3))
            ),
            Err(LookupError::Duplicate)
        );
        assert!(table
            .insert(
                root,
                SymbolItem::callable("p", Type::VOID, vec![int_param(false)], loc(4))
            )
            .is_ok());
    }

    #[test]
    fn test_reference_parameter_needs_variable() {
        let mut table = SymbolTable::new();
        let root = table.create_block("main", None, loc(1));
        table
            .insert(
                root,
                SymbolItem::callable("inc", Type::VOID, vec![int_param(true)], loc(2)),
            )
            .unwrap();

        let literal = ArgInfo {
            ty: Type::INT,
            is_variable: false,
        };
        let variable = ArgInfo {
            ty: Type::INT,
            is_variable: true,
        };

        assert_eq!(
            table.find_callable(root, "inc", &[literal]),
            Err(LookupError::ParameterMismatch)
        );
        assert!(table.find_callable(root, "inc", &[variable]).is_ok());
    }

    #[test]
    fn test_value_parameter_widens_but_never_narrows() {
        let item = SymbolItem::callable(
            "f",
            Type::REAL,
            vec![Param {
                ty: Type::REAL,
                is_reference: false,
            }],
            loc(1),
        );
        let int_arg = ArgInfo {
            ty: Type::INT,
            is_variable: false,
        };
        assert!(item.accepts(&[int_arg]));

        let narrow = SymbolItem::callable("g", Type::INT, vec![int_param(false)], loc(1));
        let real_arg = ArgInfo {
            ty: Type::REAL,
            is_variable: false,
        };
        assert!(!narrow.accepts(&[real_arg]));
    }

    #[test]
    fn test_find_callable_categories() {
        let mut table = SymbolTable::new();
        let root = table.create_block("main", None, loc(1));
        table
            .insert(root, SymbolItem::variable("x", Type::INT, loc(2)))
            .unwrap();

        assert_eq!(
            table.find_callable(root, "x", &[]),
            Err(LookupError::NotAFunction)
        );
        assert_eq!(
            table.find_callable(root, "nope", &[]),
            Err(LookupError::NotFound)
        );
    }

    #[test]
    fn test_resolve_name_preference() {
        let mut table = SymbolTable::new();
        let root = table.create_block("main", None, loc(1));
        let body = table.create_block("f", Some(root), loc(2));

        table
            .insert(
                root,
                SymbolItem::callable("f", Type::INT, vec![int_param(false)], loc(2)),
            )
            .unwrap();
        table
            .insert(body, SymbolItem::return_slot("f", Type::INT, loc(2)))
            .unwrap();
        table
            .insert(
                root,
                SymbolItem::callable("tick", Type::INT, Vec::new(), loc(3)),
            )
            .unwrap();

        assert_eq!(
            table.resolve_name(body, "f").unwrap().kind,
            ItemKind::ReturnSlot
        );
        assert_eq!(
            table.resolve_name(body, "tick").unwrap().kind,
            ItemKind::Callable
        );
        assert_eq!(
            table.resolve_name(root, "f"),
            Err(LookupError::ParameterMismatch)
        );
    }
}
