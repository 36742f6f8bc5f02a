// This file is part of ralph-lsp.
// Copyright (C) 2025 Ralph LSP Contributors
// SPDX-License-Identifier: Apache-2.0

//! The Ralph AST.
//!
//! The tree is immutable once built and shared by reference between the
//! workspace, the search utilities and the editor features. Every node
//! carries the [`SourceIndex`] of the text it was parsed from; parents are
//! never materialized - traversals keep their context on the walk stack.

use crate::index::SourceIndex;
use url::Url;

/// A fully parsed source file: the type definitions it declares.
///
/// Import statements are not part of the tree - the import resolver owns
/// them and extracts them straight from the text.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceAst {
    pub file: Url,
    pub definitions: Vec<TypeDef>,
}

impl SourceAst {
    /// Find a type definition by name.
    pub fn find_type(&self, name: &str) -> Option<&TypeDef> {
        self.definitions.iter().find(|def| def.id.name == name)
    }
}

/// What kind of top-level definition this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDefKind {
    Contract { is_abstract: bool },
    Interface,
    TxScript,
    Struct,
}

/// A top-level Ralph definition: contract, interface, script or struct.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub kind: TypeDefKind,
    pub id: TypeId,
    /// Contract fields / struct members, declared in the header.
    pub fields: Vec<Argument>,
    pub inheritance: Vec<InheritanceRef>,
    pub functions: Vec<FuncDef>,
    pub events: Vec<EventDef>,
    pub constants: Vec<ConstantDef>,
    pub enums: Vec<EnumDef>,
    pub index: SourceIndex,
}

impl TypeDef {
    pub fn is_interface(&self) -> bool {
        self.kind == TypeDefKind::Interface
    }

    pub fn find_function(&self, name: &str) -> Option<&FuncDef> {
        self.functions.iter().find(|f| f.id.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InheritanceKind {
    Extends,
    Implements,
}

/// One `extends P(args)` or `implements I` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct InheritanceRef {
    pub kind: InheritanceKind,
    pub parent: TypeId,
    pub args: Vec<Expr>,
}

/// The name of a contract, interface, script, struct, event or enum.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeId {
    pub name: String,
    pub index: SourceIndex,
}

/// A function name. Built-ins carry their `!` suffix in `name`.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncId {
    pub name: String,
    pub index: SourceIndex,
}

impl FuncId {
    pub fn is_builtin(&self) -> bool {
        self.name.ends_with('!')
    }
}

/// A variable, field or constant name.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub index: SourceIndex,
}

/// A type annotation. Array types keep only their element type name.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRef {
    pub id: TypeId,
}

/// A typed name: contract field, function argument or event field.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub ident: Ident,
    pub tpe: TypeRef,
    pub is_mut: bool,
    pub index: SourceIndex,
}

/// A function annotation: `@using(updateFields = true)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub id: Ident,
    pub fields: Vec<AnnotationField>,
    pub index: SourceIndex,
}

/// One `key = value` entry of an annotation. Only boolean values are
/// interpreted; anything else parses but carries no flag.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationField {
    pub ident: Ident,
    pub value: Option<bool>,
    pub index: SourceIndex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDef {
    pub id: FuncId,
    pub is_pub: bool,
    pub annotations: Vec<Annotation>,
    pub args: Vec<Argument>,
    pub returns: Vec<TypeRef>,
    /// None for interface signatures.
    pub body: Option<Block>,
    /// The header range, `fn` through the return types. Definition results
    /// anchor here so the editor jumps to a stable position.
    pub signature: SourceIndex,
    pub index: SourceIndex,
}

impl FuncDef {
    /// Value of the boolean flag `name` in any of this function's
    /// annotations.
    pub fn annotation_flag(&self, name: &str) -> Option<bool> {
        self.annotations
            .iter()
            .flat_map(|annotation| annotation.fields.iter())
            .find(|field| field.ident.name == name)
            .and_then(|field| field.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventDef {
    pub id: TypeId,
    pub fields: Vec<Argument>,
    pub index: SourceIndex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantDef {
    pub ident: Ident,
    pub value: Expr,
    pub index: SourceIndex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub id: TypeId,
    pub fields: Vec<EnumField>,
    pub index: SourceIndex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumField {
    pub ident: Ident,
    pub value: Expr,
    pub index: SourceIndex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub index: SourceIndex,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Let {
        ident: Ident,
        is_mut: bool,
        value: Expr,
        index: SourceIndex,
    },
    Assign {
        target: Expr,
        value: Expr,
        index: SourceIndex,
    },
    Return {
        values: Vec<Expr>,
        index: SourceIndex,
    },
    If {
        condition: Expr,
        then_block: Block,
        else_block: Option<Block>,
        index: SourceIndex,
    },
    While {
        condition: Expr,
        body: Block,
        index: SourceIndex,
    },
    For {
        init: Box<Stmt>,
        condition: Expr,
        update: Box<Stmt>,
        body: Block,
        index: SourceIndex,
    },
    Emit {
        event: TypeId,
        args: Vec<Expr>,
        index: SourceIndex,
    },
    Expr(Expr),
}

impl Stmt {
    pub fn index(&self) -> &SourceIndex {
        match self {
            Stmt::Let { index, .. }
            | Stmt::Assign { index, .. }
            | Stmt::Return { index, .. }
            | Stmt::If { index, .. }
            | Stmt::While { index, .. }
            | Stmt::For { index, .. }
            | Stmt::Emit { index, .. } => index,
            Stmt::Expr(expr) => expr.index(),
        }
    }
}

/// A plain call: `transfer(to, amount)` or `assert!(x, 0)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub id: FuncId,
    pub args: Vec<Expr>,
    pub index: SourceIndex,
}

/// A call through a receiver: `token.transfer(to, amount)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractCallExpr {
    pub receiver: Box<Expr>,
    pub call_id: FuncId,
    pub args: Vec<Expr>,
    pub index: SourceIndex,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Variable(Ident),
    NumberLit {
        raw: String,
        index: SourceIndex,
    },
    BoolLit {
        value: bool,
        index: SourceIndex,
    },
    BytesLit {
        raw: String,
        index: SourceIndex,
    },
    StringLit {
        raw: String,
        index: SourceIndex,
    },
    Call(CallExpr),
    ContractCall(ContractCallExpr),
    /// Dotted access without a call: enum fields (`Color.Red`) and struct
    /// member reads.
    Select {
        base: Ident,
        field: Ident,
        index: SourceIndex,
    },
    Binary {
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
        index: SourceIndex,
    },
    Unary {
        op: String,
        expr: Box<Expr>,
        index: SourceIndex,
    },
}

impl Expr {
    pub fn index(&self) -> &SourceIndex {
        match self {
            Expr::Variable(ident) => &ident.index,
            Expr::NumberLit { index, .. }
            | Expr::BoolLit { index, .. }
            | Expr::BytesLit { index, .. }
            | Expr::StringLit { index, .. }
            | Expr::Select { index, .. }
            | Expr::Binary { index, .. }
            | Expr::Unary { index, .. } => index,
            Expr::Call(call) => &call.index,
            Expr::ContractCall(call) => &call.index,
        }
    }
}
