//! Typed syntax tree of one compilation unit
//!
//! The loader (an external type checker) dumps a package as JSON in this shape:
//! declarations, statements and expressions, with every identifier use linked
//! to the object it refers to (`DeclId`) and expressions annotated with their
//! static type where the checker knows it.
//!
//! The analysis never mutates a tree; every lookup is a read over `Package`.

pub mod builder;
mod oracle;
mod types;
pub mod walk;

pub use oracle::TypeOracle;
pub use types::TypeName;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Dump format version understood by this crate
pub const FORMAT_VERSION: u32 = 1;

/// Source position (1-based line and column)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

impl Pos {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Identity of a declared object (variable, parameter, field, function)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeclId(pub u32);

/// A whole package as produced by the loader
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Package {
    /// Dump format version
    pub format_version: u32,

    /// Short package name (e.g., "example")
    pub name: String,

    /// Full import path, used to qualify enclosing routine names
    pub path: String,

    /// Parsed source files, in the order the loader saw them
    pub files: Vec<SourceFile>,

    /// Every declared object referenced from the trees
    #[serde(default)]
    pub decls: BTreeMap<DeclId, DeclInfo>,

    /// Struct types declared or used by the package
    #[serde(default)]
    pub structs: BTreeMap<TypeName, StructInfo>,

    /// Parse/type-check errors reported by the loader
    #[serde(default)]
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclInfo {
    pub name: String,
    pub kind: DeclKind,
    #[serde(default)]
    pub ty: Option<TypeName>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Var,
    Const,
    Param,
    Field { owner: TypeName },
    Func { result: Option<TypeName> },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructInfo {
    /// Fields in declaration order
    pub fields: Vec<FieldInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    pub decl: DeclId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    pub name: String,
    pub decls: Vec<Decl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decl {
    Func(FuncDecl),
    Var(ValueSpec),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: Ident,
    /// Receiver type for methods
    #[serde(default)]
    pub receiver: Option<TypeName>,
    pub pos: Pos,
    pub body: Vec<Stmt>,
}

/// `var a, b = x, y` (package or function scope)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    #[serde(default)]
    pub values: Vec<Expr>,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    Assign {
        lhs: Vec<Expr>,
        rhs: Vec<Expr>,
        /// `:=` rather than `=`
        #[serde(default)]
        define: bool,
        pos: Pos,
    },
    Var(ValueSpec),
    Expr(Expr),
    Return {
        results: Vec<Expr>,
        pos: Pos,
    },
    Block(Vec<Stmt>),
    If {
        cond: Expr,
        then: Vec<Stmt>,
        #[serde(default)]
        otherwise: Vec<Stmt>,
    },
    Loop {
        body: Vec<Stmt>,
    },
    Defer(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    #[serde(default)]
    pub decl: Option<DeclId>,
}

impl Ident {
    pub fn new(name: impl Into<String>, decl: Option<DeclId>) -> Self {
        Self {
            name: name.into(),
            decl,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub pos: Pos,
    #[serde(default)]
    pub ty: Option<TypeName>,
    pub node: ExprKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    /// Address-of (`&x`)
    Ref,
    /// Pointer dereference (`*x`)
    Deref,
    Not,
    Neg,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprKind {
    Ident(Ident),
    Selector {
        x: Box<Expr>,
        sel: Ident,
    },
    Index {
        x: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        fun: Box<Expr>,
        #[serde(default)]
        args: Vec<Expr>,
    },
    Str(String),
    Int(i64),
    /// Array, slice, map or struct literal; the type lives in `Expr::ty`
    Composite {
        elts: Vec<Expr>,
    },
    KeyValue {
        key: Box<Expr>,
        value: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        x: Box<Expr>,
    },
    Paren {
        x: Box<Expr>,
    },
    FuncLit {
        body: Vec<Stmt>,
    },
    /// Anything the analysis never looks inside
    Opaque,
}

impl Expr {
    pub fn new(pos: Pos, node: ExprKind) -> Self {
        Self { pos, ty: None, node }
    }

    /// Attach a static type
    pub fn typed(mut self, ty: TypeName) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn as_ident(&self) -> Option<&Ident> {
        match &self.node {
            ExprKind::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    pub fn as_str_lit(&self) -> Option<&str> {
        match &self.node {
            ExprKind::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Strip parentheses, `&` and `*`
    pub fn unparen(&self) -> &Expr {
        match &self.node {
            ExprKind::Paren { x } => x.unparen(),
            ExprKind::Unary {
                op: UnaryOp::Ref | UnaryOp::Deref,
                x,
            } => x.unparen(),
            _ => self,
        }
    }

    /// Short node description used in diagnostics
    pub fn describe(&self) -> &'static str {
        match &self.node {
            ExprKind::Ident(_) => "identifier",
            ExprKind::Selector { .. } => "selector expression",
            ExprKind::Index { .. } => "index expression",
            ExprKind::Call { .. } => "call expression",
            ExprKind::Str(_) => "string literal",
            ExprKind::Int(_) => "integer literal",
            ExprKind::Composite { .. } => "composite literal",
            ExprKind::KeyValue { .. } => "key-value pair",
            ExprKind::Unary { .. } => "unary expression",
            ExprKind::Paren { .. } => "parenthesized expression",
            ExprKind::FuncLit { .. } => "function literal",
            ExprKind::Opaque => "expression",
        }
    }
}

impl Package {
    /// Enclosing routine name as recorded in call sites
    pub fn qualify(&self, func: &FuncDecl) -> String {
        format!("{}.{}", self.path, func.name.name)
    }
}
