//! Programmatic construction of typed packages
//!
//! The builder plays the part of the type checker: it hands out declaration
//! ids and annotates each expression with the type the checker would infer
//! (declared type of an identifier, field type of a selector, element type
//! of an index, declared result of a local call).
//!
//! ```
//! use emitgen::tree::builder::{at, PackageBuilder};
//! use emitgen::tree::TypeName;
//!
//! let mut b = PackageBuilder::new("example", "example.com/app");
//! let file = b.file("main.go");
//! let em = b.var("em", TypeName::new("emitter/types.CombinedEmitter"));
//! let counter = b.var("counter", TypeName::new("emitter/types.MetricEmitterFn"));
//! let l = at(3);
//! b.global(
//!     file,
//!     3,
//!     &counter,
//!     l.method(l.ident(&em), "Metric", vec![l.str("requests"), l.name("COUNT")])
//!         .typed(TypeName::new("emitter/types.MetricEmitterFn")),
//! );
//! let package = b.finish();
//! assert_eq!(package.files.len(), 1);
//! ```

use super::{
    Decl, DeclId, DeclInfo, DeclKind, Expr, ExprKind, FieldInfo, FuncDecl, Ident, Package, Pos,
    SourceFile, Stmt, StructInfo, TypeName, UnaryOp, ValueSpec, FORMAT_VERSION,
};

/// A declared object as seen by the builder
#[derive(Debug, Clone, PartialEq)]
pub struct Sym {
    pub id: DeclId,
    pub name: String,
    /// Declared type (result type for functions)
    pub ty: Option<TypeName>,
    pub is_func: bool,
}

/// Fields of a struct type declared through [`PackageBuilder::structure`]
#[derive(Debug, Clone)]
pub struct StructSyms {
    pub ty: TypeName,
    pub fields: Vec<Sym>,
}

impl StructSyms {
    /// Field symbol by name
    ///
    /// # Panics
    ///
    /// Panics when the struct has no such field.
    pub fn field(&self, name: &str) -> &Sym {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .unwrap_or_else(|| panic!("{} has no field {}", self.ty, name))
    }
}

pub struct PackageBuilder {
    package: Package,
    next_decl: u32,
}

impl PackageBuilder {
    pub fn new(name: &str, path: &str) -> Self {
        Self {
            package: Package {
                format_version: FORMAT_VERSION,
                name: name.to_string(),
                path: path.to_string(),
                ..Package::default()
            },
            next_decl: 1,
        }
    }

    /// Add a source file, returning its index
    pub fn file(&mut self, name: &str) -> usize {
        self.package.files.push(SourceFile {
            name: name.to_string(),
            decls: Vec::new(),
        });
        self.package.files.len() - 1
    }

    pub fn declare(&mut self, name: &str, kind: DeclKind, ty: Option<TypeName>) -> Sym {
        let id = DeclId(self.next_decl);
        self.next_decl += 1;
        let is_func = matches!(kind, DeclKind::Func { .. });
        let sym_ty = match &kind {
            DeclKind::Func { result } => result.clone(),
            _ => ty.clone(),
        };
        self.package.decls.insert(
            id,
            DeclInfo {
                name: name.to_string(),
                kind,
                ty,
            },
        );
        Sym {
            id,
            name: name.to_string(),
            ty: sym_ty,
            is_func,
        }
    }

    /// Variable (package or local scope)
    pub fn var(&mut self, name: &str, ty: TypeName) -> Sym {
        self.declare(name, DeclKind::Var, Some(ty))
    }

    pub fn param(&mut self, name: &str, ty: TypeName) -> Sym {
        self.declare(name, DeclKind::Param, Some(ty))
    }

    /// Function or method symbol with its declared result type
    pub fn func_sym(&mut self, name: &str, result: Option<TypeName>) -> Sym {
        self.declare(name, DeclKind::Func { result }, None)
    }

    /// Struct type with fields in declaration order
    pub fn structure(&mut self, ty: &str, fields: &[(&str, TypeName)]) -> StructSyms {
        let owner = TypeName::new(ty);
        let syms: Vec<Sym> = fields
            .iter()
            .map(|(name, field_ty)| {
                self.declare(
                    name,
                    DeclKind::Field {
                        owner: owner.clone(),
                    },
                    Some(field_ty.clone()),
                )
            })
            .collect();
        self.package.structs.insert(
            owner.clone(),
            StructInfo {
                fields: syms
                    .iter()
                    .map(|s| FieldInfo {
                        name: s.name.clone(),
                        decl: s.id,
                    })
                    .collect(),
            },
        );
        StructSyms { ty: owner, fields: syms }
    }

    /// Package-level `var name = value`
    pub fn global(&mut self, file: usize, line: u32, sym: &Sym, value: Expr) {
        self.package.files[file].decls.push(Decl::Var(ValueSpec {
            names: vec![at(line).decl_ident(sym)],
            values: vec![value],
            pos: Pos::new(line, 1),
        }));
    }

    pub fn func(&mut self, file: usize, line: u32, sym: &Sym, body: Vec<Stmt>) {
        self.push_func(file, line, sym, None, body);
    }

    pub fn method(
        &mut self,
        file: usize,
        line: u32,
        sym: &Sym,
        receiver: TypeName,
        body: Vec<Stmt>,
    ) {
        self.push_func(file, line, sym, Some(receiver), body);
    }

    fn push_func(
        &mut self,
        file: usize,
        line: u32,
        sym: &Sym,
        receiver: Option<TypeName>,
        body: Vec<Stmt>,
    ) {
        self.package.files[file].decls.push(Decl::Func(FuncDecl {
            name: at(line).decl_ident(sym),
            receiver,
            pos: Pos::new(line, 1),
            body,
        }));
    }

    /// Record a loader error on the package
    pub fn error(&mut self, message: &str) {
        self.package.errors.push(message.to_string());
    }

    pub fn finish(self) -> Package {
        self.package
    }
}

/// Expression and statement factory for one source line
#[derive(Debug, Clone, Copy)]
pub struct At {
    pub pos: Pos,
}

pub fn at(line: u32) -> At {
    At {
        pos: Pos::new(line, 1),
    }
}

impl At {
    /// Same line, different column
    pub fn col(self, column: u32) -> At {
        At {
            pos: Pos::new(self.pos.line, column),
        }
    }

    fn expr(&self, node: ExprKind) -> Expr {
        Expr::new(self.pos, node)
    }

    fn decl_ident(&self, sym: &Sym) -> Ident {
        Ident::new(sym.name.clone(), Some(sym.id))
    }

    /// Use of a declared object
    pub fn ident(&self, sym: &Sym) -> Expr {
        let expr = self.expr(ExprKind::Ident(self.decl_ident(sym)));
        match (&sym.ty, sym.is_func) {
            (Some(ty), false) => expr.typed(ty.clone()),
            _ => expr,
        }
    }

    /// Identifier without a declaration (constants, package qualifiers)
    pub fn name(&self, name: &str) -> Expr {
        self.expr(ExprKind::Ident(Ident::new(name, None)))
    }

    pub fn str(&self, value: &str) -> Expr {
        self.expr(ExprKind::Str(value.to_string()))
    }

    pub fn int(&self, value: i64) -> Expr {
        self.expr(ExprKind::Int(value))
    }

    pub fn opaque(&self) -> Expr {
        self.expr(ExprKind::Opaque)
    }

    /// `x.field` for a declared field or qualified object
    pub fn select(&self, x: Expr, sym: &Sym) -> Expr {
        let expr = self.expr(ExprKind::Selector {
            x: Box::new(x),
            sel: self.decl_ident(sym),
        });
        match (&sym.ty, sym.is_func) {
            (Some(ty), false) => expr.typed(ty.clone()),
            _ => expr,
        }
    }

    /// `x.name` without declaration information
    pub fn select_name(&self, x: Expr, name: &str) -> Expr {
        self.expr(ExprKind::Selector {
            x: Box::new(x),
            sel: Ident::new(name, None),
        })
    }

    /// `x[index]`, typed with the element type of `x`
    pub fn index(&self, x: Expr, index: Expr) -> Expr {
        let ty = x.ty.as_ref().and_then(TypeName::element);
        let expr = self.expr(ExprKind::Index {
            x: Box::new(x),
            index: Box::new(index),
        });
        match ty {
            Some(ty) => expr.typed(ty),
            None => expr,
        }
    }

    pub fn call(&self, fun: Expr, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Call {
            fun: Box::new(fun),
            args,
        })
    }

    /// Call of a declared function, typed with its result
    pub fn call_fn(&self, func: &Sym, args: Vec<Expr>) -> Expr {
        let expr = self.call(self.ident(func), args);
        match &func.ty {
            Some(ty) => expr.typed(ty.clone()),
            None => expr,
        }
    }

    /// `recv.name(args...)` for an undeclared method
    pub fn method(&self, recv: Expr, name: &str, args: Vec<Expr>) -> Expr {
        self.call(self.select_name(recv, name), args)
    }

    pub fn composite(&self, ty: TypeName, elts: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Composite { elts }).typed(ty)
    }

    pub fn key_value(&self, key: Expr, value: Expr) -> Expr {
        self.expr(ExprKind::KeyValue {
            key: Box::new(key),
            value: Box::new(value),
        })
    }

    /// `name: value` inside a struct literal
    pub fn field_value(&self, field: &Sym, value: Expr) -> Expr {
        self.key_value(self.ident(field), value)
    }

    /// Map literal with string keys
    pub fn string_map(&self, ty: TypeName, entries: Vec<(&str, Expr)>) -> Expr {
        let elts = entries
            .into_iter()
            .map(|(key, value)| self.key_value(self.str(key), value))
            .collect();
        self.composite(ty, elts)
    }

    /// `&x`
    pub fn addr(&self, x: Expr) -> Expr {
        let ty = x.ty.as_ref().map(|t| TypeName::new(format!("*{t}")));
        let expr = self.expr(ExprKind::Unary {
            op: UnaryOp::Ref,
            x: Box::new(x),
        });
        match ty {
            Some(ty) => expr.typed(ty),
            None => expr,
        }
    }

    pub fn paren(&self, x: Expr) -> Expr {
        let ty = x.ty.clone();
        let expr = self.expr(ExprKind::Paren { x: Box::new(x) });
        match ty {
            Some(ty) => expr.typed(ty),
            None => expr,
        }
    }

    pub fn func_lit(&self, body: Vec<Stmt>) -> Expr {
        self.expr(ExprKind::FuncLit { body })
    }

    /// `name := value`
    pub fn define(&self, sym: &Sym, value: Expr) -> Stmt {
        Stmt::Assign {
            lhs: vec![self.ident(sym)],
            rhs: vec![value],
            define: true,
            pos: self.pos,
        }
    }

    /// `a, b := value` (multi-value call)
    pub fn define_many(&self, syms: &[&Sym], value: Expr) -> Stmt {
        Stmt::Assign {
            lhs: syms.iter().map(|s| self.ident(s)).collect(),
            rhs: vec![value],
            define: true,
            pos: self.pos,
        }
    }

    /// `target = value`
    pub fn assign(&self, target: Expr, value: Expr) -> Stmt {
        Stmt::Assign {
            lhs: vec![target],
            rhs: vec![value],
            define: false,
            pos: self.pos,
        }
    }

    /// `var name = value` inside a function
    pub fn var(&self, sym: &Sym, value: Expr) -> Stmt {
        Stmt::Var(ValueSpec {
            names: vec![self.decl_ident(sym)],
            values: vec![value],
            pos: self.pos,
        })
    }

    pub fn ret(&self, results: Vec<Expr>) -> Stmt {
        Stmt::Return {
            results,
            pos: self.pos,
        }
    }

    pub fn stmt(&self, expr: Expr) -> Stmt {
        Stmt::Expr(expr)
    }
}
