//! Pre-order traversal of a package
//!
//! Every node is reported together with its [`Site`]: the file it lives in,
//! its position and the top-level function enclosing it (none for
//! package-level initializers).

use super::{Decl, Expr, ExprKind, FuncDecl, Package, Pos, Stmt, ValueSpec};

/// Where a node sits in the package
#[derive(Debug, Clone, Copy)]
pub struct Site<'a> {
    /// Index into `Package::files`
    pub file: usize,
    pub pos: Pos,
    pub func: Option<&'a FuncDecl>,
}

impl<'a> Site<'a> {
    pub fn at(&self, pos: Pos) -> Site<'a> {
        Site { pos, ..*self }
    }

    /// True when both sites are inside the same top-level function
    pub fn same_routine(&self, other: &Site<'_>) -> bool {
        match (self.func, other.func) {
            (Some(a), Some(b)) => std::ptr::eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// True when `self` lies strictly before `other` in the same file
    pub fn precedes(&self, other: &Site<'_>) -> bool {
        self.file == other.file && self.pos < other.pos
    }
}

/// A call expression and where it was found
#[derive(Debug, Clone, Copy)]
pub struct CallRef<'a> {
    pub expr: &'a Expr,
    pub site: Site<'a>,
}

/// Callbacks for [`walk_package`]; every method defaults to a no-op
pub trait Visitor<'a> {
    fn visit_expr(&mut self, _expr: &'a Expr, _site: &Site<'a>) {}
    fn visit_stmt(&mut self, _stmt: &'a Stmt, _site: &Site<'a>) {}
    fn visit_spec(&mut self, _spec: &'a ValueSpec, _site: &Site<'a>) {}
}

pub fn walk_package<'a, V: Visitor<'a>>(package: &'a Package, visitor: &mut V) {
    for (file, source) in package.files.iter().enumerate() {
        for decl in &source.decls {
            match decl {
                Decl::Var(spec) => {
                    let site = Site {
                        file,
                        pos: spec.pos,
                        func: None,
                    };
                    walk_spec(visitor, spec, &site);
                }
                Decl::Func(func) => {
                    let site = Site {
                        file,
                        pos: func.pos,
                        func: Some(func),
                    };
                    walk_stmts(visitor, &func.body, &site);
                }
            }
        }
    }
}

fn walk_spec<'a, V: Visitor<'a>>(visitor: &mut V, spec: &'a ValueSpec, site: &Site<'a>) {
    let site = site.at(spec.pos);
    visitor.visit_spec(spec, &site);
    for value in &spec.values {
        walk_expr(visitor, value, &site);
    }
}

pub fn walk_stmts<'a, V: Visitor<'a>>(visitor: &mut V, stmts: &'a [Stmt], site: &Site<'a>) {
    for stmt in stmts {
        walk_stmt(visitor, stmt, site);
    }
}

fn walk_stmt<'a, V: Visitor<'a>>(visitor: &mut V, stmt: &'a Stmt, site: &Site<'a>) {
    let site = match stmt {
        Stmt::Assign { pos, .. } | Stmt::Return { pos, .. } => site.at(*pos),
        _ => *site,
    };
    visitor.visit_stmt(stmt, &site);
    match stmt {
        Stmt::Assign { lhs, rhs, .. } => {
            for expr in lhs.iter().chain(rhs) {
                walk_expr(visitor, expr, &site);
            }
        }
        Stmt::Var(spec) => walk_spec(visitor, spec, &site),
        Stmt::Expr(expr) | Stmt::Defer(expr) => walk_expr(visitor, expr, &site),
        Stmt::Return { results, .. } => {
            for expr in results {
                walk_expr(visitor, expr, &site);
            }
        }
        Stmt::Block(body) | Stmt::Loop { body } => walk_stmts(visitor, body, &site),
        Stmt::If {
            cond,
            then,
            otherwise,
        } => {
            walk_expr(visitor, cond, &site);
            walk_stmts(visitor, then, &site);
            walk_stmts(visitor, otherwise, &site);
        }
    }
}

pub fn walk_expr<'a, V: Visitor<'a>>(visitor: &mut V, expr: &'a Expr, site: &Site<'a>) {
    let site = site.at(expr.pos);
    visitor.visit_expr(expr, &site);
    match &expr.node {
        ExprKind::Selector { x, .. } | ExprKind::Paren { x } | ExprKind::Unary { x, .. } => {
            walk_expr(visitor, x, &site)
        }
        ExprKind::Index { x, index } => {
            walk_expr(visitor, x, &site);
            walk_expr(visitor, index, &site);
        }
        ExprKind::Call { fun, args } => {
            walk_expr(visitor, fun, &site);
            for arg in args {
                walk_expr(visitor, arg, &site);
            }
        }
        ExprKind::Composite { elts } => {
            for elt in elts {
                walk_expr(visitor, elt, &site);
            }
        }
        ExprKind::KeyValue { key, value } => {
            walk_expr(visitor, key, &site);
            walk_expr(visitor, value, &site);
        }
        ExprKind::FuncLit { body } => walk_stmts(visitor, body, &site),
        ExprKind::Ident(_) | ExprKind::Str(_) | ExprKind::Int(_) | ExprKind::Opaque => {}
    }
}

struct CallCollector<'a> {
    calls: Vec<CallRef<'a>>,
}

impl<'a> Visitor<'a> for CallCollector<'a> {
    fn visit_expr(&mut self, expr: &'a Expr, site: &Site<'a>) {
        if matches!(expr.node, ExprKind::Call { .. }) {
            self.calls.push(CallRef { expr, site: *site });
        }
    }
}

/// Every call expression of the package, outer calls before inner ones
pub fn calls(package: &Package) -> Vec<CallRef<'_>> {
    let mut collector = CallCollector { calls: Vec::new() };
    walk_package(package, &mut collector);
    collector.calls
}

/// Return statements of a function body, not descending into closures
pub fn returns(body: &[Stmt]) -> Vec<(&[Expr], Pos)> {
    let mut found = Vec::new();
    collect_returns(body, &mut found);
    found
}

fn collect_returns<'a>(body: &'a [Stmt], found: &mut Vec<(&'a [Expr], Pos)>) {
    for stmt in body {
        match stmt {
            Stmt::Return { results, pos } => found.push((results.as_slice(), *pos)),
            Stmt::Block(inner) | Stmt::Loop { body: inner } => collect_returns(inner, found),
            Stmt::If {
                then, otherwise, ..
            } => {
                collect_returns(then, found);
                collect_returns(otherwise, found);
            }
            Stmt::Assign { .. } | Stmt::Var(_) | Stmt::Expr(_) | Stmt::Defer(_) => {}
        }
    }
}
