//! Definition index: where each object and field gets its value
//!
//! Built once per analysis from the immutable tree, so lookups never depend on
//! the order in which the passes visit declarations.

use crate::tree::walk::{self, Site, Visitor};
use crate::tree::{Decl, DeclId, Expr, ExprKind, FuncDecl, Ident, Package, Stmt, TypeOracle, ValueSpec};
use fnv::FnvHashMap;
use std::collections::HashMap;

/// A value flowing into a variable
#[derive(Debug, Clone, Copy)]
pub(crate) struct Binding<'a> {
    pub value: &'a Expr,
    /// Position in a multi-value right-hand side (`a, b := f()`)
    pub tuple: Option<usize>,
    pub site: Site<'a>,
}

/// A value stored into a struct field
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldBinding<'a> {
    /// Field declaration, when the type checker could tell
    pub field: Option<DeclId>,
    pub value: &'a Expr,
    pub site: Site<'a>,
}

pub(crate) struct TreeIndex<'a> {
    bindings: FnvHashMap<DeclId, Vec<Binding<'a>>>,
    fields: HashMap<String, Vec<FieldBinding<'a>>>,
    funcs: FnvHashMap<DeclId, (usize, &'a FuncDecl)>,
}

struct IndexBuilder<'a, 'o> {
    oracle: &'o dyn TypeOracle,
    index: TreeIndex<'a>,
}

impl<'a> TreeIndex<'a> {
    pub fn build(package: &'a Package, oracle: &dyn TypeOracle) -> Self {
        let mut builder = IndexBuilder {
            oracle,
            index: TreeIndex {
                bindings: FnvHashMap::default(),
                fields: HashMap::new(),
                funcs: FnvHashMap::default(),
            },
        };

        for (file, source) in package.files.iter().enumerate() {
            for decl in &source.decls {
                if let Decl::Func(func) = decl {
                    if let Some(id) = oracle.resolve(&func.name) {
                        builder.index.funcs.insert(id, (file, func));
                    }
                }
            }
        }

        walk::walk_package(package, &mut builder);
        builder.index
    }

    /// Binding in effect for `decl` at `site`.
    ///
    /// The nearest preceding binding in the same routine wins; otherwise the
    /// package-level declaration; otherwise the first binding seen.
    pub fn binding_for(&self, decl: DeclId, site: &Site<'_>) -> Option<&Binding<'a>> {
        let candidates = self.bindings.get(&decl)?;
        candidates
            .iter()
            .rev()
            .find(|b| b.site.same_routine(site) && b.site.precedes(site))
            .or_else(|| candidates.iter().find(|b| b.site.func.is_none()))
            .or_else(|| candidates.first())
    }

    /// Values stored into field `field`, found by name and checked by declaration
    pub fn field_values(&self, name: &str, field: DeclId) -> impl Iterator<Item = &FieldBinding<'a>> {
        self.fields
            .get(name)
            .into_iter()
            .flatten()
            .filter(move |b| b.field == Some(field))
    }

    pub fn func(&self, decl: DeclId) -> Option<(usize, &'a FuncDecl)> {
        self.funcs.get(&decl).copied()
    }
}

impl<'a, 'o> IndexBuilder<'a, 'o> {
    fn bind(&mut self, target: &'a Expr, value: &'a Expr, tuple: Option<usize>, site: &Site<'a>) {
        match &target.unparen().node {
            ExprKind::Ident(ident) => self.bind_ident(ident, value, tuple, site),
            ExprKind::Selector { x, sel } => {
                // Package-qualified variable rather than a field
                if let Some(id) = self.oracle.resolve(sel) {
                    if !self.oracle.is_field(id) {
                        self.bind_ident(sel, value, tuple, site);
                        return;
                    }
                }
                let field = self.field_of(x, sel);
                self.bind_field(&sel.name, field, value, site);
            }
            _ => {}
        }
    }

    fn bind_ident(&mut self, ident: &Ident, value: &'a Expr, tuple: Option<usize>, site: &Site<'a>) {
        if let Some(id) = self.oracle.resolve(ident) {
            self.index.bindings.entry(id).or_default().push(Binding {
                value,
                tuple,
                site: *site,
            });
        }
    }

    fn bind_field(&mut self, name: &str, field: Option<DeclId>, value: &'a Expr, site: &Site<'a>) {
        self.index.fields.entry(name.to_string()).or_default().push(FieldBinding {
            field,
            value,
            site: *site,
        });
    }

    /// Field declaration selected by `x.sel`
    fn field_of(&self, x: &Expr, sel: &Ident) -> Option<DeclId> {
        self.oracle
            .resolve(sel)
            .filter(|id| self.oracle.is_field(*id))
            .or_else(|| {
                let owner = self.oracle.type_of(x)?;
                self.oracle.field(owner, &sel.name)
            })
    }

    /// Pair left-hand sides with right-hand sides (1:1 or n:1 tuple)
    fn bind_all(&mut self, targets: &'a [Expr], values: &'a [Expr], site: &Site<'a>) {
        if targets.len() == values.len() {
            for (target, value) in targets.iter().zip(values) {
                self.bind(target, value, None, site);
            }
        } else if values.len() == 1 {
            for (i, target) in targets.iter().enumerate() {
                self.bind(target, &values[0], Some(i), site);
            }
        }
    }

    fn struct_literal(&mut self, lit: &'a Expr, elts: &'a [Expr], site: &Site<'a>) {
        let oracle = self.oracle;
        let owner = oracle.type_of(lit);
        if owner.is_some_and(|t| t.is_collection()) {
            return;
        }

        for (i, elt) in elts.iter().enumerate() {
            match &elt.node {
                ExprKind::KeyValue { key, value } => {
                    let Some(key) = key.as_ident() else {
                        continue;
                    };
                    let field = oracle
                        .resolve(key)
                        .filter(|id| oracle.is_field(*id))
                        .or_else(|| owner.and_then(|t| oracle.field(t, &key.name)));
                    self.bind_field(&key.name, field, value, site);
                }
                _ => {
                    let Some(owner) = owner else {
                        continue;
                    };
                    let Some(field) = oracle.field_at(owner, i) else {
                        continue;
                    };
                    if let Some(info) = oracle.decl(field) {
                        let name = info.name.clone();
                        self.bind_field(&name, Some(field), elt, site);
                    }
                }
            }
        }
    }
}

impl<'a, 'o> Visitor<'a> for IndexBuilder<'a, 'o> {
    fn visit_spec(&mut self, spec: &'a ValueSpec, site: &Site<'a>) {
        if spec.values.is_empty() {
            return;
        }
        if spec.names.len() == spec.values.len() {
            for (name, value) in spec.names.iter().zip(&spec.values) {
                self.bind_ident(name, value, None, site);
            }
        } else if spec.values.len() == 1 {
            for (i, name) in spec.names.iter().enumerate() {
                self.bind_ident(name, &spec.values[0], Some(i), site);
            }
        }
    }

    fn visit_stmt(&mut self, stmt: &'a Stmt, site: &Site<'a>) {
        if let Stmt::Assign { lhs, rhs, .. } = stmt {
            self.bind_all(lhs, rhs, site);
        }
    }

    fn visit_expr(&mut self, expr: &'a Expr, site: &Site<'a>) {
        if let ExprKind::Composite { elts } = &expr.node {
            self.struct_literal(expr, elts, site);
        }
    }
}
