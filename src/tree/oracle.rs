use super::{DeclId, DeclInfo, DeclKind, Expr, ExprKind, Ident, Package, TypeName};

/// Type-resolution oracle consumed by the analysis.
///
/// This is the seam to whatever type checker produced the tree. `Package`
/// answers from the tables embedded in the dump; tests and embedders may
/// supply their own.
pub trait TypeOracle {
    /// Declaration an identifier use refers to
    fn resolve(&self, ident: &Ident) -> Option<DeclId>;

    fn decl(&self, id: DeclId) -> Option<&DeclInfo>;

    /// Static type of an expression
    fn type_of<'a>(&'a self, expr: &'a Expr) -> Option<&'a TypeName>;

    /// Field declaration `name` of struct type `owner`
    fn field(&self, owner: &TypeName, name: &str) -> Option<DeclId>;

    /// Field declaration at position `index` of struct type `owner`
    fn field_at(&self, owner: &TypeName, index: usize) -> Option<DeclId>;

    /// True when `id` names a struct field
    fn is_field(&self, id: DeclId) -> bool {
        matches!(
            self.decl(id).map(|d| &d.kind),
            Some(DeclKind::Field { .. })
        )
    }
}

impl TypeOracle for Package {
    fn resolve(&self, ident: &Ident) -> Option<DeclId> {
        ident.decl
    }

    fn decl(&self, id: DeclId) -> Option<&DeclInfo> {
        self.decls.get(&id)
    }

    fn type_of<'a>(&'a self, expr: &'a Expr) -> Option<&'a TypeName> {
        if let Some(ty) = &expr.ty {
            return Some(ty);
        }
        let decl = match &expr.node {
            ExprKind::Ident(ident) => ident.decl?,
            ExprKind::Selector { sel, .. } => sel.decl?,
            ExprKind::Paren { x } => return self.type_of(x),
            _ => return None,
        };
        let info = self.decls.get(&decl)?;
        match info.kind {
            // The object's own type; a function's result is not its type
            DeclKind::Func { .. } => None,
            _ => info.ty.as_ref(),
        }
    }

    fn field(&self, owner: &TypeName, name: &str) -> Option<DeclId> {
        self.structs
            .get(&TypeName::new(owner.origin()))?
            .fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.decl)
    }

    fn field_at(&self, owner: &TypeName, index: usize) -> Option<DeclId> {
        self.structs
            .get(&TypeName::new(owner.origin()))?
            .fields
            .get(index)
            .map(|f| f.decl)
    }
}
